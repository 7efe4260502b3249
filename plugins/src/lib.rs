pub mod executor;
pub mod factory;

pub use executor::{FixtureToolExecutor, LiveToolExecutor};
pub use factory::build_executor;

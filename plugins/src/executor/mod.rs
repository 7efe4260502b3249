mod fixture;
mod live;
mod wire;

pub use fixture::{FixtureBundle, FixtureCase, FixtureToolExecutor, FIXTURE_FIELDS};
pub use live::LiveToolExecutor;

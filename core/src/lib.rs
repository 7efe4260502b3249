pub mod api;
pub mod config;
pub mod connector;
pub mod credential;
pub mod engine;
pub mod errors;
pub mod evidence;
pub mod hypothesis;
pub mod overview;
pub mod tool;

pub use engine::run_diagnosis;

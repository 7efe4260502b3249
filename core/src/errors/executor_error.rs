// core/src/errors/executor_error.rs
use thiserror::Error;

/// Failures while *building* an executor.
///
/// Once built, executors report per-call failures as `ToolResult::Failure`
/// and never surface these.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("no access token configured (set FLEETSCOPE_ACCESS_TOKEN or live.access_token)")]
    MissingCredential,

    #[error("failed to build http client")]
    HttpClient(#[source] anyhow::Error),

    #[error("failed to read fixture bundle: {path}")]
    FixtureIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("fixture bundle is not valid json: {path}")]
    FixtureParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("fixture case not found: {0}")]
    UnknownCase(String),

    #[error("fixture case {case} is invalid: {reason}")]
    InvalidCase { case: String, reason: String },
}

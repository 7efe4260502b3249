// core/src/errors/cli_error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(#[source] anyhow::Error),

    #[error("executor error: {0}")]
    Executor(#[from] crate::errors::ExecutorError),

    #[error("invalid tool call: {0}")]
    ToolCall(String),

    #[error("output error")]
    Output(#[from] serde_json::Error),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

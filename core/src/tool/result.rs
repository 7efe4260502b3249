use serde::{Deserialize, Serialize};

/// Failure half of a [`ToolResult`], serialized as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolFailure {
    pub error: String,
}

/// Outcome of one tool call.
///
/// Executors never return `Err` or panic across the tool boundary; every
/// failure mode (transport, auth, quota, timeout, malformed payload) ends up
/// in `Failure` with the upstream text preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResult<T> {
    Failure(ToolFailure),
    Success(T),
}

impl<T> ToolResult<T> {
    pub fn success(value: T) -> Self {
        ToolResult::Success(value)
    }

    pub fn failure(error: impl Into<String>) -> Self {
        ToolResult::Failure(ToolFailure {
            error: error.into(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success(_))
    }

    pub fn as_success(&self) -> Option<&T> {
        match self {
            ToolResult::Success(v) => Some(v),
            ToolResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ToolResult::Success(_) => None,
            ToolResult::Failure(f) => Some(f.error.as_str()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ToolResult<U> {
        match self {
            ToolResult::Success(v) => ToolResult::Success(f(v)),
            ToolResult::Failure(e) => ToolResult::Failure(e),
        }
    }
}

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;

use crate::tool::{ToolName, ToolResult};

/// Run one tool call under the per-call budget.
///
/// Expiry and panics both come back as an ordinary failure so a single source
/// can never take the diagnosis down with it.
pub(super) async fn guarded<T, F>(tool: ToolName, budget: Duration, call: F) -> ToolResult<T>
where
    F: Future<Output = ToolResult<T>>,
{
    match tokio::time::timeout(budget, AssertUnwindSafe(call).catch_unwind()).await {
        Ok(Ok(result)) => {
            if let Some(err) = result.error() {
                tracing::debug!(
                    target: "fleetscope.orchestrator",
                    tool = tool.as_str(),
                    error = err,
                    "tool returned failure"
                );
            }
            result
        }
        Ok(Err(_)) => {
            tracing::error!(
                target: "fleetscope.orchestrator",
                tool = tool.as_str(),
                "tool call panicked"
            );
            ToolResult::failure(format!("{} failed unexpectedly", tool.as_str()))
        }
        Err(_) => {
            tracing::warn!(
                target: "fleetscope.orchestrator",
                tool = tool.as_str(),
                budget_ms = budget.as_millis() as u64,
                "tool call timed out"
            );
            ToolResult::failure(format!("timed out after {}ms", budget.as_millis()))
        }
    }
}

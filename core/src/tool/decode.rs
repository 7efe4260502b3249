use serde::de::DeserializeOwned;
use serde_json::Value;

use super::catalog::ToolName;
use super::result::ToolResult;

/// Validate a raw upstream payload into its typed form.
///
/// An `error` member at the top level is treated as an upstream failure and
/// its text is preserved verbatim; a payload that does not match the schema
/// becomes a failure naming the tool, never a panic.
pub fn decode<T: DeserializeOwned>(tool: ToolName, raw: Value) -> ToolResult<T> {
    if let Some(err) = upstream_error(&raw) {
        return ToolResult::failure(err);
    }
    match serde_json::from_value::<T>(raw) {
        Ok(v) => ToolResult::success(v),
        Err(e) => {
            tracing::warn!(
                target: "fleetscope.decode",
                tool = tool.as_str(),
                error = %e,
                "payload failed schema validation"
            );
            ToolResult::failure(format!("malformed {} payload: {}", tool.as_str(), e))
        }
    }
}

/// Extract the error text from a Google-style error body.
///
/// Handles `{"error": {"status": "PERMISSION_DENIED", "message": ..}}` (JSON
/// APIs, prefers the status token) and `{"error": "invalid_token"}` (OAuth).
pub fn upstream_error(raw: &Value) -> Option<String> {
    match raw.get("error")? {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => {
            let pick = |k: &str| {
                obj.get(k)
                    .and_then(Value::as_str)
                    .filter(|s| !s.trim().is_empty())
                    .map(str::to_string)
            };
            pick("status")
                .or_else(|| pick("message"))
                .or_else(|| obj.get("code").map(|c| format!("HTTP {}", c)))
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{EventsPayload, RulesPayload};
    use serde_json::json;

    #[test]
    fn status_token_wins_over_message() {
        let body = json!({
            "error": { "code": 403, "message": "Caller lacks permission", "status": "PERMISSION_DENIED" }
        });
        assert_eq!(upstream_error(&body).as_deref(), Some("PERMISSION_DENIED"));
    }

    #[test]
    fn oauth_string_error_is_kept() {
        let body = json!({ "error": "invalid_token", "error_description": "Invalid Value" });
        assert_eq!(upstream_error(&body).as_deref(), Some("invalid_token"));
    }

    #[test]
    fn code_only_error_falls_back_to_http_code() {
        assert_eq!(
            upstream_error(&json!({ "error": { "code": 429 } })).as_deref(),
            Some("HTTP 429")
        );
    }

    #[test]
    fn malformed_payload_is_a_failure_not_a_panic() {
        let r: ToolResult<RulesPayload> =
            decode(ToolName::ListPolicyRules, json!({ "rules": "not-a-list" }));
        let err = r.error().unwrap();
        assert!(err.starts_with("malformed list_policy_rules payload"));
    }

    #[test]
    fn error_body_short_circuits_schema() {
        let r: ToolResult<EventsPayload> =
            decode(ToolName::GetEvents, json!({ "error": "RESOURCE_EXHAUSTED" }));
        assert_eq!(r.error(), Some("RESOURCE_EXHAUSTED"));
    }
}

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::r#trait::ToolExecutor;
use super::result::ToolResult;

/// Stable names of the tools exposed to a model-driven requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    GetEvents,
    ListPolicyRules,
    GetConnectorConfig,
    ListOrgUnits,
    GetFleetOverview,
    DebugAuth,
    Enroll,
}

impl ToolName {
    pub const ALL: [ToolName; 7] = [
        ToolName::GetEvents,
        ToolName::ListPolicyRules,
        ToolName::GetConnectorConfig,
        ToolName::ListOrgUnits,
        ToolName::GetFleetOverview,
        ToolName::DebugAuth,
        ToolName::Enroll,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::GetEvents => "get_events",
            ToolName::ListPolicyRules => "list_policy_rules",
            ToolName::GetConnectorConfig => "get_connector_config",
            ToolName::ListOrgUnits => "list_org_units",
            ToolName::GetFleetOverview => "get_fleet_overview",
            ToolName::DebugAuth => "debug_auth",
            ToolName::Enroll => "enroll",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolName::GetEvents => {
                "Fetch recent Chrome browser audit events (filter: maxResults, eventName, userKey, startTime)."
            }
            ToolName::ListPolicyRules => {
                "List DLP rules configured in Cloud Identity (filter: ruleType, orgUnit)."
            }
            ToolName::GetConnectorConfig => {
                "Resolve connector policies and the resource each one targets."
            }
            ToolName::ListOrgUnits => "List the organizational units of the customer.",
            ToolName::GetFleetOverview => {
                "Summarize fleet health from events, DLP rules and connector policies (args: maxEvents)."
            }
            ToolName::DebugAuth => {
                "Introspect the current credential: granted scopes, expiry and client."
            }
            ToolName::Enroll => "Create a browser enrollment token (args: orgUnitPath).",
        }
    }

    pub fn parse(name: &str) -> Option<ToolName> {
        ToolName::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool invocation as issued by an interactive requester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: ToolName,
    #[serde(default)]
    pub args: Value,
}

fn parse_args<A: DeserializeOwned + Default>(tool: ToolName, args: Value) -> Result<A, String> {
    if args.is_null() {
        return Ok(A::default());
    }
    serde_json::from_value(args).map_err(|e| format!("invalid arguments for {}: {}", tool, e))
}

fn to_json<T: Serialize>(result: ToolResult<T>) -> Value {
    serde_json::to_value(&result)
        .unwrap_or_else(|e| serde_json::json!({ "error": format!("unserializable result: {e}") }))
}

macro_rules! with_args {
    ($call:expr, $ty:ty, |$a:ident| $body:expr) => {
        match parse_args::<$ty>($call.name, $call.args) {
            Ok($a) => to_json($body.await),
            Err(e) => to_json(ToolResult::<()>::failure(e)),
        }
    };
}

/// Route a named tool call to the executor and return the `ToolResult` as JSON.
///
/// Argument errors are reported the same way as source errors.
pub async fn dispatch(executor: &dyn ToolExecutor, call: ToolCall) -> Value {
    tracing::debug!(target: "fleetscope.tool", tool = call.name.as_str(), "dispatching tool call");
    match call.name {
        ToolName::GetEvents => with_args!(call, super::EventFilter, |a| executor.get_events(&a)),
        ToolName::ListPolicyRules => {
            with_args!(call, super::RuleFilter, |a| executor.list_policy_rules(&a))
        }
        ToolName::GetConnectorConfig => to_json(executor.get_connector_config().await),
        ToolName::ListOrgUnits => to_json(executor.list_org_units().await),
        ToolName::GetFleetOverview => {
            with_args!(call, super::OverviewArgs, |a| executor.get_fleet_overview(&a))
        }
        ToolName::DebugAuth => to_json(executor.debug_auth().await),
        ToolName::Enroll => with_args!(call, super::EnrollTarget, |a| executor.enroll(&a)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn names_round_trip_through_parse() {
        for t in ToolName::ALL {
            assert_eq!(ToolName::parse(t.as_str()), Some(t));
        }
        assert_eq!(ToolName::parse("drop_tables"), None);
    }

    #[test]
    fn tool_call_deserializes_without_args() {
        let call: ToolCall = serde_json::from_value(json!({ "name": "debug_auth" })).unwrap();
        assert_eq!(call.name, ToolName::DebugAuth);
        assert!(call.args.is_null());
    }

    #[test]
    fn bad_arguments_are_reported_as_errors() {
        let r: Result<super::super::EventFilter, _> =
            parse_args(ToolName::GetEvents, json!({ "maxResults": "lots" }));
        assert!(r.unwrap_err().starts_with("invalid arguments for get_events"));
    }
}

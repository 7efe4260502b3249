use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use fleetscope_core::api::{
    build_overview, decode, AuthInfo, ConnectorConfig, EnrollTarget, EnrollmentToken, EventFilter,
    EventsPayload, ExecutorError, OrgUnitsPayload, OverviewArgs, OverviewSummary, RuleFilter,
    RulesPayload, ToolExecutor, ToolName, ToolResult,
};

/// Data fields a case may provide, inject errors into, or delay.
pub const FIXTURE_FIELDS: [&str; 7] = [
    "events",
    "dlpRules",
    "connectorConfig",
    "orgUnits",
    "fleetOverview",
    "auth",
    "enrollment",
];

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureBundle {
    pub cases: BTreeMap<String, FixtureCase>,
}

/// One canned scenario. Data fields hold the success payload of the matching
/// tool in its serialized form and are validated when the tool is called.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FixtureCase {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub events: Option<Value>,
    #[serde(default)]
    pub dlp_rules: Option<Value>,
    #[serde(default)]
    pub connector_config: Option<Value>,
    #[serde(default)]
    pub org_units: Option<Value>,
    #[serde(default)]
    pub fleet_overview: Option<Value>,
    #[serde(default)]
    pub auth: Option<Value>,
    #[serde(default)]
    pub enrollment: Option<Value>,
    /// field -> error text returned instead of the data.
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
    /// field -> artificial latency before answering.
    #[serde(default)]
    pub delays_ms: BTreeMap<String, u64>,
}

impl FixtureCase {
    fn data(&self, field: &str) -> Option<&Value> {
        match field {
            "events" => self.events.as_ref(),
            "dlpRules" => self.dlp_rules.as_ref(),
            "connectorConfig" => self.connector_config.as_ref(),
            "orgUnits" => self.org_units.as_ref(),
            "fleetOverview" => self.fleet_overview.as_ref(),
            "auth" => self.auth.as_ref(),
            "enrollment" => self.enrollment.as_ref(),
            _ => None,
        }
    }

    fn validate(&self, id: &str) -> Result<(), ExecutorError> {
        let unknown = self
            .errors
            .keys()
            .chain(self.delays_ms.keys())
            .find(|k| !FIXTURE_FIELDS.contains(&k.as_str()));
        match unknown {
            Some(k) => Err(ExecutorError::InvalidCase {
                case: id.to_string(),
                reason: format!(
                    "unknown field '{k}' (expected one of {})",
                    FIXTURE_FIELDS.join(", ")
                ),
            }),
            None => Ok(()),
        }
    }
}

/// Deterministic executor that replays one case of a fixture bundle.
pub struct FixtureToolExecutor {
    case_id: String,
    case: FixtureCase,
}

impl FixtureToolExecutor {
    pub fn new(case_id: impl Into<String>, case: FixtureCase) -> Result<Self, ExecutorError> {
        let case_id = case_id.into();
        case.validate(&case_id)?;
        Ok(Self { case_id, case })
    }

    pub fn load(path: &Path, case_id: &str) -> Result<Self, ExecutorError> {
        let label = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| ExecutorError::FixtureIo {
            path: label.clone(),
            source,
        })?;
        Self::from_json(&text, &label, case_id)
    }

    pub fn from_json(text: &str, label: &str, case_id: &str) -> Result<Self, ExecutorError> {
        let mut bundle: FixtureBundle =
            serde_json::from_str(text).map_err(|source| ExecutorError::FixtureParse {
                path: label.to_string(),
                source,
            })?;
        let case = bundle
            .cases
            .remove(case_id)
            .ok_or_else(|| ExecutorError::UnknownCase(case_id.to_string()))?;
        tracing::debug!(
            target: "fleetscope.fixture",
            bundle = label,
            case = case_id,
            "fixture case loaded"
        );
        Self::new(case_id, case)
    }

    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    async fn answer<T: DeserializeOwned>(&self, field: &str, tool: ToolName) -> ToolResult<T> {
        if let Some(ms) = self.case.delays_ms.get(field) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        if let Some(err) = self.case.errors.get(field) {
            tracing::debug!(target: "fleetscope.fixture", field, error = %err, "injected failure");
            return ToolResult::failure(err.clone());
        }
        match self.case.data(field) {
            Some(raw) => decode(tool, raw.clone()),
            None => ToolResult::failure(format!("fixture has no {field} data")),
        }
    }
}

#[async_trait]
impl ToolExecutor for FixtureToolExecutor {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn get_events(&self, filter: &EventFilter) -> ToolResult<EventsPayload> {
        self.answer::<EventsPayload>("events", ToolName::GetEvents)
            .await
            .map(|mut p| {
                p.events.retain(|e| {
                    let name_ok = filter
                        .event_name
                        .as_deref()
                        .map_or(true, |n| e.event_name == n);
                    let user_ok = match filter.user_key.as_deref() {
                        None | Some("all") => true,
                        Some(u) => e.actor_email.as_deref() == Some(u),
                    };
                    name_ok && user_ok
                });
                p.events.truncate(filter.max_results as usize);
                p
            })
    }

    async fn list_policy_rules(&self, filter: &RuleFilter) -> ToolResult<RulesPayload> {
        self.answer::<RulesPayload>("dlpRules", ToolName::ListPolicyRules)
            .await
            .map(|mut p| {
                if let Some(ou) = filter.org_unit.as_deref() {
                    p.rules.retain(|r| r.org_unit.as_deref() == Some(ou));
                }
                p
            })
    }

    async fn get_connector_config(&self) -> ToolResult<ConnectorConfig> {
        self.answer("connectorConfig", ToolName::GetConnectorConfig).await
    }

    async fn list_org_units(&self) -> ToolResult<OrgUnitsPayload> {
        self.answer("orgUnits", ToolName::ListOrgUnits).await
    }

    async fn get_fleet_overview(&self, args: &OverviewArgs) -> ToolResult<OverviewSummary> {
        if self.case.fleet_overview.is_some() || self.case.errors.contains_key("fleetOverview") {
            return self.answer("fleetOverview", ToolName::GetFleetOverview).await;
        }
        let filter = EventFilter {
            max_results: args.max_events,
            ..Default::default()
        };
        let events = self.get_events(&filter).await;
        let rules = self.list_policy_rules(&RuleFilter::default()).await;
        let connector = self.get_connector_config().await;
        build_overview(&events, &rules, &connector)
    }

    async fn debug_auth(&self) -> ToolResult<AuthInfo> {
        self.answer("auth", ToolName::DebugAuth).await
    }

    async fn enroll(&self, _target: &EnrollTarget) -> ToolResult<EnrollmentToken> {
        self.answer("enrollment", ToolName::Enroll).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn executor(case: Value) -> FixtureToolExecutor {
        let bundle = json!({ "cases": { "t": case } }).to_string();
        FixtureToolExecutor::from_json(&bundle, "inline", "t").unwrap()
    }

    #[tokio::test]
    async fn injected_error_wins_over_data() {
        let exec = executor(json!({
            "dlpRules": { "rules": [] },
            "errors": { "dlpRules": "PERMISSION_DENIED" }
        }));
        let r = exec.list_policy_rules(&RuleFilter::default()).await;
        assert_eq!(r.error(), Some("PERMISSION_DENIED"));
    }

    #[tokio::test]
    async fn missing_field_is_reported() {
        let exec = executor(json!({}));
        let r = exec.list_org_units().await;
        assert_eq!(r.error(), Some("fixture has no orgUnits data"));
    }

    #[tokio::test]
    async fn malformed_canned_payload_is_a_failure() {
        let exec = executor(json!({ "connectorConfig": { "value": 3 } }));
        let r = exec.get_connector_config().await;
        assert!(r.error().unwrap().starts_with("malformed get_connector_config payload"));
    }

    #[tokio::test]
    async fn event_filter_is_applied() {
        let exec = executor(json!({
            "events": { "events": [
                { "eventName": "CONTENT_UNSCANNED", "actorEmail": "a@example.com" },
                { "eventName": "DLP_EVENT", "actorEmail": "b@example.com" },
                { "eventName": "DLP_EVENT", "actorEmail": "a@example.com" }
            ]}
        }));
        let filter = EventFilter {
            event_name: Some("DLP_EVENT".into()),
            max_results: 1,
            ..Default::default()
        };
        let p = exec.get_events(&filter).await;
        let events = &p.as_success().unwrap().events;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].actor_email.as_deref(), Some("b@example.com"));
    }

    #[tokio::test]
    async fn overview_is_derived_when_not_canned() {
        let exec = executor(json!({
            "events": { "events": [] },
            "dlpRules": { "rules": [] },
            "connectorConfig": { "value": [ { "targetResource": "customers/C1" } ] }
        }));
        let o = exec.get_fleet_overview(&OverviewArgs::default()).await;
        assert_eq!(o.as_success().unwrap().counts.mis_scoped_policies, Some(1));
    }

    #[test]
    fn unknown_injection_field_is_rejected() {
        let bundle = json!({ "cases": { "t": { "errors": { "dlp": "X" } } } }).to_string();
        let err = FixtureToolExecutor::from_json(&bundle, "inline", "t").err().unwrap();
        assert!(matches!(err, ExecutorError::InvalidCase { .. }));
    }

    #[test]
    fn unknown_case_is_an_error() {
        let err = FixtureToolExecutor::from_json(r#"{"cases":{}}"#, "inline", "nope")
            .err()
            .unwrap();
        assert!(matches!(err, ExecutorError::UnknownCase(ref c) if c == "nope"));
    }
}

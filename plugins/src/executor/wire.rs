//! Upstream response shapes of the Google management APIs.
//!
//! Only the fields the executor reads are declared; everything else is
//! ignored. Conversions into the tool payloads live next to the shapes.

use serde::Deserialize;
use serde_json::Value;

use fleetscope_core::api::{AuthInfo, ChromeEvent, DlpRule, EnrollmentToken, OrgUnit, PolicyTarget};

// ---------------------------------------------------------------------------
// Admin SDK Reports: activities.list (applicationName=chrome)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityList {
    pub items: Vec<Activity>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Activity {
    pub id: ActivityId,
    pub actor: Actor,
    pub events: Vec<ActivityEvent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ActivityId {
    pub time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Actor {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ActivityEvent {
    pub name: String,
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Parameter {
    pub name: String,
    pub value: Option<String>,
}

/// A list response that may continue on another page.
pub trait Paged {
    type Item;

    /// Items of this page plus the token of the next one, if any.
    fn into_page(self) -> (Vec<Self::Item>, Option<String>);
}

impl Paged for ActivityList {
    type Item = ChromeEvent;

    fn into_page(mut self) -> (Vec<ChromeEvent>, Option<String>) {
        let next = self.next_page_token.take();
        (self.into_events(), next)
    }
}

impl ActivityList {
    /// One `ChromeEvent` per activity event, in upstream order.
    pub fn into_events(self) -> Vec<ChromeEvent> {
        let mut out = Vec::new();
        for activity in self.items {
            for ev in activity.events {
                let param = |key: &str| {
                    ev.parameters
                        .iter()
                        .find(|p| p.name == key)
                        .and_then(|p| p.value.clone())
                };
                out.push(ChromeEvent {
                    time: activity.id.time.clone(),
                    actor_email: activity.actor.email.clone(),
                    device_name: param("DEVICE_NAME"),
                    url: param("URL"),
                    reason: param("EVENT_REASON"),
                    result: param("EVENT_RESULT"),
                    event_name: ev.name,
                });
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Cloud Identity: policies.list
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyList {
    pub policies: Vec<CloudPolicy>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CloudPolicy {
    pub name: String,
    pub policy_query: PolicyQuery,
    pub setting: Setting,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyQuery {
    pub org_unit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Setting {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Value,
}

impl Paged for PolicyList {
    type Item = CloudPolicy;

    fn into_page(self) -> (Vec<CloudPolicy>, Option<String>) {
        (self.policies, self.next_page_token)
    }
}

/// DLP rules only; other Cloud Identity settings share the endpoint.
pub fn dlp_rules(policies: Vec<CloudPolicy>, rule_type: &str) -> Vec<DlpRule> {
    policies
        .into_iter()
        .filter(|p| p.setting.kind.contains(rule_type))
        .map(|p| {
            let v = &p.setting.value;
            let text = |key: &str| v.get(key).and_then(Value::as_str).map(str::to_string);
            DlpRule {
                name: p.name,
                display_name: text("displayName"),
                triggers: v
                    .get("triggers")
                    .and_then(Value::as_array)
                    .map(|a| a.iter().filter_map(Value::as_str).map(str::to_string).collect())
                    .unwrap_or_default(),
                action: v.get("action").and_then(action_label),
                state: text("state"),
                org_unit: p.policy_query.org_unit,
            }
        })
        .collect()
}

/// `{"chromeAction": {"blockContent": {}}}` becomes `chromeAction.blockContent`.
fn action_label(action: &Value) -> Option<String> {
    match action {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => {
            let (key, inner) = map.iter().next()?;
            Some(match action_label(inner) {
                Some(rest) => format!("{key}.{rest}"),
                None => key.clone(),
            })
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Chrome Policy: customers.policies.resolve
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolveResponse {
    pub resolved_policies: Vec<ResolvedPolicy>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolvedPolicy {
    pub target_key: Option<PolicyKey>,
    pub source_key: Option<PolicyKey>,
    pub value: Option<PolicyValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyKey {
    pub target_resource: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyValue {
    pub policy_schema: Option<String>,
    pub value: Option<Value>,
}

impl ResolveResponse {
    /// The resource a policy is *set* at (`sourceKey`), not where it was resolved.
    pub fn into_targets(self) -> Vec<PolicyTarget> {
        self.resolved_policies
            .into_iter()
            .filter_map(|p| {
                let resource = p
                    .source_key
                    .or(p.target_key)
                    .map(|k| k.target_resource)
                    .filter(|r| !r.is_empty())?;
                let value = p.value.unwrap_or_default();
                Some(PolicyTarget {
                    target_resource: resource,
                    policy_schema: value.policy_schema,
                    value: value.value,
                })
            })
            .filter(|t| {
                t.policy_schema
                    .as_deref()
                    .map(|s| s.to_ascii_lowercase().contains("connector"))
                    .unwrap_or(true)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Admin SDK Directory: orgunits.list
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrgUnitList {
    pub organization_units: Vec<OrgUnit>,
}

// ---------------------------------------------------------------------------
// OAuth2 tokeninfo
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TokenInfo {
    pub scope: String,
    pub expires_in: Value,
    pub issued_to: Option<String>,
    pub azp: Option<String>,
    pub aud: Option<String>,
}

impl TokenInfo {
    pub fn into_auth(self) -> AuthInfo {
        let expires_in = match &self.expires_in {
            Value::Number(n) => n.as_i64().unwrap_or_default(),
            Value::String(s) => s.trim().parse().unwrap_or_default(),
            _ => 0,
        };
        AuthInfo {
            scope: self.scope.split_whitespace().map(str::to_string).collect(),
            expires_in,
            issued_to: self.issued_to.or(self.azp).or(self.aud).unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Admin SDK Directory: chrome enrollment tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EnrollmentTokenResponse {
    pub token: String,
    pub expire_time: Option<String>,
}

impl EnrollmentTokenResponse {
    pub fn into_token(self) -> EnrollmentToken {
        EnrollmentToken {
            token: self.token,
            expires_at: self.expire_time.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn activity_parameters_are_flattened() {
        let list: ActivityList = serde_json::from_value(json!({
            "items": [{
                "id": { "time": "2024-05-01T10:00:00Z" },
                "actor": { "email": "jane@example.com" },
                "events": [{
                    "name": "CONTENT_UNSCANNED",
                    "parameters": [
                        { "name": "DEVICE_NAME", "value": "laptop-7" },
                        { "name": "EVENT_REASON", "value": "FILE_TOO_LARGE" }
                    ]
                }]
            }]
        }))
        .unwrap();
        let events = list.into_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_name, "CONTENT_UNSCANNED");
        assert_eq!(events[0].device_name.as_deref(), Some("laptop-7"));
        assert_eq!(events[0].actor_email.as_deref(), Some("jane@example.com"));
    }

    #[test]
    fn resolve_prefers_source_key() {
        let r: ResolveResponse = serde_json::from_value(json!({
            "resolvedPolicies": [{
                "targetKey": { "targetResource": "orgunits/OU1" },
                "sourceKey": { "targetResource": "customers/C123" },
                "value": { "policySchema": "chrome.users.OnFileAttachedConnectorPolicy", "value": {} }
            }, {
                "targetKey": { "targetResource": "orgunits/OU1" },
                "value": { "policySchema": "chrome.users.Homepage", "value": {} }
            }]
        }))
        .unwrap();
        let targets = r.into_targets();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].target_resource, "customers/C123");
    }

    #[test]
    fn dlp_rules_are_picked_from_settings() {
        let list: PolicyList = serde_json::from_value(json!({
            "policies": [{
                "name": "policies/abc",
                "policyQuery": { "orgUnit": "orgUnits/OU1" },
                "setting": {
                    "type": "settings/rule.dlp",
                    "value": {
                        "displayName": "Block SSN",
                        "triggers": ["google.workspace.chrome.file.v1.upload"],
                        "action": { "chromeAction": { "blockContent": {} } },
                        "state": "ACTIVE"
                    }
                }
            }, {
                "name": "policies/other",
                "setting": { "type": "settings/security.session_controls", "value": {} }
            }]
        }))
        .unwrap();
        let rules = dlp_rules(list.policies, "rule.dlp");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].action.as_deref(), Some("chromeAction.blockContent"));
        assert_eq!(rules[0].org_unit.as_deref(), Some("orgUnits/OU1"));
    }

    #[test]
    fn tokeninfo_uses_azp_when_issued_to_is_absent() {
        let t: TokenInfo = serde_json::from_value(json!({
            "azp": "1234.apps.googleusercontent.com",
            "scope": "openid https://www.googleapis.com/auth/chrome.management.policy",
            "expires_in": "3599"
        }))
        .unwrap();
        let auth = t.into_auth();
        assert_eq!(auth.scope.len(), 2);
        assert_eq!(auth.expires_in, 3599);
        assert_eq!(auth.issued_to, "1234.apps.googleusercontent.com");
    }
}

use crate::connector::analyze_connector_targets;
use crate::evidence::ToolOutcomes;

use super::types::{FollowUp, Probe};

/// Decide the second wave from the first wave's outcomes.
///
/// Auth introspection only pays off when something already looks like an
/// access problem; org units are only needed to name a retargeting destination.
pub(super) fn plan_follow_ups(first_wave: &ToolOutcomes) -> Vec<Probe> {
    let mut probes = Vec::new();

    if let Some(reason) = auth_reason(first_wave) {
        probes.push(Probe {
            kind: FollowUp::AuthIntrospection,
            reason,
        });
    }

    let flagged = first_wave
        .connector
        .as_ref()
        .and_then(|r| r.as_success())
        .map(|c| analyze_connector_targets(&c.value).flag)
        .unwrap_or(false);
    if flagged {
        probes.push(Probe {
            kind: FollowUp::OrgUnitListing,
            reason: "a connector policy targets the whole customer".to_string(),
        });
    }

    probes
}

fn auth_reason(first_wave: &ToolOutcomes) -> Option<String> {
    if let Some((source, _)) = first_wave.failures().first() {
        return Some(format!("{source} did not respond"));
    }
    let no_rules = first_wave
        .dlp_rules
        .as_ref()
        .and_then(|r| r.as_success())
        .map(|p| p.rules.is_empty())
        .unwrap_or(false);
    if no_rules {
        return Some("no DLP rules were returned".to_string());
    }
    let no_policies = first_wave
        .connector
        .as_ref()
        .and_then(|r| r.as_success())
        .map(|c| c.value.is_empty())
        .unwrap_or(false);
    if no_policies {
        return Some("no connector policies were returned".to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{
        ConnectorConfig, DlpRule, EventsPayload, PolicyTarget, RulesPayload, ToolResult,
    };

    fn target(resource: &str) -> PolicyTarget {
        PolicyTarget {
            target_resource: resource.into(),
            policy_schema: Some("chrome.users.OnFileAttachedConnectorPolicy".into()),
            value: None,
        }
    }

    fn rule() -> DlpRule {
        DlpRule {
            name: "policies/1".into(),
            display_name: None,
            triggers: vec![],
            action: None,
            state: Some("ACTIVE".into()),
            org_unit: None,
        }
    }

    fn healthy() -> ToolOutcomes {
        ToolOutcomes {
            events: Some(ToolResult::success(EventsPayload { events: vec![] })),
            dlp_rules: Some(ToolResult::success(RulesPayload { rules: vec![rule()] })),
            connector: Some(ToolResult::success(ConnectorConfig {
                value: vec![target("orgunits/OU1")],
                errors: vec![],
                target_resource: None,
            })),
            ..Default::default()
        }
    }

    #[test]
    fn healthy_first_wave_needs_no_follow_up() {
        assert!(plan_follow_ups(&healthy()).is_empty());
    }

    #[test]
    fn any_failure_triggers_auth_probe() {
        let mut o = healthy();
        o.events = Some(ToolResult::failure("UNAVAILABLE"));
        let probes = plan_follow_ups(&o);
        assert_eq!(probes.len(), 1);
        assert_eq!(probes[0].kind, FollowUp::AuthIntrospection);
        assert!(probes[0].reason.contains("Admin SDK Reports"));
    }

    #[test]
    fn empty_rules_trigger_auth_probe() {
        let mut o = healthy();
        o.dlp_rules = Some(ToolResult::success(RulesPayload { rules: vec![] }));
        assert_eq!(plan_follow_ups(&o)[0].kind, FollowUp::AuthIntrospection);
    }

    #[test]
    fn customer_target_triggers_org_unit_listing() {
        let mut o = healthy();
        o.connector = Some(ToolResult::success(ConnectorConfig {
            value: vec![target("customers/C123"), target("orgunits/OU1")],
            errors: vec![],
            target_resource: None,
        }));
        let kinds: Vec<FollowUp> = plan_follow_ups(&o).into_iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec![FollowUp::OrgUnitListing]);
    }
}

//! Fleet overview: a short status summary built from the same three sources
//! the first diagnosis wave reads.

use crate::connector::analyze_connector_targets;
use crate::evidence::names::*;
use crate::tool::{
    ConnectorConfig, EventsPayload, OverviewCounts, OverviewSummary, RulesPayload, ToolResult,
};

pub fn build_overview(
    events: &ToolResult<EventsPayload>,
    rules: &ToolResult<RulesPayload>,
    connector: &ToolResult<ConnectorConfig>,
) -> ToolResult<OverviewSummary> {
    let (ev, ru, co) = (events.as_success(), rules.as_success(), connector.as_success());

    if ev.is_none() && ru.is_none() && co.is_none() {
        let errors: Vec<&str> = [events.error(), rules.error(), connector.error()]
            .into_iter()
            .flatten()
            .collect();
        return ToolResult::failure(format!("no fleet data available: {}", errors.join("; ")));
    }

    let mut key_points = Vec::new();
    let mut suggestions = Vec::new();
    let mut sources = Vec::new();
    let mut counts = OverviewCounts::default();

    match (ev, events.error()) {
        (Some(p), _) => {
            sources.push(SOURCE_REPORTS.to_string());
            counts.events = Some(p.events.len());
            key_points.push(format!("{} recent Chrome events", p.events.len()));
        }
        (None, Some(err)) => key_points.push(format!("Chrome events unavailable: {err}")),
        (None, None) => {}
    }

    match (ru, rules.error()) {
        (Some(p), _) => {
            sources.push(SOURCE_CLOUD_IDENTITY.to_string());
            let active = p.rules.iter().filter(|r| r.is_active()).count();
            counts.dlp_rules = Some(p.rules.len());
            key_points.push(format!("{} DLP rules ({} active)", p.rules.len(), active));
            if p.rules.is_empty() {
                suggestions.push("Create DLP rules for the data you need to protect".to_string());
            } else if active == 0 {
                suggestions.push("Activate at least one DLP rule".to_string());
            }
        }
        (None, Some(err)) => key_points.push(format!("DLP rules unavailable: {err}")),
        (None, None) => {}
    }

    match (co, connector.error()) {
        (Some(c), _) => {
            sources.push(SOURCE_CHROME_POLICY.to_string());
            let analysis = analyze_connector_targets(&c.value);
            counts.connector_policies = Some(analysis.total);
            counts.mis_scoped_policies = Some(analysis.mis_scoped);
            key_points.push(format!(
                "{} connector policies ({} customer, {} org unit, {} group)",
                analysis.total,
                analysis.by_target.customer,
                analysis.by_target.org_unit,
                analysis.by_target.group
            ));
            if let Some(sample) = analysis.sample_target.as_deref().filter(|_| analysis.flag) {
                suggestions.push(format!(
                    "Retarget connector policies applied at {sample} to org units or groups"
                ));
            }
        }
        (None, Some(err)) => key_points.push(format!("Connector policies unavailable: {err}")),
        (None, None) => {}
    }

    let attention = suggestions.len();
    let headline = if attention == 0 {
        "Fleet looks healthy".to_string()
    } else {
        format!("{attention} item(s) need attention")
    };
    let summary = format!("Checked {} of 3 data sources: {}", sources.len(), sources.join(", "));

    ToolResult::success(OverviewSummary {
        headline,
        summary,
        key_points,
        suggestions,
        counts,
        sources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::PolicyTarget;

    fn connector(targets: &[&str]) -> ToolResult<ConnectorConfig> {
        ToolResult::success(ConnectorConfig {
            value: targets
                .iter()
                .map(|t| PolicyTarget {
                    target_resource: t.to_string(),
                    policy_schema: None,
                    value: None,
                })
                .collect(),
            errors: vec![],
            target_resource: None,
        })
    }

    #[test]
    fn all_sources_failing_is_a_failure() {
        let out = build_overview(
            &ToolResult::failure("UNAVAILABLE"),
            &ToolResult::failure("PERMISSION_DENIED"),
            &ToolResult::failure("HTTP 500"),
        );
        assert_eq!(
            out.error(),
            Some("no fleet data available: UNAVAILABLE; PERMISSION_DENIED; HTTP 500")
        );
    }

    #[test]
    fn mis_scoping_and_missing_rules_are_suggested() {
        let out = build_overview(
            &ToolResult::failure("UNAVAILABLE"),
            &ToolResult::success(RulesPayload { rules: vec![] }),
            &connector(&["customers/C123", "orgunits/OU1"]),
        );
        let s = out.as_success().unwrap();
        assert_eq!(s.headline, "2 item(s) need attention");
        assert_eq!(s.counts.mis_scoped_policies, Some(1));
        assert_eq!(s.counts.events, None);
        assert_eq!(s.sources, vec![SOURCE_CLOUD_IDENTITY, SOURCE_CHROME_POLICY]);
        assert!(s.key_points.iter().any(|k| k.contains("UNAVAILABLE")));
        assert!(s.suggestions[1].contains("customers/C123"));
    }
}

use chrono::{DateTime, FixedOffset};

use crate::connector::analyze_connector_targets;
use crate::tool::{
    AuthInfo, ChromeEvent, ConnectorConfig, EventsPayload, OrgUnitsPayload, RulesPayload,
    ToolResult,
};

use super::names::*;
use super::outcomes::ToolOutcomes;
use super::types::{CheckStatus, EvidenceBundle, EvidenceCheck, EvidenceGap, EvidenceSignal};

/// Scopes the diagnosis needs to read connector policy and DLP rules.
pub const REQUIRED_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/chrome.management.policy",
    "https://www.googleapis.com/auth/cloud-identity.policies",
];

/// Event name/result fragments that indicate a DLP or connector verdict.
const CONTENT_SCAN_MARKERS: [&str; 5] = ["dlp", "content_", "sensitive", "malware", "unscanned"];

#[derive(Default)]
struct EvidenceBuilder {
    checks: Vec<EvidenceCheck>,
    gaps: Vec<EvidenceGap>,
    signals: Vec<EvidenceSignal>,
    sources: Vec<String>,
}

impl EvidenceBuilder {
    fn check(&mut self, name: &str, status: CheckStatus, detail: Option<String>, source: &str) {
        self.checks.push(EvidenceCheck {
            name: name.to_string(),
            status,
            detail,
            source: source.to_string(),
        });
    }

    fn gap(&mut self, missing: impl Into<String>, why: impl Into<String>) {
        self.gaps.push(EvidenceGap {
            missing: missing.into(),
            why: why.into(),
        });
    }

    fn signal(&mut self, kind: &str, source: &str, summary: String, url: Option<&str>) {
        self.signals.push(EvidenceSignal {
            kind: kind.to_string(),
            source: source.to_string(),
            summary,
            reference_url: url.map(str::to_string),
        });
    }

    fn source(&mut self, name: &str) {
        self.sources.push(name.to_string());
    }

    /// Error result: unknown check plus a gap quoting the upstream text as-is.
    fn unavailable(&mut self, name: &str, source: &str, error: &str) {
        self.check(
            name,
            CheckStatus::Unknown,
            Some(format!("{} did not respond: {}", source, error)),
            source,
        );
        self.gap(name, error);
    }
}

/// Run the fixed check battery over the tool results.
///
/// Pure and deterministic: the same outcomes always produce the same bundle.
/// A failed source contributes an `unknown` check and a gap but never stops
/// the remaining checks.
pub fn aggregate(outcomes: &ToolOutcomes) -> EvidenceBundle {
    let mut b = EvidenceBuilder::default();

    if let Some(r) = &outcomes.events {
        events_checks(&mut b, r);
    }
    if let Some(r) = &outcomes.dlp_rules {
        dlp_checks(&mut b, r);
    }
    let connector_analysis = match &outcomes.connector {
        Some(r) => connector_checks(&mut b, r),
        None => None,
    };
    if let Some(r) = &outcomes.org_units {
        org_unit_checks(&mut b, r);
    }
    if let Some(r) = &outcomes.auth {
        auth_checks(&mut b, r);
    }

    tracing::debug!(
        target: "fleetscope.aggregate",
        checks = b.checks.len(),
        gaps = b.gaps.len(),
        signals = b.signals.len(),
        sources = b.sources.len(),
        "evidence aggregated"
    );

    EvidenceBundle {
        checks: b.checks,
        gaps: b.gaps,
        signals: b.signals,
        sources: b.sources,
        connector_analysis,
    }
}

fn is_content_scan_event(ev: &ChromeEvent) -> bool {
    let name = ev.event_name.to_ascii_lowercase();
    let result = ev.result.as_deref().unwrap_or_default().to_ascii_lowercase();
    CONTENT_SCAN_MARKERS
        .iter()
        .any(|m| name.contains(m) || result.contains(m))
}

/// Latest event by timestamp; unparseable timestamps sort first, ties keep input order.
fn latest_event<'a>(events: impl IntoIterator<Item = &'a ChromeEvent>) -> Option<&'a ChromeEvent> {
    let ts = |ev: &ChromeEvent| -> Option<DateTime<FixedOffset>> {
        ev.time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
    };
    events.into_iter().fold(None, |best: Option<&ChromeEvent>, ev| match best {
        Some(cur) if ts(ev) <= ts(cur) => Some(cur),
        _ => Some(ev),
    })
}

fn events_checks(b: &mut EvidenceBuilder, r: &ToolResult<EventsPayload>) {
    let payload = match r {
        ToolResult::Success(p) => p,
        ToolResult::Failure(f) => return b.unavailable(CHECK_EVENTS, SOURCE_REPORTS, &f.error),
    };
    b.source(SOURCE_REPORTS);

    let count = payload.events.len();
    if count == 0 {
        b.check(
            CHECK_EVENTS,
            CheckStatus::Unknown,
            Some("No recent Chrome events were returned".into()),
            SOURCE_REPORTS,
        );
        return;
    }
    b.check(
        CHECK_EVENTS,
        CheckStatus::Pass,
        Some(format!("{} recent Chrome events", count)),
        SOURCE_REPORTS,
    );

    let scanned: Vec<&ChromeEvent> = payload
        .events
        .iter()
        .filter(|e| is_content_scan_event(e))
        .collect();
    if scanned.is_empty() {
        b.signal(
            SIGNAL_NO_CONTENT_SCAN_EVENTS,
            SOURCE_REPORTS,
            format!(
                "None of the {} recent events show a DLP or connector verdict",
                count
            ),
            None,
        );
    } else {
        let latest = latest_event(scanned.iter().copied())
            .map(|e| match &e.time {
                Some(t) => format!(" (latest: {} at {})", e.event_name, t),
                None => format!(" (latest: {})", e.event_name),
            })
            .unwrap_or_default();
        b.signal(
            SIGNAL_CONTENT_SCAN_EVENTS,
            SOURCE_REPORTS,
            format!(
                "{} of {} recent events carry a DLP or connector verdict{}",
                scanned.len(),
                count,
                latest
            ),
            None,
        );
    }
}

fn dlp_checks(b: &mut EvidenceBuilder, r: &ToolResult<RulesPayload>) {
    let payload = match r {
        ToolResult::Success(p) => p,
        ToolResult::Failure(f) => {
            return b.unavailable(CHECK_DLP_RULES, SOURCE_CLOUD_IDENTITY, &f.error)
        }
    };
    b.source(SOURCE_CLOUD_IDENTITY);

    let count = payload.rules.len();
    if count == 0 {
        b.check(
            CHECK_DLP_RULES,
            CheckStatus::Fail,
            Some("No DLP rules are configured".into()),
            SOURCE_CLOUD_IDENTITY,
        );
        return;
    }

    let active = payload.rules.iter().filter(|r| r.is_active()).count();
    b.check(
        CHECK_DLP_RULES,
        CheckStatus::Pass,
        Some(format!("{} DLP rules ({} active)", count, active)),
        SOURCE_CLOUD_IDENTITY,
    );
    if active == 0 {
        b.signal(
            SIGNAL_DLP_RULES_INACTIVE,
            SOURCE_CLOUD_IDENTITY,
            format!("All {} DLP rules are inactive", count),
            Some(DLP_HELP_URL),
        );
    }
}

fn connector_checks(
    b: &mut EvidenceBuilder,
    r: &ToolResult<ConnectorConfig>,
) -> Option<crate::connector::ConnectorAnalysis> {
    let cfg = match r {
        ToolResult::Success(c) => c,
        ToolResult::Failure(f) => {
            b.unavailable(CHECK_CONNECTOR_POLICIES, SOURCE_CHROME_POLICY, &f.error);
            return None;
        }
    };
    b.source(SOURCE_CHROME_POLICY);

    for err in &cfg.errors {
        let target = err.target_resource.as_deref().unwrap_or("unknown target");
        b.gap(format!("Connector policy for {}", target), err.message.clone());
    }

    let analysis = analyze_connector_targets(&cfg.value);
    if !analysis.has_data() {
        b.check(
            CHECK_CONNECTOR_POLICIES,
            CheckStatus::Unknown,
            Some("No connector policies were resolved".into()),
            SOURCE_CHROME_POLICY,
        );
        b.gap(
            CHECK_CONNECTOR_POLICIES,
            "No connector policies were returned, so their scoping cannot be confirmed",
        );
        return Some(analysis);
    }

    b.check(
        CHECK_CONNECTOR_POLICIES,
        CheckStatus::Pass,
        Some(format!("{} connector policies resolved", analysis.total)),
        SOURCE_CHROME_POLICY,
    );

    if analysis.flag {
        let sample = analysis.sample_target.clone().unwrap_or_default();
        b.check(
            CHECK_CONNECTOR_SCOPING,
            CheckStatus::Fail,
            Some(format!(
                "{} of {} connector policies are applied at customer level ({})",
                analysis.mis_scoped, analysis.total, sample
            )),
            SOURCE_CHROME_POLICY,
        );
        b.signal(
            SIGNAL_CONNECTOR_MIS_SCOPED,
            SOURCE_CHROME_POLICY,
            format!(
                "Connector policy targets {} directly, overriding org unit and group assignments",
                sample
            ),
            Some(CONNECTOR_HELP_URL),
        );
        b.gap(
            "Org unit or group targeting for connector policy",
            format!(
                "Policy applied at {} covers the whole customer; retarget it to the intended org unit or group",
                sample
            ),
        );
    } else {
        b.check(
            CHECK_CONNECTOR_SCOPING,
            CheckStatus::Pass,
            Some(format!(
                "All {} connector policies target org units or groups",
                analysis.total
            )),
            SOURCE_CHROME_POLICY,
        );
    }

    Some(analysis)
}

fn org_unit_checks(b: &mut EvidenceBuilder, r: &ToolResult<OrgUnitsPayload>) {
    let payload = match r {
        ToolResult::Success(p) => p,
        ToolResult::Failure(f) => return b.unavailable(CHECK_ORG_UNITS, SOURCE_DIRECTORY, &f.error),
    };
    b.source(SOURCE_DIRECTORY);

    let count = payload.org_units.len();
    let (status, detail) = if count > 0 {
        (CheckStatus::Pass, format!("{} org units", count))
    } else {
        (CheckStatus::Unknown, "No org units were returned".to_string())
    };
    b.check(CHECK_ORG_UNITS, status, Some(detail), SOURCE_DIRECTORY);
}

fn auth_checks(b: &mut EvidenceBuilder, r: &ToolResult<AuthInfo>) {
    let info = match r {
        ToolResult::Success(i) => i,
        ToolResult::Failure(f) => {
            return b.unavailable(CHECK_AUTH_SCOPES, SOURCE_TOKEN_INFO, &f.error)
        }
    };
    b.source(SOURCE_TOKEN_INFO);

    let missing: Vec<&str> = REQUIRED_SCOPES
        .iter()
        .copied()
        .filter(|req| !info.scope.iter().any(|s| s.as_str() == *req))
        .collect();
    let extra: Vec<&str> = info
        .scope
        .iter()
        .map(String::as_str)
        .filter(|s| !REQUIRED_SCOPES.contains(s))
        .collect();

    if missing.is_empty() {
        let mut detail = format!("All {} required scopes granted", REQUIRED_SCOPES.len());
        if !extra.is_empty() {
            detail.push_str(&format!("; {} additional scopes", extra.len()));
        }
        b.check(CHECK_AUTH_SCOPES, CheckStatus::Pass, Some(detail), SOURCE_TOKEN_INFO);
        return;
    }

    b.check(
        CHECK_AUTH_SCOPES,
        CheckStatus::Fail,
        Some(format!("Missing required scopes: {}", missing.join(", "))),
        SOURCE_TOKEN_INFO,
    );
    for scope in missing {
        b.gap(scope, "Required OAuth scope is not granted to the current token");
    }
}

//! The ordered hypothesis rule table.
//!
//! Order is precedence: when several rules match, the first one in
//! [`RULE_TABLE`] supplies the diagnosis sentence. Every matching rule still
//! becomes a scored hypothesis.

use crate::evidence::names::*;
use crate::evidence::{CheckStatus, EvidenceBundle, EvidenceGap, REQUIRED_SCOPES};
use crate::tool::OrgUnit;

use super::types::MissingQuestion;

const ADMIN_SDK_HELP_URL: &str = "https://developers.google.com/admin-sdk/directory";

pub struct RuleContext<'a> {
    pub evidence: &'a EvidenceBundle,
    pub org_units: &'a [OrgUnit],
}

pub struct HypothesisRule {
    pub id: &'static str,
    /// Problem-statement fragments (lowercase) that earn one corroboration step.
    pub keywords: &'static [&'static str],
    pub reference: Option<(&'static str, &'static str)>,
    pub applies: fn(&EvidenceBundle) -> bool,
    pub cause: fn(&RuleContext<'_>) -> String,
    /// One line per corroborating check or signal; its length drives confidence.
    pub corroboration: fn(&EvidenceBundle) -> Vec<String>,
    pub remediation: fn(&RuleContext<'_>) -> Vec<String>,
    pub question: fn(&RuleContext<'_>) -> MissingQuestion,
}

impl HypothesisRule {
    pub fn mentioned_in(&self, problem: &str) -> bool {
        let p = problem.to_lowercase();
        self.keywords.iter().any(|k| p.contains(k))
    }
}

pub static RULE_TABLE: &[HypothesisRule] = &[
    HypothesisRule {
        id: "connector_mis_scoped",
        keywords: &["connector", "upload", "download", "scan", "print", "paste"],
        reference: Some(("Chrome Policy API: policy targets", CONNECTOR_HELP_URL)),
        applies: |e| e.connector_flagged(),
        cause: |ctx| {
            format!(
                "Connector policy is applied at the customer level ({}) instead of the intended org unit or group",
                sample_target(ctx.evidence)
            )
        },
        corroboration: |e| {
            let mut lines = failing_detail(e, CHECK_CONNECTOR_SCOPING);
            lines.extend(signal_summary(e, SIGNAL_CONNECTOR_MIS_SCOPED));
            lines.extend(signal_summary(e, SIGNAL_CONTENT_SCAN_EVENTS));
            lines
        },
        remediation: |ctx| {
            let sample = sample_target(ctx.evidence);
            let retarget = match suggested_org_unit(ctx.org_units) {
                Some(path) => format!(
                    "Retarget the connector policy from {} to the affected org unit (for example {})",
                    sample, path
                ),
                None => format!(
                    "Retarget the connector policy from {} to the affected org unit or group",
                    sample
                ),
            };
            vec![
                retarget,
                "Remove the customer-level connector setting so org unit and group assignments take effect".into(),
                "Repeat the affected upload or download once the policy change has propagated".into(),
            ]
        },
        question: |_| MissingQuestion {
            question: "Should the connector policy cover the whole organization, or only specific org units or groups?".into(),
            why: "A customer-level policy is sometimes intentional, and retargeting it changes coverage for every user".into(),
            example: Some("Only the /Engineering org unit should have uploads scanned".into()),
        },
    },
    HypothesisRule {
        id: "missing_dlp_rules",
        keywords: &["dlp", "sensitive", "leak", "ssn", "credit card", "data loss", "not blocked"],
        reference: Some(("Cloud Identity documentation", DLP_HELP_URL)),
        applies: |e| {
            e.status_of(CHECK_DLP_RULES) == Some(CheckStatus::Fail)
                || e.has_signal(SIGNAL_DLP_RULES_INACTIVE)
        },
        cause: |ctx| {
            if ctx.evidence.status_of(CHECK_DLP_RULES) == Some(CheckStatus::Fail) {
                "No DLP rules are configured, so content is never inspected or blocked".into()
            } else {
                "DLP rules exist but none are active, so content is never inspected or blocked".into()
            }
        },
        corroboration: |e| {
            let mut lines = failing_detail(e, CHECK_DLP_RULES);
            lines.extend(signal_summary(e, SIGNAL_DLP_RULES_INACTIVE));
            lines.extend(signal_summary(e, SIGNAL_NO_CONTENT_SCAN_EVENTS));
            lines
        },
        remediation: |_| {
            vec![
                "Create a DLP rule covering the affected trigger (upload, paste, print or download)".into(),
                "Set the rule state to Active and scope it to the affected org unit".into(),
                "Verify enforcement with a test file that matches the rule's condition".into(),
            ]
        },
        question: |_| MissingQuestion {
            question: "Which action should have been blocked or warned on: upload, paste, print or download?".into(),
            why: "Each trigger needs its own DLP rule condition".into(),
            example: Some("Uploading a spreadsheet with customer SSNs to a personal drive".into()),
        },
    },
    HypothesisRule {
        id: "insufficient_auth_scope",
        keywords: &["scope", "oauth", "token", "unauthorized", "403"],
        reference: Some(("OAuth 2.0 scopes for Google APIs", SCOPES_HELP_URL)),
        applies: |e| e.status_of(CHECK_AUTH_SCOPES) == Some(CheckStatus::Fail),
        cause: |ctx| {
            format!(
                "The diagnostic credential is missing required OAuth scopes ({})",
                missing_scopes(ctx.evidence).join(", ")
            )
        },
        corroboration: |e| {
            let mut lines = failing_detail(e, CHECK_AUTH_SCOPES);
            lines.extend(permission_gaps(e).into_iter().map(describe_gap));
            lines
        },
        remediation: |ctx| {
            vec![
                format!(
                    "Re-authorize the diagnostic client with: {}",
                    missing_scopes(ctx.evidence).join(", ")
                ),
                "Confirm the OAuth client is allowed those scopes under API controls".into(),
                "Run the diagnosis again with the new token".into(),
            ]
        },
        question: |_| MissingQuestion {
            question: "Which admin account and OAuth client issue the token used for diagnosis?".into(),
            why: "Scopes are granted per client, so the fix depends on who issued the token".into(),
            example: Some("admin@example.com through the support console client".into()),
        },
    },
    HypothesisRule {
        id: "source_access_denied",
        keywords: &["permission", "access denied", "forbidden", "admin role"],
        reference: Some(("Admin SDK Directory API", ADMIN_SDK_HELP_URL)),
        applies: |e| !permission_gaps(e).is_empty(),
        cause: |ctx| {
            format!(
                "The diagnostic account was denied access to {}",
                denied_sources(ctx.evidence).join(", ")
            )
        },
        corroboration: |e| permission_gaps(e).into_iter().map(describe_gap).collect(),
        remediation: |ctx| {
            vec![
                format!(
                    "Grant the diagnostic account an admin role that can read {}",
                    denied_sources(ctx.evidence).join(", ")
                ),
                "Check that the corresponding APIs are enabled for the project".into(),
            ]
        },
        question: |_| MissingQuestion {
            question: "Does the account running the diagnosis hold a super admin or delegated admin role?".into(),
            why: "Permission errors come from the account's role, not from the fleet configuration".into(),
            example: Some("Delegated admin with the Chrome management privilege only".into()),
        },
    },
    HypothesisRule {
        id: "no_distinguishing_evidence",
        keywords: &[],
        reference: None,
        applies: |e| !e.any_failed() && !e.has_signal(SIGNAL_DLP_RULES_INACTIVE),
        cause: |ctx| {
            if ctx.evidence.gaps.is_empty() {
                "No configuration problem was found in the data sources checked".into()
            } else {
                "No configuration problem was found, but some data sources could not be checked".into()
            }
        },
        corroboration: |_| Vec::new(),
        remediation: |ctx| {
            let mut steps = vec![
                "Share the affected user, device and approximate time so events can be narrowed down".into(),
                "Reproduce the problem and run the diagnosis again".into(),
            ];
            if !ctx.evidence.gaps.is_empty() {
                steps.insert(
                    0,
                    "Resolve the data source gaps listed in the evidence and run the diagnosis again".into(),
                );
            }
            steps
        },
        question: |_| MissingQuestion {
            question: "Which user or device is affected, and roughly when did the problem happen?".into(),
            why: "The checked configuration looks consistent, so the problem needs to be tied to specific events".into(),
            example: Some(
                "jane@example.com on a managed Windows laptop, yesterday around 14:00".into(),
            ),
        },
    },
];

fn sample_target(e: &EvidenceBundle) -> String {
    e.connector_analysis
        .as_ref()
        .and_then(|a| a.sample_target.clone())
        .unwrap_or_else(|| "customers/unknown".to_string())
}

fn suggested_org_unit(org_units: &[OrgUnit]) -> Option<&str> {
    org_units
        .iter()
        .map(|ou| ou.org_unit_path.as_str())
        .find(|p| *p != "/" && !p.is_empty())
}

fn failing_detail(e: &EvidenceBundle, name: &str) -> Vec<String> {
    e.check(name)
        .filter(|c| c.status == CheckStatus::Fail)
        .map(|c| format!("{}: {}", c.name, c.detail.as_deref().unwrap_or("failed")))
        .into_iter()
        .collect()
}

fn signal_summary(e: &EvidenceBundle, kind: &str) -> Vec<String> {
    e.signal(kind).map(|s| s.summary.clone()).into_iter().collect()
}

fn is_permission_error(why: &str) -> bool {
    let u = why.to_ascii_uppercase();
    u.contains("PERMISSION_DENIED") || u.contains("FORBIDDEN") || u.contains("HTTP 403")
}

fn permission_gaps(e: &EvidenceBundle) -> Vec<&EvidenceGap> {
    e.gaps.iter().filter(|g| is_permission_error(&g.why)).collect()
}

fn denied_sources(e: &EvidenceBundle) -> Vec<String> {
    permission_gaps(e).iter().map(|g| g.missing.clone()).collect()
}

fn describe_gap(g: &EvidenceGap) -> String {
    format!("{}: {}", g.missing, g.why)
}

fn missing_scopes(e: &EvidenceBundle) -> Vec<String> {
    e.gaps
        .iter()
        .filter(|g| REQUIRED_SCOPES.contains(&g.missing.as_str()))
        .map(|g| g.missing.clone())
        .collect()
}

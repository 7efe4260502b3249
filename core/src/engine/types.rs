use serde::{Deserialize, Serialize};

use crate::connector::ConnectorAnalysis;
use crate::evidence::{EvidenceBundle, EvidenceCheck, EvidenceGap, EvidenceSignal};
use crate::hypothesis::{Hypothesis, MissingQuestion, Reference};

/// Second-wave calls, issued only when the first wave makes them worthwhile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUp {
    AuthIntrospection,
    OrgUnitListing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Probe {
    pub kind: FollowUp,
    pub reason: String,
}

impl Probe {
    pub fn describe(&self) -> String {
        let what = match self.kind {
            FollowUp::AuthIntrospection => "checked the OAuth scopes granted to the credential",
            FollowUp::OrgUnitListing => "listed org units to suggest a retargeting destination",
        };
        format!("{} because {}", what, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceReport {
    pub checks: Vec<EvidenceCheck>,
    pub gaps: Vec<EvidenceGap>,
    pub signals: Vec<EvidenceSignal>,
    pub sources: Vec<String>,
    /// `null` when the connector source did not respond.
    pub connector_analysis: Option<ConnectorAnalysis>,
}

impl From<EvidenceBundle> for EvidenceReport {
    fn from(b: EvidenceBundle) -> Self {
        Self {
            checks: b.checks,
            gaps: b.gaps,
            signals: b.signals,
            sources: b.sources,
            connector_analysis: b.connector_analysis,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    pub diagnosis: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
    pub next_steps: Vec<String>,
    pub hypotheses: Vec<Hypothesis>,
    pub plan_steps: Vec<String>,
    pub missing_questions: Vec<MissingQuestion>,
    pub evidence: EvidenceReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisError {
    pub error: String,
}

/// Either a full diagnosis or the terminal error; serialized as whichever it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiagnosisOutcome {
    Error(DiagnosisError),
    Result(Box<DiagnosisResult>),
}

impl DiagnosisOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, DiagnosisOutcome::Error(_))
    }

    pub fn result(&self) -> Option<&DiagnosisResult> {
        match self {
            DiagnosisOutcome::Result(r) => Some(r),
            DiagnosisOutcome::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            DiagnosisOutcome::Error(e) => Some(&e.error),
            DiagnosisOutcome::Result(_) => None,
        }
    }
}

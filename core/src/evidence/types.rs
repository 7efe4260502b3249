use serde::{Deserialize, Serialize};

use crate::connector::ConnectorAnalysis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceCheck {
    pub name: String,
    pub status: CheckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceGap {
    pub missing: String,
    pub why: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceSignal {
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,
}

/// Checks, gaps and signals from one round of tool calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceBundle {
    pub checks: Vec<EvidenceCheck>,
    pub gaps: Vec<EvidenceGap>,
    pub signals: Vec<EvidenceSignal>,
    pub sources: Vec<String>,
    pub connector_analysis: Option<ConnectorAnalysis>,
}

impl EvidenceBundle {
    pub fn check(&self, name: &str) -> Option<&EvidenceCheck> {
        self.checks.iter().find(|c| c.name == name)
    }

    pub fn status_of(&self, name: &str) -> Option<CheckStatus> {
        self.check(name).map(|c| c.status)
    }

    pub fn signal(&self, kind: &str) -> Option<&EvidenceSignal> {
        self.signals.iter().find(|s| s.kind == kind)
    }

    pub fn has_signal(&self, kind: &str) -> bool {
        self.signal(kind).is_some()
    }

    pub fn any_failed(&self) -> bool {
        self.checks.iter().any(|c| c.status == CheckStatus::Fail)
    }

    pub fn connector_flagged(&self) -> bool {
        self.connector_analysis
            .as_ref()
            .map(|a| a.flag)
            .unwrap_or(false)
    }
}

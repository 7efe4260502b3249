use serde::{Deserialize, Serialize};

use crate::tool::PolicyTarget;

/// Scope a policy target resource resolves to, by resource-type prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetScope {
    Customer,
    OrgUnit,
    Group,
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetBreakdown {
    pub customer: usize,
    pub org_unit: usize,
    pub group: usize,
    pub unknown: usize,
}

impl TargetBreakdown {
    pub fn total(&self) -> usize {
        self.customer + self.org_unit + self.group + self.unknown
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorAnalysis {
    pub flag: bool,
    pub total: usize,
    pub mis_scoped: usize,
    pub by_target: TargetBreakdown,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_target: Option<String>,
}

impl ConnectorAnalysis {
    /// `flag == false` with no targets means "nothing to judge", not "healthy".
    pub fn has_data(&self) -> bool {
        self.total > 0
    }
}

pub fn classify_target(resource: &str) -> TargetScope {
    let kind = resource
        .trim()
        .split('/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match kind.as_str() {
        "customers" => TargetScope::Customer,
        "orgunits" => TargetScope::OrgUnit,
        "groups" => TargetScope::Group,
        _ => TargetScope::Unknown,
    }
}

/// Classify connector policy targets by scope.
///
/// A policy applied at `customers/..` overrides every org-unit or group
/// assignment below it, so any such target sets `flag`. `sample_target` is the
/// first customer-scoped resource in input order.
pub fn analyze_connector_targets(targets: &[PolicyTarget]) -> ConnectorAnalysis {
    let mut by_target = TargetBreakdown::default();
    let mut sample_target = None;

    for t in targets {
        match classify_target(&t.target_resource) {
            TargetScope::Customer => {
                by_target.customer += 1;
                if sample_target.is_none() {
                    sample_target = Some(t.target_resource.clone());
                }
            }
            TargetScope::OrgUnit => by_target.org_unit += 1,
            TargetScope::Group => by_target.group += 1,
            TargetScope::Unknown => by_target.unknown += 1,
        }
    }

    let mis_scoped = by_target.customer;
    ConnectorAnalysis {
        flag: mis_scoped > 0,
        total: by_target.total(),
        mis_scoped,
        by_target,
        sample_target,
    }
}

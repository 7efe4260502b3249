use serde::Serialize;

use crate::tool::{
    AuthInfo, ConnectorConfig, EventsPayload, OrgUnitsPayload, RulesPayload, ToolResult,
};

use super::names;

/// Raw results of the tool calls issued for one diagnosis.
///
/// `None` means the call was not issued (e.g. the auth probe was not needed).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutcomes {
    pub events: Option<ToolResult<EventsPayload>>,
    pub dlp_rules: Option<ToolResult<RulesPayload>>,
    pub connector: Option<ToolResult<ConnectorConfig>>,
    pub org_units: Option<ToolResult<OrgUnitsPayload>>,
    pub auth: Option<ToolResult<AuthInfo>>,
}

impl ToolOutcomes {
    /// `(source, error)` for every issued call that failed, in battery order.
    pub fn failures(&self) -> Vec<(&'static str, &str)> {
        [
            (names::SOURCE_REPORTS, self.events.as_ref().and_then(|r| r.error())),
            (names::SOURCE_CLOUD_IDENTITY, self.dlp_rules.as_ref().and_then(|r| r.error())),
            (names::SOURCE_CHROME_POLICY, self.connector.as_ref().and_then(|r| r.error())),
            (names::SOURCE_DIRECTORY, self.org_units.as_ref().and_then(|r| r.error())),
            (names::SOURCE_TOKEN_INFO, self.auth.as_ref().and_then(|r| r.error())),
        ]
        .into_iter()
        .filter_map(|(source, err)| err.map(|e| (source, e)))
        .collect()
    }

    pub fn issued(&self) -> usize {
        [
            self.events.is_some(),
            self.dlp_rules.is_some(),
            self.connector.is_some(),
            self.org_units.is_some(),
            self.auth.is_some(),
        ]
        .into_iter()
        .filter(|issued| *issued)
        .count()
    }

    /// True when at least one call was issued and none succeeded.
    pub fn all_failed(&self) -> bool {
        let issued = self.issued();
        issued > 0 && self.failures().len() == issued
    }
}

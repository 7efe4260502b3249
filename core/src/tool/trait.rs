use async_trait::async_trait;

use super::payload::{
    AuthInfo, ConnectorConfig, EnrollTarget, EnrollmentToken, EventFilter, EventsPayload,
    OrgUnitsPayload, OverviewArgs, OverviewSummary, RuleFilter, RulesPayload,
};
use super::result::ToolResult;

/// One method per diagnostic data source.
///
/// Implementations must be safe to call concurrently from several tasks and
/// must report every failure through [`ToolResult::Failure`]; the orchestrator
/// treats all executors identically.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    fn name(&self) -> &str;

    /// Recent Chrome browser events from the audit log.
    async fn get_events(&self, filter: &EventFilter) -> ToolResult<EventsPayload>;

    /// DLP rules configured for the customer.
    async fn list_policy_rules(&self, filter: &RuleFilter) -> ToolResult<RulesPayload>;

    /// Connector policies and the resource each one is applied at.
    async fn get_connector_config(&self) -> ToolResult<ConnectorConfig>;

    async fn list_org_units(&self) -> ToolResult<OrgUnitsPayload>;

    async fn get_fleet_overview(&self, args: &OverviewArgs) -> ToolResult<OverviewSummary>;

    /// Introspect the credential the executor was built with.
    async fn debug_auth(&self) -> ToolResult<AuthInfo>;

    async fn enroll(&self, target: &EnrollTarget) -> ToolResult<EnrollmentToken>;
}

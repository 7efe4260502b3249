mod catalog;
mod decode;
mod payload;
mod result;
mod r#trait;

pub use catalog::{dispatch, ToolCall, ToolName};
pub use decode::{decode, upstream_error};
pub use payload::{
    AuthInfo, ChromeEvent, ConnectorConfig, DlpRule, EnrollTarget, EnrollmentToken, EventFilter,
    EventsPayload, OrgUnit, OrgUnitsPayload, OverviewArgs, OverviewCounts, OverviewSummary,
    PolicyTarget, RuleFilter, RulesPayload, TargetError,
};
pub use r#trait::ToolExecutor;
pub use result::{ToolFailure, ToolResult};

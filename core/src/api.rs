//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `fleetscope_core::api` instead of reaching into internal modules.

pub use crate::config::{
    AppConfig, DiagnosisConfig, ExecutorConfig, ExecutorProvider, FixtureConfig, LiveConfig,
    LoggingConfig, RuleWeights,
};
pub use crate::connector::{analyze_connector_targets, ConnectorAnalysis, TargetBreakdown};
pub use crate::credential::Credential;
pub use crate::engine::{
    run_diagnosis, DiagnosisError, DiagnosisOutcome, DiagnosisResult, EvidenceReport, FollowUp,
    Probe,
};
pub use crate::errors::{CliError, ConfigError, ExecutorError};
pub use crate::evidence::{
    aggregate, CheckStatus, EvidenceBundle, EvidenceCheck, EvidenceGap, EvidenceSignal,
    ToolOutcomes,
};
pub use crate::hypothesis::{
    synthesize, Hypothesis, MissingQuestion, Reference, Synthesis, SynthesisInput, RULE_TABLE,
};
pub use crate::overview::build_overview;
pub use crate::tool::{
    decode, dispatch, upstream_error, AuthInfo, ChromeEvent, ConnectorConfig, DlpRule,
    EnrollTarget, EnrollmentToken, EventFilter, EventsPayload, OrgUnit, OrgUnitsPayload,
    OverviewArgs, OverviewCounts, OverviewSummary, PolicyTarget, RuleFilter, RulesPayload,
    TargetError, ToolCall, ToolExecutor, ToolFailure, ToolName, ToolResult,
};

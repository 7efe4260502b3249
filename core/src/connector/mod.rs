mod analyzer;

pub use analyzer::{
    analyze_connector_targets, classify_target, ConnectorAnalysis, TargetBreakdown, TargetScope,
};

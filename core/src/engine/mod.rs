mod guard;
mod plan;
mod run;
mod types;

pub use run::run_diagnosis;
pub use types::{
    DiagnosisError, DiagnosisOutcome, DiagnosisResult, EvidenceReport, FollowUp, Probe,
};

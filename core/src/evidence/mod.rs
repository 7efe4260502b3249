mod aggregate;
pub mod names;
mod outcomes;
mod types;

pub use aggregate::{aggregate, REQUIRED_SCOPES};
pub use outcomes::ToolOutcomes;
pub use types::{CheckStatus, EvidenceBundle, EvidenceCheck, EvidenceGap, EvidenceSignal};

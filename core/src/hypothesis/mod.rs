mod rules;
mod synthesize;
mod types;

pub use rules::{HypothesisRule, RuleContext, RULE_TABLE};
pub use synthesize::{synthesize, SynthesisInput};
pub use types::{Hypothesis, MissingQuestion, Reference, Synthesis};

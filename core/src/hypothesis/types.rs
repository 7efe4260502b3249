use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    /// Stable id of the rule that produced this hypothesis.
    pub id: String,
    pub cause: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingQuestion {
    pub question: String,
    pub why: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub title: String,
    pub url: String,
}

/// Everything the synthesizer contributes to a diagnosis result.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub diagnosis: String,
    pub reference: Option<Reference>,
    pub hypotheses: Vec<Hypothesis>,
    pub next_steps: Vec<String>,
    pub plan_steps: Vec<String>,
    pub missing_questions: Vec<MissingQuestion>,
}

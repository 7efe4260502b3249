use crate::config::DiagnosisConfig;
use crate::engine::Probe;
use crate::evidence::names::*;
use crate::evidence::{CheckStatus, EvidenceBundle};
use crate::tool::OrgUnit;

use super::rules::{HypothesisRule, RuleContext, RULE_TABLE};
use super::types::{Hypothesis, MissingQuestion, Reference, Synthesis};

pub struct SynthesisInput<'a> {
    pub evidence: &'a EvidenceBundle,
    pub problem: &'a str,
    /// Follow-up probes the orchestrator issued after the first wave.
    pub probes: &'a [Probe],
    pub org_units: &'a [OrgUnit],
}

struct Scored {
    rule: &'static HypothesisRule,
    hypothesis: Hypothesis,
}

/// Turn an evidence bundle into a ranked, explainable diagnosis.
///
/// Pure and deterministic: the same input and config always produce the same
/// hypotheses, in the same order, with the same confidences.
pub fn synthesize(input: &SynthesisInput<'_>, cfg: &DiagnosisConfig) -> Synthesis {
    let ctx = RuleContext {
        evidence: input.evidence,
        org_units: input.org_units,
    };

    let matched: Vec<Scored> = RULE_TABLE
        .iter()
        .filter(|rule| (rule.applies)(input.evidence))
        .map(|rule| score(rule, &ctx, input.problem, cfg))
        .collect();

    // Table order decides the diagnosis; the fallback rule can only be absent
    // when some check failed, in which case an earlier rule matched.
    let winner = matched.first();

    let mut ranked: Vec<&Scored> = matched.iter().collect();
    ranked.sort_by(|a, b| b.hypothesis.confidence.total_cmp(&a.hypothesis.confidence));

    let tied = tied_with_top(&ranked, cfg.ambiguity_margin);

    let diagnosis = match (split_diagnosis(&tied), winner) {
        (Some(split), _) => split,
        (None, Some(w)) => w.hypothesis.cause.clone(),
        (None, None) => {
            "Some checks failed, but they do not match a known misconfiguration".to_string()
        }
    };

    let reference = winner.and_then(|w| w.rule.reference).map(|(title, url)| Reference {
        title: title.to_string(),
        url: url.to_string(),
    });

    let mut leading: Vec<&'static HypothesisRule> = winner.map(|w| w.rule).into_iter().collect();
    for rule in tied.iter().map(|t| t.rule) {
        if !leading.iter().any(|r| r.id == rule.id) {
            leading.push(rule);
        }
    }

    let mut next_steps: Vec<String> = Vec::new();
    for rule in &leading {
        for step in (rule.remediation)(&ctx) {
            if !next_steps.contains(&step) {
                next_steps.push(step);
            }
        }
    }
    next_steps.truncate(cfg.max_next_steps);

    let mut missing_questions: Vec<MissingQuestion> = Vec::new();
    for t in &tied {
        let q = (t.rule.question)(&ctx);
        if !missing_questions.contains(&q) {
            missing_questions.push(q);
        }
    }
    if let Some(w) = winner.filter(|w| w.rule.id == "no_distinguishing_evidence") {
        if input.evidence.status_of(CHECK_EVENTS) == Some(CheckStatus::Unknown) {
            let q = (w.rule.question)(&ctx);
            if !missing_questions.contains(&q) {
                missing_questions.push(q);
            }
        }
    }

    tracing::debug!(
        target: "fleetscope.synthesize",
        matched = matched.len(),
        winner = winner.map(|w| w.rule.id).unwrap_or("none"),
        tied = tied.len(),
        "hypotheses ranked"
    );

    Synthesis {
        diagnosis,
        reference,
        hypotheses: ranked.into_iter().map(|s| s.hypothesis.clone()).collect(),
        next_steps,
        plan_steps: plan_steps(input.evidence, input.probes),
        missing_questions,
    }
}

fn score(
    rule: &'static HypothesisRule,
    ctx: &RuleContext<'_>,
    problem: &str,
    cfg: &DiagnosisConfig,
) -> Scored {
    let lines = (rule.corroboration)(ctx.evidence);
    let mut steps = lines.len();
    if rule.mentioned_in(problem) {
        steps += 1;
    }
    let raw = cfg.weights.base_for(rule.id) + cfg.per_evidence * steps as f64;
    let confidence = (raw.clamp(0.0, 1.0) * 100.0).round() / 100.0;

    Scored {
        rule,
        hypothesis: Hypothesis {
            id: rule.id.to_string(),
            cause: (rule.cause)(ctx),
            confidence,
            evidence: if lines.is_empty() { None } else { Some(lines) },
        },
    }
}

/// Every hypothesis closer than `margin` to the top one, the top included.
/// Empty unless at least two are that close.
///
/// Compared in whole hundredths so float noise cannot flip the outcome.
fn tied_with_top<'a>(ranked: &[&'a Scored], margin: f64) -> Vec<&'a Scored> {
    let hundredths = |v: f64| (v * 100.0).round() as i64;
    let Some(top) = ranked.first() else {
        return Vec::new();
    };
    let top_score = hundredths(top.hypothesis.confidence);
    let tied: Vec<&Scored> = ranked
        .iter()
        .copied()
        .take_while(|s| top_score - hundredths(s.hypothesis.confidence) < hundredths(margin))
        .collect();
    if tied.len() < 2 {
        return Vec::new();
    }
    tied
}

fn split_diagnosis(tied: &[&Scored]) -> Option<String> {
    let causes: Vec<&str> = tied.iter().map(|t| t.hypothesis.cause.as_str()).collect();
    let (last, rest) = causes.split_last().filter(|(_, rest)| !rest.is_empty())?;
    let count = match causes.len() {
        2 => "two".to_string(),
        3 => "three".to_string(),
        n => n.to_string(),
    };
    Some(format!(
        "The evidence is split between {count} causes: {}; or {last}",
        rest.join("; ")
    ))
}

fn plan_steps(evidence: &EvidenceBundle, probes: &[Probe]) -> Vec<String> {
    let mut steps: Vec<String> = evidence
        .sources
        .iter()
        .map(|source| match source.as_str() {
            SOURCE_REPORTS => format!("Reviewed recent Chrome events from {source}"),
            SOURCE_CLOUD_IDENTITY => format!("Listed DLP rules from {source}"),
            SOURCE_CHROME_POLICY => format!("Resolved connector policy targets from {source}"),
            SOURCE_DIRECTORY => format!("Listed org units from {source}"),
            SOURCE_TOKEN_INFO => format!("Inspected granted OAuth scopes via {source}"),
            other => format!("Queried {other}"),
        })
        .collect();
    steps.extend(probes.iter().map(|p| format!("Follow-up: {}", p.describe())));
    steps
}

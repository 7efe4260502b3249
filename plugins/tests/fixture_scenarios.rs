//! End-to-end diagnoses over the bundled fixture cases.
//!
//! Each test binds a fixture executor to one case and runs the full
//! orchestrator, so these cover the executor, aggregator and synthesizer
//! together.
use std::path::PathBuf;

use fleetscope_core::api::{
    run_diagnosis, CheckStatus, DiagnosisConfig, DiagnosisOutcome, TargetBreakdown,
};
use fleetscope_plugins::FixtureToolExecutor;
use pretty_assertions::assert_eq;

fn bundle() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../fixtures/cases.json")
}

async fn diagnose(case: &str, problem: &str) -> DiagnosisOutcome {
    diagnose_with(case, problem, &DiagnosisConfig::default()).await
}

async fn diagnose_with(case: &str, problem: &str, cfg: &DiagnosisConfig) -> DiagnosisOutcome {
    let exec = FixtureToolExecutor::load(&bundle(), case).expect("fixture case");
    run_diagnosis(problem, &exec, cfg).await
}

#[tokio::test]
async fn test_customer_scoped_connector_is_the_top_hypothesis() {
    let out = diagnose("connector-mis-scoped", "Uploads are not being scanned").await;
    let r = out.result().expect("diagnosis result");

    let analysis = r.evidence.connector_analysis.as_ref().expect("analysis");
    assert!(analysis.flag);
    assert_eq!(analysis.total, 3);
    assert_eq!(analysis.mis_scoped, 1);
    assert_eq!(
        analysis.by_target,
        TargetBreakdown {
            customer: 1,
            org_unit: 2,
            group: 0,
            unknown: 0
        }
    );
    assert_eq!(analysis.sample_target.as_deref(), Some("customers/C123"));

    let top = &r.hypotheses[0];
    assert_eq!(top.id, "connector_mis_scoped");
    assert!(r.hypotheses[1..].iter().all(|h| h.confidence < top.confidence));
    assert!(r.next_steps[0].contains("/Engineering"));
    assert!(r.next_steps.len() <= 3);
}

#[tokio::test]
async fn test_dlp_permission_denied_is_a_gap_not_an_error() {
    let out = diagnose("dlp-permission-denied", "DLP is not blocking uploads").await;
    let r = out.result().expect("partial failure must still produce a result");

    assert!(r
        .evidence
        .gaps
        .iter()
        .any(|g| g.missing == "DLP rules" && g.why == "PERMISSION_DENIED"));
    assert!(!r.evidence.sources.iter().any(|s| s == "Cloud Identity"));
    assert!(r.evidence.sources.iter().any(|s| s == "Chrome Policy"));
}

#[tokio::test]
async fn test_missing_scope_names_the_exact_scope() {
    let out = diagnose("missing-scope", "cannot see DLP rules").await;
    let r = out.result().expect("diagnosis result");

    let auth = r
        .evidence
        .checks
        .iter()
        .find(|c| c.name == "Auth scopes")
        .expect("auth check");
    assert_eq!(auth.status, CheckStatus::Fail);

    let scope_gaps: Vec<&str> = r
        .evidence
        .gaps
        .iter()
        .filter(|g| g.missing.starts_with("https://"))
        .map(|g| g.missing.as_str())
        .collect();
    assert_eq!(
        scope_gaps,
        vec!["https://www.googleapis.com/auth/cloud-identity.policies"]
    );
    assert!(r.hypotheses.iter().any(|h| h.id == "insufficient_auth_scope"));
}

#[tokio::test]
async fn test_every_source_down_is_a_diagnosis_error() {
    let out = diagnose("all-down", "anything").await;
    let err = out.error().expect("diagnosis error");
    assert!(err.starts_with("No diagnostic data source responded"));
    assert!(err.contains("Admin SDK Reports: UNAVAILABLE"));
}

#[tokio::test]
async fn test_rejected_credential_is_an_authentication_error() {
    let out = diagnose("auth-rejected", "anything").await;
    assert_eq!(out.error(), Some("Authentication failed: UNAUTHENTICATED"));
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let a = diagnose("connector-mis-scoped", "dlp upload scan").await;
    let b = diagnose("connector-mis-scoped", "dlp upload scan").await;
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[tokio::test(start_paused = true)]
async fn test_hung_source_times_out_into_a_gap() {
    let cfg = DiagnosisConfig {
        call_timeout_ms: 500,
        ..Default::default()
    };
    let out = diagnose_with("slow-events", "anything", &cfg).await;
    let r = out.result().expect("diagnosis result");
    assert!(r
        .evidence
        .gaps
        .iter()
        .any(|g| g.missing == "Chrome events" && g.why == "timed out after 500ms"));
}

#[tokio::test]
async fn test_healthy_case_falls_back_without_follow_ups() {
    let out = diagnose("default", "something feels off").await;
    let r = out.result().expect("diagnosis result");
    assert_eq!(r.hypotheses.len(), 1);
    assert_eq!(r.hypotheses[0].id, "no_distinguishing_evidence");
    assert_eq!(r.plan_steps.len(), 3);
    assert!(r.missing_questions.is_empty());
}

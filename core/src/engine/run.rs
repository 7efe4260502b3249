use std::time::Duration;

use crate::config::DiagnosisConfig;
use crate::evidence::{aggregate, ToolOutcomes};
use crate::hypothesis::{synthesize, SynthesisInput};
use crate::tool::{EventFilter, RuleFilter, ToolExecutor, ToolName};

use super::guard::guarded;
use super::plan::plan_follow_ups;
use super::types::{DiagnosisError, DiagnosisOutcome, DiagnosisResult, FollowUp};

/// Diagnose `problem` against whatever `executor` is backed by.
///
/// Two waves of concurrent calls, then aggregation and synthesis. Returns a
/// [`DiagnosisError`] only when every issued call failed.
pub async fn run_diagnosis(
    problem: &str,
    executor: &dyn ToolExecutor,
    cfg: &DiagnosisConfig,
) -> DiagnosisOutcome {
    let budget = Duration::from_millis(cfg.call_timeout_ms);
    let event_filter = EventFilter {
        max_results: cfg.max_events,
        ..Default::default()
    };
    let rule_filter = RuleFilter::default();

    tracing::info!(
        target: "fleetscope.orchestrator",
        executor = executor.name(),
        budget_ms = cfg.call_timeout_ms,
        "diagnosis started"
    );

    let (events, dlp_rules, connector) = futures::join!(
        guarded(ToolName::GetEvents, budget, executor.get_events(&event_filter)),
        guarded(
            ToolName::ListPolicyRules,
            budget,
            executor.list_policy_rules(&rule_filter)
        ),
        guarded(
            ToolName::GetConnectorConfig,
            budget,
            executor.get_connector_config()
        ),
    );

    let mut outcomes = ToolOutcomes {
        events: Some(events),
        dlp_rules: Some(dlp_rules),
        connector: Some(connector),
        ..Default::default()
    };

    let probes = plan_follow_ups(&outcomes);
    tracing::debug!(
        target: "fleetscope.orchestrator",
        failed = outcomes.failures().len(),
        follow_ups = probes.len(),
        "first wave resolved"
    );

    if !probes.is_empty() {
        let wants = |kind: FollowUp| probes.iter().any(|p| p.kind == kind);
        let auth = async {
            if wants(FollowUp::AuthIntrospection) {
                Some(guarded(ToolName::DebugAuth, budget, executor.debug_auth()).await)
            } else {
                None
            }
        };
        let org_units = async {
            if wants(FollowUp::OrgUnitListing) {
                Some(guarded(ToolName::ListOrgUnits, budget, executor.list_org_units()).await)
            } else {
                None
            }
        };
        let (auth, org_units) = futures::join!(auth, org_units);
        outcomes.auth = auth;
        outcomes.org_units = org_units;
    }

    if outcomes.all_failed() {
        let error = failure_message(&outcomes);
        tracing::warn!(
            target: "fleetscope.orchestrator",
            issued = outcomes.issued(),
            error = %error,
            "no source responded"
        );
        return DiagnosisOutcome::Error(DiagnosisError { error });
    }

    let evidence = aggregate(&outcomes);
    let org_units = outcomes
        .org_units
        .as_ref()
        .and_then(|r| r.as_success())
        .map(|p| p.org_units.as_slice())
        .unwrap_or(&[]);

    let synthesis = synthesize(
        &SynthesisInput {
            evidence: &evidence,
            problem,
            probes: &probes,
            org_units,
        },
        cfg,
    );

    tracing::info!(
        target: "fleetscope.orchestrator",
        sources = evidence.sources.len(),
        gaps = evidence.gaps.len(),
        hypotheses = synthesis.hypotheses.len(),
        top = synthesis.hypotheses.first().map(|h| h.id.as_str()).unwrap_or("none"),
        "diagnosis ready"
    );

    DiagnosisOutcome::Result(Box::new(DiagnosisResult {
        diagnosis: synthesis.diagnosis,
        reference: synthesis.reference,
        next_steps: synthesis.next_steps,
        hypotheses: synthesis.hypotheses,
        plan_steps: synthesis.plan_steps,
        missing_questions: synthesis.missing_questions,
        evidence: evidence.into(),
    }))
}

const CREDENTIAL_REJECTIONS: [&str; 5] = [
    "UNAUTHENTICATED",
    "INVALID_TOKEN",
    "HTTP 401",
    "INVALID_GRANT",
    "INVALID CREDENTIALS",
];

fn is_credential_rejection(err: &str) -> bool {
    let upper = err.to_ascii_uppercase();
    CREDENTIAL_REJECTIONS.iter().any(|m| upper.contains(m))
}

fn failure_message(outcomes: &ToolOutcomes) -> String {
    let failures = outcomes.failures();
    if failures.iter().all(|(_, err)| is_credential_rejection(err)) {
        // Every source saw the same credential; one error text is enough.
        let first = failures.first().map(|(_, e)| *e).unwrap_or("credential rejected");
        return format!("Authentication failed: {first}");
    }
    let detail: Vec<String> = failures
        .iter()
        .map(|(source, err)| format!("{source}: {err}"))
        .collect();
    format!("No diagnostic data source responded: {}", detail.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::names::*;
    use crate::evidence::CheckStatus;
    use crate::tool::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Canned answers per tool; `None` means "panic if called".
    struct StubExecutor {
        events: ToolResult<EventsPayload>,
        rules: ToolResult<RulesPayload>,
        connector: ToolResult<ConnectorConfig>,
        org_units: Option<ToolResult<OrgUnitsPayload>>,
        auth: Option<ToolResult<AuthInfo>>,
        slow_events: Option<Duration>,
        panic_rules: bool,
        calls: AtomicUsize,
    }

    impl StubExecutor {
        fn healthy() -> Self {
            Self {
                events: ToolResult::success(EventsPayload { events: vec![] }),
                rules: ToolResult::success(RulesPayload {
                    rules: vec![DlpRule {
                        name: "policies/dlp-1".into(),
                        display_name: Some("Block SSN uploads".into()),
                        triggers: vec!["UPLOAD".into()],
                        action: Some("BLOCK".into()),
                        state: Some("ACTIVE".into()),
                        org_unit: None,
                    }],
                }),
                connector: ToolResult::success(ConnectorConfig {
                    value: vec![target("orgunits/OU1")],
                    errors: vec![],
                    target_resource: None,
                }),
                org_units: None,
                auth: None,
                slow_events: None,
                panic_rules: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn rejecting(err: &str) -> Self {
            Self {
                events: ToolResult::failure(err),
                rules: ToolResult::failure(err),
                connector: ToolResult::failure(err),
                auth: Some(ToolResult::failure(err)),
                ..Self::healthy()
            }
        }
    }

    fn target(resource: &str) -> PolicyTarget {
        PolicyTarget {
            target_resource: resource.into(),
            policy_schema: Some("chrome.users.OnFileAttachedConnectorPolicy".into()),
            value: None,
        }
    }

    fn full_scopes() -> ToolResult<AuthInfo> {
        ToolResult::success(AuthInfo {
            scope: crate::evidence::REQUIRED_SCOPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            expires_in: 3000,
            issued_to: "client".into(),
        })
    }

    #[async_trait]
    impl ToolExecutor for StubExecutor {
        fn name(&self) -> &str {
            "stub"
        }

        async fn get_events(&self, _filter: &EventFilter) -> ToolResult<EventsPayload> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(d) = self.slow_events {
                tokio::time::sleep(d).await;
            }
            self.events.clone()
        }

        async fn list_policy_rules(&self, _filter: &RuleFilter) -> ToolResult<RulesPayload> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panic_rules {
                panic!("rules backend exploded");
            }
            self.rules.clone()
        }

        async fn get_connector_config(&self) -> ToolResult<ConnectorConfig> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.connector.clone()
        }

        async fn list_org_units(&self) -> ToolResult<OrgUnitsPayload> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.org_units.clone().expect("org units were not expected")
        }

        async fn get_fleet_overview(&self, _args: &OverviewArgs) -> ToolResult<OverviewSummary> {
            ToolResult::failure("not used")
        }

        async fn debug_auth(&self) -> ToolResult<AuthInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.auth.clone().expect("auth was not expected")
        }

        async fn enroll(&self, _target: &EnrollTarget) -> ToolResult<EnrollmentToken> {
            ToolResult::failure("not used")
        }
    }

    #[tokio::test]
    async fn healthy_sources_skip_the_second_wave() {
        let stub = StubExecutor::healthy();
        let out = run_diagnosis("something is off", &stub, &DiagnosisConfig::default()).await;
        let r = out.result().expect("result");
        assert_eq!(stub.calls.load(Ordering::SeqCst), 3);
        assert_eq!(r.hypotheses[0].id, "no_distinguishing_evidence");
        assert_eq!(
            r.evidence.sources,
            vec![SOURCE_REPORTS, SOURCE_CLOUD_IDENTITY, SOURCE_CHROME_POLICY]
        );
    }

    #[tokio::test]
    async fn mis_scoped_connector_lists_org_units_for_remediation() {
        let stub = StubExecutor {
            connector: ToolResult::success(ConnectorConfig {
                value: vec![
                    target("customers/C123"),
                    target("orgunits/OU1"),
                    target("orgunits/OU1"),
                ],
                errors: vec![],
                target_resource: None,
            }),
            org_units: Some(ToolResult::success(OrgUnitsPayload {
                org_units: vec![OrgUnit {
                    org_unit_id: Some("id:OU1".into()),
                    org_unit_path: "/Sales".into(),
                    name: "Sales".into(),
                    parent_org_unit_path: Some("/".into()),
                }],
            })),
            ..StubExecutor::healthy()
        };
        let cfg = DiagnosisConfig::default();
        let out = run_diagnosis("uploads are not scanned", &stub, &cfg).await;
        let r = out.result().expect("result");
        assert_eq!(r.hypotheses[0].id, "connector_mis_scoped");
        assert!(r.next_steps[0].contains("/Sales"));
        assert!(r.plan_steps.iter().any(|s| s.starts_with("Follow-up:")));
        let analysis = r.evidence.connector_analysis.as_ref().unwrap();
        assert_eq!(analysis.sample_target.as_deref(), Some("customers/C123"));
    }

    #[tokio::test]
    async fn partial_failure_still_returns_a_result() {
        let stub = StubExecutor {
            rules: ToolResult::failure("PERMISSION_DENIED"),
            auth: Some(full_scopes()),
            ..StubExecutor::healthy()
        };
        let out = run_diagnosis("dlp not blocking", &stub, &DiagnosisConfig::default()).await;
        let r = out.result().expect("partial failure must not be fatal");
        assert!(r
            .evidence
            .gaps
            .iter()
            .any(|g| g.missing == CHECK_DLP_RULES && g.why == "PERMISSION_DENIED"));
        assert!(!r.evidence.sources.iter().any(|s| s == SOURCE_CLOUD_IDENTITY));
        assert_eq!(r.hypotheses[0].id, "source_access_denied");
    }

    #[tokio::test]
    async fn total_failure_is_a_diagnosis_error() {
        let stub = StubExecutor {
            events: ToolResult::failure("UNAVAILABLE"),
            rules: ToolResult::failure("PERMISSION_DENIED"),
            connector: ToolResult::failure("HTTP 500"),
            auth: Some(ToolResult::failure("UNAVAILABLE")),
            ..StubExecutor::healthy()
        };
        let out = run_diagnosis("anything", &stub, &DiagnosisConfig::default()).await;
        let err = out.error().expect("error");
        assert!(err.starts_with("No diagnostic data source responded"));
        assert!(err.contains("Cloud Identity: PERMISSION_DENIED"));
    }

    #[tokio::test]
    async fn rejected_credential_reports_authentication_failure() {
        let stub = StubExecutor::rejecting("UNAUTHENTICATED");
        let out = run_diagnosis("anything", &stub, &DiagnosisConfig::default()).await;
        assert_eq!(out.error(), Some("Authentication failed: UNAUTHENTICATED"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_source_times_out_into_a_gap() {
        let stub = StubExecutor {
            slow_events: Some(Duration::from_secs(60)),
            auth: Some(full_scopes()),
            ..StubExecutor::healthy()
        };
        let cfg = DiagnosisConfig {
            call_timeout_ms: 500,
            ..Default::default()
        };
        let out = run_diagnosis("anything", &stub, &cfg).await;
        let r = out.result().expect("result");
        assert_eq!(r.evidence.checks[0].status, CheckStatus::Unknown);
        assert!(r
            .evidence
            .gaps
            .iter()
            .any(|g| g.missing == CHECK_EVENTS && g.why == "timed out after 500ms"));
    }

    #[tokio::test]
    async fn panicking_source_becomes_a_failure() {
        let stub = StubExecutor {
            panic_rules: true,
            auth: Some(ToolResult::failure("UNAVAILABLE")),
            ..StubExecutor::healthy()
        };
        let out = run_diagnosis("anything", &stub, &DiagnosisConfig::default()).await;
        let r = out.result().expect("result");
        assert!(r
            .evidence
            .gaps
            .iter()
            .any(|g| g.missing == CHECK_DLP_RULES && g.why.contains("failed unexpectedly")));
    }

    #[test]
    fn credential_rejection_markers_are_case_insensitive() {
        assert!(is_credential_rejection("invalid_token"));
        assert!(is_credential_rejection("HTTP 401"));
        assert!(!is_credential_rejection("PERMISSION_DENIED"));
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use fleetscope_core::api::{
    build_overview, decode, upstream_error, AuthInfo, ConnectorConfig, Credential, EnrollTarget,
    EnrollmentToken, EventFilter, EventsPayload, ExecutorError, LiveConfig, OrgUnitsPayload,
    OverviewArgs, OverviewSummary, PolicyTarget, RuleFilter, RulesPayload, TargetError,
    ToolExecutor, ToolName, ToolResult,
};

use super::wire::{
    dlp_rules, ActivityList, EnrollmentTokenResponse, OrgUnitList, Paged, PolicyList,
    ResolveResponse, TokenInfo,
};

const DLP_RULE_TYPE: &str = "rule.dlp";

/// Upper bound on pages followed for one list call.
const MAX_PAGES: usize = 50;

/// Executor backed by the Google management APIs.
///
/// Holds one pooled `reqwest::Client` and a read-only credential, so a single
/// instance can serve concurrent calls.
pub struct LiveToolExecutor {
    client: Client,
    credential: Credential,
    cfg: LiveConfig,
}

impl LiveToolExecutor {
    pub fn new(cfg: LiveConfig, credential: Credential) -> Result<Self, ExecutorError> {
        if credential.is_empty() {
            return Err(ExecutorError::MissingCredential);
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| ExecutorError::HttpClient(e.into()))?;
        Ok(Self {
            client,
            credential,
            cfg,
        })
    }

    fn url(base: &str, path: &str) -> String {
        format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    /// Send, then fold every failure mode into the upstream error text.
    async fn fetch(&self, tool: ToolName, req: RequestBuilder) -> Result<Value, String> {
        let resp = req
            .bearer_auth(self.credential.expose())
            .send()
            .await
            .map_err(|e| transport_error(tool, e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| transport_error(tool, e))?;
        let parsed: Option<Value> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            let err = parsed
                .as_ref()
                .and_then(upstream_error)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            tracing::warn!(
                target: "fleetscope.live",
                tool = tool.as_str(),
                status = status.as_u16(),
                error = %err,
                "upstream rejected request"
            );
            return Err(err);
        }

        parsed.ok_or_else(|| format!("malformed {} payload: response is not json", tool.as_str()))
    }

    async fn call<W, T>(
        &self,
        tool: ToolName,
        req: RequestBuilder,
        convert: impl FnOnce(W) -> T,
    ) -> ToolResult<T>
    where
        W: DeserializeOwned,
    {
        match self.fetch(tool, req).await {
            Ok(raw) => decode::<W>(tool, raw).map(convert),
            Err(err) => ToolResult::failure(err),
        }
    }

    /// Follow `nextPageToken` until the listing ends or `limit` items are collected.
    async fn paged<W>(
        &self,
        tool: ToolName,
        request: impl Fn(Option<&str>) -> RequestBuilder,
        limit: Option<usize>,
    ) -> Result<Vec<W::Item>, String>
    where
        W: Paged + DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut token: Option<String> = None;
        for _ in 0..MAX_PAGES {
            let raw = self.fetch(tool, request(token.as_deref())).await?;
            let (mut page, next) = match decode::<W>(tool, raw) {
                ToolResult::Success(list) => list.into_page(),
                ToolResult::Failure(f) => return Err(f.error),
            };
            items.append(&mut page);
            if let Some(max) = limit.filter(|max| items.len() >= *max) {
                items.truncate(max);
                return Ok(items);
            }
            match next.filter(|t| !t.is_empty()) {
                Some(t) => token = Some(t),
                None => return Ok(items),
            }
        }
        tracing::warn!(
            target: "fleetscope.live",
            tool = tool.as_str(),
            pages = MAX_PAGES,
            "page limit reached, listing truncated"
        );
        Ok(items)
    }

    async fn resolve_target(&self, target: &str) -> Result<Vec<PolicyTarget>, String> {
        let url = Self::url(
            &self.cfg.chrome_policy_base_url,
            &format!("v1/customers/{}/policies:resolve", self.cfg.customer_id),
        );
        let body = json!({
            "policySchemaFilter": self.cfg.connector_schema_filter,
            "policyTargetKey": { "targetResource": target },
        });
        let raw = self
            .fetch(ToolName::GetConnectorConfig, self.client.post(url).json(&body))
            .await?;
        match decode::<ResolveResponse>(ToolName::GetConnectorConfig, raw) {
            ToolResult::Success(r) => Ok(r.into_targets()),
            ToolResult::Failure(f) => Err(f.error),
        }
    }
}

/// The request URL can carry credentials, so it never reaches the error text.
fn transport_error(tool: ToolName, e: reqwest::Error) -> String {
    let e = e.without_url();
    tracing::warn!(
        target: "fleetscope.live",
        tool = tool.as_str(),
        error = %e,
        "transport failure"
    );
    if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    }
}

#[async_trait]
impl ToolExecutor for LiveToolExecutor {
    fn name(&self) -> &str {
        "live"
    }

    async fn get_events(&self, filter: &EventFilter) -> ToolResult<EventsPayload> {
        let user = filter.user_key.as_deref().unwrap_or("all");
        let url = Self::url(
            &self.cfg.reports_base_url,
            &format!("admin/reports/v1/activity/users/{user}/applications/chrome"),
        );
        let mut query: Vec<(&str, String)> = vec![
            ("customerId", self.cfg.customer_id.clone()),
            ("maxResults", filter.max_results.to_string()),
        ];
        if let Some(name) = &filter.event_name {
            query.push(("eventName", name.clone()));
        }
        if let Some(start) = &filter.start_time {
            query.push(("startTime", start.clone()));
        }
        let request = |page: Option<&str>| {
            let req = self.client.get(url.as_str()).query(&query);
            match page {
                Some(token) => req.query(&[("pageToken", token)]),
                None => req,
            }
        };
        let limit = Some(filter.max_results as usize);
        match self.paged::<ActivityList>(ToolName::GetEvents, request, limit).await {
            Ok(events) => ToolResult::success(EventsPayload { events }),
            Err(err) => ToolResult::failure(err),
        }
    }

    async fn list_policy_rules(&self, filter: &RuleFilter) -> ToolResult<RulesPayload> {
        let url = Self::url(&self.cfg.cloud_identity_base_url, "v1beta1/policies");
        let rule_type = filter
            .rule_type
            .clone()
            .unwrap_or_else(|| DLP_RULE_TYPE.to_string());
        let mut expr = format!("customer == \"customers/{}\"", self.cfg.customer_id);
        if let Some(ou) = &filter.org_unit {
            expr.push_str(&format!(" && policyQuery.orgUnit == \"{ou}\""));
        }
        let request = |page: Option<&str>| {
            let req = self.client.get(url.as_str()).query(&[("filter", expr.as_str())]);
            match page {
                Some(token) => req.query(&[("pageToken", token)]),
                None => req,
            }
        };
        match self.paged::<PolicyList>(ToolName::ListPolicyRules, request, None).await {
            Ok(policies) => ToolResult::success(RulesPayload {
                rules: dlp_rules(policies, &rule_type),
            }),
            Err(err) => ToolResult::failure(err),
        }
    }

    async fn get_connector_config(&self) -> ToolResult<ConnectorConfig> {
        let targets = &self.cfg.connector_targets;
        if targets.is_empty() {
            return ToolResult::failure(
                "no connector target resources configured (live.connector_targets)",
            );
        }

        let resolved =
            futures::future::join_all(targets.iter().map(|t| self.resolve_target(t))).await;

        let mut value = Vec::new();
        let mut errors = Vec::new();
        for (target, r) in targets.iter().zip(resolved) {
            match r {
                Ok(mut found) => value.append(&mut found),
                Err(message) => errors.push(TargetError {
                    target_resource: Some(target.clone()),
                    message,
                }),
            }
        }

        if errors.len() == targets.len() {
            // Nothing resolved: report it as a source failure with the first upstream text.
            return ToolResult::failure(errors.swap_remove(0).message);
        }

        ToolResult::success(ConnectorConfig {
            value,
            errors,
            target_resource: (targets.len() == 1).then(|| targets[0].clone()),
        })
    }

    async fn list_org_units(&self) -> ToolResult<OrgUnitsPayload> {
        let url = Self::url(
            &self.cfg.directory_base_url,
            &format!("admin/directory/v1/customer/{}/orgunits", self.cfg.customer_id),
        );
        let req = self.client.get(url).query(&[("type", "all")]);
        self.call(ToolName::ListOrgUnits, req, |list: OrgUnitList| OrgUnitsPayload {
            org_units: list.organization_units,
        })
        .await
    }

    async fn get_fleet_overview(&self, args: &OverviewArgs) -> ToolResult<OverviewSummary> {
        let filter = EventFilter {
            max_results: args.max_events,
            ..Default::default()
        };
        let rule_filter = RuleFilter::default();
        let (events, rules, connector) = futures::join!(
            self.get_events(&filter),
            self.list_policy_rules(&rule_filter),
            self.get_connector_config(),
        );
        build_overview(&events, &rules, &connector)
    }

    async fn debug_auth(&self) -> ToolResult<AuthInfo> {
        let url = Self::url(&self.cfg.oauth_base_url, "tokeninfo");
        // tokeninfo reads the token from the form body, never the query
        let req = self
            .client
            .post(url)
            .form(&[("access_token", self.credential.expose())]);
        self.call(ToolName::DebugAuth, req, TokenInfo::into_auth).await
    }

    async fn enroll(&self, target: &EnrollTarget) -> ToolResult<EnrollmentToken> {
        let url = Self::url(
            &self.cfg.directory_base_url,
            &format!(
                "admin/directory/v1.1beta1/customer/{}/chrome/enrollmentTokens",
                self.cfg.customer_id
            ),
        );
        let mut body = json!({ "token_type": "chromeBrowser" });
        if let Some(path) = &target.org_unit_path {
            body["org_unit_path"] = json!(path);
        }
        let req = self.client.post(url).json(&body);
        self.call(ToolName::Enroll, req, EnrollmentTokenResponse::into_token)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_credential_is_rejected_at_construction() {
        let err = LiveToolExecutor::new(LiveConfig::default(), Credential::new("  "))
            .err()
            .unwrap();
        assert!(matches!(err, ExecutorError::MissingCredential));
    }

    #[test]
    fn url_join_tolerates_slashes() {
        assert_eq!(
            LiveToolExecutor::url("http://host/", "/v1/x"),
            "http://host/v1/x"
        );
    }

    #[tokio::test]
    async fn no_configured_targets_is_a_source_failure() {
        let exec = LiveToolExecutor::new(LiveConfig::default(), Credential::new("t")).unwrap();
        let r = exec.get_connector_config().await;
        assert!(r.error().unwrap().contains("live.connector_targets"));
    }
}

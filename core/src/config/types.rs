use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub live: LiveConfig,

    #[serde(default)]
    pub fixture: FixtureConfig,

    #[serde(default)]
    pub diagnosis: DiagnosisConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.diagnosis.validate()
    }
}

// ---------------------------------------------------------------------------
// Executor selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorProvider {
    Live,
    Fixture,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_executor_provider")]
    pub provider: ExecutorProvider,
}

fn default_executor_provider() -> ExecutorProvider {
    ExecutorProvider::Live
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            provider: default_executor_provider(),
        }
    }
}

// ---------------------------------------------------------------------------
// Live executor
// ---------------------------------------------------------------------------

#[derive(Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    #[serde(default = "default_customer_id")]
    pub customer_id: String,

    /// Bearer token. Usually supplied through `FLEETSCOPE_ACCESS_TOKEN`.
    #[serde(default)]
    pub access_token: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_admin_base_url")]
    pub reports_base_url: String,

    #[serde(default = "default_admin_base_url")]
    pub directory_base_url: String,

    #[serde(default = "default_cloud_identity_base_url")]
    pub cloud_identity_base_url: String,

    #[serde(default = "default_chrome_policy_base_url")]
    pub chrome_policy_base_url: String,

    #[serde(default = "default_oauth_base_url")]
    pub oauth_base_url: String,

    /// Org units or groups to resolve connector policies for, e.g. `orgunits/03ph8a2z1`.
    #[serde(default)]
    pub connector_targets: Vec<String>,

    #[serde(default = "default_connector_schema_filter")]
    pub connector_schema_filter: String,
}

fn default_customer_id() -> String {
    "my_customer".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_admin_base_url() -> String {
    "https://admin.googleapis.com".to_string()
}

fn default_cloud_identity_base_url() -> String {
    "https://cloudidentity.googleapis.com".to_string()
}

fn default_chrome_policy_base_url() -> String {
    "https://chromepolicy.googleapis.com".to_string()
}

fn default_oauth_base_url() -> String {
    "https://oauth2.googleapis.com".to_string()
}

fn default_connector_schema_filter() -> String {
    "chrome.users.*".to_string()
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            customer_id: default_customer_id(),
            access_token: String::new(),
            timeout_ms: default_timeout_ms(),
            reports_base_url: default_admin_base_url(),
            directory_base_url: default_admin_base_url(),
            cloud_identity_base_url: default_cloud_identity_base_url(),
            chrome_policy_base_url: default_chrome_policy_base_url(),
            oauth_base_url: default_oauth_base_url(),
            connector_targets: Vec::new(),
            connector_schema_filter: default_connector_schema_filter(),
        }
    }
}

impl fmt::Debug for LiveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.access_token.is_empty() { "" } else { "***" };
        f.debug_struct("LiveConfig")
            .field("customer_id", &self.customer_id)
            .field("access_token", &token)
            .field("timeout_ms", &self.timeout_ms)
            .field("reports_base_url", &self.reports_base_url)
            .field("directory_base_url", &self.directory_base_url)
            .field("cloud_identity_base_url", &self.cloud_identity_base_url)
            .field("chrome_policy_base_url", &self.chrome_policy_base_url)
            .field("oauth_base_url", &self.oauth_base_url)
            .field("connector_targets", &self.connector_targets)
            .field("connector_schema_filter", &self.connector_schema_filter)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Fixture executor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureConfig {
    #[serde(default = "default_fixture_path")]
    pub path: String,

    #[serde(default = "default_fixture_case")]
    pub case: String,
}

fn default_fixture_path() -> String {
    "fixtures/cases.json".to_string()
}

fn default_fixture_case() -> String {
    "default".to_string()
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            path: default_fixture_path(),
            case: default_fixture_case(),
        }
    }
}

// ---------------------------------------------------------------------------
// Diagnosis
// ---------------------------------------------------------------------------

/// Base confidence of each hypothesis rule before corroboration is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleWeights {
    #[serde(default = "default_w_connector")]
    pub connector_mis_scoped: f64,
    #[serde(default = "default_w_dlp")]
    pub missing_dlp_rules: f64,
    #[serde(default = "default_w_auth")]
    pub insufficient_auth_scope: f64,
    #[serde(default = "default_w_access")]
    pub source_access_denied: f64,
    #[serde(default = "default_w_none")]
    pub no_distinguishing_evidence: f64,
}

fn default_w_connector() -> f64 {
    0.70
}

fn default_w_dlp() -> f64 {
    0.60
}

fn default_w_auth() -> f64 {
    0.55
}

fn default_w_access() -> f64 {
    0.50
}

fn default_w_none() -> f64 {
    0.20
}

impl RuleWeights {
    /// Base weight for a rule id; unknown ids get zero.
    pub fn base_for(&self, rule_id: &str) -> f64 {
        match rule_id {
            "connector_mis_scoped" => self.connector_mis_scoped,
            "missing_dlp_rules" => self.missing_dlp_rules,
            "insufficient_auth_scope" => self.insufficient_auth_scope,
            "source_access_denied" => self.source_access_denied,
            "no_distinguishing_evidence" => self.no_distinguishing_evidence,
            _ => 0.0,
        }
    }

    fn all(&self) -> [(&'static str, f64); 5] {
        [
            ("connector_mis_scoped", self.connector_mis_scoped),
            ("missing_dlp_rules", self.missing_dlp_rules),
            ("insufficient_auth_scope", self.insufficient_auth_scope),
            ("source_access_denied", self.source_access_denied),
            ("no_distinguishing_evidence", self.no_distinguishing_evidence),
        ]
    }
}

impl Default for RuleWeights {
    fn default() -> Self {
        Self {
            connector_mis_scoped: default_w_connector(),
            missing_dlp_rules: default_w_dlp(),
            insufficient_auth_scope: default_w_auth(),
            source_access_denied: default_w_access(),
            no_distinguishing_evidence: default_w_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisConfig {
    /// Budget for each individual tool call; expiry is reported as a source error.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    #[serde(default = "default_max_events")]
    pub max_events: u32,

    /// Confidence added per corroborating check, signal or keyword match.
    #[serde(default = "default_per_evidence")]
    pub per_evidence: f64,

    /// Hypotheses closer than this to the top one are reported as ambiguous.
    #[serde(default = "default_ambiguity_margin")]
    pub ambiguity_margin: f64,

    #[serde(default = "default_max_next_steps")]
    pub max_next_steps: usize,

    #[serde(default)]
    pub weights: RuleWeights,
}

fn default_call_timeout_ms() -> u64 {
    15_000
}

fn default_max_events() -> u32 {
    50
}

fn default_per_evidence() -> f64 {
    0.10
}

fn default_ambiguity_margin() -> f64 {
    0.10
}

fn default_max_next_steps() -> usize {
    3
}

impl Default for DiagnosisConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: default_call_timeout_ms(),
            max_events: default_max_events(),
            per_evidence: default_per_evidence(),
            ambiguity_margin: default_ambiguity_margin(),
            max_next_steps: default_max_next_steps(),
            weights: RuleWeights::default(),
        }
    }
}

impl DiagnosisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = |v: f64| (0.0..=1.0).contains(&v);
        for (id, w) in self.weights.all() {
            if !unit(w) {
                return Err(ConfigError::Validation(format!(
                    "diagnosis.weights.{id} must be within [0, 1], got {w}"
                )));
            }
        }
        if !unit(self.per_evidence) {
            return Err(ConfigError::Validation(format!(
                "diagnosis.per_evidence must be within [0, 1], got {}",
                self.per_evidence
            )));
        }
        if !unit(self.ambiguity_margin) {
            return Err(ConfigError::Validation(format!(
                "diagnosis.ambiguity_margin must be within [0, 1], got {}",
                self.ambiguity_margin
            )));
        }
        if self.max_next_steps == 0 {
            return Err(ConfigError::Validation(
                "diagnosis.max_next_steps must be at least 1".into(),
            ));
        }
        if self.call_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "diagnosis.call_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Optional log file; stderr is used when unset.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_the_access_token() {
        let cfg = AppConfig {
            live: LiveConfig {
                access_token: "ya29.SECRET".into(),
                ..LiveConfig::default()
            },
            ..AppConfig::default()
        };
        let text = format!("{cfg:?}");
        assert!(!text.contains("ya29.SECRET"));
        assert!(text.contains("access_token: \"***\""));
        assert!(text.contains("my_customer"));
    }
}

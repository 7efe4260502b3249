//! Human-readable names shared by the aggregator, synthesizer and tests.

pub const SOURCE_REPORTS: &str = "Admin SDK Reports";
pub const SOURCE_CLOUD_IDENTITY: &str = "Cloud Identity";
pub const SOURCE_CHROME_POLICY: &str = "Chrome Policy";
pub const SOURCE_DIRECTORY: &str = "Admin SDK Directory";
pub const SOURCE_TOKEN_INFO: &str = "OAuth token info";

pub const CHECK_EVENTS: &str = "Chrome events";
pub const CHECK_DLP_RULES: &str = "DLP rules";
pub const CHECK_CONNECTOR_POLICIES: &str = "Connector policies";
pub const CHECK_CONNECTOR_SCOPING: &str = "Connector scoping";
pub const CHECK_ORG_UNITS: &str = "Org units";
pub const CHECK_AUTH_SCOPES: &str = "Auth scopes";

pub const SIGNAL_CONNECTOR_MIS_SCOPED: &str = "connector_mis_scoped";
pub const SIGNAL_DLP_RULES_INACTIVE: &str = "dlp_rules_inactive";
pub const SIGNAL_CONTENT_SCAN_EVENTS: &str = "content_scan_events";
pub const SIGNAL_NO_CONTENT_SCAN_EVENTS: &str = "no_content_scan_events";

pub const CONNECTOR_HELP_URL: &str = "https://developers.google.com/chrome/policy";
pub const DLP_HELP_URL: &str = "https://cloud.google.com/identity/docs";
pub const SCOPES_HELP_URL: &str = "https://developers.google.com/identity/protocols/oauth2/scopes";

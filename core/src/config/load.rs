use std::path::Path;

use crate::errors::ConfigError;

use super::types::{AppConfig, ExecutorProvider};

pub const CONFIG_FILE: &str = "fleetscope.toml";

pub fn load_default() -> anyhow::Result<AppConfig> {
    let cfg = if Path::new(CONFIG_FILE).exists() {
        read_file(Path::new(CONFIG_FILE))?
    } else {
        AppConfig::default()
    };
    finish(cfg)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()).into());
    }
    finish(read_file(path)?)
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Parse(anyhow::Error::new(e).context(path.display().to_string()))
    })?;
    toml::from_str::<AppConfig>(&s).map_err(|e| ConfigError::Parse(e.into()))
}

fn finish(mut cfg: AppConfig) -> anyhow::Result<AppConfig> {
    apply_env_overrides(&mut cfg, |k| std::env::var(k).ok());
    cfg.validate()?;
    Ok(cfg)
}

/// Apply `FLEETSCOPE_*` overrides. Blank values are ignored.
pub(crate) fn apply_env_overrides(cfg: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("FLEETSCOPE_ACCESS_TOKEN") {
        cfg.live.access_token = v;
    }
    if let Some(v) = get("FLEETSCOPE_CUSTOMER_ID") {
        cfg.live.customer_id = v;
    }
    if let Some(v) = get("FLEETSCOPE_FIXTURE") {
        cfg.fixture.path = v;
        cfg.executor.provider = ExecutorProvider::Fixture;
    }
    if let Some(v) = get("FLEETSCOPE_CASE") {
        cfg.fixture.case = v;
    }
}

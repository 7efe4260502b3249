use std::path::Path;
use std::sync::Arc;

use fleetscope_core::api::{AppConfig, Credential, ExecutorError, ExecutorProvider, ToolExecutor};

use crate::executor::{FixtureToolExecutor, LiveToolExecutor};

/// Build the executor selected by `executor.provider`.
pub fn build_executor(cfg: &AppConfig) -> Result<Arc<dyn ToolExecutor>, ExecutorError> {
    match cfg.executor.provider {
        ExecutorProvider::Live => {
            let credential = Credential::new(cfg.live.access_token.clone());
            let exec = LiveToolExecutor::new(cfg.live.clone(), credential)?;
            tracing::info!(
                target: "fleetscope.factory",
                customer = %cfg.live.customer_id,
                targets = cfg.live.connector_targets.len(),
                "live executor ready"
            );
            Ok(Arc::new(exec))
        }
        ExecutorProvider::Fixture => {
            let exec = FixtureToolExecutor::load(Path::new(&cfg.fixture.path), &cfg.fixture.case)?;
            tracing::info!(
                target: "fleetscope.factory",
                path = %cfg.fixture.path,
                case = exec.case_id(),
                "fixture executor ready"
            );
            Ok(Arc::new(exec))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn live_without_token_fails_to_build() {
        let cfg = AppConfig::default();
        assert!(matches!(
            build_executor(&cfg).err(),
            Some(ExecutorError::MissingCredential)
        ));
    }

    #[test]
    fn fixture_provider_loads_the_named_case() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"cases":{{"quiet":{{"events":{{"events":[]}}}}}}}}"#).unwrap();

        let mut cfg = AppConfig::default();
        cfg.executor.provider = ExecutorProvider::Fixture;
        cfg.fixture.path = f.path().display().to_string();
        cfg.fixture.case = "quiet".into();

        let exec = build_executor(&cfg).unwrap();
        assert_eq!(exec.name(), "fixture");
    }

    #[test]
    fn missing_fixture_file_is_an_io_error() {
        let mut cfg = AppConfig::default();
        cfg.executor.provider = ExecutorProvider::Fixture;
        cfg.fixture.path = "/nonexistent/cases.json".into();
        assert!(matches!(
            build_executor(&cfg).err(),
            Some(ExecutorError::FixtureIo { .. })
        ));
    }
}

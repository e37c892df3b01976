use std::sync::Arc;

use tabletalk_agent::gemini::GeminiClient;
use tabletalk_agent::llm::{LlmClient, ServiceError};
use tabletalk_agent::runtime::{AgentRuntime, RuntimeBuildError};
use tabletalk_core::config::{AppConfig, ConfigError};
use thiserror::Error;
use tracing::{info, warn};

pub struct Application {
    pub config: AppConfig,
    pub agent_runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("agent runtime construction failed: {0}")]
    Runtime(#[from] RuntimeBuildError),
    #[error("language service client construction failed: {0}")]
    Client(#[source] ServiceError),
}

/// Builds the application from an already loaded config, re-validating it first.
pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");
    config.validate()?;

    let client: Option<Arc<dyn LlmClient>> = if config.llm.is_configured() {
        let gemini = GeminiClient::from_config(&config.llm).map_err(BootstrapError::Client)?;
        info!(
            event_name = "system.bootstrap.llm_configured",
            model = gemini.model(),
            timeout_secs = config.llm.timeout_secs,
            "generation service configured"
        );
        Some(Arc::new(gemini))
    } else {
        warn!(
            event_name = "system.bootstrap.llm_unconfigured",
            "generation service not configured; using fallback extraction and canned replies"
        );
        None
    };

    let agent_runtime = AgentRuntime::from_config(&config, client)?;
    info!(
        event_name = "system.bootstrap.runtime_ready",
        restaurant = %config.restaurant.name,
        menu_items = agent_runtime.catalog().len(),
        "agent runtime initialized"
    );

    Ok(Application { config, agent_runtime: Arc::new(agent_runtime) })
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use tabletalk_core::config::AppConfig;

    use super::{bootstrap_with_config, BootstrapError};

    #[test]
    fn bootstrap_without_api_key_runs_degraded() {
        let app = bootstrap_with_config(AppConfig::default()).expect("degraded bootstrap");
        assert!(!app.agent_runtime.generation_configured());
        assert_eq!(app.agent_runtime.catalog().len(), 12);
    }

    #[test]
    fn bootstrap_with_api_key_wires_the_generation_client() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some(SecretString::from("gm-test".to_string()));

        let app = bootstrap_with_config(config).expect("configured bootstrap");
        assert!(app.agent_runtime.generation_configured());
    }

    #[test]
    fn bootstrap_rejects_invalid_programmatic_config() {
        let mut config = AppConfig::default();
        config.llm.timeout_secs = 0;

        let error = bootstrap_with_config(config).err().expect("invalid config should fail");
        assert!(matches!(error, BootstrapError::Config(_)));
        assert!(error.to_string().contains("timeout_secs"));
    }
}

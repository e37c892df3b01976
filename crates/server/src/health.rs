use axum::{extract::State, Json};
use serde::Serialize;

use crate::routes::AppState;

pub const SERVICE_NAME: &str = "tabletalk";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub restaurant: String,
    pub assistant: String,
    pub gemini_configured: bool,
}

/// Always `running`; a missing generation service is reported, not treated as unhealthy.
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running",
        service: SERVICE_NAME,
        restaurant: state.restaurant.name.clone(),
        assistant: state.restaurant.assistant_name.clone(),
        gemini_configured: state.runtime.generation_configured(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, Json};
    use secrecy::SecretString;
    use tabletalk_agent::gemini::GeminiClient;
    use tabletalk_agent::runtime::AgentRuntime;
    use tabletalk_core::config::AppConfig;

    use crate::health::status;
    use crate::routes::AppState;

    #[tokio::test]
    async fn status_reports_unconfigured_generation_service() {
        let config = AppConfig::default();
        let runtime = AgentRuntime::from_config(&config, None).expect("runtime builds");

        let Json(payload) = status(State(AppState::new(Arc::new(runtime), config.restaurant))).await;

        assert_eq!(payload.status, "running");
        assert_eq!(payload.service, "tabletalk");
        assert_eq!(payload.restaurant, "Twilight Cafe");
        assert_eq!(payload.assistant, "Plato");
        assert!(!payload.gemini_configured);
    }

    #[tokio::test]
    async fn status_reports_configured_generation_service() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some(SecretString::from("gm-test".to_string()));
        let client = GeminiClient::from_config(&config.llm).expect("client builds");
        let runtime =
            AgentRuntime::from_config(&config, Some(Arc::new(client))).expect("runtime builds");

        let Json(payload) = status(State(AppState::new(Arc::new(runtime), config.restaurant))).await;
        assert!(payload.gemini_configured);
    }
}

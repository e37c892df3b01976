use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Failure of the external language service. Callers always recover from it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("language service is not configured")]
    Unconfigured,
    #[error("language service call timed out after {0:?}")]
    Timeout(Duration),
    #[error("language service transport failure: {0}")]
    Transport(String),
    #[error("language service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("language service returned an unusable response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError>;
}

/// Runs `client.complete` with an upper bound on latency.
pub async fn complete_with_timeout(
    client: &dyn LlmClient,
    prompt: &str,
    timeout: Duration,
) -> Result<String, ServiceError> {
    match tokio::time::timeout(timeout, client.complete(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(ServiceError::Timeout(timeout)),
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::{LlmClient, ServiceError};

    /// Replies from a queue, then fails once it runs dry. Records every prompt.
    #[derive(Default)]
    pub struct ScriptedClient {
        replies: Mutex<VecDeque<Result<String, ServiceError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        pub fn new(replies: Vec<Result<String, ServiceError>>) -> Self {
            Self { replies: Mutex::new(replies.into()), prompts: Mutex::new(Vec::new()) }
        }

        pub fn replying(replies: &[&str]) -> Self {
            Self::new(replies.iter().map(|reply| Ok((*reply).to_string())).collect())
        }

        pub fn failing() -> Self {
            Self::default()
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().map(|prompts| prompts.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(prompt.to_string());
            }
            self.replies
                .lock()
                .ok()
                .and_then(|mut replies| replies.pop_front())
                .unwrap_or_else(|| Err(ServiceError::Transport("connection refused".to_string())))
        }
    }

    pub struct SlowClient(pub Duration);

    #[async_trait]
    impl LlmClient for SlowClient {
        async fn complete(&self, _prompt: &str) -> Result<String, ServiceError> {
            tokio::time::sleep(self.0).await;
            Ok("[]".to_string())
        }
    }
}

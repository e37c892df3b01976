use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tabletalk_core::catalog::MenuCatalog;
use tabletalk_core::config::AppConfig;
use tabletalk_core::domain::cart::{denormalize, CartLine};
use tabletalk_core::domain::conversation::Speaker;
use tabletalk_core::session::SessionStore;
use thiserror::Error;
use tracing::{debug, info};

use crate::extraction::OrderExtractor;
use crate::intent::{Intent, IntentClassifier};
use crate::llm::LlmClient;
use crate::prompts::PromptTemplates;
use crate::response::{ReplyAction, ResponseComposer};

pub const CART_CLEARED_REPLY: &str = "Cart cleared! What would you like to order?";
pub const EMPTY_CHECKOUT_REPLY: &str = "Your cart's empty! What would you like?";

#[derive(Debug, Error)]
pub enum RuntimeBuildError {
    #[error("prompt templates failed to compile: {0}")]
    Templates(#[from] tera::Error),
    #[error("intent rules failed to compile: {0}")]
    IntentRules(#[from] regex::Error),
}

/// Result of one customer utterance.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnOutcome {
    pub success: bool,
    pub cart: Vec<CartLine>,
    pub total: Decimal,
    pub response: String,
    pub items_added: Vec<CartLine>,
    pub is_greeting: Option<bool>,
    pub checkout: Option<bool>,
}

/// Owns the session registry and runs the classify, extract, merge, reply loop.
pub struct AgentRuntime {
    catalog: Arc<MenuCatalog>,
    classifier: IntentClassifier,
    extractor: OrderExtractor,
    composer: ResponseComposer,
    sessions: SessionStore,
    assistant_name: String,
    context_window: usize,
}

impl AgentRuntime {
    /// Wires the runtime from configuration. `client` is `None` in degraded mode.
    pub fn from_config(
        config: &AppConfig,
        client: Option<Arc<dyn LlmClient>>,
    ) -> Result<Self, RuntimeBuildError> {
        let catalog = Arc::new(config.menu.clone());
        let templates = Arc::new(PromptTemplates::new()?);
        let timeout = Duration::from_secs(config.llm.timeout_secs);

        let extractor = OrderExtractor::new(
            Arc::clone(&catalog),
            Arc::clone(&templates),
            client.clone(),
            timeout,
            config.llm.on_extraction_error,
        );
        let composer =
            ResponseComposer::new(config.restaurant.clone(), templates, client, timeout);

        Ok(Self {
            catalog,
            classifier: IntentClassifier::standard()?,
            extractor,
            composer,
            sessions: SessionStore::new(config.session.max_history),
            assistant_name: config.restaurant.assistant_name.clone(),
            context_window: config.session.context_window,
        })
    }

    pub fn catalog(&self) -> &MenuCatalog {
        &self.catalog
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn generation_configured(&self) -> bool {
        self.composer.is_configured()
    }

    pub async fn welcome(&self) -> String {
        self.composer.compose(&ReplyAction::Welcome, "").await
    }

    /// Cart snapshot and total. Unknown sessions read as empty.
    pub async fn cart(&self, session_id: &str) -> (Vec<CartLine>, Decimal) {
        let cart = self.sessions.cart(session_id).await;
        (cart.lines(&self.catalog), cart.total(&self.catalog))
    }

    /// Processes one utterance while holding the session's lock.
    pub async fn handle_utterance(&self, session_id: &str, text: &str) -> TurnOutcome {
        let mut session = self.sessions.lock(session_id).await;
        session.history.push(Speaker::Customer, text);
        let context = session.history.context(self.context_window, &self.assistant_name);

        let intent = self.classifier.classify(text);
        debug!(event_name = "order.turn.classified", session_id, intent = intent.as_str());

        let outcome = match intent {
            Intent::Casual => {
                let action = ReplyAction::Greeting { utterance: text.to_string() };
                let response = self.composer.compose(&action, &context).await;
                TurnOutcome {
                    success: true,
                    cart: session.cart.lines(&self.catalog),
                    total: session.cart.total(&self.catalog),
                    response,
                    items_added: Vec::new(),
                    is_greeting: Some(true),
                    checkout: None,
                }
            }
            Intent::ClearCart => {
                session.cart.clear();
                TurnOutcome {
                    success: true,
                    cart: Vec::new(),
                    total: Decimal::ZERO,
                    response: CART_CLEARED_REPLY.to_string(),
                    items_added: Vec::new(),
                    is_greeting: None,
                    checkout: None,
                }
            }
            Intent::Checkout if session.cart.is_empty() => TurnOutcome {
                success: false,
                cart: Vec::new(),
                total: Decimal::ZERO,
                response: EMPTY_CHECKOUT_REPLY.to_string(),
                items_added: Vec::new(),
                is_greeting: None,
                checkout: Some(false),
            },
            Intent::Checkout => {
                let cart = session.cart.lines(&self.catalog);
                let total = session.cart.total(&self.catalog);
                let action = ReplyAction::Checkout { cart: cart.clone(), total };
                let response = self.composer.compose(&action, &context).await;
                TurnOutcome {
                    success: true,
                    cart,
                    total,
                    response,
                    items_added: Vec::new(),
                    is_greeting: None,
                    checkout: Some(true),
                }
            }
            Intent::Order => {
                let extraction = self.extractor.extract(text).await;
                if extraction.items.is_empty() {
                    let action = ReplyAction::NoItems { utterance: text.to_string() };
                    let response = self.composer.compose(&action, &context).await;
                    TurnOutcome {
                        success: false,
                        cart: session.cart.lines(&self.catalog),
                        total: session.cart.total(&self.catalog),
                        response,
                        items_added: Vec::new(),
                        is_greeting: None,
                        checkout: None,
                    }
                } else {
                    let total = session.cart.merge(&extraction.items, &self.catalog);
                    let cart = session.cart.lines(&self.catalog);
                    let added = denormalize(&extraction.items, &self.catalog);
                    let action =
                        ReplyAction::Add { added: added.clone(), cart: cart.clone(), total };
                    let response = self.composer.compose(&action, &context).await;
                    TurnOutcome {
                        success: true,
                        cart,
                        total,
                        response,
                        items_added: added,
                        is_greeting: None,
                        checkout: None,
                    }
                }
            }
        };

        session.history.push(Speaker::Assistant, outcome.response.as_str());
        info!(
            event_name = "order.turn.completed",
            session_id,
            intent = intent.as_str(),
            success = outcome.success,
            items_added = outcome.items_added.len(),
            cart_lines = outcome.cart.len(),
            total = %outcome.total,
            "order turn completed"
        );
        outcome
    }
}

//! Reply composition.
//!
//! Each action renders a prompt for the generation service. When the service
//! is unconfigured, fails, times out or answers with nothing usable, the
//! action's canned reply is returned instead.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;
use tabletalk_core::config::RestaurantConfig;
use tabletalk_core::domain::cart::CartLine;
use tabletalk_core::pricing::format_amount;
use tracing::warn;

use crate::llm::{complete_with_timeout, LlmClient, ServiceError};
use crate::prompts::{PromptTemplates, ADD, CHECKOUT, GREETING, NO_ITEMS, WELCOME};

#[derive(Clone, Debug, PartialEq)]
pub enum ReplyAction {
    Welcome,
    Greeting { utterance: String },
    Add { added: Vec<CartLine>, cart: Vec<CartLine>, total: Decimal },
    NoItems { utterance: String },
    Checkout { cart: Vec<CartLine>, total: Decimal },
}

impl ReplyAction {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Greeting { .. } => "greeting",
            Self::Add { .. } => "add",
            Self::NoItems { .. } => "no-items",
            Self::Checkout { .. } => "checkout",
        }
    }

    fn template(&self) -> &'static str {
        match self {
            Self::Welcome => WELCOME,
            Self::Greeting { .. } => GREETING,
            Self::Add { .. } => ADD,
            Self::NoItems { .. } => NO_ITEMS,
            Self::Checkout { .. } => CHECKOUT,
        }
    }
}

/// `"{quantity} {name}"` per line, joined by `", "`.
pub fn describe_lines(lines: &[CartLine]) -> String {
    lines
        .iter()
        .map(|line| format!("{} {}", line.quantity, line.name))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Serialize)]
struct PromptData<'a> {
    restaurant: &'a str,
    assistant: &'a str,
    context: &'a str,
    utterance: &'a str,
    items: String,
    cart_summary: String,
    total: String,
}

pub struct ResponseComposer {
    restaurant: RestaurantConfig,
    templates: Arc<PromptTemplates>,
    client: Option<Arc<dyn LlmClient>>,
    timeout: Duration,
}

impl ResponseComposer {
    pub fn new(
        restaurant: RestaurantConfig,
        templates: Arc<PromptTemplates>,
        client: Option<Arc<dyn LlmClient>>,
        timeout: Duration,
    ) -> Self {
        Self { restaurant, templates, client, timeout }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Never fails: any service problem yields the canned reply.
    pub async fn compose(&self, action: &ReplyAction, context: &str) -> String {
        let Some(client) = &self.client else {
            return self.canned(action);
        };

        match self.generate(client.as_ref(), action, context).await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(
                    event_name = "reply.generate.fallback",
                    action = action.tag(),
                    error = %error,
                    "reply generation failed; using canned reply"
                );
                self.canned(action)
            }
        }
    }

    pub fn canned(&self, action: &ReplyAction) -> String {
        match action {
            ReplyAction::Welcome => format!(
                "Hey there! Welcome to {}! I'm {}, and I'll be helping you today. What can I get started for you?",
                self.restaurant.name, self.restaurant.assistant_name
            ),
            ReplyAction::Greeting { .. } => {
                "Hey! Good to see you! What sounds good to you today?".to_string()
            }
            ReplyAction::Add { added, total, .. } => format!(
                "Awesome! I've got {} for you. That's ${} total. Anything else?",
                describe_lines(added),
                format_amount(*total)
            ),
            ReplyAction::NoItems { .. } => {
                "Sorry, I didn't catch that! What would you like to order?".to_string()
            }
            ReplyAction::Checkout { total, .. } => format!(
                "Perfect! Your total is ${}. We'll have that ready for you soon. Thanks!",
                format_amount(*total)
            ),
        }
    }

    pub fn prompt(&self, action: &ReplyAction, context: &str) -> Result<String, ServiceError> {
        let (utterance, items, cart_summary, total) = match action {
            ReplyAction::Welcome => ("", String::new(), String::new(), String::new()),
            ReplyAction::Greeting { utterance } | ReplyAction::NoItems { utterance } => {
                (utterance.as_str(), String::new(), String::new(), String::new())
            }
            ReplyAction::Add { added, cart, total } => {
                ("", describe_lines(added), describe_lines(cart), format_amount(*total))
            }
            ReplyAction::Checkout { cart, total } => {
                ("", String::new(), describe_lines(cart), format_amount(*total))
            }
        };

        let data = PromptData {
            restaurant: &self.restaurant.name,
            assistant: &self.restaurant.assistant_name,
            context,
            utterance,
            items,
            cart_summary,
            total,
        };

        self.templates.render(action.template(), &data).map_err(|error| {
            ServiceError::Malformed(format!("{} prompt: {error}", action.tag()))
        })
    }

    async fn generate(
        &self,
        client: &dyn LlmClient,
        action: &ReplyAction,
        context: &str,
    ) -> Result<String, ServiceError> {
        let prompt = self.prompt(action, context)?;
        let raw = complete_with_timeout(client, &prompt, self.timeout).await?;
        let reply = clean_reply(&raw);
        if reply.is_empty() {
            return Err(ServiceError::Malformed("empty reply".to_string()));
        }
        Ok(reply)
    }
}

/// Trims whitespace and any quote characters wrapping the reply.
pub fn clean_reply(raw: &str) -> String {
    raw.trim().trim_matches(|ch| ch == '"' || ch == '\'').trim().to_string()
}

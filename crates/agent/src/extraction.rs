//! Utterance to `(menu key, quantity)` extraction.
//!
//! The language service is asked for a JSON array first. Any failure there
//! (transport, timeout, unparseable output) degrades to a deterministic
//! keyword scan of the utterance, or to no items under the strict policy.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tabletalk_core::catalog::MenuCatalog;
use tabletalk_core::config::ExtractionErrorPolicy;
use tabletalk_core::domain::cart::OrderLineItem;
use tabletalk_core::domain::menu::MenuKey;
use tracing::{debug, warn};

use crate::llm::{complete_with_timeout, LlmClient, ServiceError};
use crate::prompts::{PromptTemplates, EXTRACT};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractionSource {
    Service,
    Fallback,
    Unavailable,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extraction {
    pub items: Vec<OrderLineItem>,
    pub source: ExtractionSource,
}

pub struct OrderExtractor {
    catalog: Arc<MenuCatalog>,
    templates: Arc<PromptTemplates>,
    client: Option<Arc<dyn LlmClient>>,
    timeout: Duration,
    on_error: ExtractionErrorPolicy,
}

#[derive(Serialize)]
struct ExtractPrompt<'a> {
    menu_keys: Vec<&'a str>,
    utterance: &'a str,
}

impl OrderExtractor {
    pub fn new(
        catalog: Arc<MenuCatalog>,
        templates: Arc<PromptTemplates>,
        client: Option<Arc<dyn LlmClient>>,
        timeout: Duration,
        on_error: ExtractionErrorPolicy,
    ) -> Self {
        Self { catalog, templates, client, timeout, on_error }
    }

    pub async fn extract(&self, utterance: &str) -> Extraction {
        let Some(client) = &self.client else {
            return Extraction {
                items: fallback_extract(utterance, &self.catalog),
                source: ExtractionSource::Fallback,
            };
        };

        match self.extract_with_service(client.as_ref(), utterance).await {
            Ok(items) => Extraction { items, source: ExtractionSource::Service },
            Err(error) => {
                warn!(
                    event_name = "order.extract.fallback",
                    error = %error,
                    policy = ?self.on_error,
                    "order extraction service failed; degrading"
                );
                match self.on_error {
                    ExtractionErrorPolicy::Fallback => Extraction {
                        items: fallback_extract(utterance, &self.catalog),
                        source: ExtractionSource::Fallback,
                    },
                    ExtractionErrorPolicy::Empty => {
                        Extraction { items: Vec::new(), source: ExtractionSource::Unavailable }
                    }
                }
            }
        }
    }

    pub fn prompt(&self, utterance: &str) -> Result<String, ServiceError> {
        let data = ExtractPrompt {
            menu_keys: self.catalog.keys().map(MenuKey::as_str).collect(),
            utterance,
        };
        self.templates
            .render(EXTRACT, &data)
            .map_err(|error| ServiceError::Malformed(format!("extract prompt: {error}")))
    }

    async fn extract_with_service(
        &self,
        client: &dyn LlmClient,
        utterance: &str,
    ) -> Result<Vec<OrderLineItem>, ServiceError> {
        let prompt = self.prompt(utterance)?;
        let raw = complete_with_timeout(client, &prompt, self.timeout).await?;
        let reported = locate_json_array(&raw).ok_or_else(|| {
            ServiceError::Malformed("no JSON array in extraction response".to_string())
        })?;

        let items = validate_reported_items(&reported, &self.catalog);
        debug!(
            event_name = "order.extract.service_parsed",
            reported = reported.len(),
            accepted = items.len(),
            "extraction response validated"
        );
        Ok(items)
    }
}

/// Finds the first substring that parses as a JSON array and returns its elements.
///
/// Service output may be wrapped in prose or code fences, so each `[` is tried
/// as the start of a JSON value until one parses as an array.
pub fn locate_json_array(raw: &str) -> Option<Vec<Value>> {
    raw.match_indices('[').find_map(|(start, _)| {
        let mut values = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(Value::Array(elements))) => Some(elements),
            _ => None,
        }
    })
}

/// Maps reported `{item, quantity}` objects onto menu keys.
///
/// Exact key match first, then the first catalog key (in catalog order) that
/// contains the reported name or is contained by it. Unmatched names are
/// dropped.
pub fn validate_reported_items(reported: &[Value], catalog: &MenuCatalog) -> Vec<OrderLineItem> {
    reported
        .iter()
        .filter_map(|element| {
            let name = element.get("item").and_then(Value::as_str)?.trim().to_lowercase();
            let key = match_menu_key(&name, catalog)?;
            let quantity = reported_quantity(element.get("quantity"));
            Some(OrderLineItem { key: key.clone(), quantity })
        })
        .collect()
}

pub fn match_menu_key<'a>(name: &str, catalog: &'a MenuCatalog) -> Option<&'a MenuKey> {
    if name.is_empty() {
        return None;
    }
    if let Some(entry) = catalog.find(name) {
        return Some(&entry.key);
    }
    catalog.keys().find(|key| name.contains(key.as_str()) || key.as_str().contains(name))
}

/// Positive whole quantities are kept; anything else (missing, zero,
/// negative, fractional, non-numeric) becomes 1.
pub fn reported_quantity(value: Option<&Value>) -> u32 {
    let quantity = match value {
        Some(Value::Number(number)) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|q| q.fract() == 0.0 && *q >= 1.0).map(|q| q as u64)),
        Some(Value::String(text)) => text.trim().parse::<u64>().ok(),
        _ => None,
    };

    quantity
        .filter(|quantity| *quantity >= 1)
        .map(|quantity| u32::try_from(quantity).unwrap_or(u32::MAX))
        .unwrap_or(1)
}

/// Keyword scan used when the language service is unavailable.
///
/// Each catalog key found in the lowercased utterance yields one line item.
/// Overlapping keys resolve longest-first: an occurrence of `burger` inside an
/// already claimed `cheeseburger` is not counted. Among the counted
/// occurrences, the first one preceded by a whitespace-separated word supplies
/// that word; it sets the quantity when it is a number word
/// (`a`/`an`/`one`..`ten`) or a positive integer, otherwise the quantity is 1.
/// Output follows catalog order.
pub fn fallback_extract(utterance: &str, catalog: &MenuCatalog) -> Vec<OrderLineItem> {
    let text = utterance.to_lowercase();

    let mut keys = catalog.keys().enumerate().collect::<Vec<_>>();
    keys.sort_by(|(left_index, left), (right_index, right)| {
        right.as_str().len().cmp(&left.as_str().len()).then(left_index.cmp(right_index))
    });

    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut found: Vec<(usize, OrderLineItem)> = Vec::new();

    for (catalog_index, key) in keys {
        let needle = key.as_str();
        let occurrences = text
            .match_indices(needle)
            .map(|(start, _)| (start, start + needle.len()))
            .filter(|(start, end)| {
                !claimed.iter().any(|(taken_start, taken_end)| start < taken_end && taken_start < end)
            })
            .collect::<Vec<_>>();

        if occurrences.is_empty() {
            continue;
        }

        let quantity = occurrences
            .iter()
            .find_map(|(start, _)| preceding_word(&text, *start))
            .and_then(quantity_word)
            .unwrap_or(1);
        claimed.extend(occurrences);
        found.push((catalog_index, OrderLineItem { key: key.clone(), quantity }));
    }

    found.sort_by_key(|(catalog_index, _)| *catalog_index);
    found.into_iter().map(|(_, item)| item).collect()
}

/// The word immediately before byte offset `start`, separated from it by whitespace.
fn preceding_word(text: &str, start: usize) -> Option<&str> {
    let before = &text[..start];
    let trimmed = before.trim_end();
    if trimmed.len() == before.len() {
        return None;
    }

    let word_start = trimmed
        .char_indices()
        .rev()
        .take_while(|(_, ch)| ch.is_alphanumeric() || *ch == '_')
        .last()
        .map(|(index, _)| index)?;
    Some(&trimmed[word_start..])
}

fn quantity_word(word: &str) -> Option<u32> {
    let quantity = match word {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        digits if !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit()) => {
            digits.parse::<u32>().ok()?
        }
        _ => return None,
    };
    (quantity >= 1).then_some(quantity)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use rust_decimal::Decimal;
    use serde_json::json;
    use tabletalk_core::catalog::MenuCatalog;
    use tabletalk_core::config::ExtractionErrorPolicy;
    use tabletalk_core::domain::cart::OrderLineItem;
    use tabletalk_core::domain::menu::MenuEntry;

    use crate::llm::fakes::{ScriptedClient, SlowClient};
    use crate::llm::LlmClient;
    use crate::prompts::PromptTemplates;

    use super::{
        fallback_extract, locate_json_array, match_menu_key, reported_quantity,
        validate_reported_items, ExtractionSource, OrderExtractor,
    };

    fn extractor(
        client: Option<Arc<dyn LlmClient>>,
        on_error: ExtractionErrorPolicy,
    ) -> OrderExtractor {
        OrderExtractor::new(
            Arc::new(MenuCatalog::default()),
            Arc::new(PromptTemplates::new().expect("templates compile")),
            client,
            Duration::from_millis(200),
            on_error,
        )
    }

    #[test]
    fn fallback_reads_number_words_and_articles() {
        let catalog = MenuCatalog::default();
        assert_eq!(
            fallback_extract("two burgers and a pizza", &catalog),
            vec![OrderLineItem::new("burger", 2), OrderLineItem::new("pizza", 1)]
        );
    }

    #[test]
    fn fallback_prefers_the_longest_overlapping_key() {
        let catalog = MenuCatalog::default();
        assert_eq!(
            fallback_extract("I'd like a cheeseburger and two sodas", &catalog),
            vec![OrderLineItem::new("cheeseburger", 1), OrderLineItem::new("soda", 2)]
        );
        assert_eq!(
            fallback_extract("a cheeseburger and three burgers", &catalog),
            vec![OrderLineItem::new("burger", 3), OrderLineItem::new("cheeseburger", 1)]
        );
    }

    #[test]
    fn fallback_matches_compound_keys_and_digits() {
        let catalog = MenuCatalog::default();
        assert_eq!(
            fallback_extract("12 Chicken Wings with fries", &catalog),
            vec![OrderLineItem::new("fries", 1), OrderLineItem::new("chicken wings", 12)]
        );
    }

    #[test]
    fn fallback_reads_quantity_from_first_occurrence_with_a_preceding_word() {
        let catalog = MenuCatalog::default();
        assert_eq!(
            fallback_extract("burger and fries, make it two burger", &catalog),
            vec![OrderLineItem::new("burger", 2), OrderLineItem::new("fries", 1)]
        );
        assert_eq!(
            fallback_extract("soda please. then, soda again with three soda", &catalog),
            vec![OrderLineItem::new("soda", 3)]
        );
    }

    #[test]
    fn fallback_ignores_words_that_are_not_quantities() {
        let catalog = MenuCatalog::default();
        assert_eq!(fallback_extract("another burger", &catalog), vec![OrderLineItem::new("burger", 1)]);
        assert_eq!(fallback_extract("0 coffee", &catalog), vec![OrderLineItem::new("coffee", 1)]);
        assert_eq!(fallback_extract("burger", &catalog), vec![OrderLineItem::new("burger", 1)]);
        assert!(fallback_extract("what's good here?", &catalog).is_empty());
    }

    #[test]
    fn locates_array_inside_prose_and_fences() {
        let raw = "Sure! Here you go:\n```json\n[{\"item\": \"burger\", \"quantity\": 2}]\n```";
        let elements = locate_json_array(raw).expect("array should be found");
        assert_eq!(elements, vec![json!({"item": "burger", "quantity": 2})]);

        let raw = "Items [burger] are: [{\"item\": \"soda\"}] done";
        assert_eq!(locate_json_array(raw), Some(vec![json!({"item": "soda"})]));

        assert_eq!(locate_json_array("[]"), Some(Vec::new()));
        assert_eq!(locate_json_array("no items"), None);
        assert_eq!(locate_json_array("[{\"item\": "), None);
    }

    #[test]
    fn validates_reported_names_against_the_catalog() {
        let catalog = MenuCatalog::default();
        let reported = vec![
            json!({"item": " Burger ", "quantity": 2}),
            json!({"item": "large fries", "quantity": 1}),
            json!({"item": "wings", "quantity": 3}),
            json!({"item": "lobster", "quantity": 1}),
            json!({"item": "", "quantity": 1}),
            json!({"quantity": 1}),
            json!("soda"),
        ];

        assert_eq!(
            validate_reported_items(&reported, &catalog),
            vec![
                OrderLineItem::new("burger", 2),
                OrderLineItem::new("fries", 1),
                OrderLineItem::new("chicken wings", 3),
            ]
        );
    }

    #[test]
    fn fuzzy_matching_follows_catalog_order() {
        let catalog = MenuCatalog::default();
        assert_eq!(match_menu_key("double cheeseburger", &catalog).map(|key| key.as_str()), Some("burger"));
        assert_eq!(match_menu_key("cheeseburger", &catalog).map(|key| key.as_str()), Some("cheeseburger"));

        let reordered = MenuCatalog::new(vec![
            MenuEntry::new("cheeseburger", "Cheeseburger", Decimal::new(999, 2)),
            MenuEntry::new("burger", "Burger", Decimal::new(899, 2)),
        ])
        .expect("catalog");
        assert_eq!(
            match_menu_key("double cheeseburger", &reordered).map(|key| key.as_str()),
            Some("cheeseburger")
        );
    }

    #[test]
    fn non_positive_or_missing_quantities_default_to_one() {
        assert_eq!(reported_quantity(Some(&json!(3))), 3);
        assert_eq!(reported_quantity(Some(&json!(2.0))), 2);
        assert_eq!(reported_quantity(Some(&json!("4"))), 4);
        assert_eq!(reported_quantity(Some(&json!(0))), 1);
        assert_eq!(reported_quantity(Some(&json!(-2))), 1);
        assert_eq!(reported_quantity(Some(&json!(1.5))), 1);
        assert_eq!(reported_quantity(Some(&json!(null))), 1);
        assert_eq!(reported_quantity(None), 1);
    }

    #[tokio::test]
    async fn service_results_are_used_when_parseable() {
        let client = Arc::new(ScriptedClient::replying(&[
            "```json\n[{\"item\": \"cheeseburger\", \"quantity\": 1}, {\"item\": \"soda\", \"quantity\": 2}]\n```",
        ]));
        let extractor = extractor(Some(client.clone()), ExtractionErrorPolicy::Fallback);

        let extraction = extractor.extract("I'd like a cheeseburger and two sodas").await;
        assert_eq!(extraction.source, ExtractionSource::Service);
        assert_eq!(
            extraction.items,
            vec![OrderLineItem::new("cheeseburger", 1), OrderLineItem::new("soda", 2)]
        );

        let prompts = client.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Available items: burger, cheeseburger, pizza"));
        assert!(prompts[0].contains("I'd like a cheeseburger and two sodas"));
    }

    #[tokio::test]
    async fn empty_service_array_means_no_items() {
        let client = Arc::new(ScriptedClient::replying(&["[]"]));
        let extraction = extractor(Some(client), ExtractionErrorPolicy::Fallback)
            .extract("a burger")
            .await;
        assert_eq!(extraction.source, ExtractionSource::Service);
        assert!(extraction.items.is_empty());
    }

    #[tokio::test]
    async fn service_failures_degrade_to_fallback() {
        let extraction = extractor(Some(Arc::new(ScriptedClient::failing())), ExtractionErrorPolicy::Fallback)
            .extract("two burgers and a pizza")
            .await;
        assert_eq!(extraction.source, ExtractionSource::Fallback);
        assert_eq!(
            extraction.items,
            vec![OrderLineItem::new("burger", 2), OrderLineItem::new("pizza", 1)]
        );

        let malformed = Arc::new(ScriptedClient::replying(&["I think they want a burger"]));
        let extraction =
            extractor(Some(malformed), ExtractionErrorPolicy::Fallback).extract("a burger").await;
        assert_eq!(extraction.source, ExtractionSource::Fallback);
        assert_eq!(extraction.items, vec![OrderLineItem::new("burger", 1)]);
    }

    #[tokio::test]
    async fn timeouts_degrade_to_fallback() {
        let slow = Arc::new(SlowClient(Duration::from_secs(5)));
        let extraction =
            extractor(Some(slow), ExtractionErrorPolicy::Fallback).extract("a soda").await;
        assert_eq!(extraction.source, ExtractionSource::Fallback);
        assert_eq!(extraction.items, vec![OrderLineItem::new("soda", 1)]);
    }

    #[tokio::test]
    async fn strict_policy_reports_no_items_on_failure() {
        let extraction = extractor(Some(Arc::new(ScriptedClient::failing())), ExtractionErrorPolicy::Empty)
            .extract("two burgers")
            .await;
        assert_eq!(extraction.source, ExtractionSource::Unavailable);
        assert!(extraction.items.is_empty());
    }

    #[tokio::test]
    async fn unconfigured_service_uses_fallback_only() {
        let extraction = extractor(None, ExtractionErrorPolicy::Empty).extract("a milkshake").await;
        assert_eq!(extraction.source, ExtractionSource::Fallback);
        assert_eq!(extraction.items, vec![OrderLineItem::new("milkshake", 1)]);
    }
}

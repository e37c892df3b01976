//! Utterance classification.
//!
//! Rules are evaluated in table order and the first rule with a matching
//! matcher decides the intent. Anything unmatched is an order.

use regex::Regex;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Intent {
    Casual,
    ClearCart,
    Checkout,
    Order,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::ClearCart => "clear-cart",
            Self::Checkout => "checkout",
            Self::Order => "order",
        }
    }
}

const CASUAL_PATTERNS: [&str; 16] = [
    r"^hi+$",
    r"^hello+$",
    r"^hey+$",
    r"^good morning$",
    r"^good afternoon$",
    r"^good evening$",
    r"^how are you$",
    r"^thanks$",
    r"^thank you$",
    r"^okay$",
    r"^ok$",
    r"^yes$",
    r"^no$",
    r"^sure$",
    r"^alright$",
    r"^please\b",
];

const CLEAR_CART_PHRASES: [&str; 4] = ["clear", "empty cart", "remove everything", "reset cart"];

const CHECKOUT_PHRASES: [&str; 14] = [
    "checkout",
    "check out",
    "complete order",
    "complete my order",
    "finish order",
    "done",
    "that's all",
    "that is all",
    "finish",
    "place order",
    "place my order",
    "complete",
    "i'm done",
    "im done",
];

#[derive(Clone, Debug)]
pub enum Matcher {
    /// Regex over the trimmed, lowercased utterance.
    Pattern(Regex),
    /// Case-insensitive substring.
    Phrase(String),
}

impl Matcher {
    fn matches(&self, normalized: &str) -> bool {
        match self {
            Self::Pattern(pattern) => pattern.is_match(normalized),
            Self::Phrase(phrase) => normalized.contains(phrase.as_str()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct IntentRule {
    pub intent: Intent,
    pub matchers: Vec<Matcher>,
}

impl IntentRule {
    pub fn patterns(intent: Intent, patterns: &[&str]) -> Result<Self, regex::Error> {
        let matchers = patterns
            .iter()
            .map(|pattern| Regex::new(pattern).map(Matcher::Pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { intent, matchers })
    }

    pub fn phrases(intent: Intent, phrases: &[&str]) -> Self {
        let matchers =
            phrases.iter().map(|phrase| Matcher::Phrase(phrase.to_lowercase())).collect();
        Self { intent, matchers }
    }

    fn matches(&self, normalized: &str) -> bool {
        self.matchers.iter().any(|matcher| matcher.matches(normalized))
    }
}

#[derive(Clone, Debug)]
pub struct IntentClassifier {
    rules: Vec<IntentRule>,
}

impl IntentClassifier {
    pub fn new(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    /// Casual, then clear-cart, then checkout.
    pub fn standard() -> Result<Self, regex::Error> {
        Ok(Self::new(vec![
            IntentRule::patterns(Intent::Casual, &CASUAL_PATTERNS)?,
            IntentRule::phrases(Intent::ClearCart, &CLEAR_CART_PHRASES),
            IntentRule::phrases(Intent::Checkout, &CHECKOUT_PHRASES),
        ]))
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    pub fn classify(&self, text: &str) -> Intent {
        let normalized = text.trim().to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&normalized))
            .map(|rule| rule.intent)
            .unwrap_or(Intent::Order)
    }
}

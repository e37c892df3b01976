use serde::Serialize;
use tera::{Context, Tera};

pub const EXTRACT: &str = "extract.prompt";
pub const WELCOME: &str = "welcome.prompt";
pub const GREETING: &str = "greeting.prompt";
pub const ADD: &str = "add.prompt";
pub const NO_ITEMS: &str = "no_items.prompt";
pub const CHECKOUT: &str = "checkout.prompt";

const EXTRACT_TEMPLATE: &str = r#"Extract food items and quantities from this order.

Available items: {{ menu_keys | join(sep=", ") }}

Customer said: "{{ utterance }}"

Rules:
- Match items even with "a", "an", "the" prefixes
- "a burger" = burger
- "two burgers" = 2 burgers
- Default quantity is 1
- Return empty array [] if no valid items found

Return ONLY valid JSON array, no markdown, no explanation:
[{"item": "exact_menu_item", "quantity": number}]

Examples:
"a burger" -> [{"item": "burger", "quantity": 1}]
"two burgers and pizza" -> [{"item": "burger", "quantity": 2}, {"item": "pizza", "quantity": 1}]
"hello" -> []

JSON response:"#;

const WELCOME_TEMPLATE: &str = r#"You're {{ assistant }}, a friendly server at {{ restaurant }}. Write a warm 2-sentence welcome:
1. Greet them to {{ restaurant }}
2. Ask what they'd like

Be casual, use contractions. Example: "Hey! Welcome to {{ restaurant }}! I'm {{ assistant }}. What can I get you today?"

Response (just the greeting, no quotes):"#;

const GREETING_TEMPLATE: &str = r#"You're {{ assistant }}, a server at {{ restaurant }}.
{% if context %}
Recent conversation:
{{ context }}
{% endif %}
Customer: "{{ utterance }}"

Respond in 1 sentence. Be friendly, then ask what they want to order.

Example: "Hey! What sounds good to you?"

Response:"#;

const ADD_TEMPLATE: &str = r#"You're {{ assistant }}, a server at {{ restaurant }}.
{% if context %}
Recent conversation:
{{ context }}
{% endif %}
Just added: {{ items }}
Cart now has: {{ cart_summary }}
Total: ${{ total }}

Write 2-3 sentences:
1. Confirm what was added (be enthusiastic!)
2. Say the total
3. Ask if they want more

Be casual, conversational. Use contractions.

Example: "Nice! Got your {{ items }}. That's ${{ total }} so far. Want anything else?"

Response (no quotes):"#;

const NO_ITEMS_TEMPLATE: &str = r#"You're {{ assistant }}, a server at {{ restaurant }}.
{% if context %}
Recent conversation:
{{ context }}
{% endif %}
Customer: "{{ utterance }}"

You didn't understand their order. Politely ask them to repeat (1 sentence).

Example: "Sorry, didn't catch that! What would you like?"

Response:"#;

const CHECKOUT_TEMPLATE: &str = r#"You're {{ assistant }}, a server at {{ restaurant }}.
{% if context %}
Recent conversation:
{{ context }}
{% endif %}
Customer is checking out.
Order: {{ cart_summary }}
Total: ${{ total }}

Write 2-3 sentences:
1. Thank them
2. Confirm total
3. Say food will be ready soon

Be warm and appreciative.

Example: "Awesome! Thanks for ordering. Your total is ${{ total }}. We'll have that ready in a few minutes!"

Response (no quotes):"#;

/// Prompt templates for extraction and reply generation.
pub struct PromptTemplates {
    tera: Tera,
}

impl PromptTemplates {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        tera.add_raw_templates(vec![
            (EXTRACT, EXTRACT_TEMPLATE),
            (WELCOME, WELCOME_TEMPLATE),
            (GREETING, GREETING_TEMPLATE),
            (ADD, ADD_TEMPLATE),
            (NO_ITEMS, NO_ITEMS_TEMPLATE),
            (CHECKOUT, CHECKOUT_TEMPLATE),
        ])?;
        Ok(Self { tera })
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<String, tera::Error> {
        let context = Context::from_serialize(data)?;
        self.tera.render(name, &context)
    }
}

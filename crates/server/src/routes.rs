//! Order-taking HTTP API.
//!
//! Every route is served at the root and again under `/api`:
//! - `GET  /`                    - service status (see `health`)
//! - `GET  /menu`                - menu in catalog order
//! - `GET  /config`              - restaurant and assistant names
//! - `POST /process-order`       - run one customer utterance
//! - `GET  /cart/{session_id}`   - cart snapshot, unknown sessions are empty
//! - `GET  /welcome`             - welcome reply

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tabletalk_agent::runtime::{AgentRuntime, TurnOutcome};
use tabletalk_core::config::RestaurantConfig;
use tabletalk_core::domain::cart::CartLine;
use tabletalk_core::domain::menu::MenuEntry;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::health;

#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<AgentRuntime>,
    pub restaurant: RestaurantConfig,
}

impl AppState {
    pub fn new(runtime: Arc<AgentRuntime>, restaurant: RestaurantConfig) -> Self {
        Self { runtime, restaurant }
    }
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_session_id")]
    pub session_id: String,
}

fn default_session_id() -> String {
    "default".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineItem {
    pub key: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
}

impl From<CartLine> for LineItem {
    fn from(line: CartLine) -> Self {
        Self { key: line.key.0, name: line.name, price: line.price, quantity: line.quantity }
    }
}

fn line_items(lines: Vec<CartLine>) -> Vec<LineItem> {
    lines.into_iter().map(LineItem::from).collect()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderResponse {
    pub success: bool,
    pub cart: Vec<LineItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub response: String,
    pub items_added: Vec<LineItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_greeting: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout: Option<bool>,
}

impl From<TurnOutcome> for OrderResponse {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            success: outcome.success,
            cart: line_items(outcome.cart),
            total: outcome.total,
            response: outcome.response,
            items_added: line_items(outcome.items_added),
            is_greeting: outcome.is_greeting,
            checkout: outcome.checkout,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartResponse {
    pub cart: Vec<LineItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MenuItem {
    pub key: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl From<&MenuEntry> for MenuItem {
    fn from(entry: &MenuEntry) -> Self {
        Self { key: entry.key.0.clone(), name: entry.name.clone(), price: entry.price }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MenuResponse {
    pub menu: Vec<MenuItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfigResponse {
    pub restaurant_name: String,
    pub assistant_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WelcomeResponse {
    pub response: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/", get(health::status))
        .route("/menu", get(menu))
        .route("/config", get(config))
        .route("/process-order", post(process_order))
        .route("/cart/{session_id}", get(cart))
        .route("/welcome", get(welcome));

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn menu(State(state): State<AppState>) -> Json<MenuResponse> {
    let menu = state.runtime.catalog().entries().iter().map(MenuItem::from).collect();
    Json(MenuResponse { menu })
}

pub async fn config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        restaurant_name: state.restaurant.name.clone(),
        assistant_name: state.restaurant.assistant_name.clone(),
    })
}

pub async fn process_order(
    State(state): State<AppState>,
    Json(request): Json<OrderRequest>,
) -> Json<OrderResponse> {
    let outcome = state.runtime.handle_utterance(&request.session_id, &request.text).await;
    Json(outcome.into())
}

pub async fn cart(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> Json<CartResponse> {
    let (lines, total) = state.runtime.cart(&session_id).await;
    Json(CartResponse { cart: line_items(lines), total })
}

pub async fn welcome(State(state): State<AppState>) -> Json<WelcomeResponse> {
    Json(WelcomeResponse { response: state.runtime.welcome().await })
}

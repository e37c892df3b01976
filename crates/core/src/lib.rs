pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;
pub mod session;

pub use catalog::MenuCatalog;
pub use domain::cart::{Cart, CartLine, OrderLineItem};
pub use domain::conversation::{ConversationHistory, HistoryRecord, Speaker};
pub use domain::menu::{MenuEntry, MenuKey};
pub use errors::DomainError;
pub use session::{SessionState, SessionStore};

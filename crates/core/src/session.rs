//! In-process session registry.
//!
//! Each session id maps to its own `Mutex<SessionState>`, so a request holds
//! the lock for its session only and unrelated sessions proceed in parallel.
//! Sessions are never evicted.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::cart::Cart;
use crate::domain::conversation::{ConversationHistory, Speaker, DEFAULT_MAX_HISTORY};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    pub cart: Cart,
    pub history: ConversationHistory,
}

impl SessionState {
    pub fn new(max_history: usize) -> Self {
        Self { cart: Cart::new(), history: ConversationHistory::with_max_len(max_history) }
    }
}

pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionState>>>>,
    max_history: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl SessionStore {
    pub fn new(max_history: usize) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), max_history }
    }

    pub async fn get_or_create(&self, session_id: &str) -> Arc<Mutex<SessionState>> {
        if let Some(state) = self.sessions.read().await.get(session_id) {
            return Arc::clone(state);
        }

        let mut sessions = self.sessions.write().await;
        let state = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(SessionState::new(self.max_history))));
        Arc::clone(state)
    }

    /// Exclusive access to one session for the duration of a request.
    pub async fn lock(&self, session_id: &str) -> OwnedMutexGuard<SessionState> {
        self.get_or_create(session_id).await.lock_owned().await
    }

    pub async fn append_history(&self, session_id: &str, speaker: Speaker, text: &str) {
        self.lock(session_id).await.history.push(speaker, text);
    }

    pub async fn clear_cart(&self, session_id: &str) {
        self.lock(session_id).await.cart.clear();
    }

    /// Cart snapshot. Unknown sessions read as an empty cart and are not created.
    pub async fn cart(&self, session_id: &str) -> Cart {
        let state = self.sessions.read().await.get(session_id).map(Arc::clone);
        match state {
            Some(state) => state.lock().await.cart.clone(),
            None => Cart::new(),
        }
    }

    pub async fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::timeout;

    use crate::catalog::MenuCatalog;
    use crate::domain::cart::OrderLineItem;
    use crate::domain::conversation::Speaker;

    use super::SessionStore;

    #[tokio::test]
    async fn sessions_are_created_lazily_and_empty() {
        let store = SessionStore::default();
        assert!(store.is_empty().await);

        let state = store.get_or_create("s1").await;
        let state = state.lock().await;
        assert!(state.cart.is_empty());
        assert!(state.history.is_empty());
        drop(state);

        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_session_cart_is_empty_and_not_created() {
        let store = SessionStore::default();
        assert!(store.cart("ghost").await.is_empty());
        assert!(!store.contains("ghost").await);
    }

    #[tokio::test]
    async fn history_is_truncated_to_the_latest_ten() {
        let store = SessionStore::default();
        for index in 0..15 {
            store.append_history("s1", Speaker::Customer, &format!("line {index}")).await;
        }

        let state = store.lock("s1").await;
        assert_eq!(state.history.len(), 10);
        assert_eq!(state.history.records().next().map(|record| record.text.as_str()), Some("line 5"));
    }

    #[tokio::test]
    async fn clear_cart_keeps_history() {
        let catalog = MenuCatalog::default();
        let store = SessionStore::default();
        {
            let mut state = store.lock("s1").await;
            state.cart.merge(&[OrderLineItem::new("burger", 1)], &catalog);
            state.history.push(Speaker::Customer, "a burger");
        }

        store.clear_cart("s1").await;

        let cart = store.cart("s1").await;
        assert!(cart.is_empty());
        assert_eq!(cart.total(&catalog), rust_decimal::Decimal::ZERO);
        assert_eq!(store.lock("s1").await.history.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_updates_to_one_session_are_not_lost() {
        let catalog = Arc::new(MenuCatalog::default());
        let store = Arc::new(SessionStore::default());

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = Arc::clone(&store);
            let catalog = Arc::clone(&catalog);
            handles.push(tokio::spawn(async move {
                let mut state = store.lock("shared").await;
                tokio::task::yield_now().await;
                state.cart.merge(&[OrderLineItem::new("soda", 1)], &catalog);
            }));
        }
        for handle in handles {
            handle.await.expect("task should finish");
        }

        assert_eq!(store.cart("shared").await.quantity_of("soda"), Some(32));
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let catalog = MenuCatalog::default();
        let store = SessionStore::default();
        store.lock("a").await.cart.merge(&[OrderLineItem::new("pizza", 1)], &catalog);

        assert!(store.cart("b").await.is_empty());
        assert_eq!(store.cart("a").await.quantity_of("pizza"), Some(1));
    }

    #[tokio::test]
    async fn holding_one_session_does_not_block_another() {
        let store = SessionStore::default();
        let held = store.lock("a").await;

        let other = timeout(Duration::from_millis(200), store.lock("b")).await;
        assert!(other.is_ok(), "an unrelated session should lock while `a` is held");
        drop(other);

        let same = timeout(Duration::from_millis(50), store.lock("a")).await;
        assert!(same.is_err(), "a second lock on `a` should wait for the holder");

        drop(held);
        assert!(timeout(Duration::from_millis(200), store.lock("a")).await.is_ok());
    }
}

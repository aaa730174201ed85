use std::sync::Arc;

use crate::store::{MemoryStore, TodoStore, UserStore};
use crate::token::TokenKeys;

#[derive(Clone)]
pub struct AppState {
    pub todos: Arc<dyn TodoStore>,
    pub users: Arc<dyn UserStore>,
    pub tokens: TokenKeys,
}

impl AppState {
    pub fn new<S>(store: Arc<S>, tokens: TokenKeys) -> Self
    where
        S: TodoStore + UserStore + 'static,
    {
        Self {
            todos: store.clone(),
            users: store,
            tokens,
        }
    }

    pub fn in_memory(tokens: TokenKeys) -> Self {
        Self::new(Arc::new(MemoryStore::new()), tokens)
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, StoreResult, TodoStore, UserStore};
use crate::model::{NewTodo, NewUser, Todo, TodoChanges, User};

/// Process-local store used by tests and by `serve` without a database.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    // Insertion order; listing walks it backwards.
    todos: Vec<Todo>,
    users: Vec<User>,
    revoked: HashMap<Uuid, DateTime<Utc>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn list(&self, owner_id: Uuid) -> StoreResult<Vec<Todo>> {
        let inner = self.inner.read().await;
        let mut todos: Vec<Todo> = inner
            .todos
            .iter()
            .rev()
            .filter(|t| t.user_id == owner_id)
            .cloned()
            .collect();
        // Stable, so equal timestamps keep newest-inserted first.
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(todos)
    }

    async fn create(&self, owner_id: Uuid, todo: NewTodo) -> StoreResult<Todo> {
        let now = Utc::now();
        let rec = Todo {
            id: Uuid::new_v4(),
            user_id: owner_id,
            title: todo.title,
            description: todo.description,
            is_done: false,
            created_at: now,
            updated_at: now,
        };

        self.inner.write().await.todos.push(rec.clone());
        Ok(rec)
    }

    async fn find(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Option<Todo>> {
        let inner = self.inner.read().await;
        Ok(inner
            .todos
            .iter()
            .find(|t| t.id == id && t.user_id == owner_id)
            .cloned())
    }

    async fn update(&self, owner_id: Uuid, id: Uuid, changes: TodoChanges) -> StoreResult<Todo> {
        let mut inner = self.inner.write().await;
        let todo = inner
            .todos
            .iter_mut()
            .find(|t| t.id == id && t.user_id == owner_id)
            .ok_or(StoreError::NotFound)?;

        changes.apply(todo);
        todo.updated_at = Utc::now();
        Ok(todo.clone())
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let before = inner.todos.len();
        inner.todos.retain(|t| !(t.id == id && t.user_id == owner_id));

        if inner.todos.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::EmailTaken);
        }

        let rec = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        inner.users.push(rec.clone());
        Ok(rec)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        inner.revoked.retain(|_, exp| *exp >= now);
        inner.revoked.insert(jti, expires_at);
        Ok(())
    }

    async fn is_token_revoked(&self, jti: Uuid) -> StoreResult<bool> {
        Ok(self.inner.read().await.revoked.contains_key(&jti))
    }
}

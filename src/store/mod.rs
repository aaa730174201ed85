//! Persistence behind the todo and auth routes.
//!
//! Every todo operation takes the owner's id as a required argument and the
//! implementations fold it into the same lookup that finds the record, so no
//! caller can reach a todo it does not own.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::model::{NewTodo, NewUser, Todo, TodoChanges, User};

#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with that id for that owner. Missing and foreign records
    /// are reported the same way.
    #[error("record not found")]
    NotFound,
    #[error("email already registered")]
    EmailTaken,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Newest first.
    async fn list(&self, owner_id: Uuid) -> StoreResult<Vec<Todo>>;

    async fn create(&self, owner_id: Uuid, todo: NewTodo) -> StoreResult<Todo>;

    async fn find(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Option<Todo>>;

    async fn update(&self, owner_id: Uuid, id: Uuid, changes: TodoChanges) -> StoreResult<Todo>;

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Marks a token id as logged out until it would have expired anyway.
    async fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> StoreResult<()>;

    async fn is_token_revoked(&self, jti: Uuid) -> StoreResult<bool>;
}

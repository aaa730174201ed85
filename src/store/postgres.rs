use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreError, StoreResult, TodoStore, UserStore};
use crate::model::{NewTodo, NewUser, Todo, TodoChanges, User};

const TODO_COLUMNS: &str = "id, user_id, title, description, is_done, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let db = PgPool::connect(database_url).await?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl TodoStore for PgStore {
    async fn list(&self, owner_id: Uuid) -> StoreResult<Vec<Todo>> {
        let todos = sqlx::query_as::<_, Todo>(&format!(
            r#"
            SELECT {TODO_COLUMNS}
            FROM todos
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(owner_id)
        .fetch_all(&self.db)
        .await?;

        Ok(todos)
    }

    async fn create(&self, owner_id: Uuid, todo: NewTodo) -> StoreResult<Todo> {
        let rec = sqlx::query_as::<_, Todo>(&format!(
            r#"
            INSERT INTO todos (id, user_id, title, description)
            VALUES ($1, $2, $3, $4)
            RETURNING {TODO_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(&todo.title)
        .bind(&todo.description)
        .fetch_one(&self.db)
        .await?;

        Ok(rec)
    }

    async fn find(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Option<Todo>> {
        let rec = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(rec)
    }

    async fn update(&self, owner_id: Uuid, id: Uuid, changes: TodoChanges) -> StoreResult<Todo> {
        let (set_description, description) = match changes.description {
            Some(value) => (true, value),
            None => (false, None),
        };

        // One statement: the owner filter and the write cannot be separated.
        let rec = sqlx::query_as::<_, Todo>(&format!(
            r#"
            UPDATE todos
            SET
                title = COALESCE($3, title),
                description = CASE WHEN $4 THEN $5 ELSE description END,
                is_done = COALESCE($6, is_done),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {TODO_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner_id)
        .bind(changes.title)
        .bind(set_description)
        .bind(description)
        .bind(changes.is_done)
        .fetch_optional(&self.db)
        .await?;

        rec.ok_or(StoreError::NotFound)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM todos
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let res = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(user) => Ok(user),
            Err(e) => {
                if let Some(db_error) = e.as_database_error() {
                    if db_error.is_unique_violation() {
                        return Err(StoreError::EmailTaken);
                    }
                }
                Err(e.into())
            }
        }
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    async fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, expires_at)
            VALUES ($1, $2)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        // Expired entries can no longer match a valid token.
        sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < NOW()")
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn is_token_revoked(&self, jti: Uuid) -> StoreResult<bool> {
        let revoked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE jti = $1)",
        )
        .bind(jti)
        .fetch_one(&self.db)
        .await?;

        Ok(revoked)
    }
}

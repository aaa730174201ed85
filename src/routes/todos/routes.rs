use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use super::dto::{CreateTodo, TodoList, TodoMessage, UpdateTodo};
use crate::error::ApiError;
use crate::routes::middleware_auth::JwtUser;
use crate::state::AppState;

/// Ids that are not UUIDs cannot name a todo, so they get the same 404.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFoundOrUnauthorized)
}

/// List the caller's todos, newest first
pub async fn list(
    State(state): State<AppState>,
    JwtUser(user_id): JwtUser,
) -> Result<impl IntoResponse, ApiError> {
    let todos = state.todos.list(user_id).await?;
    Ok(Json(TodoList { todos }))
}

pub async fn create(
    State(state): State<AppState>,
    JwtUser(user_id): JwtUser,
    payload: Result<Json<CreateTodo>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;
    let new_todo = body.validate()?;

    let todo = state.todos.create(user_id, new_todo).await?;
    tracing::debug!(%user_id, todo_id = %todo.id, "created todo");

    Ok((
        StatusCode::CREATED,
        Json(TodoMessage { message: "Todo created successfully", todo }),
    ))
}

/// Partial update. Only fields present in the body change.
pub async fn update(
    State(state): State<AppState>,
    JwtUser(user_id): JwtUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTodo>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    let Json(body) = payload?;

    let changes = match body.validate() {
        Ok(changes) => changes,
        Err(invalid) => {
            // A todo the caller cannot see reports 404 even when the body is bad.
            return match state.todos.find(user_id, id).await? {
                Some(_) => Err(invalid),
                None => Err(ApiError::NotFoundOrUnauthorized),
            };
        }
    };

    let todo = state.todos.update(user_id, id, changes).await?;
    Ok(Json(TodoMessage { message: "Todo updated successfully", todo }))
}

pub async fn delete(
    State(state): State<AppState>,
    JwtUser(user_id): JwtUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id)?;
    state.todos.delete(user_id, id).await?;
    tracing::debug!(%user_id, todo_id = %id, "deleted todo");

    Ok(Json(serde_json::json!({ "message": "Todo deleted successfully" })))
}

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

mod auth;
mod health;
pub mod middleware_auth;
pub mod todos;

pub use auth::LoginResponse;
pub use health::health;

use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    let todo_router = Router::new()
        .route("/", get(todos::routes::list).post(todos::routes::create))
        .route(
            "/{id}",
            put(todos::routes::update).delete(todos::routes::delete),
        );

    let protected = Router::new()
        .route("/user", get(auth::me))
        .route("/logout", post(auth::logout))
        .nest("/todos", todo_router)
        // Only matched routes need a token; unknown paths still fall through to 404.
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_auth::require_auth,
        ));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> &'static str {
    "Todo API"
}

#[cfg(test)]
mod tests;

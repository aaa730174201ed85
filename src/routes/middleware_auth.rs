use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use crate::token::TokenIdentity;

/// The authenticated caller. Only available behind `require_auth`.
pub struct JwtUser(pub Uuid);

impl<S> FromRequestParts<S> for JwtUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TokenIdentity>()
            .map(|identity| JwtUser(identity.user_id))
            .ok_or(ApiError::Unauthenticated)
    }
}

/// The full token identity, for handlers that act on the session itself.
pub struct CurrentToken(pub TokenIdentity);

impl<S> FromRequestParts<S> for CurrentToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TokenIdentity>()
            .copied()
            .map(CurrentToken)
            .ok_or(ApiError::Unauthenticated)
    }
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req.headers().get("authorization").and_then(|v| v.to_str().ok());

    let token = match auth_header {
        Some(h) if h.starts_with("Bearer ") => &h[7..],
        _ => return Err(ApiError::Unauthenticated),
    };

    let identity = state.tokens.verify(token).ok_or(ApiError::Unauthenticated)?;

    if state.users.is_token_revoked(identity.jti).await? {
        tracing::debug!(jti = %identity.jti, "rejected logged-out token");
        return Err(ApiError::Unauthenticated);
    }

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

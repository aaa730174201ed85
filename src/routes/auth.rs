use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, FieldErrors};
use crate::model::{NewUser, UserProfile};
use crate::routes::middleware_auth::{CurrentToken, JwtUser};
use crate::state::AppState;

const PASSWORD_MIN_LEN: usize = 8;

#[derive(Deserialize)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub user: UserProfile,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

fn validate_registration(payload: &RegistrationRequest) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();

    if payload.name.trim().is_empty() {
        errors.entry("name".into()).or_default().push("The name field is required.".into());
    }
    let email = payload.email.trim();
    if email.is_empty() {
        errors.entry("email".into()).or_default().push("The email field is required.".into());
    } else if !email.contains('@') {
        errors
            .entry("email".into())
            .or_default()
            .push("The email field must be a valid email address.".into());
    }
    if payload.password.chars().count() < PASSWORD_MIN_LEN {
        errors.entry("password".into()).or_default().push(format!(
            "The password field must be at least {PASSWORD_MIN_LEN} characters."
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    validate_registration(&payload)?;

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("password hash error: {e}")))?
        .to_string();

    let user = state
        .users
        .create_user(NewUser {
            name: payload.name.trim().to_string(),
            email: payload.email.trim().to_string(),
            password_hash,
        })
        .await?;

    tracing::info!(user_id = %user.id, "registered user");
    Ok((StatusCode::CREATED, Json(UserResponse { user: (&user).into() })))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;

    let user = state
        .users
        .find_user_by_email(payload.email.trim())
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| ApiError::Internal(format!("stored hash unreadable: {e}")))?;
    let verify = Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_ok();

    if !verify {
        return Err(ApiError::InvalidCredentials);
    }

    let token = state
        .tokens
        .issue(user.id)
        .map_err(|e| ApiError::Internal(format!("jwt encode error: {e}")))?;

    Ok(Json(LoginResponse { token, user: (&user).into() }))
}

pub async fn logout(
    State(state): State<AppState>,
    CurrentToken(identity): CurrentToken,
) -> Result<impl IntoResponse, ApiError> {
    state.users.revoke_token(identity.jti, identity.expires_at).await?;
    tracing::info!(user_id = %identity.user_id, "logged out");

    Ok(Json(serde_json::json!({ "message": "Logged out" })))
}

pub async fn me(
    State(state): State<AppState>,
    JwtUser(user_id): JwtUser,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.find_user(user_id).await?.ok_or(ApiError::Unauthenticated)?;
    Ok(Json(UserResponse { user: (&user).into() }))
}

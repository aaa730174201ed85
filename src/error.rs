// HTTP API error types
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::collections::BTreeMap;

use crate::store::StoreError;

pub const NOT_FOUND_MESSAGE: &str = "Todo not found or unauthorized";

/// Field name -> messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug)]
pub enum ApiError {
    // 400
    BadRequest(String),
    // 401
    Unauthenticated,
    InvalidCredentials,
    // 404, same body whether the todo is missing or belongs to someone else
    NotFoundOrUnauthorized,
    // 415
    UnsupportedMediaType(String),
    // 422
    Validation(FieldErrors),
    // 500, detail is logged and never sent
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::NotFoundOrUnauthorized => StatusCode::NOT_FOUND,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) | ApiError::UnsupportedMediaType(msg) => msg.clone(),
            ApiError::Unauthenticated => "Unauthenticated.".to_string(),
            ApiError::InvalidCredentials => "Invalid credentials".to_string(),
            ApiError::NotFoundOrUnauthorized => NOT_FOUND_MESSAGE.to_string(),
            ApiError::Validation(errors) => validation_summary(errors),
            ApiError::Internal(_) => "Server Error".to_string(),
        }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        ApiError::Validation(errors)
    }
}

/// "The title field is required. (and 1 more error)"
fn validation_summary(errors: &FieldErrors) -> String {
    let mut messages = errors.values().flatten();
    let Some(first) = messages.next() else {
        return "The given data was invalid.".to_string();
    };
    match messages.count() {
        0 => first.clone(),
        1 => format!("{first} (and 1 more error)"),
        n => format!("{first} (and {n} more errors)"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(%detail, "request failed");
        }

        let status = self.status_code();
        let body = match &self {
            ApiError::Validation(errors) => json!({
                "message": self.message(),
                "errors": errors,
            }),
            _ => json!({ "message": self.message() }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFoundOrUnauthorized,
            StoreError::EmailTaken => {
                ApiError::validation("email", "The email has already been taken.")
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(e) => ApiError::UnsupportedMediaType(e.body_text()),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

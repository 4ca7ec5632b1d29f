use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::activation::ActivationError;
use crate::mailer::MailError;

#[derive(Debug)]
pub enum AppError {
    Sqlx(sqlx::Error),
    PasswordHash(argon2::password_hash::Error),
    Jwt(jsonwebtoken::errors::Error),
    Mail(MailError),
    Activation(ActivationError),
    Validation(String),
    LoginFail,
    Unauthorized,
    Internal(&'static str),
}

impl From<sqlx::Error> for AppError {
    fn from(inner: sqlx::Error) -> Self {
        AppError::Sqlx(inner)
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(inner: argon2::password_hash::Error) -> Self {
        AppError::PasswordHash(inner)
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(inner: jsonwebtoken::errors::Error) -> Self {
        AppError::Jwt(inner)
    }
}

impl From<MailError> for AppError {
    fn from(inner: MailError) -> Self {
        AppError::Mail(inner)
    }
}

impl From<ActivationError> for AppError {
    fn from(inner: ActivationError) -> Self {
        AppError::Activation(inner)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Sqlx(e) => {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_unique_violation() {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({"error": "Username already exists"})),
                        )
                            .into_response();
                    }
                }
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::PasswordHash(e) => {
                tracing::error!("Password hashing error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Password hashing error".to_string(),
                )
            }
            AppError::Jwt(e) => {
                tracing::error!("JWT error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Token error".to_string())
            }
            AppError::Mail(e) => {
                tracing::error!("Mail delivery error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Mail delivery error".to_string(),
                )
            }
            // Every activation failure looks the same to the caller.
            AppError::Activation(reason) => {
                tracing::info!(?reason, "activation rejected");
                return StatusCode::BAD_REQUEST.into_response();
            }
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::LoginFail => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password".to_string(),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
            ),
            AppError::Internal(what) => {
                tracing::error!("Internal error: {}", what);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

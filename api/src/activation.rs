//! Signed, time-limited activation tokens.
//!
//! A token is an HS256 JWT carrying the user id and the issue time. Nothing is
//! stored server side: verification re-checks the signature and the age, and
//! the `is_active` flag on the user is the only guard against replay.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::user::User;

const AUDIENCE: &str = "activation";

#[derive(Debug, Serialize, Deserialize)]
struct ActivationClaims {
    uid: i64,
    iat: i64,
    aud: String,
}

/// Outcome of checking a token, before any user lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Valid(i64),
    Expired,
    Invalid,
}

/// Why an activation request was refused. Callers only ever see a bare 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationError {
    TokenExpired,
    TokenInvalid,
    UserNotFound,
    AlreadyActive,
}

#[derive(Clone)]
pub struct ActivationSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    max_age: Duration,
}

impl ActivationSigner {
    pub fn new(secret: &[u8], max_age: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            max_age,
        }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn issue(&self, user_id: i64) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(
        &self,
        user_id: i64,
        issued_at: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = ActivationClaims {
            uid: user_id,
            iat: issued_at.timestamp(),
            aud: AUDIENCE.to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
    }

    pub fn verify(&self, token: &str) -> TokenStatus {
        self.verify_at(token, Utc::now())
    }

    /// Signature first, then age: a forged token is `Invalid` even when old.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> TokenStatus {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.set_audience(&[AUDIENCE]);

        let claims = match decode::<ActivationClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!("activation token rejected: {}", e);
                return TokenStatus::Invalid;
            }
        };

        let age = now.timestamp() - claims.iat;
        let max_age = i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX);
        if age > max_age {
            return TokenStatus::Expired;
        }
        TokenStatus::Valid(claims.uid)
    }
}

/// Consume a token: flip the referenced user from inactive to active.
pub async fn activate(
    db: &SqlitePool,
    signer: &ActivationSigner,
    token: &str,
) -> Result<User, AppError> {
    let user_id = match signer.verify(token) {
        TokenStatus::Valid(user_id) => user_id,
        TokenStatus::Expired => return Err(ActivationError::TokenExpired.into()),
        TokenStatus::Invalid => return Err(ActivationError::TokenInvalid.into()),
    };

    let mut user = User::find_by_id(db, user_id)
        .await?
        .ok_or(ActivationError::UserNotFound)?;
    if user.is_active {
        return Err(ActivationError::AlreadyActive.into());
    }

    // Conditional so that two concurrent requests cannot both succeed.
    let result = sqlx::query("UPDATE users SET is_active = 1 WHERE id = ? AND is_active = 0")
        .bind(user.id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ActivationError::AlreadyActive.into());
    }

    user.is_active = true;
    tracing::info!(user_id = user.id, "account activated");
    Ok(user)
}

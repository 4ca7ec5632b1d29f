//! Login sessions and the per-request identity they carry.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{error::AppError, models::user::User, AppState};

const AUDIENCE: &str = "session";

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String, // user id
    pub jti: String,
    pub exp: usize,
    pub aud: String,
}

#[derive(Clone)]
pub struct SessionKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: chrono::Duration,
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl: chrono::Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn issue(&self, user_id: i64) -> Result<String, AppError> {
        let expiration = chrono::Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or(AppError::Internal("valid timestamp"))?
            .timestamp();

        let claims = SessionClaims {
            sub: user_id.to_string(),
            jti: new_jti(),
            exp: expiration as usize,
            aud: AUDIENCE.to_string(),
        };
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    pub fn decode(&self, token: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[AUDIENCE]);
        Ok(decode::<SessionClaims>(token, &self.decoding_key, &validation)?.claims)
    }
}

fn new_jti() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Refuse `jti` from now on. Rows for sessions that expired on their own are
/// dropped at the same time; the token check already rejects those.
pub async fn revoke(db: &SqlitePool, jti: &str, expires_at: i64) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO revoked_sessions (jti, expires_at) VALUES (?, ?)")
        .bind(jti)
        .bind(expires_at)
        .execute(db)
        .await?;

    let purged = sqlx::query("DELETE FROM revoked_sessions WHERE expires_at < ?")
        .bind(chrono::Utc::now().timestamp())
        .execute(db)
        .await?
        .rows_affected();
    if purged > 0 {
        tracing::debug!(purged, "expired session revocations removed");
    }
    Ok(())
}

async fn is_revoked(db: &SqlitePool, jti: &str) -> Result<bool, sqlx::Error> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM revoked_sessions WHERE jti = ?")
            .bind(jti)
            .fetch_one(db)
            .await?;
    Ok(count > 0)
}

/// The logged-in user behind a request's bearer token.
#[derive(Debug)]
pub struct AuthUser {
    pub user: User,
    pub jti: String,
    pub expires_at: i64,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        let claims = state.sessions.decode(token).map_err(|e| {
            tracing::debug!("session token rejected: {}", e);
            AppError::Unauthorized
        })?;
        if is_revoked(&state.db, &claims.jti).await? {
            return Err(AppError::Unauthorized);
        }

        let user_id: i64 = claims.sub.parse().map_err(|_| AppError::Unauthorized)?;
        let user = User::find_by_id(&state.db, user_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthUser {
            user,
            jti: claims.jti,
            expires_at: claims.exp as i64,
        })
    }
}

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    activation,
    error::AppError,
    mailer::{ActivationEmail, OutgoingMail},
    models::user::{
        ActivatedResponse, AuthResponse, CreateUser, LoginPayload, LoginQuery, MessageResponse,
        RegisterResponse, User,
    },
    session::{self, AuthUser},
    AppState,
};

/// Create an inactive account and mail its activation link.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CreateUser>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    payload.validate().map_err(AppError::Validation)?;

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(payload.password.as_bytes(), &salt)?
        .to_string();

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, email, password_hash, is_active) VALUES (?, ?, ?, 0) RETURNING *",
    )
    .bind(&payload.username)
    .bind(payload.email.trim())
    .bind(&password_hash)
    .fetch_one(&state.db)
    .await?;

    let token = state.activation.issue(user.id)?;
    let content = ActivationEmail::new(
        &user.username,
        &state.config.site.activation_url(&token),
        state.activation.max_age(),
    );
    state
        .mailer
        .send(&OutgoingMail {
            from: state.config.mail.from_address.clone(),
            to: user.email.clone(),
            subject: content.subject,
            body: content.body,
        })
        .await?;

    tracing::info!(user_id = user.id, "registration pending activation");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "Registration received. Check your email to activate the account."
                .to_string(),
            next: "/api/auth/register/done".to_string(),
        }),
    ))
}

pub async fn register_done() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "An activation link has been sent to your email address.".to_string(),
    })
}

pub async fn activate(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ActivatedResponse>, AppError> {
    let user = activation::activate(&state.db, &state.activation, &token).await?;
    Ok(Json(ActivatedResponse {
        message: "Registration complete".to_string(),
        username: user.username,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = User::find_by_username(&state.db, &payload.username)
        .await?
        .ok_or(AppError::LoginFail)?;

    let parsed_hash = PasswordHash::new(&user.password_hash)?;
    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::LoginFail)?;

    // Accounts that never finished activation cannot sign in.
    if !user.is_active {
        return Err(AppError::LoginFail);
    }

    let token = state.sessions.issue(user.id)?;
    tracing::info!(user_id = user.id, "login");

    Ok(Json(AuthResponse {
        token,
        redirect_to: next_redirect_url(query.next, &state.config.login_redirect_url),
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    session::revoke(&state.db, &auth.jti, auth.expires_at).await?;
    tracing::info!(user_id = auth.user.id, "logout");
    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

fn next_redirect_url(next: Option<String>, default: &str) -> String {
    match next {
        Some(url) if !url.is_empty() && url != "/" => url,
        _ => default.to_string(),
    }
}

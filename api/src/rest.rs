use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    handlers::{auth, projects},
    AppState,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/register/done", get(auth::register_done))
        .route("/api/auth/activate/:token", get(auth::activate))
        .route("/api/projects", get(projects::index))
        .route(
            "/api/projects/search",
            get(projects::search_page).post(projects::search),
        )
        .with_state(state)
}

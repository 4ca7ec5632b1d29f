use axum::{
    extract::{FromRequest, Query, Request, State},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde::Serialize;

use crate::{
    error::AppError,
    models::project::{PageQuery, Project, SearchForm},
    pagination::Page,
    search::{self, KeywordQuery},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub keyword: String,
    pub page: Page<Project>,
}

pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Project>>, AppError> {
    let page = search::find_page(&state.db, &KeywordQuery::all(), query.page.as_deref()).await?;
    Ok(Json(page))
}

/// Without a submission there is nothing to filter by.
pub async fn search_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    run_search(&state, None, query.page.as_deref()).await
}

pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
    request: Request,
) -> Result<Json<SearchResponse>, AppError> {
    let form = read_search_form(request, &state).await;
    run_search(&state, form.as_ref(), query.page.as_deref()).await
}

async fn run_search(
    state: &AppState,
    form: Option<&SearchForm>,
    raw_page: Option<&str>,
) -> Result<Json<SearchResponse>, AppError> {
    let query = KeywordQuery::from_form(form);
    let page = search::find_page(&state.db, &query, raw_page).await?;
    Ok(Json(SearchResponse {
        keyword: form.map(|f| f.keyword.clone()).unwrap_or_default(),
        page,
    }))
}

/// Accepts both a JSON body and a urlencoded form. A body that cannot be read
/// counts as an invalid form.
async fn read_search_form(request: Request, state: &AppState) -> Option<SearchForm> {
    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    let parsed = if is_json {
        Json::<SearchForm>::from_request(request, state)
            .await
            .map(|Json(form)| form)
            .map_err(|e| e.body_text())
    } else {
        Form::<SearchForm>::from_request(request, state)
            .await
            .map(|Form(form)| form)
            .map_err(|e| e.body_text())
    };

    match parsed {
        Ok(form) => Some(form),
        Err(reason) => {
            tracing::debug!("search form rejected: {}", reason);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::mailer::MemoryMailer;
    use crate::testing;
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn names(body: &Value) -> Vec<String> {
        body["page"]["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap().to_string())
            .collect()
    }

    async fn seeded_app() -> axum::Router {
        let state = testing::state(Arc::new(MemoryMailer::default())).await;
        testing::insert_project(&state.db, "alpha project", "first").await;
        testing::insert_project(&state.db, "beta project", "second").await;
        testing::insert_project(&state.db, "alpha beta combo", "third").await;
        testing::app(state)
    }

    #[tokio::test]
    async fn test_search_requires_every_keyword() {
        let app = seeded_app().await;
        let (status, body) = testing::send(
            &app,
            testing::json_request("POST", "/api/projects/search", json!({"keyword": "alpha beta"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body = body.unwrap();
        assert_eq!(names(&body), ["alpha beta combo"]);
        assert_eq!(body["keyword"], "alpha beta");
    }

    #[tokio::test]
    async fn test_search_accepts_urlencoded_form() {
        let app = seeded_app().await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/projects/search")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("keyword=second"))
            .unwrap();
        let (status, body) = testing::send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&body.unwrap()), ["beta project"]);
    }

    #[tokio::test]
    async fn test_blank_or_broken_submission_returns_everything() {
        let app = seeded_app().await;

        let (_, body) = testing::send(
            &app,
            testing::json_request("POST", "/api/projects/search", json!({"keyword": "   "})),
        )
        .await;
        assert_eq!(names(&body.unwrap()).len(), 3);

        let request = Request::builder()
            .method("POST")
            .uri("/api/projects/search")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = testing::send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&body.unwrap()).len(), 3);
    }

    #[tokio::test]
    async fn test_get_search_is_unfiltered() {
        let app = seeded_app().await;
        let (status, body) = testing::send(&app, testing::get("/api/projects/search")).await;
        assert_eq!(status, StatusCode::OK);
        let body = body.unwrap();
        assert_eq!(names(&body).len(), 3);
        assert_eq!(body["keyword"], "");
    }

    #[tokio::test]
    async fn test_index_paginates_by_ten() {
        let state = testing::state(Arc::new(MemoryMailer::default())).await;
        for i in 0..25 {
            testing::insert_project(&state.db, &format!("project {}", i), "").await;
        }
        let app = testing::app(state);

        let (status, body) = testing::send(&app, testing::get("/api/projects?page=abc")).await;
        assert_eq!(status, StatusCode::OK);
        let body = body.unwrap();
        assert_eq!(body["number"], 1);
        assert_eq!(body["num_pages"], 3);
        assert_eq!(body["items"].as_array().unwrap().len(), 10);

        let (_, body) = testing::send(&app, testing::get("/api/projects?page=999")).await;
        let body = body.unwrap();
        assert_eq!(body["number"], 3);
        assert_eq!(body["items"].as_array().unwrap().len(), 5);
        assert_eq!(body["has_next"], false);
    }

    #[tokio::test]
    async fn test_search_keeps_page_parameter() {
        let state = testing::state(Arc::new(MemoryMailer::default())).await;
        for i in 0..12 {
            testing::insert_project(&state.db, &format!("match {}", i), "").await;
        }
        testing::insert_project(&state.db, "other", "").await;
        let app = testing::app(state);

        let (_, body) = testing::send(
            &app,
            testing::json_request("POST", "/api/projects/search?page=2", json!({"keyword": "match"})),
        )
        .await;
        let body = body.unwrap();
        assert_eq!(body["page"]["count"], 12);
        assert_eq!(body["page"]["number"], 2);
        assert_eq!(names(&body), ["match 10", "match 11"]);
    }
}

//! HTTP routes: HTML forms for the browser plus a small JSON API.

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::model::{ReviewAction, Topic};
use super::service;
use super::views;
use crate::clock::Clock;
use crate::error::TopicError;
use crate::store::TopicStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TopicStore>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(store: Arc<dyn TopicStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

/// Build the Axum router with every page and API route.
pub fn topic_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/enter-topic", get(enter_topic_form).post(enter_topic))
        .route(
            "/enter-missing-topic",
            get(enter_missing_topic_form).post(enter_missing_topic),
        )
        .route("/review_topics", get(review_topics))
        .route("/review-topics", get(review_topics))
        .route("/review/{id}/{action}", post(review_topic))
        .route("/classes", get(classes))
        .route("/init-db", get(init_db))
        .route("/migrate-db", get(migrate_db))
        .route("/health", get(health))
        .route("/api/topics", get(api_list_topics))
        .route("/api/topics/due", get(api_due_topics))
        .route("/api/topics/{id}/review/{action}", post(api_review_topic))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

// ── Forms ───────────────────────────────────────────────────────────────

/// Body of `POST /enter-topic`.
#[derive(Debug, Deserialize)]
struct TopicForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
}

/// Body of `POST /enter-missing-topic`.
#[derive(Debug, Deserialize)]
struct MissingTopicForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    date_added: String,
}

/// Path segments of the review routes. Malformed IDs can't name a topic.
fn parse_review_path(id: &str, action: &str) -> Result<(Uuid, ReviewAction), TopicError> {
    let id = Uuid::parse_str(id).map_err(|_| TopicError::NotFound { id: id.to_string() })?;
    Ok((id, action.parse()?))
}

// ── Pages ───────────────────────────────────────────────────────────────

async fn dashboard(State(state): State<AppState>) -> impl IntoResponse {
    let today = state.clock.today();
    match state.store.list_all().await {
        Ok(topics) => {
            let due = topics.iter().filter(|t| t.is_due(today)).count();
            Html(views::dashboard(Some(topics.len()), Some(due)))
        }
        Err(e) => {
            warn!(error = %e, "Dashboard counts unavailable");
            Html(views::dashboard(None, None))
        }
    }
}

async fn enter_topic_form() -> impl IntoResponse {
    Html(views::enter_topic_form())
}

async fn enter_topic(
    State(state): State<AppState>,
    Form(form): Form<TopicForm>,
) -> Result<Redirect, TopicError> {
    service::add_topic(
        state.store.as_ref(),
        &form.title,
        form.description.as_deref(),
        state.clock.today(),
    )
    .await?;
    Ok(Redirect::to("/"))
}

async fn enter_missing_topic_form() -> impl IntoResponse {
    Html(views::enter_missing_topic_form())
}

async fn enter_missing_topic(
    State(state): State<AppState>,
    Form(form): Form<MissingTopicForm>,
) -> Result<Redirect, TopicError> {
    service::add_missing_topic(
        state.store.as_ref(),
        &form.title,
        form.description.as_deref(),
        &form.date_added,
        state.clock.today(),
    )
    .await?;
    Ok(Redirect::to("/"))
}

async fn review_topics(State(state): State<AppState>) -> impl IntoResponse {
    let due = service::due_list(state.store.as_ref(), state.clock.today()).await;
    Html(views::review_topics(&due))
}

async fn review_topic(
    State(state): State<AppState>,
    Path((id, action)): Path<(String, String)>,
) -> Result<Redirect, TopicError> {
    let (id, action) = parse_review_path(&id, &action)?;
    service::review(state.store.as_ref(), id, action, state.clock.today()).await?;
    Ok(Redirect::to("/review_topics"))
}

async fn classes() -> impl IntoResponse {
    Html(views::classes())
}

async fn init_db(State(state): State<AppState>) -> Result<&'static str, TopicError> {
    service::init_database(state.store.as_ref()).await?;
    Ok("Database initialized!")
}

async fn migrate_db(State(state): State<AppState>) -> Result<String, TopicError> {
    let count = service::migrate_database(state.store.as_ref(), state.clock.today()).await?;
    debug!(count, "Migration requested over HTTP");
    Ok(format!("Database migrated! Backfilled {count} topics."))
}

// ── JSON API ────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "study-tracker"
    }))
}

async fn api_list_topics(State(state): State<AppState>) -> Result<Json<Vec<Topic>>, TopicError> {
    let topics = state.store.list_all().await?;
    Ok(Json(topics))
}

async fn api_due_topics(State(state): State<AppState>) -> impl IntoResponse {
    let due = service::due_list(state.store.as_ref(), state.clock.today()).await;
    Json(serde_json::json!({
        "topics": due.topics(),
        "advisory": due.advisory(),
    }))
}

async fn api_review_topic(
    State(state): State<AppState>,
    Path((id, action)): Path<(String, String)>,
) -> Result<Json<Topic>, TopicError> {
    let (id, action) = parse_review_path(&id, &action)?;
    let topic = service::review(state.store.as_ref(), id, action, state.clock.today()).await?;
    Ok(Json(topic))
}

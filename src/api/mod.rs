mod admin;
mod survey;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::SessionKeys;
use crate::db::Database;
use crate::llm::TextGenerator;
use crate::review::ReviewGenerator;
use crate::store::{QuestionCatalog, QuestionPool, ResponseArchive, SettingsStore};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<dyn SettingsStore>,
    pub questions: Arc<dyn QuestionCatalog>,
    pub pool: Arc<dyn QuestionPool>,
    pub archive: Arc<dyn ResponseArchive>,
    pub generator: ReviewGenerator,
    pub sessions: Arc<SessionKeys>,
}

impl AppState {
    /// Wires every store to the same database.
    pub fn new(db: Arc<Database>, backend: Arc<dyn TextGenerator>, sessions: SessionKeys) -> Self {
        Self {
            settings: db.clone(),
            questions: db.clone(),
            pool: db.clone(),
            archive: db,
            generator: ReviewGenerator::new(backend),
            sessions: Arc::new(sessions),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Survey
        .route("/api/questions", get(survey::get_questions))
        .route("/api/settings", get(survey::get_settings))
        .route("/api/survey/layout", get(survey::get_layout))
        .route("/api/survey/validate", post(survey::validate_step))
        .route("/api/submit", post(survey::submit))
        // Admin
        .route("/api/admin/auth", post(admin::login))
        .route(
            "/api/admin/settings",
            get(admin::get_settings).post(admin::update_settings),
        )
        .route(
            "/api/admin/questions",
            get(admin::get_questions).post(admin::replace_questions),
        )
        .route(
            "/api/admin/question-pool",
            get(admin::get_question_pool).post(admin::replace_question_pool),
        )
        .route("/api/admin/responses", get(admin::list_responses))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

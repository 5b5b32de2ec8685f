use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::AppState;
use crate::auth::{password_matches, AdminSession};
use crate::db::models::{PoolQuestion, Question, ReviewRecord, SettingsUpdate, ShopSettings};
use crate::error::{ApiResult, AppError};

const DEFAULT_RESPONSE_LIMIT: usize = 50;
const MAX_RESPONSE_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceQuestions<T> {
    pub questions: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsesQuery {
    pub limit: Option<usize>,
}

fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let settings = state.settings.read_settings()?;
    if !password_matches(&settings, &request.password) {
        warn!("Admin login rejected");
        return Err(AppError::Unauthorized);
    }
    let issued = state.sessions.issue()?;
    info!(expires_at = %issued.expires_at, "Admin session issued");
    Ok(Json(LoginResponse {
        success: true,
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}

pub async fn get_settings(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<ShopSettings>> {
    Ok(Json(state.settings.read_settings()?))
}

pub async fn update_settings(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> ApiResult<Json<Value>> {
    if update.clears_admin_password() {
        warn!("Rejected blank admin password");
        return Err(AppError::Validation("admin_password must not be empty".into()));
    }
    let keys: Vec<&str> = update.entries().iter().map(|(k, _)| k.as_str()).collect();
    info!(?keys, "Saving settings");
    state.settings.write_settings(&update)?;
    Ok(success())
}

pub async fn get_questions(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Question>>> {
    Ok(Json(state.questions.read_questions()?))
}

pub async fn replace_questions(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(body): Json<ReplaceQuestions<Question>>,
) -> ApiResult<Json<Value>> {
    info!(count = body.questions.len(), "Replacing question catalog");
    state.questions.replace_questions(&body.questions)?;
    Ok(success())
}

pub async fn get_question_pool(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PoolQuestion>>> {
    Ok(Json(state.pool.read_question_pool()?))
}

pub async fn replace_question_pool(
    _session: AdminSession,
    State(state): State<AppState>,
    Json(body): Json<ReplaceQuestions<PoolQuestion>>,
) -> ApiResult<Json<Value>> {
    info!(count = body.questions.len(), "Replacing question pool");
    state.pool.replace_question_pool(&body.questions)?;
    Ok(success())
}

pub async fn list_responses(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(query): Query<ResponsesQuery>,
) -> ApiResult<Json<Vec<ReviewRecord>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RESPONSE_LIMIT)
        .min(MAX_RESPONSE_LIMIT);
    Ok(Json(state.archive.list_responses(limit)?))
}

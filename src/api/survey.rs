use axum::{extract::State, Json};
use serde::Serialize;

use super::AppState;
use crate::db::models::{AnswerSet, PublicSettings, Question};
use crate::error::ApiResult;
use crate::submit::submit_answers;
use crate::survey::{StepCheck, StepCheckRequest, SurveyLayout};

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub review: String,
}

pub async fn get_questions(State(state): State<AppState>) -> ApiResult<Json<Vec<Question>>> {
    Ok(Json(state.questions.read_questions()?))
}

pub async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<PublicSettings>> {
    Ok(Json(state.settings.read_settings()?.public()))
}

pub async fn get_layout(State(state): State<AppState>) -> ApiResult<Json<SurveyLayout>> {
    let questions = state.questions.read_questions()?;
    Ok(Json(SurveyLayout::from_questions(&questions)))
}

pub async fn validate_step(
    State(state): State<AppState>,
    Json(request): Json<StepCheckRequest>,
) -> ApiResult<Json<StepCheck>> {
    let questions = state.questions.read_questions()?;
    Ok(Json(StepCheck::run(&questions, &request)))
}

pub async fn submit(
    State(state): State<AppState>,
    Json(answers): Json<AnswerSet>,
) -> ApiResult<Json<SubmitResponse>> {
    let review = submit_answers(&state, answers).await?;
    Ok(Json(SubmitResponse {
        success: true,
        review,
    }))
}

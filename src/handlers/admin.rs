// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    engine::profiles::SkillKind,
    error::AppError,
    models::{
        exam::ExamKind,
        question::{CreateQuestionRequest, Question},
    },
    state::AppState,
};

/// Default per-question time limits by kind, used when the author does
/// not set one.
fn default_time_limit(question: &Question) -> i64 {
    match question.content.sub_questions() {
        Some(_) => 900,
        None => 120,
    }
}

fn build_question(
    state: &AppState,
    payload: CreateQuestionRequest,
    id: String,
) -> Result<Question, AppError> {
    let profile = state.registry.service(payload.exam).profile;
    let Some(skill) = profile.skill(&payload.skill) else {
        return Err(AppError::BadRequest(format!(
            "Skill '{}' is not part of the {} exam",
            payload.skill, profile.name
        )));
    };

    // Single-part objective kinds must carry their answer key; grading
    // would otherwise hit a configuration error at submit time.
    if skill.kind == SkillKind::Objective
        && payload.content.sub_questions().is_none()
        && payload.correct_answer.is_none()
    {
        return Err(AppError::BadRequest(
            "Objective questions require a correct_answer".to_string(),
        ));
    }

    // Multi-part sets are worth one point per sub-question so the raw
    // score stays a correct count; oracle-graded kinds are worth the
    // skill's full score.
    let points = match payload.content.sub_questions() {
        Some(subs) => subs.len() as f64,
        None if skill.kind == SkillKind::AiDelegated => skill.max_score,
        None => payload.points.unwrap_or(1.0),
    };

    let mut question = Question {
        id,
        exam: payload.exam,
        skill: payload.skill,
        difficulty: payload.difficulty,
        content: payload.content,
        correct_answer: payload.correct_answer,
        points,
        time_limit_secs: payload.time_limit_secs.unwrap_or(0),
        created_at: Utc::now(),
    };
    if question.time_limit_secs <= 0 {
        question.time_limit_secs = default_time_limit(&question);
    }
    Ok(question)
}

/// Creates a new question.
/// Admin only.
pub async fn create_question(
    State(state): State<AppState>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let question = build_question(&state, payload, Uuid::new_v4().to_string())?;

    state.store.insert_question(&question).await?;
    tracing::info!(
        "Question {} created for {}/{}",
        question.id,
        question.exam,
        question.skill
    );

    Ok((StatusCode::CREATED, Json(question)))
}

/// Replaces an existing question's content and metadata.
/// Admin only.
pub async fn update_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let question = build_question(&state, payload, id)?;

    let updated = state.store.update_question(&question).await?;
    if !updated {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(Json(question))
}

/// Deletes a question.
/// Admin only.
pub async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = state.store.delete_question(&id).await?;
    if !deleted {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(Json(json!({ "message": "Question deleted" })))
}

#[derive(Debug, Deserialize)]
pub struct ListQuestionsParams {
    pub exam: ExamKind,
    pub skill: Option<String>,
}

/// Lists questions for an exam, optionally narrowed to one skill.
/// Admin only; includes answer keys.
pub async fn list_questions(
    State(state): State<AppState>,
    Query(params): Query<ListQuestionsParams>,
) -> Result<impl IntoResponse, AppError> {
    let questions = state
        .store
        .list_questions(params.exam, params.skill.as_deref())
        .await?;

    Ok(Json(questions))
}

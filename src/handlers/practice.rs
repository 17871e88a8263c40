// src/handlers/practice.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    engine::converter,
    error::AppError,
    models::{
        attempt::{AnswerPayload, Attempt, SubmitAnswerRequest, SubmitAnswerResponse},
        exam::ExamKind,
        progress::ProgressReport,
        question::{Difficulty, PublicQuestion},
    },
    state::AppState,
    utils::jwt::Claims,
};

#[derive(Debug, Deserialize)]
pub struct NextQuestionParams {
    pub exam: ExamKind,
    pub skill: String,
    pub difficulty: Option<Difficulty>,
}

/// Serves the next question for the requested exam and skill, adapting
/// difficulty from the user's recent accuracy unless one is pinned in
/// the query. Correct answers are stripped from the response.
pub async fn next_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<NextQuestionParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();
    let service = state.registry.service(params.exam);

    if service.profile.skill(&params.skill).is_none() {
        return Err(AppError::NotFound(format!(
            "Skill '{}' is not part of the {} exam",
            params.skill, service.profile.name
        )));
    }

    match service
        .selector
        .next(user_id, &params.skill, params.difficulty)
        .await?
    {
        Some(question) => Ok(Json(PublicQuestion::from(&question))),
        None => Err(AppError::NotFound(
            "No questions available for this skill yet".to_string(),
        )),
    }
}

/// Grades a submitted answer, records the attempt, and folds it into the
/// user's progress. Progress failures never fail the submission.
pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id();

    let question = state
        .store
        .get_question(&payload.question_id)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    let service = state.registry.service(question.exam);
    let answer = AnswerPayload::from(&payload);
    let evaluation = service.evaluator.evaluate(&question, &answer).await?;

    let attempt = Attempt {
        id: Uuid::new_v4().to_string(),
        user_id,
        question_id: question.id.clone(),
        exam: question.exam,
        skill: question.skill.clone(),
        answer: payload.answer.clone(),
        audio_ref: payload.audio_ref.clone(),
        time_spent_secs: payload.time_spent_secs,
        is_correct: evaluation.is_correct,
        score: evaluation.score,
        raw_score: evaluation.raw_score,
        feedback: evaluation.feedback.clone(),
        suggestions: evaluation.suggestions.clone(),
        criteria_scores: evaluation.criteria_scores.clone(),
        created_at: Utc::now(),
    };
    state.store.insert_attempt(&attempt).await?;

    service
        .aggregator
        .update(user_id, &question, &evaluation)
        .await;

    Ok(Json(SubmitAnswerResponse {
        attempt_id: attempt.id,
        question_id: question.id,
        evaluation,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ProgressParams {
    pub exam: ExamKind,
    pub skill: Option<String>,
}

/// Per-skill progress for the current user, with the exam-level overall
/// score when at least one skill has data.
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<ProgressParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id();
    let service = state.registry.service(params.exam);

    let skills = state
        .store
        .progress_for(user_id, params.exam, params.skill.as_deref())
        .await?;

    let overall_score = converter::overall_score(service.profile, &skills);

    Ok(Json(ProgressReport {
        exam: params.exam,
        overall_score,
        skills,
    }))
}

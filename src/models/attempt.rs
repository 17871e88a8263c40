// src/models/attempt.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::exam::ExamKind;

/// One graded submission. Attempts are append-only: created exactly once
/// per submission, never edited afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: String,
    pub user_id: i64,
    pub question_id: String,
    pub exam: ExamKind,
    pub skill: String,
    pub answer: String,
    pub audio_ref: Option<String>,
    pub time_spent_secs: i64,
    /// `None` for kinds that are not graded by correctness (essay/speaking).
    pub is_correct: Option<bool>,
    /// Score on the exam's reporting scale.
    pub score: f64,
    pub raw_score: f64,
    pub feedback: String,
    pub suggestions: String,
    pub criteria_scores: Option<BTreeMap<String, f64>>,
    pub created_at: DateTime<Utc>,
}

/// The result of evaluating an answer, embedded in the submit response
/// and folded into Progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub is_correct: Option<bool>,
    pub score: f64,
    pub raw_score: f64,
    pub feedback: String,
    pub suggestions: String,
    pub criteria_scores: Option<BTreeMap<String, f64>>,
}

/// DTO for submitting an answer.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(length(min = 1))]
    pub question_id: String,
    #[serde(default)]
    pub answer: String,
    /// Answers to the sub-questions of a multi-part question, in order.
    pub sub_answers: Option<Vec<String>>,
    pub audio_ref: Option<String>,
    #[serde(default)]
    pub time_spent_secs: i64,
}

/// What the evaluator actually consumes.
#[derive(Debug, Clone)]
pub struct AnswerPayload {
    pub answer: String,
    pub sub_answers: Option<Vec<String>>,
    pub audio_ref: Option<String>,
}

impl From<&SubmitAnswerRequest> for AnswerPayload {
    fn from(req: &SubmitAnswerRequest) -> Self {
        AnswerPayload {
            answer: req.answer.clone(),
            sub_answers: req.sub_answers.clone(),
            audio_ref: req.audio_ref.clone(),
        }
    }
}

/// DTO returned from the submit endpoint.
#[derive(Debug, Serialize)]
pub struct SubmitAnswerResponse {
    pub attempt_id: String,
    pub question_id: String,
    pub evaluation: Evaluation,
}

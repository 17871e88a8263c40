// src/models/progress.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::exam::ExamKind;

/// Running per-(user, exam, skill) counters, upserted after every attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub user_id: i64,
    pub exam: ExamKind,
    pub skill: String,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub total_points: f64,
    pub earned_points: f64,
    /// earned_points / total_points.
    pub average_score: f64,
    /// Best single-attempt score on the exam scale.
    pub best_score: f64,
    pub last_activity: DateTime<Utc>,
}

/// The increments one attempt contributes. Applied by the store as a
/// single atomic upsert so concurrent submissions cannot lose updates.
#[derive(Debug, Clone, Copy)]
pub struct ProgressDelta {
    pub correct: bool,
    pub earned: f64,
    pub possible: f64,
    pub score: f64,
}

/// DTO for the progress report endpoint.
#[derive(Debug, Serialize)]
pub struct ProgressReport {
    pub exam: ExamKind,
    /// Exam-level score computed from per-skill averages (band for IELTS,
    /// 0-120 total for TOEFL, weighted composite for YDS). `None` until
    /// at least one skill has data.
    pub overall_score: Option<f64>,
    pub skills: Vec<Progress>,
}

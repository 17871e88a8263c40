// src/store/postgres.rs

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, types::Json};

use crate::models::{
    attempt::Attempt,
    exam::ExamKind,
    progress::{Progress, ProgressDelta},
    question::{Question, QuestionContent},
    user::User,
};
use crate::store::{PracticeStore, QuestionFilter, StoreError};

/// Postgres-backed store. Uses the runtime query API throughout; the
/// schema lives in `migrations/`.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct QuestionRow {
    id: String,
    exam: String,
    skill: String,
    difficulty: String,
    content: Json<QuestionContent>,
    correct_answer: Option<String>,
    points: f64,
    time_limit_secs: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = StoreError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        Ok(Question {
            id: row.id,
            exam: row.exam.parse().map_err(StoreError::Database)?,
            skill: row.skill,
            difficulty: row.difficulty.parse().map_err(StoreError::Database)?,
            content: row.content.0,
            correct_answer: row.correct_answer,
            points: row.points,
            time_limit_secs: row.time_limit_secs,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AttemptRow {
    id: String,
    user_id: i64,
    question_id: String,
    exam: String,
    skill: String,
    answer: String,
    audio_ref: Option<String>,
    time_spent_secs: i64,
    is_correct: Option<bool>,
    score: f64,
    raw_score: f64,
    feedback: String,
    suggestions: String,
    criteria_scores: Option<Json<BTreeMap<String, f64>>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AttemptRow> for Attempt {
    type Error = StoreError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        Ok(Attempt {
            id: row.id,
            user_id: row.user_id,
            question_id: row.question_id,
            exam: row.exam.parse().map_err(StoreError::Database)?,
            skill: row.skill,
            answer: row.answer,
            audio_ref: row.audio_ref,
            time_spent_secs: row.time_spent_secs,
            is_correct: row.is_correct,
            score: row.score,
            raw_score: row.raw_score,
            feedback: row.feedback,
            suggestions: row.suggestions,
            criteria_scores: row.criteria_scores.map(|c| c.0),
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProgressRow {
    user_id: i64,
    exam: String,
    skill: String,
    total_questions: i64,
    correct_answers: i64,
    total_points: f64,
    earned_points: f64,
    average_score: f64,
    best_score: f64,
    last_activity: DateTime<Utc>,
}

impl TryFrom<ProgressRow> for Progress {
    type Error = StoreError;

    fn try_from(row: ProgressRow) -> Result<Self, Self::Error> {
        Ok(Progress {
            user_id: row.user_id,
            exam: row.exam.parse().map_err(StoreError::Database)?,
            skill: row.skill,
            total_questions: row.total_questions,
            correct_answers: row.correct_answers,
            total_points: row.total_points,
            earned_points: row.earned_points,
            average_score: row.average_score,
            best_score: row.best_score,
            last_activity: row.last_activity,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            password: row.password,
            role: row.role,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PracticeStore for PgStore {
    async fn insert_question(&self, question: &Question) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO questions
                (id, exam, skill, difficulty, content, correct_answer, points, time_limit_secs, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&question.id)
        .bind(question.exam.as_str())
        .bind(&question.skill)
        .bind(question.difficulty.as_str())
        .bind(Json(&question.content))
        .bind(&question.correct_answer)
        .bind(question.points)
        .bind(question.time_limit_secs)
        .bind(question.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_question(&self, question: &Question) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE questions
            SET skill = $2, difficulty = $3, content = $4, correct_answer = $5,
                points = $6, time_limit_secs = $7
            WHERE id = $1
            "#,
        )
        .bind(&question.id)
        .bind(&question.skill)
        .bind(question.difficulty.as_str())
        .bind(Json(&question.content))
        .bind(&question.correct_answer)
        .bind(question.points)
        .bind(question.time_limit_secs)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_question(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_question(&self, id: &str) -> Result<Option<Question>, StoreError> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, exam, skill, difficulty, content, correct_answer,
                   points, time_limit_secs, created_at
            FROM questions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Question::try_from).transpose()
    }

    async fn list_questions(
        &self,
        exam: ExamKind,
        skill: Option<&str>,
    ) -> Result<Vec<Question>, StoreError> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, exam, skill, difficulty, content, correct_answer,
                   points, time_limit_secs, created_at
            FROM questions
            WHERE exam = $1 AND ($2::text IS NULL OR skill = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(exam.as_str())
        .bind(skill)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Question::try_from).collect()
    }

    async fn find_question(
        &self,
        filter: &QuestionFilter<'_>,
    ) -> Result<Option<Question>, StoreError> {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, exam, skill, difficulty, content, correct_answer,
                   points, time_limit_secs, created_at
            FROM questions
            WHERE exam = $1
              AND skill = $2
              AND ($3::text IS NULL OR difficulty = $3)
              AND NOT (id = ANY($4))
            ORDER BY RANDOM()
            LIMIT 1
            "#,
        )
        .bind(filter.exam.as_str())
        .bind(filter.skill)
        .bind(filter.difficulty.map(|d| d.as_str()))
        .bind(filter.exclude)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Question::try_from).transpose()
    }

    async fn insert_attempt(&self, attempt: &Attempt) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO attempts
                (id, user_id, question_id, exam, skill, answer, audio_ref, time_spent_secs,
                 is_correct, score, raw_score, feedback, suggestions, criteria_scores, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(&attempt.id)
        .bind(attempt.user_id)
        .bind(&attempt.question_id)
        .bind(attempt.exam.as_str())
        .bind(&attempt.skill)
        .bind(&attempt.answer)
        .bind(&attempt.audio_ref)
        .bind(attempt.time_spent_secs)
        .bind(attempt.is_correct)
        .bind(attempt.score)
        .bind(attempt.raw_score)
        .bind(&attempt.feedback)
        .bind(&attempt.suggestions)
        .bind(attempt.criteria_scores.as_ref().map(Json))
        .bind(attempt.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn recent_attempts(
        &self,
        user_id: i64,
        exam: ExamKind,
        skill: &str,
        limit: i64,
    ) -> Result<Vec<Attempt>, StoreError> {
        let rows = sqlx::query_as::<_, AttemptRow>(
            r#"
            SELECT id, user_id, question_id, exam, skill, answer, audio_ref, time_spent_secs,
                   is_correct, score, raw_score, feedback, suggestions, criteria_scores, created_at
            FROM attempts
            WHERE user_id = $1 AND exam = $2 AND skill = $3
            ORDER BY created_at DESC
            LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(exam.as_str())
        .bind(skill)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Attempt::try_from).collect()
    }

    /// Single atomic upsert: counters are incremented and the average and
    /// best recomputed inside the statement, so concurrent submissions
    /// for the same (user, exam, skill) cannot lose updates.
    async fn apply_progress(
        &self,
        user_id: i64,
        exam: ExamKind,
        skill: &str,
        delta: &ProgressDelta,
    ) -> Result<Progress, StoreError> {
        let correct = if delta.correct { 1i64 } else { 0i64 };
        let row = sqlx::query_as::<_, ProgressRow>(
            r#"
            INSERT INTO progress
                (user_id, exam, skill, total_questions, correct_answers,
                 total_points, earned_points, average_score, best_score, last_activity)
            VALUES ($1, $2, $3, 1, $4, $5, $6,
                    CASE WHEN $5 > 0 THEN $6 / $5 ELSE 0 END, $7, NOW())
            ON CONFLICT (user_id, exam, skill) DO UPDATE SET
                total_questions = progress.total_questions + 1,
                correct_answers = progress.correct_answers + EXCLUDED.correct_answers,
                total_points    = progress.total_points + EXCLUDED.total_points,
                earned_points   = progress.earned_points + EXCLUDED.earned_points,
                average_score   = CASE
                    WHEN progress.total_points + EXCLUDED.total_points > 0
                    THEN (progress.earned_points + EXCLUDED.earned_points)
                         / (progress.total_points + EXCLUDED.total_points)
                    ELSE 0
                END,
                best_score      = GREATEST(progress.best_score, EXCLUDED.best_score),
                last_activity   = NOW()
            RETURNING user_id, exam, skill, total_questions, correct_answers,
                      total_points, earned_points, average_score, best_score, last_activity
            "#,
        )
        .bind(user_id)
        .bind(exam.as_str())
        .bind(skill)
        .bind(correct)
        .bind(delta.possible)
        .bind(delta.earned)
        .bind(delta.score)
        .fetch_one(&self.pool)
        .await?;
        Progress::try_from(row)
    }

    async fn progress_for(
        &self,
        user_id: i64,
        exam: ExamKind,
        skill: Option<&str>,
    ) -> Result<Vec<Progress>, StoreError> {
        let rows = sqlx::query_as::<_, ProgressRow>(
            r#"
            SELECT user_id, exam, skill, total_questions, correct_answers,
                   total_points, earned_points, average_score, best_score, last_activity
            FROM progress
            WHERE user_id = $1 AND exam = $2 AND ($3::text IS NULL OR skill = $3)
            ORDER BY skill
            "#,
        )
        .bind(user_id)
        .bind(exam.as_str())
        .bind(skill)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Progress::try_from).collect()
    }

    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, password, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, password, role, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Postgres error code for unique violation is 23505
            if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
                StoreError::Conflict(format!("Username '{}' already exists", username))
            } else {
                StoreError::from(e)
            }
        })?;
        Ok(User::from(row))
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password, role, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }
}

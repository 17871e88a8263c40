// src/store/mod.rs

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::models::{
    attempt::Attempt,
    exam::ExamKind,
    progress::{Progress, ProgressDelta},
    question::{Difficulty, Question},
    user::User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Data-layer error. The engine treats these as fatal and propagates them.
#[derive(Debug)]
pub enum StoreError {
    Database(String),
    /// Unique constraint violation (e.g., duplicate username).
    Conflict(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Database(msg) => write!(f, "database error: {}", msg),
            StoreError::Conflict(msg) => write!(f, "conflict: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Filter for picking the next question to serve.
#[derive(Debug, Clone)]
pub struct QuestionFilter<'a> {
    pub exam: ExamKind,
    pub skill: &'a str,
    /// `None` matches any difficulty.
    pub difficulty: Option<Difficulty>,
    /// Recently attempted question ids to skip.
    pub exclude: &'a [String],
}

/// The persistent question/attempt/progress store the engine runs against.
///
/// Two implementations: `PgStore` for production and `MemoryStore` for
/// tests and offline runs. Progress is applied as a single atomic upsert
/// so concurrent submissions for the same (user, exam, skill) cannot
/// lose updates.
#[async_trait]
pub trait PracticeStore: Send + Sync {
    async fn insert_question(&self, question: &Question) -> Result<(), StoreError>;
    async fn update_question(&self, question: &Question) -> Result<bool, StoreError>;
    async fn delete_question(&self, id: &str) -> Result<bool, StoreError>;
    async fn get_question(&self, id: &str) -> Result<Option<Question>, StoreError>;
    async fn list_questions(
        &self,
        exam: ExamKind,
        skill: Option<&str>,
    ) -> Result<Vec<Question>, StoreError>;
    async fn find_question(
        &self,
        filter: &QuestionFilter<'_>,
    ) -> Result<Option<Question>, StoreError>;

    async fn insert_attempt(&self, attempt: &Attempt) -> Result<(), StoreError>;
    /// Most recent attempts first.
    async fn recent_attempts(
        &self,
        user_id: i64,
        exam: ExamKind,
        skill: &str,
        limit: i64,
    ) -> Result<Vec<Attempt>, StoreError>;

    async fn apply_progress(
        &self,
        user_id: i64,
        exam: ExamKind,
        skill: &str,
        delta: &ProgressDelta,
    ) -> Result<Progress, StoreError>;
    async fn progress_for(
        &self,
        user_id: i64,
        exam: ExamKind,
        skill: Option<&str>,
    ) -> Result<Vec<Progress>, StoreError>;

    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, StoreError>;
    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError>;
}

// src/store/memory.rs

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crate::models::{
    attempt::Attempt,
    exam::ExamKind,
    progress::{Progress, ProgressDelta},
    question::Question,
    user::User,
};
use crate::store::{PracticeStore, QuestionFilter, StoreError};

#[derive(Default)]
struct Inner {
    questions: HashMap<String, Question>,
    attempts: Vec<Attempt>,
    progress: HashMap<(i64, ExamKind, String), Progress>,
    users: HashMap<String, User>,
    next_user_id: i64,
}

/// In-process store used by the test suite and by offline runs.
///
/// The lock is an implementation detail of the fake; it is never held
/// across an await point.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl PracticeStore for MemoryStore {
    async fn insert_question(&self, question: &Question) -> Result<(), StoreError> {
        self.write()
            .questions
            .insert(question.id.clone(), question.clone());
        Ok(())
    }

    async fn update_question(&self, question: &Question) -> Result<bool, StoreError> {
        let mut inner = self.write();
        match inner.questions.get_mut(&question.id) {
            Some(existing) => {
                *existing = question.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_question(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.write().questions.remove(id).is_some())
    }

    async fn get_question(&self, id: &str) -> Result<Option<Question>, StoreError> {
        Ok(self.read().questions.get(id).cloned())
    }

    async fn list_questions(
        &self,
        exam: ExamKind,
        skill: Option<&str>,
    ) -> Result<Vec<Question>, StoreError> {
        let mut list: Vec<Question> = self
            .read()
            .questions
            .values()
            .filter(|q| q.exam == exam && skill.is_none_or(|s| q.skill == s))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(list)
    }

    async fn find_question(
        &self,
        filter: &QuestionFilter<'_>,
    ) -> Result<Option<Question>, StoreError> {
        let inner = self.read();
        let mut candidates: Vec<&Question> = inner
            .questions
            .values()
            .filter(|q| {
                q.exam == filter.exam
                    && q.skill == filter.skill
                    && filter.difficulty.is_none_or(|d| q.difficulty == d)
                    && !filter.exclude.contains(&q.id)
            })
            .collect();
        // Deterministic pick so tests stay stable.
        candidates.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(candidates.first().map(|q| (*q).clone()))
    }

    async fn insert_attempt(&self, attempt: &Attempt) -> Result<(), StoreError> {
        self.write().attempts.push(attempt.clone());
        Ok(())
    }

    async fn recent_attempts(
        &self,
        user_id: i64,
        exam: ExamKind,
        skill: &str,
        limit: i64,
    ) -> Result<Vec<Attempt>, StoreError> {
        let inner = self.read();
        // Newest first; reverse insertion order breaks timestamp ties.
        let mut recent: Vec<Attempt> = inner
            .attempts
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id && a.exam == exam && a.skill == skill)
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(limit.max(0) as usize);
        Ok(recent)
    }

    async fn apply_progress(
        &self,
        user_id: i64,
        exam: ExamKind,
        skill: &str,
        delta: &ProgressDelta,
    ) -> Result<Progress, StoreError> {
        let mut inner = self.write();
        let entry = inner
            .progress
            .entry((user_id, exam, skill.to_string()))
            .or_insert_with(|| Progress {
                user_id,
                exam,
                skill: skill.to_string(),
                total_questions: 0,
                correct_answers: 0,
                total_points: 0.0,
                earned_points: 0.0,
                average_score: 0.0,
                best_score: 0.0,
                last_activity: Utc::now(),
            });

        entry.total_questions += 1;
        if delta.correct {
            entry.correct_answers += 1;
        }
        entry.total_points += delta.possible;
        entry.earned_points += delta.earned;
        entry.average_score = if entry.total_points > 0.0 {
            entry.earned_points / entry.total_points
        } else {
            0.0
        };
        entry.best_score = entry.best_score.max(delta.score);
        entry.last_activity = Utc::now();

        Ok(entry.clone())
    }

    async fn progress_for(
        &self,
        user_id: i64,
        exam: ExamKind,
        skill: Option<&str>,
    ) -> Result<Vec<Progress>, StoreError> {
        let inner = self.read();
        let mut rows: Vec<Progress> = inner
            .progress
            .values()
            .filter(|p| p.user_id == user_id && p.exam == exam && skill.is_none_or(|s| p.skill == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.skill.cmp(&b.skill));
        Ok(rows)
    }

    async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, StoreError> {
        let mut inner = self.write();
        if inner.users.contains_key(username) {
            return Err(StoreError::Conflict(format!(
                "Username '{}' already exists",
                username
            )));
        }
        inner.next_user_id += 1;
        let user = User {
            id: inner.next_user_id,
            username: username.to_string(),
            password: password_hash.to_string(),
            role: role.to_string(),
            created_at: Utc::now(),
        };
        inner.users.insert(username.to_string(), user.clone());
        Ok(user)
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.read().users.get(username).cloned())
    }
}

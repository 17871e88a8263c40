// src/engine/generator.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::engine::EngineError;
use crate::engine::profiles::{ExamProfile, SkillDef};
use crate::models::question::{Difficulty, Question};
use crate::store::PracticeStore;

/// Synthesizes a question from the exam profile's content pools when the
/// store has nothing left to serve. Synthesized questions are persisted
/// so later attempts can reference them and the repeat-exclusion window
/// applies to them like any authored question.
pub struct QuestionGenerator {
    store: Arc<dyn PracticeStore>,
    profile: &'static ExamProfile,
}

impl QuestionGenerator {
    pub fn new(store: Arc<dyn PracticeStore>, profile: &'static ExamProfile) -> Self {
        Self { store, profile }
    }

    pub async fn synthesize(
        &self,
        skill: &SkillDef,
        difficulty: Difficulty,
        seed: usize,
    ) -> Result<Option<Question>, EngineError> {
        let Some(synthesized) = (self.profile.synthesize)(skill.code, difficulty, seed) else {
            return Ok(None);
        };

        let question = Question {
            id: Uuid::new_v4().to_string(),
            exam: self.profile.exam,
            skill: skill.code.to_string(),
            difficulty,
            content: synthesized.content,
            correct_answer: synthesized.correct_answer,
            points: synthesized.points,
            time_limit_secs: synthesized.time_limit_secs,
            created_at: Utc::now(),
        };

        self.store.insert_question(&question).await?;
        tracing::info!(
            "Synthesized {} {}/{} question {}",
            difficulty.as_str(),
            self.profile.exam,
            skill.code,
            question.id
        );

        Ok(Some(question))
    }
}

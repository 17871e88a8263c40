// src/engine/selector.rs

use std::sync::Arc;

use crate::engine::EngineError;
use crate::engine::generator::QuestionGenerator;
use crate::engine::profiles::ExamProfile;
use crate::models::attempt::Attempt;
use crate::models::question::{Difficulty, Question};
use crate::store::{PracticeStore, QuestionFilter};

/// How many recently attempted questions are excluded from selection.
const RECENT_EXCLUSION: i64 = 10;
/// How many recent attempts feed the difficulty ratchet.
const ADAPT_WINDOW: usize = 5;
/// Below this many attempts the last-known difficulty is kept.
const MIN_SAMPLE: usize = 3;
const STEP_UP_THRESHOLD: f64 = 0.8;
const STEP_DOWN_THRESHOLD: f64 = 0.4;

/// Picks the next question for a (user, skill) pair within one exam:
/// avoids the user's recent questions and adapts difficulty from their
/// recent accuracy.
pub struct QuestionSelector {
    store: Arc<dyn PracticeStore>,
    generator: QuestionGenerator,
    profile: &'static ExamProfile,
}

/// One-step ratchet over the accuracy of the recent window. Accuracy
/// inside [0.4, 0.8] keeps the difficulty unchanged.
fn adjust(base: Difficulty, accuracy: f64) -> Difficulty {
    if accuracy > STEP_UP_THRESHOLD {
        base.step_up()
    } else if accuracy < STEP_DOWN_THRESHOLD {
        base.step_down()
    } else {
        base
    }
}

impl QuestionSelector {
    pub fn new(store: Arc<dyn PracticeStore>, profile: &'static ExamProfile) -> Self {
        let generator = QuestionGenerator::new(store.clone(), profile);
        Self {
            store,
            generator,
            profile,
        }
    }

    /// Returns `Ok(None)` when the skill simply has no content left to
    /// serve; that is routine, not an error.
    pub async fn next(
        &self,
        user_id: i64,
        skill_code: &str,
        difficulty: Option<Difficulty>,
    ) -> Result<Option<Question>, EngineError> {
        let skill = self
            .profile
            .skill(skill_code)
            .filter(|s| s.active)
            .ok_or_else(|| {
                EngineError::Configuration(format!(
                    "skill '{}' is not registered for exam '{}'",
                    skill_code, self.profile.exam
                ))
            })?;

        let recent = self
            .store
            .recent_attempts(user_id, self.profile.exam, skill.code, RECENT_EXCLUSION)
            .await?;
        let exclude: Vec<String> = recent.iter().map(|a| a.question_id.clone()).collect();

        let difficulty = match difficulty {
            Some(d) => d,
            None => self.adaptive_difficulty(&recent).await?,
        };

        let strict = QuestionFilter {
            exam: self.profile.exam,
            skill: skill.code,
            difficulty: Some(difficulty),
            exclude: &exclude,
        };
        if let Some(question) = self.store.find_question(&strict).await? {
            return Ok(Some(question));
        }

        // Nothing fresh at this difficulty; relax it before synthesizing.
        let relaxed = QuestionFilter {
            difficulty: None,
            ..strict
        };
        if let Some(question) = self.store.find_question(&relaxed).await? {
            return Ok(Some(question));
        }

        self.generator
            .synthesize(skill, difficulty, exclude.len())
            .await
    }

    /// Accuracy over the most recent attempts. Attempts without a
    /// correctness verdict (essay/speaking) count toward the window but
    /// not the numerator.
    async fn adaptive_difficulty(&self, recent: &[Attempt]) -> Result<Difficulty, EngineError> {
        let base = self.last_known_difficulty(recent).await?;
        let window = &recent[..recent.len().min(ADAPT_WINDOW)];
        if window.len() < MIN_SAMPLE {
            return Ok(base);
        }
        let correct = window
            .iter()
            .filter(|a| a.is_correct == Some(true))
            .count();
        let accuracy = correct as f64 / window.len() as f64;
        Ok(adjust(base, accuracy))
    }

    async fn last_known_difficulty(&self, recent: &[Attempt]) -> Result<Difficulty, EngineError> {
        if let Some(last) = recent.first() {
            if let Some(question) = self.store.get_question(&last.question_id).await? {
                return Ok(question.difficulty);
            }
        }
        Ok(Difficulty::Easy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratchet_moves_at_most_one_step() {
        for base in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            for accuracy in [0.0, 0.2, 0.39, 0.4, 0.6, 0.8, 0.81, 1.0] {
                let next = adjust(base, accuracy);
                let distance = (next as i32 - base as i32).abs();
                assert!(distance <= 1, "{:?} -> {:?} jumped", base, next);
            }
        }
    }

    #[test]
    fn ratchet_dead_zone_is_a_no_op() {
        for base in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert_eq!(adjust(base, 0.4), base);
            assert_eq!(adjust(base, 0.6), base);
            assert_eq!(adjust(base, 0.8), base);
        }
    }

    #[test]
    fn ratchet_steps_and_clamps() {
        assert_eq!(adjust(Difficulty::Easy, 1.0), Difficulty::Medium);
        assert_eq!(adjust(Difficulty::Medium, 0.81), Difficulty::Hard);
        assert_eq!(adjust(Difficulty::Hard, 1.0), Difficulty::Hard);
        assert_eq!(adjust(Difficulty::Medium, 0.2), Difficulty::Easy);
        assert_eq!(adjust(Difficulty::Easy, 0.0), Difficulty::Easy);
    }
}

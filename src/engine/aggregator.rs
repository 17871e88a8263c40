// src/engine/aggregator.rs

use std::sync::Arc;

use crate::engine::profiles::ExamProfile;
use crate::models::attempt::Evaluation;
use crate::models::progress::ProgressDelta;
use crate::models::question::Question;
use crate::store::PracticeStore;

/// Folds each evaluated attempt into the per-(user, exam, skill)
/// Progress row through a single atomic store upsert.
pub struct ProgressAggregator {
    store: Arc<dyn PracticeStore>,
    profile: &'static ExamProfile,
}

impl ProgressAggregator {
    pub fn new(store: Arc<dyn PracticeStore>, profile: &'static ExamProfile) -> Self {
        Self { store, profile }
    }

    /// Best-effort: a progress failure is logged and swallowed so it
    /// never fails the submission it belongs to.
    pub async fn update(&self, user_id: i64, question: &Question, evaluation: &Evaluation) {
        let delta = ProgressDelta {
            correct: evaluation.is_correct == Some(true),
            earned: evaluation.raw_score,
            possible: question.points,
            score: evaluation.score,
        };

        if let Err(e) = self
            .store
            .apply_progress(user_id, self.profile.exam, &question.skill, &delta)
            .await
        {
            tracing::error!(
                "Failed to update progress for user {} on {}/{}: {}",
                user_id,
                self.profile.exam,
                question.skill,
                e
            );
        }
    }
}

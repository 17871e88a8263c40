// src/engine/mod.rs

pub mod aggregator;
pub mod converter;
pub mod evaluator;
pub mod generator;
pub mod profiles;
pub mod selector;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::models::exam::ExamKind;
use crate::oracle::{ScoringOracle, TranscriptionOracle};
use crate::store::{PracticeStore, StoreError};

use aggregator::ProgressAggregator;
use evaluator::Evaluator;
use profiles::ExamProfile;
use selector::QuestionSelector;

/// Engine error taxonomy, shared by all exams so callers can handle
/// every exam type uniformly.
#[derive(Debug)]
pub enum EngineError {
    /// Bad content data: unknown skill code, objective question without
    /// a correct answer. Fatal, not retried.
    Configuration(String),
    /// Oracle timeout or failure. Retryable by the caller; never turned
    /// into a fabricated score.
    EvaluationUnavailable(String),
    /// Data-layer failure.
    Store(StoreError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Configuration(msg) => write!(f, "configuration error: {}", msg),
            EngineError::EvaluationUnavailable(msg) => {
                write!(f, "evaluation unavailable: {}", msg)
            }
            EngineError::Store(err) => write!(f, "store error: {}", err),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        EngineError::Store(err)
    }
}

/// The selector/evaluator/aggregator bundle for one exam.
pub struct ExamService {
    pub profile: &'static ExamProfile,
    pub selector: QuestionSelector,
    pub evaluator: Evaluator,
    pub aggregator: ProgressAggregator,
}

impl ExamService {
    fn new(
        profile: &'static ExamProfile,
        store: Arc<dyn PracticeStore>,
        oracle: Arc<dyn ScoringOracle>,
        transcriber: Option<Arc<dyn TranscriptionOracle>>,
        oracle_timeout: Duration,
    ) -> Self {
        Self {
            profile,
            selector: QuestionSelector::new(store.clone(), profile),
            evaluator: Evaluator::new(profile, oracle, transcriber, oracle_timeout),
            aggregator: ProgressAggregator::new(store, profile),
        }
    }
}

/// All exam services, constructed once at process start and shared by
/// reference. There is no lazily-populated cache to race on.
pub struct ExamServiceRegistry {
    ielts: ExamService,
    toefl: ExamService,
    yds: ExamService,
}

impl ExamServiceRegistry {
    pub fn new(
        store: Arc<dyn PracticeStore>,
        oracle: Arc<dyn ScoringOracle>,
        transcriber: Option<Arc<dyn TranscriptionOracle>>,
        oracle_timeout: Duration,
    ) -> Self {
        let build = |profile: &'static ExamProfile| {
            ExamService::new(
                profile,
                store.clone(),
                oracle.clone(),
                transcriber.clone(),
                oracle_timeout,
            )
        };

        Self {
            ielts: build(profiles::ielts::profile()),
            toefl: build(profiles::toefl::profile()),
            yds: build(profiles::yds::profile()),
        }
    }

    pub fn service(&self, exam: ExamKind) -> &ExamService {
        match exam {
            ExamKind::Ielts => &self.ielts,
            ExamKind::Toefl => &self.toefl,
            ExamKind::Yds => &self.yds,
        }
    }
}

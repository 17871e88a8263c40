// src/oracle/mod.rs

pub mod http;
pub mod rubric;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::HttpOracle;
pub use rubric::RubricOracle;

/// Request to score a free-form answer against a rubric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRequest {
    /// The task the examinee was given.
    pub task: String,
    /// The examinee's answer text (transcribed for speaking).
    pub answer: String,
    /// Rubric description for this exam and skill.
    pub rubric: String,
    /// Criterion names the response must score.
    pub criteria: Vec<String>,
    /// Maximum score per criterion (the skill's max score).
    pub max_score: f64,
}

/// Response from the scoring oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResponse {
    /// Overall score; only used when `criteria_scores` is empty — the
    /// evaluator otherwise recomputes the overall as the unweighted mean
    /// of the criterion scores.
    pub overall: f64,
    #[serde(default)]
    pub criteria_scores: BTreeMap<String, f64>,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub suggestions: String,
}

#[derive(Debug)]
pub enum OracleError {
    Request(String),
    BadResponse(String),
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleError::Request(msg) => write!(f, "oracle request failed: {}", msg),
            OracleError::BadResponse(msg) => write!(f, "oracle returned a bad response: {}", msg),
        }
    }
}

impl std::error::Error for OracleError {}

/// External scoring service for essay and speaking answers. Treated as a
/// black box; calls are bounded by a timeout at the call site and a
/// failure is surfaced to the caller, never turned into a score.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    /// Human-readable oracle name for logs.
    fn name(&self) -> &str;

    async fn score(&self, request: &ScoreRequest) -> Result<ScoreResponse, OracleError>;
}

/// Speech-to-text service used before scoring a spoken answer.
#[async_trait]
pub trait TranscriptionOracle: Send + Sync {
    async fn transcribe(&self, audio_ref: &str) -> Result<String, OracleError>;
}

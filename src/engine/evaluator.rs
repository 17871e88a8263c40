// src/engine/evaluator.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::engine::EngineError;
use crate::engine::converter::{apply_rounding, to_scale};
use crate::engine::profiles::{ExamProfile, SkillDef, SkillKind};
use crate::models::attempt::{AnswerPayload, Evaluation};
use crate::models::question::{Question, SubQuestion};
use crate::oracle::{ScoreRequest, ScoringOracle, TranscriptionOracle};
use crate::utils::text::{normalize_answer, word_count};

/// Fraction of the skill's max score at which the top feedback tier starts.
const EXCELLENT_FRACTION: f64 = 0.8;

/// Grades submitted answers for one exam. Objective kinds are matched
/// against the stored correct answer; essay and speaking answers are
/// delegated to the scoring oracle under a hard timeout.
pub struct Evaluator {
    profile: &'static ExamProfile,
    oracle: Arc<dyn ScoringOracle>,
    transcriber: Option<Arc<dyn TranscriptionOracle>>,
    oracle_timeout: Duration,
}

impl Evaluator {
    pub fn new(
        profile: &'static ExamProfile,
        oracle: Arc<dyn ScoringOracle>,
        transcriber: Option<Arc<dyn TranscriptionOracle>>,
        oracle_timeout: Duration,
    ) -> Self {
        Self {
            profile,
            oracle,
            transcriber,
            oracle_timeout,
        }
    }

    pub async fn evaluate(
        &self,
        question: &Question,
        payload: &AnswerPayload,
    ) -> Result<Evaluation, EngineError> {
        let skill = self.profile.skill(&question.skill).ok_or_else(|| {
            EngineError::Configuration(format!(
                "question {} references unknown skill '{}' for exam '{}'",
                question.id, question.skill, self.profile.exam
            ))
        })?;

        match skill.kind {
            SkillKind::Objective => match question.content.sub_questions() {
                Some(subs) => self.grade_multi_part(skill, subs, payload),
                None => self.grade_objective(question, skill, payload),
            },
            SkillKind::AiDelegated => self.grade_delegated(question, skill, payload).await,
        }
    }

    /// Case-insensitive, whitespace-normalized exact match. Full points
    /// or zero; the correct answer is always revealed in the feedback.
    fn grade_objective(
        &self,
        question: &Question,
        skill: &SkillDef,
        payload: &AnswerPayload,
    ) -> Result<Evaluation, EngineError> {
        let correct = question.correct_answer.as_deref().ok_or_else(|| {
            tracing::error!(
                "Objective question {} has no correct answer configured",
                question.id
            );
            EngineError::Configuration(format!(
                "question {} is missing its correct answer",
                question.id
            ))
        })?;

        let matched = normalize_answer(&payload.answer) == normalize_answer(correct);
        let score = if matched { question.points } else { 0.0 };

        let (feedback, suggestions) = if matched {
            ("Correct. Well done.".to_string(), String::new())
        } else {
            (
                format!("Incorrect. The correct answer is \"{}\".", correct),
                skill.suggestion.to_string(),
            )
        };

        Ok(Evaluation {
            is_correct: Some(matched),
            score,
            raw_score: score,
            feedback,
            suggestions,
            criteria_scores: None,
        })
    }

    /// Multi-part sets (reading passages, listening scripts): raw score
    /// is the number of matching sub-answers, converted to the exam
    /// scale through the section step table.
    fn grade_multi_part(
        &self,
        skill: &SkillDef,
        subs: &[SubQuestion],
        payload: &AnswerPayload,
    ) -> Result<Evaluation, EngineError> {
        let answers = payload.sub_answers.as_deref().unwrap_or(&[]);

        let mut correct_count = 0usize;
        let mut misses: Vec<String> = Vec::new();
        for (index, sub) in subs.iter().enumerate() {
            let given = answers.get(index).map(String::as_str).unwrap_or("");
            if normalize_answer(given) == normalize_answer(&sub.correct) {
                correct_count += 1;
            } else {
                misses.push(format!(
                    "Question {}: the correct answer is \"{}\".",
                    index + 1,
                    sub.correct
                ));
            }
        }

        let raw_score = correct_count as f64;
        let score = to_scale(self.profile, raw_score, subs.len() as f64);
        let all_correct = correct_count == subs.len();

        let mut feedback = format!(
            "You answered {} of {} correctly.",
            correct_count,
            subs.len()
        );
        if !misses.is_empty() {
            feedback.push(' ');
            feedback.push_str(&misses.join(" "));
        }

        Ok(Evaluation {
            is_correct: Some(all_correct),
            score,
            raw_score,
            feedback,
            suggestions: if all_correct {
                String::new()
            } else {
                skill.suggestion.to_string()
            },
            criteria_scores: None,
        })
    }

    /// Essay and speaking answers: enforce the length floor, transcribe
    /// audio if needed, then delegate to the oracle. Oracle failure or
    /// timeout surfaces as `EvaluationUnavailable`, never as a score.
    async fn grade_delegated(
        &self,
        question: &Question,
        skill: &SkillDef,
        payload: &AnswerPayload,
    ) -> Result<Evaluation, EngineError> {
        let mut text = payload.answer.trim().to_string();

        if text.is_empty() {
            if let Some(audio_ref) = payload.audio_ref.as_deref() {
                text = self.transcribe(audio_ref).await?;
            }
        }

        let words = word_count(&text);
        if words < skill.min_words {
            return Ok(Evaluation {
                is_correct: None,
                score: self.profile.scale.min,
                raw_score: self.profile.scale.min,
                feedback: format!(
                    "Your response is too short to assess: {} words, at least {} required.",
                    words, skill.min_words
                ),
                suggestions: skill.suggestion.to_string(),
                criteria_scores: None,
            });
        }

        let request = ScoreRequest {
            task: question.content.prompt_text().to_string(),
            answer: text,
            rubric: self.profile.rubric_for(skill),
            criteria: skill.criteria.iter().map(|c| (*c).to_string()).collect(),
            max_score: skill.max_score,
        };

        let response = timeout(self.oracle_timeout, self.oracle.score(&request))
            .await
            .map_err(|_| {
                EngineError::EvaluationUnavailable(format!(
                    "scoring oracle '{}' timed out",
                    self.oracle.name()
                ))
            })?
            .map_err(|e| EngineError::EvaluationUnavailable(e.to_string()))?;

        let mut criteria_scores = response.criteria_scores;
        for value in criteria_scores.values_mut() {
            *value = value.clamp(0.0, skill.max_score);
        }

        // Unweighted arithmetic mean of the criterion scores; the
        // oracle's own overall is only trusted when it sent no breakdown.
        let raw_score = if criteria_scores.is_empty() {
            response.overall.clamp(0.0, skill.max_score)
        } else {
            criteria_scores.values().sum::<f64>() / criteria_scores.len() as f64
        };
        let score = apply_rounding(self.profile.rounding, raw_score)
            .clamp(self.profile.scale.min, skill.max_score);

        let (band_feedback, band_suggestion) = self.band_messages(skill, score);
        let feedback = if response.feedback.trim().is_empty() {
            band_feedback
        } else {
            response.feedback
        };
        let suggestions = if response.suggestions.trim().is_empty() {
            band_suggestion
        } else {
            response.suggestions
        };

        Ok(Evaluation {
            is_correct: None,
            score,
            raw_score,
            feedback,
            suggestions,
            criteria_scores: if criteria_scores.is_empty() {
                None
            } else {
                Some(criteria_scores)
            },
        })
    }

    async fn transcribe(&self, audio_ref: &str) -> Result<String, EngineError> {
        let transcriber = self.transcriber.as_ref().ok_or_else(|| {
            EngineError::EvaluationUnavailable("no transcription service configured".to_string())
        })?;

        timeout(self.oracle_timeout, transcriber.transcribe(audio_ref))
            .await
            .map_err(|_| {
                EngineError::EvaluationUnavailable("transcription timed out".to_string())
            })?
            .map_err(|e| EngineError::EvaluationUnavailable(e.to_string()))
    }

    /// Tiered feedback synthesized from the score bands, used when the
    /// oracle returns no prose of its own.
    fn band_messages(&self, skill: &SkillDef, score: f64) -> (String, String) {
        let fraction = if skill.max_score > 0.0 {
            score / skill.max_score
        } else {
            0.0
        };
        let bands = &self.profile.bands;
        if fraction >= EXCELLENT_FRACTION {
            (
                bands.excellent.to_string(),
                "Keep practising at this level to hold your performance steady.".to_string(),
            )
        } else if fraction >= self.profile.passing_fraction() {
            (bands.good.to_string(), skill.suggestion.to_string())
        } else {
            (bands.needs_work.to_string(), skill.suggestion.to_string())
        }
    }
}

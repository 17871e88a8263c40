// tests/engine_tests.rs
//
// Engine behaviour against the in-memory store and a scripted oracle:
// selection exclusion, the adaptive difficulty ratchet, objective and
// delegated grading, score conversion bounds, and progress folding.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use examprep::engine::evaluator::Evaluator;
use examprep::engine::{EngineError, ExamServiceRegistry, profiles};
use examprep::models::attempt::{AnswerPayload, Attempt, Evaluation};
use examprep::models::exam::ExamKind;
use examprep::models::progress::ProgressDelta;
use examprep::models::question::{Difficulty, Question, QuestionContent, SubQuestion};
use examprep::oracle::{
    OracleError, RubricOracle, ScoreRequest, ScoreResponse, ScoringOracle,
};
use examprep::store::{MemoryStore, PracticeStore};

/// Oracle returning a fixed response, counting its calls.
struct ScriptedOracle {
    response: ScoreResponse,
    calls: AtomicU32,
}

impl ScriptedOracle {
    fn new(criteria: &[(&str, f64)]) -> Self {
        let criteria_scores: BTreeMap<String, f64> = criteria
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect();
        Self {
            response: ScoreResponse {
                overall: 0.0,
                criteria_scores,
                feedback: String::new(),
                suggestions: String::new(),
            },
            calls: AtomicU32::new(0),
        }
    }

    fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ScoringOracle for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn score(&self, _request: &ScoreRequest) -> Result<ScoreResponse, OracleError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.response.clone())
    }
}

/// Oracle that never answers within any reasonable timeout.
struct StalledOracle;

#[async_trait]
impl ScoringOracle for StalledOracle {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn score(&self, _request: &ScoreRequest) -> Result<ScoreResponse, OracleError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        unreachable!("the evaluator must have timed out by now");
    }
}

fn registry(store: Arc<MemoryStore>, oracle: Arc<dyn ScoringOracle>) -> ExamServiceRegistry {
    ExamServiceRegistry::new(store, oracle, None, Duration::from_secs(5))
}

fn mcq(exam: ExamKind, skill: &str, difficulty: Difficulty, correct: &str) -> Question {
    Question {
        id: Uuid::new_v4().to_string(),
        exam,
        skill: skill.to_string(),
        difficulty,
        content: QuestionContent::MultipleChoice {
            prompt: "Pick the right option.".to_string(),
            options: vec!["A".into(), "B".into(), "C".into()],
        },
        correct_answer: Some(correct.to_string()),
        points: 1.0,
        time_limit_secs: 90,
        created_at: Utc::now(),
    }
}

fn essay(exam: ExamKind, skill: &str) -> Question {
    Question {
        id: Uuid::new_v4().to_string(),
        exam,
        skill: skill.to_string(),
        difficulty: Difficulty::Medium,
        content: QuestionContent::Essay {
            prompt: "Discuss both views and give your own opinion.".to_string(),
        },
        correct_answer: None,
        points: 9.0,
        time_limit_secs: 2400,
        created_at: Utc::now(),
    }
}

fn answer(text: &str) -> AnswerPayload {
    AnswerPayload {
        answer: text.to_string(),
        sub_answers: None,
        audio_ref: None,
    }
}

async fn record_attempt(
    store: &MemoryStore,
    user_id: i64,
    question: &Question,
    is_correct: Option<bool>,
    score: f64,
) {
    let attempt = Attempt {
        id: Uuid::new_v4().to_string(),
        user_id,
        question_id: question.id.clone(),
        exam: question.exam,
        skill: question.skill.clone(),
        answer: "x".to_string(),
        audio_ref: None,
        time_spent_secs: 30,
        is_correct,
        score,
        raw_score: score,
        feedback: String::new(),
        suggestions: String::new(),
        criteria_scores: None,
        created_at: Utc::now(),
    };
    store.insert_attempt(&attempt).await.unwrap();
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn selector_never_repeats_the_recent_ten() {
    let store = Arc::new(MemoryStore::new());
    let registry = registry(store.clone(), Arc::new(RubricOracle));
    let service = registry.service(ExamKind::Yds);

    let mut questions = Vec::new();
    for _ in 0..11 {
        let q = mcq(ExamKind::Yds, "grammar", Difficulty::Easy, "A");
        store.insert_question(&q).await.unwrap();
        questions.push(q);
    }

    // Attempt the first ten; only the eleventh remains fresh.
    for q in &questions[..10] {
        record_attempt(&store, 1, q, Some(true), 1.0).await;
    }
    let recent_ids: Vec<&String> = questions[..10].iter().map(|q| &q.id).collect();

    let next = service
        .selector
        .next(1, "grammar", Some(Difficulty::Easy))
        .await
        .unwrap()
        .expect("a question should be available");

    assert!(!recent_ids.contains(&&next.id));
    assert_eq!(next.id, questions[10].id);
}

#[tokio::test]
async fn difficulty_steps_up_after_high_accuracy() {
    let store = Arc::new(MemoryStore::new());
    let registry = registry(store.clone(), Arc::new(RubricOracle));
    let service = registry.service(ExamKind::Yds);

    let mut easy = Vec::new();
    for _ in 0..5 {
        let q = mcq(ExamKind::Yds, "grammar", Difficulty::Easy, "A");
        store.insert_question(&q).await.unwrap();
        easy.push(q);
    }
    let medium = mcq(ExamKind::Yds, "grammar", Difficulty::Medium, "A");
    store.insert_question(&medium).await.unwrap();

    // Five correct answers on easy questions: accuracy 1.0 > 0.8.
    for q in &easy {
        record_attempt(&store, 7, q, Some(true), 1.0).await;
    }

    let next = service.selector.next(7, "grammar", None).await.unwrap().unwrap();
    assert_eq!(next.difficulty, Difficulty::Medium);
    assert_eq!(next.id, medium.id);
}

#[tokio::test]
async fn difficulty_steps_down_after_low_accuracy() {
    let store = Arc::new(MemoryStore::new());
    let registry = registry(store.clone(), Arc::new(RubricOracle));
    let service = registry.service(ExamKind::Yds);

    let mut medium = Vec::new();
    for _ in 0..5 {
        let q = mcq(ExamKind::Yds, "vocabulary", Difficulty::Medium, "A");
        store.insert_question(&q).await.unwrap();
        medium.push(q);
    }
    let easy = mcq(ExamKind::Yds, "vocabulary", Difficulty::Easy, "A");
    store.insert_question(&easy).await.unwrap();

    // One of five correct: accuracy 0.2 < 0.4.
    for (i, q) in medium.iter().enumerate() {
        record_attempt(&store, 7, q, Some(i == 0), if i == 0 { 1.0 } else { 0.0 }).await;
    }

    let next = service.selector.next(7, "vocabulary", None).await.unwrap().unwrap();
    assert_eq!(next.difficulty, Difficulty::Easy);
}

#[tokio::test]
async fn mid_accuracy_keeps_the_current_difficulty() {
    let store = Arc::new(MemoryStore::new());
    let registry = registry(store.clone(), Arc::new(RubricOracle));
    let service = registry.service(ExamKind::Yds);

    let mut medium = Vec::new();
    for _ in 0..5 {
        let q = mcq(ExamKind::Yds, "grammar", Difficulty::Medium, "A");
        store.insert_question(&q).await.unwrap();
        medium.push(q);
    }
    let fresh_medium = mcq(ExamKind::Yds, "grammar", Difficulty::Medium, "A");
    store.insert_question(&fresh_medium).await.unwrap();

    // Three of five correct: accuracy 0.6 sits inside the dead zone.
    for (i, q) in medium.iter().enumerate() {
        record_attempt(&store, 3, q, Some(i < 3), if i < 3 { 1.0 } else { 0.0 }).await;
    }

    let next = service.selector.next(3, "grammar", None).await.unwrap().unwrap();
    assert_eq!(next.difficulty, Difficulty::Medium);
}

#[tokio::test]
async fn few_attempts_keep_last_known_difficulty() {
    let store = Arc::new(MemoryStore::new());
    let registry = registry(store.clone(), Arc::new(RubricOracle));
    let service = registry.service(ExamKind::Yds);

    let hard = mcq(ExamKind::Yds, "grammar", Difficulty::Hard, "A");
    store.insert_question(&hard).await.unwrap();
    let other_hard = mcq(ExamKind::Yds, "grammar", Difficulty::Hard, "A");
    store.insert_question(&other_hard).await.unwrap();

    // Two attempts are below the minimum sample; stay at hard.
    record_attempt(&store, 9, &hard, Some(false), 0.0).await;
    record_attempt(&store, 9, &hard, Some(false), 0.0).await;

    let next = service.selector.next(9, "grammar", None).await.unwrap().unwrap();
    assert_eq!(next.difficulty, Difficulty::Hard);
}

#[tokio::test]
async fn empty_store_synthesizes_and_persists_a_question() {
    let store = Arc::new(MemoryStore::new());
    let registry = registry(store.clone(), Arc::new(RubricOracle));
    let service = registry.service(ExamKind::Ielts);

    let next = service
        .selector
        .next(1, "writing", Some(Difficulty::Easy))
        .await
        .unwrap()
        .expect("writing prompts should be synthesized on demand");

    assert_eq!(next.kind(), "essay");
    assert_eq!(next.difficulty, Difficulty::Easy);
    assert!(store.get_question(&next.id).await.unwrap().is_some());
}

#[tokio::test]
async fn unknown_skill_is_a_configuration_error() {
    let store = Arc::new(MemoryStore::new());
    let registry = registry(store.clone(), Arc::new(RubricOracle));
    let service = registry.service(ExamKind::Ielts);

    let result = service.selector.next(1, "grammar", None).await;
    assert!(matches!(result, Err(EngineError::Configuration(_))));
}

// ---------------------------------------------------------------------------
// Objective grading
// ---------------------------------------------------------------------------

#[tokio::test]
async fn objective_grading_is_idempotent_and_normalized() {
    let store = Arc::new(MemoryStore::new());
    let registry = registry(store.clone(), Arc::new(RubricOracle));
    let service = registry.service(ExamKind::Yds);

    let question = mcq(ExamKind::Yds, "grammar", Difficulty::Easy, "B");
    let payload = answer("b ");

    let first = service.evaluator.evaluate(&question, &payload).await.unwrap();
    let second = service.evaluator.evaluate(&question, &payload).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.is_correct, Some(true));
    assert_eq!(first.score, question.points);
}

#[tokio::test]
async fn wrong_answer_scores_zero_and_reveals_the_key() {
    let store = Arc::new(MemoryStore::new());
    let registry = registry(store.clone(), Arc::new(RubricOracle));
    let service = registry.service(ExamKind::Yds);

    let question = mcq(ExamKind::Yds, "grammar", Difficulty::Easy, "B");
    let evaluation = service
        .evaluator
        .evaluate(&question, &answer("A"))
        .await
        .unwrap();

    assert_eq!(evaluation.is_correct, Some(false));
    assert_eq!(evaluation.score, 0.0);
    assert_eq!(evaluation.raw_score, 0.0);
    assert!(evaluation.feedback.contains('B'));

    // And the single wrong attempt folds into a zeroed progress row.
    service.aggregator.update(1, &question, &evaluation).await;
    let rows = store.progress_for(1, ExamKind::Yds, None).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total_questions, 1);
    assert_eq!(rows[0].correct_answers, 0);
    assert_eq!(rows[0].earned_points, 0.0);
    assert_eq!(rows[0].average_score, 0.0);
    assert_eq!(rows[0].best_score, 0.0);
}

#[tokio::test]
async fn objective_question_without_key_is_a_configuration_error() {
    let store = Arc::new(MemoryStore::new());
    let registry = registry(store.clone(), Arc::new(RubricOracle));
    let service = registry.service(ExamKind::Yds);

    let mut question = mcq(ExamKind::Yds, "grammar", Difficulty::Easy, "B");
    question.correct_answer = None;

    let result = service.evaluator.evaluate(&question, &answer("B")).await;
    assert!(matches!(result, Err(EngineError::Configuration(_))));
}

#[tokio::test]
async fn multi_part_reading_converts_through_the_step_table() {
    let store = Arc::new(MemoryStore::new());
    let registry = registry(store.clone(), Arc::new(RubricOracle));
    let service = registry.service(ExamKind::Ielts);

    let question = Question {
        id: Uuid::new_v4().to_string(),
        exam: ExamKind::Ielts,
        skill: "reading".to_string(),
        difficulty: Difficulty::Medium,
        content: QuestionContent::Reading {
            passage: "A short passage.".to_string(),
            sub_questions: vec![
                SubQuestion {
                    prompt: "First?".into(),
                    options: vec!["yes".into(), "no".into()],
                    correct: "yes".into(),
                },
                SubQuestion {
                    prompt: "Second?".into(),
                    options: vec![],
                    correct: "1901".into(),
                },
            ],
        },
        correct_answer: None,
        points: 2.0,
        time_limit_secs: 1200,
        created_at: Utc::now(),
    };

    let payload = AnswerPayload {
        answer: String::new(),
        sub_answers: Some(vec!["YES".to_string(), "1902".to_string()]),
        audio_ref: None,
    };
    let evaluation = service.evaluator.evaluate(&question, &payload).await.unwrap();

    // One of two correct: 50% maps to band 5.0.
    assert_eq!(evaluation.raw_score, 1.0);
    assert_eq!(evaluation.score, 5.0);
    assert_eq!(evaluation.is_correct, Some(false));
    assert!(evaluation.feedback.contains("1901"));
}

// ---------------------------------------------------------------------------
// Delegated grading
// ---------------------------------------------------------------------------

fn long_answer(words: usize) -> String {
    std::iter::repeat("evidence")
        .take(words)
        .collect::<Vec<_>>()
        .join(" ")
}

#[tokio::test]
async fn ielts_writing_rounds_the_criteria_mean_to_half_bands() {
    let store = Arc::new(MemoryStore::new());
    let oracle = Arc::new(ScriptedOracle::new(&[
        ("Task Achievement", 7.0),
        ("Coherence and Cohesion", 6.5),
        ("Lexical Resource", 6.5),
        ("Grammatical Range and Accuracy", 6.5),
    ]));
    let registry = registry(store.clone(), oracle.clone());
    let service = registry.service(ExamKind::Ielts);

    let question = essay(ExamKind::Ielts, "writing");
    let evaluation = service
        .evaluator
        .evaluate(&question, &answer(&long_answer(180)))
        .await
        .unwrap();

    // Mean 6.625 rounds half-up to 6.5 on the half-band scale.
    assert_eq!(evaluation.score, 6.5);
    assert!((evaluation.raw_score - 6.625).abs() < 1e-9);
    assert_eq!(evaluation.is_correct, None);
    assert_eq!(evaluation.criteria_scores.as_ref().unwrap().len(), 4);
    assert_eq!(oracle.call_count(), 1);
    // Scripted oracle returned no prose, so the band tables speak.
    assert!(!evaluation.feedback.is_empty());
    assert!(!evaluation.suggestions.is_empty());
}

#[tokio::test]
async fn toefl_writing_rounds_to_integers() {
    let store = Arc::new(MemoryStore::new());
    let oracle = Arc::new(ScriptedOracle::new(&[
        ("Development", 24.0),
        ("Organization", 25.0),
        ("Language Use", 23.0),
    ]));
    let registry = registry(store.clone(), oracle);
    let service = registry.service(ExamKind::Toefl);

    let question = essay(ExamKind::Toefl, "writing");
    let evaluation = service
        .evaluator
        .evaluate(&question, &answer(&long_answer(200)))
        .await
        .unwrap();

    assert_eq!(evaluation.score.fract(), 0.0);
    assert_eq!(evaluation.score, 24.0);
    assert!(evaluation.score <= 30.0);
}

#[tokio::test]
async fn short_answers_are_floored_without_calling_the_oracle() {
    let store = Arc::new(MemoryStore::new());
    let oracle = Arc::new(ScriptedOracle::new(&[("Task Achievement", 9.0)]));
    let registry = registry(store.clone(), oracle.clone());
    let service = registry.service(ExamKind::Ielts);

    let question = essay(ExamKind::Ielts, "writing");
    let evaluation = service
        .evaluator
        .evaluate(&question, &answer("Far too short."))
        .await
        .unwrap();

    assert_eq!(evaluation.score, 0.0);
    assert!(evaluation.feedback.contains("too short"));
    assert_eq!(oracle.call_count(), 0);
}

#[tokio::test]
async fn stalled_oracle_surfaces_evaluation_unavailable() {
    let evaluator = Evaluator::new(
        profiles::for_exam(ExamKind::Ielts),
        Arc::new(StalledOracle),
        None,
        Duration::from_millis(20),
    );

    let question = essay(ExamKind::Ielts, "writing");
    let result = evaluator.evaluate(&question, &answer(&long_answer(180))).await;
    assert!(matches!(result, Err(EngineError::EvaluationUnavailable(_))));
}

#[tokio::test]
async fn audio_without_transcriber_is_unavailable_not_scored() {
    let store = Arc::new(MemoryStore::new());
    let registry = registry(store.clone(), Arc::new(RubricOracle));
    let service = registry.service(ExamKind::Ielts);

    let mut question = essay(ExamKind::Ielts, "speaking");
    question.content = QuestionContent::Speaking {
        prompt: "Describe a place you like.".to_string(),
    };

    let payload = AnswerPayload {
        answer: String::new(),
        sub_answers: None,
        audio_ref: Some("audio/abc123.ogg".to_string()),
    };
    let result = service.evaluator.evaluate(&question, &payload).await;
    assert!(matches!(result, Err(EngineError::EvaluationUnavailable(_))));
}

#[tokio::test]
async fn spoken_text_answers_stay_on_the_band_scale() {
    let store = Arc::new(MemoryStore::new());
    let registry = registry(store.clone(), Arc::new(RubricOracle));
    let service = registry.service(ExamKind::Ielts);

    let mut question = essay(ExamKind::Ielts, "speaking");
    question.content = QuestionContent::Speaking {
        prompt: "Describe a skill that took you a long time to learn.".to_string(),
    };

    let spoken = "I would like to talk about learning to play the violin, which took me \
                  almost six years of daily practice before I could perform in public \
                  without feeling nervous about every single note.";
    let evaluation = service.evaluator.evaluate(&question, &answer(spoken)).await.unwrap();

    assert!(evaluation.score >= 0.0 && evaluation.score <= 9.0);
    assert_eq!(evaluation.score, (evaluation.score * 2.0).round() / 2.0);
}

// ---------------------------------------------------------------------------
// Progress folding
// ---------------------------------------------------------------------------

#[tokio::test]
async fn progress_average_and_best_follow_the_fold() {
    let store = MemoryStore::new();

    let deltas = [
        ProgressDelta { correct: true, earned: 1.0, possible: 1.0, score: 1.0 },
        ProgressDelta { correct: false, earned: 0.0, possible: 1.0, score: 0.0 },
        ProgressDelta { correct: true, earned: 1.0, possible: 1.0, score: 1.0 },
        ProgressDelta { correct: false, earned: 6.5, possible: 9.0, score: 6.5 },
    ];

    let mut last = None;
    for delta in &deltas {
        last = Some(
            store
                .apply_progress(5, ExamKind::Ielts, "reading", delta)
                .await
                .unwrap(),
        );
    }
    let progress = last.unwrap();

    let earned: f64 = deltas.iter().map(|d| d.earned).sum();
    let possible: f64 = deltas.iter().map(|d| d.possible).sum();
    assert_eq!(progress.total_questions, deltas.len() as i64);
    assert_eq!(progress.correct_answers, 2);
    assert!((progress.average_score - earned / possible).abs() < 1e-9);
    assert_eq!(progress.best_score, 6.5);
    assert!(progress.correct_answers <= progress.total_questions);
}

#[tokio::test]
async fn aggregator_swallows_progress_failures() {
    // A store whose progress table always fails.
    struct FailingStore(MemoryStore);

    #[async_trait]
    impl PracticeStore for FailingStore {
        async fn insert_question(
            &self,
            q: &Question,
        ) -> Result<(), examprep::store::StoreError> {
            self.0.insert_question(q).await
        }
        async fn update_question(
            &self,
            q: &Question,
        ) -> Result<bool, examprep::store::StoreError> {
            self.0.update_question(q).await
        }
        async fn delete_question(&self, id: &str) -> Result<bool, examprep::store::StoreError> {
            self.0.delete_question(id).await
        }
        async fn get_question(
            &self,
            id: &str,
        ) -> Result<Option<Question>, examprep::store::StoreError> {
            self.0.get_question(id).await
        }
        async fn list_questions(
            &self,
            exam: ExamKind,
            skill: Option<&str>,
        ) -> Result<Vec<Question>, examprep::store::StoreError> {
            self.0.list_questions(exam, skill).await
        }
        async fn find_question(
            &self,
            filter: &examprep::store::QuestionFilter<'_>,
        ) -> Result<Option<Question>, examprep::store::StoreError> {
            self.0.find_question(filter).await
        }
        async fn insert_attempt(&self, a: &Attempt) -> Result<(), examprep::store::StoreError> {
            self.0.insert_attempt(a).await
        }
        async fn recent_attempts(
            &self,
            user_id: i64,
            exam: ExamKind,
            skill: &str,
            limit: i64,
        ) -> Result<Vec<Attempt>, examprep::store::StoreError> {
            self.0.recent_attempts(user_id, exam, skill, limit).await
        }
        async fn apply_progress(
            &self,
            _user_id: i64,
            _exam: ExamKind,
            _skill: &str,
            _delta: &ProgressDelta,
        ) -> Result<examprep::models::progress::Progress, examprep::store::StoreError> {
            Err(examprep::store::StoreError::Database(
                "progress table offline".to_string(),
            ))
        }
        async fn progress_for(
            &self,
            user_id: i64,
            exam: ExamKind,
            skill: Option<&str>,
        ) -> Result<Vec<examprep::models::progress::Progress>, examprep::store::StoreError> {
            self.0.progress_for(user_id, exam, skill).await
        }
        async fn insert_user(
            &self,
            username: &str,
            password_hash: &str,
            role: &str,
        ) -> Result<examprep::models::user::User, examprep::store::StoreError> {
            self.0.insert_user(username, password_hash, role).await
        }
        async fn find_user(
            &self,
            username: &str,
        ) -> Result<Option<examprep::models::user::User>, examprep::store::StoreError> {
            self.0.find_user(username).await
        }
    }

    let store: Arc<dyn PracticeStore> = Arc::new(FailingStore(MemoryStore::new()));
    let registry = ExamServiceRegistry::new(
        store,
        Arc::new(RubricOracle),
        None,
        Duration::from_secs(5),
    );
    let service = registry.service(ExamKind::Yds);

    let question = mcq(ExamKind::Yds, "grammar", Difficulty::Easy, "B");
    let evaluation = Evaluation {
        is_correct: Some(true),
        score: 1.0,
        raw_score: 1.0,
        feedback: String::new(),
        suggestions: String::new(),
        criteria_scores: None,
    };

    // Must not panic or propagate: the submission itself survives.
    service.aggregator.update(1, &question, &evaluation).await;
}

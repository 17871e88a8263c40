// src/models/question.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::exam::ExamKind;

/// Question difficulty. Adaptive selection steps through these one level
/// at a time, clamped at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn step_up(self) -> Difficulty {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium | Difficulty::Hard => Difficulty::Hard,
        }
    }

    pub fn step_down(self) -> Difficulty {
        match self {
            Difficulty::Hard => Difficulty::Medium,
            Difficulty::Medium | Difficulty::Easy => Difficulty::Easy,
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

/// One item of a multi-part question (reading passage or listening script).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQuestion {
    pub prompt: String,
    /// Empty for open (fill-in) sub-questions.
    #[serde(default)]
    pub options: Vec<String>,
    pub correct: String,
}

/// Typed question content, one variant per question kind. Generated
/// passages and scripts live here instead of a free-form metadata blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionContent {
    MultipleChoice {
        prompt: String,
        options: Vec<String>,
    },
    TrueFalse {
        statement: String,
    },
    FillBlank {
        text: String,
    },
    Matching {
        prompt: String,
        left: Vec<String>,
        right: Vec<String>,
    },
    Ordering {
        prompt: String,
        items: Vec<String>,
    },
    Essay {
        prompt: String,
    },
    Speaking {
        prompt: String,
    },
    Reading {
        passage: String,
        sub_questions: Vec<SubQuestion>,
    },
    Listening {
        audio_script: String,
        sub_questions: Vec<SubQuestion>,
    },
}

impl QuestionContent {
    pub fn kind(&self) -> &'static str {
        match self {
            QuestionContent::MultipleChoice { .. } => "multiple_choice",
            QuestionContent::TrueFalse { .. } => "true_false",
            QuestionContent::FillBlank { .. } => "fill_blank",
            QuestionContent::Matching { .. } => "matching",
            QuestionContent::Ordering { .. } => "ordering",
            QuestionContent::Essay { .. } => "essay",
            QuestionContent::Speaking { .. } => "speaking",
            QuestionContent::Reading { .. } => "reading",
            QuestionContent::Listening { .. } => "listening",
        }
    }

    /// Sub-questions of a multi-part kind, `None` for single-part kinds.
    pub fn sub_questions(&self) -> Option<&[SubQuestion]> {
        match self {
            QuestionContent::Reading { sub_questions, .. }
            | QuestionContent::Listening { sub_questions, .. } => Some(sub_questions),
            _ => None,
        }
    }

    /// The text shown to the examinee, used as task description when
    /// delegating to the scoring oracle.
    pub fn prompt_text(&self) -> &str {
        match self {
            QuestionContent::MultipleChoice { prompt, .. }
            | QuestionContent::Matching { prompt, .. }
            | QuestionContent::Ordering { prompt, .. }
            | QuestionContent::Essay { prompt }
            | QuestionContent::Speaking { prompt } => prompt,
            QuestionContent::TrueFalse { statement } => statement,
            QuestionContent::FillBlank { text } => text,
            QuestionContent::Reading { passage, .. } => passage,
            QuestionContent::Listening { audio_script, .. } => audio_script,
        }
    }
}

/// A practice question. Immutable once attempted; synthesized questions
/// are persisted under a fresh id and carry the same shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub exam: ExamKind,
    pub skill: String,
    pub difficulty: Difficulty,
    pub content: QuestionContent,
    /// Expected answer for objective single-part kinds.
    pub correct_answer: Option<String>,
    pub points: f64,
    pub time_limit_secs: i64,
    pub created_at: DateTime<Utc>,
}

impl Question {
    pub fn kind(&self) -> &'static str {
        self.content.kind()
    }
}

/// Sub-question view without the expected answer.
#[derive(Debug, Serialize)]
pub struct PublicSubQuestion {
    pub prompt: String,
    pub options: Vec<String>,
}

/// Content view without any answer keys.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PublicContent {
    MultipleChoice {
        prompt: String,
        options: Vec<String>,
    },
    TrueFalse {
        statement: String,
    },
    FillBlank {
        text: String,
    },
    Matching {
        prompt: String,
        left: Vec<String>,
        right: Vec<String>,
    },
    Ordering {
        prompt: String,
        items: Vec<String>,
    },
    Essay {
        prompt: String,
    },
    Speaking {
        prompt: String,
    },
    Reading {
        passage: String,
        sub_questions: Vec<PublicSubQuestion>,
    },
    Listening {
        audio_script: String,
        sub_questions: Vec<PublicSubQuestion>,
    },
}

/// DTO for sending a question to the client (excludes correct answers).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    pub exam: ExamKind,
    pub skill: String,
    pub difficulty: Difficulty,
    pub content: PublicContent,
    pub time_limit_secs: i64,
    pub points: f64,
}

fn strip_subs(subs: &[SubQuestion]) -> Vec<PublicSubQuestion> {
    subs.iter()
        .map(|s| PublicSubQuestion {
            prompt: s.prompt.clone(),
            options: s.options.clone(),
        })
        .collect()
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        let content = match &q.content {
            QuestionContent::MultipleChoice { prompt, options } => PublicContent::MultipleChoice {
                prompt: prompt.clone(),
                options: options.clone(),
            },
            QuestionContent::TrueFalse { statement } => PublicContent::TrueFalse {
                statement: statement.clone(),
            },
            QuestionContent::FillBlank { text } => PublicContent::FillBlank { text: text.clone() },
            QuestionContent::Matching {
                prompt,
                left,
                right,
            } => PublicContent::Matching {
                prompt: prompt.clone(),
                left: left.clone(),
                right: right.clone(),
            },
            QuestionContent::Ordering { prompt, items } => PublicContent::Ordering {
                prompt: prompt.clone(),
                items: items.clone(),
            },
            QuestionContent::Essay { prompt } => PublicContent::Essay {
                prompt: prompt.clone(),
            },
            QuestionContent::Speaking { prompt } => PublicContent::Speaking {
                prompt: prompt.clone(),
            },
            QuestionContent::Reading {
                passage,
                sub_questions,
            } => PublicContent::Reading {
                passage: passage.clone(),
                sub_questions: strip_subs(sub_questions),
            },
            QuestionContent::Listening {
                audio_script,
                sub_questions,
            } => PublicContent::Listening {
                audio_script: audio_script.clone(),
                sub_questions: strip_subs(sub_questions),
            },
        };

        PublicQuestion {
            id: q.id.clone(),
            exam: q.exam,
            skill: q.skill.clone(),
            difficulty: q.difficulty,
            content,
            time_limit_secs: q.time_limit_secs,
            points: q.points,
        }
    }
}

/// DTO for creating a new question through the admin API.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    pub exam: ExamKind,
    #[validate(length(min = 1, max = 40))]
    pub skill: String,
    pub difficulty: Difficulty,
    #[validate(custom(function = validate_content))]
    pub content: QuestionContent,
    #[validate(length(max = 500))]
    pub correct_answer: Option<String>,
    pub points: Option<f64>,
    pub time_limit_secs: Option<i64>,
}

fn validate_content(content: &QuestionContent) -> Result<(), validator::ValidationError> {
    match content {
        QuestionContent::MultipleChoice { options, .. } => {
            if options.len() < 2 {
                return Err(validator::ValidationError::new("too_few_options"));
            }
        }
        QuestionContent::Reading { sub_questions, .. }
        | QuestionContent::Listening { sub_questions, .. } => {
            if sub_questions.is_empty() {
                return Err(validator::ValidationError::new("no_sub_questions"));
            }
            if sub_questions.iter().any(|s| s.correct.trim().is_empty()) {
                return Err(validator::ValidationError::new("sub_question_missing_answer"));
            }
        }
        QuestionContent::Matching { left, right, .. } => {
            if left.is_empty() || left.len() != right.len() {
                return Err(validator::ValidationError::new("unbalanced_matching_sides"));
            }
        }
        QuestionContent::Ordering { items, .. } => {
            if items.len() < 2 {
                return Err(validator::ValidationError::new("too_few_items"));
            }
        }
        _ => {}
    }
    Ok(())
}

// src/engine/profiles/toefl.rs

use crate::engine::profiles::{
    ExamProfile, FeedbackBands, Rounding, Scale, SkillDef, SkillKind, Synthesized, pick_seeded,
};
use crate::models::exam::ExamKind;
use crate::models::question::{Difficulty, QuestionContent, SubQuestion};

pub fn profile() -> &'static ExamProfile {
    &PROFILE
}

// Overall is the sum of four 0-30 section scores; skills are scored on
// the section scale.
static PROFILE: ExamProfile = ExamProfile {
    exam: ExamKind::Toefl,
    name: "TOEFL",
    scale: Scale {
        min: 0.0,
        max: 120.0,
        increment: 1.0,
        passing: 80.0,
    },
    rounding: Rounding::Integer,
    skills: SKILLS,
    section_table: Some(SECTION_TABLE),
    bands: FeedbackBands {
        excellent: "Excellent work. This response is in the advanced score range.",
        good: "Good response, within the high-intermediate range. Keep refining the details.",
        needs_work: "This response falls below the intermediate range and needs more practice.",
    },
    synthesize,
};

static SKILLS: &[SkillDef] = &[
    SkillDef {
        code: "reading",
        name: "Reading",
        max_score: 30.0,
        kind: SkillKind::Objective,
        min_words: 0,
        criteria: &[],
        weight: 1.0,
        suggestion: "Work on paraphrase recognition: the correct option almost never reuses the passage's wording.",
        active: true,
    },
    SkillDef {
        code: "listening",
        name: "Listening",
        max_score: 30.0,
        kind: SkillKind::Objective,
        min_words: 0,
        criteria: &[],
        weight: 1.0,
        suggestion: "Take structured notes: speaker, main point, and one detail per exchange.",
        active: true,
    },
    SkillDef {
        code: "speaking",
        name: "Speaking",
        max_score: 30.0,
        kind: SkillKind::AiDelegated,
        min_words: 25,
        criteria: &["Delivery", "Language Use", "Topic Development"],
        weight: 1.0,
        suggestion: "Use the full response time and follow a template: position, reason, example, wrap-up.",
        active: true,
    },
    SkillDef {
        code: "writing",
        name: "Writing",
        max_score: 30.0,
        kind: SkillKind::AiDelegated,
        min_words: 150,
        criteria: &["Development", "Organization", "Language Use"],
        weight: 1.0,
        suggestion: "State your thesis in the first paragraph and tie every body paragraph back to it.",
        active: true,
    },
];

/// Fraction correct to section score (0-30).
static SECTION_TABLE: &[(f64, f64)] = &[
    (0.90, 30.0),
    (0.85, 29.0),
    (0.80, 28.0),
    (0.75, 26.0),
    (0.70, 25.0),
    (0.65, 23.0),
    (0.60, 22.0),
    (0.55, 20.0),
    (0.50, 18.0),
    (0.45, 16.0),
    (0.40, 14.0),
    (0.35, 12.0),
    (0.30, 9.0),
    (0.25, 7.0),
    (0.20, 5.0),
    (0.10, 3.0),
    (0.00, 0.0),
];

struct PassageSeed {
    difficulty: Difficulty,
    passage: &'static str,
    items: &'static [(&'static str, &'static [&'static str], &'static str)],
}

static READING_POOL: &[PassageSeed] = &[
    PassageSeed {
        difficulty: Difficulty::Easy,
        passage: "Glass frogs, found in the rainforests of Central and South America, have \
                  translucent skin on their undersides through which their organs are \
                  visible. Recent research shows the frogs become more transparent while \
                  asleep by withdrawing red blood cells into their livers.",
        items: &[
            (
                "How do glass frogs increase their transparency while asleep?",
                &[
                    "By flattening their bodies",
                    "By withdrawing red blood cells into their livers",
                    "By changing skin pigment",
                ],
                "By withdrawing red blood cells into their livers",
            ),
            (
                "Where are glass frogs found?",
                &[
                    "Central and South America",
                    "Southeast Asia",
                    "Madagascar",
                ],
                "Central and South America",
            ),
        ],
    },
    PassageSeed {
        difficulty: Difficulty::Hard,
        passage: "The notion that the medieval economy was static has not survived closer \
                  scrutiny. Tax rolls and port records indicate that long-distance trade \
                  in wool and wine expanded almost continuously between the eleventh and \
                  thirteenth centuries, interrupted less by institutional stagnation than \
                  by episodic shocks such as harvest failure and war.",
        items: &[
            (
                "The author argues that interruptions to medieval trade were mainly caused by",
                &[
                    "institutional stagnation",
                    "episodic shocks",
                    "declining demand",
                ],
                "episodic shocks",
            ),
            (
                "Which goods does the passage name in long-distance trade?",
                &["wool and wine", "silk and spices", "timber and grain"],
                "wool and wine",
            ),
        ],
    },
];

static LISTENING_POOL: &[PassageSeed] = &[PassageSeed {
    difficulty: Difficulty::Medium,
    passage: "Professor: So the registrar moved the deadline for dropping a course to \
              Friday the fifteenth. If you drop before then, nothing appears on your \
              transcript; after that you'll see a W. A W doesn't affect your grade \
              point average, but some graduate programs do ask about them.",
    items: &[
        (
            "What happens if a student drops a course after the fifteenth?",
            &[
                "The course is deleted from the transcript",
                "A W appears on the transcript",
                "Their grade point average drops",
            ],
            "A W appears on the transcript",
        ),
        (
            "Does a W affect the grade point average?",
            &["yes", "no"],
            "no",
        ),
    ],
}];

struct PromptSeed {
    difficulty: Difficulty,
    prompt: &'static str,
}

static WRITING_POOL: &[PromptSeed] = &[
    PromptSeed {
        difficulty: Difficulty::Easy,
        prompt: "Do you agree or disagree with the following statement? It is better to \
                 work in a team than to work alone. Use specific reasons and examples to \
                 support your answer.",
    },
    PromptSeed {
        difficulty: Difficulty::Medium,
        prompt: "Some universities require first-year students to live on campus. Others \
                 allow them to choose. Which policy do you think is better for students, \
                 and why?",
    },
];

static SPEAKING_POOL: &[PromptSeed] = &[
    PromptSeed {
        difficulty: Difficulty::Easy,
        prompt: "Talk about a book that influenced you. Explain what it is about and why \
                 it influenced you.",
    },
    PromptSeed {
        difficulty: Difficulty::Medium,
        prompt: "Some people think students learn more effectively in the morning; others \
                 say the evening suits them better. Which do you prefer and why?",
    },
];

fn build_subs(items: &[(&str, &[&str], &str)]) -> Vec<SubQuestion> {
    items
        .iter()
        .map(|(prompt, options, correct)| SubQuestion {
            prompt: (*prompt).to_string(),
            options: options.iter().map(|o| (*o).to_string()).collect(),
            correct: (*correct).to_string(),
        })
        .collect()
}

fn synthesize(skill: &str, difficulty: Difficulty, seed: usize) -> Option<Synthesized> {
    match skill {
        "reading" => {
            let entry = pick_seeded(READING_POOL, seed, |p| p.difficulty == difficulty)?;
            let sub_questions = build_subs(entry.items);
            Some(Synthesized {
                points: sub_questions.len() as f64,
                content: QuestionContent::Reading {
                    passage: entry.passage.to_string(),
                    sub_questions,
                },
                correct_answer: None,
                time_limit_secs: 1080,
            })
        }
        "listening" => {
            let entry = pick_seeded(LISTENING_POOL, seed, |p| p.difficulty == difficulty)?;
            let sub_questions = build_subs(entry.items);
            Some(Synthesized {
                points: sub_questions.len() as f64,
                content: QuestionContent::Listening {
                    audio_script: entry.passage.to_string(),
                    sub_questions,
                },
                correct_answer: None,
                time_limit_secs: 600,
            })
        }
        "writing" => {
            let entry = pick_seeded(WRITING_POOL, seed, |p| p.difficulty == difficulty)?;
            Some(Synthesized {
                content: QuestionContent::Essay {
                    prompt: entry.prompt.to_string(),
                },
                correct_answer: None,
                points: 30.0,
                time_limit_secs: 1800,
            })
        }
        "speaking" => {
            let entry = pick_seeded(SPEAKING_POOL, seed, |p| p.difficulty == difficulty)?;
            Some(Synthesized {
                content: QuestionContent::Speaking {
                    prompt: entry.prompt.to_string(),
                },
                correct_answer: None,
                points: 30.0,
                time_limit_secs: 240,
            })
        }
        _ => None,
    }
}

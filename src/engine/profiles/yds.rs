// src/engine/profiles/yds.rs

use crate::engine::profiles::{
    ExamProfile, FeedbackBands, Rounding, Scale, SkillDef, SkillKind, Synthesized, pick_seeded,
};
use crate::models::exam::ExamKind;
use crate::models::question::{Difficulty, QuestionContent, SubQuestion};

pub fn profile() -> &'static ExamProfile {
    &PROFILE
}

// Fully objective exam; section scores are plain percentages and the
// overall is a weighted composite over the skill weights below.
static PROFILE: ExamProfile = ExamProfile {
    exam: ExamKind::Yds,
    name: "YDS",
    scale: Scale {
        min: 0.0,
        max: 100.0,
        increment: 1.0,
        passing: 60.0,
    },
    rounding: Rounding::Integer,
    skills: SKILLS,
    section_table: None,
    bands: FeedbackBands {
        excellent: "Excellent work. You are scoring well above the passing threshold.",
        good: "Good result, above the passing threshold. Consistency will push it higher.",
        needs_work: "This result is below the passing threshold and needs more practice.",
    },
    synthesize,
};

static SKILLS: &[SkillDef] = &[
    SkillDef {
        code: "reading",
        name: "Reading",
        max_score: 100.0,
        kind: SkillKind::Objective,
        min_words: 0,
        criteria: &[],
        weight: 0.40,
        suggestion: "Practise long academic passages under time pressure; YDS rewards reading stamina.",
        active: true,
    },
    SkillDef {
        code: "listening",
        name: "Listening",
        max_score: 100.0,
        kind: SkillKind::Objective,
        min_words: 0,
        criteria: &[],
        weight: 0.20,
        suggestion: "Listen to academic lectures and note the signposting phrases that introduce each point.",
        active: true,
    },
    SkillDef {
        code: "grammar",
        name: "Grammar",
        max_score: 100.0,
        kind: SkillKind::Objective,
        min_words: 0,
        criteria: &[],
        weight: 0.25,
        suggestion: "Review tense sequencing and conjunctions; most YDS grammar items test clause linking.",
        active: true,
    },
    SkillDef {
        code: "vocabulary",
        name: "Vocabulary",
        max_score: 100.0,
        kind: SkillKind::Objective,
        min_words: 0,
        criteria: &[],
        weight: 0.15,
        suggestion: "Study academic collocations rather than isolated words; options often differ only in collocation.",
        active: true,
    },
];

struct McqSeed {
    difficulty: Difficulty,
    prompt: &'static str,
    options: &'static [&'static str],
    correct: &'static str,
}

static GRAMMAR_POOL: &[McqSeed] = &[
    McqSeed {
        difficulty: Difficulty::Easy,
        prompt: "By the time the inspectors arrived, the factory ---- production for the day.",
        options: &[
            "had already halted",
            "has already halted",
            "already halts",
            "is already halting",
        ],
        correct: "had already halted",
    },
    McqSeed {
        difficulty: Difficulty::Medium,
        prompt: "---- the committee approves the budget, construction will begin in March.",
        options: &["Provided that", "In spite of", "So as to", "Rather than"],
        correct: "Provided that",
    },
    McqSeed {
        difficulty: Difficulty::Hard,
        prompt: "Not until the final report was published ---- the scale of the problem.",
        options: &[
            "did the public grasp",
            "the public grasped",
            "the public did grasp",
            "had grasped the public",
        ],
        correct: "did the public grasp",
    },
];

static VOCABULARY_POOL: &[McqSeed] = &[
    McqSeed {
        difficulty: Difficulty::Easy,
        prompt: "The new regulations are intended to ---- the risk of workplace accidents.",
        options: &["mitigate", "fabricate", "prolong", "endorse"],
        correct: "mitigate",
    },
    McqSeed {
        difficulty: Difficulty::Medium,
        prompt: "Her argument was so ---- that even her fiercest critics conceded the point.",
        options: &["compelling", "negligible", "redundant", "tentative"],
        correct: "compelling",
    },
    McqSeed {
        difficulty: Difficulty::Hard,
        prompt: "The treaty's deliberately ---- wording allowed each side to claim victory.",
        options: &["ambiguous", "meticulous", "transparent", "emphatic"],
        correct: "ambiguous",
    },
];

struct PassageSeed {
    difficulty: Difficulty,
    passage: &'static str,
    items: &'static [(&'static str, &'static [&'static str], &'static str)],
}

static READING_POOL: &[PassageSeed] = &[PassageSeed {
    difficulty: Difficulty::Medium,
    passage: "Although the printing press is usually credited with democratising \
              knowledge, its earliest commercial successes were not scholarly works but \
              indulgences and calendars, printed in bulk for institutional clients. The \
              scholarly market matured only decades later, once distribution networks \
              could support speculative print runs.",
    items: &[
        (
            "What were the press's earliest commercial successes?",
            &[
                "scholarly works",
                "indulgences and calendars",
                "newspapers",
            ],
            "indulgences and calendars",
        ),
        (
            "According to the passage, what did the scholarly market depend on?",
            &[
                "state subsidies",
                "distribution networks",
                "university censorship",
            ],
            "distribution networks",
        ),
    ],
}];

static LISTENING_POOL: &[PassageSeed] = &[PassageSeed {
    difficulty: Difficulty::Easy,
    passage: "Announcer: The intercity express to Ankara will depart from platform four \
              at nine fifteen, ten minutes later than scheduled, owing to signal works \
              outside the station. Passengers with reserved seats should board the rear \
              carriages first.",
    items: &[
        (
            "From which platform does the express depart?",
            &["three", "four", "five"],
            "four",
        ),
        (
            "Why is the train delayed?",
            &["signal works", "bad weather", "a staff shortage"],
            "signal works",
        ),
    ],
}];

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

fn mcq(entry: &McqSeed) -> Synthesized {
    Synthesized {
        content: QuestionContent::MultipleChoice {
            prompt: entry.prompt.to_string(),
            options: entry.options.iter().map(|o| (*o).to_string()).collect(),
        },
        correct_answer: Some(entry.correct.to_string()),
        points: 1.0,
        time_limit_secs: 90,
    }
}

fn synthesize(skill: &str, difficulty: Difficulty, seed: usize) -> Option<Synthesized> {
    match skill {
        "grammar" => {
            pick_seeded(GRAMMAR_POOL, seed, |m| m.difficulty == difficulty).map(mcq)
        }
        "vocabulary" => {
            pick_seeded(VOCABULARY_POOL, seed, |m| m.difficulty == difficulty).map(mcq)
        }
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
                time_limit_secs: 900,
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
                time_limit_secs: 480,
            })
        }
        _ => None,
    }
}

// src/engine/profiles/ielts.rs

use crate::engine::profiles::{
    ExamProfile, FeedbackBands, Rounding, Scale, SkillDef, SkillKind, Synthesized, pick_seeded,
};
use crate::models::exam::ExamKind;
use crate::models::question::{Difficulty, QuestionContent, SubQuestion};

pub fn profile() -> &'static ExamProfile {
    &PROFILE
}

static PROFILE: ExamProfile = ExamProfile {
    exam: ExamKind::Ielts,
    name: "IELTS",
    scale: Scale {
        min: 0.0,
        max: 9.0,
        increment: 0.5,
        passing: 6.0,
    },
    rounding: Rounding::HalfBand,
    skills: SKILLS,
    section_table: Some(SECTION_TABLE),
    bands: FeedbackBands {
        excellent: "Excellent work. Your response shows the control expected of a high band score.",
        good: "Good response. You are performing at a solid band level with room to refine.",
        needs_work: "This response needs improvement to reach a passing band.",
    },
    synthesize,
};

static SKILLS: &[SkillDef] = &[
    SkillDef {
        code: "reading",
        name: "Reading",
        max_score: 9.0,
        kind: SkillKind::Objective,
        min_words: 0,
        criteria: &[],
        weight: 1.0,
        suggestion: "Skim each passage for its main idea first, then scan for the keywords the questions use.",
        active: true,
    },
    SkillDef {
        code: "listening",
        name: "Listening",
        max_score: 9.0,
        kind: SkillKind::Objective,
        min_words: 0,
        criteria: &[],
        weight: 1.0,
        suggestion: "Read the questions before the recording starts and listen for paraphrases, not exact words.",
        active: true,
    },
    SkillDef {
        code: "writing",
        name: "Writing",
        max_score: 9.0,
        kind: SkillKind::AiDelegated,
        min_words: 150,
        criteria: &[
            "Task Achievement",
            "Coherence and Cohesion",
            "Lexical Resource",
            "Grammatical Range and Accuracy",
        ],
        weight: 1.0,
        suggestion: "Plan your essay before writing: one clear position, one idea per paragraph, and linking words between them.",
        active: true,
    },
    SkillDef {
        code: "speaking",
        name: "Speaking",
        max_score: 9.0,
        kind: SkillKind::AiDelegated,
        min_words: 30,
        criteria: &[
            "Fluency and Coherence",
            "Lexical Resource",
            "Grammatical Range and Accuracy",
            "Pronunciation",
        ],
        weight: 1.0,
        suggestion: "Extend your answers: give a reason and an example instead of a single sentence.",
        active: true,
    },
];

/// Fraction correct to band score. Breakpoints follow the published
/// raw-to-band conversion; below 25% the band floors at 2.0.
static SECTION_TABLE: &[(f64, f64)] = &[
    (0.90, 9.0),
    (0.85, 8.5),
    (0.80, 8.0),
    (0.75, 7.5),
    (0.70, 7.0),
    (0.65, 6.5),
    (0.60, 6.0),
    (0.55, 5.5),
    (0.50, 5.0),
    (0.45, 4.5),
    (0.40, 4.0),
    (0.35, 3.5),
    (0.30, 3.0),
    (0.25, 2.5),
    (0.00, 2.0),
];

// ---------------------------------------------------------------------------
// Content pools for synthesized questions
// ---------------------------------------------------------------------------

struct PassageSeed {
    difficulty: Difficulty,
    passage: &'static str,
    items: &'static [(&'static str, &'static [&'static str], &'static str)],
}

static READING_POOL: &[PassageSeed] = &[
    PassageSeed {
        difficulty: Difficulty::Easy,
        passage: "Urban beekeeping has grown rapidly over the last decade. City rooftops \
                  offer bees a surprising variety of flowering plants, and hives in towns \
                  often produce more honey than rural ones because parks and gardens bloom \
                  for a longer season.",
        items: &[
            (
                "According to the passage, why can urban hives outproduce rural ones?",
                &[
                    "City bees are larger",
                    "Urban plants bloom for a longer season",
                    "Rural hives are poorly managed",
                ],
                "Urban plants bloom for a longer season",
            ),
            (
                "The passage states that urban beekeeping has declined recently. True or false?",
                &["true", "false"],
                "false",
            ),
        ],
    },
    PassageSeed {
        difficulty: Difficulty::Medium,
        passage: "The Antikythera mechanism, recovered from a Roman-era shipwreck in 1901, \
                  is widely regarded as the earliest known analogue computer. Its bronze \
                  gearwheels modelled the irregular orbit of the Moon, a refinement that \
                  would not reappear in European clockwork for well over a millennium.",
        items: &[
            (
                "What does the author emphasise about the mechanism's lunar modelling?",
                &[
                    "It was less accurate than later clocks",
                    "It anticipated European clockwork by centuries",
                    "It was recovered in fragments",
                ],
                "It anticipated European clockwork by centuries",
            ),
            (
                "In which year was the mechanism recovered?",
                &[],
                "1901",
            ),
        ],
    },
    PassageSeed {
        difficulty: Difficulty::Hard,
        passage: "Critics of carbon offsetting argue that the practice risks becoming an \
                  accounting exercise rather than a genuine abatement strategy: credits are \
                  frequently issued against counterfactual baselines that are, by \
                  construction, unverifiable, and the permanence of sequestered carbon is \
                  rarely guaranteed beyond a few decades.",
        items: &[
            (
                "The author's main criticism of offset baselines is that they are",
                &["too strict", "unverifiable", "too expensive"],
                "unverifiable",
            ),
            (
                "The passage claims sequestration permanence is usually guaranteed for centuries. True or false?",
                &["true", "false"],
                "false",
            ),
        ],
    },
];

static LISTENING_POOL: &[PassageSeed] = &[
    PassageSeed {
        difficulty: Difficulty::Easy,
        passage: "Good morning everyone. The museum tour starts at ten thirty, not ten \
                  o'clock as printed in some leaflets. We will begin in the Egyptian \
                  gallery on the ground floor and finish in the café, where tour members \
                  receive a ten percent discount.",
        items: &[
            (
                "What time does the tour actually start?",
                &["10:00", "10:30", "11:00"],
                "10:30",
            ),
            (
                "Where does the tour begin?",
                &["the café", "the Egyptian gallery", "the gift shop"],
                "the Egyptian gallery",
            ),
        ],
    },
    PassageSeed {
        difficulty: Difficulty::Medium,
        passage: "Before you start the experiment, make sure the water bath has reached \
                  thirty-seven degrees. Label both flasks, add the buffer to the second \
                  one only, and record the starting time in your lab notebook, because the \
                  reaction must be stopped after exactly twelve minutes.",
        items: &[
            (
                "Which flask receives the buffer?",
                &["the first", "the second", "both"],
                "the second",
            ),
            (
                "After how many minutes must the reaction be stopped?",
                &[],
                "twelve",
            ),
        ],
    },
];

struct PromptSeed {
    difficulty: Difficulty,
    prompt: &'static str,
}

static WRITING_POOL: &[PromptSeed] = &[
    PromptSeed {
        difficulty: Difficulty::Easy,
        prompt: "Some people prefer to live in a big city, while others would rather live \
                 in a small town. Discuss both views and give your own opinion.",
    },
    PromptSeed {
        difficulty: Difficulty::Medium,
        prompt: "In many countries, the average age of the population is increasing. Do \
                 the advantages of this trend outweigh the disadvantages?",
    },
    PromptSeed {
        difficulty: Difficulty::Hard,
        prompt: "Some argue that governments should fund the arts only when money remains \
                 after essential services are paid for; others see cultural funding as \
                 itself essential. To what extent do you agree or disagree?",
    },
];

static SPEAKING_POOL: &[PromptSeed] = &[
    PromptSeed {
        difficulty: Difficulty::Easy,
        prompt: "Describe a place you like to visit at the weekend. You should say where \
                 it is, what you do there, and explain why you enjoy it.",
    },
    PromptSeed {
        difficulty: Difficulty::Medium,
        prompt: "Describe a skill that took you a long time to learn. You should say what \
                 it is, how you learned it, and explain why it was difficult.",
    },
    PromptSeed {
        difficulty: Difficulty::Hard,
        prompt: "Some people believe fame brings more problems than benefits. How has the \
                 nature of celebrity changed in your lifetime, and is the change for the \
                 better?",
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
                time_limit_secs: 1200,
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
                points: 9.0,
                time_limit_secs: 2400,
            })
        }
        "speaking" => {
            let entry = pick_seeded(SPEAKING_POOL, seed, |p| p.difficulty == difficulty)?;
            Some(Synthesized {
                content: QuestionContent::Speaking {
                    prompt: entry.prompt.to_string(),
                },
                correct_answer: None,
                points: 9.0,
                time_limit_secs: 300,
            })
        }
        _ => None,
    }
}

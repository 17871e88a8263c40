// src/engine/profiles/mod.rs

pub mod ielts;
pub mod toefl;
pub mod yds;

use crate::models::exam::ExamKind;
use crate::models::question::{Difficulty, QuestionContent};

/// How answers for a skill are graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillKind {
    /// Exact-match grading against a stored correct answer.
    Objective,
    /// Delegated to the scoring oracle (essay, speaking).
    AiDelegated,
}

/// One testable competency within an exam.
#[derive(Debug)]
pub struct SkillDef {
    pub code: &'static str,
    pub name: &'static str,
    pub max_score: f64,
    pub kind: SkillKind,
    /// Minimum answer length before delegation; 0 for objective skills.
    pub min_words: usize,
    /// Rubric criteria scored by the oracle; empty for objective skills.
    pub criteria: &'static [&'static str],
    /// Weight in the exam's composite score. Equal weights everywhere
    /// except YDS, which uses the fixed exam-board split.
    pub weight: f64,
    /// Fixed improvement suggestion shown with mid/low-tier results.
    pub suggestion: &'static str,
    pub active: bool,
}

/// The exam's reporting scale.
#[derive(Debug)]
pub struct Scale {
    pub min: f64,
    pub max: f64,
    pub increment: f64,
    pub passing: f64,
}

/// Rounding convention for oracle-derived scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Nearest 0.5, half-up (IELTS bands).
    HalfBand,
    /// Nearest integer, half-up (TOEFL, YDS).
    Integer,
}

/// Tier messages for synthesized feedback when the oracle supplies none.
#[derive(Debug)]
pub struct FeedbackBands {
    pub excellent: &'static str,
    pub good: &'static str,
    pub needs_work: &'static str,
}

/// Output of a profile's question generator.
pub struct Synthesized {
    pub content: QuestionContent,
    pub correct_answer: Option<String>,
    pub points: f64,
    pub time_limit_secs: i64,
}

/// Static per-exam configuration: one instance per `ExamKind`, consulted
/// by the selector, evaluator and converter. Per-exam behaviour is data
/// here, not subclasses.
pub struct ExamProfile {
    pub exam: ExamKind,
    pub name: &'static str,
    pub scale: Scale,
    pub rounding: Rounding,
    pub skills: &'static [SkillDef],
    /// Fraction-correct to section-score table for objective multi-part
    /// sets; `None` means plain percentage (YDS).
    pub section_table: Option<&'static [(f64, f64)]>,
    pub bands: FeedbackBands,
    /// Skill-specific question synthesis from this exam's content pools.
    pub synthesize: fn(&str, Difficulty, usize) -> Option<Synthesized>,
}

impl ExamProfile {
    pub fn skill(&self, code: &str) -> Option<&'static SkillDef> {
        self.skills.iter().find(|s| s.code == code)
    }

    pub fn passing_fraction(&self) -> f64 {
        self.scale.passing / self.scale.max
    }

    /// Rubric description handed to the scoring oracle.
    pub fn rubric_for(&self, skill: &SkillDef) -> String {
        format!(
            "Score this {} {} response on a {}-{} scale for each criterion: {}.",
            self.name,
            skill.name,
            self.scale.min,
            skill.max_score,
            skill.criteria.join(", ")
        )
    }
}

pub fn for_exam(exam: ExamKind) -> &'static ExamProfile {
    match exam {
        ExamKind::Ielts => ielts::profile(),
        ExamKind::Toefl => toefl::profile(),
        ExamKind::Yds => yds::profile(),
    }
}

pub fn all() -> [&'static ExamProfile; 3] {
    [ielts::profile(), toefl::profile(), yds::profile()]
}

/// Deterministic pool pick: entries matching the requested difficulty
/// first, the whole pool as fallback, indexed by the caller's seed.
pub(crate) fn pick_seeded<'a, T>(
    pool: &'a [T],
    seed: usize,
    matches: impl Fn(&T) -> bool,
) -> Option<&'a T> {
    let matching: Vec<&T> = pool.iter().filter(|t| matches(t)).collect();
    if !matching.is_empty() {
        return Some(matching[seed % matching.len()]);
    }
    if pool.is_empty() {
        None
    } else {
        Some(&pool[seed % pool.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_profile_has_active_skills_and_consistent_scale() {
        for profile in all() {
            assert!(!profile.skills.is_empty());
            for skill in profile.skills {
                assert!(skill.max_score > 0.0);
                if skill.kind == SkillKind::AiDelegated {
                    assert!(!skill.criteria.is_empty(), "{} needs criteria", skill.code);
                    assert!(skill.min_words > 0);
                }
            }
            assert!(profile.scale.min < profile.scale.max);
            assert!(profile.scale.passing <= profile.scale.max);
        }
    }

    #[test]
    fn section_tables_are_monotonic() {
        for profile in all() {
            let Some(table) = profile.section_table else {
                continue;
            };
            for pair in table.windows(2) {
                assert!(pair[0].0 > pair[1].0, "thresholds must descend");
                assert!(pair[0].1 >= pair[1].1, "scores must not increase");
            }
        }
    }

    #[test]
    fn skill_lookup_finds_known_codes_only() {
        let profile = for_exam(ExamKind::Ielts);
        assert!(profile.skill("reading").is_some());
        assert!(profile.skill("grammar").is_none());
    }
}

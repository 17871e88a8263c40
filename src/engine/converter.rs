// src/engine/converter.rs
//
// Pure scoring conversions: raw correctness to the exam's reporting
// scale, and per-skill averages to the exam's overall score.

use crate::engine::profiles::{ExamProfile, Rounding};
use crate::models::exam::ExamKind;
use crate::models::progress::Progress;

/// Half-up rounding to the nearest integer (2.5 -> 3.0), as the exam
/// boards round. Not banker's rounding.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Half-up rounding to the nearest 0.5 (6.25 -> 6.5), the IELTS band
/// convention.
pub fn round_to_half(value: f64) -> f64 {
    (value * 2.0 + 0.5).floor() / 2.0
}

pub fn apply_rounding(rounding: Rounding, value: f64) -> f64 {
    match rounding {
        Rounding::HalfBand => round_to_half(value),
        Rounding::Integer => round_half_up(value),
    }
}

/// First entry whose threshold the fraction reaches wins; tables are
/// ordered by descending threshold and end at 0.0.
pub fn step_lookup(table: &[(f64, f64)], fraction: f64) -> f64 {
    for (threshold, score) in table {
        if fraction >= *threshold {
            return *score;
        }
    }
    table.last().map(|(_, score)| *score).unwrap_or(0.0)
}

/// Converts a raw correct count into the exam's section scale.
pub fn to_scale(profile: &ExamProfile, raw_correct: f64, total_possible: f64) -> f64 {
    if total_possible <= 0.0 {
        return profile.scale.min;
    }
    let fraction = (raw_correct / total_possible).clamp(0.0, 1.0);
    match profile.section_table {
        Some(table) => step_lookup(table, fraction),
        None => round_half_up(fraction * 100.0),
    }
}

/// IELTS overall band: arithmetic mean of the skill averages, rounded to
/// the nearest half band.
pub fn ielts_overall(skill_averages: &[f64]) -> f64 {
    if skill_averages.is_empty() {
        return 0.0;
    }
    let mean = skill_averages.iter().sum::<f64>() / skill_averages.len() as f64;
    round_to_half(mean)
}

/// TOEFL overall: sum of the section scores, capped at 120.
pub fn toefl_overall(section_scores: &[f64]) -> f64 {
    round_half_up(section_scores.iter().sum::<f64>()).clamp(0.0, 120.0)
}

/// YDS overall: weighted composite normalized by the weights of the
/// skills that actually have data, guarding the no-data case.
pub fn yds_overall(weighted_averages: &[(f64, f64)]) -> f64 {
    let weight_sum: f64 = weighted_averages.iter().map(|(_, weight)| weight).sum();
    if weight_sum <= 0.0 {
        return 0.0;
    }
    let total: f64 = weighted_averages
        .iter()
        .map(|(average, weight)| average * weight)
        .sum();
    round_half_up(total / weight_sum)
}

/// Exam-level score for a progress report. Skill averages are projected
/// onto each skill's scale from the earned/total point ratio. `None`
/// until at least one skill has recorded points.
pub fn overall_score(profile: &ExamProfile, rows: &[Progress]) -> Option<f64> {
    let mut entries: Vec<(f64, f64)> = Vec::new();
    for row in rows {
        if row.total_points <= 0.0 {
            continue;
        }
        let Some(skill) = profile.skill(&row.skill) else {
            continue;
        };
        let average = (row.earned_points / row.total_points) * skill.max_score;
        entries.push((average, skill.weight));
    }
    if entries.is_empty() {
        return None;
    }

    let averages: Vec<f64> = entries.iter().map(|(average, _)| *average).collect();
    let score = match profile.exam {
        ExamKind::Ielts => ielts_overall(&averages),
        ExamKind::Toefl => toefl_overall(&averages),
        ExamKind::Yds => yds_overall(&entries),
    };
    Some(score.clamp(profile.scale.min, profile.scale.max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::profiles;
    use crate::models::exam::ExamKind;

    #[test]
    fn half_up_rounding_is_not_bankers() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(3.5), 4.0);
        assert_eq!(round_half_up(2.4), 2.0);
        assert_eq!(round_to_half(6.25), 6.5);
        assert_eq!(round_to_half(6.75), 7.0);
        assert_eq!(round_to_half(6.2), 6.0);
    }

    #[test]
    fn ielts_section_breakpoints() {
        let profile = profiles::for_exam(ExamKind::Ielts);
        assert_eq!(to_scale(profile, 36.0, 40.0), 9.0);
        assert_eq!(to_scale(profile, 32.0, 40.0), 8.0);
        assert_eq!(to_scale(profile, 24.0, 40.0), 6.0);
        assert_eq!(to_scale(profile, 4.0, 40.0), 2.0);
        assert_eq!(to_scale(profile, 0.0, 40.0), 2.0);
    }

    #[test]
    fn toefl_section_breakpoints() {
        let profile = profiles::for_exam(ExamKind::Toefl);
        assert_eq!(to_scale(profile, 9.0, 10.0), 30.0);
        assert_eq!(to_scale(profile, 8.0, 10.0), 28.0);
        assert_eq!(to_scale(profile, 5.0, 10.0), 18.0);
        assert_eq!(to_scale(profile, 0.0, 10.0), 0.0);
    }

    #[test]
    fn yds_sections_are_percentages() {
        let profile = profiles::for_exam(ExamKind::Yds);
        assert_eq!(to_scale(profile, 3.0, 4.0), 75.0);
        assert_eq!(to_scale(profile, 1.0, 3.0), 33.0);
    }

    #[test]
    fn zero_total_maps_to_scale_floor() {
        for profile in profiles::all() {
            assert_eq!(to_scale(profile, 0.0, 0.0), profile.scale.min);
        }
    }

    #[test]
    fn outputs_stay_on_scale_for_all_fractions() {
        for profile in profiles::all() {
            for correct in 0..=40 {
                let score = to_scale(profile, correct as f64, 40.0);
                let section_max = profile
                    .skills
                    .iter()
                    .map(|s| s.max_score)
                    .fold(f64::MIN, f64::max);
                assert!(score >= profile.scale.min);
                assert!(score <= section_max.max(profile.scale.max));
            }
        }
    }

    #[test]
    fn ielts_overall_is_a_half_band() {
        let overall = ielts_overall(&[6.5, 7.0, 5.8, 6.2]);
        assert_eq!(overall, (overall * 2.0).round() / 2.0);
        assert_eq!(ielts_overall(&[7.0, 7.0, 7.0, 6.5]), 7.0);
    }

    #[test]
    fn toefl_overall_is_capped() {
        assert_eq!(toefl_overall(&[30.0, 30.0, 30.0, 30.0]), 120.0);
        assert_eq!(toefl_overall(&[28.0, 25.0, 22.0, 20.0]), 95.0);
    }

    #[test]
    fn yds_weighted_composite_matches_worked_example() {
        // reading 80 x .40 + listening 60 x .20 + grammar 70 x .25
        // + vocabulary 50 x .15 = 69
        let overall = yds_overall(&[(80.0, 0.40), (60.0, 0.20), (70.0, 0.25), (50.0, 0.15)]);
        assert_eq!(overall, 69.0);
    }

    #[test]
    fn yds_normalizes_by_present_weights() {
        // Only reading present: composite equals the reading average.
        assert_eq!(yds_overall(&[(80.0, 0.40)]), 80.0);
        assert_eq!(yds_overall(&[]), 0.0);
    }
}

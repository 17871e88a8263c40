// src/models/exam.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The exams the platform supports. Each code maps to a static
/// `ExamProfile` carrying the scale, skills and scoring tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamKind {
    Ielts,
    Toefl,
    Yds,
}

impl ExamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamKind::Ielts => "ielts",
            ExamKind::Toefl => "toefl",
            ExamKind::Yds => "yds",
        }
    }
}

impl fmt::Display for ExamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExamKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ielts" => Ok(ExamKind::Ielts),
            "toefl" => Ok(ExamKind::Toefl),
            "yds" => Ok(ExamKind::Yds),
            other => Err(format!("unknown exam code '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exam_codes_round_trip() {
        for kind in [ExamKind::Ielts, ExamKind::Toefl, ExamKind::Yds] {
            assert_eq!(kind.as_str().parse::<ExamKind>().unwrap(), kind);
        }
        assert!("gre".parse::<ExamKind>().is_err());
    }
}

//! Core vocabulary of the rule engine.
//!
//! Grades, bands, complexity tiers, activity types, subjects and languages.
//! All enums serialize as snake_case strings so they travel unchanged through
//! the HTTP API and into prompts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CurriculumError;

/// School grade, 1 through 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GradeLevel {
    #[serde(rename = "grade_1")]
    Grade1 = 1,
    #[serde(rename = "grade_2")]
    Grade2 = 2,
    #[serde(rename = "grade_3")]
    Grade3 = 3,
    #[serde(rename = "grade_4")]
    Grade4 = 4,
    #[serde(rename = "grade_5")]
    Grade5 = 5,
    #[serde(rename = "grade_6")]
    Grade6 = 6,
    #[serde(rename = "grade_7")]
    Grade7 = 7,
    #[serde(rename = "grade_8")]
    Grade8 = 8,
}

impl GradeLevel {
    /// Numeric grade (1-8).
    pub fn number(&self) -> u8 {
        *self as u8
    }

    /// Grade from its number.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Grade1),
            2 => Some(Self::Grade2),
            3 => Some(Self::Grade3),
            4 => Some(Self::Grade4),
            5 => Some(Self::Grade5),
            6 => Some(Self::Grade6),
            7 => Some(Self::Grade7),
            8 => Some(Self::Grade8),
            _ => None,
        }
    }

    /// Wire identifier, e.g. `grade_3`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grade1 => "grade_1",
            Self::Grade2 => "grade_2",
            Self::Grade3 => "grade_3",
            Self::Grade4 => "grade_4",
            Self::Grade5 => "grade_5",
            Self::Grade6 => "grade_6",
            Self::Grade7 => "grade_7",
            Self::Grade8 => "grade_8",
        }
    }

    /// Band this grade belongs to.
    pub fn band(&self) -> GradeBand {
        GradeBand::for_grade(*self)
    }

    /// All grades in ascending order.
    pub fn all() -> Vec<Self> {
        (1..=8).filter_map(Self::from_number).collect()
    }
}

impl fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GradeLevel {
    type Err = CurriculumError;

    /// Accepts `grade_3`, `3`, `Grade 3`, `class-3` and `कक्षा 3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let mut rest = lowered.as_str();
        for prefix in ["grade", "class", "std", "कक्षा"] {
            if let Some(stripped) = rest.strip_prefix(prefix) {
                rest = stripped;
                break;
            }
        }
        let digits = rest.trim_start_matches(|c: char| c == '_' || c == '-' || c.is_whitespace());

        digits
            .parse::<u8>()
            .ok()
            .and_then(Self::from_number)
            .ok_or_else(|| CurriculumError::UnknownGrade(s.to_string()))
    }
}

/// Grouping of consecutive grades sharing a content-complexity profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeBand {
    /// Grades 1-2
    EarlyPrimary,
    /// Grades 3-5
    Primary,
    /// Grades 6-8
    UpperPrimary,
}

impl GradeBand {
    /// Band for a grade.
    pub fn for_grade(grade: GradeLevel) -> Self {
        match grade.number() {
            0..=2 => Self::EarlyPrimary,
            3..=5 => Self::Primary,
            _ => Self::UpperPrimary,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::EarlyPrimary => "early primary (grades 1-2)",
            Self::Primary => "primary (grades 3-5)",
            Self::UpperPrimary => "upper primary (grades 6-8)",
        }
    }

    /// Prefix applied to learning objectives for this band.
    pub fn objective_prefix(&self) -> &'static str {
        match self {
            Self::EarlyPrimary => "Basic",
            Self::Primary => "Intermediate",
            Self::UpperPrimary => "Advanced",
        }
    }

    /// Grades in this band.
    pub fn grades(&self) -> Vec<GradeLevel> {
        GradeLevel::all()
            .into_iter()
            .filter(|g| g.band() == *self)
            .collect()
    }
}

/// Complexity tier for vocabulary, reading and writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    VerySimple,
    Simple,
    Moderate,
    Complex,
    VeryComplex,
}

impl ComplexityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VerySimple => "very_simple",
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
            Self::VeryComplex => "very_complex",
        }
    }
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of classroom activity a grade responds well to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Observation,
    Matching,
    FillInBlanks,
    ShortAnswer,
    LongAnswer,
    ProblemSolving,
    Creative,
    HandsOn,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Observation => "observation",
            Self::Matching => "matching",
            Self::FillInBlanks => "fill_in_blanks",
            Self::ShortAnswer => "short_answer",
            Self::LongAnswer => "long_answer",
            Self::ProblemSolving => "problem_solving",
            Self::Creative => "creative",
            Self::HandsOn => "hands_on",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subject area of a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Mathematics,
    Science,
    SocialStudies,
    Language,
    General,
}

impl Subject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mathematics => "mathematics",
            Self::Science => "science",
            Self::SocialStudies => "social_studies",
            Self::Language => "language",
            Self::General => "general",
        }
    }

    /// Parse a subject hint where `auto` (or empty) means "detect it".
    pub fn parse_hint(hint: &str) -> Result<Option<Self>, CurriculumError> {
        let trimmed = hint.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            return Ok(None);
        }
        trimmed.parse().map(Some)
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subject {
    type Err = CurriculumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "mathematics" | "maths" | "math" => Ok(Self::Mathematics),
            "science" | "evs" => Ok(Self::Science),
            "social_studies" | "social" | "history" | "geography" => Ok(Self::SocialStudies),
            "language" | "languages" => Ok(Self::Language),
            "general" => Ok(Self::General),
            _ => Err(CurriculumError::UnknownSubject(s.to_string())),
        }
    }
}

/// Output language preference for worksheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LanguagePreference {
    Hindi,
    English,
    #[default]
    HindiEnglish,
}

impl LanguagePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hindi => "hindi",
            Self::English => "english",
            Self::HindiEnglish => "hindi_english",
        }
    }

    /// Whether worksheets should carry a Hindi version.
    pub fn includes_hindi(&self) -> bool {
        matches!(self, Self::Hindi | Self::HindiEnglish)
    }
}

impl FromStr for LanguagePreference {
    type Err = CurriculumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "hindi" | "hi" => Ok(Self::Hindi),
            "english" | "en" => Ok(Self::English),
            "hindi_english" | "bilingual" | "" => Ok(Self::HindiEnglish),
            _ => Err(CurriculumError::UnknownLanguage(s.to_string())),
        }
    }
}

/// Dominant script of a block of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectedLanguage {
    Hindi,
    English,
    Mixed,
}

impl DetectedLanguage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hindi => "hindi",
            Self::English => "english",
            Self::Mixed => "mixed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_parsing() {
        assert_eq!("grade_3".parse::<GradeLevel>().unwrap(), GradeLevel::Grade3);
        assert_eq!("5".parse::<GradeLevel>().unwrap(), GradeLevel::Grade5);
        assert_eq!("Grade 7".parse::<GradeLevel>().unwrap(), GradeLevel::Grade7);
        assert_eq!("class-2".parse::<GradeLevel>().unwrap(), GradeLevel::Grade2);
        assert_eq!("कक्षा 4".parse::<GradeLevel>().unwrap(), GradeLevel::Grade4);

        assert!("grade_9".parse::<GradeLevel>().is_err());
        assert!("0".parse::<GradeLevel>().is_err());
        assert!("first".parse::<GradeLevel>().is_err());
    }

    #[test]
    fn test_grade_serialization() {
        let json = serde_json::to_string(&GradeLevel::Grade6).unwrap();
        assert_eq!(json, "\"grade_6\"");

        let parsed: GradeLevel = serde_json::from_str("\"grade_1\"").unwrap();
        assert_eq!(parsed, GradeLevel::Grade1);
    }

    #[test]
    fn test_bands() {
        assert_eq!(GradeLevel::Grade1.band(), GradeBand::EarlyPrimary);
        assert_eq!(GradeLevel::Grade2.band(), GradeBand::EarlyPrimary);
        assert_eq!(GradeLevel::Grade3.band(), GradeBand::Primary);
        assert_eq!(GradeLevel::Grade5.band(), GradeBand::Primary);
        assert_eq!(GradeLevel::Grade6.band(), GradeBand::UpperPrimary);
        assert_eq!(GradeLevel::Grade8.band(), GradeBand::UpperPrimary);

        assert_eq!(GradeBand::Primary.grades().len(), 3);
    }

    #[test]
    fn test_subject_hint() {
        assert_eq!(Subject::parse_hint("auto").unwrap(), None);
        assert_eq!(Subject::parse_hint("").unwrap(), None);
        assert_eq!(
            Subject::parse_hint("Social Studies").unwrap(),
            Some(Subject::SocialStudies)
        );
        assert!(Subject::parse_hint("astrology").is_err());
    }

    #[test]
    fn test_language_preference() {
        assert_eq!(
            "hindi_english".parse::<LanguagePreference>().unwrap(),
            LanguagePreference::HindiEnglish
        );
        assert!(LanguagePreference::Hindi.includes_hindi());
        assert!(!LanguagePreference::English.includes_hindi());
        assert!("klingon".parse::<LanguagePreference>().is_err());
    }
}

//! Fixed grade profiles for grades 1-8.
//!
//! The table is the single source of truth for attention span, complexity
//! tiers and preferred activities. Everything downstream (differentiation,
//! worksheets, agent prompts) reads from it.

use serde::Serialize;

use crate::types::{ActivityType, ComplexityLevel, GradeLevel};

/// What learners in one grade can handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeProfile {
    pub grade: GradeLevel,
    /// Inclusive age range in years
    pub age_range: (u8, u8),
    /// Minutes of focused attention
    pub attention_span_minutes: u32,
    pub vocabulary_complexity: ComplexityLevel,
    pub reading_level: ComplexityLevel,
    pub writing_ability: ComplexityLevel,
    pub abstract_thinking: bool,
    /// Ordered by preference
    pub preferred_activities: Vec<ActivityType>,
    pub learning_characteristics: Vec<&'static str>,
}

impl GradeProfile {
    /// Profile row for a grade.
    pub fn for_grade(grade: GradeLevel) -> Self {
        use ActivityType::*;
        use ComplexityLevel::*;

        let (age_range, span, vocab, reading, writing, abstract_thinking, activities, traits): (
            (u8, u8),
            u32,
            ComplexityLevel,
            ComplexityLevel,
            ComplexityLevel,
            bool,
            Vec<ActivityType>,
            [&'static str; 5],
        ) = match grade {
            GradeLevel::Grade1 => (
                (6, 7),
                10,
                VerySimple,
                VerySimple,
                VerySimple,
                false,
                vec![Observation, Matching, HandsOn],
                [
                    "Learn through play and games",
                    "Need concrete examples",
                    "Short attention spans",
                    "Learn through repetition",
                    "Prefer visual and tactile learning",
                ],
            ),
            GradeLevel::Grade2 => (
                (7, 8),
                15,
                Simple,
                Simple,
                Simple,
                false,
                vec![Observation, Matching, FillInBlanks, HandsOn],
                [
                    "Beginning to read simple sentences",
                    "Can write simple words",
                    "Still need concrete examples",
                    "Enjoy stories and songs",
                    "Learn well in groups",
                ],
            ),
            GradeLevel::Grade3 => (
                (8, 9),
                20,
                Simple,
                Simple,
                Simple,
                false,
                vec![ShortAnswer, Matching, FillInBlanks, HandsOn, Creative],
                [
                    "Can read simple paragraphs",
                    "Beginning paragraph writing",
                    "Starting to think logically",
                    "Curious and ask many questions",
                    "Learn through exploration",
                ],
            ),
            GradeLevel::Grade4 => (
                (9, 10),
                25,
                Moderate,
                Moderate,
                Simple,
                false,
                vec![ShortAnswer, ProblemSolving, Creative, HandsOn],
                [
                    "Can read longer texts",
                    "Writing skills developing",
                    "Beginning analytical thinking",
                    "Enjoy collaborative work",
                    "Can follow multi-step instructions",
                ],
            ),
            GradeLevel::Grade5 => (
                (10, 11),
                30,
                Moderate,
                Moderate,
                Moderate,
                true,
                vec![ShortAnswer, LongAnswer, ProblemSolving, Creative],
                [
                    "Can understand complex texts",
                    "Developing writing skills",
                    "Beginning abstract reasoning",
                    "Can work independently",
                    "Understand cause and effect",
                ],
            ),
            GradeLevel::Grade6 => (
                (11, 12),
                35,
                Moderate,
                Complex,
                Moderate,
                true,
                vec![LongAnswer, ProblemSolving, Creative],
                [
                    "Can analyze and synthesize information",
                    "Developing critical thinking",
                    "Can handle abstract concepts",
                    "Prefer challenging tasks",
                    "Beginning to form personal opinions",
                ],
            ),
            GradeLevel::Grade7 => (
                (12, 13),
                40,
                Complex,
                Complex,
                Complex,
                true,
                vec![LongAnswer, ProblemSolving, Creative],
                [
                    "Strong analytical abilities",
                    "Can handle complex concepts",
                    "Developing research skills",
                    "Can work on long-term projects",
                    "Beginning metacognitive awareness",
                ],
            ),
            GradeLevel::Grade8 => (
                (13, 14),
                45,
                Complex,
                VeryComplex,
                Complex,
                true,
                vec![LongAnswer, ProblemSolving, Creative],
                [
                    "Advanced critical thinking",
                    "Can handle highly abstract concepts",
                    "Strong research and analysis skills",
                    "Can create original work",
                    "Developing personal learning strategies",
                ],
            ),
        };

        Self {
            grade,
            age_range,
            attention_span_minutes: span,
            vocabulary_complexity: vocab,
            reading_level: reading,
            writing_ability: writing,
            abstract_thinking,
            preferred_activities: activities,
            learning_characteristics: traits.to_vec(),
        }
    }

    /// All eight profiles in grade order.
    pub fn all() -> Vec<Self> {
        GradeLevel::all().into_iter().map(Self::for_grade).collect()
    }

    /// One-paragraph summary used when embedding the profile in a prompt.
    pub fn prompt_summary(&self) -> String {
        let activities: Vec<&str> = self
            .preferred_activities
            .iter()
            .map(|a| a.as_str())
            .collect();

        format!(
            "Grade {} learners (age {}-{}): attention span about {} minutes, \
             {} vocabulary, {} reading level, {} writing ability, {}. \
             Preferred activities: {}.",
            self.grade.number(),
            self.age_range.0,
            self.age_range.1,
            self.attention_span_minutes,
            self.vocabulary_complexity,
            self.reading_level,
            self.writing_ability,
            if self.abstract_thinking {
                "able to handle abstract ideas"
            } else {
                "need concrete examples"
            },
            activities.join(", "),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_has_eight_rows() {
        let all = GradeProfile::all();
        assert_eq!(all.len(), 8);
        assert_eq!(all[0].grade, GradeLevel::Grade1);
        assert_eq!(all[7].grade, GradeLevel::Grade8);
    }

    #[test]
    fn test_attention_span_increases() {
        let spans: Vec<u32> = GradeProfile::all()
            .iter()
            .map(|p| p.attention_span_minutes)
            .collect();
        assert!(spans.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(spans.first(), Some(&10));
        assert_eq!(spans.last(), Some(&45));
    }

    #[test]
    fn test_abstract_thinking_starts_at_grade_five() {
        for profile in GradeProfile::all() {
            assert_eq!(profile.abstract_thinking, profile.grade.number() >= 5);
        }
    }

    #[test]
    fn test_learning_characteristics() {
        for profile in GradeProfile::all() {
            assert_eq!(profile.learning_characteristics.len(), 5);
        }
        let g1 = GradeProfile::for_grade(GradeLevel::Grade1);
        assert_eq!(g1.learning_characteristics[0], "Learn through play and games");
        assert_eq!(g1.preferred_activities[0], ActivityType::Observation);
    }

    #[test]
    fn test_prompt_summary() {
        let summary = GradeProfile::for_grade(GradeLevel::Grade3).prompt_summary();
        assert!(summary.contains("Grade 3"));
        assert!(summary.contains("20 minutes"));
        assert!(summary.contains("short_answer"));
        assert!(summary.contains("concrete examples"));
    }
}

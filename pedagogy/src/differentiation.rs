//! Adapting content and activities to grade profiles.
//!
//! Concept rules are sparse: only a handful of concepts carry hand-written
//! per-grade descriptors. Anything else falls back to generic simplification
//! driven purely by the grade profile. Rules can be extended from a YAML
//! document shaped as `concept -> grade_N -> {key: value}`:
//!
//! ```yaml
//! fractions:
//!   grade_3:
//!     approach: sharing_roti
//!     vocabulary: simple_words
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CurriculumError;
use crate::profile::GradeProfile;
use crate::types::{ComplexityLevel, GradeLevel};

/// Free-form descriptor for one grade (approach, vocabulary, examples...).
pub type Descriptor = BTreeMap<String, String>;

/// Words swapped for plainer phrases at the very_simple vocabulary tier.
const SIMPLE_WORDS: &[(&str, &str)] = &[
    ("photosynthesis", "plants making food"),
    ("multiplication", "adding many times"),
    ("environment", "the place around us"),
];

static SIMPLE_WORD_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    SIMPLE_WORDS
        .iter()
        .map(|(word, replacement)| {
            (
                Regex::new(&format!(r"(?i)\b{word}\b")).unwrap(),
                *replacement,
            )
        })
        .collect()
});

/// Hand-written adaptation rules for one concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentAdaptation {
    pub concept: String,
    pub grades: BTreeMap<GradeLevel, Descriptor>,
}

impl ContentAdaptation {
    pub fn new(concept: impl Into<String>) -> Self {
        Self {
            concept: normalize_concept(&concept.into()),
            grades: BTreeMap::new(),
        }
    }

    /// Add a descriptor for a grade from `(key, value)` pairs.
    pub fn with_grade(mut self, grade: GradeLevel, pairs: &[(&str, &str)]) -> Self {
        let descriptor = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.grades.insert(grade, descriptor);
        self
    }

    pub fn descriptor(&self, grade: GradeLevel) -> Option<&Descriptor> {
        self.grades.get(&grade)
    }
}

/// How a grade should be taught.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeachingApproach {
    ConcreteHandsOn,
    VisualConceptual,
    AbstractAnalytical,
}

impl TeachingApproach {
    pub fn for_profile(profile: &GradeProfile) -> Self {
        if !profile.abstract_thinking {
            Self::ConcreteHandsOn
        } else if (3..=5).contains(&profile.grade.number()) {
            Self::VisualConceptual
        } else {
            Self::AbstractAnalytical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConcreteHandsOn => "concrete_hands_on",
            Self::VisualConceptual => "visual_conceptual",
            Self::AbstractAnalytical => "abstract_analytical",
        }
    }
}

/// How a grade should be assessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentMethod {
    ObservationBased,
    SimpleWrittenTasks,
    ComprehensiveAssessment,
}

impl AssessmentMethod {
    pub fn for_grade(grade: GradeLevel) -> Self {
        match grade.number() {
            1..=2 => Self::ObservationBased,
            3..=4 => Self::SimpleWrittenTasks,
            _ => Self::ComprehensiveAssessment,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ObservationBased => "observation_based",
            Self::SimpleWrittenTasks => "simple_written_tasks",
            Self::ComprehensiveAssessment => "comprehensive_assessment",
        }
    }
}

/// Result of adapting one piece of content to one grade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeAdaptation {
    pub grade: GradeLevel,
    pub adapted_content: String,
    pub recommended_activities: Vec<crate::types::ActivityType>,
    pub time_estimate_minutes: u32,
    pub teaching_approach: TeachingApproach,
    pub assessment_method: AssessmentMethod,
    /// Concept-specific descriptor; empty when no rule matched
    pub specific_adaptations: Descriptor,
    pub learning_characteristics: Vec<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportLevel {
    High,
    Low,
}

/// Per-grade parameters of a shared activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeVariation {
    pub time_minutes: u32,
    pub complexity: ComplexityLevel,
    pub support_level: SupportLevel,
}

/// An activity the whole multi-grade class does together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossGradeActivity {
    pub name: String,
    pub description: String,
    pub concept: String,
    /// What varies between grades
    pub differentiation: String,
    pub grade_variations: BTreeMap<GradeLevel, GradeVariation>,
}

/// Concept rule table plus the adaptation operations over it.
#[derive(Debug, Clone)]
pub struct DifferentiationModel {
    rules: BTreeMap<String, ContentAdaptation>,
}

impl Default for DifferentiationModel {
    fn default() -> Self {
        Self::new()
    }
}

impl DifferentiationModel {
    /// Model with the built-in rules.
    pub fn new() -> Self {
        let mut model = Self::empty();
        for rule in builtin_rules() {
            model.insert(rule);
        }
        model
    }

    /// Model without any concept rules.
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// Add or replace a concept rule.
    pub fn insert(&mut self, rule: ContentAdaptation) {
        self.rules.insert(rule.concept.clone(), rule);
    }

    /// Merge rules from a YAML document. A concept in the document replaces
    /// the existing concept of the same name.
    pub fn with_rules_yaml(mut self, yaml: &str) -> Result<Self, CurriculumError> {
        let document: BTreeMap<String, BTreeMap<GradeLevel, Descriptor>> =
            serde_yaml::from_str(yaml)?;

        for (concept, grades) in document {
            let concept = normalize_concept(&concept);
            debug!(concept = %concept, grades = grades.len(), "Loaded concept rule");
            self.rules
                .insert(concept.clone(), ContentAdaptation { concept, grades });
        }
        Ok(self)
    }

    /// Merge rules from a YAML file on disk.
    pub fn load_rules_file(self, path: impl AsRef<Path>) -> Result<Self, CurriculumError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)?;
        let model = self.with_rules_yaml(&yaml)?;
        info!(path = %path.display(), concepts = model.rules.len(), "Loaded differentiation rules");
        Ok(model)
    }

    /// Rule for a concept, matched case-insensitively.
    pub fn rule(&self, concept: &str) -> Option<&ContentAdaptation> {
        self.rules.get(&normalize_concept(concept))
    }

    /// Known concept names, sorted.
    pub fn concepts(&self) -> Vec<&str> {
        self.rules.keys().map(String::as_str).collect()
    }

    /// Adapt a piece of content about `concept` to one grade.
    pub fn adapt_content_for_grade(
        &self,
        content: &str,
        concept: &str,
        grade: GradeLevel,
    ) -> GradeAdaptation {
        let profile = GradeProfile::for_grade(grade);

        let specific_adaptations = self
            .rule(concept)
            .and_then(|rule| rule.descriptor(grade))
            .cloned()
            .unwrap_or_default();

        GradeAdaptation {
            grade,
            adapted_content: simplify_vocabulary(content, profile.vocabulary_complexity),
            recommended_activities: profile.preferred_activities.clone(),
            time_estimate_minutes: profile.attention_span_minutes,
            teaching_approach: TeachingApproach::for_profile(&profile),
            assessment_method: AssessmentMethod::for_grade(grade),
            specific_adaptations,
            learning_characteristics: profile.learning_characteristics,
        }
    }

    /// One adaptation per distinct grade, in grade order.
    pub fn multi_grade_adaptations(
        &self,
        content: &str,
        concept: &str,
        grades: &[GradeLevel],
    ) -> BTreeMap<GradeLevel, GradeAdaptation> {
        grades
            .iter()
            .map(|&grade| (grade, self.adapt_content_for_grade(content, concept, grade)))
            .collect()
    }

    /// Whole-class activities with per-grade variations.
    pub fn cross_grade_activities(
        &self,
        concept: &str,
        grades: &[GradeLevel],
    ) -> Vec<CrossGradeActivity> {
        let templates = [
            (
                "Group Discussion",
                "Discuss the concept with grade-appropriate questions",
                "question_complexity",
            ),
            (
                "Drawing Activity",
                "Visual representation of the concept",
                "detail_level",
            ),
            (
                "Hands-on Exploration",
                "Physical manipulation and exploration",
                "complexity_of_materials",
            ),
        ];

        templates
            .iter()
            .map(|(name, description, differentiation)| CrossGradeActivity {
                name: name.to_string(),
                description: description.to_string(),
                concept: concept.trim().to_string(),
                differentiation: differentiation.to_string(),
                grade_variations: grades
                    .iter()
                    .map(|&grade| (grade, grade_variation(grade)))
                    .collect(),
            })
            .collect()
    }
}

fn grade_variation(grade: GradeLevel) -> GradeVariation {
    let profile = GradeProfile::for_grade(grade);
    GradeVariation {
        time_minutes: profile.attention_span_minutes,
        complexity: profile.vocabulary_complexity,
        support_level: if profile.abstract_thinking {
            SupportLevel::Low
        } else {
            SupportLevel::High
        },
    }
}

/// Replace difficult words for the very_simple tier. Other tiers pass through.
pub fn simplify_vocabulary(content: &str, level: ComplexityLevel) -> String {
    if level != ComplexityLevel::VerySimple {
        return content.to_string();
    }

    SIMPLE_WORD_PATTERNS
        .iter()
        .fold(content.to_string(), |text, (pattern, replacement)| {
            pattern
                .replace_all(&text, |caps: &Captures| {
                    let starts_upper = caps[0].chars().next().is_some_and(char::is_uppercase);
                    if starts_upper {
                        capitalize(replacement)
                    } else {
                        replacement.to_string()
                    }
                })
                .into_owned()
        })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn normalize_concept(concept: &str) -> String {
    concept.trim().to_lowercase()
}

fn builtin_rules() -> Vec<ContentAdaptation> {
    vec![
        ContentAdaptation::new("addition")
            .with_grade(
                GradeLevel::Grade1,
                &[
                    ("approach", "concrete_objects"),
                    ("range", "1-10"),
                    ("format", "pictures_and_symbols"),
                    ("examples", "counting toys, fruits"),
                ],
            )
            .with_grade(
                GradeLevel::Grade2,
                &[
                    ("approach", "visual_representation"),
                    ("range", "1-20"),
                    ("format", "number_line"),
                    ("examples", "adding school supplies"),
                ],
            )
            .with_grade(
                GradeLevel::Grade3,
                &[
                    ("approach", "abstract_numbers"),
                    ("range", "1-100"),
                    ("format", "vertical_addition"),
                    ("examples", "money problems"),
                ],
            ),
        ContentAdaptation::new("photosynthesis")
            .with_grade(
                GradeLevel::Grade2,
                &[
                    ("approach", "plants_need_sunlight"),
                    ("vocabulary", "simple_words"),
                    ("activities", "observation_drawing"),
                ],
            )
            .with_grade(
                GradeLevel::Grade4,
                &[
                    ("approach", "plants_make_food"),
                    ("vocabulary", "basic_scientific_terms"),
                    ("activities", "simple_experiments"),
                ],
            )
            .with_grade(
                GradeLevel::Grade6,
                &[
                    ("approach", "chemical_process"),
                    ("vocabulary", "scientific_terminology"),
                    ("activities", "detailed_experiments"),
                ],
            ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_rule_lookup() {
        let model = DifferentiationModel::new();
        let adaptation = model.adapt_content_for_grade("2 + 3", "  Addition ", GradeLevel::Grade1);

        assert_eq!(
            adaptation.specific_adaptations.get("approach").map(String::as_str),
            Some("concrete_objects")
        );
        assert_eq!(
            adaptation.specific_adaptations.get("range").map(String::as_str),
            Some("1-10")
        );
        assert_eq!(adaptation.time_estimate_minutes, 10);
        assert_eq!(adaptation.teaching_approach, TeachingApproach::ConcreteHandsOn);
        assert_eq!(adaptation.assessment_method, AssessmentMethod::ObservationBased);
    }

    #[test]
    fn test_missing_grade_or_concept_falls_back() {
        let model = DifferentiationModel::new();

        let no_grade = model.adapt_content_for_grade("text", "addition", GradeLevel::Grade7);
        assert!(no_grade.specific_adaptations.is_empty());

        let no_concept = model.adapt_content_for_grade("text", "volcanoes", GradeLevel::Grade3);
        assert!(no_concept.specific_adaptations.is_empty());
        assert_eq!(no_concept.assessment_method, AssessmentMethod::SimpleWrittenTasks);
    }

    #[test]
    fn test_teaching_approach_by_grade() {
        let model = DifferentiationModel::new();
        let approach = |g| model.adapt_content_for_grade("", "x", g).teaching_approach;

        assert_eq!(approach(GradeLevel::Grade4), TeachingApproach::ConcreteHandsOn);
        assert_eq!(approach(GradeLevel::Grade5), TeachingApproach::VisualConceptual);
        assert_eq!(approach(GradeLevel::Grade8), TeachingApproach::AbstractAnalytical);
    }

    #[test]
    fn test_vocabulary_simplification() {
        let text = "Photosynthesis needs light. The environment matters for photosynthesis.";
        let simplified = simplify_vocabulary(text, ComplexityLevel::VerySimple);
        assert_eq!(
            simplified,
            "Plants making food needs light. The the place around us matters for plants making food."
        );

        // Other tiers untouched
        assert_eq!(simplify_vocabulary(text, ComplexityLevel::Simple), text);
    }

    #[test]
    fn test_vocabulary_whole_words_only() {
        let simplified =
            simplify_vocabulary("environmental science", ComplexityLevel::VerySimple);
        assert_eq!(simplified, "environmental science");
    }

    #[test]
    fn test_multi_grade_dedupes_and_orders() {
        let model = DifferentiationModel::new();
        let result = model.multi_grade_adaptations(
            "text",
            "photosynthesis",
            &[GradeLevel::Grade6, GradeLevel::Grade2, GradeLevel::Grade6],
        );
        let grades: Vec<_> = result.keys().copied().collect();
        assert_eq!(grades, vec![GradeLevel::Grade2, GradeLevel::Grade6]);
    }

    #[test]
    fn test_cross_grade_activities() {
        let model = DifferentiationModel::new();
        let activities =
            model.cross_grade_activities("water", &[GradeLevel::Grade1, GradeLevel::Grade6]);

        assert_eq!(activities.len(), 3);
        assert_eq!(activities[0].name, "Group Discussion");
        let g1 = &activities[1].grade_variations[&GradeLevel::Grade1];
        assert_eq!(g1.time_minutes, 10);
        assert_eq!(g1.support_level, SupportLevel::High);
        let g6 = &activities[1].grade_variations[&GradeLevel::Grade6];
        assert_eq!(g6.support_level, SupportLevel::Low);
        assert_eq!(g6.complexity, ComplexityLevel::Moderate);
    }

    #[test]
    fn test_yaml_rules_override() {
        let yaml = r#"
Addition:
  grade_4:
    approach: column_method
fractions:
  grade_3:
    approach: sharing_roti
"#;
        let model = DifferentiationModel::new().with_rules_yaml(yaml).unwrap();

        // Replaced concept loses its built-in grades
        assert!(model.rule("addition").unwrap().descriptor(GradeLevel::Grade1).is_none());
        assert_eq!(
            model.rule("addition").unwrap().descriptor(GradeLevel::Grade4).unwrap()["approach"],
            "column_method"
        );
        assert!(model.rule("photosynthesis").is_some());
        assert_eq!(model.concepts(), vec!["addition", "fractions", "photosynthesis"]);
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        let result = DifferentiationModel::new().with_rules_yaml("fractions:\n  grade_11: {}\n");
        assert!(matches!(result, Err(CurriculumError::InvalidRules(_))));
    }

    #[test]
    fn test_load_rules_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "division:\n  grade_4:\n    approach: equal_sharing").unwrap();

        let model = DifferentiationModel::empty()
            .load_rules_file(file.path())
            .unwrap();
        assert_eq!(model.concepts(), vec!["division"]);

        let missing = DifferentiationModel::empty().load_rules_file("/nonexistent/rules.yaml");
        assert!(matches!(missing, Err(CurriculumError::Io(_))));
    }
}

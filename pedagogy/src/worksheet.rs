//! Per-grade worksheet synthesis.
//!
//! One worksheet per requested grade. Section layout depends only on the
//! grade band; the analysis supplies the subject, title concept, objectives
//! and matching items.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::analysis::{analyze_content, ContentAnalysis};
use crate::extraction::{detect_language, extract_structured_content, ExtractedContent};
use crate::types::{DetectedLanguage, GradeBand, GradeLevel, LanguagePreference, Subject};

const MAX_PRACTICE_QUESTIONS: usize = 3;

/// Kind of worksheet section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Observation,
    Matching,
    Comprehension,
    Application,
    Analysis,
}

/// One block of a worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorksheetSection {
    /// Hindi title with the English gloss in parentheses
    pub title: String,
    pub section_type: SectionType,
    pub instructions: String,
    pub questions: Vec<String>,
    /// Items to pair up, for matching sections
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
    pub response_format: String,
    pub estimated_minutes: u32,
}

impl WorksheetSection {
    fn new(
        title: &str,
        section_type: SectionType,
        instructions: &str,
        response_format: &str,
        estimated_minutes: u32,
    ) -> Self {
        Self {
            title: title.to_string(),
            section_type,
            instructions: instructions.to_string(),
            questions: Vec::new(),
            items: Vec::new(),
            response_format: response_format.to_string(),
            estimated_minutes,
        }
    }

    fn with_questions<S: ToString>(mut self, questions: &[S]) -> Self {
        self.questions = questions.iter().map(ToString::to_string).collect();
        self
    }

    fn with_items(mut self, items: Vec<String>) -> Self {
        self.items = items;
        self
    }

    /// Hindi half of the title.
    pub fn hindi_title(&self) -> &str {
        self.title
            .split_once(" (")
            .map(|(hindi, _)| hindi)
            .unwrap_or(&self.title)
    }
}

/// Hindi rendering of a worksheet's headings and instructions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HindiVersion {
    pub title: String,
    pub section_titles: Vec<String>,
    pub instructions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentType {
    Observational,
    RubricBased,
}

/// How a worksheet is assessed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub assessment_type: AssessmentType,
    pub criteria: Vec<String>,
    pub scale: String,
}

impl Assessment {
    pub fn for_grade(grade: GradeLevel) -> Self {
        if grade.number() <= 2 {
            Self {
                assessment_type: AssessmentType::Observational,
                criteria: strings(&["Participation", "Understanding", "Effort"]),
                scale: "Excellent/Good/Needs Improvement".to_string(),
            }
        } else {
            Self {
                assessment_type: AssessmentType::RubricBased,
                criteria: strings(&["Content Knowledge", "Application", "Communication"]),
                scale: "4-point scale".to_string(),
            }
        }
    }
}

/// Teaching document for one grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Worksheet {
    pub grade: GradeLevel,
    pub title: String,
    pub learning_objectives: Vec<String>,
    pub sections: Vec<WorksheetSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hindi_version: Option<HindiVersion>,
    pub assessment: Assessment,
    pub materials_needed: Vec<String>,
    pub estimated_minutes: u32,
}

impl Worksheet {
    pub fn generate(
        analysis: &ContentAnalysis,
        grade: GradeLevel,
        language: LanguagePreference,
    ) -> Self {
        let band = grade.band();
        let title = worksheet_title(analysis.subject, analysis.main_concept(), grade);
        let sections = sections_for_band(band, analysis);

        let hindi_version = language.includes_hindi().then(|| HindiVersion {
            title: title.clone(),
            section_titles: sections.iter().map(|s| s.hindi_title().to_string()).collect(),
            instructions: sections.iter().map(|s| s.instructions.clone()).collect(),
        });

        Self {
            grade,
            learning_objectives: analysis
                .learning_objectives
                .iter()
                .map(|o| format!("{}: {}", band.objective_prefix(), o))
                .collect(),
            hindi_version,
            assessment: Assessment::for_grade(grade),
            materials_needed: materials_for_grade(grade),
            estimated_minutes: estimate_minutes(&sections, grade),
            sections,
            title,
        }
    }
}

/// One worksheet per distinct grade, keyed and ordered by grade.
pub fn generate_worksheets(
    analysis: &ContentAnalysis,
    grades: &[GradeLevel],
    language: LanguagePreference,
) -> BTreeMap<GradeLevel, Worksheet> {
    grades
        .iter()
        .map(|&grade| (grade, Worksheet::generate(analysis, grade, language)))
        .collect()
}

/// Title in Hindi by subject, e.g. `गणित अभ्यास - addition (कक्षा 3)`.
pub fn worksheet_title(subject: Subject, concept: &str, grade: GradeLevel) -> String {
    let prefix = match subject {
        Subject::Mathematics => "गणित अभ्यास",
        Subject::Science => "विज्ञान अन्वेषण",
        Subject::SocialStudies => "सामाजिक अध्ययन",
        Subject::Language | Subject::General => "अध्ययन पत्रक",
    };
    format!("{prefix} - {concept} (कक्षा {})", grade.number())
}

fn sections_for_band(band: GradeBand, analysis: &ContentAnalysis) -> Vec<WorksheetSection> {
    match band {
        GradeBand::EarlyPrimary => vec![
            WorksheetSection::new(
                "देखो और बताओ (Look and Tell)",
                SectionType::Observation,
                "चित्र को देखकर सवालों के जवाब दो",
                "oral_response",
                10,
            )
            .with_questions(&["यह क्या है?", "इसका रंग कैसा है?", "यह कहाँ मिलता है?"]),
            WorksheetSection::new(
                "मिलान करो (Match)",
                SectionType::Matching,
                "सही जोड़े बनाओ",
                "drawing_lines",
                15,
            )
            .with_items(analysis.key_concepts.clone()),
        ],
        GradeBand::Primary => {
            let source_questions: Vec<String> = extract_structured_content(&analysis.source_text)
                .questions
                .into_iter()
                .take(MAX_PRACTICE_QUESTIONS)
                .collect();

            vec![
                WorksheetSection::new(
                    "समझो और लिखो (Understand and Write)",
                    SectionType::Comprehension,
                    "पैराग्राफ पढ़कर सवालों के जवाब लिखो",
                    "written_response",
                    20,
                )
                .with_questions(&["मुख्य विषय क्या है?", "कोई तीन मुख्य बातें लिखो"]),
                WorksheetSection::new(
                    "अभ्यास करो (Practice)",
                    SectionType::Application,
                    "दिए गए उदाहरणों को हल करो",
                    "problem_solving",
                    25,
                )
                .with_questions(&source_questions),
            ]
        }
        GradeBand::UpperPrimary => vec![
            WorksheetSection::new(
                "विश्लेषण करो (Analyze)",
                SectionType::Analysis,
                "गहराई से सोचकर जवाब दो",
                "detailed_written_response",
                25,
            )
            .with_questions(&["कारण और परिणाम क्या हैं?", "अपनी राय दो"]),
            WorksheetSection::new(
                "लागू करो (Apply)",
                SectionType::Application,
                "वास्तविक जीवन में इसका उपयोग कैसे करोगे?",
                "project_based",
                30,
            ),
        ],
    }
}

fn materials_for_grade(grade: GradeLevel) -> Vec<String> {
    let mut materials = strings(&["paper", "pencil", "eraser"]);
    if grade.number() <= 2 {
        materials.extend(strings(&["crayons", "pictures"]));
    } else {
        materials.extend(strings(&["ruler", "colored pencils"]));
    }
    materials
}

/// Sum of section minutes; younger grades get half as long again.
fn estimate_minutes(sections: &[WorksheetSection], grade: GradeLevel) -> u32 {
    let total: u32 = sections.iter().map(|s| s.estimated_minutes).sum();
    if grade.number() <= 2 {
        total * 3 / 2
    } else {
        total
    }
}

/// Criterion -> level -> descriptor.
pub type Rubric = BTreeMap<String, BTreeMap<String, String>>;

/// Scoring rubric for a grade.
pub fn assessment_rubric(grade: GradeLevel) -> Rubric {
    let criteria: &[(&str, &[(&str, &str)])] = if grade.number() <= 2 {
        &[
            (
                "participation",
                &[
                    ("excellent", "Active participation"),
                    ("good", "Some participation"),
                    ("needs_improvement", "Limited participation"),
                ],
            ),
            (
                "understanding",
                &[
                    ("excellent", "Shows clear understanding"),
                    ("good", "Shows basic understanding"),
                    ("needs_improvement", "Needs support"),
                ],
            ),
        ]
    } else {
        &[
            (
                "content_knowledge",
                &[
                    ("4", "Excellent"),
                    ("3", "Good"),
                    ("2", "Satisfactory"),
                    ("1", "Needs Improvement"),
                ],
            ),
            (
                "application",
                &[
                    ("4", "Applies independently"),
                    ("3", "Applies with guidance"),
                    ("2", "Limited application"),
                    ("1", "Cannot apply"),
                ],
            ),
            (
                "communication",
                &[
                    ("4", "Clear and detailed"),
                    ("3", "Clear and adequate"),
                    ("2", "Unclear but present"),
                    ("1", "Minimal or unclear"),
                ],
            ),
        ]
    };

    criteria
        .iter()
        .map(|(name, levels)| {
            let levels = levels
                .iter()
                .map(|(level, text)| (level.to_string(), text.to_string()))
                .collect();
            (name.to_string(), levels)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeacherNotes {
    pub preparation_tips: Vec<String>,
    pub implementation_strategies: Vec<String>,
    pub common_challenges: Vec<String>,
    pub extension_ideas: Vec<String>,
}

impl Default for TeacherNotes {
    fn default() -> Self {
        Self {
            preparation_tips: strings(&[
                "Review key concepts before class",
                "Prepare visual aids from local materials",
                "Plan for different learning paces",
            ]),
            implementation_strategies: strings(&[
                "Start with group discussion",
                "Use peer learning for mixed abilities",
                "Provide individual support as needed",
            ]),
            common_challenges: strings(&[
                "Students may struggle with language",
                "Different grade levels need different support",
                "Limited resources require creativity",
            ]),
            extension_ideas: strings(&[
                "Connect to local community examples",
                "Create hands-on activities",
                "Encourage student presentations",
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DifferentiationTips {
    pub for_struggling_students: Vec<String>,
    pub for_advanced_students: Vec<String>,
}

/// Before/during/after steps for running the worksheets in class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImplementationGuide {
    pub before_class: Vec<String>,
    pub during_class: Vec<String>,
    pub after_class: Vec<String>,
    pub differentiation_tips: DifferentiationTips,
}

impl Default for ImplementationGuide {
    fn default() -> Self {
        Self {
            before_class: strings(&[
                "Print or write worksheets on blackboard",
                "Gather required materials",
                "Review content and anticipate questions",
            ]),
            during_class: strings(&[
                "Introduce topic with familiar examples",
                "Distribute worksheets by grade level",
                "Circulate and provide individual support",
                "Facilitate peer learning",
            ]),
            after_class: strings(&[
                "Review completed work",
                "Identify students needing extra help",
                "Plan follow-up activities",
            ]),
            differentiation_tips: DifferentiationTips {
                for_struggling_students: strings(&[
                    "Provide additional examples",
                    "Allow pair work",
                    "Break tasks into smaller steps",
                ]),
                for_advanced_students: strings(&[
                    "Provide extension questions",
                    "Encourage helping others",
                    "Assign leadership roles",
                ]),
            },
        }
    }
}

/// A visual that can be redrawn on a blackboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisualElement {
    pub visual_type: String,
    pub description: String,
    pub materials: Vec<String>,
    pub instructions: String,
}

impl VisualElement {
    pub fn blackboard_diagram() -> Self {
        Self {
            visual_type: "simple_diagram".to_string(),
            description: "Basic diagram that can be drawn on blackboard".to_string(),
            materials: strings(&["chalk", "ruler"]),
            instructions: "Step-by-step drawing instructions".to_string(),
        }
    }
}

/// Summary of the text the packet was built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OriginalContent {
    pub extracted_text: String,
    pub detected_language: DetectedLanguage,
    pub confidence: f64,
}

/// Full output of the textbook-to-worksheet pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorksheetPacket {
    pub original_content: OriginalContent,
    pub content_analysis: ContentAnalysis,
    pub worksheets: BTreeMap<GradeLevel, Worksheet>,
    pub visual_elements: Vec<VisualElement>,
    pub teacher_notes: TeacherNotes,
    pub implementation_guide: ImplementationGuide,
    pub assessment_rubrics: BTreeMap<GradeLevel, Rubric>,
}

impl WorksheetPacket {
    /// Build from OCR output. No requested grades means the suggested ones.
    pub fn from_extracted(
        extracted: &ExtractedContent,
        subject_hint: Option<Subject>,
        grades: &[GradeLevel],
        language: LanguagePreference,
    ) -> Self {
        let original = OriginalContent {
            extracted_text: extracted.text.clone(),
            detected_language: extracted.language,
            confidence: extracted.confidence,
        };
        Self::assemble(original, subject_hint, grades, language)
    }

    /// Build from typed text.
    pub fn from_text(
        text: &str,
        subject_hint: Option<Subject>,
        grades: &[GradeLevel],
        language: LanguagePreference,
    ) -> Self {
        let original = OriginalContent {
            extracted_text: text.trim().to_string(),
            detected_language: detect_language(text),
            confidence: 1.0,
        };
        Self::assemble(original, subject_hint, grades, language)
    }

    fn assemble(
        original: OriginalContent,
        subject_hint: Option<Subject>,
        grades: &[GradeLevel],
        language: LanguagePreference,
    ) -> Self {
        let analysis = analyze_content(&original.extracted_text, subject_hint);
        let grades = if grades.is_empty() {
            analysis.suggested_grades.clone()
        } else {
            grades.to_vec()
        };

        let worksheets = generate_worksheets(&analysis, &grades, language);
        let assessment_rubrics = worksheets
            .keys()
            .map(|&grade| (grade, assessment_rubric(grade)))
            .collect();

        info!(
            subject = %analysis.subject,
            worksheets = worksheets.len(),
            "Built worksheet packet"
        );

        Self {
            original_content: original,
            content_analysis: analysis,
            worksheets,
            visual_elements: vec![VisualElement::blackboard_diagram()],
            teacher_notes: TeacherNotes::default(),
            implementation_guide: ImplementationGuide::default(),
            assessment_rubrics,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

//! Prompt templates for the teaching agents.
//!
//! Every user prompt carries the target grade's profile so the model pitches
//! vocabulary, length and activities at the right level.

use pedagogy::{CulturalContext, GradeLevel, GradeProfile, StorySetting};

use crate::capability::Capability;

/// System instructions for a capability.
pub fn system_prompt(capability: Capability) -> &'static str {
    match capability {
        Capability::ContentGeneration => {
            "You create educational content for rural Indian classrooms. Stories and \
             examples use familiar settings: farms, villages, local markets and festivals. \
             Characters are farmers, teachers, artisans and family members. Respect local \
             customs, keep the language simple for the grade and end with a clear lesson."
        }
        Capability::KnowledgeExplanation => {
            "You explain concepts to school children in simple, accurate language. Use \
             local, culturally familiar examples and short sentences. Never introduce a \
             term without explaining it."
        }
        Capability::VisualAid => {
            "You design visual aids that a teacher can draw on a blackboard with chalk. \
             Drawings must be simple, uncluttered and labelled with the key parts. \
             Describe them as numbered drawing steps."
        }
        Capability::AssessmentPlanning => {
            "You plan lessons and assessments for multi-grade Indian classrooms where one \
             teacher handles several grades at once. Assume limited materials, mixed \
             reading levels and local language needs."
        }
        Capability::WorksheetGeneration => {
            "You turn textbook pages into differentiated worksheets for grades 1 to 8. \
             Start with concrete activities, use local examples and give clear teacher \
             instructions."
        }
    }
}

/// Instructions for the request router.
pub const COORDINATOR_SYSTEM_PROMPT: &str =
    "You are GuruAI, a teaching assistant for multi-grade Indian classrooms. You read \
     teacher requests and decide which specialists should answer them: a content \
     generator for stories, a knowledge base for explanations, a visual aid generator \
     for blackboard diagrams, an assessment planner for lesson plans and a worksheet \
     processor for worksheets.";

/// Classifier prompt asking for a JSON routing plan.
pub fn intent_prompt(request: &str) -> String {
    format!(
        "Analyze the following teacher request and decide which specialists are needed.\n\n\
         Request: {request}\n\n\
         Specialists: content_generator (stories, examples), knowledge_base (explanations), \
         visual_aid_generator (blackboard diagrams), assessment_planner (lesson plans, \
         assessments, games), worksheet_processor (worksheets).\n\n\
         Reply with only a JSON object:\n\
         {{\"primary_intent\": \"content|knowledge|visual|assessment|worksheet\", \
         \"required_agents\": [\"...\"], \"parameters\": {{}}}}\n\
         Put any subject, duration in days or grade you notice into parameters. When the \
         teacher wants something narrower than the specialist's default, add a \"task\" \
         parameter: analogy or translate (content), follow_up or check_understanding \
         (knowledge), chart (visual), game (assessment)."
    )
}

pub fn story_prompt(
    topic: &str,
    profile: &GradeProfile,
    context: &CulturalContext,
    setting: &StorySetting,
) -> String {
    format!(
        "Write a short educational story about: {topic}\n\n\
         Audience: {}\n\
         Cultural context: {}\n\
         Setting: {} ({}).\n\n\
         Keep it within {} minutes of reading aloud. Use characters and objects the \
         children see every day and finish with a one-line moral.",
        profile.prompt_summary(),
        context.prompt_summary(),
        setting.location,
        setting.description,
        profile.attention_span_minutes,
    )
}

pub fn analogy_prompt(concept: &str, profile: &GradeProfile, context: &CulturalContext) -> String {
    format!(
        "Create two analogies that explain \"{concept}\" using everyday village life.\n\n\
         Audience: {}\n\
         Cultural context: {}\n\n\
         For each analogy give the comparison in one sentence, then a short explanation \
         of how it maps onto the concept.",
        profile.prompt_summary(),
        context.prompt_summary(),
    )
}

pub fn explanation_prompt(question: &str, profile: &GradeProfile) -> String {
    format!(
        "Explain the following so a child can understand it.\n\n\
         Question: {question}\n\
         Audience: {}\n\n\
         Use at most {} short sentences and one local example.",
        profile.prompt_summary(),
        explanation_sentences(profile.grade),
    )
}

/// Short analogy appended to an explanation.
pub fn simple_analogy_prompt(concept: &str, profile: &GradeProfile) -> String {
    format!(
        "Give one simple analogy from village life for: {concept}\n\
         Audience: {}\n\
         Reply with the analogy only, in two or three sentences.",
        profile.prompt_summary(),
    )
}

pub fn follow_up_prompt(question: &str, profile: &GradeProfile) -> String {
    format!(
        "Based on the question \"{question}\", write 3 follow-up questions that deepen \
         understanding for a grade {} student. Make each one a little harder than the \
         last.\n\
         Audience: {}\n\
         Reply with one question per line and nothing else.",
        profile.grade.number(),
        profile.prompt_summary(),
    )
}

pub fn check_understanding_prompt(
    concept: &str,
    explanation: &str,
    profile: &GradeProfile,
) -> String {
    format!(
        "Write 2 or 3 simple questions that check whether a grade {} student understood \
         \"{concept}\".\n\
         Audience: {}\n\n\
         Explanation they heard:\n{explanation}\n\n\
         Reply with one question per line and nothing else.",
        profile.grade.number(),
        profile.prompt_summary(),
    )
}

pub fn diagram_prompt(concept: &str, diagram_type: &str, profile: &GradeProfile) -> String {
    format!(
        "Design a {diagram_type} of \"{concept}\" that a teacher can draw on a blackboard.\n\
         Audience: {}\n\n\
         {DRAWING_PLAN_FORMAT}",
        profile.prompt_summary(),
    )
}

pub fn chart_prompt(data: &str, chart_type: &str, profile: &GradeProfile) -> String {
    format!(
        "Design a {chart_type} chart for this data that a teacher can draw on a blackboard.\n\
         Data: {data}\n\
         Audience: {}\n\n\
         {DRAWING_PLAN_FORMAT}",
        profile.prompt_summary(),
    )
}

const DRAWING_PLAN_FORMAT: &str = "Reply with only a JSON object: \
    {\"title\": \"...\", \"steps\": [\"numbered drawing steps\"], \
    \"labels\": [\"text written on the drawing\"], \"materials\": [\"chalk\", \"...\"]}";

pub fn lesson_plan_prompt(subjects: &[String], grades: &[GradeLevel], days: u32) -> String {
    format!(
        "Create a {days}-day lesson plan for a multi-grade classroom.\n\
         Subjects: {}\n\
         Learners:\n{}\n\n\
         Reply with only a JSON object with keys \"overview\", \"objectives\" (list), \
         \"days\" (list of objects with \"day\", \"activities\" and \"materials\") and \
         \"assessment\". Plan activities that keep every grade busy while the teacher \
         works with one group.",
        subjects.join(", "),
        profiles_block(grades),
    )
}

pub fn game_prompt(concept: &str, grades: &[GradeLevel], game_type: &str) -> String {
    format!(
        "Design an {game_type} classroom game that teaches \"{concept}\".\n\
         Learners:\n{}\n\n\
         Reply with only a JSON object with keys \"name\", \"objective\", \"materials\" \
         (list), \"rules\" (list) and \"variations\" (object keyed by grade). Use only \
         materials a village school has.",
        profiles_block(grades),
    )
}

pub fn reading_feedback_prompt(
    transcript: &str,
    expected: Option<&str>,
    profile: &GradeProfile,
    language: &str,
) -> String {
    let expected = expected
        .map(|e| format!("Expected text:\n{e}\n\n"))
        .unwrap_or_default();
    format!(
        "A student read aloud in {language}. Assess their reading.\n\
         Audience: {}\n\n\
         {expected}What the student read:\n{transcript}\n\n\
         Give short, encouraging feedback: what went well, two things to practise, and \
         one activity the teacher can use.",
        profile.prompt_summary(),
    )
}

fn profiles_block(grades: &[GradeLevel]) -> String {
    grades
        .iter()
        .map(|&g| format!("- {}", GradeProfile::for_grade(g).prompt_summary()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn explanation_sentences(grade: GradeLevel) -> u8 {
    match grade.number() {
        1..=2 => 4,
        3..=5 => 6,
        _ => 8,
    }
}

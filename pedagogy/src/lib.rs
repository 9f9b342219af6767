//! Grade differentiation and worksheet rules for multi-grade classrooms.
//!
//! This crate holds the deterministic part of the teaching assistant:
//!
//! - **Grade profiles**: a fixed table of what learners in grades 1-8 can do
//! - **Differentiation**: adapting one piece of content to several grades
//! - **Extraction**: cleaning and structuring OCR output from textbook photos
//! - **Analysis**: subject, complexity and concept detection over that text
//! - **Worksheets**: one worksheet per grade, sectioned by grade band
//! - **Culture**: regional context used to ground generated stories
//!
//! Nothing here performs I/O except [`DifferentiationModel::load_rules_file`].
//!
//! # Example
//!
//! ```
//! use pedagogy::{analyze_content, generate_worksheets, GradeLevel, LanguagePreference};
//!
//! let analysis = analyze_content("Plants need water and air. What do plants eat?", None);
//! let worksheets = generate_worksheets(
//!     &analysis,
//!     &[GradeLevel::Grade2, GradeLevel::Grade6],
//!     LanguagePreference::English,
//! );
//! assert_eq!(worksheets.len(), 2);
//! ```

pub mod analysis;
pub mod culture;
pub mod differentiation;
pub mod error;
pub mod extraction;
pub mod profile;
pub mod types;
pub mod worksheet;

pub use analysis::{analyze_content, ComplexityMetrics, ContentAnalysis, LanguageComplexity};
pub use culture::{CulturalAnalogy, CulturalContext, StorySetting};
pub use differentiation::{
    AssessmentMethod, ContentAdaptation, CrossGradeActivity, DifferentiationModel,
    GradeAdaptation, TeachingApproach,
};
pub use error::CurriculumError;
pub use extraction::{ExtractedContent, StructuredContent, TextRegion, Vertex};
pub use profile::GradeProfile;
pub use types::*;
pub use worksheet::{generate_worksheets, Worksheet, WorksheetPacket, WorksheetSection};

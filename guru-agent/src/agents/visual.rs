//! Blackboard drawing plans for diagrams and charts.

use pedagogy::{GradeLevel, GradeProfile};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{parse_json_reply, reply_lines, string_list, AgentContext};
use crate::capability::Capability;
use crate::error::AgentError;
use crate::prompts;

const CAPABILITY: Capability = Capability::VisualAid;

pub const DEFAULT_DIAGRAM_TYPE: &str = "line_drawing";
pub const DEFAULT_CHART_TYPE: &str = "bar";

/// Step-by-step instructions for drawing a visual aid with chalk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawingPlan {
    pub title: String,
    pub steps: Vec<String>,
    pub labels: Vec<String>,
    pub materials: Vec<String>,
}

impl DrawingPlan {
    /// Read a plan from a model reply.
    ///
    /// JSON replies are read field by field. Anything else becomes a plan
    /// whose steps are the reply's lines.
    pub fn from_reply(reply: &str, fallback_title: &str) -> Self {
        let Some(value) = parse_json_reply(reply).filter(Value::is_object) else {
            warn!("Drawing plan reply was not JSON, using plain steps");
            return Self {
                title: fallback_title.to_string(),
                steps: reply_lines(reply),
                labels: Vec::new(),
                materials: default_materials(),
            };
        };

        let title = value
            .get("title")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(fallback_title)
            .to_string();
        let materials = string_list(&value, "materials");

        Self {
            title,
            steps: string_list(&value, "steps"),
            labels: string_list(&value, "labels"),
            materials: if materials.is_empty() {
                default_materials()
            } else {
                materials
            },
        }
    }
}

fn default_materials() -> Vec<String> {
    vec!["chalk".to_string(), "duster".to_string()]
}

/// A drawing plan and what it was made for.
#[derive(Debug, Clone, Serialize)]
pub struct VisualAid {
    pub concept: String,
    pub language: String,
    pub grade_level: GradeLevel,
    /// Diagram style or chart type
    pub visual_type: String,
    pub plan: DrawingPlan,
    /// Source data for charts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Clone)]
pub struct VisualAgent {
    ctx: AgentContext,
}

impl VisualAgent {
    pub fn new(ctx: AgentContext) -> Self {
        Self { ctx }
    }

    pub async fn create_diagram(
        &self,
        concept: &str,
        language: &str,
        grade: GradeLevel,
        diagram_type: Option<&str>,
    ) -> Result<VisualAid, AgentError> {
        let concept = concept.trim();
        if concept.is_empty() {
            return Err(AgentError::InvalidRequest("concept is empty".to_string()));
        }
        let diagram_type = diagram_type.unwrap_or(DEFAULT_DIAGRAM_TYPE);
        let profile = GradeProfile::for_grade(grade);

        let reply = self
            .ctx
            .generate_json(CAPABILITY, prompts::diagram_prompt(concept, diagram_type, &profile))
            .await?;
        let plan = self
            .localize_plan(DrawingPlan::from_reply(&reply, concept), language)
            .await?;

        debug!(concept, steps = plan.steps.len(), "Diagram planned");

        Ok(VisualAid {
            concept: concept.to_string(),
            language: language.to_string(),
            grade_level: grade,
            visual_type: diagram_type.to_string(),
            plan,
            data: None,
        })
    }

    pub async fn create_chart(
        &self,
        data: Value,
        chart_type: &str,
        language: &str,
        grade: GradeLevel,
    ) -> Result<VisualAid, AgentError> {
        if data.is_null() {
            return Err(AgentError::InvalidRequest("chart data is empty".to_string()));
        }
        let profile = GradeProfile::for_grade(grade);
        let title = format!("{chart_type} chart");

        let reply = self
            .ctx
            .generate_json(
                CAPABILITY,
                prompts::chart_prompt(&data.to_string(), chart_type, &profile),
            )
            .await?;
        let plan = self
            .localize_plan(DrawingPlan::from_reply(&reply, &title), language)
            .await?;

        Ok(VisualAid {
            concept: plan.title.clone(),
            language: language.to_string(),
            grade_level: grade,
            visual_type: chart_type.to_string(),
            plan,
            data: Some(data),
        })
    }

    /// Labels are written on the board, so only they are translated.
    async fn localize_plan(
        &self,
        mut plan: DrawingPlan,
        language: &str,
    ) -> Result<DrawingPlan, AgentError> {
        plan.labels = self
            .ctx
            .localize_all(std::mem::take(&mut plan.labels), language)
            .await?;
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::context;
    use crate::backend::MockBackend;
    use serde_json::json;
    use std::sync::Arc;

    const PLAN: &str = r#"{"title": "Parts of a plant", "steps": ["Draw the stem", "Add leaves"], "labels": ["root", "leaf"], "materials": ["white chalk"]}"#;

    #[test]
    fn test_plan_from_plain_reply() {
        let plan = DrawingPlan::from_reply("1. Draw a circle\n2. Add rays", "Sun");
        assert_eq!(plan.title, "Sun");
        assert_eq!(plan.steps, vec!["Draw a circle", "Add rays"]);
        assert_eq!(plan.materials, vec!["chalk", "duster"]);
    }

    #[test]
    fn test_plan_missing_fields() {
        let plan = DrawingPlan::from_reply(r#"{"steps": ["one"]}"#, "Water cycle");
        assert_eq!(plan.title, "Water cycle");
        assert!(plan.labels.is_empty());
        assert_eq!(plan.materials, default_materials());
    }

    #[tokio::test]
    async fn test_diagram_labels_translated() {
        let backend = Arc::new(MockBackend::default().with_response(PLAN));
        let agent = VisualAgent::new(context(backend.clone()));

        let aid = agent
            .create_diagram("plant", "hindi", GradeLevel::Grade3, None)
            .await
            .unwrap();

        assert_eq!(aid.visual_type, DEFAULT_DIAGRAM_TYPE);
        assert_eq!(aid.plan.title, "Parts of a plant");
        assert_eq!(aid.plan.steps, vec!["Draw the stem", "Add leaves"]);
        assert_eq!(aid.plan.labels, vec!["[hi] root", "[hi] leaf"]);
        assert_eq!(backend.last_request().unwrap().temperature, Some(0.2));
    }

    #[tokio::test]
    async fn test_chart_keeps_data() {
        let backend = Arc::new(MockBackend::default().with_response(PLAN));
        let agent = VisualAgent::new(context(backend.clone()));

        let data = json!({"wheat": 10, "rice": 6});
        let aid = agent
            .create_chart(data.clone(), "bar", "english", GradeLevel::Grade6)
            .await
            .unwrap();
        assert_eq!(aid.data, Some(data));
        assert_eq!(aid.plan.labels, vec!["root", "leaf"]);
        assert!(backend
            .last_request()
            .unwrap()
            .last_user_message()
            .unwrap()
            .contains("wheat"));
    }

    #[tokio::test]
    async fn test_chart_requires_data() {
        let agent = VisualAgent::new(context(Arc::new(MockBackend::default())));
        assert!(agent
            .create_chart(Value::Null, "bar", "english", GradeLevel::Grade6)
            .await
            .is_err());
    }
}

//! Intake: turns the free-form description into requirements and constraints.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{ask_structured, format_history, project_brief};
use crate::config::WorkflowConfig;
use crate::domain::advisory::{Constraint, ProjectContext, Requirement};
use crate::domain::workflow::{NodeId, NodeOutcome};
use crate::ports::ReasoningProvider;

pub const TASK: &str = "Task: project intake";

const FALLBACK_QUESTIONS: [&str; 4] = [
    "What product or service are you building?",
    "Who are the users, and roughly how many do you expect?",
    "Is there a deadline or budget you have to work within?",
    "Are there technologies your team already knows or must use?",
];

#[derive(Debug, Deserialize)]
struct IntakeResponse {
    #[serde(default)]
    project_name: Option<String>,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    requirements: Vec<Requirement>,
    #[serde(default)]
    constraints: Vec<Constraint>,
    #[serde(default)]
    questions: Vec<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

fn schema() -> Value {
    let priority = json!({"type": "string", "enum": ["critical", "high", "medium", "low"]});
    json!({
        "type": "object",
        "required": ["summary", "requirements", "constraints"],
        "properties": {
            "project_name": {"type": ["string", "null"]},
            "summary": {"type": "string"},
            "requirements": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["category", "description"],
                    "properties": {
                        "category": {"type": "string", "enum": ["functional", "non_functional"]},
                        "description": {"type": "string"},
                        "priority": priority.clone()
                    }
                }
            },
            "constraints": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["type", "description"],
                    "properties": {
                        "type": {
                            "type": "string",
                            "enum": ["technical", "budget", "timeline", "compliance", "team"]
                        },
                        "description": {"type": "string"},
                        "severity": priority
                    }
                }
            },
            "questions": {"type": "array", "items": {"type": "string"}},
            "confidence": {"type": "number", "minimum": 0, "maximum": 1}
        }
    })
}

fn build_prompt(ctx: &ProjectContext, follow_up: Option<&str>, config: &WorkflowConfig) -> String {
    let mut prompt = format!(
        "{TASK}\n\nExtract the project name, a two-sentence summary, functional and \
non-functional requirements, constraints (budget, timeline, team, compliance, technical) \
and up to {} clarifying questions from the conversation below. Rate how well you \
understand the project from 0 to 1.\n\n{}",
        config.max_intake_questions,
        project_brief(ctx)
    );
    if let Some(extra) = follow_up {
        prompt.push_str(&format!("\nAdditional input from the user:\n{extra}\n"));
    }
    let history = format_history(ctx, config.history_limit);
    if !history.is_empty() {
        prompt.push_str(&format!("\nConversation so far:\n{history}\n"));
    }
    prompt
}

pub async fn run<P>(mut ctx: ProjectContext, provider: &P, config: &WorkflowConfig) -> NodeOutcome
where
    P: ReasoningProvider + ?Sized,
{
    info!(session_id = %ctx.session_id, node = "intake", "Running intake");

    let follow_up = ctx.unprocessed_input.take();
    let prompt = build_prompt(&ctx, follow_up.as_deref(), config);

    let Some(response) =
        ask_structured::<IntakeResponse, _>(provider, &ctx, NodeId::Intake, &prompt, &schema()).await
    else {
        // keep the follow-up for a later node
        ctx.unprocessed_input = follow_up;
        ctx.open_questions = FALLBACK_QUESTIONS.iter().map(|q| q.to_string()).collect();
        let reply = format!(
            "I need a bit more information before I can recommend anything.\n\n{}",
            numbered(&ctx.open_questions)
        );
        return NodeOutcome::proceed(ctx, reply);
    };

    if let Some(name) = response.project_name.filter(|n| !n.trim().is_empty()) {
        ctx.project_name = Some(name.trim().to_string());
    }
    let requirement_count = response.requirements.len();
    for requirement in response.requirements {
        if !requirement.description.trim().is_empty() {
            ctx.add_requirement(requirement.with_source("intake"));
        }
    }
    let constraints = response.constraints;
    for constraint in &constraints {
        if !constraint.description.trim().is_empty() {
            ctx.add_constraint(constraint.clone());
        }
    }
    ctx.open_questions = response
        .questions
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .take(config.max_intake_questions)
        .collect();
    if let Some(confidence) = response.confidence {
        ctx.set_confidence(confidence);
    }

    info!(
        session_id = %ctx.session_id,
        requirements = ctx.requirements().len(),
        constraints = ctx.constraints().len(),
        confidence = ctx.confidence_score(),
        "Intake complete"
    );

    let reply = build_reply(&ctx, &response.summary, requirement_count, &constraints);
    NodeOutcome::proceed(ctx, reply)
}

fn numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, q)| format!("{}. {q}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_reply(
    ctx: &ProjectContext,
    summary: &str,
    requirement_count: usize,
    constraints: &[Constraint],
) -> String {
    let mut parts = vec![format!(
        "## {}",
        ctx.project_name.as_deref().unwrap_or("Your project")
    )];
    if !summary.trim().is_empty() {
        parts.push(summary.trim().to_string());
    }
    parts.push(format!("Requirements identified: {requirement_count}"));
    if !constraints.is_empty() {
        parts.push("Constraints:".to_string());
        for c in constraints.iter().take(3) {
            parts.push(format!("- {} ({}): {}", c.kind.label(), c.severity, c.description));
        }
    }
    if !ctx.open_questions.is_empty() {
        parts.push(format!("Open questions:\n{}", numbered(&ctx.open_questions)));
    }
    parts.join("\n\n")
}

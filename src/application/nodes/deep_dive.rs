//! DeepDive: technical follow-up questions on the first pass, fact
//! extraction from follow-up messages once a document exists.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::clarification::{self, ADDITIONAL_INFO_KEY};
use super::{ask_structured, project_brief, ResponseOutcome};
use crate::config::WorkflowConfig;
use crate::domain::advisory::{AskedQuestion, CriticQuestion, Fact, FactSource, ProjectContext};
use crate::domain::workflow::{NodeId, NodeOutcome};
use crate::ports::ReasoningProvider;

pub const TASK_QUESTIONS: &str = "Task: technical deep dive questions";
pub const TASK_FACTS: &str = "Task: fact extraction";

/// Questions asked per deep-dive pass.
const MAX_QUESTIONS: usize = 3;

#[derive(Debug, Deserialize)]
struct DeepDiveQuestions {
    #[serde(default)]
    questions: Vec<CriticQuestion>,
}

#[derive(Debug, Deserialize)]
struct ExtractedFacts {
    #[serde(default)]
    facts: Vec<ExtractedFact>,
}

#[derive(Debug, Deserialize)]
struct ExtractedFact {
    key: String,
    value: String,
}

fn questions_schema() -> Value {
    json!({
        "type": "object",
        "required": ["questions"],
        "properties": {
            "questions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["question"],
                    "properties": {
                        "question": {"type": "string"},
                        "impact": {"type": "string", "enum": ["high", "medium", "low"]},
                        "why_it_matters": {"type": "string"}
                    }
                }
            }
        }
    })
}

fn facts_schema() -> Value {
    json!({
        "type": "object",
        "required": ["facts"],
        "properties": {
            "facts": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["key", "value"],
                    "properties": {
                        "key": {"type": "string"},
                        "value": {"type": "string"}
                    }
                }
            }
        }
    })
}

pub async fn run<P>(mut ctx: ProjectContext, provider: &P, _config: &WorkflowConfig) -> NodeOutcome
where
    P: ReasoningProvider + ?Sized,
{
    info!(session_id = %ctx.session_id, node = "deep_dive", "Running deep dive");

    if let Some(message) = ctx.unprocessed_input.take() {
        extract_facts(&mut ctx, provider, &message).await;
    }

    if ctx.document.is_some() || ctx.deep_dive_completed {
        ctx.deep_dive_completed = true;
        return NodeOutcome::pass(ctx);
    }

    let prompt = format!(
        "{TASK_QUESTIONS}\n\nAsk at most {MAX_QUESTIONS} technical questions whose answers \
would most change the architecture choice (data volume, integrations, availability, \
compliance). Skip anything already answered below.\n\n{}\nAlready asked:\n{}",
        project_brief(&ctx),
        ctx.asked_questions()
            .iter()
            .map(|q| format!("- {}", q.question))
            .collect::<Vec<_>>()
            .join("\n")
    );
    let candidates = ask_structured::<DeepDiveQuestions, _>(
        provider,
        &ctx,
        NodeId::DeepDive,
        &prompt,
        &questions_schema(),
    )
    .await
    .map(|r| r.questions)
    .unwrap_or_default();

    let fresh: Vec<AskedQuestion> = candidates
        .into_iter()
        .take(MAX_QUESTIONS)
        .filter_map(|q| ctx.record_asked_question(q.question, q.impact, q.why_it_matters))
        .collect();

    if fresh.is_empty() {
        debug!(session_id = %ctx.session_id, "No deep-dive questions to ask");
        ctx.deep_dive_completed = true;
        return NodeOutcome::pass(ctx);
    }

    let reply = format!(
        "Before I compare options, a few technical questions:\n\n{}",
        fresh
            .iter()
            .enumerate()
            .map(|(i, q)| format!("{}. {}", i + 1, q.question))
            .collect::<Vec<_>>()
            .join("\n")
    );
    info!(session_id = %ctx.session_id, questions = fresh.len(), "Asking deep-dive questions");
    ctx.pending_questions = fresh;
    ctx.waiting_for_user = true;
    NodeOutcome::suspend(ctx, reply)
}

/// Folds the answers to the deep-dive questions into the fact base.
pub async fn process_response<P>(
    ctx: &mut ProjectContext,
    provider: &P,
    message: &str,
) -> ResponseOutcome
where
    P: ReasoningProvider + ?Sized,
{
    clarification::reconcile_answers(ctx, provider, message).await;
    ctx.deep_dive_completed = true;
    ResponseOutcome::Resolved
}

async fn extract_facts<P>(ctx: &mut ProjectContext, provider: &P, message: &str)
where
    P: ReasoningProvider + ?Sized,
{
    if message.trim().is_empty() {
        return;
    }
    let prompt = format!(
        "{TASK_FACTS}\n\nExtract concrete facts about the project from the user's message \
as short snake_case keys with plain values. Return an empty list if there are none.\n\n\
Message:\n{message}"
    );
    let extracted =
        ask_structured::<ExtractedFacts, _>(provider, ctx, NodeId::DeepDive, &prompt, &facts_schema())
            .await;

    match extracted {
        Some(result) => {
            for fact in result.facts {
                if fact.key.trim().is_empty() || fact.value.trim().is_empty() {
                    continue;
                }
                ctx.add_fact(
                    Fact::new(fact.key.trim(), fact.value.trim(), FactSource::FollowUp)
                        .with_raw_value(message),
                );
            }
        }
        None => ctx.add_fact(Fact::new(ADDITIONAL_INFO_KEY, message.trim(), FactSource::FollowUp)),
    }
}

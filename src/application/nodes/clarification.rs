//! Clarification: asks the critic's open questions and folds the answers
//! back into the fact base.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{ask_structured, ask_text};
use crate::config::WorkflowConfig;
use crate::domain::advisory::{AskedQuestion, Fact, FactSource, ProjectContext};
use crate::domain::workflow::{NodeId, NodeOutcome};
use crate::ports::ReasoningProvider;

pub const TASK_RENDER: &str = "Task: clarification questions";
pub const TASK_RECONCILE: &str = "Task: answer reconciliation";

/// Fact key used when an answer could not be mapped to specific questions.
pub const ADDITIONAL_INFO_KEY: &str = "user_additional_info";

/// Answer values that mean "no answer".
const NON_ANSWERS: [&str; 4] = ["", "unknown", "null", "n/a"];

#[derive(Debug, Deserialize)]
struct Reconciliation {
    #[serde(default)]
    answers: Vec<ReconciledAnswer>,
}

#[derive(Debug, Deserialize)]
struct ReconciledAnswer {
    question_id: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    normalized_key: Option<String>,
    #[serde(default)]
    normalized_value: Option<String>,
}

fn reconcile_schema() -> Value {
    json!({
        "type": "object",
        "required": ["answers"],
        "properties": {
            "answers": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["question_id"],
                    "properties": {
                        "question_id": {"type": "string"},
                        "value": {"type": ["string", "null"]},
                        "normalized_key": {"type": ["string", "null"]},
                        "normalized_value": {"type": ["string", "null"]}
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
    info!(session_id = %ctx.session_id, node = "clarification", "Running clarification");

    let candidates = ctx
        .last_critique
        .as_ref()
        .map(|c| c.questions_to_ask.clone())
        .unwrap_or_default();
    let fresh: Vec<AskedQuestion> = candidates
        .into_iter()
        .filter_map(|q| ctx.record_asked_question(q.question, q.impact, q.why_it_matters))
        .collect();

    if fresh.is_empty() {
        debug!(session_id = %ctx.session_id, "No unasked questions left");
        ctx.waiting_for_user = false;
        return NodeOutcome::proceed(
            ctx,
            "I have no new questions, so I'll continue with the information we already have.",
        );
    }

    let prompt = format!(
        "{TASK_RENDER}\n\nWrite a short, friendly message asking the user the following \
questions. Keep them numbered and mention briefly why each matters.\n\n{}",
        fresh
            .iter()
            .map(|q| format!("- {} (why: {})", q.question, q.why_it_matters))
            .collect::<Vec<_>>()
            .join("\n")
    );
    let reply = match ask_text(provider, &ctx, NodeId::Clarification, prompt).await {
        Some(text) => text,
        None => template(&fresh),
    };

    info!(session_id = %ctx.session_id, questions = fresh.len(), "Asking clarification questions");
    ctx.pending_questions = fresh;
    ctx.waiting_for_user = true;
    NodeOutcome::suspend(ctx, reply)
}

fn template(questions: &[AskedQuestion]) -> String {
    let list = questions
        .iter()
        .enumerate()
        .map(|(i, q)| {
            if q.why_it_matters.trim().is_empty() {
                format!("{}. {}", i + 1, q.question)
            } else {
                format!("{}. {} ({})", i + 1, q.question, q.why_it_matters)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("A few questions would sharpen the recommendation:\n\n{list}")
}

/// Maps a free-text reply onto the pending questions and records the answers
/// as facts. Does nothing when no question is pending.
///
/// Answers the reasoning service marks as unknown are dropped. If the
/// service fails, the whole reply is kept as a single fact so it is not lost.
pub async fn reconcile_answers<P>(ctx: &mut ProjectContext, provider: &P, message: &str)
where
    P: ReasoningProvider + ?Sized,
{
    if ctx.pending_questions.is_empty() {
        return;
    }

    let questions = ctx
        .pending_questions
        .iter()
        .map(|q| format!("- {}: {}", q.id, q.question))
        .collect::<Vec<_>>()
        .join("\n");
    let prompt = format!(
        "{TASK_RECONCILE}\n\nMatch the user's reply to the questions below. For each \
question the reply answers, give the question id, the answer as stated, and a short \
snake_case key with a normalized value. Use null when a question is not answered.\n\n\
Questions:\n{questions}\n\nReply:\n{message}"
    );

    let reconciled = ask_structured::<Reconciliation, _>(
        provider,
        ctx,
        NodeId::Clarification,
        &prompt,
        &reconcile_schema(),
    )
    .await;

    match reconciled {
        Some(result) => {
            let mut recorded = 0;
            for answer in result.answers {
                if !ctx.pending_questions.iter().any(|q| q.id == answer.question_id) {
                    continue;
                }
                let raw = answer.value.unwrap_or_default();
                if is_non_answer(&raw) {
                    continue;
                }
                let key = answer
                    .normalized_key
                    .filter(|k| !k.trim().is_empty())
                    .unwrap_or_else(|| answer.question_id.clone());
                let value = answer
                    .normalized_value
                    .filter(|v| !is_non_answer(v))
                    .unwrap_or_else(|| raw.clone());
                ctx.add_fact(
                    Fact::new(key.trim(), value.trim(), FactSource::UserAnswer)
                        .answering(answer.question_id)
                        .with_raw_value(raw.trim()),
                );
                recorded += 1;
            }
            info!(session_id = %ctx.session_id, recorded, "Reconciled answers");
        }
        None => {
            ctx.add_fact(
                Fact::new(ADDITIONAL_INFO_KEY, message.trim(), FactSource::UserAnswer)
                    .with_raw_value(message),
            );
        }
    }

    ctx.pending_questions.clear();
    ctx.waiting_for_user = false;
}

fn is_non_answer(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    NON_ANSWERS.contains(&value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::reasoning::{MockError, MockReasoningProvider};
    use crate::domain::advisory::{CriticQuestion, Critique, QuestionImpact};
    use crate::domain::foundation::SessionId;
    use crate::domain::workflow::Signal;

    fn with_questions(questions: &[&str]) -> ProjectContext {
        let mut ctx = ProjectContext::new(SessionId::new(), "Inventory tool");
        let mut critique = Critique::conservative();
        critique.questions_to_ask = questions
            .iter()
            .map(|q| CriticQuestion {
                question: q.to_string(),
                impact: QuestionImpact::High,
                why_it_matters: "drives sizing".into(),
            })
            .collect();
        ctx.last_critique = Some(critique);
        ctx
    }

    fn pending(ctx: &mut ProjectContext, questions: &[&str]) {
        let asked: Vec<AskedQuestion> = questions
            .iter()
            .filter_map(|q| ctx.record_asked_question(*q, QuestionImpact::Medium, ""))
            .collect();
        ctx.pending_questions = asked;
        ctx.waiting_for_user = true;
    }

    #[tokio::test]
    async fn suspends_with_rendered_questions() {
        let provider = MockReasoningProvider::new()
            .when_prompt_contains(TASK_RENDER, "Could you tell me about your traffic?");
        let ctx = with_questions(&["How many orders per day?"]);

        let outcome = run(ctx, &provider, &WorkflowConfig::default()).await;

        assert_eq!(outcome.signal, Signal::Suspend);
        assert_eq!(outcome.message.as_deref(), Some("Could you tell me about your traffic?"));
        assert_eq!(outcome.state.pending_questions.len(), 1);
        assert_eq!(outcome.state.asked_questions().len(), 1);
        assert!(outcome.state.waiting_for_user);
    }

    #[tokio::test]
    async fn falls_back_to_template() {
        let provider = MockReasoningProvider::unavailable();
        let ctx = with_questions(&["How many orders per day?", "Which regions do you serve?"]);

        let outcome = run(ctx, &provider, &WorkflowConfig::default()).await;

        let message = outcome.message.unwrap();
        assert!(message.contains("1. How many orders per day?"));
        assert!(message.contains("2. Which regions do you serve?"));
    }

    #[tokio::test]
    async fn already_asked_questions_are_not_repeated() {
        let provider = MockReasoningProvider::unavailable();
        let mut ctx = with_questions(&["How many orders per day?"]);
        ctx.record_asked_question("How many orders per day?", QuestionImpact::High, "");

        let outcome = run(ctx, &provider, &WorkflowConfig::default()).await;

        assert_eq!(outcome.signal, Signal::Continue);
        assert!(!outcome.state.waiting_for_user);
        assert!(outcome.state.pending_questions.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn reconciled_answers_become_facts() {
        let provider = MockReasoningProvider::new().when_prompt_contains_json(
            TASK_RECONCILE,
            json!({"answers": [
                {"question_id": "q1", "value": "about 500", "normalized_key": "daily_orders", "normalized_value": "500"},
                {"question_id": "q2", "value": "unknown"},
                {"question_id": "q9", "value": "stray"}
            ]}),
        );
        let mut ctx = ProjectContext::new(SessionId::new(), "x");
        pending(&mut ctx, &["How many orders per day?", "Which regions do you serve?"]);

        reconcile_answers(&mut ctx, &provider, "About 500 a day, not sure about regions").await;

        assert_eq!(ctx.facts().len(), 1);
        let fact = &ctx.facts()[0];
        assert_eq!(fact.key, "daily_orders");
        assert_eq!(fact.value, "500");
        assert_eq!(fact.question_id.as_deref(), Some("q1"));
        assert_eq!(fact.raw_value.as_deref(), Some("about 500"));
        assert!(ctx.pending_questions.is_empty());
        assert!(!ctx.waiting_for_user);
    }

    #[tokio::test]
    async fn later_answer_replaces_earlier_fact() {
        let answer = |id: &str, value: &str| {
            MockReasoningProvider::new().when_prompt_contains_json(
                TASK_RECONCILE,
                json!({"answers": [
                    {"question_id": id, "value": value, "normalized_key": "peak_users", "normalized_value": value}
                ]}),
            )
        };
        let mut ctx = ProjectContext::new(SessionId::new(), "x");

        pending(&mut ctx, &["How many concurrent users at peak?"]);
        reconcile_answers(&mut ctx, &answer("q1", "2000"), "2000").await;
        pending(&mut ctx, &["Which traffic spikes do you expect during launch week?"]);
        reconcile_answers(&mut ctx, &answer("q2", "5000"), "More like 5000").await;

        assert_eq!(ctx.facts().len(), 1);
        assert_eq!(ctx.facts()[0].key, "peak_users");
        assert_eq!(ctx.facts()[0].value, "5000");
        assert_eq!(ctx.facts()[0].question_id.as_deref(), Some("q2"));
    }

    #[tokio::test]
    async fn failed_reconciliation_keeps_the_whole_reply() {
        let provider = MockReasoningProvider::new()
            .when_prompt_contains_error(TASK_RECONCILE, MockError::Timeout { timeout_secs: 30 });
        let mut ctx = ProjectContext::new(SessionId::new(), "x");
        pending(&mut ctx, &["How many orders per day?"]);

        reconcile_answers(&mut ctx, &provider, "Roughly 500").await;

        assert_eq!(ctx.facts().len(), 1);
        assert_eq!(ctx.facts()[0].key, ADDITIONAL_INFO_KEY);
        assert_eq!(ctx.facts()[0].value, "Roughly 500");
        assert!(ctx.pending_questions.is_empty());
    }

    #[tokio::test]
    async fn nothing_pending_is_a_no_op() {
        let provider = MockReasoningProvider::unavailable();
        let mut ctx = ProjectContext::new(SessionId::new(), "x");

        reconcile_answers(&mut ctx, &provider, "hello").await;

        assert!(ctx.facts().is_empty());
        assert_eq!(provider.call_count(), 0);
    }
}

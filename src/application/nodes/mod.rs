//! Workflow nodes.
//!
//! Each node is a transform `(context, reasoning) -> NodeOutcome`. Nodes own
//! the context they are handed and return it inside the outcome; there is no
//! shared mutable state between them. Reasoning failures never escape a node:
//! they are logged and replaced by a deterministic default.
//!
//! Every prompt carries a `Task:` marker line (the `TASK` constants) so logs
//! and test doubles can tell the calls apart.

pub mod clarification;
pub mod conflict;
pub mod critic;
pub mod deep_dive;
pub mod feasibility;
pub mod intake;
pub mod option_scoring;
pub mod priority;
pub mod synthesis;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::domain::advisory::{MessageRole, PriorityDimension, ProjectContext};
use crate::domain::workflow::NodeId;
use crate::ports::{generate_typed, GenerateRequest, ReasoningProvider};

/// System prompt shared by every reasoning call.
pub const SYSTEM_PROMPT: &str = "You are a pragmatic senior software architect advising a team. \
Prefer simple, proven designs. Base every statement on the project information provided \
and say so when information is missing.";

/// Result of feeding a user reply to a node that suspended for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// The reply was understood; the workflow can run again.
    Resolved,
    /// The reply was not usable; stay suspended and show this message.
    Reprompt(String),
}

/// Structured call that logs and swallows failures.
pub(crate) async fn ask_structured<T, P>(
    provider: &P,
    ctx: &ProjectContext,
    node: NodeId,
    prompt: &str,
    schema: &Value,
) -> Option<T>
where
    T: DeserializeOwned,
    P: ReasoningProvider + ?Sized,
{
    match generate_typed(provider, prompt, schema, Some(SYSTEM_PROMPT)).await {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                session_id = %ctx.session_id,
                node = %node,
                provider = %provider.provider_info().name,
                error = %err,
                "Structured reasoning call failed, using fallback"
            );
            None
        }
    }
}

/// Free-text call that logs and swallows failures. Blank replies count as failures.
pub(crate) async fn ask_text<P>(
    provider: &P,
    ctx: &ProjectContext,
    node: NodeId,
    prompt: String,
) -> Option<String>
where
    P: ReasoningProvider + ?Sized,
{
    let request = GenerateRequest::new(prompt).with_system_prompt(SYSTEM_PROMPT);
    match provider.generate(request).await {
        Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Ok(_) => {
            warn!(session_id = %ctx.session_id, node = %node, "Empty reasoning reply, using fallback");
            None
        }
        Err(err) => {
            warn!(
                session_id = %ctx.session_id,
                node = %node,
                error = %err,
                "Reasoning call failed, using fallback"
            );
            None
        }
    }
}

/// Plain-text digest of what is known about the project, for prompts.
pub(crate) fn project_brief(ctx: &ProjectContext) -> String {
    let mut out = String::new();
    if let Some(name) = &ctx.project_name {
        out.push_str(&format!("Project: {name}\n"));
    }
    out.push_str(&format!("Description: {}\n", ctx.initial_summary));

    if !ctx.requirements().is_empty() {
        out.push_str("Requirements:\n");
        for req in ctx.requirements() {
            out.push_str(&format!("- [{}] {}\n", req.priority, req.description));
        }
    }
    if !ctx.constraints().is_empty() {
        out.push_str("Constraints:\n");
        for c in ctx.constraints() {
            out.push_str(&format!("- {} ({}): {}\n", c.kind.label(), c.severity, c.description));
        }
    }

    if let Some(ranking) = &ctx.priority_ranking {
        let values = PriorityDimension::ALL
            .iter()
            .map(|d| format!("{}={}", d.key(), ranking.get(*d)))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("Priority ranking (1-5): {values}\n"));
    } else if let Some(profile) = &ctx.decision_profile {
        out.push_str(&format!("Decision profile: {profile}\n"));
    }

    let resolved: Vec<_> = ctx
        .conflicts
        .iter()
        .filter_map(|c| c.chosen_compromise.as_ref().map(|choice| (&c.name, choice)))
        .collect();
    if !resolved.is_empty() {
        out.push_str("Resolved trade-offs:\n");
        for (name, choice) in resolved {
            out.push_str(&format!("- {name}: {choice}\n"));
        }
    }

    if !ctx.facts().is_empty() {
        out.push_str("Known facts:\n");
        for fact in ctx.facts() {
            out.push_str(&format!("- {}: {}\n", fact.key, fact.value));
        }
    }
    out
}

/// The last `limit` conversation messages as `role: content` lines.
pub(crate) fn format_history(ctx: &ProjectContext, limit: usize) -> String {
    ctx.recent_history(limit)
        .iter()
        .map(|msg| {
            let role = match msg.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            };
            format!("{role}: {}", msg.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders items as a markdown bullet list, at most `limit` entries.
pub(crate) fn bullets<S: AsRef<str>>(items: &[S], limit: usize) -> String {
    items
        .iter()
        .take(limit)
        .map(|item| format!("- {}", item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::reasoning::{MockError, MockReasoningProvider};
    use crate::domain::advisory::{Constraint, ConstraintKind, Priority, Requirement};
    use crate::domain::foundation::SessionId;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Answer {
        answer: u32,
    }

    #[test]
    fn brief_lists_requirements_and_constraints() {
        let mut ctx = ProjectContext::new(SessionId::new(), "A ticketing system");
        ctx.project_name = Some("Tix".into());
        ctx.add_requirement(Requirement::functional("Sell tickets", Priority::High));
        ctx.add_constraint(Constraint::new(ConstraintKind::Budget, "Small budget", Priority::Critical));

        let brief = project_brief(&ctx);
        assert!(brief.contains("Project: Tix"));
        assert!(brief.contains("Sell tickets"));
        assert!(brief.contains("Small budget"));
    }

    #[test]
    fn history_respects_limit() {
        let mut ctx = ProjectContext::new(SessionId::new(), "x");
        for i in 0..5 {
            ctx.add_user_message(format!("message {i}"));
        }
        let history = format_history(&ctx, 2);
        assert_eq!(history, "user: message 3\nuser: message 4");
    }

    #[tokio::test]
    async fn ask_structured_returns_none_on_failure() {
        let ctx = ProjectContext::new(SessionId::new(), "x");
        let schema = json!({"type": "object", "required": ["answer"]});
        let provider = MockReasoningProvider::new()
            .with_json(json!({"answer": 1}))
            .with_error(MockError::Network { message: "down".into() });

        let first: Option<Answer> =
            ask_structured(&provider, &ctx, NodeId::Intake, "q", &schema).await;
        assert_eq!(first.map(|a| a.answer), Some(1));

        let second: Option<Answer> =
            ask_structured(&provider, &ctx, NodeId::Intake, "q", &schema).await;
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn ask_text_treats_blank_as_failure() {
        let ctx = ProjectContext::new(SessionId::new(), "x");
        let provider = MockReasoningProvider::new().with_response("   ");
        assert!(ask_text(&provider, &ctx, NodeId::Clarification, "q".into()).await.is_none());
    }
}

//! The workflow engine: runs nodes from the routed entry point until one
//! suspends or the consultation reaches a terminal state.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info};

use super::nodes::{
    clarification, conflict, critic, deep_dive, feasibility, intake, option_scoring, priority,
    synthesis, ResponseOutcome,
};
use crate::config::WorkflowConfig;
use crate::domain::advisory::ProjectContext;
use crate::domain::foundation::SessionId;
use crate::domain::workflow::{NodeId, NodeOutcome, Transition, WorkflowRouter};
use crate::ports::{ReasoningProvider, SessionStoreError};

/// Errors returned by a consultation turn.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Step limit of {limit} exceeded in a single turn")]
    StepLimitExceeded { limit: u32 },

    #[error("State belongs to session {actual}, expected {expected}")]
    SessionMismatch {
        expected: SessionId,
        actual: SessionId,
    },

    #[error("Session store error: {0}")]
    Store(#[from] SessionStoreError),
}

/// Drives one session through the node graph, one turn at a time.
///
/// The engine holds no session state. Each call receives the context, owns it
/// for the duration of the turn and hands it back.
pub struct WorkflowEngine<P: ReasoningProvider + ?Sized> {
    provider: Arc<P>,
    config: WorkflowConfig,
}

impl<P: ReasoningProvider + ?Sized> WorkflowEngine<P> {
    pub fn new(provider: Arc<P>, config: WorkflowConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Opens a consultation from the user's first message.
    pub async fn start(
        &self,
        initial_message: &str,
        session_id: SessionId,
    ) -> Result<ProjectContext, WorkflowError> {
        info!(%session_id, "Starting consultation");
        let mut ctx = ProjectContext::new(session_id, initial_message.trim());
        ctx.add_user_message(initial_message);
        self.run(ctx).await
    }

    /// Continues a consultation with the user's next message.
    ///
    /// When the session is suspended, the message is first handed to the node
    /// that asked for it. A reply that node cannot use keeps the session
    /// suspended and only adds the node's re-prompt to the conversation.
    pub async fn resume(
        &self,
        session_id: SessionId,
        user_message: &str,
        mut ctx: ProjectContext,
    ) -> Result<ProjectContext, WorkflowError> {
        if ctx.session_id != session_id {
            return Err(WorkflowError::SessionMismatch {
                expected: session_id,
                actual: ctx.session_id,
            });
        }
        info!(%session_id, waiting = ctx.waiting_for_user, node = ?ctx.current_node, "Resuming consultation");

        ctx.add_user_message(user_message);
        ctx.error_message = None;

        if !ctx.waiting_for_user {
            ctx.unprocessed_input = Some(user_message.to_string());
            return self.run(ctx).await;
        }

        let provider = self.provider.as_ref();
        let outcome = match ctx.current_node {
            Some(NodeId::Priority) => priority::process_response(&mut ctx, user_message),
            Some(NodeId::Conflict) => conflict::process_response(&mut ctx, user_message),
            Some(NodeId::DeepDive) => {
                deep_dive::process_response(&mut ctx, provider, user_message).await
            }
            Some(NodeId::Clarification) if !ctx.pending_questions.is_empty() => {
                clarification::reconcile_answers(&mut ctx, provider, user_message).await;
                ResponseOutcome::Resolved
            }
            _ => {
                ctx.unprocessed_input = Some(user_message.to_string());
                ResponseOutcome::Resolved
            }
        };

        match outcome {
            ResponseOutcome::Reprompt(message) => {
                debug!(%session_id, "Reply not understood, re-prompting");
                ctx.add_assistant_message(message);
                Ok(ctx)
            }
            ResponseOutcome::Resolved => {
                ctx.waiting_for_user = false;
                self.run(ctx).await
            }
        }
    }

    async fn run(&self, mut ctx: ProjectContext) -> Result<ProjectContext, WorkflowError> {
        let limit = self.config.max_steps_per_turn;
        let mut node = WorkflowRouter::entry_node(&ctx);
        let mut steps = 0u32;

        loop {
            if steps >= limit {
                error!(session_id = %ctx.session_id, limit, node = %node, "Step limit exceeded");
                return Err(WorkflowError::StepLimitExceeded { limit });
            }
            steps += 1;

            ctx.current_node = Some(node);
            let outcome = self.execute(node, ctx).await;
            ctx = outcome.state;
            if let Some(message) = outcome.message.filter(|m| !m.trim().is_empty()) {
                ctx.add_assistant_message(message);
            }

            match WorkflowRouter::resolve(node, outcome.signal) {
                Transition::Next(next) => {
                    debug!(session_id = %ctx.session_id, from = %node, to = %next, "Transition");
                    node = next;
                }
                Transition::Suspend => {
                    info!(session_id = %ctx.session_id, node = %node, steps, "Waiting for user");
                    return Ok(ctx);
                }
                Transition::Finish => {
                    info!(
                        session_id = %ctx.session_id,
                        node = %node,
                        steps,
                        confidence = ctx.confidence_score(),
                        done = ctx.is_done(self.config.accept_threshold),
                        "Consultation turn finished"
                    );
                    return Ok(ctx);
                }
            }
        }
    }

    async fn execute(&self, node: NodeId, ctx: ProjectContext) -> NodeOutcome {
        let provider = self.provider.as_ref();
        let config = &self.config;
        match node {
            NodeId::Intake => intake::run(ctx, provider, config).await,
            NodeId::Priority => priority::run(ctx, provider, config).await,
            NodeId::Conflict => conflict::run(ctx, provider, config).await,
            NodeId::DeepDive => deep_dive::run(ctx, provider, config).await,
            NodeId::OptionScoring => option_scoring::run(ctx, provider, config).await,
            NodeId::Feasibility => feasibility::run(ctx, provider, config).await,
            NodeId::Synthesis => synthesis::run(ctx, provider, config).await,
            NodeId::Critic => critic::run(ctx, provider, config).await,
            NodeId::Clarification => clarification::run(ctx, provider, config).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::reasoning::MockReasoningProvider;

    fn engine(provider: MockReasoningProvider) -> WorkflowEngine<MockReasoningProvider> {
        WorkflowEngine::new(Arc::new(provider), WorkflowConfig::default())
    }

    #[tokio::test]
    async fn start_records_the_first_message() {
        let engine = engine(MockReasoningProvider::unavailable());
        let ctx = engine.start("A recipe sharing site", SessionId::new()).await.unwrap();

        assert_eq!(ctx.initial_summary, "A recipe sharing site");
        assert_eq!(ctx.conversation_history[0].content, "A recipe sharing site");
        assert!(ctx.waiting_for_user);
        assert_eq!(ctx.current_node, Some(NodeId::Priority));
    }

    #[tokio::test]
    async fn mismatched_session_is_rejected() {
        let engine = engine(MockReasoningProvider::unavailable());
        let ctx = engine.start("Anything", SessionId::new()).await.unwrap();

        let result = engine.resume(SessionId::new(), "hi", ctx).await;
        assert!(matches!(result, Err(WorkflowError::SessionMismatch { .. })));
    }

    #[tokio::test]
    async fn unusable_reply_keeps_waiting() {
        let engine = engine(MockReasoningProvider::unavailable());
        let session_id = SessionId::new();
        let ctx = engine.start("Anything", session_id).await.unwrap();
        let history = ctx.conversation_history.len();

        let ctx = engine.resume(session_id, "banana", ctx).await.unwrap();

        assert!(ctx.waiting_for_user);
        assert_eq!(ctx.current_node, Some(NodeId::Priority));
        assert_eq!(ctx.conversation_history.len(), history + 2);
        assert!(ctx.shortlist.is_empty());
    }

    #[tokio::test]
    async fn menu_choice_runs_to_completion() {
        let engine = engine(MockReasoningProvider::unavailable());
        let session_id = SessionId::new();
        let ctx = engine.start("An internal wiki", session_id).await.unwrap();

        let ctx = engine.resume(session_id, "2", ctx).await.unwrap();

        assert!(!ctx.waiting_for_user);
        assert_eq!(ctx.current_node, Some(NodeId::Critic));
        assert_eq!(ctx.iteration_count(), 1);
        assert!(ctx.document.is_some());
        assert!(ctx.proposed_architecture.is_some());
    }

    #[tokio::test]
    async fn step_ceiling_aborts_the_turn() {
        let provider = Arc::new(MockReasoningProvider::unavailable());
        let config = WorkflowConfig {
            max_steps_per_turn: 1,
            ..WorkflowConfig::default()
        };
        let engine = WorkflowEngine::new(provider, config);

        let result = engine.start("Anything", SessionId::new()).await;
        assert!(matches!(result, Err(WorkflowError::StepLimitExceeded { limit: 1 })));
    }
}

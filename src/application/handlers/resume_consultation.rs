//! ResumeConsultationHandler - Command handler for the next user turn.

use std::sync::Arc;

use tracing::info;

use super::ConsultationTurnResult;
use crate::application::engine::{WorkflowEngine, WorkflowError};
use crate::domain::foundation::SessionId;
use crate::ports::{ReasoningProvider, SessionStore};

/// Command to continue a consultation.
#[derive(Debug, Clone)]
pub struct ResumeConsultationCommand {
    pub session_id: SessionId,
    pub message: String,
}

/// Handler for continuing consultations.
pub struct ResumeConsultationHandler<P: ReasoningProvider + ?Sized> {
    engine: Arc<WorkflowEngine<P>>,
    store: Arc<dyn SessionStore>,
}

impl<P: ReasoningProvider + ?Sized> ResumeConsultationHandler<P> {
    pub fn new(engine: Arc<WorkflowEngine<P>>, store: Arc<dyn SessionStore>) -> Self {
        Self { engine, store }
    }

    pub async fn handle(
        &self,
        cmd: ResumeConsultationCommand,
    ) -> Result<ConsultationTurnResult, WorkflowError> {
        // 1. Load the latest snapshot
        let snapshot = self.store.load(&cmd.session_id).await?;
        let history_before = snapshot.conversation_history.len();

        // 2. Run the turn
        let state = self
            .engine
            .resume(cmd.session_id, &cmd.message, snapshot)
            .await?;

        // 3. Replace the snapshot
        self.store.save(&state).await?;

        info!(
            session_id = %cmd.session_id,
            waiting = state.waiting_for_user,
            iterations = state.iteration_count(),
            "Consultation resumed"
        );
        Ok(ConsultationTurnResult::from_turn(
            state,
            history_before,
            self.engine.config().accept_threshold,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::reasoning::MockReasoningProvider;
    use crate::adapters::storage::InMemorySessionStore;
    use crate::application::handlers::{StartConsultationCommand, StartConsultationHandler};
    use crate::config::WorkflowConfig;
    use crate::ports::SessionStoreError;

    fn engine() -> Arc<WorkflowEngine<MockReasoningProvider>> {
        Arc::new(WorkflowEngine::new(
            Arc::new(MockReasoningProvider::unavailable()),
            WorkflowConfig::default(),
        ))
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let handler = ResumeConsultationHandler::new(engine(), Arc::new(InMemorySessionStore::new()));

        let result = handler
            .handle(ResumeConsultationCommand {
                session_id: SessionId::new(),
                message: "hello".into(),
            })
            .await;

        assert!(matches!(
            result,
            Err(WorkflowError::Store(SessionStoreError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn replies_cover_only_this_turn() {
        let store: Arc<InMemorySessionStore> = Arc::new(InMemorySessionStore::new());
        let engine = engine();
        let started = StartConsultationHandler::new(engine.clone(), store.clone())
            .handle(StartConsultationCommand {
                session_id: None,
                message: "A ticketing system".into(),
            })
            .await
            .unwrap();
        let session_id = started.state.session_id;

        let resumed = ResumeConsultationHandler::new(engine, store.clone())
            .handle(ResumeConsultationCommand {
                session_id,
                message: "what?".into(),
            })
            .await
            .unwrap();

        assert_eq!(resumed.replies.len(), 1);
        assert!(resumed.waiting_for_user);
        let saved = store.load(&session_id).await.unwrap();
        assert_eq!(saved.conversation_history.len(), resumed.state.conversation_history.len());
    }
}

//! StartConsultationHandler - Command handler for opening a consultation.

use std::sync::Arc;

use tracing::info;

use super::ConsultationTurnResult;
use crate::application::engine::{WorkflowEngine, WorkflowError};
use crate::domain::foundation::SessionId;
use crate::ports::{ReasoningProvider, SessionStore};

/// Command to start a consultation.
#[derive(Debug, Clone)]
pub struct StartConsultationCommand {
    /// Id to use for the new session; a fresh one is generated when absent.
    pub session_id: Option<SessionId>,
    pub message: String,
}

/// Handler for starting consultations.
pub struct StartConsultationHandler<P: ReasoningProvider + ?Sized> {
    engine: Arc<WorkflowEngine<P>>,
    store: Arc<dyn SessionStore>,
}

impl<P: ReasoningProvider + ?Sized> StartConsultationHandler<P> {
    pub fn new(engine: Arc<WorkflowEngine<P>>, store: Arc<dyn SessionStore>) -> Self {
        Self { engine, store }
    }

    pub async fn handle(
        &self,
        cmd: StartConsultationCommand,
    ) -> Result<ConsultationTurnResult, WorkflowError> {
        let session_id = cmd.session_id.unwrap_or_default();

        let state = self.engine.start(&cmd.message, session_id).await?;
        self.store.save(&state).await?;

        info!(%session_id, waiting = state.waiting_for_user, "Consultation started");
        Ok(ConsultationTurnResult::from_turn(
            state,
            0,
            self.engine.config().accept_threshold,
        ))
    }
}

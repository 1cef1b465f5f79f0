//! Application handlers.
//!
//! Command handlers that run one consultation turn against a session store.

mod resume_consultation;
mod start_consultation;

pub use resume_consultation::{ResumeConsultationCommand, ResumeConsultationHandler};
pub use start_consultation::{StartConsultationCommand, StartConsultationHandler};

use crate::domain::advisory::{MessageRole, ProjectContext};

/// Outcome of one consultation turn.
#[derive(Debug, Clone)]
pub struct ConsultationTurnResult {
    pub state: ProjectContext,
    /// Assistant messages produced during this turn, oldest first.
    pub replies: Vec<String>,
    pub waiting_for_user: bool,
    /// True when the document is complete and confidence clears the accept threshold.
    pub completed: bool,
}

impl ConsultationTurnResult {
    /// Builds the result from the state after a turn. `history_before` is the
    /// conversation length before the turn started.
    pub(crate) fn from_turn(state: ProjectContext, history_before: usize, accept_threshold: f64) -> Self {
        let replies = state
            .conversation_history
            .iter()
            .skip(history_before)
            .filter(|m| m.role == MessageRole::Assistant)
            .map(|m| m.content.clone())
            .collect();
        Self {
            waiting_for_user: state.waiting_for_user,
            completed: state.is_done(accept_threshold),
            replies,
            state,
        }
    }
}

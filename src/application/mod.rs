//! Application layer - workflow nodes, the engine, and session handlers.
//!
//! Nodes are pure transforms over the session context. The engine sequences
//! them for one turn. Handlers wrap the engine with a `SessionStore` so a
//! turn is load -> run -> save.

pub mod engine;
pub mod handlers;
pub mod nodes;

pub use engine::{WorkflowEngine, WorkflowError};
pub use handlers::{
    ConsultationTurnResult, ResumeConsultationCommand, ResumeConsultationHandler,
    StartConsultationCommand, StartConsultationHandler,
};

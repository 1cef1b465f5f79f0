//! Workflow node identifiers and the tagged outcome every node returns.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::advisory::ProjectContext;

/// A stage of the consultation workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    Intake,
    Priority,
    Conflict,
    DeepDive,
    OptionScoring,
    Feasibility,
    Synthesis,
    Critic,
    Clarification,
}

impl NodeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeId::Intake => "intake",
            NodeId::Priority => "priority",
            NodeId::Conflict => "conflict",
            NodeId::DeepDive => "deep_dive",
            NodeId::OptionScoring => "option_scoring",
            NodeId::Feasibility => "feasibility",
            NodeId::Synthesis => "synthesis",
            NodeId::Critic => "critic",
            NodeId::Clarification => "clarification",
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the engine should do after a node returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Follow the fixed edge out of the current node.
    Continue,
    /// Jump to a specific node.
    GotoNode(NodeId),
    /// Stop the turn and wait for the user.
    Suspend,
    /// Stop the turn; the consultation reached a terminal state.
    Done,
}

/// Result of running one node: the updated state, an optional message for
/// the user, and the control signal.
#[derive(Debug, Clone)]
pub struct NodeOutcome {
    pub state: ProjectContext,
    pub message: Option<String>,
    pub signal: Signal,
}

impl NodeOutcome {
    pub fn new(state: ProjectContext, message: Option<String>, signal: Signal) -> Self {
        Self {
            state,
            message,
            signal,
        }
    }

    /// Proceed along the fixed edge without a message.
    pub fn pass(state: ProjectContext) -> Self {
        Self::new(state, None, Signal::Continue)
    }

    pub fn proceed(state: ProjectContext, message: impl Into<String>) -> Self {
        Self::new(state, Some(message.into()), Signal::Continue)
    }

    pub fn goto(state: ProjectContext, message: impl Into<String>, node: NodeId) -> Self {
        Self::new(state, Some(message.into()), Signal::GotoNode(node))
    }

    pub fn suspend(state: ProjectContext, message: impl Into<String>) -> Self {
        Self::new(state, Some(message.into()), Signal::Suspend)
    }

    pub fn done(state: ProjectContext, message: impl Into<String>) -> Self {
        Self::new(state, Some(message.into()), Signal::Done)
    }
}

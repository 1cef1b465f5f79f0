//! Workflow graph: node identifiers, control signals and routing.

mod node;
mod router;

pub use node::{NodeId, NodeOutcome, Signal};
pub use router::{Transition, WorkflowRouter, LINEAR_CHAIN};

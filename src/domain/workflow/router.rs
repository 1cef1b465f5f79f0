//! Entry routing and the fixed edge table.

use tracing::debug;

use super::node::{NodeId, Signal};
use crate::domain::advisory::ProjectContext;

/// The linear chain every fresh run follows.
pub static LINEAR_CHAIN: [NodeId; 8] = [
    NodeId::Intake,
    NodeId::Priority,
    NodeId::Conflict,
    NodeId::DeepDive,
    NodeId::OptionScoring,
    NodeId::Feasibility,
    NodeId::Synthesis,
    NodeId::Critic,
];

/// Where the engine goes after a node returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Next(NodeId),
    Suspend,
    Finish,
}

pub struct WorkflowRouter;

impl WorkflowRouter {
    /// Picks the node a (re)invocation starts from. First match wins:
    /// document present, then a selected option, then requirements.
    pub fn entry_node(ctx: &ProjectContext) -> NodeId {
        let entry = if ctx.document.is_some() {
            NodeId::DeepDive
        } else if ctx.proposed_architecture.is_some() {
            NodeId::Feasibility
        } else if !ctx.requirements().is_empty() {
            NodeId::Priority
        } else {
            NodeId::Intake
        };
        debug!(session_id = %ctx.session_id, entry = %entry, "Resolved entry node");
        entry
    }

    /// Fixed outgoing edge of a node, if it has one.
    ///
    /// Critic has no fixed edge: it ends the run unless it redirects.
    /// Clarification that does not suspend feeds back into Synthesis.
    pub fn next_after(node: NodeId) -> Option<NodeId> {
        match node {
            NodeId::Clarification => Some(NodeId::Synthesis),
            NodeId::Critic => None,
            _ => LINEAR_CHAIN
                .iter()
                .position(|n| *n == node)
                .and_then(|idx| LINEAR_CHAIN.get(idx + 1))
                .copied(),
        }
    }

    /// Resolves a node's signal into the next engine step.
    pub fn resolve(current: NodeId, signal: Signal) -> Transition {
        match signal {
            Signal::Continue => match Self::next_after(current) {
                Some(next) => Transition::Next(next),
                None => Transition::Finish,
            },
            Signal::GotoNode(target) => Transition::Next(target),
            Signal::Suspend => Transition::Suspend,
            Signal::Done => Transition::Finish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::advisory::{
        ArchitecturalDecision, ArchitecturePattern, Priority, Requirement, SynthesizedDocument,
    };
    use crate::domain::foundation::SessionId;

    fn context() -> ProjectContext {
        ProjectContext::new(SessionId::new(), "A booking system")
    }

    fn decision() -> ArchitecturalDecision {
        ArchitecturalDecision {
            pattern: ArchitecturePattern::Monolith,
            justification: "simple".into(),
            trade_offs: vec![],
            alternatives_considered: vec![],
            score: 70.0,
        }
    }

    #[test]
    fn fresh_session_starts_at_intake() {
        assert_eq!(WorkflowRouter::entry_node(&context()), NodeId::Intake);
    }

    #[test]
    fn requirements_resume_at_priority() {
        let mut ctx = context();
        ctx.add_requirement(Requirement::functional("Bookings", Priority::High));
        assert_eq!(WorkflowRouter::entry_node(&ctx), NodeId::Priority);
    }

    #[test]
    fn selected_option_resumes_at_feasibility() {
        let mut ctx = context();
        ctx.add_requirement(Requirement::functional("Bookings", Priority::High));
        ctx.proposed_architecture = Some(decision());
        assert_eq!(WorkflowRouter::entry_node(&ctx), NodeId::Feasibility);
    }

    #[test]
    fn document_takes_precedence() {
        let mut ctx = context();
        ctx.proposed_architecture = Some(decision());
        ctx.document = Some(SynthesizedDocument {
            executive_summary: String::new(),
            diagram: String::new(),
            decision_records: vec![],
            roadmap: vec![],
            next_steps: vec![],
            assumptions: vec![],
            unknowns: vec![],
        });
        assert_eq!(WorkflowRouter::entry_node(&ctx), NodeId::DeepDive);
    }

    #[test]
    fn linear_edges() {
        assert_eq!(WorkflowRouter::next_after(NodeId::Intake), Some(NodeId::Priority));
        assert_eq!(WorkflowRouter::next_after(NodeId::DeepDive), Some(NodeId::OptionScoring));
        assert_eq!(WorkflowRouter::next_after(NodeId::Synthesis), Some(NodeId::Critic));
        assert_eq!(WorkflowRouter::next_after(NodeId::Critic), None);
        assert_eq!(WorkflowRouter::next_after(NodeId::Clarification), Some(NodeId::Synthesis));
    }

    #[test]
    fn signals_resolve_to_transitions() {
        assert_eq!(
            WorkflowRouter::resolve(NodeId::Feasibility, Signal::Continue),
            Transition::Next(NodeId::Synthesis)
        );
        assert_eq!(
            WorkflowRouter::resolve(NodeId::Critic, Signal::GotoNode(NodeId::OptionScoring)),
            Transition::Next(NodeId::OptionScoring)
        );
        assert_eq!(WorkflowRouter::resolve(NodeId::Critic, Signal::Continue), Transition::Finish);
        assert_eq!(WorkflowRouter::resolve(NodeId::Priority, Signal::Suspend), Transition::Suspend);
        assert_eq!(WorkflowRouter::resolve(NodeId::Critic, Signal::Done), Transition::Finish);
    }
}

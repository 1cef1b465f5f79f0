//! Critic: reviews the synthesized document and decides whether the
//! consultation ends, asks the user, or revisits the option choice.
//!
//! Loop prevention lives here:
//! - every pass counts one iteration and consumes the new information
//! - from the second pass on, a pass with no new information is accepted
//!   with notes whatever the review says
//! - swaps are capped by the session's revision budget
//! - past `max_critic_iterations` only terminal verdicts remain

use serde_json::{json, Value};
use tracing::{info, warn};

use super::{ask_structured, bullets, project_brief};
use crate::config::WorkflowConfig;
use crate::domain::advisory::{
    ArchitecturePattern, Critique, LowConfidenceReason, ProjectContext, Verdict,
};
use crate::domain::analysis::option_profile;
use crate::domain::workflow::{NodeId, NodeOutcome};
use crate::ports::ReasoningProvider;

pub const TASK: &str = "Task: architecture critique";

/// Iteration from which a pass without new information is forced to accept.
const STARVATION_ITERATION: u32 = 2;

fn schema() -> Value {
    let patterns: Vec<&str> = ArchitecturePattern::ALL.iter().map(|p| p.key()).collect();
    let verdicts: Vec<&str> = Verdict::ALL.iter().map(|v| v.as_str()).collect();
    let mut reasons: Vec<Value> = LowConfidenceReason::ALL
        .iter()
        .map(|r| Value::from(r.as_str()))
        .collect();
    reasons.push(Value::Null);
    let strings = json!({"type": "array", "items": {"type": "string"}});
    json!({
        "type": "object",
        "required": ["confidence_score", "verdict"],
        "properties": {
            "confidence_score": {"type": "number", "minimum": 0, "maximum": 1},
            "strengths": strings.clone(),
            "weaknesses": strings.clone(),
            "missing_info": strings.clone(),
            "verdict": {"type": "string", "enum": verdicts},
            "low_confidence_reason": {"type": ["string", "null"], "enum": reasons},
            "questions_to_ask": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["question"],
                    "properties": {
                        "question": {"type": "string"},
                        "impact": {"type": "string", "enum": ["high", "medium", "low"]},
                        "why_it_matters": {"type": "string"}
                    }
                }
            },
            "swap_to": {
                "type": ["object", "null"],
                "required": ["pattern"],
                "properties": {
                    "pattern": {"type": "string", "enum": patterns},
                    "why": {"type": "string"}
                }
            },
            "top_failure_modes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["failure"],
                    "properties": {
                        "failure": {"type": "string"},
                        "severity": {"type": "string", "enum": ["critical", "high", "medium", "low"]},
                        "mitigation": {"type": "string"}
                    }
                }
            },
            "must_fix": strings
        }
    })
}

fn build_prompt(ctx: &ProjectContext) -> String {
    let mut prompt = format!(
        "{TASK}\n\nReview the recommendation below as a skeptical principal engineer. \
Start from confidence 1.0 and subtract for each unresolved high-impact unknown, each \
must-fix problem and each high-complexity choice the requirements do not justify. \
Verdict: accept at 0.7 or above, accept_with_notes from 0.5, below that ask_user when \
information is missing or swap_option with a concrete alternative when the choice is wrong. \
Do not ask questions that were already asked.\n\n{}",
        project_brief(ctx)
    );
    if let Some(decision) = &ctx.proposed_architecture {
        prompt.push_str(&format!(
            "Selected option: {} (score {:.1})\nJustification: {}\n",
            option_profile(decision.pattern).name,
            decision.score,
            decision.justification
        ));
    }
    if let Some(f) = &ctx.feasibility {
        prompt.push_str(&format!(
            "Feasibility: cost {}, complexity {}, team fit {}, estimate {}\n",
            f.cost_band, f.ops_complexity, f.team_fit, f.time_estimate
        ));
        if !f.warnings.is_empty() {
            prompt.push_str(&format!("Warnings:\n{}\n", bullets(&f.warnings, usize::MAX)));
        }
    }
    if let Some(document) = &ctx.document {
        prompt.push_str(&format!("Summary: {}\nDecision records:\n", document.executive_summary));
        for record in &document.decision_records {
            prompt.push_str(&format!("- {} {}: {}\n", record.id, record.title, record.decision));
        }
    }
    if !ctx.asked_questions().is_empty() {
        prompt.push_str("Already asked:\n");
        for q in ctx.asked_questions() {
            prompt.push_str(&format!("- {}\n", q.question));
        }
    }
    prompt
}

pub async fn run<P>(mut ctx: ProjectContext, provider: &P, config: &WorkflowConfig) -> NodeOutcome
where
    P: ReasoningProvider + ?Sized,
{
    let had_new_info = ctx.begin_critic_pass();
    let iteration = ctx.iteration_count();
    info!(
        session_id = %ctx.session_id,
        node = "critic",
        iteration,
        had_new_info,
        "Running critic"
    );

    let prompt = build_prompt(&ctx);
    let mut critique = ask_structured::<Critique, _>(provider, &ctx, NodeId::Critic, &prompt, &schema())
        .await
        .unwrap_or_else(Critique::conservative);

    if iteration >= STARVATION_ITERATION && !had_new_info {
        warn!(
            session_id = %ctx.session_id,
            iteration,
            verdict = %critique.verdict,
            "No new information since the last review, accepting with notes"
        );
        critique.verdict = Verdict::AcceptWithNotes;
    }
    if iteration > config.max_critic_iterations && !critique.verdict.is_acceptance() {
        warn!(
            session_id = %ctx.session_id,
            iteration,
            limit = config.max_critic_iterations,
            "Critic iteration limit reached, accepting with notes"
        );
        critique.verdict = Verdict::AcceptWithNotes;
    }

    ctx.set_confidence(critique.confidence_score);
    ctx.last_confidence_reason = critique.low_confidence_reason;

    let (verdict, next) = dispatch(&mut ctx, &critique);
    let reply = render(&critique, verdict, ctx.confidence_score());

    info!(
        session_id = %ctx.session_id,
        verdict = %verdict,
        confidence = ctx.confidence_score(),
        revisions = ctx.revision_count(),
        "Critique complete"
    );
    ctx.last_verdict = Some(verdict);
    ctx.last_critique = Some(critique);

    match next {
        Some(node) => NodeOutcome::goto(ctx, reply, node),
        None => NodeOutcome::done(ctx, reply),
    }
}

/// Applies the verdict to the context. Returns the effective verdict and the
/// node to jump to, if any.
fn dispatch(ctx: &mut ProjectContext, critique: &Critique) -> (Verdict, Option<NodeId>) {
    match critique.verdict {
        Verdict::AskUser if ctx.has_unresolved_conflicts() => (Verdict::AskUser, Some(NodeId::Conflict)),
        Verdict::AskUser => {
            ctx.waiting_for_user = true;
            (Verdict::AskUser, Some(NodeId::Clarification))
        }
        Verdict::SwapOption => {
            let current = ctx.proposed_architecture.as_ref().map(|d| d.pattern);
            match critique.swap_to.as_ref().map(|s| s.pattern) {
                Some(target) if Some(target) != current && ctx.record_revision(target) => {
                    (Verdict::SwapOption, Some(NodeId::OptionScoring))
                }
                Some(_) if !ctx.can_revise() => {
                    warn!(session_id = %ctx.session_id, "Revision limit reached, accepting");
                    (Verdict::Accept, None)
                }
                _ => (Verdict::Accept, None),
            }
        }
        verdict => (verdict, None),
    }
}

fn render(critique: &Critique, verdict: Verdict, confidence: f64) -> String {
    let headline = match verdict {
        Verdict::Accept => "The recommendation holds up.",
        Verdict::AcceptWithNotes => "The recommendation holds up, with some caveats.",
        Verdict::AskUser => "I need a little more information to be confident.",
        Verdict::SwapOption => "On review, a different option looks like a better fit.",
    };
    let mut out = format!(
        "## Review\n\n{headline}\n\nConfidence: {:.0}%",
        confidence * 100.0
    );
    if !critique.strengths.is_empty() {
        out.push_str(&format!("\n\n**Strengths**\n{}", bullets(&critique.strengths, 3)));
    }
    if !critique.weaknesses.is_empty() {
        out.push_str(&format!("\n\n**Weaknesses**\n{}", bullets(&critique.weaknesses, 3)));
    }
    if !critique.top_failure_modes.is_empty() {
        let risks: Vec<String> = critique
            .top_failure_modes
            .iter()
            .map(|f| {
                if f.mitigation.trim().is_empty() {
                    format!("{} ({})", f.failure, f.severity)
                } else {
                    format!("{} ({}): {}", f.failure, f.severity, f.mitigation)
                }
            })
            .collect();
        out.push_str(&format!("\n\n**Risks**\n{}", bullets(&risks, 3)));
    }
    if let (Verdict::SwapOption, Some(swap)) = (verdict, &critique.swap_to) {
        out.push_str(&format!(
            "\n\nRevisiting with {}: {}",
            option_profile(swap.pattern).name,
            swap.why
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::reasoning::MockReasoningProvider;
    use crate::domain::advisory::{
        ArchitecturalDecision, Conflict, Fact, FactSource, MAX_REVISIONS,
    };
    use crate::domain::foundation::SessionId;
    use crate::domain::workflow::Signal;

    fn reviewed() -> ProjectContext {
        let mut ctx = ProjectContext::new(SessionId::new(), "Analytics");
        ctx.proposed_architecture = Some(ArchitecturalDecision {
            pattern: ArchitecturePattern::Monolith,
            justification: "j".into(),
            trade_offs: vec![],
            alternatives_considered: vec![],
            score: 70.0,
        });
        ctx.add_fact(Fact::new("users", "100", FactSource::UserAnswer));
        ctx
    }

    fn critic_says(verdict: &str, extra: Value) -> MockReasoningProvider {
        let mut body = json!({"confidence_score": 0.45, "verdict": verdict});
        if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            body.extend(extra.clone());
        }
        MockReasoningProvider::new().when_prompt_contains_json(TASK, body)
    }

    #[tokio::test]
    async fn accept_finishes() {
        let provider = MockReasoningProvider::new().when_prompt_contains_json(
            TASK,
            json!({"confidence_score": 0.82, "verdict": "accept", "strengths": ["a", "b", "c", "d"]}),
        );

        let outcome = run(reviewed(), &provider, &WorkflowConfig::default()).await;

        assert_eq!(outcome.signal, Signal::Done);
        assert_eq!(outcome.state.iteration_count(), 1);
        assert_eq!(outcome.state.last_verdict, Some(Verdict::Accept));
        assert!((outcome.state.confidence_score() - 0.82).abs() < 1e-9);
        let message = outcome.message.unwrap();
        assert!(message.contains("Confidence: 82%"));
        assert!(message.contains("- c"));
        assert!(!message.contains("- d"));
    }

    #[tokio::test]
    async fn failed_review_is_conservative() {
        let outcome = run(reviewed(), &MockReasoningProvider::unavailable(), &WorkflowConfig::default()).await;

        assert_eq!(outcome.signal, Signal::Done);
        assert_eq!(outcome.state.last_verdict, Some(Verdict::AcceptWithNotes));
        assert!((outcome.state.confidence_score() - 0.6).abs() < 1e-9);
    }

    #[tokio::test]
    async fn ask_user_routes_to_clarification() {
        let provider = critic_says(
            "ask_user",
            json!({"questions_to_ask": [{"question": "Peak traffic?", "impact": "high"}]}),
        );

        let outcome = run(reviewed(), &provider, &WorkflowConfig::default()).await;

        assert_eq!(outcome.signal, Signal::GotoNode(NodeId::Clarification));
        assert!(outcome.state.waiting_for_user);
        assert_eq!(outcome.state.revision_count(), 0);
    }

    #[tokio::test]
    async fn ask_user_with_open_conflict_routes_to_conflict() {
        let provider = critic_says("ask_user", json!({}));
        let mut ctx = reviewed();
        ctx.conflicts.push(Conflict::new("Scale vs Cost", "e", vec!["a".into()]));

        let outcome = run(ctx, &provider, &WorkflowConfig::default()).await;

        assert_eq!(outcome.signal, Signal::GotoNode(NodeId::Conflict));
    }

    #[tokio::test]
    async fn ask_user_without_questions_passes_through_clarification() {
        let provider = critic_says("ask_user", json!({}));
        let outcome = run(reviewed(), &provider, &WorkflowConfig::default()).await;
        assert_eq!(outcome.signal, Signal::GotoNode(NodeId::Clarification));
        assert_eq!(outcome.state.last_verdict, Some(Verdict::AskUser));

        let config = WorkflowConfig::default();
        let next = crate::application::nodes::clarification::run(outcome.state, &provider, &config).await;
        assert_eq!(next.signal, Signal::Continue);
        assert!(!next.state.waiting_for_user);
    }

    #[tokio::test]
    async fn swap_sets_forced_option() {
        let provider = critic_says("swap_option", json!({"swap_to": {"pattern": "serverless", "why": "spiky load"}}));

        let outcome = run(reviewed(), &provider, &WorkflowConfig::default()).await;

        assert_eq!(outcome.signal, Signal::GotoNode(NodeId::OptionScoring));
        assert_eq!(outcome.state.forced_option, Some(ArchitecturePattern::Serverless));
        assert_eq!(outcome.state.last_option, Some(ArchitecturePattern::Monolith));
        assert_eq!(outcome.state.revision_count(), 1);
    }

    #[tokio::test]
    async fn swap_to_current_option_accepts() {
        let provider = critic_says("swap_option", json!({"swap_to": {"pattern": "monolith"}}));
        let outcome = run(reviewed(), &provider, &WorkflowConfig::default()).await;
        assert_eq!(outcome.signal, Signal::Done);
        assert_eq!(outcome.state.revision_count(), 0);
    }

    #[tokio::test]
    async fn third_swap_degrades_to_accept() {
        let provider = critic_says("swap_option", json!({"swap_to": {"pattern": "serverless"}}));
        let mut ctx = reviewed();
        for _ in 0..MAX_REVISIONS {
            assert!(ctx.record_revision(ArchitecturePattern::Cqrs));
        }
        ctx.forced_option = None;

        let outcome = run(ctx, &provider, &WorkflowConfig::default()).await;

        assert_eq!(outcome.signal, Signal::Done);
        assert_eq!(outcome.state.last_verdict, Some(Verdict::Accept));
        assert_eq!(outcome.state.revision_count(), MAX_REVISIONS);
        assert!(outcome.state.forced_option.is_none());
    }

    #[tokio::test]
    async fn second_pass_without_new_information_accepts() {
        let provider = critic_says(
            "ask_user",
            json!({"questions_to_ask": [{"question": "Peak traffic?"}]}),
        );

        let first = run(reviewed(), &provider, &WorkflowConfig::default()).await;
        assert_eq!(first.signal, Signal::GotoNode(NodeId::Clarification));

        let mut ctx = first.state;
        ctx.waiting_for_user = false;
        let second = run(ctx, &provider, &WorkflowConfig::default()).await;

        assert_eq!(second.signal, Signal::Done);
        assert_eq!(second.state.iteration_count(), 2);
        assert_eq!(second.state.last_verdict, Some(Verdict::AcceptWithNotes));
        assert_eq!(second.state.last_info_version_used(), second.state.info_version());
    }

    #[tokio::test]
    async fn iteration_limit_forces_acceptance() {
        let provider = critic_says(
            "ask_user",
            json!({"questions_to_ask": [{"question": "Peak traffic?"}]}),
        );
        let config = WorkflowConfig {
            max_critic_iterations: 1,
            ..WorkflowConfig::default()
        };
        let mut ctx = reviewed();
        ctx.begin_critic_pass();
        ctx.add_fact(Fact::new("region", "eu", FactSource::UserAnswer));

        let outcome = run(ctx, &provider, &config).await;

        assert_eq!(outcome.signal, Signal::Done);
        assert_eq!(outcome.state.last_verdict, Some(Verdict::AcceptWithNotes));
    }
}

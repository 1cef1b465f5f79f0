//! OptionScoring: deterministic shortlist, reasoned final pick, tech stack.

use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::{ask_structured, project_brief};
use crate::config::WorkflowConfig;
use crate::domain::advisory::{
    ArchitecturalDecision, ArchitecturePattern, OptionCandidate, ProjectContext, TechStackComponent,
};
use crate::domain::analysis::{option_profile, OptionScorer, SHORTLIST_SIZE};
use crate::domain::workflow::{NodeId, NodeOutcome};
use crate::ports::ReasoningProvider;

pub const TASK: &str = "Task: option selection";

/// Justification prefix marking a pick forced by the critic.
pub const REVISION_PREFIX: &str = "[Revised after critique]";

const CONFIDENCE_FLOOR: f64 = 0.6;

#[derive(Debug, Deserialize)]
struct SelectionResponse {
    recommended: ArchitecturePattern,
    #[serde(default)]
    justifications: BTreeMap<String, String>,
    #[serde(default)]
    recommendation: String,
    #[serde(default)]
    tech_stack: Vec<TechStackComponent>,
}

fn schema(candidates: &[OptionCandidate]) -> Value {
    let keys: Vec<&str> = ArchitecturePattern::ALL.iter().map(|p| p.key()).collect();
    let layers = [
        "frontend", "backend", "database", "cache", "messaging", "auth", "ci_cd", "monitoring",
        "cloud",
    ];
    let justification_props: serde_json::Map<String, Value> = candidates
        .iter()
        .map(|c| (c.pattern.key().to_string(), json!({"type": "string"})))
        .collect();
    json!({
        "type": "object",
        "required": ["recommended", "recommendation"],
        "properties": {
            "recommended": {"type": "string", "enum": keys},
            "justifications": {"type": "object", "properties": justification_props},
            "recommendation": {"type": "string"},
            "tech_stack": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["layer", "technology"],
                    "properties": {
                        "layer": {"type": "string", "enum": layers},
                        "technology": {"type": "string"},
                        "reason": {"type": "string"},
                        "alternatives": {"type": "array", "items": {"type": "string"}}
                    }
                }
            }
        }
    })
}

fn describe(candidate: &OptionCandidate) -> String {
    let profile = option_profile(candidate.pattern);
    let breakdown = candidate
        .breakdown
        .iter()
        .map(|c| format!("{} {:.1}", c.dimension.key(), c.contribution))
        .collect::<Vec<_>>()
        .join(", ");
    let mut out = format!(
        "### {} ({}) score {:.1}\n{}\nPros: {}\nCons: {}\nBreakdown: {}\n",
        profile.name,
        candidate.pattern.key(),
        candidate.score,
        profile.description,
        profile.pros.join("; "),
        profile.cons.join("; "),
        breakdown
    );
    if !candidate.penalties.is_empty() {
        out.push_str(&format!("Penalties: {}\n", candidate.penalties.join("; ")));
    }
    out
}

/// Catalog technology defaults for an option.
pub fn default_tech_stack(pattern: ArchitecturePattern) -> Vec<TechStackComponent> {
    option_profile(pattern)
        .tech_defaults
        .iter()
        .map(|(layer, technology)| TechStackComponent {
            layer: *layer,
            technology: technology.to_string(),
            reason: format!("Standard choice for a {}", option_profile(pattern).name.to_lowercase()),
            alternatives: Vec::new(),
        })
        .collect()
}

fn fallback_justification(candidate: &OptionCandidate) -> String {
    let profile = option_profile(candidate.pattern);
    let strongest = candidate
        .breakdown
        .iter()
        .max_by(|a, b| a.contribution.total_cmp(&b.contribution))
        .map(|c| c.dimension.label())
        .unwrap_or("overall fit");
    format!(
        "{} scored {:.1}/100, strongest on {}. {}.",
        profile.name,
        candidate.score,
        strongest.to_lowercase(),
        profile.pros.first().copied().unwrap_or(profile.description)
    )
}

pub async fn run<P>(mut ctx: ProjectContext, provider: &P, _config: &WorkflowConfig) -> NodeOutcome
where
    P: ReasoningProvider + ?Sized,
{
    info!(session_id = %ctx.session_id, node = "option_scoring", "Running option scoring");

    let weights = ctx.priority_weights();
    let mut candidates = OptionScorer::shortlist(&weights, ctx.constraints(), SHORTLIST_SIZE);

    let forced = ctx.forced_option.take();
    if let Some(pattern) = forced {
        candidates.retain(|c| c.pattern != pattern);
        candidates.insert(0, OptionScorer::score_option(pattern, &weights, ctx.constraints()));
        info!(session_id = %ctx.session_id, forced = %pattern, "Applying forced option");
    }

    let prompt = format!(
        "{TASK}\n\nPick the best option for this project from the scored candidates below \
and justify each candidate in one or two sentences. Recommend a technology per layer \
for the option you pick.\n\n{}\nCandidates:\n{}",
        project_brief(&ctx),
        candidates.iter().map(describe).collect::<Vec<_>>().join("\n")
    );
    let response = ask_structured::<SelectionResponse, _>(
        provider,
        &ctx,
        NodeId::OptionScoring,
        &prompt,
        &schema(&candidates),
    )
    .await;

    let reasoned_pick = response.as_ref().map(|r| r.recommended);
    let picked = match (forced, reasoned_pick) {
        (Some(pattern), _) => pattern,
        (None, Some(pattern)) if candidates.iter().any(|c| c.pattern == pattern) => pattern,
        (None, Some(pattern)) => {
            warn!(
                session_id = %ctx.session_id,
                recommended = %pattern,
                "Recommended option is not a candidate, using top score"
            );
            top_pattern(&candidates)
        }
        (None, None) => top_pattern(&candidates),
    };

    let decisions: Vec<ArchitecturalDecision> = candidates
        .iter()
        .map(|candidate| {
            let profile = option_profile(candidate.pattern);
            let mut justification = response
                .as_ref()
                .and_then(|r| r.justifications.get(candidate.pattern.key()))
                .filter(|j| !j.trim().is_empty())
                .map(|j| j.trim().to_string())
                .unwrap_or_else(|| fallback_justification(candidate));
            if forced == Some(candidate.pattern) {
                justification = format!("{REVISION_PREFIX} {justification}");
            }
            let mut trade_offs: Vec<String> = profile.cons.iter().map(|c| c.to_string()).collect();
            trade_offs.extend(candidate.penalties.iter().cloned());
            ArchitecturalDecision {
                pattern: candidate.pattern,
                justification,
                trade_offs,
                alternatives_considered: candidates
                    .iter()
                    .map(|c| c.pattern)
                    .filter(|p| *p != candidate.pattern)
                    .collect(),
                score: candidate.score,
            }
        })
        .collect();

    let recommendation_note = response
        .as_ref()
        .filter(|r| r.recommended == picked)
        .map(|r| r.recommendation.trim().to_string())
        .filter(|note| !note.is_empty());
    let tech_stack = match response {
        Some(r) if r.recommended == picked && !r.tech_stack.is_empty() => r.tech_stack,
        _ => default_tech_stack(picked),
    };
    let recommendation = decisions.iter().find(|d| d.pattern == picked).cloned();

    ctx.shortlist = decisions;
    ctx.proposed_architecture = recommendation;
    ctx.tech_stack = tech_stack;
    ctx.raise_confidence_to(CONFIDENCE_FLOOR);

    let Some(decision) = ctx.proposed_architecture.as_ref() else {
        return NodeOutcome::pass(ctx);
    };
    let reply = format!(
        "## Recommended: {} (score {:.1})\n\n{}{}\n\n**Tech stack**\n{}\n\nAlso considered: {}",
        option_profile(decision.pattern).name,
        decision.score,
        decision.justification,
        recommendation_note
            .map(|note| format!("\n\n{note}"))
            .unwrap_or_default(),
        ctx.tech_stack
            .iter()
            .map(|t| format!("- {}: {}", t.layer.label(), t.technology))
            .collect::<Vec<_>>()
            .join("\n"),
        decision
            .alternatives_considered
            .iter()
            .map(|p| option_profile(*p).name)
            .collect::<Vec<_>>()
            .join(", ")
    );
    info!(
        session_id = %ctx.session_id,
        picked = %decision.pattern,
        score = decision.score,
        candidates = ctx.shortlist.len(),
        "Option selected"
    );
    NodeOutcome::proceed(ctx, reply)
}

fn top_pattern(candidates: &[OptionCandidate]) -> ArchitecturePattern {
    candidates
        .first()
        .map(|c| c.pattern)
        .unwrap_or(ArchitecturePattern::Monolith)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::reasoning::MockReasoningProvider;
    use crate::domain::advisory::{
        Constraint, ConstraintKind, DecisionProfile, Priority, TechLayer,
    };
    use crate::domain::foundation::SessionId;
    use crate::domain::workflow::Signal;

    fn cost_first() -> ProjectContext {
        let mut ctx = ProjectContext::new(SessionId::new(), "Booking site");
        ctx.decision_profile = Some(DecisionProfile::CostFirst);
        ctx.add_constraint(Constraint::new(ConstraintKind::Budget, "Tiny budget", Priority::Critical));
        ctx
    }

    fn expected_top(ctx: &ProjectContext) -> ArchitecturePattern {
        OptionScorer::shortlist(&ctx.priority_weights(), ctx.constraints(), SHORTLIST_SIZE)[0].pattern
    }

    #[tokio::test]
    async fn falls_back_to_top_scored_candidate() {
        let ctx = cost_first();
        let top = expected_top(&ctx);
        let provider = MockReasoningProvider::unavailable();

        let outcome = run(ctx, &provider, &WorkflowConfig::default()).await;
        let state = outcome.state;

        assert_eq!(outcome.signal, Signal::Continue);
        assert_eq!(state.proposed_architecture.as_ref().unwrap().pattern, top);
        assert_eq!(state.shortlist.len(), SHORTLIST_SIZE);
        assert_eq!(state.tech_stack, default_tech_stack(top));
        assert!(state.tech_stack.iter().any(|t| t.layer == TechLayer::Database));
        assert!(state.confidence_score() >= CONFIDENCE_FLOOR);
    }

    #[tokio::test]
    async fn reasoned_pick_and_stack_are_used() {
        let ctx = cost_first();
        let candidates =
            OptionScorer::shortlist(&ctx.priority_weights(), ctx.constraints(), SHORTLIST_SIZE);
        let second = candidates[1].pattern;
        let provider = MockReasoningProvider::new().when_prompt_contains_json(
            TASK,
            json!({
                "recommended": second.key(),
                "justifications": {second.key(): "Fits the team"},
                "recommendation": "Go with it",
                "tech_stack": [{"layer": "backend", "technology": "Rails"}]
            }),
        );

        let outcome = run(ctx, &provider, &WorkflowConfig::default()).await;
        let decision = outcome.state.proposed_architecture.unwrap();

        assert_eq!(decision.pattern, second);
        assert_eq!(decision.justification, "Fits the team");
        assert!(outcome.message.as_deref().unwrap().contains("Fits the team\n\nGo with it"));
        assert_eq!(outcome.state.tech_stack.len(), 1);
        assert_eq!(outcome.state.tech_stack[0].technology, "Rails");
    }

    #[tokio::test]
    async fn non_candidate_pick_is_ignored() {
        let mut ctx = ProjectContext::new(SessionId::new(), "Tool");
        ctx.decision_profile = Some(DecisionProfile::MvpFast);
        let candidates =
            OptionScorer::shortlist(&ctx.priority_weights(), ctx.constraints(), SHORTLIST_SIZE);
        let outsider = ArchitecturePattern::ALL
            .into_iter()
            .find(|p| candidates.iter().all(|c| c.pattern != *p))
            .unwrap();
        let provider = MockReasoningProvider::new().when_prompt_contains_json(
            TASK,
            json!({"recommended": outsider.key(), "recommendation": "x"}),
        );

        let outcome = run(ctx, &provider, &WorkflowConfig::default()).await;

        assert_eq!(
            outcome.state.proposed_architecture.unwrap().pattern,
            candidates[0].pattern
        );
    }

    #[tokio::test]
    async fn forced_option_wins_and_is_cleared() {
        let mut ctx = cost_first();
        ctx.forced_option = Some(ArchitecturePattern::Microservices);
        let provider = MockReasoningProvider::new().when_prompt_contains_json(
            TASK,
            json!({
                "recommended": "monolith",
                "recommendation": "Keep it simple",
                "tech_stack": [{"layer": "backend", "technology": "Django"}]
            }),
        );

        let outcome = run(ctx, &provider, &WorkflowConfig::default()).await;
        let state = outcome.state;
        let decision = state.proposed_architecture.clone().unwrap();

        assert_eq!(decision.pattern, ArchitecturePattern::Microservices);
        assert!(decision.justification.starts_with(REVISION_PREFIX));
        assert!(state.forced_option.is_none());
        assert_eq!(state.shortlist[0].pattern, ArchitecturePattern::Microservices);
        let occurrences = state
            .shortlist
            .iter()
            .filter(|d| d.pattern == ArchitecturePattern::Microservices)
            .count();
        assert_eq!(occurrences, 1);
        assert_eq!(state.tech_stack, default_tech_stack(ArchitecturePattern::Microservices));

        // an unforced pass goes back to the scorer's choice
        let top = expected_top(&state);
        let again = run(state, &MockReasoningProvider::unavailable(), &WorkflowConfig::default()).await;
        assert_eq!(again.state.proposed_architecture.unwrap().pattern, top);
    }
}

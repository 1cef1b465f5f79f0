//! Feasibility: cost, operations and team assessment of the proposed option,
//! cross-checked against the session's constraints.

use serde_json::{json, Value};
use tracing::{info, warn};

use super::{ask_structured, bullets, project_brief};
use crate::config::WorkflowConfig;
use crate::domain::advisory::{
    ArchitecturePattern, Band, ConstraintKind, FeasibilityAssessment, ProjectContext,
};
use crate::domain::analysis::option_profile;
use crate::domain::workflow::{NodeId, NodeOutcome};
use crate::ports::ReasoningProvider;

pub const TASK: &str = "Task: feasibility assessment";

fn schema() -> Value {
    let band = json!({"type": "string", "enum": ["low", "medium", "high"]});
    let strings = json!({"type": "array", "items": {"type": "string"}});
    json!({
        "type": "object",
        "required": ["cost_band", "ops_complexity", "team_fit", "time_estimate"],
        "properties": {
            "cost_band": band.clone(),
            "ops_complexity": band,
            "cost_drivers": strings.clone(),
            "cost_reducers": strings.clone(),
            "team_fit": {"type": "boolean"},
            "time_estimate": {"type": "string"},
            "risks": strings
        }
    })
}

/// Assessment derived from the catalog alone.
pub fn catalog_assessment(pattern: ArchitecturePattern) -> FeasibilityAssessment {
    let profile = option_profile(pattern);
    FeasibilityAssessment {
        cost_band: profile.cost_level,
        ops_complexity: profile.complexity,
        cost_drivers: Vec::new(),
        cost_reducers: Vec::new(),
        team_fit: profile.complexity != Band::High,
        time_estimate: profile.typical_timeline.to_string(),
        risks: profile.cons.iter().map(|c| c.to_string()).collect(),
        warnings: Vec::new(),
    }
}

/// Compares an assessment with the constraints and describes every mismatch.
pub fn cross_check(ctx: &ProjectContext, assessment: &FeasibilityAssessment) -> Vec<String> {
    let mut warnings = Vec::new();
    for constraint in ctx.constraints() {
        let description = constraint.description.to_lowercase();
        match constraint.kind {
            ConstraintKind::Budget
                if constraint.severity.is_severe() && assessment.cost_band == Band::High =>
            {
                warnings.push(format!(
                    "High running cost conflicts with the budget constraint: {}",
                    constraint.description
                ));
            }
            ConstraintKind::Timeline
                if description.contains("week")
                    && assessment.time_estimate.to_lowercase().contains("month") =>
            {
                warnings.push(format!(
                    "Estimated delivery of {} may miss the timeline: {}",
                    assessment.time_estimate, constraint.description
                ));
            }
            ConstraintKind::Team
                if assessment.ops_complexity == Band::High && !assessment.team_fit =>
            {
                warnings.push(format!(
                    "Operational complexity is high for the team: {}",
                    constraint.description
                ));
            }
            _ => {}
        }
    }
    warnings
}

/// Moves confidence up when nothing clashes and down when many things do.
fn nudge_confidence(ctx: &mut ProjectContext, warning_count: usize) {
    let current = ctx.confidence_score();
    if warning_count == 0 {
        ctx.set_confidence(current.max((current + 0.1).min(0.95)));
    } else if warning_count > 2 {
        ctx.set_confidence(current.min((current - 0.1).max(0.4)));
    }
}

pub async fn run<P>(mut ctx: ProjectContext, provider: &P, _config: &WorkflowConfig) -> NodeOutcome
where
    P: ReasoningProvider + ?Sized,
{
    info!(session_id = %ctx.session_id, node = "feasibility", "Running feasibility");

    let Some(pattern) = ctx.proposed_architecture.as_ref().map(|d| d.pattern) else {
        warn!(session_id = %ctx.session_id, "No proposed option, returning to option scoring");
        return NodeOutcome::goto(
            ctx,
            "No architecture has been selected yet, so I'll score the options first.",
            NodeId::OptionScoring,
        );
    };

    let profile = option_profile(pattern);
    let prompt = format!(
        "{TASK}\n\nAssess the feasibility of building this project as a {} ({}). \
Estimate the cost band, operational complexity, whether the team described can run it, \
a time estimate for a first release, cost drivers and reducers, and the main risks.\n\n{}\n\
Tech stack:\n{}",
        profile.name,
        profile.description,
        project_brief(&ctx),
        ctx.tech_stack
            .iter()
            .map(|t| format!("- {}: {}", t.layer.label(), t.technology))
            .collect::<Vec<_>>()
            .join("\n")
    );

    let mut assessment = ask_structured::<FeasibilityAssessment, _>(
        provider,
        &ctx,
        NodeId::Feasibility,
        &prompt,
        &schema(),
    )
    .await
    .unwrap_or_else(|| catalog_assessment(pattern));

    assessment.warnings = cross_check(&ctx, &assessment);
    nudge_confidence(&mut ctx, assessment.warnings.len());

    let mut reply = format!(
        "## Feasibility\n\n- Cost: {}\n- Operational complexity: {}\n- Team fit: {}\n- Time estimate: {}",
        assessment.cost_band,
        assessment.ops_complexity,
        if assessment.team_fit { "yes" } else { "no" },
        assessment.time_estimate
    );
    if !assessment.risks.is_empty() {
        reply.push_str(&format!("\n\n**Risks**\n{}", bullets(&assessment.risks, 5)));
    }
    if !assessment.warnings.is_empty() {
        reply.push_str(&format!("\n\n**Warnings**\n{}", bullets(&assessment.warnings, 5)));
    }

    info!(
        session_id = %ctx.session_id,
        cost = %assessment.cost_band,
        warnings = assessment.warnings.len(),
        confidence = ctx.confidence_score(),
        "Feasibility assessed"
    );
    ctx.feasibility = Some(assessment);
    NodeOutcome::proceed(ctx, reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::reasoning::MockReasoningProvider;
    use crate::domain::advisory::{ArchitecturalDecision, Constraint, Priority};
    use crate::domain::foundation::SessionId;
    use crate::domain::workflow::Signal;

    fn proposed(pattern: ArchitecturePattern) -> ProjectContext {
        let mut ctx = ProjectContext::new(SessionId::new(), "Marketplace");
        ctx.proposed_architecture = Some(ArchitecturalDecision {
            pattern,
            justification: "j".into(),
            trade_offs: vec![],
            alternatives_considered: vec![],
            score: 60.0,
        });
        ctx.set_confidence(0.6);
        ctx
    }

    #[tokio::test]
    async fn missing_option_redirects_to_scoring() {
        let ctx = ProjectContext::new(SessionId::new(), "x");
        let outcome = run(ctx, &MockReasoningProvider::unavailable(), &WorkflowConfig::default()).await;
        assert_eq!(outcome.signal, Signal::GotoNode(NodeId::OptionScoring));
        assert!(outcome.state.feasibility.is_none());
    }

    #[tokio::test]
    async fn clean_assessment_raises_confidence() {
        let provider = MockReasoningProvider::unavailable();
        let outcome = run(
            proposed(ArchitecturePattern::Monolith),
            &provider,
            &WorkflowConfig::default(),
        )
        .await;

        let feasibility = outcome.state.feasibility.as_ref().unwrap();
        assert_eq!(feasibility.cost_band, Band::Low);
        assert!(feasibility.warnings.is_empty());
        assert!((outcome.state.confidence_score() - 0.7).abs() < 1e-9);
    }

    #[tokio::test]
    async fn constraint_mismatches_become_warnings() {
        let provider = MockReasoningProvider::new().when_prompt_contains_json(
            TASK,
            json!({
                "cost_band": "high",
                "ops_complexity": "high",
                "team_fit": false,
                "time_estimate": "6 months",
                "risks": ["Distributed tracing"]
            }),
        );
        let mut ctx = proposed(ArchitecturePattern::Microservices);
        ctx.add_constraint(Constraint::new(ConstraintKind::Budget, "Seed funding", Priority::High));
        ctx.add_constraint(Constraint::new(ConstraintKind::Timeline, "Launch in 6 weeks", Priority::High));
        ctx.add_constraint(Constraint::new(ConstraintKind::Team, "Two developers", Priority::Medium));

        let outcome = run(ctx, &provider, &WorkflowConfig::default()).await;

        let feasibility = outcome.state.feasibility.as_ref().unwrap();
        assert_eq!(feasibility.warnings.len(), 3);
        assert!((outcome.state.confidence_score() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn nudges_respect_bounds() {
        let mut ctx = ProjectContext::new(SessionId::new(), "x");
        ctx.set_confidence(0.9);
        nudge_confidence(&mut ctx, 0);
        assert!((ctx.confidence_score() - 0.95).abs() < 1e-9);

        ctx.set_confidence(0.98);
        nudge_confidence(&mut ctx, 0);
        assert!((ctx.confidence_score() - 0.98).abs() < 1e-9);

        ctx.set_confidence(0.45);
        nudge_confidence(&mut ctx, 3);
        assert!((ctx.confidence_score() - 0.4).abs() < 1e-9);

        ctx.set_confidence(0.3);
        nudge_confidence(&mut ctx, 4);
        assert!((ctx.confidence_score() - 0.3).abs() < 1e-9);
    }
}

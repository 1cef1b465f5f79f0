//! Priority: settles how the options will be weighted.
//!
//! Either a named decision profile or an explicit 1-5 ranking of the five
//! dimensions. An inferred profile is only adopted tentatively; the user
//! confirms it or picks another one.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{ask_structured, project_brief, ResponseOutcome};
use crate::config::WorkflowConfig;
use crate::domain::advisory::{DecisionProfile, PriorityDimension, PriorityRanking, ProjectContext};
use crate::domain::workflow::{NodeId, NodeOutcome};
use crate::ports::ReasoningProvider;

pub const TASK: &str = "Task: decision profile inference";

/// Inferred profiles above this confidence are proposed for confirmation.
pub const CONFIRMATION_THRESHOLD: f64 = 0.75;

/// Dimensions a typed ranking must mention to be accepted.
const MIN_RANKED_DIMENSIONS: usize = 3;

const CONFIRMATIONS: [&str; 10] = [
    "yes", "y", "ok", "okay", "sure", "confirm", "confirmed", "correct", "agreed", "sounds good",
];
const REJECTIONS: [&str; 4] = ["no", "n", "nope", "not really"];

#[derive(Debug, Deserialize)]
struct ProfileInference {
    profile: DecisionProfile,
    confidence: f64,
    #[serde(default)]
    reasoning: String,
}

fn schema() -> Value {
    json!({
        "type": "object",
        "required": ["profile", "confidence"],
        "properties": {
            "profile": {
                "type": "string",
                "enum": ["mvp_fast", "cost_first", "scale_first", "security_first"]
            },
            "confidence": {"type": "number", "minimum": 0, "maximum": 1},
            "reasoning": {"type": "string"}
        }
    })
}

pub async fn run<P>(mut ctx: ProjectContext, provider: &P, _config: &WorkflowConfig) -> NodeOutcome
where
    P: ReasoningProvider + ?Sized,
{
    if ctx.has_priorities() {
        debug!(session_id = %ctx.session_id, "Priorities already set, skipping");
        return NodeOutcome::pass(ctx);
    }
    info!(session_id = %ctx.session_id, node = "priority", "Running priority");

    let prompt = format!(
        "{TASK}\n\nWhich decision profile best fits this project? Profiles: mvp_fast \
(ship quickly), cost_first (minimize spend), scale_first (handle growth), security_first \
(protect data, meet compliance). Give your confidence from 0 to 1.\n\n{}",
        project_brief(&ctx)
    );
    let inferred =
        ask_structured::<ProfileInference, _>(provider, &ctx, NodeId::Priority, &prompt, &schema())
            .await;

    ctx.waiting_for_user = true;
    match inferred {
        Some(inference) if inference.confidence > CONFIRMATION_THRESHOLD => {
            info!(
                session_id = %ctx.session_id,
                profile = %inference.profile,
                confidence = inference.confidence,
                "Proposing inferred profile"
            );
            ctx.decision_profile = Some(inference.profile);
            let reply = confirmation_reply(&inference);
            NodeOutcome::suspend(ctx, reply)
        }
        _ => NodeOutcome::suspend(ctx, menu_reply()),
    }
}

/// Applies the user's reply to a priority prompt.
pub fn process_response(ctx: &mut ProjectContext, message: &str) -> ResponseOutcome {
    let normalized = message.trim().trim_end_matches(['.', '!']).to_lowercase();

    if ctx.decision_profile.is_some() && CONFIRMATIONS.contains(&normalized.as_str()) {
        return ResponseOutcome::Resolved;
    }
    if REJECTIONS.contains(&normalized.as_str()) {
        ctx.decision_profile = None;
        return ResponseOutcome::Reprompt(menu_reply());
    }

    if let Ok(choice) = normalized.parse::<usize>() {
        return match DecisionProfile::from_menu_choice(choice) {
            Some(profile) => select_profile(ctx, profile),
            None => ResponseOutcome::Reprompt(format!(
                "Please pick a number between 1 and {}.\n\n{}",
                DecisionProfile::ALL.len(),
                menu_reply()
            )),
        };
    }

    // rankings mention dimension names that also read as profile keywords
    if let Some(ranking) = parse_ranking(message) {
        info!(session_id = %ctx.session_id, ?ranking, "Explicit priority ranking set");
        ctx.priority_ranking = Some(ranking);
        ctx.decision_profile = None;
        return ResponseOutcome::Resolved;
    }

    if let Some(profile) = DecisionProfile::from_keyword(&normalized) {
        return select_profile(ctx, profile);
    }

    ResponseOutcome::Reprompt(format!(
        "Sorry, I could not read that as a choice.\n\n{}",
        menu_reply()
    ))
}

fn select_profile(ctx: &mut ProjectContext, profile: DecisionProfile) -> ResponseOutcome {
    info!(session_id = %ctx.session_id, %profile, "Decision profile selected");
    ctx.decision_profile = Some(profile);
    ctx.priority_ranking = None;
    ResponseOutcome::Resolved
}

/// Parses `name: n` pairs separated by commas, semicolons or newlines.
///
/// At least three distinct dimensions with values 1-5 are required; the
/// others default to neutral.
pub fn parse_ranking(message: &str) -> Option<PriorityRanking> {
    let mut values = BTreeMap::new();
    for part in message.split([',', ';', '\n']) {
        let Some((name, value)) = part.split_once([':', '=']) else {
            continue;
        };
        let Some(dimension) = PriorityDimension::from_word(name) else {
            continue;
        };
        let Ok(value) = value.trim().parse::<u8>() else {
            continue;
        };
        if (PriorityRanking::MIN..=PriorityRanking::MAX).contains(&value) {
            values.insert(dimension.key(), (dimension, value));
        }
    }

    if values.len() < MIN_RANKED_DIMENSIONS {
        return None;
    }
    let mut ranking = PriorityRanking::default();
    for (dimension, value) in values.into_values() {
        ranking.set(dimension, value);
    }
    Some(ranking)
}

fn confirmation_reply(inference: &ProfileInference) -> String {
    let mut reply = format!(
        "It looks like **{}** fits best: {}.",
        inference.profile.display_name(),
        inference.profile.description()
    );
    if !inference.reasoning.trim().is_empty() {
        reply.push_str(&format!("\n\n{}", inference.reasoning.trim()));
    }
    reply.push_str("\n\nReply \"yes\" to confirm, or pick another profile:\n\n");
    reply.push_str(&profile_menu());
    reply
}

fn menu_reply() -> String {
    format!(
        "What matters most for this project? Pick a profile:\n\n{}\n\n\
Or rank each dimension from 1 to 5, for example \
`time: 5, cost: 4, scale: 2, reliability: 3, security: 3`.",
        profile_menu()
    )
}

fn profile_menu() -> String {
    DecisionProfile::ALL
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}. {} - {}", i + 1, p.display_name(), p.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

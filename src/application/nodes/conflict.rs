//! Conflict: surfaces tensions between requirements and constraints and asks
//! the user to pick a compromise for each.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{ask_structured, project_brief, ResponseOutcome};
use crate::config::WorkflowConfig;
use crate::domain::advisory::{Conflict, Fact, FactSource, ProjectContext};
use crate::domain::analysis::ConflictDetector;
use crate::domain::workflow::{NodeId, NodeOutcome};
use crate::ports::ReasoningProvider;

pub const TASK: &str = "Task: conflict detection";

#[derive(Debug, Deserialize)]
struct DetectedConflicts {
    #[serde(default)]
    conflicts: Vec<DetectedConflict>,
}

#[derive(Debug, Deserialize)]
struct DetectedConflict {
    name: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    requirements: Vec<String>,
    #[serde(default)]
    compromises: Vec<String>,
}

fn schema() -> Value {
    json!({
        "type": "object",
        "required": ["conflicts"],
        "properties": {
            "conflicts": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name", "explanation", "compromises"],
                    "properties": {
                        "name": {"type": "string"},
                        "explanation": {"type": "string"},
                        "requirements": {"type": "array", "items": {"type": "string"}},
                        "compromises": {"type": "array", "items": {"type": "string"}}
                    }
                }
            }
        }
    })
}

/// Adds conflicts whose name is not already tracked. Existing entries,
/// resolved or not, are left untouched.
fn merge(existing: &mut Vec<Conflict>, incoming: Vec<Conflict>) -> usize {
    let mut added = 0;
    for conflict in incoming {
        let known = existing
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(conflict.name.trim()));
        if !known && !conflict.name.trim().is_empty() {
            existing.push(conflict);
            added += 1;
        }
    }
    added
}

pub async fn run<P>(mut ctx: ProjectContext, provider: &P, _config: &WorkflowConfig) -> NodeOutcome
where
    P: ReasoningProvider + ?Sized,
{
    info!(session_id = %ctx.session_id, node = "conflict", "Running conflict detection");

    let detected = ConflictDetector::detect(ctx.requirements(), ctx.constraints());
    let rule_count = merge(&mut ctx.conflicts, detected);

    if !ctx.conflict_analysis_done {
        ctx.conflict_analysis_done = true;
        let prompt = format!(
            "{TASK}\n\nList genuine conflicts between the requirements, constraints and \
priorities below. For each, name it, explain the tension and offer two or three concrete \
compromises. Return an empty list when there are none.\n\n{}",
            project_brief(&ctx)
        );
        if let Some(response) =
            ask_structured::<DetectedConflicts, _>(provider, &ctx, NodeId::Conflict, &prompt, &schema())
                .await
        {
            let reasoned = response
                .conflicts
                .into_iter()
                .map(|c| {
                    let compromises = if c.compromises.is_empty() {
                        vec!["Accept the trade-off as is".to_string()]
                    } else {
                        c.compromises
                    };
                    Conflict::new(c.name.trim(), c.explanation, compromises).involving(c.requirements)
                })
                .collect();
            let added = merge(&mut ctx.conflicts, reasoned);
            debug!(session_id = %ctx.session_id, added, "Merged reasoned conflicts");
        }
    }

    info!(
        session_id = %ctx.session_id,
        from_rules = rule_count,
        total = ctx.conflicts.len(),
        "Conflict detection complete"
    );

    match ctx.conflicts.iter().find(|c| !c.resolved) {
        Some(conflict) => {
            let reply = present(conflict);
            ctx.waiting_for_user = true;
            NodeOutcome::suspend(ctx, reply)
        }
        None => NodeOutcome::pass(ctx),
    }
}

/// Resolves the first unresolved conflict from the user's reply.
///
/// A number picks the matching compromise; any other text is taken as the
/// user's own compromise.
pub fn process_response(ctx: &mut ProjectContext, message: &str) -> ResponseOutcome {
    let Some(index) = ctx.conflicts.iter().position(|c| !c.resolved) else {
        return ResponseOutcome::Resolved;
    };
    let text = message.trim();
    if text.is_empty() {
        return ResponseOutcome::Reprompt(present(&ctx.conflicts[index]));
    }

    let chosen = match text.trim_end_matches('.').parse::<usize>() {
        Ok(number) => match number
            .checked_sub(1)
            .and_then(|i| ctx.conflicts[index].compromises.get(i))
        {
            Some(compromise) => compromise.clone(),
            None => {
                return ResponseOutcome::Reprompt(format!(
                    "There is no option {number}.\n\n{}",
                    present(&ctx.conflicts[index])
                ))
            }
        },
        Err(_) => text.to_string(),
    };

    let conflict = &mut ctx.conflicts[index];
    conflict.resolve(chosen.clone());
    let key = format!("conflict_resolution:{}", fact_key(&conflict.name));
    info!(session_id = %ctx.session_id, conflict = %conflict.name, %chosen, "Conflict resolved");

    ctx.add_fact(Fact::new(key, chosen, FactSource::ConflictResolution).with_raw_value(text));
    ResponseOutcome::Resolved
}

fn fact_key(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn present(conflict: &Conflict) -> String {
    let options = conflict
        .compromises
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {c}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "## Trade-off: {}\n\n{}\n\nHow would you like to handle it?\n\n{}\n\n\
Reply with a number, or describe your own compromise.",
        conflict.name, conflict.explanation, options
    )
}

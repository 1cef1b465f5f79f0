//! The synthesized recommendation document and roadmap normalization.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder task for a phase that produced nothing usable.
pub const PLACEHOLDER_TASK: &str = "Tasks to be defined";

/// Fields of a phase object that describe the phase rather than its work.
const PHASE_META_FIELDS: [&str; 2] = ["name", "description"];

/// Architecture decision record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Sequential identifier, `ADR-001` onwards.
    pub id: String,
    pub title: String,
    pub context: String,
    pub decision: String,
    #[serde(default)]
    pub consequences: Vec<String>,
}

impl DecisionRecord {
    /// Formats the sequential record id for a zero-based index.
    pub fn id_for(index: usize) -> String {
        format!("ADR-{:03}", index + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapPhase {
    pub name: String,
    pub tasks: Vec<String>,
}

impl RoadmapPhase {
    /// Builds a phase from a loosely shaped task value.
    pub fn from_raw(name: impl Into<String>, raw: &RoadmapValue) -> Self {
        Self {
            name: name.into(),
            tasks: normalize_phase_tasks(raw),
        }
    }
}

/// The final recommendation assembled by synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedDocument {
    pub executive_summary: String,
    /// Mermaid flowchart source.
    pub diagram: String,
    pub decision_records: Vec<DecisionRecord>,
    pub roadmap: Vec<RoadmapPhase>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub unknowns: Vec<String>,
}

/// Task list for a roadmap phase as it arrives from the reasoning service.
///
/// Phases show up as flat lists, objects with a `tasks` key, nested mixtures
/// of both, or bare scalars.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoadmapValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<RoadmapValue>),
    Map(BTreeMap<String, RoadmapValue>),
}

impl From<Vec<String>> for RoadmapValue {
    fn from(tasks: Vec<String>) -> Self {
        RoadmapValue::List(tasks.into_iter().map(RoadmapValue::Text).collect())
    }
}

impl From<&str> for RoadmapValue {
    fn from(text: &str) -> Self {
        RoadmapValue::Text(text.to_string())
    }
}

/// Flattens any roadmap value into a list of task strings.
///
/// Objects contribute their `tasks` entry when present, otherwise every field
/// except the phase's own name and description. Blank strings are dropped.
pub fn normalize_tasks(value: &RoadmapValue) -> Vec<String> {
    match value {
        RoadmapValue::Null => Vec::new(),
        RoadmapValue::Bool(b) => vec![b.to_string()],
        RoadmapValue::Number(n) => vec![format_number(*n)],
        RoadmapValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            }
        }
        RoadmapValue::List(items) => items.iter().flat_map(normalize_tasks).collect(),
        RoadmapValue::Map(fields) => match fields.get("tasks") {
            Some(tasks) => normalize_tasks(tasks),
            None => fields
                .iter()
                .filter(|(key, _)| !PHASE_META_FIELDS.contains(&key.as_str()))
                .flat_map(|(_, v)| normalize_tasks(v))
                .collect(),
        },
    }
}

/// Like [`normalize_tasks`], but never returns an empty list.
pub fn normalize_phase_tasks(value: &RoadmapValue) -> Vec<String> {
    let tasks = normalize_tasks(value);
    if tasks.is_empty() {
        vec![PLACEHOLDER_TASK.to_string()]
    } else {
        tasks
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

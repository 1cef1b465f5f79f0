//! Synthesis: assembles the recommendation document from four independently
//! generated parts, each with its own deterministic fallback.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{ask_structured, ask_text, bullets, project_brief};
use crate::config::WorkflowConfig;
use crate::domain::advisory::{
    ArchitecturalDecision, DecisionRecord, ProjectContext, RoadmapPhase, RoadmapValue,
    SynthesizedDocument, TechLayer, MIN_DECISION_RECORDS,
};
use crate::domain::analysis::option_profile;
use crate::domain::workflow::{NodeId, NodeOutcome};
use crate::ports::ReasoningProvider;

pub const TASK_SUMMARY: &str = "Task: executive summary";
pub const TASK_DIAGRAM: &str = "Task: architecture diagram";
pub const TASK_RECORDS: &str = "Task: decision records";
pub const TASK_ROADMAP: &str = "Task: implementation roadmap";

const CONFIDENCE_FLOOR: f64 = 0.75;

const MERMAID_KEYWORDS: [&str; 7] = [
    "flowchart",
    "graph",
    "sequenceDiagram",
    "classDiagram",
    "stateDiagram",
    "erDiagram",
    "C4Context",
];

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    executive_summary: String,
    #[serde(default)]
    next_steps: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    #[serde(default)]
    records: Vec<RecordDraft>,
}

#[derive(Debug, Deserialize)]
struct RecordDraft {
    title: String,
    #[serde(default)]
    context: String,
    decision: String,
    #[serde(default)]
    consequences: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RoadmapResponse {
    #[serde(default)]
    phases: RoadmapValue,
}

/// Strips markdown fences and makes sure the text starts with a mermaid
/// diagram keyword.
pub fn clean_diagram(raw: &str) -> String {
    let body: Vec<&str> = raw
        .trim()
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect();
    let body = body.join("\n").trim().to_string();
    if MERMAID_KEYWORDS.iter().any(|k| body.starts_with(k)) {
        body
    } else {
        format!("flowchart TD\n{body}")
    }
}

fn fallback_diagram(ctx: &ProjectContext) -> String {
    let technology = |layer: TechLayer| {
        ctx.tech_stack
            .iter()
            .find(|t| t.layer == layer)
            .map(|t| t.technology.replace('"', "'"))
    };
    let mut lines = vec![
        "flowchart TD".to_string(),
        "    User[User] --> App".to_string(),
        format!(
            "    App[\"{}\"]",
            technology(TechLayer::Backend).unwrap_or_else(|| "Application".to_string())
        ),
        format!(
            "    App --> DB[(\"{}\")]",
            technology(TechLayer::Database).unwrap_or_else(|| "Database".to_string())
        ),
    ];
    if let Some(cache) = technology(TechLayer::Cache) {
        lines.push(format!("    App --> Cache[(\"{cache}\")]"));
    }
    if let Some(queue) = technology(TechLayer::Messaging) {
        lines.push(format!("    App --> Queue[[\"{queue}\"]]"));
    }
    lines.join("\n")
}

fn fallback_records(ctx: &ProjectContext) -> Vec<DecisionRecord> {
    let pattern_record = match &ctx.proposed_architecture {
        Some(decision) => pattern_record(decision),
        None => DecisionRecord {
            id: String::new(),
            title: "Architecture pattern".into(),
            context: "No option was selected.".into(),
            decision: "Start with a simple monolith and revisit once requirements settle.".into(),
            consequences: vec!["The choice should be reviewed before scaling".into()],
        },
    };
    let layer_record = |layer: TechLayer, title: &str, fallback: &str| {
        let choice = ctx
            .tech_stack
            .iter()
            .find(|t| t.layer == layer)
            .map(|t| t.technology.clone())
            .unwrap_or_else(|| fallback.to_string());
        DecisionRecord {
            id: String::new(),
            title: title.to_string(),
            context: format!("The system needs a {} choice.", layer.label().to_lowercase()),
            decision: format!("Use {choice}."),
            consequences: vec![format!("The team must operate {choice}")],
        }
    };
    vec![
        pattern_record,
        layer_record(TechLayer::Database, "Data storage", "a managed relational database"),
        layer_record(TechLayer::Cloud, "Deployment", "a managed hosting platform"),
    ]
}

fn pattern_record(decision: &ArchitecturalDecision) -> DecisionRecord {
    let profile = option_profile(decision.pattern);
    DecisionRecord {
        id: String::new(),
        title: format!("Adopt a {} architecture", profile.name.to_lowercase()),
        context: format!(
            "Alternatives considered: {}.",
            decision
                .alternatives_considered
                .iter()
                .map(|p| option_profile(*p).name)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        decision: decision.justification.clone(),
        consequences: decision.trade_offs.clone(),
    }
}

fn fallback_roadmap() -> Vec<RoadmapPhase> {
    [
        ("Foundation", vec!["Set up repository and CI", "Provision environments", "Design the data model"]),
        ("Core features", vec!["Build the primary user flows", "Add authentication", "Write integration tests"]),
        ("Launch", vec!["Load test", "Set up monitoring and alerts", "Release to production"]),
    ]
    .into_iter()
    .map(|(name, tasks)| {
        let tasks: Vec<String> = tasks.into_iter().map(String::from).collect();
        RoadmapPhase::from_raw(name, &RoadmapValue::from(tasks))
    })
    .collect()
}

fn phase_from_value(index: usize, value: &RoadmapValue) -> RoadmapPhase {
    let name = match value {
        RoadmapValue::Map(fields) => match fields.get("name") {
            Some(RoadmapValue::Text(name)) if !name.trim().is_empty() => name.trim().to_string(),
            _ => format!("Phase {}", index + 1),
        },
        _ => format!("Phase {}", index + 1),
    };
    RoadmapPhase::from_raw(name, value)
}

/// Reads phases keyed by name, a list of phases, or a single phase object.
/// Keyed phases come back in key order.
fn roadmap_phases(value: &RoadmapValue) -> Vec<RoadmapPhase> {
    match value {
        RoadmapValue::Null => Vec::new(),
        RoadmapValue::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, phase)| phase_from_value(i, phase))
            .collect(),
        RoadmapValue::Map(fields) if matches!(fields.get("name"), Some(RoadmapValue::Text(_))) => {
            vec![phase_from_value(0, value)]
        }
        RoadmapValue::Map(fields) => fields
            .iter()
            .map(|(name, tasks)| RoadmapPhase::from_raw(name.trim(), tasks))
            .collect(),
        scalar => vec![phase_from_value(0, scalar)],
    }
}

fn assumptions(ctx: &ProjectContext) -> Vec<String> {
    ctx.constraints()
        .iter()
        .map(|c| format!("{} constraint holds: {}", c.kind.label(), c.description))
        .collect()
}

async fn summary<P>(ctx: &ProjectContext, provider: &P, brief: &str) -> (String, Vec<String>)
where
    P: ReasoningProvider + ?Sized,
{
    let prompt = format!(
        "{TASK_SUMMARY}\n\nWrite a one-paragraph executive summary of the recommendation and \
three to five concrete next steps.\n\n{brief}"
    );
    let schema = json!({
        "type": "object",
        "required": ["executive_summary"],
        "properties": {
            "executive_summary": {"type": "string"},
            "next_steps": {"type": "array", "items": {"type": "string"}}
        }
    });
    match ask_structured::<SummaryResponse, _>(provider, ctx, NodeId::Synthesis, &prompt, &schema).await {
        Some(r) if !r.executive_summary.trim().is_empty() => {
            (r.executive_summary.trim().to_string(), r.next_steps)
        }
        _ => {
            let name = ctx
                .proposed_architecture
                .as_ref()
                .map(|d| option_profile(d.pattern).name)
                .unwrap_or("simple monolith");
            (
                format!(
                    "We recommend a {} for {}. It balances the stated priorities against the \
constraints, and the roadmap below delivers it in three phases.",
                    name.to_lowercase(),
                    ctx.project_name.as_deref().unwrap_or("this project")
                ),
                vec![
                    "Review the decision records with the team".into(),
                    "Start the foundation phase".into(),
                ],
            )
        }
    }
}

fn records_schema() -> Value {
    json!({
        "type": "object",
        "required": ["records"],
        "properties": {
            "records": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["title", "decision"],
                    "properties": {
                        "title": {"type": "string"},
                        "context": {"type": "string"},
                        "decision": {"type": "string"},
                        "consequences": {"type": "array", "items": {"type": "string"}}
                    }
                }
            }
        }
    })
}

fn roadmap_schema() -> Value {
    json!({
        "type": "object",
        "required": ["phases"],
        "properties": {
            "phases": {"type": ["object", "array"]}
        }
    })
}

pub async fn run<P>(mut ctx: ProjectContext, provider: &P, _config: &WorkflowConfig) -> NodeOutcome
where
    P: ReasoningProvider + ?Sized,
{
    info!(session_id = %ctx.session_id, node = "synthesis", "Running synthesis");

    let mut brief = project_brief(&ctx);
    if let Some(decision) = &ctx.proposed_architecture {
        brief.push_str(&format!(
            "Selected option: {} - {}\n",
            option_profile(decision.pattern).name,
            decision.justification
        ));
    }
    if !ctx.tech_stack.is_empty() {
        brief.push_str("Tech stack:\n");
        for t in &ctx.tech_stack {
            brief.push_str(&format!("- {}: {}\n", t.layer.label(), t.technology));
        }
    }
    if let Some(f) = &ctx.feasibility {
        brief.push_str(&format!(
            "Feasibility: cost {}, complexity {}, estimate {}\n",
            f.cost_band, f.ops_complexity, f.time_estimate
        ));
    }

    let (executive_summary, next_steps) = summary(&ctx, provider, &brief).await;

    let diagram_prompt = format!(
        "{TASK_DIAGRAM}\n\nDraw the system as a mermaid flowchart. Reply with the diagram \
source only.\n\n{brief}"
    );
    let diagram = match ask_text(provider, &ctx, NodeId::Synthesis, diagram_prompt).await {
        Some(text) => clean_diagram(&text),
        None => fallback_diagram(&ctx),
    };

    let records_prompt = format!(
        "{TASK_RECORDS}\n\nWrite at least {MIN_DECISION_RECORDS} architecture decision records \
covering the pattern, data storage and deployment.\n\n{brief}"
    );
    let mut records: Vec<DecisionRecord> = ask_structured::<RecordsResponse, _>(
        provider,
        &ctx,
        NodeId::Synthesis,
        &records_prompt,
        &records_schema(),
    )
    .await
    .map(|r| r.records)
    .unwrap_or_default()
    .into_iter()
    .filter(|r| !r.title.trim().is_empty())
    .map(|r| DecisionRecord {
        id: String::new(),
        title: r.title.trim().to_string(),
        context: r.context,
        decision: r.decision,
        consequences: r.consequences,
    })
    .collect();
    if records.len() < MIN_DECISION_RECORDS {
        let missing = MIN_DECISION_RECORDS - records.len();
        let mut fallback = fallback_records(&ctx);
        fallback.retain(|f| !records.iter().any(|r| r.title.eq_ignore_ascii_case(&f.title)));
        records.extend(fallback.into_iter().take(missing));
    }
    for (index, record) in records.iter_mut().enumerate() {
        record.id = DecisionRecord::id_for(index);
    }

    let roadmap_prompt = format!(
        "{TASK_ROADMAP}\n\nBreak delivery into three or four named phases, each with a list \
of tasks. Reply with an object whose `phases` maps each phase name to its tasks.\n\n{brief}"
    );
    let roadmap: Vec<RoadmapPhase> = match ask_structured::<RoadmapResponse, _>(
        provider,
        &ctx,
        NodeId::Synthesis,
        &roadmap_prompt,
        &roadmap_schema(),
    )
    .await
    {
        Some(r) => {
            let phases = roadmap_phases(&r.phases);
            if phases.is_empty() {
                fallback_roadmap()
            } else {
                phases
            }
        }
        None => fallback_roadmap(),
    };

    let document = SynthesizedDocument {
        executive_summary,
        diagram,
        decision_records: records,
        roadmap,
        next_steps,
        assumptions: assumptions(&ctx),
        unknowns: ctx.open_questions.clone(),
    };
    let reply = render(&document);

    info!(
        session_id = %ctx.session_id,
        records = document.decision_records.len(),
        phases = document.roadmap.len(),
        "Document synthesized"
    );
    ctx.document = Some(document);
    ctx.raise_confidence_to(CONFIDENCE_FLOOR);
    NodeOutcome::proceed(ctx, reply)
}

fn render(document: &SynthesizedDocument) -> String {
    let mut out = format!(
        "# Architecture Recommendation\n\n{}\n\n```mermaid\n{}\n```\n\n## Decisions\n",
        document.executive_summary, document.diagram
    );
    for record in &document.decision_records {
        out.push_str(&format!("- **{}** {}: {}\n", record.id, record.title, record.decision));
    }
    out.push_str("\n## Roadmap\n");
    for phase in &document.roadmap {
        out.push_str(&format!("### {}\n{}\n", phase.name, bullets(&phase.tasks, usize::MAX)));
    }
    if !document.next_steps.is_empty() {
        out.push_str(&format!("\n## Next steps\n{}\n", bullets(&document.next_steps, 5)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::reasoning::MockReasoningProvider;
    use crate::domain::advisory::{
        ArchitecturePattern, Constraint, ConstraintKind, Priority, PLACEHOLDER_TASK,
    };
    use crate::domain::foundation::SessionId;
    use crate::domain::workflow::Signal;

    fn selected() -> ProjectContext {
        let mut ctx = ProjectContext::new(SessionId::new(), "Clinic scheduling");
        ctx.proposed_architecture = Some(ArchitecturalDecision {
            pattern: ArchitecturePattern::ModularMonolith,
            justification: "Balanced".into(),
            trade_offs: vec!["Discipline needed".into()],
            alternatives_considered: vec![ArchitecturePattern::Monolith],
            score: 71.0,
        });
        ctx.tech_stack = crate::application::nodes::option_scoring::default_tech_stack(
            ArchitecturePattern::ModularMonolith,
        );
        ctx.add_constraint(Constraint::new(ConstraintKind::Compliance, "HIPAA", Priority::Critical));
        ctx.open_questions = vec!["Expected patient volume?".into()];
        ctx
    }

    #[test]
    fn diagram_cleanup() {
        assert_eq!(clean_diagram("```mermaid\ngraph LR\nA-->B\n```"), "graph LR\nA-->B");
        assert_eq!(clean_diagram("A --> B"), "flowchart TD\nA --> B");
        assert_eq!(clean_diagram("sequenceDiagram\nA->>B: hi"), "sequenceDiagram\nA->>B: hi");
    }

    #[tokio::test]
    async fn fallbacks_produce_a_complete_document() {
        let outcome = run(selected(), &MockReasoningProvider::unavailable(), &WorkflowConfig::default()).await;
        let document = outcome.state.document.clone().unwrap();

        assert_eq!(outcome.signal, Signal::Continue);
        assert_eq!(document.decision_records.len(), 3);
        assert_eq!(document.decision_records[0].id, "ADR-001");
        assert_eq!(document.decision_records[2].id, "ADR-003");
        assert_eq!(document.roadmap.len(), 3);
        assert!(document.diagram.starts_with("flowchart TD"));
        assert_eq!(document.unknowns, vec!["Expected patient volume?".to_string()]);
        assert!(document.assumptions[0].contains("HIPAA"));
        assert!(outcome.state.confidence_score() >= CONFIDENCE_FLOOR);
    }

    #[tokio::test]
    async fn short_record_lists_are_topped_up() {
        let provider = MockReasoningProvider::new()
            .when_prompt_contains_json(
                TASK_RECORDS,
                json!({"records": [{"title": "Use event sourcing for audit", "decision": "Yes"}]}),
            )
            .when_prompt_contains_json(
                TASK_ROADMAP,
                json!({"phases": [
                    {"name": "MVP", "tasks": {"tasks": ["Auth", "Booking"]}},
                    {"name": "Later"}
                ]}),
            );

        let outcome = run(selected(), &provider, &WorkflowConfig::default()).await;
        let document = outcome.state.document.unwrap();

        assert_eq!(document.decision_records.len(), 3);
        assert_eq!(document.decision_records[0].title, "Use event sourcing for audit");
        assert_eq!(document.roadmap[0].tasks, vec!["Auth", "Booking"]);
        assert_eq!(document.roadmap[1].tasks, vec![PLACEHOLDER_TASK]);
    }

    #[tokio::test]
    async fn roadmap_phases_accept_lists_and_scalars() {
        let provider = MockReasoningProvider::new().when_prompt_contains_json(
            TASK_ROADMAP,
            json!({"phases": [
                ["Set up CI", "Design schema"],
                "Ship MVP",
                {"name": "Launch", "tasks": ["Deploy"]}
            ]}),
        );

        let outcome = run(selected(), &provider, &WorkflowConfig::default()).await;
        let roadmap = outcome.state.document.unwrap().roadmap;

        assert_eq!(roadmap.len(), 3);
        assert_eq!(roadmap[0].name, "Phase 1");
        assert_eq!(roadmap[0].tasks, vec!["Set up CI", "Design schema"]);
        assert_eq!(roadmap[1].name, "Phase 2");
        assert_eq!(roadmap[1].tasks, vec!["Ship MVP"]);
        assert_eq!(roadmap[2].name, "Launch");
        assert_eq!(roadmap[2].tasks, vec!["Deploy"]);
    }

    #[tokio::test]
    async fn roadmap_phases_keyed_by_name() {
        let provider = MockReasoningProvider::new().when_prompt_contains_json(
            TASK_ROADMAP,
            json!({"phases": {
                "Phase 1": ["Set up CI", "Design schema"],
                "Phase 2": {"tasks": ["Build booking", "Add auth"]},
                "Phase 3": "Deploy"
            }}),
        );

        let outcome = run(selected(), &provider, &WorkflowConfig::default()).await;
        let roadmap = outcome.state.document.unwrap().roadmap;

        let names: Vec<&str> = roadmap.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Phase 1", "Phase 2", "Phase 3"]);
        assert_eq!(roadmap[0].tasks, vec!["Set up CI", "Design schema"]);
        assert_eq!(roadmap[1].tasks, vec!["Build booking", "Add auth"]);
        assert_eq!(roadmap[2].tasks, vec!["Deploy"]);
    }

    #[test]
    fn empty_phases_yield_nothing() {
        assert!(roadmap_phases(&RoadmapValue::Null).is_empty());
        assert!(roadmap_phases(&RoadmapValue::List(Vec::new())).is_empty());
    }
}

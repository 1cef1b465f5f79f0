//! Requirements, constraints and the conflicts between them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Importance or severity level shared by requirements and constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// True for `High` and `Critical`.
    pub fn is_severe(&self) -> bool {
        matches!(self, Priority::Critical | Priority::High)
    }

    /// Multiplier applied to constraint penalties of this severity.
    pub fn penalty_factor(&self) -> f64 {
        match self {
            Priority::Critical | Priority::High => 1.0,
            Priority::Medium => 0.5,
            Priority::Low => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementCategory {
    Functional,
    NonFunctional,
}

/// Something the system must do or a quality it must have.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub category: RequirementCategory,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    /// Where the requirement came from (intake, follow-up answer, ...).
    #[serde(default)]
    pub source: Option<String>,
}

impl Requirement {
    pub fn functional(description: impl Into<String>, priority: Priority) -> Self {
        Self {
            category: RequirementCategory::Functional,
            description: description.into(),
            priority,
            source: None,
        }
    }

    pub fn non_functional(description: impl Into<String>, priority: Priority) -> Self {
        Self {
            category: RequirementCategory::NonFunctional,
            description: description.into(),
            priority,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Technical,
    Budget,
    Timeline,
    Compliance,
    Team,
}

impl ConstraintKind {
    pub fn label(&self) -> &'static str {
        match self {
            ConstraintKind::Technical => "Technical",
            ConstraintKind::Budget => "Budget",
            ConstraintKind::Timeline => "Timeline",
            ConstraintKind::Compliance => "Compliance",
            ConstraintKind::Team => "Team",
        }
    }
}

/// A limit the recommended solution has to respect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(rename = "type")]
    pub kind: ConstraintKind,
    pub description: String,
    #[serde(default)]
    pub severity: Priority,
}

impl Constraint {
    pub fn new(kind: ConstraintKind, description: impl Into<String>, severity: Priority) -> Self {
        Self {
            kind,
            description: description.into(),
            severity,
        }
    }
}

/// Tension between requirements and constraints that the user has to settle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub name: String,
    /// Descriptions of the requirements/constraints involved.
    #[serde(default)]
    pub requirements: Vec<String>,
    pub explanation: String,
    #[serde(default)]
    pub compromises: Vec<String>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub chosen_compromise: Option<String>,
}

impl Conflict {
    pub fn new(
        name: impl Into<String>,
        explanation: impl Into<String>,
        compromises: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            requirements: Vec::new(),
            explanation: explanation.into(),
            compromises,
            resolved: false,
            chosen_compromise: None,
        }
    }

    pub fn involving(mut self, items: Vec<String>) -> Self {
        self.requirements = items;
        self
    }

    /// Marks the conflict as settled with the given compromise.
    pub fn resolve(&mut self, compromise: impl Into<String>) {
        self.chosen_compromise = Some(compromise.into());
        self.resolved = true;
    }
}

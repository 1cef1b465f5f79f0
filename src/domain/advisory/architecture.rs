//! Architecture options, scored candidates and the decisions built from them.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::priorities::PriorityDimension;

/// Catalog entry identifier for an architecture option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchitecturePattern {
    Monolith,
    ModularMonolith,
    Microservices,
    Serverless,
    EventDriven,
    Cqrs,
}

impl ArchitecturePattern {
    pub const ALL: [ArchitecturePattern; 6] = [
        ArchitecturePattern::Monolith,
        ArchitecturePattern::ModularMonolith,
        ArchitecturePattern::Microservices,
        ArchitecturePattern::Serverless,
        ArchitecturePattern::EventDriven,
        ArchitecturePattern::Cqrs,
    ];

    /// Wire name, as used in structured responses.
    pub fn key(&self) -> &'static str {
        match self {
            ArchitecturePattern::Monolith => "monolith",
            ArchitecturePattern::ModularMonolith => "modular_monolith",
            ArchitecturePattern::Microservices => "microservices",
            ArchitecturePattern::Serverless => "serverless",
            ArchitecturePattern::EventDriven => "event_driven",
            ArchitecturePattern::Cqrs => "cqrs",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_lowercase().replace([' ', '-'], "_");
        Self::ALL.into_iter().find(|p| p.key() == key)
    }
}

impl fmt::Display for ArchitecturePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Low / medium / high rating used for cost and operational complexity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Low,
    Medium,
    High,
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Band::Low => "low",
            Band::Medium => "medium",
            Band::High => "high",
        })
    }
}

/// Contribution of one dimension to a candidate's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub dimension: PriorityDimension,
    pub weight: f64,
    /// Catalog rating, 1-10.
    pub rating: u8,
    /// `weight * rating * 10`.
    pub contribution: f64,
}

/// An option ranked by the deterministic scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionCandidate {
    pub pattern: ArchitecturePattern,
    /// 0-100 after penalties.
    pub score: f64,
    pub viable: bool,
    pub breakdown: Vec<ScoreComponent>,
    /// Human-readable notes for each applied constraint penalty.
    #[serde(default)]
    pub penalties: Vec<String>,
}

/// A recorded decision about one architecture option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitecturalDecision {
    pub pattern: ArchitecturePattern,
    pub justification: String,
    #[serde(default)]
    pub trade_offs: Vec<String>,
    #[serde(default)]
    pub alternatives_considered: Vec<ArchitecturePattern>,
    /// Deterministic score, 0-100.
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechLayer {
    Frontend,
    Backend,
    Database,
    Cache,
    Messaging,
    Auth,
    CiCd,
    Monitoring,
    Cloud,
}

impl TechLayer {
    pub fn label(&self) -> &'static str {
        match self {
            TechLayer::Frontend => "Frontend",
            TechLayer::Backend => "Backend",
            TechLayer::Database => "Database",
            TechLayer::Cache => "Cache",
            TechLayer::Messaging => "Messaging",
            TechLayer::Auth => "Auth",
            TechLayer::CiCd => "CI/CD",
            TechLayer::Monitoring => "Monitoring",
            TechLayer::Cloud => "Cloud",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechStackComponent {
    pub layer: TechLayer,
    pub technology: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

/// Cost, operations and team assessment of the selected option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityAssessment {
    pub cost_band: Band,
    pub ops_complexity: Band,
    #[serde(default)]
    pub cost_drivers: Vec<String>,
    #[serde(default)]
    pub cost_reducers: Vec<String>,
    pub team_fit: bool,
    pub time_estimate: String,
    #[serde(default)]
    pub risks: Vec<String>,
    /// Mismatches against the session's constraints.
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_keys_resolve_back() {
        for pattern in ArchitecturePattern::ALL {
            assert_eq!(ArchitecturePattern::from_key(pattern.key()), Some(pattern));
        }
        assert_eq!(
            ArchitecturePattern::from_key("Event-Driven"),
            Some(ArchitecturePattern::EventDriven)
        );
        assert_eq!(ArchitecturePattern::from_key("mainframe"), None);
    }

    #[test]
    fn bands_are_ordered() {
        assert!(Band::Low < Band::Medium);
        assert!(Band::Medium < Band::High);
    }

    #[test]
    fn tech_layer_uses_snake_case() {
        let layer: TechLayer = serde_json::from_str("\"ci_cd\"").unwrap();
        assert_eq!(layer, TechLayer::CiCd);
    }
}

//! Built-in catalog of architecture options.
//!
//! Ratings are 1-10 per priority dimension (higher is better for that
//! dimension, so a high `cost` rating means cheap to build and run).

use crate::domain::advisory::{ArchitecturePattern, Band, PriorityDimension, TechLayer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionRatings {
    pub time_to_market: u8,
    pub cost: u8,
    pub scale: u8,
    pub reliability: u8,
    pub security: u8,
}

impl DimensionRatings {
    pub fn get(&self, dimension: PriorityDimension) -> u8 {
        match dimension {
            PriorityDimension::TimeToMarket => self.time_to_market,
            PriorityDimension::Cost => self.cost,
            PriorityDimension::Scale => self.scale,
            PriorityDimension::Reliability => self.reliability,
            PriorityDimension::Security => self.security,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionProfile {
    pub pattern: ArchitecturePattern,
    pub name: &'static str,
    pub description: &'static str,
    pub ratings: DimensionRatings,
    pub cost_level: Band,
    pub complexity: Band,
    pub pros: &'static [&'static str],
    pub cons: &'static [&'static str],
    /// Default technology per layer when no recommendation is available.
    pub tech_defaults: &'static [(TechLayer, &'static str)],
    /// Typical delivery time for a first production release.
    pub typical_timeline: &'static str,
}

static MONOLITH: OptionProfile = OptionProfile {
    pattern: ArchitecturePattern::Monolith,
    name: "Monolith",
    description: "Single deployable application with one shared database",
    ratings: DimensionRatings {
        time_to_market: 9,
        cost: 9,
        scale: 4,
        reliability: 6,
        security: 7,
    },
    cost_level: Band::Low,
    complexity: Band::Low,
    pros: &[
        "Fastest path to a working product",
        "Simple deployment and debugging",
        "Lowest infrastructure cost",
    ],
    cons: &[
        "Scaling means scaling everything",
        "Codebase coupling grows with the team",
        "One failure can take down the whole system",
    ],
    tech_defaults: &[
        (TechLayer::Backend, "Django"),
        (TechLayer::Database, "PostgreSQL"),
        (TechLayer::Cloud, "Single VM or PaaS (Render, Heroku)"),
    ],
    typical_timeline: "1-2 months",
};

static MODULAR_MONOLITH: OptionProfile = OptionProfile {
    pattern: ArchitecturePattern::ModularMonolith,
    name: "Modular Monolith",
    description: "One deployable split into strictly bounded internal modules",
    ratings: DimensionRatings {
        time_to_market: 8,
        cost: 8,
        scale: 6,
        reliability: 7,
        security: 7,
    },
    cost_level: Band::Low,
    complexity: Band::Medium,
    pros: &[
        "Clear module boundaries without distributed-system overhead",
        "Modules can be extracted into services later",
        "Single deployment keeps operations simple",
    ],
    cons: &[
        "Boundaries need discipline to stay clean",
        "Still scales as one unit",
    ],
    tech_defaults: &[
        (TechLayer::Backend, "Spring Boot with modules"),
        (TechLayer::Database, "PostgreSQL with schema per module"),
        (TechLayer::Cloud, "Container platform (ECS, Cloud Run)"),
    ],
    typical_timeline: "2-3 months",
};

static MICROSERVICES: OptionProfile = OptionProfile {
    pattern: ArchitecturePattern::Microservices,
    name: "Microservices",
    description: "Independently deployable services, each owning its data",
    ratings: DimensionRatings {
        time_to_market: 4,
        cost: 4,
        scale: 9,
        reliability: 8,
        security: 7,
    },
    cost_level: Band::High,
    complexity: Band::High,
    pros: &[
        "Services scale independently",
        "Teams deploy independently",
        "Failures can be isolated per service",
    ],
    cons: &[
        "Significant operational overhead",
        "Distributed transactions and data consistency are hard",
        "Needs mature CI/CD and observability",
    ],
    tech_defaults: &[
        (TechLayer::Backend, "Go or Node.js services"),
        (TechLayer::Database, "PostgreSQL per service"),
        (TechLayer::Messaging, "Kafka"),
        (TechLayer::Cloud, "Kubernetes (EKS, GKE)"),
    ],
    typical_timeline: "4-6 months",
};

static SERVERLESS: OptionProfile = OptionProfile {
    pattern: ArchitecturePattern::Serverless,
    name: "Serverless",
    description: "Managed functions and services billed per use",
    ratings: DimensionRatings {
        time_to_market: 8,
        cost: 7,
        scale: 9,
        reliability: 6,
        security: 6,
    },
    cost_level: Band::Medium,
    complexity: Band::Medium,
    pros: &[
        "Automatic scaling with no servers to manage",
        "Pay only for actual usage",
        "Quick to ship small features",
    ],
    cons: &[
        "Cold starts and execution time limits",
        "Vendor lock-in",
        "Costs can spike under sustained heavy load",
    ],
    tech_defaults: &[
        (TechLayer::Backend, "AWS Lambda (TypeScript)"),
        (TechLayer::Database, "DynamoDB"),
        (TechLayer::Cloud, "AWS"),
    ],
    typical_timeline: "1-3 months",
};

static EVENT_DRIVEN: OptionProfile = OptionProfile {
    pattern: ArchitecturePattern::EventDriven,
    name: "Event-Driven",
    description: "Components communicate asynchronously through an event broker",
    ratings: DimensionRatings {
        time_to_market: 5,
        cost: 5,
        scale: 9,
        reliability: 8,
        security: 6,
    },
    cost_level: Band::Medium,
    complexity: Band::High,
    pros: &[
        "Loose coupling between producers and consumers",
        "Absorbs traffic spikes through buffering",
        "Natural fit for real-time workflows",
    ],
    cons: &[
        "Eventual consistency everywhere",
        "Harder to trace and debug flows",
        "Broker becomes critical infrastructure",
    ],
    tech_defaults: &[
        (TechLayer::Backend, "Node.js consumers"),
        (TechLayer::Database, "PostgreSQL"),
        (TechLayer::Messaging, "Kafka or RabbitMQ"),
        (TechLayer::Cloud, "Managed Kubernetes"),
    ],
    typical_timeline: "3-5 months",
};

static CQRS: OptionProfile = OptionProfile {
    pattern: ArchitecturePattern::Cqrs,
    name: "CQRS",
    description: "Separate write and read models, often with event sourcing",
    ratings: DimensionRatings {
        time_to_market: 4,
        cost: 5,
        scale: 8,
        reliability: 7,
        security: 7,
    },
    cost_level: Band::Medium,
    complexity: Band::High,
    pros: &[
        "Reads and writes scale and evolve separately",
        "Full audit trail with event sourcing",
    ],
    cons: &[
        "Two models to build and keep in sync",
        "Steep learning curve for the team",
    ],
    tech_defaults: &[
        (TechLayer::Backend, ".NET or Java"),
        (TechLayer::Database, "EventStoreDB plus PostgreSQL read models"),
        (TechLayer::Cache, "Redis"),
        (TechLayer::Cloud, "Container platform"),
    ],
    typical_timeline: "4-6 months",
};

/// Every option, in catalog order.
pub static CATALOG: [&OptionProfile; 6] = [
    &MONOLITH,
    &MODULAR_MONOLITH,
    &MICROSERVICES,
    &SERVERLESS,
    &EVENT_DRIVEN,
    &CQRS,
];

/// Looks up the catalog entry for an option.
pub fn option_profile(pattern: ArchitecturePattern) -> &'static OptionProfile {
    match pattern {
        ArchitecturePattern::Monolith => &MONOLITH,
        ArchitecturePattern::ModularMonolith => &MODULAR_MONOLITH,
        ArchitecturePattern::Microservices => &MICROSERVICES,
        ArchitecturePattern::Serverless => &SERVERLESS,
        ArchitecturePattern::EventDriven => &EVENT_DRIVEN,
        ArchitecturePattern::Cqrs => &CQRS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_every_pattern_in_order() {
        let patterns: Vec<_> = CATALOG.iter().map(|p| p.pattern).collect();
        assert_eq!(patterns, ArchitecturePattern::ALL.to_vec());
    }

    #[test]
    fn lookup_matches_pattern() {
        for pattern in ArchitecturePattern::ALL {
            assert_eq!(option_profile(pattern).pattern, pattern);
        }
    }

    #[test]
    fn ratings_are_within_scale() {
        for profile in CATALOG.iter() {
            for dimension in PriorityDimension::ALL {
                let rating = profile.ratings.get(dimension);
                assert!((1..=10).contains(&rating), "{} {:?}", profile.name, dimension);
            }
        }
    }

    #[test]
    fn every_option_has_backend_and_database_defaults() {
        for profile in CATALOG.iter() {
            let layers: Vec<_> = profile.tech_defaults.iter().map(|(l, _)| *l).collect();
            assert!(layers.contains(&TechLayer::Backend));
            assert!(layers.contains(&TechLayer::Database));
        }
    }
}

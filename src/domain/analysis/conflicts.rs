//! Rule-based detection of requirement/constraint conflicts.

use crate::domain::advisory::{
    Conflict, Constraint, ConstraintKind, Requirement, RequirementCategory,
};

const SCALE_KEYWORDS: [&str; 7] = [
    "scale",
    "scalab",
    "concurrent",
    "million",
    "users",
    "high traffic",
    "throughput",
];

const SECURITY_KEYWORDS: [&str; 7] = [
    "security", "secure", "compliance", "gdpr", "hipaa", "pci", "encrypt",
];

/// Functional requirement count above which a tight deadline is a conflict.
const SCOPE_LIMIT: usize = 5;

pub struct ConflictDetector;

impl ConflictDetector {
    /// Applies every rule and returns the conflicts found, in rule order.
    ///
    /// Rules:
    /// - scale vs cost: a scale-related requirement and a severe budget constraint
    /// - speed vs scope: a severe timeline constraint and more than five
    ///   functional requirements
    /// - security vs speed: a security requirement (or compliance constraint)
    ///   and a severe timeline constraint
    pub fn detect(requirements: &[Requirement], constraints: &[Constraint]) -> Vec<Conflict> {
        let mut conflicts = Vec::new();

        let severe = |kind: ConstraintKind| {
            constraints
                .iter()
                .find(|c| c.kind == kind && c.severity.is_severe())
        };
        let scale_requirement = requirements
            .iter()
            .find(|r| mentions_any(&r.description, &SCALE_KEYWORDS));
        let security_requirement = requirements
            .iter()
            .find(|r| mentions_any(&r.description, &SECURITY_KEYWORDS));

        if let (Some(requirement), Some(budget)) = (scale_requirement, severe(ConstraintKind::Budget)) {
            conflicts.push(
                Conflict::new(
                    "Scale vs Cost",
                    "The expected load calls for infrastructure the budget may not cover.",
                    vec![
                        "Start with a cost-efficient design and plan a scaling path".to_string(),
                        "Increase the infrastructure budget".to_string(),
                        "Lower the initial scale target".to_string(),
                    ],
                )
                .involving(vec![requirement.description.clone(), budget.description.clone()]),
            );
        }

        let functional = requirements
            .iter()
            .filter(|r| r.category == RequirementCategory::Functional)
            .count();
        if let Some(timeline) = severe(ConstraintKind::Timeline) {
            if functional > SCOPE_LIMIT {
                conflicts.push(
                    Conflict::new(
                        "Speed vs Scope",
                        format!(
                            "{functional} functional requirements are unlikely to fit the deadline."
                        ),
                        vec![
                            "Cut the first release to the core features".to_string(),
                            "Extend the timeline".to_string(),
                            "Add people to the team".to_string(),
                        ],
                    )
                    .involving(vec![timeline.description.clone()]),
                );
            }

            let compliance = constraints
                .iter()
                .find(|c| c.kind == ConstraintKind::Compliance);
            let security_source = security_requirement
                .map(|r| r.description.clone())
                .or_else(|| compliance.map(|c| c.description.clone()));
            if let Some(source) = security_source {
                conflicts.push(
                    Conflict::new(
                        "Security vs Speed",
                        "Security and compliance work competes with a tight deadline.",
                        vec![
                            "Use managed services with built-in compliance".to_string(),
                            "Phase the security hardening after launch".to_string(),
                            "Extend the timeline for compliance work".to_string(),
                        ],
                    )
                    .involving(vec![source, timeline.description.clone()]),
                );
            }
        }

        conflicts
    }
}

fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    let text = text.to_lowercase();
    keywords.iter().any(|k| text.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::advisory::Priority;

    #[test]
    fn detects_scale_vs_cost() {
        let requirements = vec![Requirement::non_functional(
            "Support for 1 million concurrent users with high scale",
            Priority::High,
        )];
        let constraints = vec![Constraint::new(
            ConstraintKind::Budget,
            "Limited budget",
            Priority::Critical,
        )];

        let conflicts = ConflictDetector::detect(&requirements, &constraints);

        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].name.to_lowercase().contains("scale"));
        assert!(!conflicts[0].resolved);
        assert_eq!(conflicts[0].compromises.len(), 3);
    }

    #[test]
    fn simple_project_has_no_conflicts() {
        let requirements = vec![Requirement::functional("A simple landing page", Priority::Medium)];
        assert!(ConflictDetector::detect(&requirements, &[]).is_empty());
    }

    #[test]
    fn mild_budget_does_not_conflict_with_scale() {
        let requirements = vec![Requirement::non_functional("10 million users", Priority::High)];
        let constraints = vec![Constraint::new(ConstraintKind::Budget, "Some budget", Priority::Medium)];
        assert!(ConflictDetector::detect(&requirements, &constraints).is_empty());
    }

    #[test]
    fn detects_speed_vs_scope_and_security() {
        let mut requirements: Vec<Requirement> = (0..6)
            .map(|i| Requirement::functional(format!("Feature {i}"), Priority::Medium))
            .collect();
        requirements.push(Requirement::non_functional("GDPR compliance", Priority::High));
        let constraints = vec![Constraint::new(
            ConstraintKind::Timeline,
            "Launch in 6 weeks",
            Priority::High,
        )];

        let names: Vec<String> = ConflictDetector::detect(&requirements, &constraints)
            .into_iter()
            .map(|c| c.name)
            .collect();

        assert_eq!(names, vec!["Speed vs Scope", "Security vs Speed"]);
    }
}

//! Option Scorer - deterministic ranking of catalog options.

use crate::domain::advisory::{
    ArchitecturePattern, Band, Constraint, ConstraintKind, OptionCandidate, PriorityDimension,
    PriorityWeights, ScoreComponent,
};

use super::catalog::{option_profile, OptionProfile, CATALOG};

/// Candidates scoring below this after penalties are not viable.
pub const VIABILITY_THRESHOLD: f64 = 40.0;

/// Number of candidates handed to the selection step.
pub const SHORTLIST_SIZE: usize = 3;

/// Stateless scorer over the built-in catalog.
pub struct OptionScorer;

impl OptionScorer {
    /// Scores a single option.
    ///
    /// # Algorithm
    /// score = Σ(weight[d] × rating[d]) × 10, minus constraint penalties,
    /// clamped to [0, 100] and rounded to one decimal.
    ///
    /// # Edge Cases
    /// - Weights need not sum to 1; an unnormalized vector just shifts scores
    /// - Constraints of low severity never penalize
    pub fn score_option(
        pattern: ArchitecturePattern,
        weights: &PriorityWeights,
        constraints: &[Constraint],
    ) -> OptionCandidate {
        let profile = option_profile(pattern);

        let breakdown: Vec<ScoreComponent> = PriorityDimension::ALL
            .iter()
            .map(|dimension| {
                let weight = weights.get(*dimension);
                let rating = profile.ratings.get(*dimension);
                ScoreComponent {
                    dimension: *dimension,
                    weight,
                    rating,
                    contribution: weight * rating as f64 * 10.0,
                }
            })
            .collect();
        let base: f64 = breakdown.iter().map(|c| c.contribution).sum();

        let mut penalties = Vec::new();
        let mut total_penalty = 0.0;
        for constraint in constraints {
            if let Some(penalty) = Self::constraint_penalty(profile, constraint) {
                total_penalty += penalty;
                penalties.push(format!(
                    "{} constraint ({}): -{:.1}",
                    constraint.kind.label(),
                    constraint.severity,
                    penalty
                ));
            }
        }

        let score = ((base - total_penalty).clamp(0.0, 100.0) * 10.0).round() / 10.0;
        OptionCandidate {
            pattern,
            score,
            viable: score >= VIABILITY_THRESHOLD,
            breakdown,
            penalties,
        }
    }

    /// Scores every catalog option, best first. Ties keep catalog order.
    pub fn score_all(weights: &PriorityWeights, constraints: &[Constraint]) -> Vec<OptionCandidate> {
        let mut scored: Vec<OptionCandidate> = CATALOG
            .iter()
            .map(|profile| Self::score_option(profile.pattern, weights, constraints))
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored
    }

    /// Top `size` viable candidates, or the top `size` overall when none is viable.
    pub fn shortlist(
        weights: &PriorityWeights,
        constraints: &[Constraint],
        size: usize,
    ) -> Vec<OptionCandidate> {
        let all = Self::score_all(weights, constraints);
        let viable: Vec<OptionCandidate> = all
            .iter()
            .filter(|c| c.viable)
            .take(size)
            .cloned()
            .collect();
        if viable.is_empty() {
            all.into_iter().take(size).collect()
        } else {
            viable
        }
    }

    fn constraint_penalty(profile: &OptionProfile, constraint: &Constraint) -> Option<f64> {
        let base = match constraint.kind {
            ConstraintKind::Budget => match profile.cost_level {
                Band::High => 15.0,
                Band::Medium => 5.0,
                Band::Low => 0.0,
            },
            ConstraintKind::Timeline => match profile.complexity {
                Band::High => 10.0,
                Band::Medium => 4.0,
                Band::Low => 0.0,
            },
            ConstraintKind::Team => match profile.complexity {
                Band::High => 10.0,
                _ => 0.0,
            },
            ConstraintKind::Compliance if profile.ratings.security < 7 => 5.0,
            ConstraintKind::Compliance | ConstraintKind::Technical => 0.0,
        };
        let penalty = base * constraint.severity.penalty_factor();
        (penalty > 0.0).then_some(penalty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::advisory::{DecisionProfile, Priority, PriorityRanking};

    fn sample_weights() -> PriorityWeights {
        PriorityRanking::new(5, 4, 3, 3, 2).unwrap().to_weights()
    }

    fn sample_constraints() -> Vec<Constraint> {
        vec![
            Constraint::new(ConstraintKind::Budget, "$2000 per month", Priority::High),
            Constraint::new(ConstraintKind::Timeline, "Live within 3 months", Priority::Medium),
        ]
    }

    #[test]
    fn score_has_full_breakdown_and_range() {
        let scored = OptionScorer::score_option(ArchitecturePattern::Monolith, &sample_weights(), &[]);
        assert_eq!(scored.pattern, ArchitecturePattern::Monolith);
        assert!((0.0..=100.0).contains(&scored.score));
        assert!(scored.viable);
        assert_eq!(scored.breakdown.len(), 5);
        assert!(scored.penalties.is_empty());
    }

    #[test]
    fn constraints_reduce_score_of_expensive_options() {
        let weights = sample_weights();
        let without = OptionScorer::score_option(ArchitecturePattern::Microservices, &weights, &[]);
        let with = OptionScorer::score_option(
            ArchitecturePattern::Microservices,
            &weights,
            &sample_constraints(),
        );
        assert!(with.score < without.score);
        assert_eq!(with.penalties.len(), 2);
    }

    #[test]
    fn low_severity_constraints_are_ignored() {
        let weights = sample_weights();
        let relaxed = vec![Constraint::new(ConstraintKind::Budget, "flexible", Priority::Low)];
        let without = OptionScorer::score_option(ArchitecturePattern::Microservices, &weights, &[]);
        let with = OptionScorer::score_option(ArchitecturePattern::Microservices, &weights, &relaxed);
        assert_eq!(with.score, without.score);
    }

    #[test]
    fn score_all_is_sorted_descending() {
        let all = OptionScorer::score_all(&sample_weights(), &[]);
        assert_eq!(all.len(), 6);
        let scores: Vec<f64> = all.iter().map(|c| c.score).collect();
        let mut sorted = scores.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(scores, sorted);
    }

    #[test]
    fn shortlist_returns_three_viable() {
        let top = OptionScorer::shortlist(&sample_weights(), &[], SHORTLIST_SIZE);
        assert_eq!(top.len(), 3);
        assert!(top.iter().all(|c| c.viable));
    }

    #[test]
    fn shortlist_falls_back_when_nothing_is_viable() {
        let zero = PriorityWeights::new(0.0, 0.0, 0.0, 0.0, 0.0);
        let top = OptionScorer::shortlist(&zero, &[], SHORTLIST_SIZE);
        assert_eq!(top.len(), 3);
        assert!(top.iter().all(|c| !c.viable));
    }

    #[test]
    fn mvp_profile_favors_monoliths() {
        let all = OptionScorer::score_all(&DecisionProfile::MvpFast.weights(), &[]);
        let top: Vec<_> = all.iter().take(2).map(|c| c.pattern).collect();
        assert!(
            top.contains(&ArchitecturePattern::Monolith)
                || top.contains(&ArchitecturePattern::ModularMonolith)
        );
    }

    #[test]
    fn scale_profile_favors_distributed_options() {
        let all = OptionScorer::score_all(&DecisionProfile::ScaleFirst.weights(), &[]);
        let top: Vec<_> = all.iter().take(2).map(|c| c.pattern).collect();
        let scalable = [
            ArchitecturePattern::Microservices,
            ArchitecturePattern::EventDriven,
            ArchitecturePattern::Serverless,
        ];
        assert!(top.iter().any(|p| scalable.contains(p)));
    }

    #[test]
    fn mvp_profile_ranks_monolith_first() {
        let all = OptionScorer::score_all(&DecisionProfile::MvpFast.weights(), &[]);
        assert_eq!(all[0].pattern, ArchitecturePattern::Monolith);
        assert_eq!(all[0].score, 77.5);
    }
}

//! Workflow tuning

use serde::Deserialize;

use super::error::ValidationError;

/// Limits and thresholds for the consultation workflow
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WorkflowConfig {
    /// Node executions allowed in one turn before the run is aborted
    #[serde(default = "default_max_steps")]
    pub max_steps_per_turn: u32,

    /// Confidence at or above which a complete document counts as done
    #[serde(default = "default_accept_threshold")]
    pub accept_threshold: f64,

    /// Critic passes after which the session ends regardless of verdict
    #[serde(default = "default_max_critic_iterations")]
    pub max_critic_iterations: u32,

    /// Conversation messages included in prompts
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default = "default_max_intake_questions")]
    pub max_intake_questions: usize,
}

impl WorkflowConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_steps_per_turn == 0 {
            return Err(ValidationError::MustBePositive("workflow.max_steps_per_turn"));
        }
        if self.max_critic_iterations == 0 {
            return Err(ValidationError::MustBePositive("workflow.max_critic_iterations"));
        }
        if !(0.0..=1.0).contains(&self.accept_threshold) {
            return Err(ValidationError::ThresholdOutOfRange {
                field: "workflow.accept_threshold",
                value: self.accept_threshold,
            });
        }
        Ok(())
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_steps_per_turn: default_max_steps(),
            accept_threshold: default_accept_threshold(),
            max_critic_iterations: default_max_critic_iterations(),
            history_limit: default_history_limit(),
            max_intake_questions: default_max_intake_questions(),
        }
    }
}

fn default_max_steps() -> u32 {
    50
}

fn default_accept_threshold() -> f64 {
    0.7
}

fn default_max_critic_iterations() -> u32 {
    5
}

fn default_history_limit() -> usize {
    10
}

fn default_max_intake_questions() -> usize {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = WorkflowConfig::default();
        assert_eq!(config.max_steps_per_turn, 50);
        assert_eq!(config.accept_threshold, 0.7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_threshold_above_one() {
        let config = WorkflowConfig {
            accept_threshold: 1.2,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::ThresholdOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_zero_step_ceiling() {
        let config = WorkflowConfig {
            max_steps_per_turn: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

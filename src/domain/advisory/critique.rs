//! Self-critique report produced after synthesis.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::architecture::ArchitecturePattern;
use super::facts::QuestionImpact;
use super::requirements::Priority;

/// Confidence assigned when the critique call fails.
pub const CONSERVATIVE_CONFIDENCE: f64 = 0.6;

/// Categorical outcome of a critique pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accept,
    AcceptWithNotes,
    AskUser,
    SwapOption,
}

impl Verdict {
    pub const ALL: [Verdict; 4] = [
        Verdict::Accept,
        Verdict::AcceptWithNotes,
        Verdict::AskUser,
        Verdict::SwapOption,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Accept => "accept",
            Verdict::AcceptWithNotes => "accept_with_notes",
            Verdict::AskUser => "ask_user",
            Verdict::SwapOption => "swap_option",
        }
    }

    /// True for verdicts that end the run without redirection.
    pub fn is_acceptance(&self) -> bool {
        matches!(self, Verdict::Accept | Verdict::AcceptWithNotes)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LowConfidenceReason {
    MissingInfo,
    ConflictingConstraints,
    WeakJustification,
    WrongChoice,
    OverEngineering,
    Other,
}

impl LowConfidenceReason {
    pub const ALL: [LowConfidenceReason; 6] = [
        LowConfidenceReason::MissingInfo,
        LowConfidenceReason::ConflictingConstraints,
        LowConfidenceReason::WeakJustification,
        LowConfidenceReason::WrongChoice,
        LowConfidenceReason::OverEngineering,
        LowConfidenceReason::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LowConfidenceReason::MissingInfo => "missing_info",
            LowConfidenceReason::ConflictingConstraints => "conflicting_constraints",
            LowConfidenceReason::WeakJustification => "weak_justification",
            LowConfidenceReason::WrongChoice => "wrong_choice",
            LowConfidenceReason::OverEngineering => "over_engineering",
            LowConfidenceReason::Other => "other",
        }
    }
}

/// A question the critic wants answered before it can be more confident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticQuestion {
    pub question: String,
    #[serde(default)]
    pub impact: QuestionImpact,
    #[serde(default)]
    pub why_it_matters: String,
}

/// Alternative option the critic wants selected instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapTarget {
    pub pattern: ArchitecturePattern,
    #[serde(default)]
    pub why: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureMode {
    pub failure: String,
    #[serde(default)]
    pub severity: Priority,
    #[serde(default)]
    pub mitigation: String,
}

/// Full critique of the synthesized document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Critique {
    pub confidence_score: f64,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub missing_info: Vec<String>,
    pub verdict: Verdict,
    #[serde(default)]
    pub low_confidence_reason: Option<LowConfidenceReason>,
    #[serde(default)]
    pub questions_to_ask: Vec<CriticQuestion>,
    #[serde(default)]
    pub swap_to: Option<SwapTarget>,
    #[serde(default)]
    pub top_failure_modes: Vec<FailureMode>,
    #[serde(default)]
    pub must_fix: Vec<String>,
}

impl Critique {
    /// Fixed critique used when the reasoning call fails.
    pub fn conservative() -> Self {
        Self {
            confidence_score: CONSERVATIVE_CONFIDENCE,
            strengths: Vec::new(),
            weaknesses: vec!["Automated review was unavailable for this pass".to_string()],
            missing_info: Vec::new(),
            verdict: Verdict::AcceptWithNotes,
            low_confidence_reason: Some(LowConfidenceReason::Other),
            questions_to_ask: Vec::new(),
            swap_to: None,
            top_failure_modes: Vec::new(),
            must_fix: Vec::new(),
        }
    }
}

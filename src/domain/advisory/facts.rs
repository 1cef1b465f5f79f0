//! Facts collected from the user and the questions asked to obtain them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::foundation::Timestamp;

/// Shared-token ratio above which two questions count as the same question.
pub const SIMILARITY_THRESHOLD: f64 = 0.7;

/// How a fact entered the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactSource {
    /// Answer to a pending clarification or deep-dive question.
    UserAnswer,
    /// Unsolicited follow-up message after a document was produced.
    FollowUp,
    /// Choice made while resolving a conflict.
    ConflictResolution,
}

/// Typed key/value extracted from a free-text answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub key: String,
    pub value: String,
    pub source: FactSource,
    /// Question this fact answers, if any.
    #[serde(default)]
    pub question_id: Option<String>,
    /// The answer text before normalization.
    #[serde(default)]
    pub raw_value: Option<String>,
    pub recorded_at: Timestamp,
}

impl Fact {
    pub fn new(key: impl Into<String>, value: impl Into<String>, source: FactSource) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            source,
            question_id: None,
            raw_value: None,
            recorded_at: Timestamp::now(),
        }
    }

    pub fn answering(mut self, question_id: impl Into<String>) -> Self {
        self.question_id = Some(question_id.into());
        self
    }

    pub fn with_raw_value(mut self, raw: impl Into<String>) -> Self {
        self.raw_value = Some(raw.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionImpact {
    High,
    #[default]
    Medium,
    Low,
}

/// A question put to the user. Kept forever once asked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskedQuestion {
    /// Stable id within the session, `q1` onwards.
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub impact: QuestionImpact,
    #[serde(default)]
    pub why_it_matters: String,
    pub asked_at: Timestamp,
}

/// Lowercases, trims and strips trailing question marks.
pub fn normalize_question(question: &str) -> String {
    question
        .trim()
        .to_lowercase()
        .trim_end_matches(|c: char| c == '?' || c.is_whitespace())
        .to_string()
}

/// Two questions are similar when one normalized form contains the other, or
/// when the shared-token ratio (intersection over the larger token set)
/// exceeds [`SIMILARITY_THRESHOLD`].
pub fn questions_similar(a: &str, b: &str) -> bool {
    let a = normalize_question(a);
    let b = normalize_question(b);
    if a.is_empty() || b.is_empty() {
        return a == b;
    }
    if a.contains(&b) || b.contains(&a) {
        return true;
    }

    let tokens_a: HashSet<&str> = a.split_whitespace().collect();
    let tokens_b: HashSet<&str> = b.split_whitespace().collect();
    let larger = tokens_a.len().max(tokens_b.len());
    if larger == 0 {
        return false;
    }
    let shared = tokens_a.intersection(&tokens_b).count();
    shared as f64 / larger as f64 > SIMILARITY_THRESHOLD
}

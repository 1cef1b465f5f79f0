//! Session context: the canonical mutable record of one consultation.
//!
//! Every workflow node receives the context by value and hands back a mutated
//! copy. Counters that carry invariants (info version, critic iterations,
//! revisions, confidence) are private and only change through the methods
//! below.

use serde::{Deserialize, Serialize};

use super::architecture::{
    ArchitecturalDecision, ArchitecturePattern, FeasibilityAssessment, TechStackComponent,
};
use super::critique::{Critique, LowConfidenceReason, Verdict};
use super::document::SynthesizedDocument;
use super::facts::{questions_similar, AskedQuestion, Fact, QuestionImpact};
use super::priorities::{DecisionProfile, PriorityRanking, PriorityWeights};
use super::requirements::{Conflict, Constraint, Requirement};
use crate::domain::foundation::{SessionId, Timestamp};
use crate::domain::workflow::NodeId;

/// Maximum number of critic-driven backward transitions per session.
pub const MAX_REVISIONS: u32 = 2;

/// Decision records a document needs before the session can finish.
pub const MIN_DECISION_RECORDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectContext {
    pub session_id: SessionId,
    #[serde(default)]
    pub project_name: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub initial_summary: String,

    #[serde(default)]
    requirements: Vec<Requirement>,
    #[serde(default)]
    constraints: Vec<Constraint>,

    #[serde(default)]
    pub decision_profile: Option<DecisionProfile>,
    #[serde(default)]
    pub priority_ranking: Option<PriorityRanking>,
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
    #[serde(default)]
    pub conflict_analysis_done: bool,

    /// Decision records for every shortlisted candidate.
    #[serde(default)]
    pub shortlist: Vec<ArchitecturalDecision>,
    /// The selected option.
    #[serde(default)]
    pub proposed_architecture: Option<ArchitecturalDecision>,
    #[serde(default)]
    pub tech_stack: Vec<TechStackComponent>,
    #[serde(default)]
    pub feasibility: Option<FeasibilityAssessment>,
    #[serde(default)]
    pub document: Option<SynthesizedDocument>,

    #[serde(default)]
    pub conversation_history: Vec<ConversationMessage>,
    #[serde(default)]
    pub current_node: Option<NodeId>,
    #[serde(default)]
    pub open_questions: Vec<String>,

    #[serde(default)]
    confidence_score: f64,
    #[serde(default)]
    iteration_count: u32,
    #[serde(default)]
    revision_count: u32,
    /// Option that was selected before the latest forced revision.
    #[serde(default)]
    pub last_option: Option<ArchitecturePattern>,
    /// Option the next scoring pass must select. Consumed by that pass.
    #[serde(default)]
    pub forced_option: Option<ArchitecturePattern>,
    #[serde(default)]
    pub last_confidence_reason: Option<LowConfidenceReason>,
    #[serde(default)]
    pub last_critique: Option<Critique>,
    /// Verdict actually acted on in the latest critic pass.
    #[serde(default)]
    pub last_verdict: Option<Verdict>,

    #[serde(default)]
    pub waiting_for_user: bool,
    #[serde(default)]
    pub deep_dive_completed: bool,
    /// Follow-up message not yet consumed by any node.
    #[serde(default)]
    pub unprocessed_input: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,

    #[serde(default)]
    facts: Vec<Fact>,
    #[serde(default)]
    asked_questions: Vec<AskedQuestion>,
    /// Questions awaiting an answer in the next user message.
    #[serde(default)]
    pub pending_questions: Vec<AskedQuestion>,
    #[serde(default)]
    info_version: u64,
    #[serde(default)]
    last_info_version_used: u64,
}

impl ProjectContext {
    /// Creates the context for a new session.
    pub fn new(session_id: SessionId, initial_summary: impl Into<String>) -> Self {
        let now = Timestamp::now();
        Self {
            session_id,
            project_name: None,
            created_at: now,
            updated_at: now,
            initial_summary: initial_summary.into(),
            requirements: Vec::new(),
            constraints: Vec::new(),
            decision_profile: None,
            priority_ranking: None,
            conflicts: Vec::new(),
            conflict_analysis_done: false,
            shortlist: Vec::new(),
            proposed_architecture: None,
            tech_stack: Vec::new(),
            feasibility: None,
            document: None,
            conversation_history: Vec::new(),
            current_node: None,
            open_questions: Vec::new(),
            confidence_score: 0.0,
            iteration_count: 0,
            revision_count: 0,
            last_option: None,
            forced_option: None,
            last_confidence_reason: None,
            last_critique: None,
            last_verdict: None,
            waiting_for_user: false,
            deep_dive_completed: false,
            unprocessed_input: None,
            error_message: None,
            facts: Vec::new(),
            asked_questions: Vec::new(),
            pending_questions: Vec::new(),
            info_version: 0,
            last_info_version_used: 0,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }

    // === Conversation ===

    pub fn add_message(&mut self, role: MessageRole, content: impl Into<String>) {
        self.conversation_history.push(ConversationMessage {
            role,
            content: content.into(),
            timestamp: Timestamp::now(),
        });
        self.touch();
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.add_message(MessageRole::User, content);
    }

    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.add_message(MessageRole::Assistant, content);
    }

    /// The last `limit` messages, oldest first.
    pub fn recent_history(&self, limit: usize) -> &[ConversationMessage] {
        let start = self.conversation_history.len().saturating_sub(limit);
        &self.conversation_history[start..]
    }

    pub fn last_user_message(&self) -> Option<&str> {
        self.conversation_history
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }

    // === Information ===

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    pub fn add_requirement(&mut self, requirement: Requirement) {
        self.requirements.push(requirement);
        self.bump_info_version();
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
        self.bump_info_version();
    }

    /// Records a fact, replacing any earlier value stored under the same key.
    /// Re-stating an unchanged value is not new information.
    pub fn add_fact(&mut self, fact: Fact) {
        match self.facts.iter_mut().find(|f| f.key == fact.key) {
            Some(existing) if existing.value == fact.value => return,
            Some(existing) => *existing = fact,
            None => self.facts.push(fact),
        }
        self.bump_info_version();
    }

    fn bump_info_version(&mut self) {
        self.info_version += 1;
        self.touch();
    }

    pub fn info_version(&self) -> u64 {
        self.info_version
    }

    pub fn last_info_version_used(&self) -> u64 {
        self.last_info_version_used
    }

    /// True when information arrived since the last critic pass.
    pub fn has_new_info(&self) -> bool {
        self.info_version > self.last_info_version_used
    }

    // === Critic bookkeeping ===

    /// Starts a critic pass: counts the iteration and marks the current
    /// information as used. Returns whether new information had arrived
    /// since the previous pass.
    pub fn begin_critic_pass(&mut self) -> bool {
        let had_new_info = self.has_new_info();
        self.iteration_count += 1;
        self.last_info_version_used = self.info_version;
        self.touch();
        had_new_info
    }

    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    pub fn revision_count(&self) -> u32 {
        self.revision_count
    }

    pub fn can_revise(&self) -> bool {
        self.revision_count < MAX_REVISIONS
    }

    /// Records a critic-driven swap to `target`. Returns false, changing
    /// nothing, once the revision cap is reached.
    pub fn record_revision(&mut self, target: ArchitecturePattern) -> bool {
        if !self.can_revise() {
            return false;
        }
        self.revision_count += 1;
        self.last_option = self.proposed_architecture.as_ref().map(|d| d.pattern);
        self.forced_option = Some(target);
        self.touch();
        true
    }

    pub fn confidence_score(&self) -> f64 {
        self.confidence_score
    }

    /// Sets confidence, clamped to [0, 1].
    pub fn set_confidence(&mut self, value: f64) {
        self.confidence_score = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    }

    /// Raises confidence to at least `floor`.
    pub fn raise_confidence_to(&mut self, floor: f64) {
        let value = self.confidence_score.max(floor);
        self.set_confidence(value);
    }

    // === Questions ===

    pub fn asked_questions(&self) -> &[AskedQuestion] {
        &self.asked_questions
    }

    pub fn was_asked(&self, question: &str) -> bool {
        self.asked_questions
            .iter()
            .any(|asked| questions_similar(&asked.question, question))
    }

    /// Appends a question to the permanent asked list. Returns `None` when a
    /// similar question was already asked.
    pub fn record_asked_question(
        &mut self,
        question: impl Into<String>,
        impact: QuestionImpact,
        why_it_matters: impl Into<String>,
    ) -> Option<AskedQuestion> {
        let question = question.into();
        if question.trim().is_empty() || self.was_asked(&question) {
            return None;
        }
        let asked = AskedQuestion {
            id: format!("q{}", self.asked_questions.len() + 1),
            question,
            impact,
            why_it_matters: why_it_matters.into(),
            asked_at: Timestamp::now(),
        };
        self.asked_questions.push(asked.clone());
        self.touch();
        Some(asked)
    }

    // === Derived views ===

    /// Weights from the explicit ranking, else the profile, else equal.
    pub fn priority_weights(&self) -> PriorityWeights {
        if let Some(ranking) = &self.priority_ranking {
            ranking.to_weights()
        } else if let Some(profile) = &self.decision_profile {
            profile.weights()
        } else {
            PriorityWeights::equal()
        }
    }

    pub fn has_priorities(&self) -> bool {
        self.decision_profile.is_some() || self.priority_ranking.is_some()
    }

    pub fn has_unresolved_conflicts(&self) -> bool {
        self.conflicts.iter().any(|c| !c.resolved)
    }

    /// True once the document is complete and confidence clears `threshold`.
    pub fn is_done(&self, threshold: f64) -> bool {
        self.document
            .as_ref()
            .is_some_and(|doc| doc.decision_records.len() >= MIN_DECISION_RECORDS)
            && self.confidence_score >= threshold
    }
}

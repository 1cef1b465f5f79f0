//! Priority dimensions, decision profiles and explicit rankings.
//!
//! Option scoring needs a weight per dimension. Weights come from, in order of
//! precedence, an explicit 1-5 ranking, a named decision profile, or an equal
//! split.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// The five quality dimensions every option is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityDimension {
    TimeToMarket,
    Cost,
    Scale,
    Reliability,
    Security,
}

impl PriorityDimension {
    pub const ALL: [PriorityDimension; 5] = [
        PriorityDimension::TimeToMarket,
        PriorityDimension::Cost,
        PriorityDimension::Scale,
        PriorityDimension::Reliability,
        PriorityDimension::Security,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            PriorityDimension::TimeToMarket => "time_to_market",
            PriorityDimension::Cost => "cost",
            PriorityDimension::Scale => "scale",
            PriorityDimension::Reliability => "reliability",
            PriorityDimension::Security => "security",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriorityDimension::TimeToMarket => "Time to market",
            PriorityDimension::Cost => "Cost",
            PriorityDimension::Scale => "Scale",
            PriorityDimension::Reliability => "Reliability",
            PriorityDimension::Security => "Security",
        }
    }

    /// Matches the words a user might type for this dimension.
    pub fn from_word(word: &str) -> Option<Self> {
        let word = word.trim().to_lowercase().replace(['_', '-'], " ");
        match word.as_str() {
            "time" | "time to market" | "ttm" | "speed" => Some(PriorityDimension::TimeToMarket),
            "cost" | "budget" | "price" => Some(PriorityDimension::Cost),
            "scale" | "scalability" | "scaling" => Some(PriorityDimension::Scale),
            "reliability" | "availability" | "uptime" => Some(PriorityDimension::Reliability),
            "security" | "compliance" => Some(PriorityDimension::Security),
            _ => None,
        }
    }
}

/// Named, fixed weighting of the priority dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionProfile {
    MvpFast,
    CostFirst,
    ScaleFirst,
    SecurityFirst,
}

impl DecisionProfile {
    /// Menu order, 1-based in user-facing text.
    pub const ALL: [DecisionProfile; 4] = [
        DecisionProfile::MvpFast,
        DecisionProfile::CostFirst,
        DecisionProfile::ScaleFirst,
        DecisionProfile::SecurityFirst,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            DecisionProfile::MvpFast => "Fastest to market (MVP)",
            DecisionProfile::CostFirst => "Cost first",
            DecisionProfile::ScaleFirst => "Scale first",
            DecisionProfile::SecurityFirst => "Security first",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            DecisionProfile::MvpFast => "ship a working product quickly and iterate",
            DecisionProfile::CostFirst => "keep infrastructure and operations spend minimal",
            DecisionProfile::ScaleFirst => "handle large and growing load from day one",
            DecisionProfile::SecurityFirst => "protect data and meet compliance obligations",
        }
    }

    /// Fixed weight vector for this profile.
    pub fn weights(&self) -> PriorityWeights {
        match self {
            DecisionProfile::MvpFast => PriorityWeights::new(0.40, 0.20, 0.10, 0.15, 0.15),
            DecisionProfile::CostFirst => PriorityWeights::new(0.15, 0.40, 0.15, 0.15, 0.15),
            DecisionProfile::ScaleFirst => PriorityWeights::new(0.10, 0.15, 0.40, 0.20, 0.15),
            DecisionProfile::SecurityFirst => PriorityWeights::new(0.10, 0.15, 0.15, 0.20, 0.40),
        }
    }

    /// Resolves a 1-based menu choice.
    pub fn from_menu_choice(choice: usize) -> Option<Self> {
        choice
            .checked_sub(1)
            .and_then(|idx| Self::ALL.get(idx))
            .copied()
    }

    /// Resolves a free-text keyword such as "mvp" or "security".
    pub fn from_keyword(text: &str) -> Option<Self> {
        let text = text.to_lowercase();
        if text.contains("mvp") || text.contains("fast") || text.contains("quick") {
            Some(DecisionProfile::MvpFast)
        } else if text.contains("cost") || text.contains("cheap") || text.contains("budget") {
            Some(DecisionProfile::CostFirst)
        } else if text.contains("scale") || text.contains("scalab") {
            Some(DecisionProfile::ScaleFirst)
        } else if text.contains("secur") || text.contains("complian") {
            Some(DecisionProfile::SecurityFirst)
        } else {
            None
        }
    }
}

impl fmt::Display for DecisionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Explicit importance of each dimension, 1 (low) to 5 (high).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityRanking {
    pub time_to_market: u8,
    pub cost: u8,
    pub scale: u8,
    pub reliability: u8,
    pub security: u8,
}

impl PriorityRanking {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;
    pub const NEUTRAL: u8 = 3;

    /// Creates a ranking, rejecting values outside 1-5.
    pub fn new(
        time_to_market: u8,
        cost: u8,
        scale: u8,
        reliability: u8,
        security: u8,
    ) -> Result<Self, ValidationError> {
        let ranking = Self {
            time_to_market,
            cost,
            scale,
            reliability,
            security,
        };
        for dimension in PriorityDimension::ALL {
            let value = ranking.get(dimension);
            if !(Self::MIN..=Self::MAX).contains(&value) {
                return Err(ValidationError::out_of_range(
                    dimension.key(),
                    Self::MIN,
                    Self::MAX,
                    value,
                ));
            }
        }
        Ok(ranking)
    }

    pub fn get(&self, dimension: PriorityDimension) -> u8 {
        match dimension {
            PriorityDimension::TimeToMarket => self.time_to_market,
            PriorityDimension::Cost => self.cost,
            PriorityDimension::Scale => self.scale,
            PriorityDimension::Reliability => self.reliability,
            PriorityDimension::Security => self.security,
        }
    }

    pub fn set(&mut self, dimension: PriorityDimension, value: u8) {
        match dimension {
            PriorityDimension::TimeToMarket => self.time_to_market = value,
            PriorityDimension::Cost => self.cost = value,
            PriorityDimension::Scale => self.scale = value,
            PriorityDimension::Reliability => self.reliability = value,
            PriorityDimension::Security => self.security = value,
        }
    }

    /// Normalizes the ranking into weights that sum to 1.
    pub fn to_weights(&self) -> PriorityWeights {
        let total: f64 = PriorityDimension::ALL
            .iter()
            .map(|d| self.get(*d) as f64)
            .sum();
        if total <= 0.0 {
            return PriorityWeights::equal();
        }
        PriorityWeights::new(
            self.time_to_market as f64 / total,
            self.cost as f64 / total,
            self.scale as f64 / total,
            self.reliability as f64 / total,
            self.security as f64 / total,
        )
    }
}

impl Default for PriorityRanking {
    fn default() -> Self {
        Self {
            time_to_market: Self::NEUTRAL,
            cost: Self::NEUTRAL,
            scale: Self::NEUTRAL,
            reliability: Self::NEUTRAL,
            security: Self::NEUTRAL,
        }
    }
}

/// Relative weight of each dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityWeights {
    pub time_to_market: f64,
    pub cost: f64,
    pub scale: f64,
    pub reliability: f64,
    pub security: f64,
}

impl PriorityWeights {
    pub fn new(time_to_market: f64, cost: f64, scale: f64, reliability: f64, security: f64) -> Self {
        Self {
            time_to_market,
            cost,
            scale,
            reliability,
            security,
        }
    }

    /// Every dimension weighted 0.2.
    pub fn equal() -> Self {
        Self::new(0.2, 0.2, 0.2, 0.2, 0.2)
    }

    pub fn get(&self, dimension: PriorityDimension) -> f64 {
        match dimension {
            PriorityDimension::TimeToMarket => self.time_to_market,
            PriorityDimension::Cost => self.cost,
            PriorityDimension::Scale => self.scale,
            PriorityDimension::Reliability => self.reliability,
            PriorityDimension::Security => self.security,
        }
    }

    pub fn sum(&self) -> f64 {
        PriorityDimension::ALL.iter().map(|d| self.get(*d)).sum()
    }
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self::equal()
    }
}

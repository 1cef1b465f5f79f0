//! Analysis Module - Pure, deterministic services over the advisory domain.
//!
//! # Components
//!
//! - `catalog` - Built-in architecture options with per-dimension ratings
//! - `OptionScorer` - Weighted scoring, constraint penalties, shortlisting
//! - `ConflictDetector` - Keyword rules for requirement/constraint tension
//!
//! Nothing here performs I/O or calls the reasoning service.

mod catalog;
mod conflicts;
mod scorer;

pub use catalog::{option_profile, DimensionRatings, OptionProfile, CATALOG};
pub use conflicts::ConflictDetector;
pub use scorer::{OptionScorer, SHORTLIST_SIZE, VIABILITY_THRESHOLD};

//! Domain layer - pure types and deterministic rules.
//!
//! - `foundation` - identifiers, timestamps, validation errors
//! - `advisory` - the session context and everything it records
//! - `analysis` - option catalog, scorer and conflict rules
//! - `structured` - JSON extraction and schema checks for reasoning output
//! - `workflow` - node ids, signals and the router

pub mod advisory;
pub mod analysis;
pub mod foundation;
pub mod structured;
pub mod workflow;

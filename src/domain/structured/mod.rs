//! Structured output handling: JSON extraction and schema validation.

mod extractor;
mod schema;

pub use extractor::{extract_json, ExtractionError};
pub use schema::{validate_against_schema, SchemaValidationError};

//! Excellon drill file adapter.

pub mod parser;
pub mod types;

pub use parser::parse;
pub use types::{DrillFile, DrillHit, ExcellonUnits, ToolDefinition};

//! Format-agnostic geometry model: pads, holes, wires, text and bounds.

pub mod placement;
pub mod types;

pub use placement::*;
pub use types::*;

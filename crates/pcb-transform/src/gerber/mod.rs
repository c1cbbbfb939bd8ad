//! Gerber RS-274X adapter.
//!
//! Each layer file is interpreted on its own; [`GerberModel`] combines the
//! loaded layers into board pads, wires, holes and bounds.

pub mod aperture;
pub mod model;
pub mod parser;
pub mod types;

pub use model::GerberModel;
pub use types::{GerberLayer, Graphic, LayerContent, LayerRole, LoadedLayer};

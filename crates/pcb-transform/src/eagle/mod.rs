//! Eagle BRD adapter.

pub mod board;
pub mod layers;
pub mod parser;

pub use board::{EagleBoard, PadLayers, PlacedPad};
pub use layers::{side_layers, LayerTable, SideLayers};

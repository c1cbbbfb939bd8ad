//! Parsed Eagle board and its layer-filtered queries.

use crate::geometry::{Bounds, Hole, Pad, Side, Text, Wire};

use super::layers::LayerTable;

/// Highest copper layer number.
const LAST_COPPER_LAYER: u32 = 16;

/// Copper layers a pad occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadLayers {
    /// Surface-mount pad on one copper layer.
    Single(u32),
    /// Through-hole pad on every copper layer.
    AllCopper,
}

impl PadLayers {
    fn contains(self, layer: u32) -> bool {
        match self {
            Self::Single(number) => number == layer,
            Self::AllCopper => (1..=LAST_COPPER_LAYER).contains(&layer),
        }
    }
}

/// Pad together with the layers it was placed on.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedPad {
    /// Copper membership.
    pub layers: PadLayers,
    /// Board geometry.
    pub pad: Pad,
}

/// Geometry extracted from one Eagle `.brd` file, already placed in board
/// coordinates.
#[derive(Debug, Clone, Default)]
pub struct EagleBoard {
    pub(crate) layers: LayerTable,
    pub(crate) bounds: Bounds,
    pub(crate) pads: Vec<PlacedPad>,
    pub(crate) wires: Vec<(u32, Wire)>,
    pub(crate) holes: Vec<Hole>,
    pub(crate) texts: Vec<(u32, Text)>,
}

impl EagleBoard {
    /// Parses raw `.brd` bytes.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::ParseError`] when the XML is malformed or
    /// lacks the `drawing`/`board` sections.
    pub fn load(data: &[u8]) -> Result<Self, crate::error::ParseError> {
        super::parser::parse(data)
    }

    /// Board outline rectangle.
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Side a layer spec belongs to.
    pub fn side_of(&self, spec: &str) -> Side {
        self.layers.side_of(spec)
    }

    /// Pads on the given copper layer, or every pad when `layer` is `None`.
    pub fn pads(&self, layer: Option<&str>) -> Vec<Pad> {
        let Some(spec) = layer else {
            return self.pads.iter().map(|placed| placed.pad.clone()).collect();
        };
        let Some(number) = self.layers.resolve(spec) else {
            return Vec::new();
        };
        self.pads
            .iter()
            .filter(|placed| placed.layers.contains(number))
            .map(|placed| placed.pad.clone())
            .collect()
    }

    /// Wires on the given layer, or every wire when `layer` is `None`.
    pub fn wires(&self, layer: Option<&str>) -> Vec<Wire> {
        filter_layer(&self.layers, &self.wires, layer)
            .copied()
            .collect()
    }

    /// Every drilled feature.
    pub fn holes(&self) -> Vec<Hole> {
        self.holes.clone()
    }

    /// Text on the given layer, or all text when `layer` is `None`.
    pub fn texts(&self, layer: Option<&str>) -> Vec<Text> {
        filter_layer(&self.layers, &self.texts, layer)
            .cloned()
            .collect()
    }
}

fn filter_layer<'a, T>(
    table: &LayerTable,
    items: &'a [(u32, T)],
    layer: Option<&str>,
) -> impl Iterator<Item = &'a T> {
    let wanted = layer.map(|spec| table.resolve(spec));
    items.iter().filter_map(move |(number, item)| match wanted {
        None => Some(item),
        Some(Some(layer)) if layer == *number => Some(item),
        Some(_) => None,
    })
}

//! Gerber layer types.

use std::collections::HashMap;

use gerber_types::Aperture;

use crate::excellon::DrillFile;
use crate::geometry::Point;

/// What a layer file contributes, derived from its id (file extension).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerRole {
    /// Board outline / keep-out (`GKO`, `GML`, `GM1`).
    Outline,
    /// Solder paste stencil (`GTP`, `GBP`); the source of SMD pads.
    Paste,
    /// Solder mask openings (`GTS`, `GBS`).
    SolderMask,
    /// Copper (`GTL`, `GBL`).
    Copper,
    /// Silkscreen (`GTO`, `GBO`).
    Silk,
    /// Excellon drill file (`DRL`, `TXT`, `XLN`).
    Drill,
    /// Anything else; loaded but only queried by explicit id.
    Other,
}

impl LayerRole {
    /// Classifies an upper-cased layer id.
    pub fn of(id: &str) -> Self {
        match id {
            "GKO" | "GML" | "GM1" => Self::Outline,
            "GTP" | "GBP" => Self::Paste,
            "GTS" | "GBS" => Self::SolderMask,
            "GTL" | "GBL" => Self::Copper,
            "GTO" | "GBO" => Self::Silk,
            "DRL" | "TXT" | "XLN" => Self::Drill,
            _ => Self::Other,
        }
    }
}

/// One interpreted drawing operation, in millimeters.
#[derive(Debug, Clone, PartialEq)]
pub enum Graphic {
    /// D03 aperture flash.
    Flash {
        /// D-code of the flashed aperture.
        aperture: i32,
        /// Flash position.
        at: Point,
    },
    /// D01 draw outside a region; arcs keep only their endpoints.
    Stroke {
        /// D-code of the drawing aperture.
        aperture: i32,
        /// Start point.
        from: Point,
        /// End point.
        to: Point,
    },
    /// G36/G37 filled contour.
    Region {
        /// Contour vertices.
        points: Vec<Point>,
    },
}

/// Interpreted graphics of one Gerber file.
#[derive(Debug, Clone, Default)]
pub struct GerberLayer {
    /// Drawing operations in file order.
    pub graphics: Vec<Graphic>,
    /// Aperture dictionary keyed by D-code, dimensions in millimeters.
    pub apertures: HashMap<i32, Aperture>,
    /// Non-fatal problems found while interpreting the file.
    pub warnings: Vec<String>,
}

/// Parsed content of one loaded layer file.
#[derive(Debug, Clone)]
pub enum LayerContent {
    /// RS-274X artwork.
    Artwork(GerberLayer),
    /// Excellon drill hits.
    Drill(DrillFile),
}

/// A layer file loaded into a [`super::GerberModel`].
#[derive(Debug, Clone)]
pub struct LoadedLayer {
    /// Role derived from the layer id.
    pub role: LayerRole,
    /// Parsed content.
    pub content: LayerContent,
}

impl LoadedLayer {
    /// Number of graphics (or drill hits) the layer holds.
    pub fn graphics_count(&self) -> usize {
        match &self.content {
            LayerContent::Artwork(layer) => layer.graphics.len(),
            LayerContent::Drill(drill) => drill.hits.len(),
        }
    }

    /// Warnings produced while parsing the layer.
    pub fn warnings(&self) -> &[String] {
        match &self.content {
            LayerContent::Artwork(layer) => &layer.warnings,
            LayerContent::Drill(drill) => &drill.warnings,
        }
    }

    pub(crate) const fn artwork(&self) -> Option<&GerberLayer> {
        match &self.content {
            LayerContent::Artwork(layer) => Some(layer),
            LayerContent::Drill(_) => None,
        }
    }
}

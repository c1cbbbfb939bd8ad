//! Drill layer data: tools, hits, and their conversion to board holes.

use crate::geometry::Hole;

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// One drilled position, in file units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DrillHit {
    /// Tool number active when the hit was placed.
    pub tool: u32,
    /// Center X.
    pub x: f64,
    /// Center Y.
    pub y: f64,
    /// Tool diameter at the time of the hit.
    pub diameter: f64,
}

/// `T<n>C<diameter>` entry.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ToolDefinition {
    /// `n` in `T<n>`.
    pub number: u32,
    /// Bit diameter in file units.
    pub diameter: f64,
}

/// Units declared by `INCH` or `METRIC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcellonUnits {
    /// Millimeters.
    Metric,
    /// Inches; the default when a file declares nothing.
    Imperial,
}

impl ExcellonUnits {
    /// Factor converting file units to millimeters.
    pub const fn to_mm(self) -> f64 {
        match self {
            Self::Metric => 1.0,
            Self::Imperial => MM_PER_INCH,
        }
    }
}

/// A parsed drill layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DrillFile {
    /// Drill hits in file order.
    pub hits: Vec<DrillHit>,
    /// Defined tools in ascending number order.
    pub tools: Vec<ToolDefinition>,
    /// Units the coordinates and diameters are in.
    pub units: ExcellonUnits,
    /// Recoverable problems, such as hits placed without a tool.
    pub warnings: Vec<String>,
}

impl DrillFile {
    /// Converts every hit to a board hole in millimeters, named after its tool.
    pub fn holes(&self) -> Vec<Hole> {
        let scale = self.units.to_mm();
        self.hits
            .iter()
            .map(|hit| Hole {
                name: format!("T{}", hit.tool),
                x: hit.x * scale,
                y: hit.y * scale,
                r: hit.diameter * scale / 2.0,
                ..Hole::default()
            })
            .collect()
    }
}

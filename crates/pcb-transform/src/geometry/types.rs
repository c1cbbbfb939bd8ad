//! Canonical board geometry shared by every source format.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// 2D point in board coordinate space (millimeters).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Board rectangle in source coordinates.
///
/// `right >= left` and `bottom >= top` always hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bounds {
    /// Minimum X.
    pub left: f64,
    /// Maximum X.
    pub right: f64,
    /// Minimum Y.
    pub top: f64,
    /// Maximum Y.
    pub bottom: f64,
}

impl Bounds {
    /// Horizontal extent.
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Vertical extent.
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Smallest rectangle containing every wire endpoint, if there are any.
    pub fn of_wires<'a>(wires: impl IntoIterator<Item = &'a Wire>) -> Option<Self> {
        let mut extent = Extent::new();
        for wire in wires {
            extent.update(wire.x1, wire.y1);
            extent.update(wire.x2, wire.y2);
        }
        extent.finish()
    }
}

/// Accumulator that grows to contain every point passed to [`Extent::update`].
#[derive(Debug, Clone, Copy)]
pub struct Extent {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Extent {
    /// Creates an empty extent that will expand with the first `update` call.
    pub const fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Expands the extent to include the given point.
    pub fn update(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Returns the accumulated rectangle, or `None` if nothing was added.
    pub fn finish(self) -> Option<Bounds> {
        if self.min_x > self.max_x || self.min_y > self.max_y {
            return None;
        }
        Some(Bounds {
            left: self.min_x,
            right: self.max_x,
            top: self.min_y,
            bottom: self.max_y,
        })
    }
}

impl Default for Extent {
    fn default() -> Self {
        Self::new()
    }
}

/// Component footprint pad, surface-mount or through-hole.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Pad {
    /// Component reference, empty when unknown.
    pub element: String,
    /// Footprint name, empty when unknown.
    pub package: String,
    /// Pad designator, empty when unknown.
    pub name: String,
    /// Center X.
    pub x: f64,
    /// Center Y.
    pub y: f64,
    /// Extent along the pad's own X axis.
    pub width: f64,
    /// Extent along the pad's own Y axis.
    pub height: f64,
    /// Rotation in degrees.
    pub angle: f64,
    /// Corner rounding, 0 (square) to 100 (fully round).
    pub roundness: f64,
}

/// Drilled feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Hole {
    /// Component reference, empty when unknown.
    pub element: String,
    /// Footprint name, empty when unknown.
    pub package: String,
    /// Designator; empty for bare mounting holes.
    pub name: String,
    /// Center X.
    pub x: f64,
    /// Center Y.
    pub y: f64,
    /// Radius.
    pub r: f64,
}

impl Hole {
    /// Drill diameter, the unit reported in hole tables.
    pub fn diameter(&self) -> f64 {
        self.r * 2.0
    }
}

/// Line segment on a logical layer such as the board outline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Wire {
    /// Start X.
    pub x1: f64,
    /// Start Y.
    pub y1: f64,
    /// End X.
    pub x2: f64,
    /// End Y.
    pub y2: f64,
    /// Stroke width.
    pub width: f64,
}

/// Silkscreen text label.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Text {
    /// Anchor X.
    pub x: f64,
    /// Anchor Y.
    pub y: f64,
    /// Glyph height.
    pub size: f64,
    /// Rotation in degrees.
    pub angle: f64,
    /// Label content.
    pub text: String,
    /// Concrete layer id the label was found on.
    pub layer: String,
}

/// Board side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Side {
    /// Component side.
    #[default]
    Top,
    /// Solder side.
    Bottom,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top => f.write_str("Top"),
            Self::Bottom => f.write_str("Bottom"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("top") {
            Ok(Self::Top)
        } else if s.eq_ignore_ascii_case("bottom") {
            Ok(Self::Bottom)
        } else {
            Err(format!("unknown side `{s}`; expected Top or Bottom"))
        }
    }
}

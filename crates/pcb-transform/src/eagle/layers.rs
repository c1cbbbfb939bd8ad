//! Eagle layer numbering: the layer table, side policy and mirror pairs.

use std::collections::HashMap;

use crate::geometry::Side;

/// Outline layer.
pub const DIMENSION: u32 = 20;

/// Layers a board declares when its `<layers>` section omits them.
const STANDARD_LAYERS: &[(u32, &str)] = &[
    (1, "Top"),
    (16, "Bottom"),
    (17, "Pads"),
    (18, "Vias"),
    (19, "Unrouted"),
    (DIMENSION, "Dimension"),
    (21, "tPlace"),
    (22, "bPlace"),
    (23, "tOrigins"),
    (24, "bOrigins"),
    (25, "tNames"),
    (26, "bNames"),
    (27, "tValues"),
    (28, "bValues"),
    (29, "tStop"),
    (30, "bStop"),
    (31, "tCream"),
    (32, "bCream"),
    (35, "tGlue"),
    (36, "bGlue"),
    (39, "tKeepout"),
    (40, "bKeepout"),
    (41, "tRestrict"),
    (42, "bRestrict"),
    (44, "Drills"),
    (45, "Holes"),
    (51, "tDocu"),
    (52, "bDocu"),
];

/// Top/bottom counterparts swapped when a component is mirrored.
const MIRROR_PAIRS: &[(u32, u32)] = &[
    (1, 16),
    (21, 22),
    (23, 24),
    (25, 26),
    (27, 28),
    (29, 30),
    (31, 32),
    (33, 34),
    (35, 36),
    (37, 38),
    (39, 40),
    (41, 42),
    (51, 52),
];

/// Concrete pad and silkscreen layers used when rendering one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideLayers {
    /// Copper layer holding the side's SMD pads.
    pub pad: &'static str,
    /// Silkscreen layer holding the side's labels.
    pub silk: &'static str,
}

/// Fixed side-to-layer policy.
pub const fn side_layers(side: Side) -> SideLayers {
    match side {
        Side::Top => SideLayers {
            pad: "1",
            silk: "21",
        },
        Side::Bottom => SideLayers {
            pad: "16",
            silk: "22",
        },
    }
}

/// Whether a layer number belongs to the bottom side.
pub fn is_bottom_layer(number: u32) -> bool {
    MIRROR_PAIRS.iter().any(|&(_, bottom)| bottom == number)
}

/// Layer a mirrored component's geometry moves to.
pub fn mirror_layer(number: u32) -> u32 {
    MIRROR_PAIRS
        .iter()
        .find_map(|&(top, bottom)| {
            if top == number {
                Some(bottom)
            } else if bottom == number {
                Some(top)
            } else {
                None
            }
        })
        .unwrap_or(number)
}

/// Name-to-number lookup for one board.
#[derive(Debug, Clone, Default)]
pub struct LayerTable {
    by_name: HashMap<String, u32>,
}

impl LayerTable {
    /// Builds a table from declared `(number, name)` pairs, filling in the
    /// standard layers the board does not declare.
    pub fn new(declared: impl IntoIterator<Item = (u32, String)>) -> Self {
        let mut by_name: HashMap<String, u32> = declared
            .into_iter()
            .map(|(number, name)| (name.to_ascii_lowercase(), number))
            .collect();
        for &(number, name) in STANDARD_LAYERS {
            by_name.entry(name.to_ascii_lowercase()).or_insert(number);
        }
        Self { by_name }
    }

    /// Resolves a layer spec: a layer number, or a case-insensitive name.
    pub fn resolve(&self, spec: &str) -> Option<u32> {
        let spec = spec.trim();
        if let Ok(number) = spec.parse::<u32>() {
            return Some(number);
        }
        self.by_name.get(&spec.to_ascii_lowercase()).copied()
    }

    /// Side a layer spec refers to; unknown specs count as the top side.
    pub fn side_of(&self, spec: &str) -> Side {
        match self.resolve(spec) {
            Some(number) if is_bottom_layer(number) => Side::Bottom,
            _ => Side::Top,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_policy_is_a_fixed_table() {
        assert_eq!(side_layers(Side::Top), SideLayers { pad: "1", silk: "21" });
        assert_eq!(
            side_layers(Side::Bottom),
            SideLayers {
                pad: "16",
                silk: "22"
            }
        );
    }

    #[test]
    fn mirror_swaps_counterparts_and_keeps_others() {
        assert_eq!(mirror_layer(1), 16);
        assert_eq!(mirror_layer(22), 21);
        assert_eq!(mirror_layer(DIMENSION), DIMENSION);
    }

    #[test]
    fn resolve_accepts_numbers_and_names() {
        let table = LayerTable::new([(1, "Top".to_string()), (200, "Custom".to_string())]);
        assert_eq!(table.resolve("16"), Some(16));
        assert_eq!(table.resolve("custom"), Some(200));
        assert_eq!(table.resolve("Dimension"), Some(DIMENSION));
        assert_eq!(table.resolve("nope"), None);
    }

    #[test]
    fn side_of_defaults_to_top() {
        let table = LayerTable::new([]);
        assert_eq!(table.side_of("Bottom"), Side::Bottom);
        assert_eq!(table.side_of("bPlace"), Side::Bottom);
        assert_eq!(table.side_of("Top"), Side::Top);
        assert_eq!(table.side_of("unknown"), Side::Top);
    }
}

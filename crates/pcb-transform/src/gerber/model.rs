//! Board assembled from several Gerber and drill layer files.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::excellon;
use crate::geometry::{Bounds, Extent, Hole, Pad, Point, Text, Wire};

use super::aperture::{circle_diameter, flash_extent, stroke_width};
use super::parser;
use super::types::{GerberLayer, Graphic, LayerContent, LayerRole, LoadedLayer};

/// Flashes closer than this on both axes are the same feature.
const COINCIDENT_MM: f64 = 1e-6;

/// Layers of one Gerber board, in load order.
#[derive(Debug, Clone, Default)]
pub struct GerberModel {
    layers: IndexMap<String, LoadedLayer>,
}

impl GerberModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one layer file and stores it under its upper-cased id.
    ///
    /// Drill ids are read as Excellon, everything else as RS-274X. Loading
    /// an id twice replaces the earlier layer in place.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Layer`] naming the id when the file is malformed.
    pub fn load_layer(&mut self, id: &str, data: &[u8]) -> Result<(), ParseError> {
        let id = id.to_ascii_uppercase();
        let role = LayerRole::of(&id);
        let content = match role {
            LayerRole::Drill => excellon::parse(data).map(LayerContent::Drill),
            _ => parser::parse(data).map(LayerContent::Artwork),
        }
        .map_err(|err| err.in_layer(&id))?;

        let layer = LoadedLayer { role, content };
        for warning in layer.warnings() {
            warn!(layer = %id, "{warning}");
        }
        debug!(
            layer = %id,
            role = ?role,
            graphics = layer.graphics_count(),
            "loaded layer"
        );
        self.layers.insert(id, layer);
        Ok(())
    }

    /// Whether no layer has been loaded.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Loaded layer ids in load order.
    pub fn layer_ids(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    /// Flashed pads on `layer`, or on the paste layers when `None`.
    ///
    /// Without a paste layer the copper layers stand in for it.
    pub fn pads(&self, layer: Option<&str>) -> Vec<Pad> {
        let fallback = if self.has_role(LayerRole::Paste) {
            LayerRole::Paste
        } else {
            LayerRole::Copper
        };
        self.select(layer, Some(fallback))
            .flat_map(|artwork| flashes(artwork).map(move |(code, at)| (artwork, code, at)))
            .filter_map(|(artwork, code, at)| {
                let extent = flash_extent(artwork.apertures.get(&code)?);
                Some(Pad {
                    name: format!("D{code}"),
                    x: at.x,
                    y: at.y,
                    width: extent.width,
                    height: extent.height,
                    angle: extent.angle,
                    ..Pad::default()
                })
            })
            .collect()
    }

    /// Strokes on `layer`, or on every artwork layer when `None`.
    pub fn wires(&self, layer: Option<&str>) -> Vec<Wire> {
        self.select(layer, None).flat_map(strokes).collect()
    }

    /// Drill hits, then round solder-mask openings without a paste pad.
    pub fn holes(&self) -> Vec<Hole> {
        let mut holes: Vec<Hole> = self
            .layers
            .values()
            .filter_map(|layer| match &layer.content {
                LayerContent::Drill(drill) => Some(drill.holes()),
                LayerContent::Artwork(_) => None,
            })
            .flatten()
            .collect();

        let paste: Vec<Point> = self
            .with_role(LayerRole::Paste)
            .flat_map(|artwork| flashes(artwork).map(|(_, at)| at))
            .collect();
        let covered = |at: Point| {
            paste.iter().any(|pad| {
                (pad.x - at.x).abs() < COINCIDENT_MM && (pad.y - at.y).abs() < COINCIDENT_MM
            })
        };

        for artwork in self.with_role(LayerRole::SolderMask) {
            for (code, at) in flashes(artwork) {
                let Some(diameter) = artwork.apertures.get(&code).and_then(circle_diameter)
                else {
                    continue;
                };
                if covered(at) {
                    continue;
                }
                holes.push(Hole {
                    name: format!("D{code}"),
                    x: at.x,
                    y: at.y,
                    r: diameter / 2.0,
                    ..Hole::default()
                });
            }
        }
        holes
    }

    /// Gerber files carry no text objects.
    pub fn texts(&self, _layer: Option<&str>) -> Vec<Text> {
        Vec::new()
    }

    /// Strokes on every outline layer.
    pub fn outline_wires(&self) -> Vec<Wire> {
        self.with_role(LayerRole::Outline).flat_map(strokes).collect()
    }

    /// Extent of the outline strokes, else of every graphic, else zero.
    pub fn bounds(&self) -> Bounds {
        if let Some(bounds) = Bounds::of_wires(&self.outline_wires()) {
            return bounds;
        }

        let mut extent = Extent::new();
        for layer in self.layers.values() {
            match &layer.content {
                LayerContent::Artwork(artwork) => {
                    for graphic in &artwork.graphics {
                        for point in graphic_points(graphic) {
                            extent.update(point.x, point.y);
                        }
                    }
                }
                LayerContent::Drill(drill) => {
                    for hole in drill.holes() {
                        extent.update(hole.x, hole.y);
                    }
                }
            }
        }
        extent.finish().unwrap_or_default()
    }

    fn has_role(&self, role: LayerRole) -> bool {
        self.layers.values().any(|layer| layer.role == role)
    }

    fn with_role(&self, role: LayerRole) -> impl Iterator<Item = &GerberLayer> {
        self.layers
            .values()
            .filter(move |layer| layer.role == role)
            .filter_map(LoadedLayer::artwork)
    }

    /// Artwork layers matching an explicit id, or `fallback` role (all
    /// layers when that is `None`).
    fn select<'a>(
        &'a self,
        layer: Option<&str>,
        fallback: Option<LayerRole>,
    ) -> impl Iterator<Item = &'a GerberLayer> {
        let wanted = layer.map(str::to_ascii_uppercase);
        self.layers
            .iter()
            .filter(move |(id, loaded)| match (&wanted, fallback) {
                (Some(wanted), _) => *id == wanted,
                (None, Some(role)) => loaded.role == role,
                (None, None) => true,
            })
            .filter_map(|(_, loaded)| loaded.artwork())
    }
}

fn flashes(artwork: &GerberLayer) -> impl Iterator<Item = (i32, Point)> + '_ {
    artwork.graphics.iter().filter_map(|graphic| match graphic {
        Graphic::Flash { aperture, at } => Some((*aperture, *at)),
        _ => None,
    })
}

fn strokes(artwork: &GerberLayer) -> impl Iterator<Item = Wire> + '_ {
    artwork.graphics.iter().filter_map(|graphic| match graphic {
        Graphic::Stroke { aperture, from, to } => Some(Wire {
            x1: from.x,
            y1: from.y,
            x2: to.x,
            y2: to.y,
            width: artwork.apertures.get(aperture).map_or(0.0, stroke_width),
        }),
        _ => None,
    })
}

fn graphic_points(graphic: &Graphic) -> Vec<Point> {
    match graphic {
        Graphic::Flash { at, .. } => vec![*at],
        Graphic::Stroke { from, to, .. } => vec![*from, *to],
        Graphic::Region { points } => points.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTLINE: &str = "%FSLAX34Y34*%\n%MOMM*%\n%ADD10C,0.2*%\nD10*\n\
        X0Y0D02*\nX1000000Y0D01*\nX1000000Y500000D01*\nX0Y500000D01*\nX0Y0D01*\nM02*\n";
    const PASTE: &str = "%FSLAX34Y34*%\n%MOMM*%\n%ADD10R,1.0X0.5*%\n%ADD11C,0.8*%\nD10*\n\
        X100000Y100000D03*\nD11*\nX200000Y100000D03*\nM02*\n";
    const MASK: &str = "%FSLAX34Y34*%\n%MOMM*%\n%ADD10C,0.8*%\n%ADD11C,3.2*%\nD10*\n\
        X200000Y100000D03*\nD11*\nX500000Y250000D03*\nM02*\n";
    const DRILL: &str = "M48\nMETRIC,TZ\nT1C0.800\n%\nT1\nX30.0Y20.0\nM30\n";

    fn model(layers: &[(&str, &str)]) -> GerberModel {
        let mut model = GerberModel::new();
        for (id, data) in layers {
            let result = model.load_layer(id, data.as_bytes());
            assert!(result.is_ok(), "{id}: {:?}", result.err());
        }
        model
    }

    #[test]
    fn ut_gmd_001_pads_come_from_paste_flashes() {
        let model = model(&[("gtp", PASTE), ("GTS", MASK)]);
        let pads = model.pads(None);
        assert_eq!(pads.len(), 2);
        let first = pads.first();
        assert_eq!(first.map(|pad| pad.name.as_str()), Some("D10"));
        assert_eq!(first.map(|pad| (pad.x, pad.y)), Some((10.0, 10.0)));
        assert_eq!(first.map(|pad| (pad.width, pad.height)), Some((1.0, 0.5)));
        assert_eq!(pads.get(1).map(|pad| pad.width), Some(0.8));
    }

    #[test]
    fn ut_gmd_002_copper_stands_in_without_paste() {
        let model = model(&[("GTL", PASTE)]);
        assert_eq!(model.pads(None).len(), 2);
        assert!(model.pads(Some("gbl")).is_empty());
    }

    #[test]
    fn ut_gmd_003_holes_list_drills_then_uncovered_mask_openings() {
        let model = model(&[("GTP", PASTE), ("GTS", MASK), ("DRL", DRILL)]);
        let holes = model.holes();
        let names: Vec<&str> = holes.iter().map(|hole| hole.name.as_str()).collect();
        assert_eq!(names, ["T1", "D11"]);
        assert_eq!(holes.get(1).map(Hole::diameter), Some(3.2));
    }

    #[test]
    fn ut_gmd_004_bounds_follow_the_outline() {
        let model = model(&[("GKO", OUTLINE), ("GTP", PASTE)]);
        let bounds = model.bounds();
        assert_eq!((bounds.width(), bounds.height()), (100.0, 50.0));
        assert_eq!(model.wires(Some("GKO")).len(), 4);
        assert_eq!(model.wires(Some("GKO")).first().map(|wire| wire.width), Some(0.2));
    }

    #[test]
    fn ut_gmd_005_bounds_fall_back_to_all_graphics() {
        let model = model(&[("GTP", PASTE)]);
        let bounds = model.bounds();
        assert_eq!((bounds.left, bounds.right), (10.0, 20.0));
        assert_eq!(GerberModel::new().bounds(), Bounds::default());
    }

    #[test]
    fn ut_gmd_006_reload_keeps_load_order() {
        let model = model(&[("GKO", OUTLINE), ("GTP", PASTE), ("gko", OUTLINE)]);
        let ids: Vec<&str> = model.layer_ids().collect();
        assert_eq!(ids, ["GKO", "GTP"]);
        assert!(model.texts(None).is_empty());
    }

    #[test]
    fn bc_gmd_001_errors_name_the_layer() {
        let mut model = GerberModel::new();
        let err = model.load_layer("gtp", b"%FSLAX24Y24*%\n%MOMM*%\nD05*\nM02*\n");
        assert!(matches!(err, Err(ParseError::Layer { ref layer, .. }) if layer == "GTP"));
        assert!(model.is_empty());
    }
}

//! Transform coordinator: owns the loaded board and drives the renderers.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::eagle::{side_layers, EagleBoard};
use crate::error::TransformError;
use crate::geometry::{Bounds, Hole, Pad, Side, Text, Wire};
use crate::gerber::GerberModel;
use crate::render::{write_holes, write_pads, write_svg, SvgBoard};

/// Name of the Eagle outline layer.
const DIMENSION_LAYER: &str = "Dimension";

/// Options recognized by [`PcbTransform::render_svg`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Layer spec whose side is drawn, e.g. `Top` or `16`.
    pub layer: Option<String>,
    /// Draw pads as well as outline, holes and silk text.
    pub show_smds: bool,
    /// Requested sides; `{Bottom}` alone selects the bottom side when no
    /// `layer` is given.
    pub layers: BTreeSet<Side>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            layer: None,
            show_smds: false,
            layers: BTreeSet::from([Side::Top]),
        }
    }
}

impl RenderOptions {
    /// Side to draw, resolving `layer` through the board's layer table.
    pub fn side(&self, board: &EagleBoard) -> Side {
        match &self.layer {
            Some(spec) => board.side_of(spec),
            None if self.layers.len() == 1 && self.layers.contains(&Side::Bottom) => {
                Side::Bottom
            }
            None => Side::Top,
        }
    }
}

/// CSV destinations; a table is written only when its sink is present.
#[derive(Default)]
pub struct CsvSinks<'a> {
    /// Receives the pad table.
    pub smdpads: Option<&'a mut dyn Write>,
    /// Receives the hole table.
    pub holes: Option<&'a mut dyn Write>,
}

/// The source every query and render call reads from.
///
/// An Eagle board wins over Gerber layers when both are loaded.
#[derive(Debug, Clone, Copy)]
pub enum ActiveSource<'a> {
    /// Eagle board.
    Eagle(&'a EagleBoard),
    /// Gerber layers.
    Gerber(&'a GerberModel),
    /// Nothing loaded yet.
    None,
}

/// Kind of source behind a [`BoardSummary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Eagle board file.
    Eagle,
    /// Gerber layer files.
    Gerber,
    /// Nothing loaded.
    None,
}

/// Counts and extent of the active board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardSummary {
    /// Active source.
    pub source: SourceKind,
    /// Board rectangle.
    pub bounds: Bounds,
    /// Number of pads.
    pub pads: usize,
    /// Number of holes.
    pub holes: usize,
    /// Number of wires on every layer.
    pub wires: usize,
    /// Number of text labels.
    pub texts: usize,
    /// Loaded Gerber layer ids in load order.
    pub layers: Vec<String>,
}

/// Loads PCB data and renders it as SVG or CSV.
#[derive(Debug, Default)]
pub struct PcbTransform {
    eagle: Option<EagleBoard>,
    gerber: Option<GerberModel>,
}

impl PcbTransform {
    /// Creates a coordinator with nothing loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Crate version.
    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Reads and parses an Eagle `.brd` file, replacing any earlier board.
    ///
    /// # Errors
    ///
    /// [`TransformError::Io`] when the file cannot be read and
    /// [`TransformError::Parse`] when it is not a valid board.
    pub fn load_eagle_brd(&mut self, path: impl AsRef<Path>) -> Result<(), TransformError> {
        let path = path.as_ref();
        let data = read(path)?;
        let board = EagleBoard::load(&data)?;
        debug!(
            path = %path.display(),
            pads = board.pads(None).len(),
            holes = board.holes().len(),
            "loaded Eagle board"
        );
        self.eagle = Some(board);
        Ok(())
    }

    /// Loads Gerber layer files in iteration order into a fresh model.
    ///
    /// Ids are upper-cased. Loading stops at the first failure and keeps
    /// the layers read so far.
    ///
    /// # Errors
    ///
    /// [`TransformError::Io`] for an unreadable file and
    /// [`TransformError::Parse`] naming the layer for a malformed one.
    pub fn load_gerber_layers<I, K, P>(&mut self, layer_files: I) -> Result<(), TransformError>
    where
        I: IntoIterator<Item = (K, P)>,
        K: AsRef<str>,
        P: AsRef<Path>,
    {
        let model = self.gerber.insert(GerberModel::new());
        for (id, path) in layer_files {
            let id = id.as_ref().to_ascii_uppercase();
            let path = path.as_ref();
            debug!(layer = %id, path = %path.display(), "loading Gerber layer");
            let data = read(path)?;
            model.load_layer(&id, &data)?;
        }
        Ok(())
    }

    /// Source queries are answered from.
    ///
    /// A Gerber model counts only once at least one layer has loaded.
    pub fn active(&self) -> ActiveSource<'_> {
        match (&self.eagle, &self.gerber) {
            (Some(board), _) => ActiveSource::Eagle(board),
            (None, Some(model)) if !model.is_empty() => ActiveSource::Gerber(model),
            (None, _) => ActiveSource::None,
        }
    }

    /// Pads on `layer`, or the source's default pad set.
    pub fn pads(&self, layer: Option<&str>) -> Vec<Pad> {
        match self.active() {
            ActiveSource::Eagle(board) => board.pads(layer),
            ActiveSource::Gerber(model) => model.pads(layer),
            ActiveSource::None => Vec::new(),
        }
    }

    /// Wires on `layer`, or on every layer.
    pub fn wires(&self, layer: Option<&str>) -> Vec<Wire> {
        match self.active() {
            ActiveSource::Eagle(board) => board.wires(layer),
            ActiveSource::Gerber(model) => model.wires(layer),
            ActiveSource::None => Vec::new(),
        }
    }

    /// Every drilled feature.
    pub fn holes(&self) -> Vec<Hole> {
        match self.active() {
            ActiveSource::Eagle(board) => board.holes(),
            ActiveSource::Gerber(model) => model.holes(),
            ActiveSource::None => Vec::new(),
        }
    }

    /// Text labels on `layer`, or on every layer.
    pub fn texts(&self, layer: Option<&str>) -> Vec<Text> {
        match self.active() {
            ActiveSource::Eagle(board) => board.texts(layer),
            ActiveSource::Gerber(model) => model.texts(layer),
            ActiveSource::None => Vec::new(),
        }
    }

    /// Board rectangle; zero when nothing is loaded.
    pub fn bounds(&self) -> Bounds {
        match self.active() {
            ActiveSource::Eagle(board) => board.bounds(),
            ActiveSource::Gerber(model) => model.bounds(),
            ActiveSource::None => Bounds::default(),
        }
    }

    /// Writes the pad and hole tables to whichever sinks are supplied.
    ///
    /// With nothing loaded the tables hold only their headers.
    ///
    /// # Errors
    ///
    /// [`TransformError::Csv`] when a sink fails.
    pub fn render_csv(&self, sinks: CsvSinks<'_>) -> Result<(), TransformError> {
        if let Some(out) = sinks.smdpads {
            write_pads(&self.pads(None), out)?;
        }
        if let Some(out) = sinks.holes {
            write_holes(&self.holes(), out)?;
        }
        Ok(())
    }

    /// Writes the board as an SVG document.
    ///
    /// # Errors
    ///
    /// [`TransformError::NoSource`] before anything is loaded, in which case
    /// nothing is written, and [`TransformError::Output`] when `out` fails.
    pub fn render_svg(
        &self,
        options: &RenderOptions,
        out: &mut dyn Write,
    ) -> Result<(), TransformError> {
        match self.active() {
            ActiveSource::None => Err(TransformError::NoSource),
            ActiveSource::Eagle(board) => {
                let pads = if options.show_smds {
                    board.pads(Some(side_layers(options.side(board)).pad))
                } else {
                    Vec::new()
                };
                Self::eagle_brd_to_svg(board, &pads, &board.holes(), options, out)
            }
            ActiveSource::Gerber(model) => {
                let board = SvgBoard {
                    bounds: model.bounds(),
                    dim_wires: &model.outline_wires(),
                    pads: &model.pads(None),
                    holes: &[],
                    texts: &[],
                };
                write_svg(&board, out)?;
                Ok(())
            }
        }
    }

    /// Draws an Eagle board with the given pads and holes, taking outline
    /// wires from the Dimension layer and text from the side's silk layer.
    ///
    /// # Errors
    ///
    /// [`TransformError::Output`] when `out` fails.
    pub fn eagle_brd_to_svg(
        board: &EagleBoard,
        smds: &[Pad],
        holes: &[Hole],
        options: &RenderOptions,
        out: &mut dyn Write,
    ) -> Result<(), TransformError> {
        let layers = side_layers(options.side(board));
        let svg = SvgBoard {
            bounds: board.bounds(),
            dim_wires: &board.wires(Some(DIMENSION_LAYER)),
            pads: smds,
            holes,
            texts: &board.texts(Some(layers.silk)),
        };
        write_svg(&svg, out)?;
        Ok(())
    }

    /// Counts and extent of the active source.
    pub fn summary(&self) -> BoardSummary {
        let (source, layers) = match self.active() {
            ActiveSource::Eagle(_) => (SourceKind::Eagle, Vec::new()),
            ActiveSource::Gerber(model) => (
                SourceKind::Gerber,
                model.layer_ids().map(str::to_string).collect(),
            ),
            ActiveSource::None => (SourceKind::None, Vec::new()),
        };
        BoardSummary {
            source,
            bounds: self.bounds(),
            pads: self.pads(None).len(),
            holes: self.holes().len(),
            wires: self.wires(None).len(),
            texts: self.texts(None).len(),
            layers,
        }
    }
}

fn read(path: &Path) -> Result<Vec<u8>, TransformError> {
    std::fs::read(path).map_err(|source| TransformError::Io {
        path: path.to_path_buf(),
        source,
    })
}

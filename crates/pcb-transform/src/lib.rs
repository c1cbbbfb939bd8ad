#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::indexing_slicing)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! `pcb-transform`: Eagle BRD and Gerber ingestion into one board geometry
//! model, rendered as SVG drawings and CSV pad/hole tables.
//!
//! ```no_run
//! use pcb_transform::{CsvSinks, PcbTransform};
//!
//! let mut pcb = PcbTransform::new();
//! pcb.load_gerber_layers([("GKO", "board.GKO"), ("GTP", "board.GTP")])?;
//! let mut pads = Vec::new();
//! pcb.render_csv(CsvSinks {
//!     smdpads: Some(&mut pads),
//!     holes: None,
//! })?;
//! # Ok::<(), pcb_transform::TransformError>(())
//! ```

pub mod eagle;
pub mod error;
pub mod excellon;
pub mod geometry;
pub mod gerber;
pub mod render;
pub mod transform;

pub use error::{ParseError, TransformError};
pub use geometry::{Bounds, Hole, Pad, Side, Text, Wire};
pub use transform::{ActiveSource, BoardSummary, CsvSinks, PcbTransform, RenderOptions, SourceKind};

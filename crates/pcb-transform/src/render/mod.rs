//! Output writers for the board model.

pub mod format;
pub mod svg;
pub mod table;

pub use format::decimal;
pub use svg::{write_svg, SvgBoard};
pub use table::{write_holes, write_pads};

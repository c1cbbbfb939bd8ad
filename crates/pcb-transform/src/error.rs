//! Error types for board ingestion and rendering.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while parsing a source file into the geometry model.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The input contained no bytes.
    #[error("empty input")]
    Empty,

    /// The Eagle board XML is not well formed.
    #[error("XML parse error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// A required XML element is missing.
    #[error("missing required element: {0}")]
    MissingElement(&'static str),

    /// A required XML attribute is missing.
    #[error("missing required attribute '{attr}' on element '{element}'")]
    MissingAttribute {
        /// Element the attribute belongs to.
        element: &'static str,
        /// Attribute name.
        attr: &'static str,
    },

    /// An attribute value could not be interpreted.
    #[error("invalid attribute value: {0}")]
    InvalidAttribute(String),

    /// An aperture definition is missing or invalid.
    #[error("invalid aperture: {0}")]
    InvalidAperture(String),

    /// A Gerber or Excellon command could not be parsed.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// A layer file failed to parse.
    #[error("layer {layer}: {source}")]
    Layer {
        /// Upper-cased layer id, e.g. `GTP`.
        layer: String,
        /// Underlying failure.
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// Attaches a layer id to a parse failure.
    pub fn in_layer(self, layer: &str) -> Self {
        Self::Layer {
            layer: layer.to_string(),
            source: Box::new(self),
        }
    }
}

/// Errors surfaced by [`crate::PcbTransform`].
#[derive(Debug, Error)]
pub enum TransformError {
    /// A source file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A source file was read but is malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Rendering was requested before any source was loaded.
    #[error("SVG creation failed. No PCB files have been specified.")]
    NoSource,

    /// Writing a CSV record failed.
    #[error("CSV output failed: {0}")]
    Csv(#[from] csv::Error),

    /// Writing to an output sink failed.
    #[error("output failed: {0}")]
    Output(#[from] std::io::Error),
}

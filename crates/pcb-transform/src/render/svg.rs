//! Board drawing as SVG.
//!
//! Shapes are drawn in board coordinates with Y negated so the board reads
//! the right way up; the outline rectangle and pads flip through
//! `scale(1,-1)` instead.

use std::io::{self, Write};

use crate::geometry::{Bounds, Hole, Pad, Text, Wire};

use super::format::decimal;

/// Everything drawn into one SVG document.
#[derive(Debug, Clone, Copy)]
pub struct SvgBoard<'a> {
    /// Board rectangle; sets the document size and view box.
    pub bounds: Bounds,
    /// Outline segments.
    pub dim_wires: &'a [Wire],
    /// Pads to draw; empty when pads are hidden.
    pub pads: &'a [Pad],
    /// Drilled holes.
    pub holes: &'a [Hole],
    /// Silkscreen labels.
    pub texts: &'a [Text],
}

/// Writes the document, one element per line.
///
/// # Errors
///
/// Returns the sink's I/O error.
pub fn write_svg(board: &SvgBoard<'_>, out: &mut dyn Write) -> io::Result<()> {
    let bounds = board.bounds;
    let width = decimal(bounds.width());
    let height = decimal(bounds.height());

    writeln!(
        out,
        r#"<?xml version="1.0" encoding="UTF-8" standalone="no" ?>"#
    )?;
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{width}mm" height="{height}mm" viewbox=" 0 -{height} {width} {height} " >"#
    )?;
    writeln!(out, r#"<g stroke-linecap="round" stroke-width="0.25">"#)?;
    writeln!(
        out,
        r##"<rect x="{}" y="{}" width="{width}" height="{height}" transform="scale(1,-1)" fill="#ddf"/><!--dimension-->"##,
        decimal(bounds.left),
        decimal(bounds.top),
    )?;

    for wire in board.dim_wires {
        writeln!(
            out,
            r##"<line x1="{}" y1="{}" x2="{}" y2="{}" width="{}" stroke="#f0f"/><!--dimension-->"##,
            decimal(wire.x1),
            decimal(-wire.y1),
            decimal(wire.x2),
            decimal(-wire.y2),
            decimal(wire.width),
        )?;
    }
    for pad in board.pads {
        write_pad(pad, out)?;
    }
    for hole in board.holes {
        writeln!(
            out,
            r##"<circle cx="{}" cy="{}" r="{}" fill="#fff" stroke="#000" stroke-width="0.1"/><!--hole-->"##,
            decimal(hole.x),
            decimal(-hole.y),
            decimal(hole.r),
        )?;
    }
    for text in board.texts {
        let (x, y) = (decimal(text.x), decimal(-text.y));
        writeln!(
            out,
            r##"<text x="{x}" y="{y}" font-size="{}" transform="rotate({} {x} {y})" fill="#000" stroke="none">{}</text><!--text-->"##,
            decimal(text.size),
            decimal(-text.angle),
            escape(&text.text),
        )?;
    }

    writeln!(out, "</g>")?;
    writeln!(out, "</svg>")?;
    Ok(())
}

fn write_pad(pad: &Pad, out: &mut dyn Write) -> io::Result<()> {
    let corner = if pad.roundness > 0.0 {
        let radius = pad.width.min(pad.height) / 2.0 * pad.roundness / 100.0;
        format!(r#" rx="{}""#, decimal(radius))
    } else {
        String::new()
    };
    let (x, y) = (decimal(pad.x), decimal(pad.y));
    writeln!(
        out,
        r##"<rect x="{}" y="{}" width="{}" height="{}"{corner} transform="scale(1,-1) rotate({} {x} {y})" fill="#c60" stroke="none"/><!--smd-->"##,
        decimal(pad.x - pad.width / 2.0),
        decimal(pad.y - pad.height / 2.0),
        decimal(pad.width),
        decimal(pad.height),
        decimal(pad.angle),
    )
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

//! Pad and hole CSV tables.

use std::io::Write;

use csv::{QuoteStyle, WriterBuilder};

use crate::geometry::{Hole, Pad};

use super::format::decimal;

const PAD_HEADER: [&str; 10] = [
    "#", "ELEMENT", "PACKAGE", "PAD", "X", "Y", "W", "H", "ANGLE", "ROUNDNESS",
];

const HOLE_HEADER: [&str; 7] = ["#", "ELEMENT", "PACKAGE", "HOLE", "X", "Y", "DRILL"];

fn table_writer(out: &mut dyn Write) -> csv::Writer<&mut dyn Write> {
    WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(out)
}

/// Numeric cells carry a leading space after the separator.
fn number(value: f64) -> String {
    format!(" {}", decimal(value))
}

/// Writes the pad table: a header, then one 1-indexed row per pad.
///
/// # Errors
///
/// Returns [`csv::Error`] when the sink fails.
pub fn write_pads(pads: &[Pad], out: &mut dyn Write) -> Result<(), csv::Error> {
    let mut writer = table_writer(out);
    writer.write_record(PAD_HEADER)?;
    for (index, pad) in pads.iter().enumerate() {
        writer.write_record([
            (index + 1).to_string(),
            pad.element.clone(),
            pad.package.clone(),
            pad.name.clone(),
            number(pad.x),
            number(pad.y),
            number(pad.width),
            number(pad.height),
            number(pad.angle),
            number(pad.roundness),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the hole table; `DRILL` is the hole diameter.
///
/// # Errors
///
/// Returns [`csv::Error`] when the sink fails.
pub fn write_holes(holes: &[Hole], out: &mut dyn Write) -> Result<(), csv::Error> {
    let mut writer = table_writer(out);
    writer.write_record(HOLE_HEADER)?;
    for (index, hole) in holes.iter().enumerate() {
        writer.write_record([
            (index + 1).to_string(),
            hole.element.clone(),
            hole.package.clone(),
            hole.name.clone(),
            number(hole.x),
            number(hole.y),
            number(hole.diameter()),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(bytes: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(bytes)
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn pad_rows_are_numbered_from_one() {
        let pads = [Pad {
            element: "E$16".into(),
            package: "0201".into(),
            name: "P$1".into(),
            x: 19.05,
            y: 10.764_800_000_000_001,
            width: 0.3,
            height: 0.3,
            angle: 90.0,
            roundness: 0.0,
        }];
        let mut out = Vec::new();
        assert!(write_pads(&pads, &mut out).is_ok());
        assert_eq!(
            lines(&out),
            [
                "#,ELEMENT,PACKAGE,PAD,X,Y,W,H,ANGLE,ROUNDNESS",
                "1,E$16,0201,P$1, 19.05, 10.764800000000001, 0.3, 0.3, 90, 0",
            ]
        );
    }

    #[test]
    fn hole_rows_report_diameter() {
        let holes = [Hole {
            element: "E$46".into(),
            package: "ALL-HOLES".into(),
            name: String::new(),
            x: 152.2235,
            y: 17.674,
            r: 1.63,
        }];
        let mut out = Vec::new();
        assert!(write_holes(&holes, &mut out).is_ok());
        assert_eq!(
            lines(&out),
            [
                "#,ELEMENT,PACKAGE,HOLE,X,Y,DRILL",
                "1,E$46,ALL-HOLES,, 152.2235, 17.674, 3.26",
            ]
        );
    }

    #[test]
    fn empty_tables_still_have_headers() {
        let mut out = Vec::new();
        assert!(write_holes(&[], &mut out).is_ok());
        assert_eq!(lines(&out).len(), 1);
    }

    #[test]
    fn names_with_commas_are_quoted() {
        let pads = [Pad {
            name: "A,B".into(),
            ..Pad::default()
        }];
        let mut out = Vec::new();
        assert!(write_pads(&pads, &mut out).is_ok());
        assert_eq!(
            lines(&out).get(1).map(String::as_str),
            Some("1,,,\"A,B\", 0, 0, 0, 0, 0, 0")
        );
    }
}

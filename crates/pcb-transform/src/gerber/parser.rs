//! RS-274X interpreter: walks the commands `gerber_parser` reads and turns
//! them into [`GerberLayer`] graphics in millimeters.

use std::collections::HashMap;
use std::io::{BufReader, Cursor};

use gerber_parser::{ContentError, GerberParserErrorWithContext};
use gerber_types::{
    Aperture, Command, CoordinateFormat, CoordinateMode, Coordinates, DCode, ExtendedCode,
    FunctionCode, GCode, Operation, Unit,
};

use crate::error::ParseError;
use crate::excellon::types::MM_PER_INCH;
use crate::geometry::Point;

use super::aperture::scale_aperture;
use super::types::{GerberLayer, Graphic};

/// Interpretation state carried from one command to the next.
#[derive(Debug, Default)]
struct Interpreter {
    units: Option<Unit>,
    apertures: HashMap<i32, Aperture>,
    current_aperture: Option<i32>,
    position: Point,
    region: Option<Vec<Point>>,
    graphics: Vec<Graphic>,
    warnings: Vec<String>,
}

impl Interpreter {
    const fn scale(&self) -> f64 {
        match self.units {
            Some(Unit::Inches) => MM_PER_INCH,
            Some(Unit::Millimeters) | None => 1.0,
        }
    }

    fn command(&mut self, command: &Command) -> Result<(), ParseError> {
        match command {
            Command::FunctionCode(FunctionCode::DCode(DCode::SelectAperture(code))) => {
                self.select(*code)
            }
            Command::FunctionCode(FunctionCode::DCode(DCode::Operation(operation))) => {
                self.operation(operation)
            }
            Command::FunctionCode(FunctionCode::GCode(code)) => {
                self.g_code(code);
                Ok(())
            }
            Command::FunctionCode(FunctionCode::MCode(_)) => Ok(()),
            Command::ExtendedCode(code) => self.extended_code(code),
        }
    }

    fn extended_code(&mut self, code: &ExtendedCode) -> Result<(), ParseError> {
        match code {
            ExtendedCode::Unit(unit) => self.units = Some(*unit),
            ExtendedCode::CoordinateFormat(format) => self.format(*format),
            ExtendedCode::ApertureDefinition(definition) => {
                let scale = self.scale();
                let aperture = scale_aperture(&definition.aperture, scale, &mut self.warnings)?;
                self.apertures.insert(definition.code, aperture);
            }
            _ => {}
        }
        Ok(())
    }

    fn format(&mut self, format: CoordinateFormat) {
        if format.coordinate_mode == CoordinateMode::Incremental {
            self.warnings
                .push("incremental coordinates are read as absolute".into());
        }
    }

    fn g_code(&mut self, code: &GCode) {
        match code {
            GCode::RegionMode(true) => {
                if self.region.is_some() {
                    self.warnings.push("G36 inside an open region".into());
                    self.close_contour();
                }
                self.region = Some(Vec::new());
            }
            GCode::RegionMode(false) => {
                self.close_contour();
                self.region = None;
            }
            GCode::Unit(unit) => self.units = Some(*unit),
            GCode::CoordinateMode(CoordinateMode::Incremental) => self
                .warnings
                .push("incremental coordinates are read as absolute".into()),
            _ => {}
        }
    }

    fn select(&mut self, code: i32) -> Result<(), ParseError> {
        if !self.apertures.contains_key(&code) {
            return Err(ParseError::InvalidAperture(format!(
                "D{code} is selected before it is defined"
            )));
        }
        self.current_aperture = Some(code);
        Ok(())
    }

    fn target(&self, coordinates: Option<&Coordinates>) -> Point {
        let Some(coordinates) = coordinates else {
            return self.position;
        };
        let scale = self.scale();
        Point::new(
            coordinates
                .x
                .map_or(self.position.x, |x| f64::from(x) * scale),
            coordinates
                .y
                .map_or(self.position.y, |y| f64::from(y) * scale),
        )
    }

    fn operation(&mut self, operation: &Operation) -> Result<(), ParseError> {
        match operation {
            Operation::Move(coordinates) => {
                self.close_contour();
                self.position = self.target(coordinates.as_ref());
            }
            // Arcs keep only their endpoints.
            Operation::Interpolate(coordinates, _) => {
                let target = self.target(coordinates.as_ref());
                if let Some(contour) = self.region.as_mut() {
                    if contour.is_empty() {
                        contour.push(self.position);
                    }
                    contour.push(target);
                } else if let Some(aperture) = self.current_aperture {
                    self.graphics.push(Graphic::Stroke {
                        aperture,
                        from: self.position,
                        to: target,
                    });
                } else {
                    self.warnings.push("draw without a selected aperture".into());
                }
                self.position = target;
            }
            Operation::Flash(coordinates) => {
                let aperture = self.current_aperture.ok_or_else(|| {
                    ParseError::InvalidAperture("flash without a selected aperture".into())
                })?;
                if self.region.is_some() {
                    return Err(ParseError::Syntax("flash inside a region".into()));
                }
                let at = self.target(coordinates.as_ref());
                self.graphics.push(Graphic::Flash { aperture, at });
                self.position = at;
            }
        }
        Ok(())
    }

    fn close_contour(&mut self) {
        if let Some(contour) = self.region.as_mut() {
            let points = std::mem::take(contour);
            if points.len() >= 2 {
                self.graphics.push(Graphic::Region { points });
            }
        }
    }

    /// Decides whether a line the reader rejected is fatal.
    ///
    /// Deprecated words the reader does not know (`G70`, `G71`, `G54D<n>`,
    /// `G90`, `G91`) are applied here. Attribute, comment and macro lines only
    /// warn, as do coordinates without an operation code.
    fn rejected(&mut self, rejected: &GerberParserErrorWithContext) -> Result<(), ParseError> {
        let line = rejected.line.as_ref().map_or("", |(_, text)| text.as_str());
        let word = line.trim_end_matches('*');

        match &rejected.error {
            ContentError::NoEndOfFile => {
                self.warnings.push("missing M02 end of file".into());
                return Ok(());
            }
            ContentError::ApertureDefinedTwice { aperture_code } => {
                self.warnings
                    .push(format!("D{aperture_code} defined twice; keeping the first"));
                return Ok(());
            }
            _ => {}
        }

        match word {
            "G70" => self.units = Some(Unit::Inches),
            "G71" => self.units = Some(Unit::Millimeters),
            "G90" => {}
            "G91" => self
                .warnings
                .push("incremental coordinates are read as absolute".into()),
            _ if word.starts_with(['X', 'Y']) && !word.contains('D') => self
                .warnings
                .push(format!("coordinates without an operation code skipped: '{line}'")),
            _ if is_annotation(word) => self
                .warnings
                .push(format!("ignoring '{line}': {}", rejected.error)),
            _ => match legacy_aperture(word) {
                Some(code) => return self.select(code),
                None => return Err(syntax(rejected)),
            },
        }
        Ok(())
    }

    fn finish(mut self) -> GerberLayer {
        if self.region.is_some() {
            self.warnings.push("region is not closed with G37".into());
            self.close_contour();
        }
        if self.units.is_none() && !self.graphics.is_empty() {
            self.warnings
                .push("no unit declaration; assuming millimeters".into());
        }
        GerberLayer {
            graphics: self.graphics,
            apertures: self.apertures,
            warnings: self.warnings,
        }
    }
}

/// Interprets a Gerber RS-274X file.
///
/// Coordinates and aperture sizes are converted to millimeters. Arcs keep
/// only their endpoints; aperture macro bodies are not evaluated.
///
/// # Errors
///
/// Returns [`ParseError::Syntax`] for lines that are not valid Gerber and
/// [`ParseError::InvalidAperture`] for bad or undefined apertures.
pub fn parse(data: &[u8]) -> Result<GerberLayer, ParseError> {
    if data.is_empty() {
        return Err(ParseError::Empty);
    }

    let reader = BufReader::new(Cursor::new(data));
    let doc = gerber_parser::parse(reader)
        .map_err(|(_, err)| ParseError::Syntax(err.to_string()))?;

    let mut interpreter = Interpreter::default();
    for command in &doc.commands {
        match command {
            Ok(command) => interpreter.command(command)?,
            Err(rejected) => interpreter.rejected(rejected)?,
        }
    }
    Ok(interpreter.finish())
}

/// `G04` comments and `%T…%` attributes carry no geometry; `%AM` bodies are
/// never evaluated.
fn is_annotation(word: &str) -> bool {
    ["G04", "%TF", "%TA", "%TO", "%TD", "%AM"]
        .iter()
        .any(|prefix| word.starts_with(prefix))
}

/// Aperture code of a deprecated `G54D<n>` or `G55D<n>` select.
fn legacy_aperture(word: &str) -> Option<i32> {
    word.strip_prefix("G54D")
        .or_else(|| word.strip_prefix("G55D"))
        .and_then(|code| code.parse().ok())
}

fn syntax(rejected: &GerberParserErrorWithContext) -> ParseError {
    match &rejected.line {
        Some((number, text)) => {
            ParseError::Syntax(format!("line {number} '{text}': {}", rejected.error))
        }
        None => ParseError::Syntax(rejected.error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "%FSLAX25Y25*%\n%MOIN*%\n%ADD10C,0.0120*%\n%ADD11R,0.060X0.030*%\n";

    fn parse_ok(body: &str) -> GerberLayer {
        let source = format!("{HEADER}{body}");
        let result = parse(source.as_bytes());
        assert!(result.is_ok(), "expected Ok, got {:?}", result.as_ref().err());
        result.unwrap_or_default()
    }

    #[test]
    fn ut_gbr_001_inch_coordinates_convert_to_millimeters() {
        let layer = parse_ok("D11*\nX175000Y50000D03*\nM02*\n");
        assert_eq!(layer.graphics.len(), 1);
        let flash = layer.graphics.first();
        assert!(matches!(flash, Some(Graphic::Flash { aperture: 11, .. })));
        if let Some(Graphic::Flash { at, .. }) = flash {
            assert_eq!(at.x.to_string(), "44.449999999999996");
            assert_eq!(at.y.to_string(), "12.7");
        }
        assert!(layer.warnings.is_empty(), "{:?}", layer.warnings);
    }

    #[test]
    fn ut_gbr_002_draws_start_at_the_current_point() {
        let layer = parse_ok("G01*\nD10*\nX0Y0D02*\nX100000D01*\nY100000D01*\nM02*\n");
        assert_eq!(layer.graphics.len(), 2);
        assert_eq!(
            layer.graphics.get(1),
            Some(&Graphic::Stroke {
                aperture: 10,
                from: Point::new(25.4, 0.0),
                to: Point::new(25.4, 25.4),
            })
        );
    }

    #[test]
    fn ut_gbr_003_legacy_aperture_select_and_units() {
        let source = "%FSLAX24Y24*%\nG70*\n%ADD10C,0.010*%\nG54D10*\nG01X0Y0D02*\nG01X10000Y0D01*\nM02*\n";
        let result = parse(source.as_bytes());
        assert!(result.is_ok(), "{:?}", result.as_ref().err());
        let layer = result.unwrap_or_default();
        assert_eq!(
            layer.graphics.first(),
            Some(&Graphic::Stroke {
                aperture: 10,
                from: Point::new(0.0, 0.0),
                to: Point::new(25.4, 0.0),
            })
        );
        assert!(layer.warnings.is_empty(), "{:?}", layer.warnings);
    }

    #[test]
    fn ut_gbr_004_regions_collect_contour_points() {
        let layer = parse_ok("G36*\nX0Y0D02*\nX10000Y0D01*\nX10000Y10000D01*\nX0Y0D01*\nG37*\nM02*\n");
        assert_eq!(layer.graphics.len(), 1);
        assert!(matches!(
            layer.graphics.first(),
            Some(Graphic::Region { points }) if points.len() == 4
        ));
    }

    #[test]
    fn ut_gbr_005_coordinates_without_operation_warn() {
        let layer = parse_ok("D10*\nX0Y0D03*\nX10000Y0*\nM02*\n");
        assert_eq!(layer.graphics.len(), 1);
        assert!(layer
            .warnings
            .iter()
            .any(|warning| warning.contains("without an operation code")));
    }

    #[test]
    fn ut_gbr_006_trailing_zero_omission_pads_right() {
        let source = "%FSTAX24Y24*%\n%MOMM*%\n%ADD10C,0.5*%\nD10*\nX15Y-25D03*\nM02*\n";
        let result = parse(source.as_bytes());
        assert!(result.is_ok(), "{:?}", result.as_ref().err());
        if let Ok(layer) = result {
            assert_eq!(
                layer.graphics.first(),
                Some(&Graphic::Flash {
                    aperture: 10,
                    at: Point::new(15.0, -25.0),
                })
            );
        }
    }

    #[test]
    fn ut_gbr_007_macro_apertures_are_references() {
        let layer = parse_ok("%AMOC8*5,1,8,0,0,1.08239X$1,22.5*%\n%ADD12OC8,0.05*%\nD12*\nX0Y0D03*\nM02*\n");
        assert!(matches!(
            layer.apertures.get(&12),
            Some(Aperture::Macro(name, _)) if name == "OC8"
        ));
        assert_eq!(layer.graphics.len(), 1);
    }

    #[test]
    fn ut_gbr_008_comments_and_polarity_carry_no_graphics() {
        let layer = parse_ok("G04 a comment with spaces*\n%LPD*%\nM02*\n");
        assert!(layer.graphics.is_empty());
        assert!(layer.warnings.is_empty(), "{:?}", layer.warnings);
    }

    #[test]
    fn ut_gbr_009_missing_end_of_file_warns() {
        let layer = parse_ok("D10*\nX0Y0D03*\n");
        assert_eq!(layer.graphics.len(), 1);
        assert!(layer.warnings.iter().any(|warning| warning.contains("M02")));
    }

    #[test]
    fn ut_gbr_010_missing_units_assume_millimeters() {
        let source = "%FSLAX34Y34*%\n%ADD10C,0.5*%\nD10*\nX20000Y10000D03*\nM02*\n";
        let result = parse(source.as_bytes());
        assert!(result.is_ok(), "{:?}", result.as_ref().err());
        let layer = result.unwrap_or_default();
        assert_eq!(
            layer.graphics.first(),
            Some(&Graphic::Flash {
                aperture: 10,
                at: Point::new(2.0, 1.0),
            })
        );
        assert!(layer
            .warnings
            .iter()
            .any(|warning| warning.contains("assuming millimeters")));
    }

    #[test]
    fn bc_gbr_001_empty_input_is_an_error() {
        assert!(matches!(parse(b""), Err(ParseError::Empty)));
    }

    #[test]
    fn bc_gbr_002_unknown_operation_code_is_a_syntax_error() {
        let source = format!("{HEADER}D10*\nD05*\nM02*\n");
        let result = parse(source.as_bytes());
        assert!(
            matches!(&result, Err(ParseError::Syntax(message)) if message.contains("D05")),
            "{result:?}"
        );
    }

    #[test]
    fn bc_gbr_003_selecting_an_undefined_aperture_fails() {
        let source = format!("{HEADER}D99*\nM02*\n");
        assert!(matches!(
            parse(source.as_bytes()),
            Err(ParseError::InvalidAperture(_))
        ));
    }

    #[test]
    fn bc_gbr_004_invalid_utf8_is_a_syntax_error() {
        assert!(matches!(
            parse(b"%FSLAX25Y25*%\n\xff\xfe\nM02*\n"),
            Err(ParseError::Syntax(_))
        ));
    }

    #[test]
    fn bc_gbr_005_coordinates_before_format_fail() {
        assert!(matches!(
            parse(b"%MOMM*%\n%ADD10C,1*%\nD10*\nX0Y0D03*\nM02*\n"),
            Err(ParseError::Syntax(_))
        ));
    }

    #[test]
    fn bc_gbr_006_flash_without_aperture_fails() {
        let source = format!("{HEADER}X0Y0D03*\nM02*\n");
        assert!(matches!(
            parse(source.as_bytes()),
            Err(ParseError::InvalidAperture(_))
        ));
    }
}

//! Aperture definitions and the pad/stroke sizes they imply.
//!
//! Parsed `%AD%` apertures are converted to millimeters here: non-finite
//! values are rejected and negative dimensions are made positive with a
//! warning.

use gerber_types::{Aperture, Circle, Polygon, Rectangular};

use crate::error::ParseError;

/// Footprint a flashed aperture leaves on the board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApertureExtent {
    /// Extent along X.
    pub width: f64,
    /// Extent along Y.
    pub height: f64,
    /// Rotation in degrees.
    pub angle: f64,
}

/// Rescales a parsed aperture by `scale` (file units to millimeters).
///
/// Macro references are kept as they are; their bodies are not evaluated.
///
/// # Errors
///
/// Returns [`ParseError::InvalidAperture`] for non-finite dimensions or
/// polygons outside three to twelve vertices.
pub fn scale_aperture(
    aperture: &Aperture,
    scale: f64,
    warnings: &mut Vec<String>,
) -> Result<Aperture, ParseError> {
    let mut dimension = |value: f64, label: &str| {
        normalize_dimension(warnings, value, label).map(|value| value * scale)
    };

    Ok(match aperture {
        Aperture::Circle(circle) => Aperture::Circle(Circle {
            diameter: dimension(circle.diameter, "circle diameter")?,
            hole_diameter: circle
                .hole_diameter
                .map(|hole| dimension(hole, "hole diameter"))
                .transpose()?,
        }),
        Aperture::Rectangle(rectangle) => {
            Aperture::Rectangle(scale_rectangular(rectangle, "rectangle", &mut dimension)?)
        }
        Aperture::Obround(rectangle) => {
            Aperture::Obround(scale_rectangular(rectangle, "obround", &mut dimension)?)
        }
        Aperture::Polygon(polygon) => {
            if !(3..=12).contains(&polygon.vertices) {
                return Err(ParseError::InvalidAperture(format!(
                    "polygon has {} vertices; expected 3 to 12",
                    polygon.vertices
                )));
            }
            if let Some(rotation) = polygon.rotation.filter(|rotation| !rotation.is_finite()) {
                return Err(ParseError::InvalidAperture(format!(
                    "polygon rotation must be finite, got {rotation}"
                )));
            }
            Aperture::Polygon(Polygon {
                diameter: dimension(polygon.diameter, "polygon diameter")?,
                vertices: polygon.vertices,
                rotation: polygon.rotation,
                hole_diameter: polygon
                    .hole_diameter
                    .map(|hole| dimension(hole, "hole diameter"))
                    .transpose()?,
            })
        }
        Aperture::Macro(name, args) => Aperture::Macro(name.clone(), args.clone()),
    })
}

fn scale_rectangular(
    rectangle: &Rectangular,
    shape: &str,
    dimension: &mut impl FnMut(f64, &str) -> Result<f64, ParseError>,
) -> Result<Rectangular, ParseError> {
    Ok(Rectangular {
        x: dimension(rectangle.x, &format!("{shape} width"))?,
        y: dimension(rectangle.y, &format!("{shape} height"))?,
        hole_diameter: rectangle
            .hole_diameter
            .map(|hole| dimension(hole, "hole diameter"))
            .transpose()?,
    })
}

fn normalize_dimension(
    warnings: &mut Vec<String>,
    value: f64,
    label: &str,
) -> Result<f64, ParseError> {
    if !value.is_finite() {
        return Err(ParseError::InvalidAperture(format!(
            "{label} must be finite, got {value}"
        )));
    }
    if value < 0.0 {
        warnings.push(format!(
            "{label} is negative ({value}); using absolute value"
        ));
        return Ok(value.abs());
    }
    Ok(value)
}

/// Pad footprint of a flashed aperture. Macro apertures report a zero size.
pub fn flash_extent(aperture: &Aperture) -> ApertureExtent {
    let (width, height, angle) = match aperture {
        Aperture::Circle(circle) => (circle.diameter, circle.diameter, 0.0),
        Aperture::Rectangle(rectangle) | Aperture::Obround(rectangle) => {
            (rectangle.x, rectangle.y, 0.0)
        }
        Aperture::Polygon(polygon) => (
            polygon.diameter,
            polygon.diameter,
            polygon.rotation.unwrap_or(0.0),
        ),
        Aperture::Macro(..) => (0.0, 0.0, 0.0),
    };
    ApertureExtent {
        width,
        height,
        angle,
    }
}

/// Width of the line an aperture draws.
///
/// Rectangular apertures draw with their narrower side.
pub fn stroke_width(aperture: &Aperture) -> f64 {
    match aperture {
        Aperture::Circle(circle) => circle.diameter,
        Aperture::Rectangle(rectangle) | Aperture::Obround(rectangle) => {
            rectangle.x.min(rectangle.y)
        }
        Aperture::Polygon(polygon) => polygon.diameter,
        Aperture::Macro(..) => 0.0,
    }
}

/// Diameter of a circular aperture, if it is one.
pub const fn circle_diameter(aperture: &Aperture) -> Option<f64> {
    match aperture {
        Aperture::Circle(circle) => Some(circle.diameter),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    fn scaled(aperture: &Aperture, scale: f64) -> Aperture {
        let mut warnings = Vec::new();
        let result = scale_aperture(aperture, scale, &mut warnings);
        assert!(result.is_ok(), "expected Ok, got {:?}", result.as_ref().err());
        result.unwrap_or_else(|_| Aperture::Circle(Circle::new(0.0)))
    }

    #[test]
    fn ut_apr_001_inch_circle_scales_to_millimeters() {
        let aperture = scaled(&Aperture::Circle(Circle::new(0.012)), 25.4);
        let extent = flash_extent(&aperture);
        assert_eq!(extent.width.to_string(), "0.3048");
        assert_eq!(extent.height.to_string(), "0.3048");
    }

    #[test]
    fn ut_apr_002_rectangle_extent_and_stroke_width() {
        let aperture = scaled(&Aperture::Rectangle(Rectangular::new(2.0, 1.0)), 1.0);
        let extent = flash_extent(&aperture);
        assert!((extent.width - 2.0).abs() < EPSILON);
        assert!((extent.height - 1.0).abs() < EPSILON);
        assert!((stroke_width(&aperture) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn ut_apr_003_polygon_keeps_rotation() {
        let polygon = Polygon::new(2.0, 6).with_rotation(30.0);
        let aperture = scaled(&Aperture::Polygon(polygon), 1.0);
        let extent = flash_extent(&aperture);
        assert!((extent.width - 2.0).abs() < EPSILON);
        assert!((extent.angle - 30.0).abs() < EPSILON);
    }

    #[test]
    fn ut_apr_004_macro_reference_has_no_extent() {
        let aperture = scaled(&Aperture::Macro("ROUNDRECT".into(), None), 25.4);
        assert!(matches!(aperture, Aperture::Macro(ref name, _) if name == "ROUNDRECT"));
        assert!((stroke_width(&aperture)).abs() < EPSILON);
        assert_eq!(circle_diameter(&aperture), None);
    }

    #[test]
    fn bc_apr_001_negative_dimension_uses_abs_with_warning() {
        let mut warnings = Vec::new();
        let rectangle = Aperture::Rectangle(Rectangular::new(-2.0, 1.0));
        let result = scale_aperture(&rectangle, 1.0, &mut warnings);
        assert!(result.is_ok());
        if let Ok(aperture) = result {
            assert!((flash_extent(&aperture).width - 2.0).abs() < EPSILON);
        }
        assert!(warnings.iter().any(|msg| msg.contains("negative")));
    }

    #[test]
    fn bc_apr_002_non_finite_dimension_is_an_error() {
        let mut warnings = Vec::new();
        let circle = Aperture::Circle(Circle::new(f64::NAN));
        assert!(matches!(
            scale_aperture(&circle, 1.0, &mut warnings),
            Err(ParseError::InvalidAperture(_))
        ));
    }

    #[test]
    fn bc_apr_003_degenerate_polygon_is_an_error() {
        let mut warnings = Vec::new();
        let polygon = Aperture::Polygon(Polygon::new(1.0, 2));
        assert!(scale_aperture(&polygon, 1.0, &mut warnings).is_err());
    }
}

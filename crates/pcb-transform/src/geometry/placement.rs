//! Placement of package-local geometry onto the board.
//!
//! A placement mirrors about the local Y axis, rotates counter-clockwise and
//! then translates to the component origin. Quarter turns are applied by
//! swapping coordinates so that placed values keep the exact sums a CAD tool
//! reports.

use super::types::Point;

/// Mirror, rotation and origin of a placed component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Component origin on the board.
    pub origin: Point,
    /// Counter-clockwise rotation in degrees.
    pub angle: f64,
    /// Whether the component is mirrored to the opposite side.
    pub mirror: bool,
}

impl Placement {
    /// Placement that leaves coordinates unchanged.
    pub const IDENTITY: Self = Self {
        origin: Point { x: 0.0, y: 0.0 },
        angle: 0.0,
        mirror: false,
    };

    /// Maps a package-local point onto the board.
    pub fn apply(&self, local: Point) -> Point {
        let x = if self.mirror { -local.x } else { local.x };
        let rotated = rotate(Point::new(x, local.y), self.angle);
        Point::new(self.origin.x + rotated.x, self.origin.y + rotated.y)
    }

    /// Board angle of a package-local rotation, normalized to `[0, 360)`.
    pub fn angle_of(&self, local_angle: f64) -> f64 {
        if self.mirror {
            normalize_degrees(self.angle - local_angle)
        } else {
            normalize_degrees(self.angle + local_angle)
        }
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Wraps an angle into `[0, 360)`; negative zero becomes zero.
pub fn normalize_degrees(angle: f64) -> f64 {
    angle.rem_euclid(360.0) + 0.0
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rotate(point: Point, angle: f64) -> Point {
    let turns = normalize_degrees(angle) / 90.0;
    if turns.fract().abs() < f64::EPSILON {
        return match turns as u8 {
            1 => Point::new(-point.y, point.x),
            2 => Point::new(-point.x, -point.y),
            3 => Point::new(point.y, -point.x),
            _ => point,
        };
    }

    let (sin, cos) = angle.to_radians().sin_cos();
    Point::new(
        point.x.mul_add(cos, -(point.y * sin)),
        point.x.mul_add(sin, point.y * cos),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn placement(x: f64, y: f64, angle: f64, mirror: bool) -> Placement {
        Placement {
            origin: Point::new(x, y),
            angle,
            mirror,
        }
    }

    #[test]
    fn quarter_turn_keeps_exact_sums() {
        let placed = placement(19.05, 10.4648, 90.0, false).apply(Point::new(0.3, 0.0));
        assert_eq!(placed.x.to_string(), "19.05");
        assert_eq!(placed.y.to_string(), "10.764800000000001");
    }

    #[test]
    fn half_turn_negates_both_axes() {
        let placed = placement(1.0, 1.0, 180.0, false).apply(Point::new(0.5, 0.25));
        assert!((placed.x - 0.5).abs() < EPSILON);
        assert!((placed.y - 0.75).abs() < EPSILON);
    }

    #[test]
    fn mirror_flips_local_x_before_rotation() {
        let placed = placement(0.0, 0.0, 0.0, true).apply(Point::new(2.0, 1.0));
        assert!((placed.x + 2.0).abs() < EPSILON);
        assert!((placed.y - 1.0).abs() < EPSILON);
    }

    #[test]
    fn arbitrary_angle_uses_trigonometry() {
        let placed = placement(0.0, 0.0, 45.0, false).apply(Point::new(1.0, 0.0));
        let half_sqrt2 = std::f64::consts::FRAC_1_SQRT_2;
        assert!((placed.x - half_sqrt2).abs() < EPSILON);
        assert!((placed.y - half_sqrt2).abs() < EPSILON);
    }

    #[test]
    fn angle_of_adds_or_subtracts_by_mirror() {
        assert!((placement(0.0, 0.0, 90.0, false).angle_of(90.0) - 180.0).abs() < EPSILON);
        assert!((placement(0.0, 0.0, 90.0, true).angle_of(180.0) - 270.0).abs() < EPSILON);
        assert!((placement(0.0, 0.0, 270.0, false).angle_of(90.0)).abs() < EPSILON);
    }

    #[test]
    fn normalize_degrees_drops_negative_zero() {
        let normalized = normalize_degrees(-0.0);
        assert!(normalized.is_sign_positive());
    }
}

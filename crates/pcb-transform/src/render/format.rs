//! Number formatting shared by the CSV and SVG writers.

/// Shortest decimal that reads back as `value`, never in exponent form.
///
/// Negative zero prints as `0`.
pub fn decimal(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}

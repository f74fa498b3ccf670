/// Renders a score with a mandatory fractional part: `8` becomes `8.0`,
/// `7.25` stays `7.25`.
pub fn score(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Renders a roster grade field, always one decimal place.
pub fn grade_field(value: f64) -> String {
    format!("{value:.1}")
}

/// Wrap an angle into `[-pi, pi]` via `atan2(sin, cos)`.
///
/// Recorded headings carry no normalization guarantee, so every angular
/// difference in the crate goes through this rather than raw subtraction.
pub fn wrap_angle(a: f64) -> f64 {
    a.sin().atan2(a.cos())
}

/// Shortest signed angular difference `a - b`, wrapped.
pub fn angle_diff(a: f64, b: f64) -> f64 {
    wrap_angle(a - b)
}

/// Linear interpolation between `a` and `b` at parameter `t`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

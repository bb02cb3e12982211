/// Clamp `value` into `0.0..=1.0`. NaN maps to `0.0`.
///
/// ```
/// # use kernel::utils::clamp_unit;
/// assert_eq!(clamp_unit(-0.2), 0.0);
/// assert_eq!(clamp_unit(0.4), 0.4);
/// assert_eq!(clamp_unit(3.0), 1.0);
/// assert_eq!(clamp_unit(f64::NAN), 0.0);
/// ```
#[inline]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Linear interpolation between two 8-bit channels, rounded half up.
#[inline]
pub fn lerp_channel(from: u8, to: u8, t: f64) -> u8 {
    let from = f64::from(from);
    let to = f64::from(to);
    // t is clamped by callers, so the result stays within 0..=255
    (from + (to - from) * t).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_channel() {
        assert_eq!(lerp_channel(239, 34, 0.0), 239);
        assert_eq!(lerp_channel(239, 34, 1.0), 34);
        // 239 - 205 * 0.5 = 136.5
        assert_eq!(lerp_channel(239, 34, 0.5), 137);
        assert_eq!(lerp_channel(0, 255, 0.5), 128);
    }

    #[test]
    fn test_clamp_unit_infinities() {
        assert_eq!(clamp_unit(f64::INFINITY), 1.0);
        assert_eq!(clamp_unit(f64::NEG_INFINITY), 0.0);
    }
}

//! Integer rescaling helpers.
//!
//! Slider samples are mapped onto discrete levels with 64-bit integer
//! arithmetic, so the result does not depend on float rounding and extreme
//! raw ranges cannot overflow.

/// `round(offset * out_span / in_span)` with ties rounded up.
///
/// `offset` must lie in `[0, in_span]` and `in_span` must be positive; the
/// result then lies in `[0, out_span]`.
#[inline]
pub fn rescale_round_half_up(offset: i64, in_span: i64, out_span: i64) -> i64 {
    debug_assert!(in_span > 0, "rescale: in_span must be > 0");
    debug_assert!(
        (0..=in_span).contains(&offset),
        "rescale: offset {offset} outside [0, {in_span}]"
    );
    let num = offset.saturating_mul(out_span).saturating_mul(2);
    (num.saturating_add(in_span)) / in_span.saturating_mul(2)
}

/// Map `raw` (already clamped to `[min, max]`) onto `[0, levels]`.
#[inline]
pub fn raw_to_level(raw: i32, min: i32, max: i32, levels: u32) -> u32 {
    let offset = i64::from(raw) - i64::from(min);
    let span = i64::from(max) - i64::from(min);
    let level = rescale_round_half_up(offset, span, i64::from(levels));
    // offset <= span, so level <= levels and fits in u32
    u32::try_from(level.clamp(0, i64::from(levels))).unwrap_or(levels)
}

/// One EMA step in raw units: `prev * (1 - alpha) + x * alpha`.
#[inline]
pub fn ema_step(prev: f64, x: i32, alpha: f32) -> f64 {
    let a = f64::from(alpha);
    prev.mul_add(1.0 - a, f64::from(x) * a)
}

/// Round an EMA accumulator back to a raw count inside `[min, max]`.
/// Non-finite values map to `min`.
#[inline]
pub fn quantize_raw(x: f64, min: i32, max: i32) -> i32 {
    if !x.is_finite() {
        return min;
    }
    let r = x.round().clamp(f64::from(min), f64::from(max));
    // clamped into the i32 range above
    r as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescale_rounds_half_up() {
        // 1/2 -> 1, 1/3 -> 0, 2/3 -> 1
        assert_eq!(rescale_round_half_up(1, 2, 1), 1);
        assert_eq!(rescale_round_half_up(1, 3, 1), 0);
        assert_eq!(rescale_round_half_up(2, 3, 1), 1);
        assert_eq!(rescale_round_half_up(0, 7, 100), 0);
        assert_eq!(rescale_round_half_up(7, 7, 100), 100);
    }

    #[test]
    fn raw_to_level_matches_volume_table() {
        assert_eq!(raw_to_level(0, 0, 4095, 100), 0);
        assert_eq!(raw_to_level(2048, 0, 4095, 100), 50);
        assert_eq!(raw_to_level(2070, 0, 4095, 100), 51);
        assert_eq!(raw_to_level(4095, 0, 4095, 100), 100);
    }

    #[test]
    fn raw_to_level_survives_extreme_ranges() {
        assert_eq!(raw_to_level(i32::MIN, i32::MIN, i32::MAX, 1000), 0);
        assert_eq!(raw_to_level(i32::MAX, i32::MIN, i32::MAX, 1000), 1000);
        assert_eq!(raw_to_level(0, i32::MIN, i32::MAX, 1000), 500);
    }

    #[test]
    fn ema_converges_toward_input() {
        let mut y = 0.0;
        for _ in 0..200 {
            y = ema_step(y, 1000, 0.1);
        }
        assert_eq!(quantize_raw(y, 0, 4095), 1000);
        assert_eq!(ema_step(123.0, 999, 1.0), 999.0);
    }

    #[test]
    fn quantize_clamps_and_rejects_nan() {
        assert_eq!(quantize_raw(f64::NAN, 10, 20), 10);
        assert_eq!(quantize_raw(25.4, 10, 20), 20);
        assert_eq!(quantize_raw(14.5, 10, 20), 15);
    }
}

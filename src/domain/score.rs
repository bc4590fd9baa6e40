/// Scoring: pure function from (captured cells, owned fraction before
/// the capture) to a score delta.
///
/// Base rate is 10 points per cell. At or below 80% owned the
/// multiplier is 1; above it the multiplier grows geometrically,
/// `4 ^ ((frac - 0.8) * 10)`, so a tight cut at 90% owned is worth
/// 4x per cell. The fraction is the one measured before the capture
/// applied, never after.

/// Points per captured cell before the multiplier.
pub const BASE_POINTS_PER_CELL: u32 = 10;

/// Owned fraction above which the geometric multiplier kicks in.
/// Also the level win threshold.
pub const SURGE_THRESHOLD: f64 = 0.8;

pub fn capture_score(captured: usize, owned_before: f64) -> u32 {
    let multiplier = if owned_before <= SURGE_THRESHOLD {
        1.0
    } else {
        4.0_f64.powf((owned_before - SURGE_THRESHOLD) * 10.0)
    };
    let raw = captured as f64 * f64::from(BASE_POINTS_PER_CELL) * multiplier;
    // Epsilon before the floor so binary rounding of the fraction
    // cannot drop a whole point (0.85 - 0.8 is not exact in f64).
    (raw + 1e-9).floor() as u32
}

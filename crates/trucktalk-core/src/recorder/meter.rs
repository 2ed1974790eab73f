//! Audio level for UI feedback.

/// Scale mapping mean sample magnitude onto the 0..=100 range.
///
/// Speech at a comfortable microphone distance has a mean magnitude around
/// 0.05–0.2, so full scale is reached well before clipping.
const LEVEL_SCALE: f32 = 400.0;

/// Mean magnitude of `samples` scaled to 0..=100 and clamped.
///
/// Purely cosmetic; has no effect on what gets encoded.
pub fn level_from_samples(samples: &[f32]) -> u8 {
    if samples.is_empty() {
        return 0;
    }
    let mean = samples.iter().map(|s| s.abs()).sum::<f32>() / samples.len() as f32;
    (mean * LEVEL_SCALE).clamp(0.0, 100.0) as u8
}

use serde::{Deserialize, Serialize};

use crate::policy::RatioWeight;

/// Neutral score returned for missing or NaN inputs.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Points per reference standard deviation.
const POINTS_PER_STD: f64 = 15.0;

/// Closed interval a normalized score is clipped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipRange {
    pub lo: f64,
    pub hi: f64,
}

impl ClipRange {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// Clip into `[lo, hi]`. Never panics, unlike `f64::clamp`.
    pub fn apply(&self, score: f64) -> f64 {
        score.min(self.hi).max(self.lo)
    }
}

impl Default for ClipRange {
    fn default() -> Self {
        Self::new(0.0, 100.0)
    }
}

/// Map a raw ratio onto a 0-100 health score around a reference `(mean, std)`.
///
/// `score = 50 + 15 * (value - mean) / std`, flipped to `100 - score` when
/// `invert` is set, then clipped. Missing and NaN values score exactly 50.
pub fn normalize(value: Option<f64>, mean: f64, std: f64, invert: bool, clip: ClipRange) -> f64 {
    let value = match value {
        Some(v) if !v.is_nan() => v,
        _ => return NEUTRAL_SCORE,
    };

    let mut score = 50.0 + POINTS_PER_STD * (value - mean) / std;
    if invert {
        score = 100.0 - score;
    }
    clip.apply(score)
}

/// Normalize against one policy row's reference distribution.
pub fn normalize_with(value: f64, rule: &RatioWeight) -> f64 {
    normalize(Some(value), rule.mean, rule.std, rule.invert, ClipRange::default())
}

//! Modifier composition.
//!
//! Two rules govern how modifiers combine:
//! - Independent percentage modifiers multiply directly (1.0 is neutral).
//! - Gear ratings of one category are summed raw first and pass through the
//!   rating curve once. Post-curve percentages are never multiplied together.

use serde::{Deserialize, Serialize};

/// Multiplies a chain of independent percentage modifiers.
#[must_use]
pub fn chain<I: IntoIterator<Item = f32>>(mods: I) -> f32 {
    mods.into_iter().product()
}

/// Sums same-category ratings at the raw-rating level.
///
/// Negative contributions are ignored.
#[must_use]
pub fn additive_combine<I: IntoIterator<Item = f32>>(ratings: I) -> f32 {
    ratings.into_iter().map(|r| r.max(0.0)).sum()
}

/// Diminishing-returns curve for gear ratings.
///
/// Implementations must be monotonic increasing in the rating, bounded, and
/// neutral (1.0) at rating 0.
pub trait RatingCurve: Send + Sync {
    /// Damage-increasing multiplier for a summed rating.
    fn offense(&self, rating: f32) -> f32;

    /// Damage-reducing multiplier for a summed rating.
    fn defense(&self, rating: f32) -> f32 {
        1.0 / self.offense(rating)
    }
}

/// Hyperbolic rating curve: `1 + cap * r / (r + half)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiminishingRatingCurve {
    /// Asymptotic bonus as a fraction (1.0 = +100%).
    pub cap: f32,
    /// Rating at which half of the cap is reached.
    pub half: f32,
}

impl Default for DiminishingRatingCurve {
    fn default() -> Self {
        Self {
            cap: 1.0,
            half: 100.0,
        }
    }
}

impl RatingCurve for DiminishingRatingCurve {
    fn offense(&self, rating: f32) -> f32 {
        if rating <= 0.0 || self.half <= 0.0 {
            return 1.0;
        }
        1.0 + self.cap * rating / (rating + self.half)
    }
}

/// Parameters of a ramping percentage bonus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampParams {
    /// Bonus granted by any positive rating.
    pub base: f32,
    /// Extra bonus per rating point.
    pub per_rating: f32,
    /// Accumulated progress needed for the full bonus.
    pub ramp_cap: f32,
}

impl RampParams {
    /// Creates new ramp parameters.
    #[must_use]
    pub const fn new(base: f32, per_rating: f32, ramp_cap: f32) -> Self {
        Self {
            base,
            per_rating,
            ramp_cap,
        }
    }
}

/// `ramp(progress) * (base + per_rating * rating)`, zero without a rating.
///
/// The ramp is `progress / ramp_cap` clamped to `[0, 1]`; a non-positive cap
/// counts as fully ramped.
#[must_use]
pub fn ramping_bonus(params: RampParams, rating: f32, progress: f32) -> f32 {
    if rating <= 0.0 {
        return 0.0;
    }
    let ramp = if params.ramp_cap <= 0.0 {
        1.0
    } else {
        (progress / params.ramp_cap).clamp(0.0, 1.0)
    };
    ramp * (params.base + params.per_rating * rating)
}

/// Clamps `value` to the sign of `reference`: `>= 0` when the reference is
/// non-negative, `<= 0` otherwise.
#[must_use]
pub fn clamp_sign(value: f32, reference: f32) -> f32 {
    if reference >= 0.0 {
        value.max(0.0)
    } else {
        value.min(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_chain_neutral() {
        assert_eq!(chain(Vec::<f32>::new()), 1.0);
        assert!((chain([1.2, 0.5, 2.0]) - 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_same_category_ratings_pass_curve_once() {
        let curve = DiminishingRatingCurve::default();
        let combined = curve.offense(additive_combine([50.0, 50.0]));
        let stacked = curve.offense(50.0) * curve.offense(50.0);

        assert!((combined - 1.5).abs() < 1e-6);
        assert!(combined < stacked);
    }

    #[test]
    fn test_curve_neutral_at_zero() {
        let curve = DiminishingRatingCurve::default();
        assert_eq!(curve.offense(0.0), 1.0);
        assert_eq!(curve.defense(0.0), 1.0);
        assert_eq!(curve.offense(-20.0), 1.0);
    }

    #[test]
    fn test_ramping_bonus() {
        let params = RampParams::new(0.05, 0.01, 100.0);
        assert_eq!(ramping_bonus(params, 0.0, 100.0), 0.0);
        assert!((ramping_bonus(params, 5.0, 100.0) - 0.10).abs() < 1e-6);
        assert!((ramping_bonus(params, 5.0, 50.0) - 0.05).abs() < 1e-6);
        assert!((ramping_bonus(params, 5.0, 500.0) - 0.10).abs() < 1e-6);
    }

    #[test]
    fn test_clamp_sign() {
        assert_eq!(clamp_sign(-3.0, 10.0), 0.0);
        assert_eq!(clamp_sign(3.0, -10.0), 0.0);
        assert_eq!(clamp_sign(-3.0, -10.0), -3.0);
    }

    proptest! {
        #[test]
        fn curve_monotonic_and_capped(a in 0.0f32..10_000.0, b in 0.0f32..10_000.0) {
            let curve = DiminishingRatingCurve::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(curve.offense(lo) <= curve.offense(hi) + 1e-6);
            prop_assert!(curve.offense(hi) <= 1.0 + curve.cap + 1e-6);
            prop_assert!(curve.defense(hi) > 0.0 && curve.defense(hi) <= 1.0);
        }
    }
}

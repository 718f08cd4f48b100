//! Balance ratios derived from calibrated corner weights.
//!
//! All ratios are percentages centered on 50.0 ("evenly balanced"). Below 50
//! biases toward left/top, above 50 toward right/bottom.

use serde::Serialize;

use crate::types::CornerWeights;

/// Ratio value meaning "evenly balanced".
pub const NEUTRAL: f32 = 50.0;

/// Per-tick balance ratios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BalanceRatios {
    pub percent_top_left: f32,
    pub percent_top_right: f32,
    pub percent_bottom_left: f32,
    pub percent_bottom_right: f32,

    /// Share of weight on the right-hand corners.
    pub balance_x: f32,

    /// Share of weight on the bottom corners only. The top corners do not
    /// enter this axis.
    pub balance_y: f32,

    /// Share on the bottom-left/top-right diagonal.
    pub diagonal_left: f32,

    /// Share on the bottom-right/top-left diagonal.
    pub diagonal_right: f32,

    /// `|diagonal_left - diagonal_right|`.
    pub diagonal_delta: f32,
}

impl Default for BalanceRatios {
    fn default() -> Self {
        Self::neutral()
    }
}

impl BalanceRatios {
    /// Ratios of an empty platform: zero percentages, neutral balance.
    pub fn neutral() -> Self {
        Self {
            percent_top_left: 0.0,
            percent_top_right: 0.0,
            percent_bottom_left: 0.0,
            percent_bottom_right: 0.0,
            balance_x: NEUTRAL,
            balance_y: NEUTRAL,
            diagonal_left: NEUTRAL,
            diagonal_right: NEUTRAL,
            diagonal_delta: 0.0,
        }
    }

    /// Compute ratios from calibrated corners.
    ///
    /// A non-positive corner sum (including the all-zero corners of an
    /// unoccupied platform) yields [`BalanceRatios::neutral`] instead of
    /// dividing by zero.
    pub fn from_corners(corners: &CornerWeights) -> Self {
        let sum = corners.sum();
        if !(sum > 0.0) || !sum.is_finite() {
            return Self::neutral();
        }

        let scale = 100.0 / sum;
        let tl = scale * corners.top_left;
        let tr = scale * corners.top_right;
        let bl = scale * corners.bottom_left;
        let br = scale * corners.bottom_right;

        let diagonal_left = scale * (corners.bottom_left + corners.top_right);
        let diagonal_right = scale * (corners.bottom_right + corners.top_left);

        let ratios = Self {
            percent_top_left: tl,
            percent_top_right: tr,
            percent_bottom_left: bl,
            percent_bottom_right: br,
            balance_x: br + tr,
            balance_y: br + bl,
            diagonal_left,
            diagonal_right,
            diagonal_delta: (diagonal_left - diagonal_right).abs(),
        };

        // Subnormal sums can still overflow the scale.
        if ratios.balance_x.is_finite() && ratios.balance_y.is_finite() && ratios.diagonal_delta.is_finite() {
            ratios
        } else {
            Self::neutral()
        }
    }

    pub fn percent_sum(&self) -> f32 {
        self.percent_top_left + self.percent_top_right + self.percent_bottom_left + self.percent_bottom_right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_even_load_is_neutral() {
        let r = BalanceRatios::from_corners(&CornerWeights::new(20.0, 20.0, 20.0, 20.0));
        assert!(approx(r.percent_top_left, 25.0));
        assert!(approx(r.balance_x, 50.0));
        assert!(approx(r.balance_y, 50.0));
        assert!(approx(r.diagonal_delta, 0.0));
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let samples = [
            CornerWeights::new(12.0, 30.0, 7.5, 21.0),
            CornerWeights::new(0.0, 0.0, 0.0, 80.0),
            CornerWeights::new(0.001, 55.0, 3.0, 0.5),
        ];
        for corners in samples {
            let r = BalanceRatios::from_corners(&corners);
            assert!(approx(r.percent_sum(), 100.0), "sum was {}", r.percent_sum());
        }
    }

    #[test]
    fn test_right_lean_raises_balance_x() {
        let r = BalanceRatios::from_corners(&CornerWeights::new(5.0, 35.0, 5.0, 35.0));
        assert!(approx(r.balance_x, 87.5));
        assert!(approx(r.balance_y, 50.0));
    }

    #[test]
    fn test_balance_y_uses_bottom_corners_only() {
        // Reproduced asymmetry: balance_x mixes right corners, balance_y is
        // the bottom pair alone.
        let r = BalanceRatios::from_corners(&CornerWeights::new(10.0, 10.0, 30.0, 50.0));
        assert!(approx(r.balance_y, r.percent_bottom_left + r.percent_bottom_right));
        assert!(approx(r.balance_y, 80.0));
        assert!(approx(r.balance_x, 60.0));
    }

    #[test]
    fn test_diagonals() {
        let r = BalanceRatios::from_corners(&CornerWeights::new(10.0, 30.0, 30.0, 30.0));
        // left diagonal = BL + TR = 60 of 100
        assert!(approx(r.diagonal_left, 60.0));
        assert!(approx(r.diagonal_right, 40.0));
        assert!(approx(r.diagonal_delta, 20.0));
    }

    #[test]
    fn test_zero_corners_are_neutral_not_nan() {
        let r = BalanceRatios::from_corners(&CornerWeights::zero());
        assert_eq!(r, BalanceRatios::neutral());
        assert_eq!(r.percent_top_left, 0.0);
        assert_eq!(r.percent_bottom_right, 0.0);
        assert_eq!(r.balance_x, NEUTRAL);
        assert_eq!(r.balance_y, NEUTRAL);
    }

    #[test]
    fn test_tiny_sum_never_produces_nan() {
        let r = BalanceRatios::from_corners(&CornerWeights::new(1e-44, 0.0, 0.0, 0.0));
        assert!(r.balance_x.is_finite());
        assert!(r.balance_y.is_finite());
    }
}

//! Analog turning from balance ratios.
//!
//! Maps a balance value centered on 50 to a bounded turn rate through a
//! symmetric dead zone followed by a logistic saturation curve:
//!
//! ```text
//! v > 50 + dz:  max * 2 * (1 / (1 + speed^(50 - v + dz)) - 0.5)
//! v < 50 - dz:  max * 2 * (1 / (1 + speed^(50 - v - dz)) - 0.5)
//! otherwise:    0
//! ```
//!
//! The curve starts at 0 on the edge of the dead zone and approaches `max`
//! asymptotically, so the output magnitude is always below `|max|`.
//! A negative `max` inverts the direction.

use serde::{Deserialize, Serialize};

use crate::config::FeatureToggles;
use crate::ratios::BalanceRatios;
use crate::smoothing::{SmoothingConfig, SmoothingWindow};
use crate::types::TurnIntensity;

/// One response curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnProfile {
    /// Half-width of the neutral band around 50, in ratio points.
    pub dead_zone: f32,
    /// Base of the exponential; larger means a steeper ramp.
    pub speed: f32,
    /// Output bound. Sign selects direction.
    pub max: f32,
}

impl TurnProfile {
    pub const fn new(dead_zone: f32, speed: f32, max: f32) -> Self {
        Self {
            dead_zone,
            speed,
            max,
        }
    }

    /// Turn rate for a balance value, truncated toward zero.
    pub fn response(&self, value: f32) -> i32 {
        let v = value as f64;
        let dz = self.dead_zone as f64;
        let exponent = if v > 50.0 + dz {
            50.0 - v + dz
        } else if v < 50.0 - dz {
            50.0 - v - dz
        } else {
            return 0;
        };

        let speed = self.speed as f64;
        let logistic = 1.0 / (1.0 + speed.powf(exponent));
        (self.max as f64 * 2.0 * (logistic - 0.5)) as i32
    }
}

/// Standing and moving curves for one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnChannelConfig {
    /// Used while idle: narrower dead zone, lower cap.
    pub standing: TurnProfile,
    /// Used while walking or sprinting: wider dead zone, higher cap.
    pub moving: TurnProfile,
}

impl TurnChannelConfig {
    pub fn profile(&self, moving: bool) -> &TurnProfile {
        if moving {
            &self.moving
        } else {
            &self.standing
        }
    }
}

/// Turn curves for both channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnConfig {
    /// Left/right turning, driven by `balance_x`.
    pub horizontal: TurnChannelConfig,
    /// Forward/back channel, driven by `balance_y`.
    pub vertical: TurnChannelConfig,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            horizontal: TurnChannelConfig {
                standing: TurnProfile::new(17.0, 1.15, 8.0),
                moving: TurnProfile::new(20.0, 1.25, 15.0),
            },
            vertical: TurnChannelConfig {
                standing: TurnProfile::new(9.0, 1.05, -4.0),
                moving: TurnProfile::new(25.0, 1.05, -2.0),
            },
        }
    }
}

/// Smoothing windows feeding the two turn channels.
#[derive(Debug, Clone)]
pub struct TurnState {
    horizontal: SmoothingWindow,
    vertical: SmoothingWindow,
}

impl TurnState {
    pub fn new(config: &SmoothingConfig) -> Self {
        Self {
            horizontal: SmoothingWindow::new(config.horizontal_capacity),
            vertical: SmoothingWindow::new(config.vertical_capacity),
        }
    }

    /// Rebuild the windows if their capacities changed.
    pub fn resize(&mut self, config: &SmoothingConfig) {
        if self.horizontal.capacity() != SmoothingWindow::clamp_capacity(config.horizontal_capacity) {
            self.horizontal = SmoothingWindow::new(config.horizontal_capacity);
        }
        if self.vertical.capacity() != SmoothingWindow::clamp_capacity(config.vertical_capacity) {
            self.vertical = SmoothingWindow::new(config.vertical_capacity);
        }
    }

    pub fn horizontal(&self) -> &SmoothingWindow {
        &self.horizontal
    }

    pub fn vertical(&self) -> &SmoothingWindow {
        &self.vertical
    }

    pub fn clear(&mut self) {
        self.horizontal.clear();
        self.vertical.clear();
    }

    /// Push this tick's ratios and compute turn rates.
    ///
    /// Returns `None` when both channels are disabled. A disabled channel
    /// neither accumulates samples nor turns.
    pub fn update(
        &mut self,
        ratios: &BalanceRatios,
        moving: bool,
        config: &TurnConfig,
        smoothing: &SmoothingConfig,
        features: &FeatureToggles,
    ) -> Option<TurnIntensity> {
        if !features.turning && !features.turning_vertical {
            return None;
        }

        let use_average = moving || smoothing.smooth_while_standing;
        let mut intensity = TurnIntensity::default();

        if features.turning {
            intensity.horizontal = channel(
                &mut self.horizontal,
                ratios.balance_x,
                use_average,
                config.horizontal.profile(moving),
            );
        }
        if features.turning_vertical {
            intensity.vertical = channel(
                &mut self.vertical,
                ratios.balance_y,
                use_average,
                config.vertical.profile(moving),
            );
        }

        Some(intensity)
    }
}

fn channel(window: &mut SmoothingWindow, value: f32, use_average: bool, profile: &TurnProfile) -> i32 {
    window.push(value);
    let input = if use_average {
        window.average().unwrap_or(value)
    } else {
        value
    };
    profile.response(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratios::NEUTRAL;

    fn ratios(balance_x: f32, balance_y: f32) -> BalanceRatios {
        BalanceRatios {
            balance_x,
            balance_y,
            ..BalanceRatios::neutral()
        }
    }

    #[test]
    fn test_dead_zone_is_exactly_zero() {
        let profile = TurnProfile::new(17.0, 1.15, 8.0);
        let mut v = 33.0;
        while v <= 67.0 {
            assert_eq!(profile.response(v), 0, "v = {}", v);
            v += 0.25;
        }
    }

    #[test]
    fn test_known_values() {
        let profile = TurnProfile::new(17.0, 1.15, 8.0);
        // 1 / (1 + 1.15^-33) ~= 0.990, 16 * 0.490 ~= 7.84
        assert_eq!(profile.response(100.0), 7);
        assert_eq!(profile.response(0.0), -7);
    }

    #[test]
    fn test_monotonic_and_bounded() {
        let profile = TurnProfile::new(20.0, 1.25, 15.0);
        let mut previous = 0;
        let mut v = 70.0;
        while v <= 100.0 {
            let out = profile.response(v);
            assert!(out >= previous, "not monotonic at {}", v);
            assert!(out.abs() < 15);
            previous = out;
            v += 0.5;
        }

        let mut previous = 0;
        let mut v = 30.0;
        while v >= 0.0 {
            let out = profile.response(v);
            assert!(out <= previous, "not monotonic at {}", v);
            assert!(out.abs() < 15);
            previous = out;
            v -= 0.5;
        }
    }

    #[test]
    fn test_negative_max_inverts_direction() {
        let profile = TurnProfile::new(9.0, 1.05, -4.0);
        assert!(profile.response(100.0) < 0);
        assert!(profile.response(0.0) > 0);
    }

    #[test]
    fn test_profile_selection() {
        let config = TurnConfig::default();
        assert_eq!(config.horizontal.profile(false).dead_zone, 17.0);
        assert_eq!(config.horizontal.profile(true).dead_zone, 20.0);
    }

    #[test]
    fn test_update_disabled_returns_none() {
        let mut state = TurnState::new(&SmoothingConfig::default());
        let features = FeatureToggles {
            turning: false,
            turning_vertical: false,
            ..FeatureToggles::default()
        };
        let out = state.update(
            &ratios(90.0, 50.0),
            false,
            &TurnConfig::default(),
            &SmoothingConfig::default(),
            &features,
        );
        assert_eq!(out, None);
        assert!(state.horizontal().is_empty());
    }

    #[test]
    fn test_smoothing_delays_standing_turn() {
        let smoothing = SmoothingConfig::default();
        let config = TurnConfig::default();
        let features = FeatureToggles::default();
        let mut state = TurnState::new(&smoothing);

        for _ in 0..12 {
            state.update(&ratios(NEUTRAL, NEUTRAL), false, &config, &smoothing, &features);
        }
        // One hard lean is averaged down into the dead zone.
        let out = state
            .update(&ratios(100.0, NEUTRAL), false, &config, &smoothing, &features)
            .unwrap();
        assert_eq!(out.horizontal, 0);
    }

    #[test]
    fn test_instant_standing_turn_when_unsmoothed() {
        let smoothing = SmoothingConfig {
            smooth_while_standing: false,
            ..SmoothingConfig::default()
        };
        let config = TurnConfig::default();
        let features = FeatureToggles::default();
        let mut state = TurnState::new(&smoothing);

        for _ in 0..12 {
            state.update(&ratios(NEUTRAL, NEUTRAL), false, &config, &smoothing, &features);
        }
        let out = state
            .update(&ratios(100.0, NEUTRAL), false, &config, &smoothing, &features)
            .unwrap();
        assert_eq!(out.horizontal, 7);

        // Moving always reads the average, which is still near neutral.
        let out = state
            .update(&ratios(100.0, NEUTRAL), true, &config, &smoothing, &features)
            .unwrap();
        assert_eq!(out.horizontal, 0);
    }

    #[test]
    fn test_sustained_lean_turns() {
        let smoothing = SmoothingConfig::default();
        let config = TurnConfig::default();
        let features = FeatureToggles::default();
        let mut state = TurnState::new(&smoothing);

        let mut out = TurnIntensity::default();
        for _ in 0..20 {
            out = state
                .update(&ratios(95.0, 20.0), false, &config, &smoothing, &features)
                .unwrap();
        }
        assert!(out.horizontal > 0);
        // Vertical standing max is negative: leaning toward the top turns positive.
        assert!(out.vertical > 0);
    }

    #[test]
    fn test_resize_rebuilds_changed_windows() {
        let mut smoothing = SmoothingConfig::default();
        let mut state = TurnState::new(&smoothing);
        state.update(
            &ratios(60.0, 60.0),
            false,
            &TurnConfig::default(),
            &smoothing,
            &FeatureToggles::default(),
        );

        smoothing.horizontal_capacity = 4;
        state.resize(&smoothing);
        assert_eq!(state.horizontal().capacity(), 4);
        assert!(state.horizontal().is_empty());
        // Unchanged window keeps its history.
        assert_eq!(state.vertical().len(), 1);
    }
}

//! Engine configuration.
//!
//! Bundles every sub-component configuration into one [`EngineConfig`] that
//! is supplied at construction and may be replaced at runtime. Defaults are
//! tuned for an 18 ms tick: 5 kg in-use threshold, 0.6 s max airtime and
//! 12/15 sample smoothing.
//!
//! Configurations deserialize with `#[serde(default)]` at every level, so a
//! JSON file only needs to mention the values it changes. Every path into the
//! engine runs [`EngineConfig::validate`] first; nothing is checked mid-tick.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationConfig;
use crate::error::ConfigError;
use crate::gait::GaitConfig;
use crate::jump::JumpConfig;
use crate::smoothing::{SmoothingConfig, MAX_CAPACITY};
use crate::turn::{TurnConfig, TurnProfile};

/// Balance-ratio trigger thresholds, as distances from the neutral 50.
///
/// A trigger of 15 means the left action fires once `balance_x` drops
/// below 35, the right action once it rises above 65.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Left/right lean trigger. Also decides which foot carries the weight
    /// for gait detection.
    pub left_right: f32,
    /// Forward/backward lean trigger on `balance_y`.
    pub forward_backward: f32,
    /// Modifier trigger on `balance_x`.
    pub modifier_left_right: f32,
    /// Modifier trigger on `balance_y`.
    pub modifier_forward_backward: f32,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            left_right: 15.0,
            forward_backward: 15.0,
            modifier_left_right: 35.0,
            modifier_forward_backward: 35.0,
        }
    }
}

/// Runtime feature switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureToggles {
    pub walking: bool,
    pub sprinting: bool,
    pub turning: bool,
    pub turning_vertical: bool,
    pub jumping: bool,
    /// Threshold lean actions (left/right/forward/backward/modifier).
    pub leaning: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            walking: true,
            sprinting: true,
            turning: true,
            turning_vertical: true,
            jumping: true,
            leaning: false,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub triggers: TriggerConfig,
    pub calibration: CalibrationConfig,
    pub gait: GaitConfig,
    pub jump: JumpConfig,
    pub turn: TurnConfig,
    pub smoothing: SmoothingConfig,
    pub features: FeatureToggles,
}

impl EngineConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&content)?;
        log::info!("loaded engine configuration from {}", path.display());
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would make a tick ill-defined.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.triggers;
        trigger("triggers.left_right", t.left_right)?;
        trigger("triggers.forward_backward", t.forward_backward)?;
        trigger("triggers.modifier_left_right", t.modifier_left_right)?;
        trigger("triggers.modifier_forward_backward", t.modifier_forward_backward)?;

        non_negative("calibration.in_use_threshold_kg", self.calibration.in_use_threshold_kg)?;
        non_negative("jump.off_board_threshold_kg", self.jump.off_board_threshold_kg)?;

        let turn = &self.turn;
        profile(
            [
                "turn.horizontal.standing.dead_zone",
                "turn.horizontal.standing.speed",
                "turn.horizontal.standing.max",
            ],
            &turn.horizontal.standing,
        )?;
        profile(
            [
                "turn.horizontal.moving.dead_zone",
                "turn.horizontal.moving.speed",
                "turn.horizontal.moving.max",
            ],
            &turn.horizontal.moving,
        )?;
        profile(
            [
                "turn.vertical.standing.dead_zone",
                "turn.vertical.standing.speed",
                "turn.vertical.standing.max",
            ],
            &turn.vertical.standing,
        )?;
        profile(
            [
                "turn.vertical.moving.dead_zone",
                "turn.vertical.moving.speed",
                "turn.vertical.moving.max",
            ],
            &turn.vertical.moving,
        )?;

        capacity("smoothing.horizontal_capacity", self.smoothing.horizontal_capacity)?;
        capacity("smoothing.vertical_capacity", self.smoothing.vertical_capacity)?;

        Ok(())
    }
}

fn finite(field: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if finite(field, value)? < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}

fn capacity(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::ZeroCapacity { field });
    }
    if value > MAX_CAPACITY {
        return Err(ConfigError::CapacityTooLarge {
            field,
            value,
            max: MAX_CAPACITY,
        });
    }
    Ok(())
}

fn trigger(field: &'static str, value: f32) -> Result<(), ConfigError> {
    non_negative(field, value)?;
    if value > 50.0 {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: 50.0,
        });
    }
    Ok(())
}

fn profile(fields: [&'static str; 3], p: &TurnProfile) -> Result<(), ConfigError> {
    let [dz, speed, max] = fields;
    if !(0.0..50.0).contains(&finite(dz, p.dead_zone)?) {
        return Err(ConfigError::OutOfRange {
            field: dz,
            value: p.dead_zone,
            min: 0.0,
            max: 50.0,
        });
    }
    if finite(speed, p.speed)? <= 0.0 {
        return Err(ConfigError::NotPositive {
            field: speed,
            value: p.speed,
        });
    }
    finite(max, p.max)?;
    Ok(())
}

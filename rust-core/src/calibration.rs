//! Floor correction and center-of-mass calibration.
//!
//! This module turns raw corner readings into calibrated corner weights:
//! - Running-floor correction against sensor reference drift
//! - Center-of-mass offsets captured on request
//! - An in-use gate that zeroes the corners of an unoccupied platform
//!
//! Design note: All updates are incremental (O(1) per frame). Nothing is
//! applied retroactively; each frame is corrected with the state as it
//! stands after that frame's own floor update.
//!
//! Why this matters:
//! Lifting or bumping the board makes the load cells report negative weight
//! for a while. Without the floor, those spikes read as a strong lean and
//! fire turn and gait actions on their own.

use serde::{Deserialize, Serialize};

use crate::types::{CalibratedFrame, CornerWeights, SensorFrame};

/// Parameters for calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Total weight (kg) above which the platform counts as occupied.
    /// Below it every calibrated corner is forced to zero.
    /// Typical: 5 kg, comfortably above offset jitter.
    pub in_use_threshold_kg: f32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            in_use_threshold_kg: 5.0,
        }
    }
}

/// Calibration state owned by the pipeline for the session lifetime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationState {
    /// Lowest raw corner reading seen since the last zero. Never increases
    /// except on reset.
    floor_offset: f32,

    /// Per-corner offsets that make the captured stance read as balanced.
    center_offset: CornerWeights,

    /// A center capture was requested and will run on the next frame.
    centering_armed: bool,

    /// Center offsets have been captured and are applied to readings.
    centering_active: bool,

    /// A zero was requested and will run at the start of the next frame.
    zero_armed: bool,
}

impl CalibrationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for the current stance to become the balanced center.
    ///
    /// Consumed on the next frame. Repeating the request before then has no
    /// further effect.
    pub fn request_center_capture(&mut self) {
        self.centering_armed = true;
    }

    /// Ask for floor and center offsets to be cleared on the next frame.
    pub fn request_zero(&mut self) {
        self.zero_armed = true;
    }

    /// Clear floor and center offsets immediately.
    pub fn reset(&mut self) {
        self.floor_offset = 0.0;
        self.center_offset = CornerWeights::zero();
        self.centering_active = false;
        self.zero_armed = false;
    }

    pub fn floor_offset(&self) -> f32 {
        self.floor_offset
    }

    pub fn center_offset(&self) -> CornerWeights {
        self.center_offset
    }

    pub fn is_centering_active(&self) -> bool {
        self.centering_active
    }

    pub fn is_centering_armed(&self) -> bool {
        self.centering_armed
    }

    pub fn is_zero_armed(&self) -> bool {
        self.zero_armed
    }

    /// Calibrate one frame, consuming any pending requests.
    pub fn apply(&mut self, frame: &SensorFrame, config: &CalibrationConfig) -> CalibratedFrame {
        if self.zero_armed {
            log::info!("calibration zeroed (floor was {:.2} kg)", self.floor_offset);
            self.reset();
        }

        // Floor only ever moves down.
        let lowest = frame.corners.min();
        if lowest < self.floor_offset {
            log::debug!("floor offset lowered {:.2} -> {:.2} kg", self.floor_offset, lowest);
            self.floor_offset = lowest;
        }
        let floor = self.floor_offset;
        let corrected = frame.corners.map(|w| w - floor);

        // Lifting the board produces negative totals that would break the
        // in-use and off-board checks.
        let total_kg = frame.total_kg.max(0.0);

        if self.centering_armed {
            self.capture_center(&corrected);
        }

        let in_use = total_kg > config.in_use_threshold_kg;
        let corners = if !in_use {
            CornerWeights::zero()
        } else if self.centering_active {
            corrected.zip_with(self.center_offset, |w, offset| w + offset)
        } else {
            corrected
        };

        CalibratedFrame {
            timestamp_ms: frame.timestamp_ms,
            corners,
            total_kg,
            in_use,
        }
    }

    fn capture_center(&mut self, corrected: &CornerWeights) {
        let highest = corrected.max();
        self.center_offset = corrected.map(|w| highest - w);
        self.centering_armed = false;
        self.centering_active = true;
        log::info!(
            "center captured: offsets tl={:.2} tr={:.2} bl={:.2} br={:.2}",
            self.center_offset.top_left,
            self.center_offset.top_right,
            self.center_offset.bottom_left,
            self.center_offset.bottom_right,
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Corner;

    fn apply(state: &mut CalibrationState, t: u64, tl: f32, tr: f32, bl: f32, br: f32) -> CalibratedFrame {
        state.apply(&SensorFrame::new(t, tl, tr, bl, br), &CalibrationConfig::default())
    }

    #[test]
    fn test_fresh_state_passes_readings_through() {
        let mut state = CalibrationState::new();
        let out = apply(&mut state, 0, 10.0, 12.0, 14.0, 16.0);

        assert!(out.in_use);
        assert_eq!(out.corners, CornerWeights::new(10.0, 12.0, 14.0, 16.0));
        assert_eq!(out.total_kg, 52.0);
        assert_eq!(state.floor_offset(), 0.0);
    }

    #[test]
    fn test_floor_tracks_lowest_corner() {
        let mut state = CalibrationState::new();
        apply(&mut state, 0, -0.5, 0.2, 0.1, 0.0);
        assert_eq!(state.floor_offset(), -0.5);

        // Higher readings never raise the floor.
        apply(&mut state, 18, 3.0, 3.0, 3.0, 3.0);
        assert_eq!(state.floor_offset(), -0.5);

        apply(&mut state, 36, 1.0, -2.0, 1.0, 1.0);
        assert_eq!(state.floor_offset(), -2.0);
    }

    #[test]
    fn test_floor_is_subtracted_from_current_frame() {
        let mut state = CalibrationState::new();
        let out = apply(&mut state, 0, 20.0, 20.0, 20.0, -1.0);

        assert_eq!(state.floor_offset(), -1.0);
        assert_eq!(out.corners, CornerWeights::new(21.0, 21.0, 21.0, 0.0));
    }

    #[test]
    fn test_floor_is_monotonic_over_random_walk() {
        let mut state = CalibrationState::new();
        let mut previous = state.floor_offset();
        let mut value = 0.0f32;
        for i in 0..500u64 {
            // Deterministic pseudo-random corner values in [-3, 3).
            value = (value * 7.3 + i as f32 * 1.7).sin() * 3.0;
            apply(&mut state, i * 18, value, -value, value * 0.5, 1.0);
            assert!(state.floor_offset() <= previous);
            previous = state.floor_offset();
        }
    }

    #[test]
    fn test_negative_total_clamps_to_zero() {
        let mut state = CalibrationState::new();
        let out = apply(&mut state, 0, -1.0, -1.0, -0.5, -0.5);
        assert_eq!(out.total_kg, 0.0);
        assert!(!out.in_use);
    }

    #[test]
    fn test_unoccupied_platform_reads_exactly_zero() {
        let mut state = CalibrationState::new();
        state.request_center_capture();
        apply(&mut state, 0, 20.0, 10.0, 10.0, 10.0);

        let out = apply(&mut state, 18, 1.0, 1.0, 1.0, 1.5);
        assert!(!out.in_use);
        assert_eq!(out.corners, CornerWeights::zero());
    }

    #[test]
    fn test_in_use_threshold_is_exclusive() {
        let mut state = CalibrationState::new();
        let out = apply(&mut state, 0, 1.25, 1.25, 1.25, 1.25);
        assert!(!out.in_use, "exactly 5 kg is not in use");
    }

    #[test]
    fn test_center_capture_zeroes_heaviest_corner() {
        let mut state = CalibrationState::new();
        state.request_center_capture();
        assert!(state.is_centering_armed());

        let out = apply(&mut state, 0, 18.0, 22.0, 15.0, 25.0);
        let offsets = state.center_offset();

        assert!(!state.is_centering_armed());
        assert!(state.is_centering_active());
        assert_eq!(offsets.get(Corner::BottomRight), 0.0);
        for corner in Corner::ALL {
            assert!(offsets.get(corner) >= 0.0);
        }
        // The captured stance now reads perfectly balanced.
        assert_eq!(out.corners, CornerWeights::new(25.0, 25.0, 25.0, 25.0));
    }

    #[test]
    fn test_center_capture_uses_floor_corrected_values() {
        let mut state = CalibrationState::new();
        apply(&mut state, 0, -2.0, 0.0, 0.0, 0.0);

        state.request_center_capture();
        apply(&mut state, 18, 10.0, 20.0, 10.0, 10.0);

        // Floor shifts every corner equally, so offsets are unaffected by it.
        assert_eq!(state.center_offset(), CornerWeights::new(10.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_repeated_center_requests_capture_once() {
        let mut state = CalibrationState::new();
        state.request_center_capture();
        state.request_center_capture();
        apply(&mut state, 0, 10.0, 20.0, 10.0, 10.0);
        let captured = state.center_offset();

        apply(&mut state, 18, 30.0, 10.0, 10.0, 10.0);
        assert_eq!(state.center_offset(), captured);
    }

    #[test]
    fn test_zero_request_resets_on_next_frame() {
        let mut state = CalibrationState::new();
        apply(&mut state, 0, -3.0, 0.0, 0.0, 0.0);
        state.request_center_capture();
        apply(&mut state, 18, 10.0, 20.0, 10.0, 10.0);

        state.request_zero();
        assert!(state.is_zero_armed());
        // Still applied until a frame arrives.
        assert_eq!(state.floor_offset(), -3.0);

        apply(&mut state, 36, 10.0, 10.0, 10.0, 10.0);
        assert_eq!(state.floor_offset(), 0.0);
        assert_eq!(state.center_offset(), CornerWeights::zero());
        assert!(!state.is_centering_active());
        assert!(!state.is_zero_armed());
    }

    #[test]
    fn test_zero_then_capture_in_same_frame() {
        let mut state = CalibrationState::new();
        apply(&mut state, 0, -3.0, 0.0, 0.0, 0.0);
        state.request_zero();
        state.request_center_capture();

        apply(&mut state, 18, 10.0, 20.0, 10.0, 10.0);
        assert_eq!(state.floor_offset(), 0.0);
        assert!(state.is_centering_active());
        assert_eq!(state.center_offset(), CornerWeights::new(10.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_reset_is_immediate() {
        let mut state = CalibrationState::new();
        state.request_center_capture();
        apply(&mut state, 0, -1.0, 20.0, 10.0, 10.0);

        state.reset();
        assert_eq!(state.floor_offset(), 0.0);
        assert_eq!(state.center_offset(), CornerWeights::zero());
        assert!(!state.is_centering_active());
    }
}

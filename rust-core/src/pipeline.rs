//! Complete balance pipeline integrating all per-tick stages.
//!
//! This module orchestrates the full data flow from a raw four-corner frame
//! to action edges and turn rates.
//!
//! # Architecture
//!
//! One explicit [`PipelineState`] is threaded through a single [`tick`]:
//! 1. **Calibration**: zero/center requests, floor correction, in-use gate
//! 2. **Ratios**: percentages and balance axes from calibrated corners
//! 3. **Lean**: threshold leans asserted as latch holders (when enabled)
//! 4. **Gait**: foot alternation, walk/sprint edges
//! 5. **Jump**: off-board detection and airtime cutoff
//! 6. **Turn**: smoothing windows and response curves
//! 7. **Latch**: holder changes merged into [`ActionEvent`]s
//!
//! Gait runs before jump and sees the previous tick's airborne state. Turn
//! runs after gait and uses this tick's gait phase to pick its profile.
//!
//! [`BalanceEngine`] wraps the state with its configuration, validates
//! frames before any state is touched, and exposes calibration requests.
//!
//! # Performance
//! - O(1) per frame, fixed memory (two smoothing windows)
//! - No allocation on the hot path beyond the returned event vector

use crate::actions::{ActionLatch, Holder};
use crate::calibration::CalibrationState;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::{ConfigError, FrameError};
use crate::gait::GaitState;
use crate::jump::JumpState;
use crate::lean::LeanFlags;
use crate::ratios::BalanceRatios;
use crate::turn::TurnState;
use crate::types::{Action, ActionEvent, CalibratedFrame, CornerWeights, MotionState, SensorFrame, TickOutput};

/// All state carried from one tick to the next.
#[derive(Debug, Clone)]
pub struct PipelineState {
    calibration: CalibrationState,
    gait: GaitState,
    jump: JumpState,
    turn: TurnState,
    latch: ActionLatch,

    // Latest outputs
    ratios: BalanceRatios,
    calibrated: CalibratedFrame,

    last_timestamp_ms: Option<u64>,
    ticks: u64,
}

impl PipelineState {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            calibration: CalibrationState::new(),
            gait: GaitState::new(),
            jump: JumpState::new(),
            turn: TurnState::new(&config.smoothing),
            latch: ActionLatch::new(),
            ratios: BalanceRatios::neutral(),
            calibrated: CalibratedFrame::default(),
            last_timestamp_ms: None,
            ticks: 0,
        }
    }

    pub fn calibration(&self) -> &CalibrationState {
        &self.calibration
    }

    pub fn gait(&self) -> &GaitState {
        &self.gait
    }

    pub fn jump(&self) -> &JumpState {
        &self.jump
    }

    pub fn turn(&self) -> &TurnState {
        &self.turn
    }

    pub fn latch(&self) -> &ActionLatch {
        &self.latch
    }

    pub fn ratios(&self) -> &BalanceRatios {
        &self.ratios
    }

    pub fn calibrated(&self) -> &CalibratedFrame {
        &self.calibrated
    }

    pub fn last_timestamp_ms(&self) -> Option<u64> {
        self.last_timestamp_ms
    }

    /// Total frames processed.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn motion(&self) -> MotionState {
        MotionState {
            gait: self.gait.phase(),
            airborne: self.jump.is_jumping(),
        }
    }

    /// Check a frame against this state without mutating anything.
    pub fn check_frame(&self, frame: &SensorFrame) -> Result<(), FrameError> {
        if let Some(corner) = frame.corners.first_non_finite() {
            return Err(FrameError::NonFiniteReading { corner });
        }
        if !frame.total_kg.is_finite() {
            return Err(FrameError::NonFiniteTotal);
        }
        if let Some(previous_ms) = self.last_timestamp_ms {
            if frame.timestamp_ms < previous_ms {
                return Err(FrameError::NonMonotonicTimestamp {
                    timestamp_ms: frame.timestamp_ms,
                    previous_ms,
                });
            }
        }
        Ok(())
    }
}

/// Run one frame through every stage.
///
/// The frame is assumed valid (see [`PipelineState::check_frame`]); invalid
/// readings degrade to neutral ratios rather than panicking.
pub fn tick(state: &mut PipelineState, config: &EngineConfig, frame: &SensorFrame) -> TickOutput {
    let now = frame.timestamp_ms;
    let features = &config.features;
    let mut events = Vec::new();

    // Stage 1-2: Calibration and ratios
    let calibrated = state.calibration.apply(frame, &config.calibration);
    let ratios = BalanceRatios::from_corners(&calibrated.corners);

    // Stage 3: Lean
    if features.leaning {
        let flags = LeanFlags::from_ratios(&ratios, &config.triggers);
        for (action, held) in flags.iter() {
            state.latch.set(action, Holder::Lean, held, now, &mut events);
        }
    } else {
        state.latch.release_holder(Holder::Lean, now, &mut events);
    }

    // Stage 4: Gait, against last tick's airborne state
    let gait = state.gait.update(
        ratios.balance_x,
        now,
        state.jump.is_jumping(),
        &config.triggers,
        &config.gait,
        features,
    );
    if let Some(edge) = gait.sprint {
        state.latch.apply_edge(Action::Modifier, Holder::Sprint, edge, now, &mut events);
    }
    if let Some(edge) = gait.walk {
        state.latch.apply_edge(Action::Forward, Holder::Walk, edge, now, &mut events);
    }

    // Stage 5: Jump
    if features.jumping {
        let jump = state.jump.update(calibrated.total_kg, now, &config.jump);
        for edge in jump.edges() {
            state.latch.apply_edge(Action::Jump, Holder::Jump, edge, now, &mut events);
        }
    } else {
        if state.jump.cancel() {
            log::debug!("jumping disabled mid-air");
        }
        state.latch.release_holder(Holder::Jump, now, &mut events);
        state.jump.reset();
    }

    // Stage 6: Turn
    let turn = state.turn.update(
        &ratios,
        state.gait.is_moving(),
        &config.turn,
        &config.smoothing,
        features,
    );

    state.ratios = ratios;
    state.calibrated = calibrated;
    state.last_timestamp_ms = Some(now);
    state.ticks += 1;

    TickOutput {
        events,
        turn,
        ratios,
        calibrated,
        motion: state.motion(),
    }
}

/// Balance classification engine for one platform.
///
/// Owns the configuration and pipeline state. Not internally synchronised;
/// every mutating call takes `&mut self`.
#[derive(Debug, Clone)]
pub struct BalanceEngine {
    config: EngineConfig,
    state: PipelineState,
}

impl BalanceEngine {
    /// Creates an engine after validating the configuration.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = PipelineState::new(&config);
        Ok(Self { config, state })
    }

    /// Process one frame.
    ///
    /// A rejected frame produces no events and leaves all state untouched.
    pub fn submit_frame(&mut self, frame: SensorFrame) -> Result<TickOutput, FrameError> {
        if let Err(err) = self.state.check_frame(&frame) {
            log::warn!("rejected frame: {}", err);
            return Err(err);
        }
        Ok(tick(&mut self.state, &self.config, &frame))
    }

    /// Process raw corner readings. The total is the corner sum.
    pub fn submit(
        &mut self,
        top_left: f32,
        top_right: f32,
        bottom_left: f32,
        bottom_right: f32,
        timestamp_ms: u64,
    ) -> Result<TickOutput, FrameError> {
        self.submit_frame(SensorFrame::new(timestamp_ms, top_left, top_right, bottom_left, bottom_right))
    }

    /// Process corner readings stamped by `clock`.
    pub fn submit_now(&mut self, corners: CornerWeights, clock: &impl Clock) -> Result<TickOutput, FrameError> {
        self.submit_frame(SensorFrame::from_corners(clock.now_ms(), corners))
    }

    /// Capture the current stance as balanced on the next frame.
    pub fn request_center_capture(&mut self) {
        self.state.calibration.request_center_capture();
    }

    /// Clear floor and center calibration on the next frame.
    pub fn request_zero(&mut self) {
        self.state.calibration.request_zero();
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the configuration. Smoothing windows whose capacity changed
    /// are rebuilt empty; all other state carries over.
    pub fn set_config(&mut self, config: EngineConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.state.turn.resize(&config.smoothing);
        self.config = config;
        log::debug!("engine configuration replaced");
        Ok(())
    }

    /// Ratios from the latest frame.
    pub fn ratios(&self) -> &BalanceRatios {
        self.state.ratios()
    }

    /// Calibrated view of the latest frame.
    pub fn calibrated(&self) -> &CalibratedFrame {
        self.state.calibrated()
    }

    pub fn calibration(&self) -> &CalibrationState {
        self.state.calibration()
    }

    pub fn motion(&self) -> MotionState {
        self.state.motion()
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Stop every held action. Gait and jump restart from idle so they do not
    /// later emit edges for actions that were already released.
    pub fn release_all(&mut self, timestamp_ms: u64) -> Vec<ActionEvent> {
        self.state.gait.reset();
        self.state.jump.reset();
        self.state.latch.release_all(timestamp_ms)
    }

    /// Return to a freshly constructed state, keeping the configuration.
    ///
    /// Held actions are released first; their stop events are returned,
    /// stamped with the last frame's timestamp.
    pub fn reset(&mut self) -> Vec<ActionEvent> {
        let released = self
            .state
            .latch
            .release_all(self.state.last_timestamp_ms.unwrap_or(0));
        self.state = PipelineState::new(&self.config);
        log::info!("engine reset");
        released
    }
}

// ============================================================================
// TESTS
// ============================================================================

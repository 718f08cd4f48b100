//! Core data types for the balance classification engine.
//!
//! This module defines the values that flow between pipeline stages: raw
//! sensor frames, calibrated frames, action events and the per-tick output.
//!
//! Design principle: Types should make intent obvious. If a concept exists,
//! it gets a type. Corner readings travel as [`CornerWeights`], never as
//! loose tuples or four-element arrays whose ordering must be remembered.

use serde::Serialize;

/// One of the four load cells of the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// All corners in canonical order.
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];
}

/// A value per corner, in kilograms unless stated otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CornerWeights {
    pub top_left: f32,
    pub top_right: f32,
    pub bottom_left: f32,
    pub bottom_right: f32,
}

impl CornerWeights {
    pub fn new(top_left: f32, top_right: f32, bottom_left: f32, bottom_right: f32) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    /// All four corners at exactly zero.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, corner: Corner) -> f32 {
        match corner {
            Corner::TopLeft => self.top_left,
            Corner::TopRight => self.top_right,
            Corner::BottomLeft => self.bottom_left,
            Corner::BottomRight => self.bottom_right,
        }
    }

    /// Apply `f` to every corner.
    pub fn map(self, mut f: impl FnMut(f32) -> f32) -> Self {
        Self {
            top_left: f(self.top_left),
            top_right: f(self.top_right),
            bottom_left: f(self.bottom_left),
            bottom_right: f(self.bottom_right),
        }
    }

    /// Combine two corner sets element-wise.
    pub fn zip_with(self, other: CornerWeights, mut f: impl FnMut(f32, f32) -> f32) -> Self {
        Self {
            top_left: f(self.top_left, other.top_left),
            top_right: f(self.top_right, other.top_right),
            bottom_left: f(self.bottom_left, other.bottom_left),
            bottom_right: f(self.bottom_right, other.bottom_right),
        }
    }

    pub fn sum(&self) -> f32 {
        self.top_left + self.top_right + self.bottom_left + self.bottom_right
    }

    pub fn max(&self) -> f32 {
        self.top_left
            .max(self.top_right)
            .max(self.bottom_left.max(self.bottom_right))
    }

    pub fn min(&self) -> f32 {
        self.top_left
            .min(self.top_right)
            .min(self.bottom_left.min(self.bottom_right))
    }

    /// First corner holding a non-finite value, if any.
    pub fn first_non_finite(&self) -> Option<Corner> {
        Corner::ALL.into_iter().find(|&c| !self.get(c).is_finite())
    }
}

/// A single raw frame from the balance platform.
///
/// This is the minimal input contract: four corner readings in kilograms and
/// a timestamp. Frames are immutable once created.
///
/// Assumptions:
/// - timestamp_ms is non-decreasing within a session
/// - corner readings are the device's kilogram values (its own 0/17/34 kg
///   calibration already applied), with no temperature compensation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorFrame {
    /// Timestamp in milliseconds. Only differences matter.
    pub timestamp_ms: u64,

    /// Raw corner readings in kg. May be negative after the board is lifted.
    pub corners: CornerWeights,

    /// Total weight in kg as reported by the device.
    pub total_kg: f32,
}

impl SensorFrame {
    /// Creates a frame whose total is the sum of the raw corners.
    pub fn new(
        timestamp_ms: u64,
        top_left: f32,
        top_right: f32,
        bottom_left: f32,
        bottom_right: f32,
    ) -> Self {
        Self::from_corners(
            timestamp_ms,
            CornerWeights::new(top_left, top_right, bottom_left, bottom_right),
        )
    }

    pub fn from_corners(timestamp_ms: u64, corners: CornerWeights) -> Self {
        Self {
            timestamp_ms,
            corners,
            total_kg: corners.sum(),
        }
    }

    /// Creates a frame with a device-supplied total weight.
    pub fn with_total(timestamp_ms: u64, corners: CornerWeights, total_kg: f32) -> Self {
        Self {
            timestamp_ms,
            corners,
            total_kg,
        }
    }
}

/// A frame after floor correction, center offsets and the in-use gate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CalibratedFrame {
    pub timestamp_ms: u64,

    /// Calibrated corners. Exactly zero when the platform is not in use.
    pub corners: CornerWeights,

    /// Total weight in kg, never negative.
    pub total_kg: f32,

    /// Whether total weight exceeded the in-use threshold this tick.
    pub in_use: bool,
}

/// Which foot currently carries most of the weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Foot {
    Left,
    Right,
    #[default]
    None,
}

impl Foot {
    /// The other foot. `None` has no opposite.
    pub fn opposite(self) -> Foot {
        match self {
            Foot::Left => Foot::Right,
            Foot::Right => Foot::Left,
            Foot::None => Foot::None,
        }
    }
}

/// A gameplay action that downstream collaborators map to keys or buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Left,
    Right,
    Forward,
    Backward,
    Modifier,
    Jump,
}

impl Action {
    pub const COUNT: usize = 6;

    pub const ALL: [Action; Action::COUNT] = [
        Action::Left,
        Action::Right,
        Action::Forward,
        Action::Backward,
        Action::Modifier,
        Action::Jump,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            Action::Left => 0,
            Action::Right => 1,
            Action::Forward => 2,
            Action::Backward => 3,
            Action::Modifier => 4,
            Action::Jump => 5,
        }
    }
}

/// Start or stop edge of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Start,
    Stop,
}

/// A discrete action edge emitted by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionEvent {
    pub action: Action,
    pub edge: Edge,
    /// Timestamp of the frame that produced the edge.
    pub timestamp_ms: u64,
}

impl ActionEvent {
    pub fn new(action: Action, edge: Edge, timestamp_ms: u64) -> Self {
        Self {
            action,
            edge,
            timestamp_ms,
        }
    }

    pub fn start(action: Action, timestamp_ms: u64) -> Self {
        Self::new(action, Edge::Start, timestamp_ms)
    }

    pub fn stop(action: Action, timestamp_ms: u64) -> Self {
        Self::new(action, Edge::Stop, timestamp_ms)
    }

    /// True if this event is the given action/edge pair (e.g. JumpStart).
    pub fn is(&self, action: Action, edge: Edge) -> bool {
        self.action == action && self.edge == edge
    }
}

/// Continuous turn rates, delivered every tick while turning is enabled.
///
/// `horizontal` drives the Left action amount, `vertical` the Backward
/// action amount. Zero means no turning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TurnIntensity {
    pub horizontal: i32,
    pub vertical: i32,
}

/// Coarse gait classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum GaitPhase {
    #[default]
    Idle,
    Walking,
    Sprinting,
}

/// Summary of the user's motion after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MotionState {
    pub gait: GaitPhase,
    pub airborne: bool,
}

impl MotionState {
    /// Walking or sprinting.
    pub fn is_moving(&self) -> bool {
        self.gait != GaitPhase::Idle
    }
}

/// Everything one tick produces.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    /// Action edges in the order they occurred within the tick.
    pub events: Vec<ActionEvent>,

    /// Turn rates, `None` when both turn channels are disabled.
    pub turn: Option<TurnIntensity>,

    /// Ratios derived from this frame.
    pub ratios: crate::ratios::BalanceRatios,

    /// Calibrated view of this frame.
    pub calibrated: CalibratedFrame,

    pub motion: MotionState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_total_is_corner_sum() {
        let frame = SensorFrame::new(18, 10.0, 12.0, 9.5, 8.5);
        assert_eq!(frame.total_kg, 40.0);
        assert_eq!(frame.timestamp_ms, 18);
    }

    #[test]
    fn test_frame_with_device_total() {
        let frame = SensorFrame::with_total(0, CornerWeights::new(1.0, 1.0, 1.0, 1.0), 3.5);
        assert_eq!(frame.total_kg, 3.5);
    }

    #[test]
    fn test_corner_extremes() {
        let c = CornerWeights::new(3.0, -1.0, 7.0, 2.0);
        assert_eq!(c.max(), 7.0);
        assert_eq!(c.min(), -1.0);
        assert_eq!(c.sum(), 11.0);
        assert_eq!(c.get(Corner::BottomLeft), 7.0);
    }

    #[test]
    fn test_first_non_finite() {
        let c = CornerWeights::new(1.0, f32::NAN, 1.0, f32::INFINITY);
        assert_eq!(c.first_non_finite(), Some(Corner::TopRight));
        assert_eq!(CornerWeights::zero().first_non_finite(), None);
    }

    #[test]
    fn test_opposite_foot() {
        assert_eq!(Foot::Left.opposite(), Foot::Right);
        assert_eq!(Foot::Right.opposite(), Foot::Left);
        assert_eq!(Foot::None.opposite(), Foot::None);
    }

    #[test]
    fn test_action_indices_are_unique() {
        let mut seen = [false; Action::COUNT];
        for action in Action::ALL {
            assert!(!seen[action.index()]);
            seen[action.index()] = true;
        }
    }

    #[test]
    fn test_event_matching() {
        let event = ActionEvent::start(Action::Jump, 120);
        assert!(event.is(Action::Jump, Edge::Start));
        assert!(!event.is(Action::Jump, Edge::Stop));
        assert!(!event.is(Action::Forward, Edge::Start));
    }

    #[test]
    fn test_motion_state_moving() {
        let mut motion = MotionState::default();
        assert!(!motion.is_moving());
        motion.gait = GaitPhase::Sprinting;
        assert!(motion.is_moving());
    }
}

//! Balance Walk Engine Library
//!
//! A calibration-and-classification kernel for four-corner balance
//! platforms. Raw per-corner weights go in; discrete action edges (walk,
//! sprint, jump, lean) and continuous turn rates come out.
//!
//! # Design Philosophy
//!
//! - **Frames in, events out**: The engine never talks to a device or emits
//!   key presses. Hosts feed frames and map actions themselves.
//! - **Frame time only**: Every timeout is measured against frame
//!   timestamps, so replays are deterministic.
//! - **Fail at the boundary**: Bad configuration and bad frames are rejected
//!   before they touch state. NaN never reaches stored state.
//! - **One state record**: All per-session state lives in
//!   [`pipeline::PipelineState`] and is advanced by [`pipeline::tick`].
//!
//! # Example
//!
//! ```
//! use balance_walk::{Action, BalanceEngine, EngineConfig};
//!
//! let mut engine = BalanceEngine::new(EngineConfig::default()).unwrap();
//!
//! // Standing evenly on the platform.
//! engine.submit(15.0, 15.0, 15.0, 15.0, 0).unwrap();
//!
//! // Stepping off: the jump starts.
//! let out = engine.submit(0.0, 0.0, 0.0, 0.0, 18).unwrap();
//! assert!(out.events[0].action == Action::Jump);
//! ```

pub mod actions;
pub mod calibration;
pub mod clock;
pub mod config;
pub mod error;
pub mod ffi;
pub mod gait;
pub mod jump;
pub mod lean;
pub mod pipeline;
pub mod ratios;
pub mod recording;
pub mod smoothing;
pub mod turn;
pub mod types;


// Re-export commonly used types
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{EngineConfig, FeatureToggles, TriggerConfig};
pub use error::{ConfigError, FrameError, RecordingError};
pub use pipeline::{BalanceEngine, PipelineState};
pub use ratios::BalanceRatios;
pub use types::{
    Action, ActionEvent, CalibratedFrame, CornerWeights, Edge, GaitPhase, MotionState, SensorFrame, TickOutput,
    TurnIntensity,
};

//! Jump Detection Module.
//!
//! Detects jumps from the total weight leaving the platform:
//! - On-board to off-board transition starts a jump
//! - Weight returning ends it (landing)
//! - Airtime past the configured maximum ends it as well, so stepping off
//!   the platform does not hold the jump action forever
//!
//! Off-board means total weight strictly below the threshold. Airtime is
//! measured from the last tick that was on the board.

use serde::{Deserialize, Serialize};

use crate::types::Edge;

/// Configuration for jump detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    /// Total weight (kg) below which nobody is on the platform.
    pub off_board_threshold_kg: f32,
    /// Airtime after which a jump is force-stopped.
    pub max_airtime_ms: u64,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            off_board_threshold_kg: 1.0,
            max_airtime_ms: 600,
        }
    }
}

/// How a jump ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    /// Weight returned to the platform.
    Normal,
    /// Airtime exceeded the maximum.
    Timeout,
}

/// What happened to the jump this tick. A jump can start and time out in
/// the same tick when the maximum airtime is very short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JumpTransition {
    pub started: bool,
    pub landing: Option<Landing>,
}

impl JumpTransition {
    pub fn is_empty(&self) -> bool {
        !self.started && self.landing.is_none()
    }

    /// Action edges in emission order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> {
        let start = self.started.then_some(Edge::Start);
        let stop = self.landing.map(|_| Edge::Stop);
        start.into_iter().chain(stop)
    }
}

/// Jump state carried across ticks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JumpState {
    is_jumping: bool,
    was_on_board: bool,
    last_ground_ms: Option<u64>,

    // Statistics
    jumps: u64,
    timeouts: u64,
}

impl JumpState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_jumping(&self) -> bool {
        self.is_jumping
    }

    pub fn was_on_board(&self) -> bool {
        self.was_on_board
    }

    pub fn last_ground_ms(&self) -> Option<u64> {
        self.last_ground_ms
    }

    /// Airtime of the jump in progress.
    pub fn airtime_ms(&self, now_ms: u64) -> Option<u64> {
        if !self.is_jumping {
            return None;
        }
        self.last_ground_ms.map(|ground| now_ms.saturating_sub(ground))
    }

    /// Get jump statistics (jumps, timeouts).
    pub fn stats(&self) -> (u64, u64) {
        (self.jumps, self.timeouts)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Drop an active jump without an edge. Used when jumping is switched
    /// off and the caller releases the action itself.
    pub fn cancel(&mut self) -> bool {
        let was_jumping = self.is_jumping;
        self.is_jumping = false;
        was_jumping
    }

    /// Process one tick.
    pub fn update(&mut self, total_kg: f32, now_ms: u64, config: &JumpConfig) -> JumpTransition {
        let mut transition = JumpTransition::default();

        let off_board = total_kg < config.off_board_threshold_kg;
        let last_ground = *self.last_ground_ms.get_or_insert(now_ms);
        let airtime = now_ms.saturating_sub(last_ground);

        if !self.is_jumping && self.was_on_board && off_board {
            self.is_jumping = true;
            self.jumps += 1;
            transition.started = true;
            log::debug!("jump started at {} ms", now_ms);
        }

        if self.is_jumping && airtime >= config.max_airtime_ms {
            self.is_jumping = false;
            self.timeouts += 1;
            transition.landing = Some(Landing::Timeout);
            log::debug!("jump timed out after {} ms off the board", airtime);
        } else if self.is_jumping && !off_board {
            self.is_jumping = false;
            transition.landing = Some(Landing::Normal);
            log::debug!("landed after {} ms", airtime);
        }

        if !off_board {
            self.last_ground_ms = Some(now_ms);
        }
        self.was_on_board = !off_board;

        transition
    }
}

// ============================================================================
// TESTS
// ============================================================================

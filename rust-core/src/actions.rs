//! Action latch: merges the sources that assert an action into clean
//! start/stop edges.
//!
//! Several detectors can drive the same action. Walking and a forward lean
//! both hold Forward; sprinting and a hard lean both hold Modifier. The latch
//! keeps one bit per source and per action, and emits:
//! - Start when an action gains its first holder
//! - Stop when it loses its last holder
//!
//! so overlapping sources never produce duplicate or premature edges.
//!
//! # Invariants
//! - An action is active exactly when it has at least one holder
//! - Edges for one action strictly alternate Start, Stop, Start, ...
//! - `release_all` leaves no action active

use crate::types::{Action, ActionEvent, Edge};

/// A source that can assert an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Holder {
    /// Threshold lean on the balance axes.
    Lean,
    /// Gait walking (Forward).
    Walk,
    /// Gait sprinting (Modifier).
    Sprint,
    /// Airborne (Jump).
    Jump,
}

impl Holder {
    /// Returns a human-readable description of the holder.
    pub fn description(&self) -> &'static str {
        match self {
            Holder::Lean => "Balance lean",
            Holder::Walk => "Walking in place",
            Holder::Sprint => "Sprinting in place",
            Holder::Jump => "Jumping",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Holder::Lean => 1 << 0,
            Holder::Walk => 1 << 1,
            Holder::Sprint => 1 << 2,
            Holder::Jump => 1 << 3,
        }
    }
}

/// Per-action holder sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionLatch {
    holders: [u8; Action::COUNT],
}

impl ActionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, action: Action) -> bool {
        self.holders[action.index()] != 0
    }

    pub fn is_held_by(&self, action: Action, holder: Holder) -> bool {
        self.holders[action.index()] & holder.bit() != 0
    }

    /// Currently active actions in canonical order.
    pub fn active(&self) -> impl Iterator<Item = Action> + '_ {
        Action::ALL.into_iter().filter(move |&a| self.is_active(a))
    }

    /// Assert or release `action` on behalf of `holder`, appending any
    /// resulting edge to `events`. Returns the edge, if any.
    pub fn set(
        &mut self,
        action: Action,
        holder: Holder,
        held: bool,
        timestamp_ms: u64,
        events: &mut Vec<ActionEvent>,
    ) -> Option<Edge> {
        let slot = &mut self.holders[action.index()];
        let was_active = *slot != 0;
        if held {
            *slot |= holder.bit();
        } else {
            *slot &= !holder.bit();
        }

        let edge = match (was_active, *slot != 0) {
            (false, true) => Edge::Start,
            (true, false) => Edge::Stop,
            _ => return None,
        };
        log::trace!("{:?} {:?} ({})", action, edge, holder.description());
        events.push(ActionEvent::new(action, edge, timestamp_ms));
        Some(edge)
    }

    /// Apply a start/stop edge from a stateful detector.
    pub fn apply_edge(
        &mut self,
        action: Action,
        holder: Holder,
        edge: Edge,
        timestamp_ms: u64,
        events: &mut Vec<ActionEvent>,
    ) -> Option<Edge> {
        self.set(action, holder, edge == Edge::Start, timestamp_ms, events)
    }

    /// Release every action a holder asserts.
    pub fn release_holder(&mut self, holder: Holder, timestamp_ms: u64, events: &mut Vec<ActionEvent>) {
        for action in Action::ALL {
            if self.is_held_by(action, holder) {
                self.set(action, holder, false, timestamp_ms, events);
            }
        }
    }

    /// Stop every active action and forget all holders.
    pub fn release_all(&mut self, timestamp_ms: u64) -> Vec<ActionEvent> {
        let events: Vec<ActionEvent> = self
            .active()
            .map(|action| ActionEvent::stop(action, timestamp_ms))
            .collect();
        self.holders = [0; Action::COUNT];
        if !events.is_empty() {
            log::debug!("released {} held actions", events.len());
        }
        events
    }
}

// ===== TESTS =====

//! Fixed-capacity moving average over recent balance values.
//!
//! Maintains a FIFO of the last N values plus their running sum, so both
//! push and average are O(1).

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::ratios::NEUTRAL;

/// Largest accepted window, about 18 s of history at 18 ms ticks.
pub const MAX_CAPACITY: usize = 1024;

/// Configuration for turn smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Samples averaged for the horizontal turn channel.
    pub horizontal_capacity: usize,
    /// Samples averaged for the vertical turn channel.
    pub vertical_capacity: usize,
    /// Use the smoothed value for the standing turn profile as well. When
    /// false, standing turns respond to the instantaneous ratio.
    pub smooth_while_standing: bool,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            horizontal_capacity: 12, // ~216ms at 18ms ticks
            vertical_capacity: 15,   // ~270ms
            smooth_while_standing: true,
        }
    }
}

/// Moving average window.
///
/// Invariants: `len() <= capacity()` and the running sum equals the sum of
/// the stored values.
#[derive(Debug, Clone)]
pub struct SmoothingWindow {
    values: VecDeque<f32>,
    capacity: usize,
    // f64 keeps add/subtract drift negligible over long sessions.
    running_sum: f64,
}

impl SmoothingWindow {
    /// Create an empty window. The capacity is clamped to
    /// `1..=MAX_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        let capacity = Self::clamp_capacity(capacity);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
            running_sum: 0.0,
        }
    }

    /// Add a value, evicting the oldest once full.
    ///
    /// Non-finite values are replaced with the neutral 50.0 so a single bad
    /// ratio cannot poison the average for the next N ticks.
    pub fn push(&mut self, value: f32) {
        let value = if value.is_finite() { value } else { NEUTRAL };

        self.values.push_back(value);
        self.running_sum += value as f64;

        if self.values.len() > self.capacity {
            if let Some(oldest) = self.values.pop_front() {
                self.running_sum -= oldest as f64;
            }
        }
    }

    /// Mean of the stored values, `None` while empty.
    pub fn average(&self) -> Option<f32> {
        if self.values.is_empty() {
            return None;
        }
        Some((self.running_sum / self.values.len() as f64) as f32)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    /// The capacity a window built with `requested` ends up with.
    pub fn clamp_capacity(requested: usize) -> usize {
        requested.clamp(1, MAX_CAPACITY)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn running_sum(&self) -> f64 {
        self.running_sum
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().copied()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.running_sum = 0.0;
    }
}

//! Gait Detection Module.
//!
//! Detects walking and sprinting on the platform from foot alternation:
//! - Foot dominance from the left/right balance ratio
//! - Alternation (definite Left -> Right or Right -> Left) as the step trigger
//! - Cadence thresholds on the time between alternations
//! - A continuation window so brief pauses do not restart the walk cycle
//!
//! Sprint thresholds are tighter than walk thresholds, so sprinting is only
//! reachable at a higher alternation rate, and walking stays asserted
//! underneath it.

use serde::{Deserialize, Serialize};

use crate::config::{FeatureToggles, TriggerConfig};
use crate::ratios::NEUTRAL;
use crate::types::{Edge, Foot, GaitPhase};

/// Timing configuration for gait detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaitConfig {
    /// Alternations closer together than this start walking.
    pub walk_start_ms: u64,
    /// No alternation for this long stops walking.
    pub walk_end_ms: u64,
    /// Alternations closer together than this start sprinting.
    pub sprint_start_ms: u64,
    /// No alternation for this long stops sprinting.
    pub sprint_end_ms: u64,
    /// After a walk stops, any alternation within this window resumes it.
    pub walk_continuation_ms: u64,
}

impl Default for GaitConfig {
    fn default() -> Self {
        Self {
            walk_start_ms: 450,
            walk_end_ms: 400,
            sprint_start_ms: 150,
            sprint_end_ms: 250,
            walk_continuation_ms: 1300,
        }
    }
}

/// Edges produced by one gait update. At most one edge per channel per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GaitTransitions {
    /// Modifier (sprint) edge.
    pub sprint: Option<Edge>,
    /// Forward (walk) edge.
    pub walk: Option<Edge>,
}

impl GaitTransitions {
    pub fn is_empty(&self) -> bool {
        self.sprint.is_none() && self.walk.is_none()
    }
}

/// Gait state carried across ticks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GaitState {
    last_foot: Foot,

    // Initialised from the first frame; `None` until then.
    last_switch_ms: Option<u64>,
    last_foot_change_ms: Option<u64>,

    // `None` until the first walk has stopped.
    last_walk_stop_ms: Option<u64>,

    is_walking: bool,
    is_sprinting: bool,

    // Statistics
    alternations: u64,
}

impl GaitState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_walking(&self) -> bool {
        self.is_walking
    }

    pub fn is_sprinting(&self) -> bool {
        self.is_sprinting
    }

    pub fn is_moving(&self) -> bool {
        self.is_walking || self.is_sprinting
    }

    pub fn last_foot(&self) -> Foot {
        self.last_foot
    }

    /// Timestamp of the most recent alternation (or session start).
    pub fn last_switch_ms(&self) -> Option<u64> {
        self.last_switch_ms
    }

    /// Timestamp of the most recent change of dominant foot, including to
    /// and from `None`.
    pub fn last_foot_change_ms(&self) -> Option<u64> {
        self.last_foot_change_ms
    }

    pub fn last_walk_stop_ms(&self) -> Option<u64> {
        self.last_walk_stop_ms
    }

    /// Total qualifying foot alternations.
    pub fn alternations(&self) -> u64 {
        self.alternations
    }

    pub fn phase(&self) -> GaitPhase {
        if self.is_sprinting {
            GaitPhase::Sprinting
        } else if self.is_walking {
            GaitPhase::Walking
        } else {
            GaitPhase::Idle
        }
    }

    /// Forget all gait history.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Classify the foot carrying the weight.
    pub fn classify_foot(balance_x: f32, trigger: f32) -> Foot {
        if balance_x < NEUTRAL - trigger {
            Foot::Left
        } else if balance_x > NEUTRAL + trigger {
            Foot::Right
        } else {
            Foot::None
        }
    }

    /// Process one tick.
    ///
    /// `is_jumping` is the jump state from the previous tick; stop edges are
    /// held back while airborne so actions are not dropped mid-air.
    pub fn update(
        &mut self,
        balance_x: f32,
        now_ms: u64,
        is_jumping: bool,
        triggers: &TriggerConfig,
        config: &GaitConfig,
        features: &FeatureToggles,
    ) -> GaitTransitions {
        let mut transitions = GaitTransitions::default();

        // Toggled off at runtime: release what is held.
        if !features.sprinting && self.is_sprinting {
            self.is_sprinting = false;
            transitions.sprint = Some(Edge::Stop);
        }
        if !features.walking && self.is_walking {
            self.is_walking = false;
            self.last_walk_stop_ms = Some(now_ms);
            transitions.walk = Some(Edge::Stop);
        }
        if !features.walking && !features.sprinting {
            return transitions;
        }

        let last_switch = *self.last_switch_ms.get_or_insert(now_ms);
        self.last_foot_change_ms.get_or_insert(now_ms);

        let current_foot = Self::classify_foot(balance_x, triggers.left_right);
        let alternated = current_foot != Foot::None && current_foot == self.last_foot.opposite();
        let since_switch = now_ms.saturating_sub(last_switch);

        if features.sprinting {
            transitions.sprint = self.update_sprint(alternated, since_switch, is_jumping, config);
        }
        if features.walking {
            transitions.walk = self.update_walk(alternated, since_switch, now_ms, is_jumping, config);
        }

        if alternated {
            self.last_switch_ms = Some(now_ms);
            self.alternations += 1;
            log::trace!("foot alternated to {:?} after {} ms", current_foot, since_switch);
        }
        if current_foot != self.last_foot {
            self.last_foot_change_ms = Some(now_ms);
        }
        if current_foot != Foot::None {
            self.last_foot = current_foot;
        }

        transitions
    }

    // =========================================================================
    // PRIVATE METHODS
    // =========================================================================

    fn update_sprint(
        &mut self,
        alternated: bool,
        since_switch: u64,
        is_jumping: bool,
        config: &GaitConfig,
    ) -> Option<Edge> {
        if alternated && !self.is_sprinting && since_switch < config.sprint_start_ms {
            self.is_sprinting = true;
            log::debug!("sprint started ({} ms between steps)", since_switch);
            Some(Edge::Start)
        } else if self.is_sprinting && since_switch >= config.sprint_end_ms && !is_jumping {
            self.is_sprinting = false;
            log::debug!("sprint stopped ({} ms since last step)", since_switch);
            Some(Edge::Stop)
        } else {
            None
        }
    }

    fn update_walk(
        &mut self,
        alternated: bool,
        since_switch: u64,
        now_ms: u64,
        is_jumping: bool,
        config: &GaitConfig,
    ) -> Option<Edge> {
        let continuing = self
            .last_walk_stop_ms
            .map(|stop| now_ms.saturating_sub(stop) < config.walk_continuation_ms)
            .unwrap_or(false);

        if alternated && !self.is_walking && (since_switch < config.walk_start_ms || continuing) {
            self.is_walking = true;
            if continuing {
                log::debug!("walk resumed within continuation window");
            } else {
                log::debug!("walk started ({} ms between steps)", since_switch);
            }
            Some(Edge::Start)
        } else if self.is_walking && since_switch >= config.walk_end_ms && !is_jumping {
            self.is_walking = false;
            self.last_walk_stop_ms = Some(now_ms);
            log::debug!("walk stopped ({} ms since last step)", since_switch);
            Some(Edge::Stop)
        } else {
            None
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const LEFT: f32 = 20.0;
    const RIGHT: f32 = 80.0;
    const CENTER: f32 = 50.0;

    fn sprint_only() -> FeatureToggles {
        FeatureToggles {
            walking: false,
            ..FeatureToggles::default()
        }
    }

    fn step(state: &mut GaitState, balance_x: f32, t: u64) -> GaitTransitions {
        state.update(
            balance_x,
            t,
            false,
            &TriggerConfig::default(),
            &GaitConfig::default(),
            &FeatureToggles::default(),
        )
    }

    #[test]
    fn test_gait_state_creation() {
        let state = GaitState::new();
        assert_eq!(state.phase(), GaitPhase::Idle);
        assert_eq!(state.last_foot(), Foot::None);
        assert_eq!(state.alternations(), 0);
    }

    #[test]
    fn test_classify_foot() {
        assert_eq!(GaitState::classify_foot(34.9, 15.0), Foot::Left);
        assert_eq!(GaitState::classify_foot(35.0, 15.0), Foot::None);
        assert_eq!(GaitState::classify_foot(65.0, 15.0), Foot::None);
        assert_eq!(GaitState::classify_foot(65.1, 15.0), Foot::Right);
    }

    #[test]
    fn test_sprint_guard_alone() {
        let mut state = GaitState::new();
        let triggers = TriggerConfig::default();
        let config = GaitConfig::default();
        let features = sprint_only();

        let first = state.update(LEFT, 0, false, &triggers, &config, &features);
        assert!(first.is_empty(), "first foot is not an alternation");

        let second = state.update(RIGHT, 100, false, &triggers, &config, &features);
        assert_eq!(second.sprint, Some(Edge::Start));
        assert_eq!(second.walk, None);
        assert!(state.is_sprinting());

        let third = state.update(LEFT, 600, false, &triggers, &config, &features);
        assert_eq!(third.sprint, Some(Edge::Stop));
        assert_eq!(third.walk, None);
        assert!(!state.is_sprinting());
    }

    #[test]
    fn test_walk_starts_on_alternation_within_window() {
        let mut state = GaitState::new();
        step(&mut state, LEFT, 0);
        let out = step(&mut state, RIGHT, 300);
        assert_eq!(out.walk, Some(Edge::Start));
        assert_eq!(out.sprint, None);
        assert_eq!(state.phase(), GaitPhase::Walking);
    }

    #[test]
    fn test_slow_alternation_does_not_walk() {
        let mut state = GaitState::new();
        step(&mut state, LEFT, 0);
        let out = step(&mut state, RIGHT, 500);
        assert!(out.is_empty());
        assert!(!state.is_walking());
        // The alternation still counts for the next step.
        assert_eq!(state.last_switch_ms(), Some(500));
    }

    #[test]
    fn test_neutral_stance_is_not_an_alternation() {
        let mut state = GaitState::new();
        step(&mut state, LEFT, 0);
        step(&mut state, CENTER, 100);
        assert_eq!(state.last_foot(), Foot::Left);
        assert_eq!(state.last_foot_change_ms(), Some(100));

        // Left -> None -> Left is not a switch.
        let out = step(&mut state, LEFT, 200);
        assert!(out.is_empty());
        assert_eq!(state.alternations(), 0);

        // Left -> None -> Right is.
        step(&mut state, CENTER, 250);
        let out = step(&mut state, RIGHT, 300);
        assert_eq!(out.walk, Some(Edge::Start));
        assert_eq!(state.alternations(), 1);
    }

    #[test]
    fn test_walk_stops_after_end_time() {
        let mut state = GaitState::new();
        step(&mut state, LEFT, 0);
        step(&mut state, RIGHT, 300);

        assert!(step(&mut state, RIGHT, 650).is_empty());
        let out = step(&mut state, RIGHT, 700);
        assert_eq!(out.walk, Some(Edge::Stop));
        assert_eq!(state.last_walk_stop_ms(), Some(700));
    }

    #[test]
    fn test_jump_holds_walk_and_sprint() {
        let mut state = GaitState::new();
        let triggers = TriggerConfig::default();
        let config = GaitConfig::default();
        let features = FeatureToggles::default();

        state.update(LEFT, 0, false, &triggers, &config, &features);
        let out = state.update(RIGHT, 100, false, &triggers, &config, &features);
        assert_eq!(out.sprint, Some(Edge::Start));
        assert_eq!(out.walk, Some(Edge::Start));

        // Airborne long past both end times: nothing stops.
        let out = state.update(CENTER, 900, true, &triggers, &config, &features);
        assert!(out.is_empty());
        assert_eq!(state.phase(), GaitPhase::Sprinting);

        // Landing releases both.
        let out = state.update(CENTER, 920, false, &triggers, &config, &features);
        assert_eq!(out.sprint, Some(Edge::Stop));
        assert_eq!(out.walk, Some(Edge::Stop));
    }

    #[test]
    fn test_continuation_window_resumes_slow_walk() {
        let mut state = GaitState::new();
        step(&mut state, LEFT, 0);
        step(&mut state, RIGHT, 300);
        let stop = step(&mut state, RIGHT, 700);
        assert_eq!(stop.walk, Some(Edge::Stop));

        // 900 ms since the last switch is too slow to start a walk, but the
        // walk stopped only 200 ms ago.
        let out = step(&mut state, LEFT, 1200);
        assert_eq!(out.walk, Some(Edge::Start));
    }

    #[test]
    fn test_continuation_window_expires() {
        let mut state = GaitState::new();
        step(&mut state, LEFT, 0);
        step(&mut state, RIGHT, 300);
        step(&mut state, RIGHT, 700);

        let out = step(&mut state, LEFT, 2100);
        assert!(out.is_empty());
        assert!(!state.is_walking());
    }

    #[test]
    fn test_sprint_is_layered_over_walk() {
        let mut state = GaitState::new();
        step(&mut state, LEFT, 0);
        step(&mut state, RIGHT, 300);
        assert_eq!(state.phase(), GaitPhase::Walking);

        let out = step(&mut state, LEFT, 400);
        assert_eq!(out.sprint, Some(Edge::Start));
        assert_eq!(out.walk, None);
        assert!(state.is_walking());

        // Sprint ends first; walk continues.
        let out = step(&mut state, LEFT, 650);
        assert_eq!(out.sprint, Some(Edge::Stop));
        assert_eq!(out.walk, None);
        assert_eq!(state.phase(), GaitPhase::Walking);
    }

    #[test]
    fn test_disabling_walk_releases_it() {
        let mut state = GaitState::new();
        step(&mut state, LEFT, 0);
        step(&mut state, RIGHT, 300);

        let features = FeatureToggles {
            walking: false,
            sprinting: false,
            ..FeatureToggles::default()
        };
        let out = state.update(
            LEFT,
            320,
            false,
            &TriggerConfig::default(),
            &GaitConfig::default(),
            &features,
        );
        assert_eq!(out.walk, Some(Edge::Stop));
        assert!(!state.is_walking());
    }

    #[test]
    fn test_reset_clears_history() {
        let mut state = GaitState::new();
        step(&mut state, LEFT, 0);
        step(&mut state, RIGHT, 300);
        state.reset();
        assert_eq!(state, GaitState::new());
    }
}

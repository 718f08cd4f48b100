//! Threshold lean actions.
//!
//! Stateless: every tick compares the balance axes against the trigger
//! distances from neutral. Comparisons are strict, so a value exactly on a
//! trigger does not lean.

use crate::config::TriggerConfig;
use crate::ratios::{BalanceRatios, NEUTRAL};
use crate::types::Action;

/// Which lean actions the current ratios assert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LeanFlags {
    pub left: bool,
    pub right: bool,
    pub forward: bool,
    pub backward: bool,
    pub modifier: bool,
}

impl LeanFlags {
    pub fn from_ratios(ratios: &BalanceRatios, triggers: &TriggerConfig) -> Self {
        let x = ratios.balance_x;
        let y = ratios.balance_y;
        Self {
            left: x < NEUTRAL - triggers.left_right,
            right: x > NEUTRAL + triggers.left_right,
            forward: y < NEUTRAL - triggers.forward_backward,
            backward: y > NEUTRAL + triggers.forward_backward,
            modifier: beyond(x, triggers.modifier_left_right) || beyond(y, triggers.modifier_forward_backward),
        }
    }

    /// Flag state for one action. Jump is never a lean.
    pub fn get(&self, action: Action) -> bool {
        match action {
            Action::Left => self.left,
            Action::Right => self.right,
            Action::Forward => self.forward,
            Action::Backward => self.backward,
            Action::Modifier => self.modifier,
            Action::Jump => false,
        }
    }

    /// Lean-capable actions with their current flag, in emission order.
    pub fn iter(&self) -> impl Iterator<Item = (Action, bool)> + '_ {
        [
            Action::Left,
            Action::Right,
            Action::Forward,
            Action::Backward,
            Action::Modifier,
        ]
        .into_iter()
        .map(move |action| (action, self.get(action)))
    }

    pub fn any(&self) -> bool {
        self.left || self.right || self.forward || self.backward || self.modifier
    }
}

fn beyond(value: f32, trigger: f32) -> bool {
    value < NEUTRAL - trigger || value > NEUTRAL + trigger
}

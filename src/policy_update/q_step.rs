use crate::error::Result;
use crate::policy::{PolicyTable, StateKey};

use super::PolicyUpdate;

/// Off-policy one step update, bootstrapping from the best action.
#[derive(Debug, Clone, Copy, Default)]
pub struct QStep;

impl QStep {
    pub fn new() -> Self {
        Self
    }
}

impl<S: StateKey> PolicyUpdate<S> for QStep {
    fn target_value(&self, policy: &PolicyTable<S>, state: &S, _chosen_action: usize) -> Result<f64> {
        policy.max_value(state)
    }
}

use fxhash::FxBuildHasher;
use indexmap::IndexMap;

use crate::error::Result;
use crate::policy::{PolicyTable, StateKey};

/// Weights below this are dropped after every decay pass.
pub const TRACE_THRESHOLD: f64 = 1e-6;

/// Accumulating eligibility trace over visited (state, action) pairs.
///
/// Holds at most one weight per pair, in first-visit order.
#[derive(Debug, Clone)]
pub struct EligibilityTrace<S: StateKey> {
    entries: IndexMap<(S, usize), f64, FxBuildHasher>,
}

impl<S: StateKey> Default for EligibilityTrace<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StateKey> EligibilityTrace<S> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::with_hasher(FxBuildHasher::default()),
        }
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Adds 1 to the weight of the pair, inserting it with weight 1 when absent.
    pub fn touch(&mut self, state: &S, action: usize) {
        *self.entries.entry((state.clone(), action)).or_insert(0.0) += 1.0;
    }

    /// Credits every traced pair with `learning_rate * delta * weight`, then decays each
    /// weight by `discount_factor * lambda` and prunes what fell below [`TRACE_THRESHOLD`].
    pub fn apply_and_decay(
        &mut self,
        policy: &mut PolicyTable<S>,
        delta: f64,
        learning_rate: f64,
        discount_factor: f64,
        lambda: f64,
    ) -> Result<()> {
        let decay: f64 = discount_factor * lambda;
        for ((state, action), weight) in self.entries.iter_mut() {
            policy.add(state, *action, learning_rate * delta * *weight)?;
            *weight *= decay;
        }
        self.entries.retain(|_, weight| *weight >= TRACE_THRESHOLD);
        Ok(())
    }

    pub fn weight(&self, state: &S, action: usize) -> Option<f64> {
        self.entries.get(&(state.clone(), action)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&S, usize, f64)> {
        self.entries
            .iter()
            .map(|((state, action), weight)| (state, *action, *weight))
    }
}

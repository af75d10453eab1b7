mod epsilon_greedy;
mod softmax;

use enum_dispatch::enum_dispatch;
use ndarray::ArrayView1;

use crate::error::Result;
use crate::policy::{PolicyTable, StateKey};

pub use epsilon_greedy::{EpsilonDecay, EpsilonGreedy};
pub use softmax::Softmax;

#[enum_dispatch]
pub trait ActionSelection {
    fn get_action(&mut self, values: &ArrayView1<f64>) -> usize;
    /// Epsilon for epsilon-greedy, temperature for softmax.
    fn get_exploration_rate(&self) -> f64;
    /// Called once per finished episode.
    fn update(&mut self);
    fn reset(&mut self);
}

#[derive(Debug, Clone)]
#[enum_dispatch(ActionSelection)]
pub enum EnumActionSelection {
    EpsilonGreedy(EpsilonGreedy),
    Softmax(Softmax),
}

/// Chooses an action for `state`, which must already be in the table.
pub fn select<S: StateKey, P: ActionSelection>(
    selection: &mut P,
    policy: &PolicyTable<S>,
    state: &S,
) -> Result<usize> {
    let values: ArrayView1<f64> = policy.values(state)?;
    Ok(selection.get_action(&values))
}

mod q_step;
mod sarsa_lambda;
mod sarsa_step;

use enum_dispatch::enum_dispatch;

use crate::error::Result;
use crate::policy::{PolicyTable, StateKey};
use crate::trace::EligibilityTrace;

pub use q_step::QStep;
pub use sarsa_lambda::SarsaLambda;
pub use sarsa_step::{SarsaStep, SarsaTarget};

/// The step from the previously chosen pair to the state just observed.
/// `next` is `None` when the episode ended after the previous action.
#[derive(Debug, Clone, Copy)]
pub struct Transition<'a, S> {
    pub last_state: &'a S,
    pub last_action: usize,
    pub reward: f64,
    pub next: Option<(&'a S, usize)>,
}

#[enum_dispatch]
pub trait PolicyUpdate<S: StateKey> {
    /// Bootstrap value of `state`, given the action chosen there this step.
    fn target_value(&self, policy: &PolicyTable<S>, state: &S, chosen_action: usize)
        -> Result<f64>;

    /// Spends a TD error on the table.
    fn propagate(
        &mut self,
        policy: &mut PolicyTable<S>,
        state: &S,
        action: usize,
        delta: f64,
        learning_rate: f64,
        _discount_factor: f64,
    ) -> Result<()> {
        policy.add(state, action, learning_rate * delta)
    }

    /// Returns the TD error of the transition after applying it.
    fn update(
        &mut self,
        policy: &mut PolicyTable<S>,
        transition: &Transition<S>,
        learning_rate: f64,
        discount_factor: f64,
    ) -> Result<f64> {
        let current: f64 = policy.get(transition.last_state, transition.last_action)?;
        let future_q_value: f64 = match transition.next {
            Some((state, action)) => self.target_value(policy, state, action)?,
            None => 0.0,
        };
        let temporal_difference: f64 =
            transition.reward + discount_factor * future_q_value - current;
        self.propagate(
            policy,
            transition.last_state,
            transition.last_action,
            temporal_difference,
            learning_rate,
            discount_factor,
        )?;
        Ok(temporal_difference)
    }

    fn reset(&mut self) {}

    fn trace(&self) -> Option<&EligibilityTrace<S>> {
        None
    }
}

#[derive(Debug, Clone)]
#[enum_dispatch(PolicyUpdate<S>)]
pub enum EnumPolicyUpdate<S: StateKey> {
    QStep(QStep),
    SarsaStep(SarsaStep),
    SarsaLambda(SarsaLambda<S>),
}

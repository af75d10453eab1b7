use crate::error::{LearnerError, Result};
use crate::policy::{PolicyTable, StateKey};
use crate::trace::EligibilityTrace;

use super::{PolicyUpdate, SarsaTarget};

/// SARSA whose TD error is spread over an accumulating eligibility trace.
#[derive(Debug, Clone)]
pub struct SarsaLambda<S: StateKey> {
    lambda_factor: f64,
    target: SarsaTarget,
    trace: EligibilityTrace<S>,
}

impl<S: StateKey> SarsaLambda<S> {
    pub fn new(lambda_factor: f64, target: SarsaTarget) -> Result<Self> {
        if !(0.0..=1.0).contains(&lambda_factor) {
            return Err(LearnerError::invalid(format!(
                "lambda must be in [0, 1], got {}",
                lambda_factor
            )));
        }
        Ok(Self {
            lambda_factor,
            target,
            trace: EligibilityTrace::new(),
        })
    }

    pub fn lambda_factor(&self) -> f64 {
        self.lambda_factor
    }
}

impl<S: StateKey> PolicyUpdate<S> for SarsaLambda<S> {
    fn target_value(&self, policy: &PolicyTable<S>, state: &S, chosen_action: usize) -> Result<f64> {
        self.target.value(policy, state, chosen_action)
    }

    fn propagate(
        &mut self,
        policy: &mut PolicyTable<S>,
        state: &S,
        action: usize,
        delta: f64,
        learning_rate: f64,
        discount_factor: f64,
    ) -> Result<()> {
        self.trace.touch(state, action);
        self.trace.apply_and_decay(
            policy,
            delta,
            learning_rate,
            discount_factor,
            self.lambda_factor,
        )
    }

    fn reset(&mut self) {
        self.trace.reset();
    }

    fn trace(&self) -> Option<&EligibilityTrace<S>> {
        Some(&self.trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy_update::test_support::{close, two_state_table};
    use crate::policy_update::Transition;

    #[test]
    fn first_step_matches_plain_sarsa() {
        let mut policy = two_state_table();
        let mut rule = SarsaLambda::new(0.9, SarsaTarget::Sampled).unwrap();
        let transition = Transition {
            last_state: &"s0",
            last_action: 0,
            reward: 1.0,
            next: Some((&"s1", 1)),
        };
        let delta = rule.update(&mut policy, &transition, 0.1, 0.5).unwrap();
        assert!(close(delta, 0.5));
        assert!(close(policy.get(&"s0", 0).unwrap(), 1.05));
        let weight = rule.trace().unwrap().weight(&"s0", 0).unwrap();
        assert!(close(weight, 0.45));
    }

    #[test]
    fn credit_flows_back_to_earlier_pairs() {
        let mut policy = two_state_table();
        let mut rule = SarsaLambda::new(1.0, SarsaTarget::Sampled).unwrap();
        // s0/a0 -> s1, chose a0 there
        let first = Transition {
            last_state: &"s0",
            last_action: 0,
            reward: 0.0,
            next: Some((&"s1", 0)),
        };
        let d1 = rule.update(&mut policy, &first, 0.5, 1.0).unwrap();
        assert!(close(d1, 2.0));
        assert!(close(policy.get(&"s0", 0).unwrap(), 2.0));

        // s1/a0 ends the episode with reward 1
        let second = Transition {
            last_state: &"s1",
            last_action: 0,
            reward: 1.0,
            next: None,
        };
        let d2 = rule.update(&mut policy, &second, 0.5, 1.0).unwrap();
        assert!(close(d2, -2.0));
        assert!(close(policy.get(&"s1", 0).unwrap(), 2.0));
        assert!(close(policy.get(&"s0", 0).unwrap(), 1.0));
        assert_eq!(rule.trace().unwrap().len(), 2);
    }

    #[test]
    fn reset_clears_a_live_trace() {
        let mut policy = two_state_table();
        let mut rule = SarsaLambda::new(0.9, SarsaTarget::Greedy).unwrap();
        let transition = Transition {
            last_state: &"s1",
            last_action: 1,
            reward: 0.0,
            next: Some((&"s0", 0)),
        };
        rule.update(&mut policy, &transition, 0.1, 0.9).unwrap();
        assert!(!rule.trace().unwrap().is_empty());
        PolicyUpdate::<&str>::reset(&mut rule);
        assert!(rule.trace().unwrap().is_empty());
    }

    #[test]
    fn lambda_out_of_range_is_rejected() {
        assert!(SarsaLambda::<u8>::new(1.1, SarsaTarget::Sampled).is_err());
        assert!(SarsaLambda::<u8>::new(-0.5, SarsaTarget::Sampled).is_err());
    }
}

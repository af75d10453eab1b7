use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::policy::{PolicyTable, StateKey};

use super::PolicyUpdate;

/// Which next action SARSA bootstraps from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SarsaTarget {
    /// The action the selector actually returned this step.
    #[default]
    Sampled,
    /// The greedy action of the next state, recomputed at update time.
    Greedy,
}

impl SarsaTarget {
    pub(crate) fn value<S: StateKey>(
        self,
        policy: &PolicyTable<S>,
        state: &S,
        chosen_action: usize,
    ) -> Result<f64> {
        match self {
            SarsaTarget::Sampled => policy.get(state, chosen_action),
            SarsaTarget::Greedy => {
                let action: usize = policy.greedy_action(state)?;
                policy.get(state, action)
            }
        }
    }
}

/// On-policy one step update.
#[derive(Debug, Clone, Copy, Default)]
pub struct SarsaStep {
    target: SarsaTarget,
}

impl SarsaStep {
    pub fn new(target: SarsaTarget) -> Self {
        Self { target }
    }

    pub fn target(&self) -> SarsaTarget {
        self.target
    }
}

impl<S: StateKey> PolicyUpdate<S> for SarsaStep {
    fn target_value(&self, policy: &PolicyTable<S>, state: &S, chosen_action: usize) -> Result<f64> {
        self.target.value(policy, state, chosen_action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy_update::test_support::{close, two_state_table};
    use crate::policy_update::Transition;

    fn transition(chosen: usize) -> Transition<'static, &'static str> {
        Transition {
            last_state: &"s0",
            last_action: 0,
            reward: 1.0,
            next: Some((&"s1", chosen)),
        }
    }

    #[test]
    fn sampled_greedy_choice_matches_q_learning() {
        let mut policy = two_state_table();
        let mut rule = SarsaStep::new(SarsaTarget::Sampled);
        let delta = rule.update(&mut policy, &transition(0), 0.1, 0.5).unwrap();
        assert!(close(delta, 1.5));
        assert!(close(policy.get(&"s0", 0).unwrap(), 1.15));
    }

    #[test]
    fn sampled_exploratory_choice_differs_from_q_learning() {
        let mut policy = two_state_table();
        let mut rule = SarsaStep::new(SarsaTarget::Sampled);
        let delta = rule.update(&mut policy, &transition(1), 0.1, 0.5).unwrap();
        assert!(close(delta, 0.5));
        assert!(close(policy.get(&"s0", 0).unwrap(), 1.05));
    }

    #[test]
    fn greedy_target_ignores_the_chosen_action() {
        let mut policy = two_state_table();
        let mut rule = SarsaStep::new(SarsaTarget::Greedy);
        let delta = rule.update(&mut policy, &transition(1), 0.1, 0.5).unwrap();
        assert!(close(delta, 1.5));
        assert!(close(policy.get(&"s0", 0).unwrap(), 1.15));
    }
}

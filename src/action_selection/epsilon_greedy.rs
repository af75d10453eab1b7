use ndarray::ArrayView1;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{LearnerError, Result};
use crate::utils::argmax;

use super::ActionSelection;

/// How epsilon moves after each finished episode.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EpsilonDecay {
    #[default]
    Constant,
    Linear { step: f64, final_epsilon: f64 },
}

#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    exploration_decider: Uniform<f64>,
    initial_epsilon: f64,
    epsilon: f64,
    decay: EpsilonDecay,
    rng: StdRng,
}

impl EpsilonGreedy {
    pub fn new(epsilon: f64, seed: u64) -> Result<Self> {
        if !(0.0..=1.0).contains(&epsilon) {
            return Err(LearnerError::invalid(format!(
                "epsilon must be in [0, 1], got {}",
                epsilon
            )));
        }
        Ok(Self {
            exploration_decider: Uniform::from(0.0..1.0),
            initial_epsilon: epsilon,
            epsilon,
            decay: EpsilonDecay::Constant,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn with_decay(mut self, decay: EpsilonDecay) -> Result<Self> {
        if let EpsilonDecay::Linear {
            step,
            final_epsilon,
        } = decay
        {
            if step.is_nan() || step < 0.0 || !(0.0..=1.0).contains(&final_epsilon) {
                return Err(LearnerError::invalid(format!(
                    "linear decay needs step >= 0 and final epsilon in [0, 1], got {} and {}",
                    step, final_epsilon
                )));
            }
        }
        self.decay = decay;
        Ok(self)
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    fn should_explore(&mut self) -> bool {
        self.epsilon != 0.0 && self.exploration_decider.sample(&mut self.rng) < self.epsilon
    }
}

impl ActionSelection for EpsilonGreedy {
    fn get_action(&mut self, values: &ArrayView1<f64>) -> usize {
        if self.should_explore() {
            self.rng.gen_range(0..values.len())
        } else {
            argmax(values.iter())
        }
    }

    fn get_exploration_rate(&self) -> f64 {
        self.epsilon
    }

    fn update(&mut self) {
        if let EpsilonDecay::Linear {
            step,
            final_epsilon,
        } = self.decay
        {
            self.epsilon = (self.epsilon - step).max(final_epsilon);
        }
    }

    fn reset(&mut self) {
        self.epsilon = self.initial_epsilon;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn zero_epsilon_is_greedy() {
        let mut selection = EpsilonGreedy::new(0.0, 5).unwrap();
        let values = array![0.1, 0.9, 0.3, 0.2];
        for _ in 0..1000 {
            assert_eq!(selection.get_action(&values.view()), 1);
        }
    }

    #[test]
    fn greedy_ties_go_to_first_maximum() {
        let mut selection = EpsilonGreedy::new(0.0, 5).unwrap();
        let values = array![0.2, 0.7, 0.7, 0.1];
        assert_eq!(selection.get_action(&values.view()), 1);
    }

    #[test]
    fn full_exploration_is_uniform() {
        let mut selection = EpsilonGreedy::new(1.0, 2024).unwrap();
        let values = array![10.0, 0.0, 0.0, 0.0];
        let draws: usize = 20_000;
        let mut counts = [0usize; 4];
        for _ in 0..draws {
            counts[selection.get_action(&values.view())] += 1;
        }
        let expected: f64 = draws as f64 / 4.0;
        let chi_square: f64 = counts
            .iter()
            .map(|c| (*c as f64 - expected).powi(2) / expected)
            .sum();
        // 3 degrees of freedom, p = 0.0001
        assert!(chi_square < 21.11, "chi-square {} for {:?}", chi_square, counts);
    }

    #[test]
    fn same_seed_same_choices() {
        let values = array![0.5, 0.4, 0.3];
        let mut a = EpsilonGreedy::new(0.5, 9).unwrap();
        let mut b = EpsilonGreedy::new(0.5, 9).unwrap();
        for _ in 0..200 {
            assert_eq!(
                a.get_action(&values.view()),
                b.get_action(&values.view())
            );
        }
    }

    #[test]
    fn out_of_range_epsilon_is_rejected() {
        assert!(EpsilonGreedy::new(-0.1, 0).is_err());
        assert!(EpsilonGreedy::new(1.5, 0).is_err());
        assert!(EpsilonGreedy::new(f64::NAN, 0).is_err());
    }

    #[test]
    fn decay_defaults_to_constant() {
        assert_eq!(EpsilonDecay::default(), EpsilonDecay::Constant);
        let mut selection = EpsilonGreedy::new(0.3, 0)
            .unwrap()
            .with_decay(EpsilonDecay::default())
            .unwrap();
        selection.update();
        assert_eq!(selection.epsilon(), 0.3);
    }

    #[test]
    fn linear_decay_stops_at_final_and_resets() {
        let mut selection = EpsilonGreedy::new(0.5, 0)
            .unwrap()
            .with_decay(EpsilonDecay::Linear {
                step: 0.2,
                final_epsilon: 0.05,
            })
            .unwrap();
        selection.update();
        assert!((selection.epsilon() - 0.3).abs() < 1e-12);
        selection.update();
        selection.update();
        assert!((selection.epsilon() - 0.05).abs() < 1e-12);
        selection.reset();
        assert!((selection.epsilon() - 0.5).abs() < 1e-12);
    }
}

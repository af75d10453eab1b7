use ndarray::{Array1, ArrayView1};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{LearnerError, Result};
use crate::utils::{categorical_sample, max};

use super::ActionSelection;

/// Boltzmann exploration over the action values.
#[derive(Debug, Clone)]
pub struct Softmax {
    temperature: f64,
    dist: Uniform<f64>,
    rng: StdRng,
}

impl Softmax {
    pub fn new(temperature: f64, seed: u64) -> Result<Self> {
        if !temperature.is_finite() || temperature <= 0.0 {
            return Err(LearnerError::invalid(format!(
                "softmax temperature must be positive, got {}",
                temperature
            )));
        }
        Ok(Self {
            temperature,
            dist: Uniform::from(0.0..1.0),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn probabilities(&self, values: &ArrayView1<f64>) -> Array1<f64> {
        let top: f64 = max(values.iter());
        let weights: Array1<f64> = values.mapv(|v| ((v - top) / self.temperature).exp());
        let total: f64 = weights.sum();
        weights / total
    }
}

impl ActionSelection for Softmax {
    fn get_action(&mut self, values: &ArrayView1<f64>) -> usize {
        let probs: Array1<f64> = self.probabilities(values);
        let random: f64 = self.dist.sample(&mut self.rng);
        categorical_sample(&probs.to_vec(), random)
    }

    fn get_exploration_rate(&self) -> f64 {
        self.temperature
    }

    fn update(&mut self) {}

    fn reset(&mut self) {}
}

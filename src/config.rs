use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::action_selection::{EnumActionSelection, EpsilonDecay, EpsilonGreedy, Softmax};
use crate::error::{LearnerError, Result};
use crate::policy::StateKey;
use crate::policy_update::{EnumPolicyUpdate, QStep, SarsaLambda, SarsaStep, SarsaTarget};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    QLearning,
    Sarsa,
    SarsaLambda,
}

impl std::str::FromStr for Algorithm {
    type Err = LearnerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "q_learning" | "qlearning" | "q" => Ok(Algorithm::QLearning),
            "sarsa" => Ok(Algorithm::Sarsa),
            "sarsa_lambda" | "sarsa-lambda" => Ok(Algorithm::SarsaLambda),
            other => Err(LearnerError::invalid(format!(
                "unknown algorithm '{}', expected q_learning, sarsa or sarsa_lambda",
                other
            ))),
        }
    }
}

/// Everything needed to build a learner. Defaults mirror the reference board agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    pub algorithm: Algorithm,
    pub learning_rate: f64,
    pub discount_factor: f64,
    pub epsilon: f64,
    pub epsilon_decay: EpsilonDecay,
    /// Only read by `SarsaLambda`.
    pub lambda: f64,
    pub sarsa_target: SarsaTarget,
    /// Boltzmann exploration at this temperature instead of epsilon-greedy.
    pub softmax_temperature: Option<f64>,
    pub seed: u64,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::QLearning,
            learning_rate: 0.01,
            discount_factor: 0.6,
            epsilon: 0.1,
            epsilon_decay: EpsilonDecay::Constant,
            lambda: 0.9,
            sarsa_target: SarsaTarget::Sampled,
            softmax_temperature: None,
            seed: 42,
        }
    }
}

fn check_unit(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(LearnerError::invalid(format!(
            "{} must be in [0, 1], got {}",
            name, value
        )))
    }
}

impl LearnerConfig {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(LearnerError::invalid(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        check_unit("discount factor", self.discount_factor)?;
        check_unit("epsilon", self.epsilon)?;
        check_unit("lambda", self.lambda)?;
        Ok(())
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path: &Path = path.as_ref();
        let file = File::open(path).map_err(|source| LearnerError::Io {
            operation: format!("open {}", path.display()),
            source,
        })?;
        let config: LearnerConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn build_selection(&self) -> Result<EnumActionSelection> {
        let seed: u64 = self.seed.wrapping_add(1);
        Ok(match self.softmax_temperature {
            Some(temperature) => Softmax::new(temperature, seed)?.into(),
            None => EpsilonGreedy::new(self.epsilon, seed)?
                .with_decay(self.epsilon_decay)?
                .into(),
        })
    }

    pub fn build_update<S: StateKey>(&self) -> Result<EnumPolicyUpdate<S>> {
        Ok(match self.algorithm {
            Algorithm::QLearning => QStep::new().into(),
            Algorithm::Sarsa => SarsaStep::new(self.sarsa_target).into(),
            Algorithm::SarsaLambda => SarsaLambda::new(self.lambda, self.sarsa_target)?.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = LearnerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.learning_rate, 0.01);
        assert_eq!(config.discount_factor, 0.6);
        assert_eq!(config.epsilon, 0.1);
        assert_eq!(config.lambda, 0.9);
    }

    #[test]
    fn out_of_range_values_fail_fast() {
        let cases = [
            LearnerConfig {
                learning_rate: -0.1,
                ..LearnerConfig::default()
            },
            LearnerConfig {
                learning_rate: 0.0,
                ..LearnerConfig::default()
            },
            LearnerConfig {
                discount_factor: 1.5,
                ..LearnerConfig::default()
            },
            LearnerConfig {
                epsilon: -0.01,
                ..LearnerConfig::default()
            },
            LearnerConfig {
                lambda: 2.0,
                ..LearnerConfig::default()
            },
        ];
        for config in cases {
            assert!(matches!(
                config.validate(),
                Err(LearnerError::InvalidConfiguration { .. })
            ));
        }
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"algorithm": "sarsa_lambda", "lambda": 0.5, "sarsa_target": "greedy"}}"#
        )
        .unwrap();
        let config = LearnerConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.algorithm, Algorithm::SarsaLambda);
        assert_eq!(config.lambda, 0.5);
        assert_eq!(config.sarsa_target, SarsaTarget::Greedy);
        assert_eq!(config.learning_rate, 0.01);
    }

    #[test]
    fn builds_matching_update_rule() {
        let config = LearnerConfig::new(Algorithm::SarsaLambda);
        let rule: EnumPolicyUpdate<u8> = config.build_update().unwrap();
        assert!(matches!(rule, EnumPolicyUpdate::SarsaLambda(_)));

        let config = LearnerConfig::new(Algorithm::Sarsa);
        let rule: EnumPolicyUpdate<u8> = config.build_update().unwrap();
        assert!(matches!(rule, EnumPolicyUpdate::SarsaStep(_)));
    }

    #[test]
    fn algorithm_parses_from_cli_names() {
        assert_eq!("sarsa".parse::<Algorithm>().unwrap(), Algorithm::Sarsa);
        assert_eq!(
            "q_learning".parse::<Algorithm>().unwrap(),
            Algorithm::QLearning
        );
        assert!("dqn".parse::<Algorithm>().is_err());
    }
}

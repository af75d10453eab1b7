use kdam::{tqdm, BarExt};
use log::info;

use crate::env::{Board, Environment};
use crate::error::Result;
use crate::learner::Learner;
use crate::policy::StateKey;

#[derive(Debug, Clone, Default)]
pub struct TrainResults {
    pub episode_rewards: Vec<f64>,
    pub episode_lengths: Vec<u128>,
    pub td_errors: Vec<f64>,
}

/// Runs whole episodes of a learner against an environment.
#[derive(Debug, Clone)]
pub struct Trainer {
    pub n_episodes: u128,
    pub max_steps: u128,
    pub show_progress: bool,
}

impl Trainer {
    pub fn new(n_episodes: u128, max_steps: u128) -> Self {
        Self {
            n_episodes,
            max_steps,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn train<S, A, E>(&self, learner: &mut Learner<S, A>, env: &mut E) -> Result<TrainResults>
    where
        S: StateKey,
        A: Copy,
        E: Environment<A> + Board<State = S>,
    {
        let mut results = TrainResults::default();
        let report_every: u128 = (self.n_episodes / 10).max(1);

        let mut pb = if self.show_progress {
            let mut pb = tqdm!(total = self.n_episodes as usize);
            pb.set_description("episodes");
            pb.refresh();
            Some(pb)
        } else {
            None
        };

        for episode in 0..self.n_episodes {
            env.restart();
            learner.reset(&*env)?;
            let mut action_counter: u128 = 0;
            // reward of the last tick before a cut-off, never charged to a decision
            let mut truncated_reward: f64 = 0.0;

            loop {
                if action_counter >= self.max_steps {
                    truncated_reward = env.get_reward()?;
                    break;
                }
                action_counter += 1;
                let action: A = learner.step_on(env)?;
                if let Some(td) = learner.last_temporal_difference() {
                    results.td_errors.push(td);
                }
                let terminated: bool = env.apply(action)?;
                if terminated {
                    results.td_errors.push(learner.terminate(env)?);
                    break;
                }
            }
            learner.end_episode();
            results
                .episode_rewards
                .push(learner.episode_reward() + truncated_reward);
            results.episode_lengths.push(action_counter);

            if (episode + 1) % report_every == 0 {
                let window = &results.episode_rewards[results.episode_rewards.len()
                    - report_every as usize..];
                let mean_reward: f64 = window.iter().sum::<f64>() / window.len() as f64;
                info!(
                    "episode {}/{}: mean reward {:.3}, {} states, exploration {:.3}",
                    episode + 1,
                    self.n_episodes,
                    mean_reward,
                    learner.policy().len(),
                    learner.exploration_rate()
                );
                if let Some(pb) = pb.as_mut() {
                    pb.set_postfix(format!("reward={:.3}", mean_reward));
                }
            }
            if let Some(pb) = pb.as_mut() {
                pb.update(1);
            }
        }
        Ok(results)
    }
}

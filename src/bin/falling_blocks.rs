use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use log::info;
use plotters::style::{RGBColor, BLUE, GREEN, RED};

use tabular_learning::action_selection::EpsilonDecay;
use tabular_learning::action_set::{ActionSet, Move};
use tabular_learning::env::{Board, Environment, FallingBlocksEnv, FallingBlocksState};
use tabular_learning::policy::PolicyTable;
use tabular_learning::policy_update::SarsaTarget;
use tabular_learning::utils::{moving_average, plot_moving_average};
use tabular_learning::{Algorithm, Learner, LearnerConfig, Trainer};

extern crate structopt;

use structopt::StructOpt;

/// Train Q-learning, SARSA and SARSA-lambda on a falling blocks board and plot their learning curves
#[derive(StructOpt, Debug)]
#[structopt(name = "tabular_learning - FallingBlocks")]
struct Cli {
    /// Play one greedy episode with each trained policy and print the board
    #[structopt(long = "show_example")]
    show_example: bool,

    /// Show a progress bar while training
    #[structopt(long = "progress")]
    progress: bool,

    /// JSON file with learner settings, overrides the learner flags below
    #[structopt(long = "config", parse(from_os_str))]
    config: Option<PathBuf>,

    /// Number of episodes for the training
    #[structopt(long = "n_episodes", short = "n", default_value = "2000")]
    n_episodes: u128,

    /// Maximum number of steps per episode
    #[structopt(long = "max_steps", default_value = "500")]
    max_steps: u128,

    /// Width of the well
    #[structopt(long = "width", default_value = "4")]
    width: usize,

    /// Height of the well
    #[structopt(long = "height", default_value = "6")]
    height: usize,

    /// Learning rate of the learners
    #[structopt(long = "learning_rate", default_value = "0.01")]
    learning_rate: f64,

    /// Discount factor used on the temporal difference
    #[structopt(long = "discount_factor", default_value = "0.6")]
    discount_factor: f64,

    /// Initial value for the exploration ratio
    #[structopt(long = "epsilon", default_value = "0.1")]
    epsilon: f64,

    /// Value subtracted from epsilon after each episode, 0 keeps it constant
    #[structopt(long = "epsilon_decay", default_value = "0.0")]
    epsilon_decay: f64,

    /// Lower bound for the exploration ratio
    #[structopt(long = "final_epsilon", default_value = "0.0")]
    final_epsilon: f64,

    /// Lambda factor of the eligibility traces
    #[structopt(long = "lambda", default_value = "0.9")]
    lambda: f64,

    /// Bootstrap SARSA from the greedy action instead of the chosen one
    #[structopt(long = "greedy_target")]
    greedy_target: bool,

    /// Seed for the board and the learners
    #[structopt(long = "seed", default_value = "42")]
    seed: u64,

    /// Moving average window to be used on the visualization of results
    #[structopt(long = "moving_average_window", default_value = "50")]
    moving_average_window: usize,

    /// Directory where the trained policies are written as JSON
    #[structopt(long = "save_policy", parse(from_os_str))]
    save_policy: Option<PathBuf>,

    /// Directory where the plots are written
    #[structopt(long = "plot_dir", parse(from_os_str), default_value = ".")]
    plot_dir: PathBuf,
}

impl Cli {
    fn base_config(&self) -> Result<LearnerConfig, Box<dyn Error>> {
        if let Some(path) = &self.config {
            return Ok(LearnerConfig::from_json_file(path)?);
        }
        let epsilon_decay: EpsilonDecay = if self.epsilon_decay > 0.0 {
            EpsilonDecay::Linear {
                step: self.epsilon_decay,
                final_epsilon: self.final_epsilon,
            }
        } else {
            EpsilonDecay::Constant
        };
        Ok(LearnerConfig {
            learning_rate: self.learning_rate,
            discount_factor: self.discount_factor,
            epsilon: self.epsilon,
            epsilon_decay,
            lambda: self.lambda,
            sarsa_target: if self.greedy_target {
                SarsaTarget::Greedy
            } else {
                SarsaTarget::Sampled
            },
            seed: self.seed,
            ..LearnerConfig::default()
        })
    }
}

fn show_example(
    policy: &PolicyTable<FallingBlocksState>,
    actions: &ActionSet<Move>,
    env: &mut FallingBlocksEnv,
    max_steps: u128,
) -> Result<(), Box<dyn Error>> {
    env.restart();
    println!("{}", env.render());
    for _ in 0..max_steps {
        let state: FallingBlocksState = env.encode()?;
        let action: usize = if policy.contains(&state) {
            policy.greedy_action(&state)?
        } else {
            0
        };
        let terminated: bool = env.apply(actions.get(action)?)?;
        println!("{:?}\n{}", actions.get(action)?, env.render());
        if terminated {
            break;
        }
    }
    println!("lines cleared: {}", env.lines_cleared());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli: Cli = Cli::from_args();

    let base: LearnerConfig = cli.base_config()?;
    base.validate()?;
    let trainer = Trainer::new(cli.n_episodes, cli.max_steps).with_progress(cli.progress);
    let window: usize = cli.moving_average_window;

    let mut env = FallingBlocksEnv::new(cli.width, cli.height, cli.seed)?;

    let algorithms = [Algorithm::QLearning, Algorithm::Sarsa, Algorithm::SarsaLambda];
    let legends: Vec<&str> = ["Q-learning", "SARSA", "SARSA-λ"].to_vec();
    let colors: Vec<RGBColor> = [BLUE, GREEN, RED].to_vec();

    let mut rewards: Vec<Vec<f64>> = vec![];
    let mut episodes_length: Vec<Vec<f64>> = vec![];
    let mut errors: Vec<Vec<f64>> = vec![];

    for (i, algorithm) in algorithms.into_iter().enumerate() {
        let config = LearnerConfig {
            algorithm,
            ..base.clone()
        };
        env.restart();
        let mut learner: Learner<FallingBlocksState, Move> =
            Learner::new(&config, ActionSet::standard(), &env)?;

        let now: Instant = Instant::now();
        let results = trainer.train(&mut learner, &mut env)?;
        let elapsed: std::time::Duration = now.elapsed();
        println!(
            "{} {:.2?} ({} states)",
            legends[i],
            elapsed,
            learner.policy().len()
        );

        rewards.push(moving_average(window, &results.episode_rewards));
        episodes_length.push(moving_average(
            window,
            &results
                .episode_lengths
                .iter()
                .map(|x| *x as f64)
                .collect::<Vec<f64>>(),
        ));
        errors.push(moving_average(
            (results.td_errors.len() / cli.n_episodes.max(1) as usize).max(1) * window,
            &results.td_errors,
        ));

        if let Some(dir) = &cli.save_policy {
            let path: PathBuf = dir.join(format!("{:?}.json", algorithm).to_lowercase());
            learner.policy().save_json(&path)?;
            info!("policy written to {}", path.display());
        }
        if cli.show_example {
            show_example(learner.policy(), learner.actions(), &mut env, cli.max_steps)?;
        }
    }

    plot_moving_average(
        &rewards,
        &colors,
        &legends,
        "Rewards",
        &cli.plot_dir.join("rewards.png"),
    )?;
    plot_moving_average(
        &episodes_length,
        &colors,
        &legends,
        "Episodes Length",
        &cli.plot_dir.join("episodes_length.png"),
    )?;
    plot_moving_average(
        &errors,
        &colors,
        &legends,
        "Training Error",
        &cli.plot_dir.join("training_error.png"),
    )?;
    Ok(())
}

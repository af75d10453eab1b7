mod falling_blocks;

use ndarray::Array2;
use thiserror::Error;

use crate::policy::StateKey;

pub use falling_blocks::{FallingBlocksEnv, FallingBlocksState};

/// Dense picture of the board, one cell per entry.
pub type Grid = Array2<f32>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnvError {
    #[error("environment not ready, call restart first")]
    NotReady,

    #[error("failed to encode board: {0}")]
    Encode(String),

    #[error("reward unavailable: {0}")]
    Reward(String),

    #[error("unsupported board size {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
}

pub trait Board {
    type State: StateKey;

    fn encode(&self) -> Result<Self::State, EnvError>;

    fn encode_image(&self) -> Result<Grid, EnvError>;

    fn height(&self) -> usize;

    fn width(&self) -> usize;
}

pub trait WorldFeedback {
    /// Reward for everything that happened since the previous call.
    fn get_reward(&mut self) -> Result<f64, EnvError>;
}

/// A board that can be driven by the trainer.
pub trait Environment<A>: Board + WorldFeedback {
    /// Applies one action and advances the game by a tick. Returns true once the episode is over.
    fn apply(&mut self, action: A) -> Result<bool, EnvError>;

    fn restart(&mut self);
}

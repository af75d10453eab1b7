use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::action_set::Move;

use super::{Board, EnvError, Environment, Grid, WorldFeedback};

const LINE_REWARD: f64 = 1.0;
const GAME_OVER_REWARD: f64 = -1.0;

/// Column heights plus the falling piece, row 0 being the top row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FallingBlocksState {
    pub heights: Vec<u8>,
    pub piece_col: u8,
    pub piece_row: u8,
}

/// Single-cell pieces falling into a well.
///
/// Pieces only ever rest on top of a column, so the stack is fully described by
/// the column heights. A full bottom row is cleared at once.
#[derive(Debug, Clone)]
pub struct FallingBlocksEnv {
    width: usize,
    height: usize,
    heights: Vec<usize>,
    piece_col: usize,
    piece_row: usize,
    pending_reward: f64,
    lines_cleared: u64,
    over: bool,
    spawn_dist: Uniform<usize>,
    rng: StdRng,
}

impl FallingBlocksEnv {
    pub fn new(width: usize, height: usize, seed: u64) -> Result<Self, EnvError> {
        if width == 0 || height < 2 || height > u8::MAX as usize || width > u8::MAX as usize {
            return Err(EnvError::InvalidDimensions { width, height });
        }
        let mut env = Self {
            width,
            height,
            heights: vec![0; width],
            piece_col: 0,
            piece_row: 0,
            pending_reward: 0.0,
            lines_cleared: 0,
            over: false,
            spawn_dist: Uniform::from(0..width),
            rng: StdRng::seed_from_u64(seed),
        };
        env.restart();
        Ok(env)
    }

    fn occupied(&self, col: usize, row: usize) -> bool {
        row >= self.height || row + self.heights[col] >= self.height
    }

    fn spawn(&mut self) {
        self.piece_col = self.spawn_dist.sample(&mut self.rng);
        self.piece_row = 0;
        if self.occupied(self.piece_col, self.piece_row) {
            self.over = true;
            self.pending_reward += GAME_OVER_REWARD;
        }
    }

    fn lock(&mut self) {
        self.heights[self.piece_col] += 1;
        let cleared: usize = self.heights.iter().copied().min().unwrap_or(0);
        if cleared > 0 {
            for h in self.heights.iter_mut() {
                *h -= cleared;
            }
            self.lines_cleared += cleared as u64;
            self.pending_reward += LINE_REWARD * cleared as f64;
        }
        self.spawn();
    }

    fn shift(&mut self, col: usize) {
        if !self.occupied(col, self.piece_row) {
            self.piece_col = col;
        }
    }

    fn fall(&mut self) -> bool {
        if self.occupied(self.piece_col, self.piece_row + 1) {
            false
        } else {
            self.piece_row += 1;
            true
        }
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn lines_cleared(&self) -> u64 {
        self.lines_cleared
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for row in 0..self.height {
            for col in 0..self.width {
                let c = if !self.over && col == self.piece_col && row == self.piece_row {
                    '@'
                } else if self.occupied(col, row) {
                    '#'
                } else {
                    '.'
                };
                out.push(c);
            }
            out.push('\n');
        }
        out
    }
}

impl Board for FallingBlocksEnv {
    type State = FallingBlocksState;

    fn encode(&self) -> Result<FallingBlocksState, EnvError> {
        Ok(FallingBlocksState {
            heights: self.heights.iter().map(|h| *h as u8).collect(),
            piece_col: self.piece_col as u8,
            piece_row: self.piece_row as u8,
        })
    }

    fn encode_image(&self) -> Result<Grid, EnvError> {
        let mut grid = Grid::zeros((self.height, self.width));
        for ((row, col), cell) in grid.indexed_iter_mut() {
            if self.occupied(col, row) {
                *cell = 1.0;
            }
        }
        if !self.over {
            grid[[self.piece_row, self.piece_col]] = 0.5;
        }
        Ok(grid)
    }

    fn height(&self) -> usize {
        self.height
    }

    fn width(&self) -> usize {
        self.width
    }
}

impl WorldFeedback for FallingBlocksEnv {
    fn get_reward(&mut self) -> Result<f64, EnvError> {
        let reward: f64 = self.pending_reward;
        self.pending_reward = 0.0;
        Ok(reward)
    }
}

impl Environment<Move> for FallingBlocksEnv {
    fn apply(&mut self, action: Move) -> Result<bool, EnvError> {
        if self.over {
            return Err(EnvError::NotReady);
        }
        match action {
            Move::Nothing => {}
            Move::Left => {
                if self.piece_col > 0 {
                    self.shift(self.piece_col - 1);
                }
            }
            Move::Right => {
                if self.piece_col + 1 < self.width {
                    self.shift(self.piece_col + 1);
                }
            }
            Move::Down => {
                self.fall();
            }
        }
        if !self.fall() {
            self.lock();
        }
        Ok(self.over)
    }

    fn restart(&mut self) {
        self.heights = vec![0; self.width];
        self.pending_reward = 0.0;
        self.lines_cleared = 0;
        self.over = false;
        self.spawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pieces_spawn_on_top_row_of_empty_well() {
        let env = FallingBlocksEnv::new(4, 5, 1).unwrap();
        let state = env.encode().unwrap();
        assert_eq!(state.piece_row, 0);
        assert!(state.piece_col < 4);
        assert_eq!(state.heights, vec![0, 0, 0, 0]);
    }

    #[test]
    fn walls_stop_sideways_moves() {
        let mut env = FallingBlocksEnv::new(3, 6, 1).unwrap();
        env.piece_col = 0;
        env.apply(Move::Left).unwrap();
        assert_eq!(env.piece_col, 0);
        env.piece_col = 2;
        env.apply(Move::Right).unwrap();
        assert_eq!(env.piece_col, 2);
    }

    #[test]
    fn stacked_columns_block_sideways_moves() {
        let mut env = FallingBlocksEnv::new(3, 4, 1).unwrap();
        env.heights = vec![0, 3, 0];
        env.piece_col = 0;
        env.piece_row = 1;
        env.apply(Move::Right).unwrap();
        assert_eq!(env.piece_col, 0);
    }

    #[test]
    fn piece_locks_on_the_floor() {
        let mut env = FallingBlocksEnv::new(3, 3, 1).unwrap();
        env.piece_col = 1;
        env.apply(Move::Down).unwrap();
        assert_eq!(env.piece_row, 2);
        env.apply(Move::Nothing).unwrap();
        assert_eq!(env.heights, vec![0, 1, 0]);
        assert_eq!(env.piece_row, 0);
    }

    #[test]
    fn full_bottom_row_is_cleared_and_rewarded() {
        let mut env = FallingBlocksEnv::new(2, 3, 1).unwrap();
        env.heights = vec![1, 0];
        env.piece_col = 1;
        env.piece_row = 2;
        let over = env.apply(Move::Nothing).unwrap();
        assert!(!over);
        assert_eq!(env.heights, vec![0, 0]);
        assert_eq!(env.lines_cleared(), 1);
        assert_eq!(env.get_reward().unwrap(), 1.0);
        assert_eq!(env.get_reward().unwrap(), 0.0);
    }

    #[test]
    fn spawning_into_a_full_column_ends_the_game() {
        let mut env = FallingBlocksEnv::new(2, 2, 1).unwrap();
        env.heights = vec![2, 0];
        for _ in 0..64 {
            if env.is_over() {
                break;
            }
            env.spawn();
        }
        assert!(env.is_over());
        assert_eq!(env.piece_col, 0);
        assert_eq!(env.get_reward().unwrap(), GAME_OVER_REWARD);
        assert!(matches!(env.apply(Move::Nothing), Err(EnvError::NotReady)));

        env.restart();
        assert!(!env.is_over());
        assert_eq!(env.heights, vec![0, 0]);
    }

    #[test]
    fn image_marks_stack_and_piece() {
        let mut env = FallingBlocksEnv::new(2, 3, 1).unwrap();
        env.heights = vec![1, 0];
        env.piece_col = 1;
        env.piece_row = 0;
        let image = env.encode_image().unwrap();
        assert_eq!(image.dim(), (3, 2));
        assert_eq!(image[[2, 0]], 1.0);
        assert_eq!(image[[0, 1]], 0.5);
        assert_eq!(image[[2, 1]], 0.0);
    }

    #[test]
    fn bad_dimensions_are_rejected() {
        assert!(FallingBlocksEnv::new(0, 5, 0).is_err());
        assert!(FallingBlocksEnv::new(3, 1, 0).is_err());
    }
}

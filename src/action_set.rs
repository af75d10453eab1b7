use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{LearnerError, Result};

/// Moves available to a falling piece. The order is the index order of every value vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Nothing,
    Left,
    Right,
    Down,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Nothing, Move::Left, Move::Right, Move::Down];
}

#[derive(Debug, Clone)]
pub struct ActionSet<A> {
    actions: Vec<A>,
    dist: Uniform<usize>,
}

impl<A: Copy> ActionSet<A> {
    pub fn new(actions: Vec<A>) -> Result<Self> {
        if actions.is_empty() {
            return Err(LearnerError::invalid("action set must not be empty"));
        }
        let dist = Uniform::from(0..actions.len());
        Ok(Self { actions, dist })
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<A> {
        self.actions.get(index).copied().ok_or_else(|| {
            LearnerError::invalid(format!(
                "action index {} out of range for {} actions",
                index,
                self.actions.len()
            ))
        })
    }

    pub fn sample_index<R: Rng>(&self, rng: &mut R) -> usize {
        self.dist.sample(rng)
    }

    pub fn actions(&self) -> &[A] {
        &self.actions
    }
}

impl ActionSet<Move> {
    pub fn standard() -> Self {
        Self {
            actions: Move::ALL.to_vec(),
            dist: Uniform::from(0..Move::ALL.len()),
        }
    }
}

pub mod action_selection;
pub mod action_set;
pub mod config;
pub mod env;
pub mod error;
pub mod policy;
pub mod policy_update;
pub mod trace;
pub mod utils;

mod learner;
mod trainer;

pub use config::{Algorithm, LearnerConfig};
pub use error::{LearnerError, Result};
pub use learner::{Cursor, Learner};
pub use trainer::{TrainResults, Trainer};

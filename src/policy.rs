use std::fmt::Debug;
use std::fs::File;
use std::hash::Hash;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use fxhash::FxBuildHasher;
use indexmap::IndexSet;
use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{LearnerError, Result};
use crate::utils::{argmax, max};

/// Anything the board can hand out as a lookup key.
pub trait StateKey: Hash + Eq + Clone + Debug {}

impl<T: Hash + Eq + Clone + Debug> StateKey for T {}

/// State keys mapped to rows of a dense value arena.
///
/// A row is created the first time a state is passed to [`PolicyTable::ensure_entry`]
/// and lives until the table is dropped. Row `i` belongs to the `i`-th inserted state.
#[derive(Debug, Clone)]
pub struct PolicyTable<S: StateKey> {
    n_actions: usize,
    states: IndexSet<S, FxBuildHasher>,
    values: Array2<f64>,
    rng: StdRng,
}

/// Serializable form of a table: `(state, values)` pairs in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySnapshot<S> {
    pub n_actions: usize,
    pub entries: Vec<(S, Vec<f64>)>,
}

impl<S: StateKey> PolicyTable<S> {
    pub fn new(n_actions: usize, seed: u64) -> Self {
        Self {
            n_actions,
            states: IndexSet::with_hasher(FxBuildHasher::default()),
            values: Array2::zeros((0, n_actions)),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Registers `state` with values drawn uniformly from [0, 1). No-op if already present.
    pub fn ensure_entry(&mut self, state: &S) -> Result<()> {
        if self.states.contains(state) {
            return Ok(());
        }
        let row: Array1<f64> =
            Array1::random_using(self.n_actions, Uniform::new(0.0, 1.0), &mut self.rng);
        self.values.push_row(row.view())?;
        self.states.insert(state.clone());
        Ok(())
    }

    fn row_of(&self, state: &S) -> Result<usize> {
        self.states
            .get_index_of(state)
            .ok_or_else(|| LearnerError::key_not_found(state))
    }

    pub fn values(&self, state: &S) -> Result<ArrayView1<f64>> {
        let row: usize = self.row_of(state)?;
        Ok(self.values.row(row))
    }

    pub fn values_mut(&mut self, state: &S) -> Result<ArrayViewMut1<f64>> {
        let row: usize = self.row_of(state)?;
        Ok(self.values.row_mut(row))
    }

    pub fn get(&self, state: &S, action: usize) -> Result<f64> {
        let values = self.values(state)?;
        values.get(action).copied().ok_or_else(|| {
            LearnerError::invalid(format!(
                "action index {} out of range for {} actions",
                action, self.n_actions
            ))
        })
    }

    pub fn add(&mut self, state: &S, action: usize, amount: f64) -> Result<()> {
        let n_actions: usize = self.n_actions;
        let mut values = self.values_mut(state)?;
        match values.get_mut(action) {
            Some(value) => {
                *value += amount;
                Ok(())
            }
            None => Err(LearnerError::invalid(format!(
                "action index {} out of range for {} actions",
                action, n_actions
            ))),
        }
    }

    pub fn max_value(&self, state: &S) -> Result<f64> {
        Ok(max(self.values(state)?.iter()))
    }

    pub fn greedy_action(&self, state: &S) -> Result<usize> {
        Ok(argmax(self.values(state)?.iter()))
    }

    pub fn contains(&self, state: &S) -> bool {
        self.states.contains(state)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    pub fn states(&self) -> impl Iterator<Item = &S> {
        self.states.iter()
    }

    pub fn snapshot(&self) -> PolicySnapshot<S> {
        let entries = self
            .states
            .iter()
            .zip(self.values.rows())
            .map(|(state, values)| (state.clone(), values.to_vec()))
            .collect();
        PolicySnapshot {
            n_actions: self.n_actions,
            entries,
        }
    }

    /// Rebuilds a table; `seed` drives initialization of states seen from now on.
    pub fn from_snapshot(snapshot: PolicySnapshot<S>, seed: u64) -> Result<Self> {
        let mut table = Self::new(snapshot.n_actions, seed);
        for (state, values) in snapshot.entries {
            if values.len() != snapshot.n_actions {
                return Err(LearnerError::invalid(format!(
                    "state {:?} has {} values, expected {}",
                    state,
                    values.len(),
                    snapshot.n_actions
                )));
            }
            if table.states.contains(&state) {
                return Err(LearnerError::invalid(format!(
                    "state {:?} appears twice in snapshot",
                    state
                )));
            }
            table.values.push_row(ArrayView1::from(&values))?;
            table.states.insert(state);
        }
        Ok(table)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()>
    where
        S: Serialize,
    {
        let path: &Path = path.as_ref();
        let file = File::create(path).map_err(|source| LearnerError::Io {
            operation: format!("create {}", path.display()),
            source,
        })?;
        serde_json::to_writer(BufWriter::new(file), &self.snapshot())?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P, seed: u64) -> Result<Self>
    where
        S: DeserializeOwned,
    {
        let path: &Path = path.as_ref();
        let file = File::open(path).map_err(|source| LearnerError::Io {
            operation: format!("open {}", path.display()),
            source,
        })?;
        let snapshot: PolicySnapshot<S> = serde_json::from_reader(BufReader::new(file))?;
        Self::from_snapshot(snapshot, seed)
    }
}

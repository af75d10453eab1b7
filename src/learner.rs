use log::{debug, trace};

use crate::action_selection::{select, ActionSelection, EnumActionSelection};
use crate::action_set::ActionSet;
use crate::config::LearnerConfig;
use crate::env::{Board, EnvError, WorldFeedback};
use crate::error::{LearnerError, Result};
use crate::policy::{PolicyTable, StateKey};
use crate::policy_update::{EnumPolicyUpdate, PolicyUpdate, Transition};
use crate::trace::EligibilityTrace;

/// The previous decision, charged once its reward shows up on the next step.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor<S> {
    pub last_state: S,
    pub last_action: usize,
}

/// Tabular agent driven one decision tick at a time.
///
/// Every call to [`Learner::step`] selects an action for the current board and
/// uses the reward observed since the previous call to update the pair chosen then.
#[derive(Debug, Clone)]
pub struct Learner<S: StateKey, A> {
    actions: ActionSet<A>,
    policy: PolicyTable<S>,
    selection: EnumActionSelection,
    update: EnumPolicyUpdate<S>,
    learning_rate: f64,
    discount_factor: f64,
    cursor: Cursor<S>,
    last_temporal_difference: Option<f64>,
    episode_reward: f64,
}

impl<S: StateKey, A: Copy> Learner<S, A> {
    pub fn new<B: Board<State = S>>(
        config: &LearnerConfig,
        actions: ActionSet<A>,
        board: &B,
    ) -> Result<Self> {
        config.validate()?;
        let policy: PolicyTable<S> = PolicyTable::new(actions.len(), config.seed);
        Self::from_parts(
            actions,
            policy,
            config.build_selection()?,
            config.build_update()?,
            config.learning_rate,
            config.discount_factor,
            board,
        )
    }

    /// Assembles a learner around an existing table, e.g. one loaded from disk.
    pub fn from_parts<B: Board<State = S>>(
        actions: ActionSet<A>,
        policy: PolicyTable<S>,
        selection: EnumActionSelection,
        update: EnumPolicyUpdate<S>,
        learning_rate: f64,
        discount_factor: f64,
        board: &B,
    ) -> Result<Self> {
        if !learning_rate.is_finite() || learning_rate <= 0.0 {
            return Err(LearnerError::invalid(format!(
                "learning rate must be positive, got {}",
                learning_rate
            )));
        }
        if !(0.0..=1.0).contains(&discount_factor) {
            return Err(LearnerError::invalid(format!(
                "discount factor must be in [0, 1], got {}",
                discount_factor
            )));
        }
        if policy.n_actions() != actions.len() {
            return Err(LearnerError::invalid(format!(
                "policy table holds {} actions but the action set has {}",
                policy.n_actions(),
                actions.len()
            )));
        }
        let mut learner = Self {
            actions,
            policy,
            selection,
            update,
            learning_rate,
            discount_factor,
            cursor: Cursor {
                last_state: board.encode()?,
                last_action: 0,
            },
            last_temporal_difference: None,
            episode_reward: 0.0,
        };
        learner.reset(board)?;
        Ok(learner)
    }

    /// Starts a new episode from the board's current configuration.
    pub fn reset<B: Board<State = S>>(&mut self, board: &B) -> Result<()> {
        let state: S = board.encode()?;
        self.policy.ensure_entry(&state)?;
        self.cursor = Cursor {
            last_state: state,
            last_action: 0,
        };
        self.update.reset();
        self.last_temporal_difference = None;
        self.episode_reward = 0.0;
        debug!(
            "learner reset at {:?} ({} states known)",
            self.cursor.last_state,
            self.policy.len()
        );
        Ok(())
    }

    pub fn step<B, F>(&mut self, board: &B, feedback: &mut F) -> Result<A>
    where
        B: Board<State = S>,
        F: WorldFeedback,
    {
        let state: S = board.encode()?;
        self.advance(state, || feedback.get_reward())
    }

    /// Same as [`Learner::step`] for an environment that is its own reward source.
    pub fn step_on<E>(&mut self, env: &mut E) -> Result<A>
    where
        E: Board<State = S> + WorldFeedback,
    {
        let state: S = env.encode()?;
        self.advance(state, || env.get_reward())
    }

    fn advance<R>(&mut self, state: S, reward_source: R) -> Result<A>
    where
        R: FnOnce() -> std::result::Result<f64, EnvError>,
    {
        self.policy.ensure_entry(&state)?;
        let action: usize = select(&mut self.selection, &self.policy, &state)?;
        let chosen: A = self.actions.get(action)?;
        let reward: f64 = reward_source()?;

        let transition = Transition {
            last_state: &self.cursor.last_state,
            last_action: self.cursor.last_action,
            reward,
            next: Some((&state, action)),
        };
        let temporal_difference: f64 = self.update.update(
            &mut self.policy,
            &transition,
            self.learning_rate,
            self.discount_factor,
        )?;
        trace!(
            "step {:?} -> action {} reward {} td {}",
            state,
            action,
            reward,
            temporal_difference
        );

        self.cursor = Cursor {
            last_state: state,
            last_action: action,
        };
        self.last_temporal_difference = Some(temporal_difference);
        self.episode_reward += reward;
        Ok(chosen)
    }

    /// Charges the final reward of an episode to the last decision, without bootstrapping.
    pub fn terminate<F: WorldFeedback>(&mut self, feedback: &mut F) -> Result<f64> {
        let reward: f64 = feedback.get_reward()?;
        let transition = Transition {
            last_state: &self.cursor.last_state,
            last_action: self.cursor.last_action,
            reward,
            next: None,
        };
        let temporal_difference: f64 = self.update.update(
            &mut self.policy,
            &transition,
            self.learning_rate,
            self.discount_factor,
        )?;
        self.last_temporal_difference = Some(temporal_difference);
        self.episode_reward += reward;
        debug!(
            "episode terminated, reward {} td {}",
            self.episode_reward, temporal_difference
        );
        Ok(temporal_difference)
    }

    /// Advances the exploration schedule once per finished episode.
    pub fn end_episode(&mut self) {
        self.selection.update();
    }

    pub fn policy(&self) -> &PolicyTable<S> {
        &self.policy
    }

    pub fn into_policy(self) -> PolicyTable<S> {
        self.policy
    }

    pub fn cursor(&self) -> &Cursor<S> {
        &self.cursor
    }

    pub fn trace(&self) -> Option<&EligibilityTrace<S>> {
        self.update.trace()
    }

    pub fn actions(&self) -> &ActionSet<A> {
        &self.actions
    }

    pub fn last_temporal_difference(&self) -> Option<f64> {
        self.last_temporal_difference
    }

    pub fn episode_reward(&self) -> f64 {
        self.episode_reward
    }

    pub fn exploration_rate(&self) -> f64 {
        self.selection.get_exploration_rate()
    }
}

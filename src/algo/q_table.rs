use std::{collections::HashMap, fmt};

use log::{debug, info, trace};
use rand::{seq::SliceRandom, thread_rng};
use strum::{EnumCount, VariantArray};

use crate::{
    assert_interval,
    env::{DiscreteActionSpace, Environment},
    grid::Position,
    gridworld::{Action, GridWorld},
};

/// One table row: an action value per [`Action`], indexed by discriminant
pub type Row = [f32; Action::COUNT];

/// A table of action values keyed by grid position
///
/// Rows spring into existence zeroed on first touch, so a value can be read
/// for any position before it has ever been updated.
#[derive(Debug, Clone)]
pub struct QTable {
    rows: HashMap<Position, Row>,
}

impl QTable {
    /// Create a table with a zeroed row for every given position
    pub fn new(positions: impl IntoIterator<Item = Position>) -> Self {
        Self {
            rows: positions
                .into_iter()
                .map(|pos| (pos, [0.0; Action::COUNT]))
                .collect(),
        }
    }

    /// The row for `pos`, registering a zeroed one if absent
    pub fn row_mut(&mut self, pos: Position) -> &mut Row {
        self.rows.entry(pos).or_insert([0.0; Action::COUNT])
    }

    /// The value of taking `action` at `pos`
    pub fn get(&mut self, pos: Position, action: Action) -> f32 {
        self.row_mut(pos)[action as usize]
    }

    pub fn set(&mut self, pos: Position, action: Action, value: f32) {
        self.row_mut(pos)[action as usize] = value;
    }

    /// The highest action value at `pos`
    pub fn best_value(&mut self, pos: Position) -> f32 {
        self.row_mut(pos)
            .iter()
            .copied()
            .max_by(|a, b| a.partial_cmp(b).unwrap())
            .unwrap_or(0.0)
    }

    /// Fold one step of experience into the table
    ///
    /// Applies `Q(s,a) = (1 - alpha) * Q(s,a) + alpha * (reward + gamma * max Q(s',a'))`.
    /// Reading the next row registers it, so every position reached during
    /// training shows up in the report, terminal cells included.
    pub fn update(
        &mut self,
        state: Position,
        action: Action,
        next_state: Position,
        reward: f32,
        alpha: f32,
        gamma: f32,
    ) {
        let old_value = self.get(state, action);
        let next_max = self.best_value(next_state);
        let new_value = reward + gamma * next_max;
        let weighted_value = (1.0 - alpha) * old_value + alpha * new_value;
        self.set(state, action, weighted_value);
    }

    /// Every known position, in report order
    pub fn positions(&self) -> Vec<Position> {
        let mut positions = self.rows.keys().copied().collect::<Vec<_>>();
        positions.sort();
        positions
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The table report: a header of action names, then one `(x, y): ` line per
/// known position in order, tab-separated two-decimal values, with `----` in
/// place of exactly-zero values so untouched entries stand out
impl fmt::Display for QTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State")?;
        for action in Action::VARIANTS {
            write!(f, "\t{action}")?;
        }
        writeln!(f)?;

        for pos in self.positions() {
            let values = self.rows[&pos]
                .iter()
                .map(|&value| {
                    if value == 0.0 {
                        "----".to_string()
                    } else {
                        format!("{value:.2}")
                    }
                })
                .collect::<Vec<_>>();
            writeln!(f, "{}: {}", pos, values.join("\t"))?;
        }
        Ok(())
    }
}

/// Configuration for the [`QTableAgent`]
pub struct QTableAgentConfig {
    pub alpha: f32,
    pub gamma: f32,
    pub max_steps: u32,
}

impl Default for QTableAgentConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.9,
            max_steps: 1000,
        }
    }
}

/// How a training episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeOutcome {
    /// Stepped onto a reward cell
    Terminal,
    /// No legal action remained
    Stuck,
    /// Hit the per-episode step cap
    StepLimit,
}

/// A Q-learning agent that explores a [`GridWorld`] by uniform random moves
///
/// The policy never exploits during training. Each step folds its result into
/// the shared [`QTable`], which is the only state carried across episodes.
pub struct QTableAgent {
    table: QTable,
    alpha: f32,     // learning rate
    gamma: f32,     // discount factor
    max_steps: u32, // per-episode step cap
    episode: u32,   // current episode
}

impl QTableAgent {
    /// Initialize a new agent for a given world
    ///
    /// The table starts with a zeroed row for every possible start cell, so
    /// even an untrained agent reports them all.
    ///
    /// **Panics** if `alpha` or `gamma` is not in the interval `[0,1]`
    pub fn new(world: &GridWorld, config: QTableAgentConfig) -> Self {
        assert_interval!(config.alpha, 0.0, 1.0);
        assert_interval!(config.gamma, 0.0, 1.0);
        Self {
            table: QTable::new(world.grid().start_cells()),
            alpha: config.alpha,
            gamma: config.gamma,
            max_steps: config.max_steps,
            episode: 0,
        }
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    /// Run one training episode from a fresh random start
    ///
    /// Actions are drawn uniformly from the legal moves at each step. The
    /// step cap keeps an episode finite on maps with no reachable reward.
    pub fn go(&mut self, env: &mut GridWorld) -> EpisodeOutcome {
        let mut state = env.reset();
        let mut steps = 0;

        let outcome = loop {
            if steps >= self.max_steps {
                break EpisodeOutcome::StepLimit;
            }
            let actions = env.actions();
            let action = match actions.choose(&mut thread_rng()) {
                Some(&action) => action,
                None => break EpisodeOutcome::Stuck,
            };

            let (next_state, reward) = env.step(action);
            self.table
                .update(state, action, next_state, reward, self.alpha, self.gamma);
            state = next_state;
            steps += 1;
            trace!("episode {} step {}\n{}", self.episode, steps, env);

            if env.is_terminal() {
                break EpisodeOutcome::Terminal;
            }
        };

        self.episode += 1;
        outcome
    }

    /// Train for a number of episodes, draining the environment's report
    /// between episodes and logging a summary at the end
    pub fn learn(&mut self, env: &mut GridWorld, episodes: u32) {
        let mut terminal = 0;
        let mut stuck = 0;
        let mut capped = 0;

        for _ in 0..episodes {
            let outcome = self.go(env);
            match outcome {
                EpisodeOutcome::Terminal => terminal += 1,
                EpisodeOutcome::Stuck => stuck += 1,
                EpisodeOutcome::StepLimit => capped += 1,
            }
            // Drained whether or not the stats get logged
            let stats = env.report.take();
            debug!(
                "episode {} ended {:?} with stats {:?}",
                self.episode, outcome, stats
            );
        }

        info!(
            "trained {episodes} episodes over {} positions: {terminal} terminal, {stuck} stuck, {capped} capped",
            self.table.len()
        );
    }
}

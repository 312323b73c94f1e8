use std::collections::{btree_map, BTreeMap};
use std::ops::Index;

/// Represents a Markov decision process, defining the dynamics of an environment
/// in which an agent can operate.
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State;

    /// A representation of an action that an agent can take to affect the environment
    type Action;

    /// Reset the environment to a fresh starting state
    ///
    /// **Returns** the state
    fn reset(&mut self) -> Self::State;

    /// Update the environment in response to an action taken by an agent
    ///
    /// **Returns** `(next_state, reward)`. The next state is returned even when
    /// it ends the episode, so a learner can still look it up.
    fn step(&mut self, action: Self::Action) -> (Self::State, f32);

    /// Whether the current state ends the episode
    fn is_terminal(&self) -> bool;
}

/// An environment with a finite action set
pub trait DiscreteActionSpace: Environment {
    /// The legal actions for the current state, in a fixed order
    ///
    /// An empty result means no legal move remains and the agent is stuck.
    fn actions(&self) -> Vec<Self::Action>;
}

/// Per-episode statistics accumulated by an environment
///
/// Keys are fixed at construction; values accumulate across steps until
/// [`take`](Report::take) drains them for reporting.
#[derive(Debug, Clone, Default)]
pub struct Report(BTreeMap<&'static str, f64>);

impl Report {
    /// Initialize a report with the given stat keys, all zero
    pub fn new(keys: Vec<&'static str>) -> Self {
        Self(keys.into_iter().map(|key| (key, 0.0)).collect())
    }

    /// Entry API for updating a stat in place
    pub fn entry(&mut self, key: &'static str) -> btree_map::Entry<'_, &'static str, f64> {
        self.0.entry(key)
    }

    /// The stat keys, in iteration order
    pub fn keys(&self) -> Vec<&'static str> {
        self.0.keys().copied().collect()
    }

    /// Take the accumulated stats, resetting every value to zero
    pub fn take(&mut self) -> BTreeMap<&'static str, f64> {
        let drained = self.0.clone();
        for value in self.0.values_mut() {
            *value = 0.0;
        }
        drained
    }
}

impl Index<&str> for Report {
    type Output = f64;

    fn index(&self, key: &str) -> &Self::Output {
        &self.0[key]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_accumulates_and_drains() {
        let mut report = Report::new(vec!["steps", "reward"]);
        report.entry("steps").and_modify(|x| *x += 1.0);
        report.entry("steps").and_modify(|x| *x += 1.0);
        report.entry("reward").and_modify(|x| *x += -10.0);
        assert_eq!(report["steps"], 2.0, "Steps accumulated");
        assert_eq!(report["reward"], -10.0, "Reward accumulated");

        let drained = report.take();
        assert_eq!(drained["steps"], 2.0, "Drained values preserved");
        assert_eq!(report["steps"], 0.0, "Counters reset after take");
        assert_eq!(report["reward"], 0.0, "Counters reset after take");
    }

    #[test]
    fn report_keys_are_ordered() {
        let report = Report::new(vec!["steps", "reward"]);
        assert_eq!(report.keys(), ["reward", "steps"], "Keys iterate in order");
    }
}

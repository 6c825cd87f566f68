// Tabular RL policies that steer the generation prompt
// Each variant maps an opaque state token to one of three improvement directives

pub mod meta;
pub mod ppo;
pub mod q_learning;
pub mod sarsa;

pub use meta::MetaAgent;
pub use ppo::Ppo;
pub use q_learning::QLearning;
pub use sarsa::Sarsa;

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// State token used before any score has been observed
pub const INITIAL_STATE: &str = "initial";

/// Improvement directives the policies choose between
///
/// The set is closed: the prompt template, the tables, and the PPO
/// distributions all assume exactly these three actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ImproveModularity,
    AddFeatures,
    FixBugs,
}

impl Action {
    pub const ALL: [Action; 3] = [
        Action::ImproveModularity,
        Action::AddFeatures,
        Action::FixBugs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ImproveModularity => "improve_modularity",
            Action::AddFeatures => "add_features",
            Action::FixBugs => "fix_bugs",
        }
    }

    /// Pick a uniformly random action
    pub fn random(rng: &mut impl Rng) -> Action {
        Action::ALL[rng.gen_range(0..Action::ALL.len())]
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive the state token for an averaged evaluation score
pub fn state_for_score(avg_score: f64) -> String {
    format!("score_{}", avg_score.floor() as i64)
}

/// Shared contract for the swappable update rules
///
/// Instances own their tables; the simulation owns the state token and is
/// the only caller. `update` returns the action the caller should treat as
/// taken next: SARSA returns `next_action` to keep its on-policy semantics,
/// the others echo `action` back.
pub trait RlAlgorithm: Send {
    fn name(&self) -> &str;

    /// Choose an action for a state, synthesizing defaults for unseen states
    fn get_action(&mut self, state: &str) -> Action;

    /// Fold one transition into the internal estimates
    fn update(
        &mut self,
        state: &str,
        action: Action,
        reward: f64,
        next_state: &str,
        next_action: Option<Action>,
    ) -> Action;
}

/// The default algorithm roster, in selection-priority order
pub fn default_algorithms() -> Vec<Box<dyn RlAlgorithm>> {
    vec![
        Box::new(QLearning::default()),
        Box::new(Sarsa::default()),
        Box::new(Ppo::default()),
    ]
}

/// Per-state, per-action value estimates for Q-Learning and SARSA
pub type QTable = HashMap<String, HashMap<Action, f64>>;

/// Get the value row for a state, creating zeroed entries on first access
pub(crate) fn state_row<'a>(table: &'a mut QTable, state: &str) -> &'a mut HashMap<Action, f64> {
    table
        .entry(state.to_string())
        .or_insert_with(|| Action::ALL.iter().map(|a| (*a, 0.0)).collect())
}

/// Highest estimate recorded for a state, 0.0 when the state is unseen
pub(crate) fn max_value(table: &QTable, state: &str) -> f64 {
    table
        .get(state)
        .and_then(|row| row.values().copied().fold(None, |acc: Option<f64>, q| {
            Some(acc.map_or(q, |m| m.max(q)))
        }))
        .unwrap_or(0.0)
}

/// Greedy action for a value row, first maximum in declaration order
pub(crate) fn greedy_action(row: &HashMap<Action, f64>) -> Action {
    let mut best = Action::ALL[0];
    let mut best_q = f64::NEG_INFINITY;
    for action in Action::ALL {
        let q = row.get(&action).copied().unwrap_or(0.0);
        if q > best_q {
            best = action;
            best_q = q;
        }
    }
    best
}

/// Epsilon-greedy selection over a Q-table
pub(crate) fn epsilon_greedy(table: &mut QTable, state: &str, epsilon: f64) -> Action {
    let mut rng = rand::thread_rng();
    if rng.gen::<f64>() < epsilon {
        return Action::random(&mut rng);
    }
    let row = state_row(table, state);
    if row.is_empty() {
        return Action::random(&mut rng);
    }
    greedy_action(row)
}

// SARSA update rule
// On-policy: bootstraps from the action the simulation will actually take
// next, which is also the value returned to the caller

use crate::rl::{epsilon_greedy, state_row, Action, QTable, RlAlgorithm};

/// Tabular SARSA over score-bucket states
#[derive(Debug, Clone)]
pub struct Sarsa {
    q_table: QTable,
    /// Learning rate (α)
    alpha: f64,
    /// Discount factor (γ)
    gamma: f64,
    /// Exploration rate (ε)
    epsilon: f64,
}

impl Sarsa {
    pub fn new(alpha: f64, gamma: f64, epsilon: f64) -> Self {
        Self {
            q_table: QTable::new(),
            alpha,
            gamma,
            epsilon,
        }
    }

    /// Current estimate for a state-action pair, 0.0 when unrecorded
    pub fn q_value(&self, state: &str, action: Action) -> f64 {
        self.q_table
            .get(state)
            .and_then(|row| row.get(&action))
            .copied()
            .unwrap_or(0.0)
    }
}

impl Default for Sarsa {
    fn default() -> Self {
        Self::new(0.1, 0.9, 0.1)
    }
}

impl RlAlgorithm for Sarsa {
    fn name(&self) -> &str {
        "SARSA"
    }

    fn get_action(&mut self, state: &str) -> Action {
        epsilon_greedy(&mut self.q_table, state, self.epsilon)
    }

    fn update(
        &mut self,
        state: &str,
        action: Action,
        reward: f64,
        next_state: &str,
        next_action: Option<Action>,
    ) -> Action {
        let next_action = next_action.unwrap_or_else(|| self.get_action(next_state));

        // Q(s,a) ← Q(s,a) + α[r + γ·Q(s',a') - Q(s,a)]
        let next_q = state_row(&mut self.q_table, next_state)
            .get(&next_action)
            .copied()
            .unwrap_or(0.0);
        let row = state_row(&mut self.q_table, state);
        let current = row.get(&action).copied().unwrap_or(0.0);
        row.insert(action, current + self.alpha * (reward + self.gamma * next_q - current));
        next_action
    }
}

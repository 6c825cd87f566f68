// Proximal-style policy table
// A crude additive analog of PPO clipping: the per-update step is bounded to
// a band around the pre-update probability, then the state's distribution is
// renormalized. This is this system's bespoke rule, not textbook PPO.

use crate::rl::{Action, RlAlgorithm};
use rand::Rng;
use std::collections::HashMap;

/// Per-state categorical policy with clipped additive updates
#[derive(Debug, Clone)]
pub struct Ppo {
    policy: HashMap<String, HashMap<Action, f64>>,
    /// Half-width of the clip band, relative to the pre-update probability
    clip_ratio: f64,
}

impl Ppo {
    pub fn new(clip_ratio: f64) -> Self {
        Self {
            policy: HashMap::new(),
            clip_ratio,
        }
    }

    /// Current probability of an action in a state, uniform when unseen
    pub fn probability(&self, state: &str, action: Action) -> f64 {
        self.policy
            .get(state)
            .and_then(|row| row.get(&action))
            .copied()
            .unwrap_or(1.0 / Action::ALL.len() as f64)
    }

    /// Get the distribution for a state, initializing to uniform on first use
    fn state_distribution(&mut self, state: &str) -> &mut HashMap<Action, f64> {
        self.policy.entry(state.to_string()).or_insert_with(|| {
            let uniform = 1.0 / Action::ALL.len() as f64;
            Action::ALL.iter().map(|a| (*a, uniform)).collect()
        })
    }
}

impl Default for Ppo {
    fn default() -> Self {
        Self::new(0.2)
    }
}

impl RlAlgorithm for Ppo {
    fn name(&self) -> &str {
        "PPO"
    }

    fn get_action(&mut self, state: &str) -> Action {
        let row = self.state_distribution(state);
        let mut rng = rand::thread_rng();
        let roll = rng.gen::<f64>();

        // Walk the cumulative distribution in declaration order
        let mut cumulative = 0.0;
        for action in Action::ALL {
            cumulative += row.get(&action).copied().unwrap_or(0.0);
            if roll < cumulative {
                return action;
            }
        }
        Action::ALL[Action::ALL.len() - 1]
    }

    fn update(
        &mut self,
        state: &str,
        action: Action,
        reward: f64,
        _next_state: &str,
        _next_action: Option<Action>,
    ) -> Action {
        let clip_ratio = self.clip_ratio;
        let row = self.state_distribution(state);

        let old_prob = row.get(&action).copied().unwrap_or(1.0 / Action::ALL.len() as f64);
        let stepped = old_prob + reward * 0.1;
        let new_prob = stepped
            .max(old_prob * (1.0 - clip_ratio))
            .min(old_prob * (1.0 + clip_ratio));
        row.insert(action, new_prob);

        let total: f64 = row.values().sum();
        if total > 0.0 {
            for prob in row.values_mut() {
                *prob /= total;
            }
        }
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_clips_and_renormalizes() {
        let mut algo = Ppo::new(0.2);
        let returned = algo.update("s", Action::FixBugs, 0.9, "s2", None);
        assert_eq!(returned, Action::FixBugs);

        // 1/3 + 0.09 overshoots the clip band, so the raw value lands at
        // (1/3) * 1.2 = 0.4 before renormalization
        let p = algo.probability("s", Action::FixBugs);
        assert!(p > 1.0 / 3.0);
        assert!((p - 0.4 / (0.4 + 2.0 / 3.0)).abs() < 1e-12);

        let total: f64 = Action::ALL
            .iter()
            .map(|a| algo.probability("s", *a))
            .sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_negative_signal_clips_downward() {
        let mut algo = Ppo::new(0.2);
        algo.update("s", Action::AddFeatures, -1.0, "s2", None);

        // floor of the clip band is (1/3) * 0.8
        let p = algo.probability("s", Action::AddFeatures);
        assert!(p < 1.0 / 3.0);
        let total: f64 = Action::ALL
            .iter()
            .map(|a| algo.probability("s", *a))
            .sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_unseen_state_is_uniform() {
        let algo = Ppo::default();
        for action in Action::ALL {
            assert!((algo.probability("nowhere", action) - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_sampling_never_fails_on_unseen_state() {
        let mut algo = Ppo::default();
        for _ in 0..20 {
            let _ = algo.get_action("score_17");
        }
    }

    #[test]
    fn test_sampling_follows_a_degenerate_distribution() {
        let mut algo = Ppo::new(10.0);
        // Push nearly all mass onto one action
        for _ in 0..200 {
            algo.update("s", Action::FixBugs, 10.0, "s2", None);
        }
        assert!(algo.probability("s", Action::FixBugs) > 0.99);
        let mut fix_bugs = 0;
        for _ in 0..50 {
            if algo.get_action("s") == Action::FixBugs {
                fix_bugs += 1;
            }
        }
        assert!(fix_bugs >= 45);
    }
}

// Meta-selection over the algorithm roster
// Keeps a full score history per algorithm and hands the next iteration to
// whichever variant has the best mean so far

use crate::rl::RlAlgorithm;
use tracing::warn;

/// Selector that owns the algorithm instances and their score histories
pub struct MetaAgent {
    algorithms: Vec<Box<dyn RlAlgorithm>>,
    scores: Vec<Vec<f64>>,
}

impl MetaAgent {
    /// Build a meta-agent over a fixed roster; the first entry is the
    /// bootstrap default used until any score arrives
    pub fn new(algorithms: Vec<Box<dyn RlAlgorithm>>) -> Self {
        let scores = algorithms.iter().map(|_| Vec::new()).collect();
        Self { algorithms, scores }
    }

    /// Index of the algorithm to use next
    ///
    /// Recomputes means from full history on every call; ties and the
    /// no-scores bootstrap both resolve to the earliest roster entry.
    pub fn select_algorithm(&self) -> usize {
        if self.scores.iter().all(|s| s.is_empty()) {
            return 0;
        }

        let mut best = 0;
        let mut best_mean = f64::NEG_INFINITY;
        for (index, history) in self.scores.iter().enumerate() {
            let mean = if history.is_empty() {
                0.0
            } else {
                history.iter().sum::<f64>() / history.len() as f64
            };
            if mean > best_mean {
                best = index;
                best_mean = mean;
            }
        }
        best
    }

    /// Append a score to an algorithm's history; the range is not validated
    pub fn update_score(&mut self, name: &str, score: f64) {
        match self.index_of(name) {
            Some(index) => self.scores[index].push(score),
            None => warn!("Score reported for unknown algorithm {:?}", name),
        }
    }

    /// Find an algorithm by its display name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.algorithms.iter().position(|a| a.name() == name)
    }

    pub fn algorithm(&self, index: usize) -> &dyn RlAlgorithm {
        self.algorithms[index].as_ref()
    }

    pub fn algorithm_mut(&mut self, index: usize) -> &mut dyn RlAlgorithm {
        self.algorithms[index].as_mut()
    }

    pub fn algorithm_names(&self) -> Vec<String> {
        self.algorithms.iter().map(|a| a.name().to_string()).collect()
    }

    pub fn score_history(&self, index: usize) -> &[f64] {
        &self.scores[index]
    }
}

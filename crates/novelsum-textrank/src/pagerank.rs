//! Weighted PageRank by power iteration.

use crate::graph::SentenceGraph;

/// Result of a PageRank computation.
#[derive(Debug, Clone)]
pub struct PageRankResult {
    /// Scores indexed by node ID; they sum to 1.
    pub scores: Vec<f64>,
    pub iterations: usize,
    pub delta: f64,
    pub converged: bool,
}

impl PageRankResult {
    pub fn score(&self, node: u32) -> f64 {
        self.scores.get(node as usize).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone)]
pub struct PageRank {
    /// Damping factor (typically 0.85)
    pub damping: f64,
    pub max_iterations: usize,
    /// L1 convergence threshold
    pub threshold: f64,
}

impl Default for PageRank {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 100,
            threshold: 1e-6,
        }
    }
}

impl PageRank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Run weighted PageRank. Returns the scores even if it did not converge.
    ///
    /// Pruned sentence graphs have no dangling nodes, but their mass is still
    /// redistributed uniformly in case a caller hands in one that does.
    pub fn run(&self, graph: &SentenceGraph) -> PageRankResult {
        let n = graph.num_nodes;
        if n == 0 {
            return PageRankResult {
                scores: vec![],
                iterations: 0,
                delta: 0.0,
                converged: true,
            };
        }

        let mut scores = vec![1.0 / n as f64; n];
        let mut new_scores = vec![0.0; n];
        let teleport = (1.0 - self.damping) / n as f64;
        let mut iterations = 0;
        let mut delta = f64::MAX;

        while iterations < self.max_iterations && delta > self.threshold {
            iterations += 1;

            let dangling_mass: f64 = (0..n)
                .filter(|&node| graph.node_total_weight(node as u32) <= 0.0)
                .map(|node| scores[node])
                .sum();
            new_scores.fill(teleport + self.damping * dangling_mass / n as f64);

            for (node, &node_score) in scores.iter().enumerate() {
                let total_weight = graph.node_total_weight(node as u32);
                if total_weight > 0.0 {
                    for (neighbor, weight) in graph.neighbors(node as u32) {
                        new_scores[neighbor as usize] +=
                            self.damping * node_score * weight / total_weight;
                    }
                }
            }

            delta = scores
                .iter()
                .zip(new_scores.iter())
                .map(|(old, new)| (old - new).abs())
                .sum();

            std::mem::swap(&mut scores, &mut new_scores);
        }

        let sum: f64 = scores.iter().sum();
        if sum > 0.0 {
            for score in &mut scores {
                *score /= sum;
            }
        }

        PageRankResult {
            scores,
            iterations,
            delta,
            converged: delta <= self.threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    /// Hub shares a word with each spoke; spokes share nothing with each other.
    fn star_graph() -> SentenceGraph {
        let mut builder = GraphBuilder::new();
        builder.get_or_create_node(&tokens(&["wolf", "raven", "oak", "hub"]));
        builder.get_or_create_node(&tokens(&["wolf", "alpha"]));
        builder.get_or_create_node(&tokens(&["raven", "beta"]));
        builder.get_or_create_node(&tokens(&["oak", "gamma"]));
        builder.build()
    }

    #[test]
    fn test_hub_scores_highest() {
        let graph = star_graph();
        let result = PageRank::new().run(&graph);
        assert!(result.converged);
        for node in 1..4 {
            assert!(result.score(0) > result.score(node));
        }
    }

    #[test]
    fn test_scores_sum_to_one() {
        let result = PageRank::new().run(&star_graph());
        let sum: f64 = result.scores.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric_spokes_equal() {
        let result = PageRank::new().run(&star_graph());
        assert!((result.score(1) - result.score(2)).abs() < 1e-9);
        assert!((result.score(2) - result.score(3)).abs() < 1e-9);
    }

    #[test]
    fn test_empty_graph() {
        let result = PageRank::new().run(&SentenceGraph::default());
        assert!(result.converged);
        assert!(result.scores.is_empty());
    }

    #[test]
    fn test_max_iterations_returns_partial() {
        let result = PageRank::new()
            .with_max_iterations(1)
            .with_threshold(0.0)
            .run(&star_graph());
        assert_eq!(result.iterations, 1);
        assert!(!result.converged);
        assert_eq!(result.scores.len(), 4);
    }

    #[test]
    fn test_damping_sharpens_hub_advantage() {
        let graph = star_graph();
        let low = PageRank::new().with_damping(0.5).run(&graph);
        let high = PageRank::new().with_damping(0.95).run(&graph);
        assert!(high.score(0) - high.score(1) > low.score(0) - low.score(1));
    }
}

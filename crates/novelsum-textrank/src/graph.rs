//! Sentence similarity graph.
//!
//! Nodes are distinct token sequences; sentences that clean to the same
//! tokens share a node and therefore a score. Edges are undirected and
//! weighted by lexical overlap normalized by sentence length.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::sentence::Sentence;

#[derive(Debug, Clone)]
struct BuilderNode {
    key: String,
    word_count: usize,
    distinct: FxHashSet<String>,
}

/// Mutable graph builder: collects nodes, then computes all edges at once.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    key_to_id: FxHashMap<String, u32>,
    nodes: Vec<BuilderNode>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the node for a token sequence, returning its ID.
    pub fn get_or_create_node(&mut self, tokens: &[String]) -> u32 {
        let key = tokens.join(" ");
        if let Some(&id) = self.key_to_id.get(&key) {
            return id;
        }

        let id = self.nodes.len() as u32;
        self.key_to_id.insert(key.clone(), id);
        self.nodes.push(BuilderNode {
            key,
            word_count: tokens.len(),
            distinct: tokens.iter().cloned().collect(),
        });
        id
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Compute all positive-weight edges and drop nodes left without any.
    ///
    /// When no pair of nodes overlaps at all, the graph is made complete
    /// with weight 1.0 on every edge.
    pub fn build(self) -> SentenceGraph {
        let n = self.nodes.len();

        // Inverted index so only pairs sharing a token are compared.
        let mut postings: FxHashMap<&str, Vec<u32>> = FxHashMap::default();
        for (id, node) in self.nodes.iter().enumerate() {
            for token in &node.distinct {
                postings.entry(token.as_str()).or_default().push(id as u32);
            }
        }

        let mut edges: Vec<FxHashMap<u32, f64>> = vec![FxHashMap::default(); n];
        for a in 0..n {
            let mut common: FxHashMap<u32, usize> = FxHashMap::default();
            for token in &self.nodes[a].distinct {
                for &b in &postings[token.as_str()] {
                    if b as usize > a {
                        *common.entry(b).or_insert(0) += 1;
                    }
                }
            }
            for (b, count) in common {
                let weight = similarity(
                    count,
                    self.nodes[a].word_count,
                    self.nodes[b as usize].word_count,
                );
                if weight > 0.0 {
                    edges[a].insert(b, weight);
                    edges[b as usize].insert(a as u32, weight);
                }
            }
        }

        // No two sentences share a token: connect every pair with unit weight
        // so the sentences can still be ranked.
        if n >= 2 && edges.iter().all(|e| e.is_empty()) {
            for (a, node_edges) in edges.iter_mut().enumerate() {
                for b in (0..n).filter(|&b| b != a) {
                    node_edges.insert(b as u32, 1.0);
                }
            }
        }

        // Compact: keep only reachable nodes, preserving creation order.
        let mut remap: Vec<Option<u32>> = vec![None; n];
        let mut kept = 0u32;
        for (old, node_edges) in edges.iter().enumerate() {
            if !node_edges.is_empty() {
                remap[old] = Some(kept);
                kept += 1;
            }
        }

        let mut row_ptr = Vec::with_capacity(kept as usize + 1);
        let mut col_idx = Vec::new();
        let mut weights = Vec::new();
        let mut total_weight = Vec::with_capacity(kept as usize);
        let mut keys = Vec::with_capacity(kept as usize);
        row_ptr.push(0);

        for (old, node_edges) in edges.into_iter().enumerate() {
            if remap[old].is_none() {
                continue;
            }
            // Sorted for deterministic iteration.
            let mut sorted: Vec<(u32, f64)> = node_edges
                .into_iter()
                .filter_map(|(target, w)| remap[target as usize].map(|t| (t, w)))
                .collect();
            sorted.sort_by_key(|(t, _)| *t);

            total_weight.push(sorted.iter().map(|(_, w)| w).sum());
            for (target, weight) in sorted {
                col_idx.push(target);
                weights.push(weight);
            }
            row_ptr.push(col_idx.len());
            keys.push(self.nodes[old].key.clone());
        }

        let key_to_node = self
            .key_to_id
            .into_iter()
            .filter_map(|(key, old)| remap[old as usize].map(|new| (key, new)))
            .collect();

        SentenceGraph {
            num_nodes: kept as usize,
            row_ptr,
            col_idx,
            weights,
            total_weight,
            keys,
            key_to_node,
        }
    }
}

/// Overlap similarity: shared distinct tokens over the sum of log10 lengths.
///
/// Two one-token sentences have a zero denominator and score 0.
pub fn similarity(common: usize, len_a: usize, len_b: usize) -> f64 {
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }
    let denom = (len_a as f64).log10() + (len_b as f64).log10();
    if denom == 0.0 {
        return 0.0;
    }
    common as f64 / denom
}

/// Immutable weighted graph in compressed sparse row layout.
#[derive(Debug, Clone, Default)]
pub struct SentenceGraph {
    pub num_nodes: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<u32>,
    weights: Vec<f64>,
    total_weight: Vec<f64>,
    keys: Vec<String>,
    key_to_node: FxHashMap<String, u32>,
}

impl SentenceGraph {
    /// Build the graph for a tokenized document.
    pub fn from_sentences(sentences: &[Sentence]) -> Self {
        let mut builder = GraphBuilder::new();
        for sentence in sentences {
            builder.get_or_create_node(&sentence.tokens);
        }
        builder.build()
    }

    pub fn neighbors(&self, node: u32) -> impl Iterator<Item = (u32, f64)> + '_ {
        let start = self.row_ptr[node as usize];
        let end = self.row_ptr[node as usize + 1];
        (start..end).map(move |i| (self.col_idx[i], self.weights[i]))
    }

    pub fn node_total_weight(&self, node: u32) -> f64 {
        self.total_weight[node as usize]
    }

    /// Node holding the given sentence, if it survived pruning.
    pub fn node_for(&self, sentence: &Sentence) -> Option<u32> {
        self.key_to_node.get(&sentence.token_key()).copied()
    }

    pub fn key(&self, node: u32) -> &str {
        &self.keys[node as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.num_nodes == 0
    }

    /// Number of undirected edges.
    pub fn num_edges(&self) -> usize {
        self.col_idx.len() / 2
    }
}

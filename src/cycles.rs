//! Closed transfer loop detection
//!
//! Bounded depth-first search from every sending account. Cycles found from
//! different start accounts are collapsed by their canonical rotation.

use crate::fraud_patterns::{DetectedRing, PatternType};
use crate::network_analysis::TransactionGraph;
use indexmap::IndexSet;
use tracing::debug;

/// Separator used when comparing rotations as strings
const ROTATION_SEPARATOR: &str = ">";

/// Simple-cycle detector over the transaction graph
#[derive(Debug, Clone)]
pub struct CycleDetector {
    min_length: usize,
    max_length: usize,
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    parallel: bool,
}

impl CycleDetector {
    /// Create a detector for cycles of `min_length..=max_length` accounts
    pub fn new(min_length: usize, max_length: usize) -> Self {
        Self {
            min_length,
            max_length,
            parallel: false,
        }
    }

    /// Fan the per-start search out across the rayon pool
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Find every distinct cycle, one ring per canonical rotation
    pub fn detect(&self, graph: &TransactionGraph) -> Vec<DetectedRing> {
        let starts: Vec<&str> = graph.senders().collect();
        let candidates = self.search_all(graph, &starts);

        let mut seen = IndexSet::new();
        let mut rings = Vec::new();
        for path in candidates.into_iter().flatten() {
            let (key, members) = canonical_cycle(&path);
            if seen.insert(key) {
                rings.push(DetectedRing::scored(members, PatternType::Cycle));
            }
        }

        debug!(
            start_accounts = starts.len(),
            cycles = rings.len(),
            "cycle detection complete"
        );
        rings
    }

    #[cfg(feature = "parallel")]
    fn search_all(&self, graph: &TransactionGraph, starts: &[&str]) -> Vec<Vec<Vec<String>>> {
        use rayon::prelude::*;

        if self.parallel {
            // collect() keeps input order, so dedup sees the sequential order
            starts
                .par_iter()
                .map(|start| self.cycles_from(graph, start))
                .collect()
        } else {
            starts
                .iter()
                .map(|start| self.cycles_from(graph, start))
                .collect()
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn search_all(&self, graph: &TransactionGraph, starts: &[&str]) -> Vec<Vec<Vec<String>>> {
        starts
            .iter()
            .map(|start| self.cycles_from(graph, start))
            .collect()
    }

    /// All cycle paths through `start`, in DFS discovery order
    fn cycles_from(&self, graph: &TransactionGraph, start: &str) -> Vec<Vec<String>> {
        let mut found = Vec::new();
        let mut path = vec![start];
        let mut on_path = IndexSet::new();
        on_path.insert(start);

        self.dfs(graph, start, start, &mut path, &mut on_path, &mut found);
        found
    }

    fn dfs<'g>(
        &self,
        graph: &'g TransactionGraph,
        start: &str,
        current: &str,
        path: &mut Vec<&'g str>,
        on_path: &mut IndexSet<&'g str>,
        found: &mut Vec<Vec<String>>,
    ) {
        for next in graph.successors(current) {
            if next == start {
                if (self.min_length..=self.max_length).contains(&path.len()) {
                    found.push(path.iter().map(|a| a.to_string()).collect());
                }
            } else if path.len() < self.max_length && !on_path.contains(next) {
                on_path.insert(next);
                path.push(next);
                self.dfs(graph, start, next, path, on_path, found);
                path.pop();
                on_path.swap_remove(next);
            }
        }
    }
}

impl Default for CycleDetector {
    fn default() -> Self {
        Self::new(3, 5)
    }
}

/// Canonical rotation of a cyclic account sequence.
///
/// Returns the joined key and the rotation whose joined form is
/// lexicographically smallest. Every rotation of the same cycle yields the
/// same result.
pub fn canonical_cycle<S: AsRef<str>>(path: &[S]) -> (String, Vec<String>) {
    let mut best: Option<(String, usize)> = None;

    for offset in 0..path.len() {
        let key = path[offset..]
            .iter()
            .chain(path[..offset].iter())
            .map(|a| a.as_ref())
            .collect::<Vec<&str>>()
            .join(ROTATION_SEPARATOR);

        let smaller = best
            .as_ref()
            .map_or(true, |(smallest, _)| key < *smallest);
        if smaller {
            best = Some((key, offset));
        }
    }

    match best {
        Some((key, offset)) => {
            let members = path[offset..]
                .iter()
                .chain(path[..offset].iter())
                .map(|a| a.as_ref().to_string())
                .collect();
            (key, members)
        }
        None => (String::new(), Vec::new()),
    }
}

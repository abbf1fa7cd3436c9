//! Transaction network construction
//!
//! Builds the directed sender -> receiver adjacency used by cycle search and
//! the per-account aggregates every detector and the suspicion scorer read.

use crate::Transaction;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Per-account activity aggregate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountStats {
    /// Transactions received
    pub incoming_count: usize,
    /// Transactions sent
    pub outgoing_count: usize,
    /// Every transaction touching the account (in + out)
    pub transaction_count: usize,
    pub total_in: f64,
    pub total_out: f64,
}

impl AccountStats {
    /// Inflow minus outflow
    pub fn net_flow(&self) -> f64 {
        self.total_in - self.total_out
    }
}

/// Directed transaction graph with account statistics.
///
/// Both maps iterate in first-appearance order of the input transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionGraph {
    adjacency: IndexMap<String, IndexSet<String>>,
    stats: IndexMap<String, AccountStats>,
}

impl TransactionGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from a transaction list in a single pass
    pub fn build(transactions: &[Transaction]) -> Self {
        let mut graph = Self::new();
        for tx in transactions {
            graph.add_transaction(tx);
        }
        graph
    }

    /// Add a transaction to the graph
    pub fn add_transaction(&mut self, tx: &Transaction) {
        // Repeated sender -> receiver pairs collapse into one edge
        self.adjacency
            .entry(tx.sender_id.clone())
            .or_default()
            .insert(tx.receiver_id.clone());

        let sender = self.stats.entry(tx.sender_id.clone()).or_default();
        sender.outgoing_count += 1;
        sender.transaction_count += 1;
        sender.total_out += tx.amount;

        let receiver = self.stats.entry(tx.receiver_id.clone()).or_default();
        receiver.incoming_count += 1;
        receiver.transaction_count += 1;
        receiver.total_in += tx.amount;
    }

    /// Distinct receivers an account has sent to
    pub fn successors(&self, account_id: &str) -> impl Iterator<Item = &str> {
        self.adjacency
            .get(account_id)
            .into_iter()
            .flat_map(|receivers| receivers.iter().map(String::as_str))
    }

    /// Accounts with at least one outgoing edge, in first-seen order
    pub fn senders(&self) -> impl Iterator<Item = &str> {
        self.adjacency.keys().map(String::as_str)
    }

    /// Statistics for an account, if it appeared in any transaction
    pub fn account_stats(&self, account_id: &str) -> Option<&AccountStats> {
        self.stats.get(account_id)
    }

    /// Total transaction count for an account, zero when unseen
    pub fn transaction_count(&self, account_id: &str) -> usize {
        self.stats
            .get(account_id)
            .map_or(0, |stats| stats.transaction_count)
    }

    /// All account statistics in first-seen order
    pub fn stats(&self) -> &IndexMap<String, AccountStats> {
        &self.stats
    }

    /// Number of distinct accounts seen
    pub fn account_count(&self) -> usize {
        self.stats.len()
    }

    /// Number of distinct directed edges
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(IndexSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tx(id: &str, from: &str, to: &str, amount: f64) -> Transaction {
        Transaction::new(id, from, to, amount, Utc::now())
    }

    #[test]
    fn test_add_transaction() {
        let graph = TransactionGraph::build(&[
            tx("T1", "A", "B", 1000.0),
            tx("T2", "A", "C", 2000.0),
        ]);

        let stats = graph.account_stats("A").unwrap();
        assert_eq!(stats.total_out, 3000.0);
        assert_eq!(stats.outgoing_count, 2);
        assert_eq!(stats.incoming_count, 0);
        assert_eq!(stats.transaction_count, 2);
        assert_eq!(graph.successors("A").collect::<Vec<_>>(), vec!["B", "C"]);
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let graph = TransactionGraph::build(&[
            tx("T1", "A", "B", 1000.0),
            tx("T2", "A", "B", 500.0),
            tx("T3", "B", "C", 750.0),
        ]);

        assert_eq!(graph.account_count(), 3);
        assert_eq!(graph.edge_count(), 2);

        // Counts still track every transaction
        let b = graph.account_stats("B").unwrap();
        assert_eq!(b.incoming_count, 2);
        assert_eq!(b.outgoing_count, 1);
        assert_eq!(b.transaction_count, 3);
        assert_eq!(b.total_in, 1500.0);
        assert_eq!(b.net_flow(), 750.0);
    }

    #[test]
    fn test_self_loop_counts_twice() {
        let graph = TransactionGraph::build(&[tx("T1", "A", "A", 10.0)]);
        let a = graph.account_stats("A").unwrap();
        assert_eq!(a.transaction_count, 2);
        assert_eq!(a.total_in, 10.0);
        assert_eq!(a.total_out, 10.0);
    }

    #[test]
    fn test_empty_graph() {
        let graph = TransactionGraph::build(&[]);
        assert!(graph.is_empty());
        assert_eq!(graph.senders().count(), 0);
        assert_eq!(graph.successors("missing").count(), 0);
        assert_eq!(graph.transaction_count("missing"), 0);
    }

    #[test]
    fn test_first_seen_order() {
        let graph = TransactionGraph::build(&[
            tx("T1", "Z", "Y", 1.0),
            tx("T2", "A", "Z", 1.0),
        ]);
        let accounts: Vec<_> = graph.stats().keys().cloned().collect();
        assert_eq!(accounts, vec!["Z", "Y", "A"]);
        assert_eq!(graph.senders().collect::<Vec<_>>(), vec!["Z", "A"]);
    }
}

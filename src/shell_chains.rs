//! Layered shell-account chain detection
//!
//! Enumerates 3-hop chains A -> B -> C -> D over individual transactions and
//! keeps those whose intermediates B and C barely transact at all.

use crate::fraud_patterns::{DetectedRing, PatternType};
use crate::network_analysis::TransactionGraph;
use crate::Transaction;
use indexmap::{IndexMap, IndexSet};
use std::ops::RangeInclusive;
use tracing::debug;

/// Shell-chain detector
#[derive(Debug, Clone)]
pub struct ShellChainDetector {
    intermediate_activity: RangeInclusive<usize>,
}

impl ShellChainDetector {
    /// Flag chains whose intermediates have between `min_transactions` and
    /// `max_transactions` total transactions (inclusive)
    pub fn new(min_transactions: usize, max_transactions: usize) -> Self {
        Self {
            intermediate_activity: min_transactions..=max_transactions,
        }
    }

    /// Find distinct qualifying chains in discovery order
    pub fn detect(
        &self,
        transactions: &[Transaction],
        graph: &TransactionGraph,
    ) -> Vec<DetectedRing> {
        let mut outgoing: IndexMap<&str, Vec<&Transaction>> = IndexMap::new();
        for tx in transactions {
            outgoing.entry(&tx.sender_id).or_default().push(tx);
        }

        let mut seen = IndexSet::new();
        let mut rings = Vec::new();
        let mut duplicates = 0usize;

        for first in transactions {
            if !self.is_shell(graph, &first.receiver_id) {
                continue;
            }
            for second in hops_from(&outgoing, &first.receiver_id) {
                if !self.is_shell(graph, &second.receiver_id) {
                    continue;
                }
                for third in hops_from(&outgoing, &second.receiver_id) {
                    let chain = vec![
                        first.sender_id.clone(),
                        first.receiver_id.clone(),
                        second.receiver_id.clone(),
                        third.receiver_id.clone(),
                    ];
                    // A chain that revisits an account is a loop, not a pass-through
                    if !all_distinct(&chain) {
                        continue;
                    }
                    if seen.insert(chain_key(&chain, PatternType::ShellChain)) {
                        rings.push(DetectedRing::scored(chain, PatternType::ShellChain));
                    } else {
                        duplicates += 1;
                    }
                }
            }
        }

        debug!(
            chains = rings.len(),
            duplicates, "shell chain detection complete"
        );
        rings
    }

    fn is_shell(&self, graph: &TransactionGraph, account_id: &str) -> bool {
        self.intermediate_activity
            .contains(&graph.transaction_count(account_id))
    }
}

impl Default for ShellChainDetector {
    fn default() -> Self {
        Self::new(2, 3)
    }
}

fn hops_from<'a>(
    outgoing: &'a IndexMap<&str, Vec<&'a Transaction>>,
    account_id: &str,
) -> impl Iterator<Item = &'a Transaction> + 'a {
    outgoing
        .get(account_id)
        .into_iter()
        .flat_map(|txs| txs.iter().copied())
}

fn all_distinct(chain: &[String]) -> bool {
    chain
        .iter()
        .enumerate()
        .all(|(i, account)| !chain[i + 1..].contains(account))
}

/// Order-insensitive identity of a chain: sorted members plus pattern tag
fn chain_key(members: &[String], pattern: PatternType) -> String {
    let mut sorted: Vec<&str> = members.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    format!("{}{}", sorted.join("|"), pattern.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn build(edges: &[(&str, &str)]) -> Vec<Transaction> {
        let now = Utc::now();
        edges
            .iter()
            .enumerate()
            .map(|(i, (from, to))| {
                Transaction::new(
                    &format!("T{}", i),
                    from,
                    to,
                    5000.0,
                    now + Duration::minutes(i as i64),
                )
            })
            .collect()
    }

    fn detect(txs: &[Transaction]) -> Vec<DetectedRing> {
        let graph = TransactionGraph::build(txs);
        ShellChainDetector::default().detect(txs, &graph)
    }

    #[test]
    fn test_basic_shell_chain() {
        // B: 2 transactions, C: 3 transactions
        let txs = build(&[("A", "B"), ("B", "C"), ("C", "D"), ("X", "C")]);
        let rings = detect(&txs);

        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].member_accounts, vec!["A", "B", "C", "D"]);
        assert_eq!(rings[0].pattern_type, PatternType::ShellChain);
        assert_eq!(rings[0].risk_score, 85.2);
    }

    #[test]
    fn test_busy_intermediate_breaks_chain() {
        // C reaches 5 transactions
        let txs = build(&[
            ("A", "B"),
            ("B", "C"),
            ("C", "D"),
            ("X", "C"),
            ("Y", "C"),
            ("Z", "C"),
        ]);
        assert!(detect(&txs).is_empty());
    }

    #[test]
    fn test_single_transaction_intermediate_is_not_shell() {
        let txs = build(&[("A", "B"), ("B", "C")]);
        assert!(detect(&txs).is_empty());
    }

    #[test]
    fn test_repeated_transactions_deduplicated() {
        // Two parallel A -> B transfers give two triples over the same accounts
        let txs = build(&[("A", "B"), ("A", "B"), ("B", "C"), ("C", "D")]);
        // B now has 3 transactions, C has 2
        let rings = detect(&txs);
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].member_accounts, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_same_account_set_in_other_order_collapses() {
        let a = vec!["A".to_string(), "B".to_string(), "C".to_string(), "D".to_string()];
        let b = vec!["D".to_string(), "C".to_string(), "A".to_string(), "B".to_string()];
        assert_eq!(
            chain_key(&a, PatternType::ShellChain),
            chain_key(&b, PatternType::ShellChain)
        );
    }

    #[test]
    fn test_intermediate_activity_uses_whole_dataset() {
        // B's extra transactions are outside the chain but still count
        let txs = build(&[("A", "B"), ("B", "C"), ("C", "D"), ("B", "Q"), ("R", "B")]);
        assert!(detect(&txs).is_empty());
    }

    #[test]
    fn test_closed_loop_is_not_a_chain() {
        // Every triangle member has 2 transactions, but A -> B -> C -> A revisits A
        let txs = build(&[("A", "B"), ("B", "C"), ("C", "A")]);
        assert!(detect(&txs).is_empty());

        let txs = build(&[("A", "B"), ("B", "A")]);
        assert!(detect(&txs).is_empty());
    }

    #[test]
    fn test_square_loop_yields_one_chain() {
        let txs = build(&[("A", "B"), ("B", "C"), ("C", "D"), ("D", "A")]);
        let rings = detect(&txs);
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].member_accounts, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_chain_members_all_have_stats() {
        let txs = build(&[("A", "B"), ("B", "C"), ("C", "D"), ("X", "C")]);
        let graph = TransactionGraph::build(&txs);
        for ring in ShellChainDetector::default().detect(&txs, &graph) {
            for account in &ring.member_accounts {
                assert!(graph.transaction_count(account) >= 1);
            }
        }
    }
}

//! Per-account suspicion scoring
//!
//! Every ring membership contributes one pattern entry to the member account.
//! Scores combine the entry count with the account's transaction velocity and
//! its inflow/outflow imbalance.

use crate::fraud_patterns::{round_to, FraudRing};
use crate::network_analysis::{AccountStats, TransactionGraph};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Upper bound for a suspicion score
pub const MAX_SUSPICION_SCORE: f64 = 100.0;

/// Points per recorded pattern entry
const PATTERN_WEIGHT: f64 = 22.0;

/// Velocity component: points per transaction, capped
const VELOCITY_WEIGHT: f64 = 1.2;
const VELOCITY_CAP: f64 = 20.0;

/// Flow-skew component: points per unit of imbalance ratio, capped
const SKEW_WEIGHT: f64 = 40.0;
const SKEW_CAP: f64 = 18.0;

/// Account implicated in one or more fraud rings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuspiciousAccount {
    pub account_id: String,
    pub suspicion_score: f64,
    /// Distinct pattern tags in first-seen order
    pub detected_patterns: Vec<String>,
    /// First ring that implicated the account
    pub ring_id: String,
}

/// Coarse band for a suspicion score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,      // < 40
    Medium,   // 40-59.9
    High,     // 60-79.9
    Critical, // 80+
}

impl SuspiciousAccount {
    pub fn risk_level(&self) -> RiskLevel {
        match self.suspicion_score {
            s if s < 40.0 => RiskLevel::Low,
            s if s < 60.0 => RiskLevel::Medium,
            s if s < 80.0 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }
}

#[derive(Debug, Clone)]
struct AccountPatterns {
    patterns: Vec<String>,
    ring_id: String,
}

/// Collects ring memberships and turns them into scored accounts
#[derive(Debug, Default)]
pub struct SuspicionAggregator {
    accounts: IndexMap<String, AccountPatterns>,
}

impl SuspicionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every member of a ring.
    ///
    /// Rings must be recorded in emission order; the first ring recorded for
    /// an account becomes its `ring_id`.
    pub fn record_ring(&mut self, ring: &FraudRing) {
        let tag = ring.pattern_type.account_tag(ring.member_accounts.len());
        for account in &ring.member_accounts {
            self.accounts
                .entry(account.clone())
                .or_insert_with(|| AccountPatterns {
                    patterns: Vec::new(),
                    ring_id: ring.ring_id.clone(),
                })
                .patterns
                .push(tag.clone());
        }
    }

    /// Number of accounts recorded so far
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Score every recorded account, highest score first.
    ///
    /// Equal scores keep the order in which accounts were first recorded.
    pub fn finish(self, graph: &TransactionGraph) -> Vec<SuspiciousAccount> {
        let default_stats = AccountStats::default();

        let mut flagged: Vec<SuspiciousAccount> = self
            .accounts
            .into_iter()
            .map(|(account_id, entry)| {
                let stats = graph.account_stats(&account_id).unwrap_or(&default_stats);
                let suspicion_score = suspicion_score(entry.patterns.len(), stats);
                let detected_patterns: IndexSet<String> = entry.patterns.into_iter().collect();

                SuspiciousAccount {
                    account_id,
                    suspicion_score,
                    detected_patterns: detected_patterns.into_iter().collect(),
                    ring_id: entry.ring_id,
                }
            })
            .collect();

        // sort_by is stable
        flagged.sort_by(|a, b| b.suspicion_score.total_cmp(&a.suspicion_score));
        flagged
    }
}

/// Suspicion score from the raw pattern entry count and account activity
pub fn suspicion_score(pattern_entries: usize, stats: &AccountStats) -> f64 {
    let base = pattern_entries as f64 * PATTERN_WEIGHT;
    let velocity = ((stats.incoming_count + stats.outgoing_count) as f64 * VELOCITY_WEIGHT)
        .min(VELOCITY_CAP);
    let volume = stats.total_in + stats.total_out;
    let skew = ((stats.total_in - stats.total_out).abs() / volume.max(1.0) * SKEW_WEIGHT)
        .min(SKEW_CAP);

    round_to((base + velocity + skew).min(MAX_SUSPICION_SCORE), 1)
}

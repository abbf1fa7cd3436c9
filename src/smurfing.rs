//! Smurfing detection (fan-in aggregation and fan-out distribution)

use crate::fraud_patterns::{DetectedRing, PatternType};
use crate::Transaction;
use chrono::Duration;
use indexmap::{IndexMap, IndexSet};
use tracing::debug;

/// Default fan-in / fan-out time window in hours
pub const DEFAULT_WINDOW_HOURS: i64 = 72;

/// Fan-in / fan-out detector
#[derive(Debug, Clone)]
pub struct SmurfingDetector {
    min_counterparties: usize,
    window: Duration,
}

impl SmurfingDetector {
    /// Create a detector flagging `min_counterparties` or more distinct
    /// counterparties whose transactions span at most `window`
    pub fn new(min_counterparties: usize, window: Duration) -> Self {
        Self {
            min_counterparties,
            window,
        }
    }

    /// 72 hours
    pub fn default_window() -> Duration {
        Duration::hours(DEFAULT_WINDOW_HOURS)
    }

    /// Run both scans: all fan-in rings first, then all fan-out rings
    pub fn detect(&self, transactions: &[Transaction]) -> Vec<DetectedRing> {
        let mut by_receiver: IndexMap<&str, Vec<&Transaction>> = IndexMap::new();
        let mut by_sender: IndexMap<&str, Vec<&Transaction>> = IndexMap::new();

        for tx in transactions {
            by_receiver.entry(&tx.receiver_id).or_default().push(tx);
            by_sender.entry(&tx.sender_id).or_default().push(tx);
        }

        let mut rings = Vec::new();

        for (receiver, incoming) in &by_receiver {
            let senders: IndexSet<&str> =
                incoming.iter().map(|tx| tx.sender_id.as_str()).collect();
            if self.qualifies(senders.len(), incoming) {
                let size = senders.len() + 1;
                let mut members: Vec<String> = senders.iter().map(|s| s.to_string()).collect();
                members.push(receiver.to_string());
                rings.push(DetectedRing::scored_with_size(
                    members,
                    PatternType::FanIn,
                    Some(size),
                ));
            }
        }
        let fan_in = rings.len();

        for (sender, outgoing) in &by_sender {
            let receivers: IndexSet<&str> =
                outgoing.iter().map(|tx| tx.receiver_id.as_str()).collect();
            if self.qualifies(receivers.len(), outgoing) {
                let size = receivers.len() + 1;
                let mut members = Vec::with_capacity(size);
                members.push(sender.to_string());
                members.extend(receivers.iter().map(|r| r.to_string()));
                rings.push(DetectedRing::scored_with_size(
                    members,
                    PatternType::FanOut,
                    Some(size),
                ));
            }
        }

        debug!(
            fan_in,
            fan_out = rings.len() - fan_in,
            "smurfing detection complete"
        );
        rings
    }

    fn qualifies(&self, counterparties: usize, group: &[&Transaction]) -> bool {
        if counterparties < self.min_counterparties {
            return false;
        }
        let inside = within_window(group, self.window);
        if !inside {
            debug!(counterparties, "counterparty burst exceeds time window");
        }
        inside
    }
}

impl Default for SmurfingDetector {
    fn default() -> Self {
        Self::new(10, Self::default_window())
    }
}

/// Whether the earliest-to-latest span of a group fits inside `window`.
///
/// An empty group never fits.
pub fn within_window(group: &[&Transaction], window: Duration) -> bool {
    let earliest = group.iter().map(|tx| tx.timestamp).min();
    let latest = group.iter().map(|tx| tx.timestamp).max();

    match (earliest, latest) {
        (Some(start), Some(end)) => end - start <= window,
        _ => false,
    }
}

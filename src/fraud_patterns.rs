//! Fraud ring pattern types and ring risk scoring

use serde::{Deserialize, Serialize};

/// Upper bound for a ring risk score
pub const MAX_RING_SCORE: f64 = 99.9;

/// Base score for a pattern tag the scorer does not recognise
pub const UNKNOWN_PATTERN_BASE: f64 = 65.0;

/// Weight applied per ring member
const SIZE_WEIGHT: f64 = 1.8;

/// Weight applied to edge density
const DENSITY_WEIGHT: f64 = 2.0;

/// Density used by every current detector
pub const DEFAULT_DENSITY: f64 = 1.0;

/// Laundering pattern a ring was detected by
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// Closed transfer loop of 3 to 5 accounts
    Cycle,
    /// Many senders aggregating into one receiver
    FanIn,
    /// One sender distributing to many receivers
    FanOut,
    /// Multi-hop chain through low-activity intermediaries
    ShellChain,
}

impl PatternType {
    /// Wire tag of the pattern
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Cycle => "cycle",
            PatternType::FanIn => "fan_in",
            PatternType::FanOut => "fan_out",
            PatternType::ShellChain => "shell_chain",
        }
    }

    /// Tag recorded against each member account of a ring of this type.
    ///
    /// Cycles carry their length (`cycle_length_3`), every other pattern
    /// uses its plain tag.
    pub fn account_tag(&self, member_count: usize) -> String {
        match self {
            PatternType::Cycle => format!("cycle_length_{}", member_count),
            other => other.as_str().to_string(),
        }
    }

    /// Base risk score for the pattern
    pub fn base_score(&self) -> f64 {
        base_score_for_tag(self.as_str())
    }
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Base risk score keyed by pattern tag
pub fn base_score_for_tag(tag: &str) -> f64 {
    match tag {
        "cycle" => 80.0,
        "fan_in" | "fan_out" => 72.0,
        "shell_chain" => 76.0,
        _ => UNKNOWN_PATTERN_BASE,
    }
}

/// Score a ring from its pattern tag, member count and edge density.
///
/// `min(99.9, base + size * 1.8 + density * 2)`, rounded to one decimal.
pub fn score_ring_tag(tag: &str, size: usize, density: f64) -> f64 {
    let raw = base_score_for_tag(tag) + size as f64 * SIZE_WEIGHT + density * DENSITY_WEIGHT;
    round_to(raw.min(MAX_RING_SCORE), 1)
}

/// Score a ring of a known pattern type
pub fn score_ring(pattern: PatternType, size: usize, density: f64) -> f64 {
    score_ring_tag(pattern.as_str(), size, density)
}

/// Round to a fixed number of decimal places.
///
/// Rounds the exact binary value, so `0.15` (stored just below the half)
/// becomes `0.1`. Exact halves such as `0.25` round away from zero.
pub(crate) fn round_to(value: f64, decimals: usize) -> f64 {
    let places = decimals as i32;
    let halves = value * 2f64.powi(places + 1);
    if halves.fract() == 0.0 && halves % 2.0 != 0.0 {
        let factor = 10f64.powi(places);
        return (value * factor).round() / factor;
    }
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}

/// Ring emitted by a detector, scored but not yet numbered
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedRing {
    pub member_accounts: Vec<String>,
    pub pattern_type: PatternType,
    pub risk_score: f64,
}

impl DetectedRing {
    /// Build a ring and score it with the default density
    pub fn scored(member_accounts: Vec<String>, pattern_type: PatternType) -> Self {
        Self::scored_with_size(member_accounts, pattern_type, None)
    }

    /// Build a ring scored with an explicit size.
    ///
    /// Fan-in and fan-out rings are sized by counterparty count plus one,
    /// which is not always the member list length.
    pub fn scored_with_size(
        member_accounts: Vec<String>,
        pattern_type: PatternType,
        size: Option<usize>,
    ) -> Self {
        let size = size.unwrap_or(member_accounts.len());
        Self {
            risk_score: score_ring(pattern_type, size, DEFAULT_DENSITY),
            member_accounts,
            pattern_type,
        }
    }

    /// Attach a ring identifier
    pub fn into_ring(self, ring_id: String) -> FraudRing {
        FraudRing {
            ring_id,
            member_accounts: self.member_accounts,
            pattern_type: self.pattern_type,
            risk_score: self.risk_score,
        }
    }
}

/// Numbered fraud ring as reported to downstream consumers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FraudRing {
    pub ring_id: String,
    pub member_accounts: Vec<String>,
    pub pattern_type: PatternType,
    pub risk_score: f64,
}

impl FraudRing {
    /// Number of member accounts
    pub fn size(&self) -> usize {
        self.member_accounts.len()
    }

    /// Check whether an account belongs to this ring
    pub fn contains(&self, account_id: &str) -> bool {
        self.member_accounts.iter().any(|a| a == account_id)
    }
}

/// Format a 1-based sequence number as a ring identifier (`RING_001`)
pub fn ring_identifier(sequence: usize) -> String {
    format!("RING_{:03}", sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_cycle_score() {
        assert_eq!(score_ring(PatternType::Cycle, 3, 1.0), 87.4);
    }

    #[test]
    fn test_base_scores() {
        assert_eq!(score_ring(PatternType::FanIn, 11, 1.0), 93.8);
        assert_eq!(score_ring(PatternType::FanOut, 11, 1.0), 93.8);
        assert_eq!(score_ring(PatternType::ShellChain, 4, 1.0), 85.2);
    }

    #[test]
    fn test_unknown_tag_uses_fallback_base() {
        assert_eq!(score_ring_tag("round_trip", 2, 1.0), 70.6);
    }

    #[test]
    fn test_score_is_capped() {
        assert_eq!(score_ring(PatternType::FanIn, 40, 1.0), MAX_RING_SCORE);
        assert_eq!(score_ring(PatternType::Cycle, 5, 1.0), 91.0);
    }

    #[test]
    fn test_rounding_follows_decimal_value() {
        assert_eq!(round_to(0.15, 1), 0.1);
        assert_eq!(round_to(0.35, 1), 0.3);
        assert_eq!(round_to(0.25, 1), 0.3);
        assert_eq!(round_to(-0.25, 1), -0.3);
        assert_eq!(round_to(87.36, 1), 87.4);
        assert_eq!(round_to(0.1234567, 3), 0.123);
        assert_eq!(round_to(99.9, 1), 99.9);
    }

    #[test]
    fn test_account_tags() {
        assert_eq!(PatternType::Cycle.account_tag(4), "cycle_length_4");
        assert_eq!(PatternType::FanOut.account_tag(12), "fan_out");
        assert_eq!(PatternType::ShellChain.account_tag(4), "shell_chain");
    }

    #[test]
    fn test_ring_identifier_padding() {
        assert_eq!(ring_identifier(1), "RING_001");
        assert_eq!(ring_identifier(42), "RING_042");
        assert_eq!(ring_identifier(1234), "RING_1234");
    }

    #[test]
    fn test_pattern_serializes_snake_case() {
        let json = serde_json::to_string(&PatternType::ShellChain).unwrap();
        assert_eq!(json, "\"shell_chain\"");
        let parsed: PatternType = serde_json::from_str("\"fan_in\"").unwrap();
        assert_eq!(parsed, PatternType::FanIn);
    }

    #[test]
    fn test_scored_with_size_override() {
        let ring = DetectedRing::scored_with_size(
            vec!["A".to_string(), "B".to_string()],
            PatternType::FanIn,
            Some(11),
        );
        assert_eq!(ring.risk_score, 93.8);
    }
}

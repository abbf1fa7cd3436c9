//! # MuleSight
//!
//! Deterministic detection of money-mule rings in a batch of financial
//! transactions.
//!
//! ## Detection passes
//!
//! - **Cycles**: closed transfer loops of 3 to 5 accounts
//! - **Smurfing**: fan-in aggregation and fan-out distribution across 10 or
//!   more counterparties inside a 72 hour window
//! - **Shell chains**: 3-hop chains through accounts with almost no other
//!   activity
//!
//! Every ring is risk scored, and every account implicated in a ring receives
//! a suspicion score combining ring membership, velocity and flow imbalance.
//!
//! ```no_run
//! use mulesight::{RingDetector, Transaction};
//!
//! let transactions: Vec<Transaction> = Vec::new();
//! let result = RingDetector::new().analyze(&transactions);
//! println!("{}", result.to_json().unwrap());
//! ```

pub mod cycles;
pub mod fraud_patterns;
pub mod network_analysis;
pub mod shell_chains;
pub mod smurfing;
pub mod suspicion;

pub use cycles::{canonical_cycle, CycleDetector};
pub use fraud_patterns::{score_ring, DetectedRing, FraudRing, PatternType};
pub use network_analysis::{AccountStats, TransactionGraph};
pub use shell_chains::ShellChainDetector;
pub use smurfing::SmurfingDetector;
pub use suspicion::{RiskLevel, SuspicionAggregator, SuspiciousAccount};

use chrono::{DateTime, Duration, Utc};
use fraud_patterns::{ring_identifier, round_to};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// Detection errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DetectionError {
    #[error("No transactions supplied for analysis")]
    EmptyInput,

    #[error("Invalid detection config: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse detection config: {0}")]
    ConfigParse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for DetectionError {
    fn from(err: std::io::Error) -> Self {
        DetectionError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for DetectionError {
    fn from(err: toml::de::Error) -> Self {
        DetectionError::ConfigParse(err.to_string())
    }
}

/// Validated transfer between two accounts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub transaction_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    /// Any finite value; sign is not checked
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        transaction_id: &str,
        sender_id: &str,
        receiver_id: &str,
        amount: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            transaction_id: transaction_id.to_string(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            amount,
            timestamp,
        }
    }
}

/// Detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Shortest cycle reported, in accounts (never below 3)
    pub min_cycle_length: usize,
    /// Longest cycle reported, also the DFS depth bound
    pub max_cycle_length: usize,
    /// Distinct counterparties needed for fan-in / fan-out
    pub smurfing_min_counterparties: usize,
    pub smurfing_window_hours: i64,
    /// Inclusive activity range for shell intermediaries
    pub shell_min_transactions: usize,
    pub shell_max_transactions: usize,
    /// Run detectors on the rayon pool (needs the `parallel` feature)
    pub parallel: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_cycle_length: 3,
            max_cycle_length: 5,
            smurfing_min_counterparties: 10,
            smurfing_window_hours: smurfing::DEFAULT_WINDOW_HOURS,
            shell_min_transactions: 2,
            shell_max_transactions: 3,
            parallel: true,
        }
    }
}

impl DetectionConfig {
    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, DetectionError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DetectionError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), DetectionError> {
        if self.min_cycle_length < 3 {
            return Err(DetectionError::InvalidConfig(format!(
                "min_cycle_length must be at least 3 (got {})",
                self.min_cycle_length
            )));
        }
        if self.max_cycle_length < self.min_cycle_length {
            return Err(DetectionError::InvalidConfig(format!(
                "max_cycle_length {} is below min_cycle_length {}",
                self.max_cycle_length, self.min_cycle_length
            )));
        }
        if self.smurfing_min_counterparties == 0 {
            return Err(DetectionError::InvalidConfig(
                "smurfing_min_counterparties must be positive".to_string(),
            ));
        }
        self.smurfing_window()?;
        if self.shell_min_transactions > self.shell_max_transactions {
            return Err(DetectionError::InvalidConfig(format!(
                "shell_min_transactions {} exceeds shell_max_transactions {}",
                self.shell_min_transactions, self.shell_max_transactions
            )));
        }
        Ok(())
    }

    /// Smurfing window as a chrono duration
    pub fn smurfing_window(&self) -> Result<Duration, DetectionError> {
        if self.smurfing_window_hours < 0 {
            return Err(DetectionError::InvalidConfig(format!(
                "smurfing_window_hours cannot be negative (got {})",
                self.smurfing_window_hours
            )));
        }
        Duration::try_hours(self.smurfing_window_hours).ok_or_else(|| {
            DetectionError::InvalidConfig(format!(
                "smurfing_window_hours {} is out of range",
                self.smurfing_window_hours
            ))
        })
    }
}

/// Run-level counters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionSummary {
    pub total_accounts_analyzed: usize,
    pub suspicious_accounts_flagged: usize,
    pub fraud_rings_detected: usize,
    pub processing_time_seconds: f64,
}

/// Output of one detection run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionResult {
    /// Highest suspicion score first
    pub suspicious_accounts: Vec<SuspiciousAccount>,
    /// Emission order: cycles, fan-in, fan-out, shell chains
    pub fraud_rings: Vec<FraudRing>,
    pub summary: DetectionSummary,
}

impl DetectionResult {
    /// Check if any ring was found
    pub fn has_suspicious_activity(&self) -> bool {
        !self.fraud_rings.is_empty()
    }

    /// Rings detected by one pattern
    pub fn rings_of_type(&self, pattern: PatternType) -> Vec<&FraudRing> {
        self.fraud_rings
            .iter()
            .filter(|r| r.pattern_type == pattern)
            .collect()
    }

    pub fn ring(&self, ring_id: &str) -> Option<&FraudRing> {
        self.fraud_rings.iter().find(|r| r.ring_id == ring_id)
    }

    pub fn account(&self, account_id: &str) -> Option<&SuspiciousAccount> {
        self.suspicious_accounts
            .iter()
            .find(|a| a.account_id == account_id)
    }

    /// Export as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Ring detection engine
pub struct RingDetector {
    config: DetectionConfig,
    cycles: CycleDetector,
    smurfing: SmurfingDetector,
    shell_chains: ShellChainDetector,
}

impl RingDetector {
    /// Create a detector with default configuration
    pub fn new() -> Self {
        Self::build(DetectionConfig::default(), SmurfingDetector::default_window())
    }

    /// Create a detector with custom configuration
    pub fn with_config(config: DetectionConfig) -> Result<Self, DetectionError> {
        config.validate()?;
        let window = config.smurfing_window()?;
        Ok(Self::build(config, window))
    }

    fn build(config: DetectionConfig, window: Duration) -> Self {
        Self {
            cycles: CycleDetector::new(config.min_cycle_length, config.max_cycle_length)
                .parallel(config.parallel),
            smurfing: SmurfingDetector::new(config.smurfing_min_counterparties, window),
            shell_chains: ShellChainDetector::new(
                config.shell_min_transactions,
                config.shell_max_transactions,
            ),
            config,
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Analyze a transaction batch, rejecting an empty one
    pub fn try_analyze(
        &self,
        transactions: &[Transaction],
    ) -> Result<DetectionResult, DetectionError> {
        if transactions.is_empty() {
            return Err(DetectionError::EmptyInput);
        }
        Ok(self.analyze(transactions))
    }

    /// Analyze a transaction batch.
    ///
    /// Never fails; an empty batch yields an empty result.
    pub fn analyze(&self, transactions: &[Transaction]) -> DetectionResult {
        let started = Instant::now();

        let graph = TransactionGraph::build(transactions);
        debug!(
            transactions = transactions.len(),
            accounts = graph.account_count(),
            edges = graph.edge_count(),
            "transaction graph built"
        );

        let (cycles, smurfing, shell_chains) = self.run_detectors(transactions, &graph);

        // Identifiers and first-ring-wins depend on this fixed order
        let fraud_rings: Vec<FraudRing> = cycles
            .into_iter()
            .chain(smurfing)
            .chain(shell_chains)
            .enumerate()
            .map(|(index, ring)| ring.into_ring(ring_identifier(index + 1)))
            .collect();

        let mut aggregator = SuspicionAggregator::new();
        for ring in &fraud_rings {
            aggregator.record_ring(ring);
        }
        let suspicious_accounts = aggregator.finish(&graph);

        let summary = DetectionSummary {
            total_accounts_analyzed: graph.account_count(),
            suspicious_accounts_flagged: suspicious_accounts.len(),
            fraud_rings_detected: fraud_rings.len(),
            processing_time_seconds: round_to(started.elapsed().as_secs_f64(), 3),
        };

        info!(
            accounts = summary.total_accounts_analyzed,
            suspicious = summary.suspicious_accounts_flagged,
            rings = summary.fraud_rings_detected,
            seconds = summary.processing_time_seconds,
            "ring detection complete"
        );

        DetectionResult {
            suspicious_accounts,
            fraud_rings,
            summary,
        }
    }

    #[cfg(feature = "parallel")]
    fn run_detectors(
        &self,
        transactions: &[Transaction],
        graph: &TransactionGraph,
    ) -> (Vec<DetectedRing>, Vec<DetectedRing>, Vec<DetectedRing>) {
        if !self.config.parallel {
            return self.run_sequential(transactions, graph);
        }

        let (cycles, (smurfing, shell_chains)) = rayon::join(
            || self.cycles.detect(graph),
            || {
                rayon::join(
                    || self.smurfing.detect(transactions),
                    || self.shell_chains.detect(transactions, graph),
                )
            },
        );
        (cycles, smurfing, shell_chains)
    }

    #[cfg(not(feature = "parallel"))]
    fn run_detectors(
        &self,
        transactions: &[Transaction],
        graph: &TransactionGraph,
    ) -> (Vec<DetectedRing>, Vec<DetectedRing>, Vec<DetectedRing>) {
        self.run_sequential(transactions, graph)
    }

    fn run_sequential(
        &self,
        transactions: &[Transaction],
        graph: &TransactionGraph,
    ) -> (Vec<DetectedRing>, Vec<DetectedRing>, Vec<DetectedRing>) {
        (
            self.cycles.detect(graph),
            self.smurfing.detect(transactions),
            self.shell_chains.detect(transactions, graph),
        )
    }
}

impl Default for RingDetector {
    fn default() -> Self {
        Self::new()
    }
}

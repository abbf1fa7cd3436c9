//! Ring detection example
//!
//! Builds a synthetic dataset containing one of each laundering pattern and
//! prints the detection result.
//!
//! Run with: RUST_LOG=mulesight=debug cargo run --example detect_rings

use chrono::{Duration, TimeZone, Utc};
use mulesight::{PatternType, RingDetector, Transaction};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mulesight=info".parse()?),
        )
        .init();

    println!("=== MuleSight Ring Detection ===\n");

    let start = Utc.with_ymd_and_hms(2024, 11, 6, 9, 0, 0).unwrap();
    let at = |hours: i64| start + Duration::hours(hours);
    let mut transactions = Vec::new();
    let mut next_id = 0;
    let mut push = |from: &str, to: &str, amount: f64, hours: i64| {
        next_id += 1;
        transactions.push(Transaction::new(
            &format!("TXN-{:04}", next_id),
            from,
            to,
            amount,
            at(hours),
        ));
    };

    // 1. Round-trip loop
    push("ACC_00123", "ACC_00456", 12_000.0, 0);
    push("ACC_00456", "ACC_00789", 11_800.0, 2);
    push("ACC_00789", "ACC_00123", 11_500.0, 5);

    // 2. Smurfing into a collector account
    for i in 0..12 {
        push(&format!("SMURF_{:02}", i), "COLLECTOR_01", 950.0, i * 4);
    }

    // 3. Distribution burst
    for i in 0..10 {
        push("PAYOUT_HUB", &format!("MULE_{:02}", i), 2_400.0, 48 + i);
    }

    // 4. Layered shell chain
    push("ORIGIN_77", "SHELL_A", 45_000.0, 10);
    push("SHELL_A", "SHELL_B", 44_500.0, 12);
    push("SHELL_B", "CASHOUT_9", 44_000.0, 15);

    let detector = RingDetector::new();
    let result = detector.analyze(&transactions);

    println!("Rings:");
    for ring in &result.fraud_rings {
        println!(
            "   {} {:<12} size={:<3} risk={:.1}  {}",
            ring.ring_id,
            ring.pattern_type.to_string(),
            ring.size(),
            ring.risk_score,
            ring.member_accounts.join(", ")
        );
    }
    println!();

    println!("Top suspicious accounts:");
    for account in result.suspicious_accounts.iter().take(10) {
        println!(
            "   {:<14} score={:<5} {:?} ({})  {:?}",
            account.account_id,
            account.suspicion_score,
            account.risk_level(),
            account.ring_id,
            account.detected_patterns
        );
    }
    println!();

    println!(
        "Cycles: {}, fan-in: {}, fan-out: {}, shell chains: {}",
        result.rings_of_type(PatternType::Cycle).len(),
        result.rings_of_type(PatternType::FanIn).len(),
        result.rings_of_type(PatternType::FanOut).len(),
        result.rings_of_type(PatternType::ShellChain).len(),
    );
    println!();

    println!("JSON output:");
    println!("{}", result.to_json()?);

    Ok(())
}

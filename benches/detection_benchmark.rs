use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mulesight::{DetectionConfig, RingDetector, Transaction};

/// Deterministic pseudo-random transaction set with a few planted rings
fn synthetic_transactions(count: usize) -> Vec<Transaction> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let accounts = (count / 4).max(10);
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };

    let mut txs = Vec::with_capacity(count + 20);
    for i in 0..count {
        let from = next() as usize % accounts;
        let to = next() as usize % accounts;
        txs.push(Transaction::new(
            &format!("TXN-{}", i),
            &format!("ACC_{:05}", from),
            &format!("ACC_{:05}", to),
            (next() % 10_000) as f64 + 0.5,
            start + Duration::minutes((next() % 20_000) as i64),
        ));
    }
    for i in 0..12 {
        txs.push(Transaction::new(
            &format!("FAN-{}", i),
            &format!("SMURF_{:02}", i),
            "COLLECTOR",
            900.0,
            start + Duration::hours(i),
        ));
    }
    txs
}

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");

    for size in [500usize, 2_000, 5_000] {
        let txs = synthetic_transactions(size);

        group.bench_with_input(BenchmarkId::new("parallel", size), &txs, |b, txs| {
            let detector = RingDetector::new();
            b.iter(|| detector.analyze(black_box(txs)))
        });

        group.bench_with_input(BenchmarkId::new("sequential", size), &txs, |b, txs| {
            let detector = RingDetector::with_config(DetectionConfig {
                parallel: false,
                ..Default::default()
            })
            .unwrap();
            b.iter(|| detector.analyze(black_box(txs)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_analyze);
criterion_main!(benches);

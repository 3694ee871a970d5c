//! Criterion benchmarks for the rule engine and query views.
//!
//! Run with: `cargo bench -p alphacheck-runner`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use alphacheck_core::domain::{EventTime, PositionEvent, SignalEvent, SignalKind};
use alphacheck_core::{AnalysisConfig, EventStore};
use alphacheck_runner::{AnalysisRun, RuleEngine};

/// One PM per ticker split across `traders`, minute steps from 09:30.
fn make_run(traders: usize, tickers: usize, steps: usize) -> AnalysisRun {
    let times: Vec<i64> = (0..steps)
        .map(|i| {
            let minutes = 9 * 60 + 30 + i as i64;
            (minutes / 60) * 10_000_000 + (minutes % 60) * 100_000
        })
        .collect();

    let mut pm = Vec::new();
    let mut split = Vec::new();
    let mut positions = Vec::new();
    let mut virtual_positions = Vec::new();
    for tk in 0..tickers {
        let ticker = format!("{tk:06}");
        for (i, &t) in times.iter().enumerate() {
            let per_trader = ((i + tk) % 20) as f64 * 100.0;
            let held = ((i + tk + 1) % 20) as f64 * 100.0;
            pm.push(SignalEvent::new(
                SignalKind::PmTarget,
                "pm1",
                t,
                ticker.as_str(),
                per_trader * traders as f64,
            ));
            virtual_positions.push(PositionEvent::long_only("pm1", t, ticker.as_str(), held * traders as f64));
            for tr in 0..traders {
                let entity = format!("t{tr}");
                split.push(SignalEvent::new(SignalKind::Split, entity.as_str(), t, ticker.as_str(), per_trader));
                positions.push(PositionEvent::long_only(entity.as_str(), t, ticker.as_str(), held));
            }
        }
    }
    let store = EventStore::builder()
        .merged(pm.clone())
        .pm_targets(pm)
        .split(split)
        .positions(positions)
        .virtual_positions(virtual_positions)
        .build()
        .unwrap();
    AnalysisRun::new(store, AnalysisConfig::default())
}

fn bench_rule_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_engine");
    let engine = RuleEngine::with_default_rules();
    for &tickers in &[20usize, 100] {
        let run = make_run(4, tickers, 60);
        group.bench_with_input(BenchmarkId::new("tickers", tickers), &run, |b, run| {
            b.iter(|| run.check_with(black_box(&engine)))
        });
    }
    group.finish();
}

fn bench_views(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_views");
    let run = make_run(4, 100, 60);
    let open = EventTime::new(93_000_000);

    group.bench_function("overview", |b| b.iter(|| run.overview()));
    group.bench_function("time_slice", |b| b.iter(|| run.time_slice(black_box(open))));
    group.bench_function("summary", |b| b.iter(|| run.summary()));
    group.finish();
}

criterion_group!(benches, bench_rule_engine, bench_views);
criterion_main!(benches);

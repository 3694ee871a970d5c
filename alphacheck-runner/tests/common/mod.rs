//! Shared datasets for runner integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::Path;

use alphacheck_core::domain::{PositionEvent, SignalEvent, SignalKind};
use alphacheck_core::store::EventStoreBuilder;
use alphacheck_core::{AnalysisConfig, EventStore};
use alphacheck_runner::AnalysisRun;

pub const OPEN: i64 = 93_000_000;
pub const T2: i64 = 94_000_000;
pub const T3: i64 = 95_000_000;

pub fn signal(kind: SignalKind, entity: &str, time: i64, ticker: &str, target: f64) -> SignalEvent {
    SignalEvent::new(kind, entity, time, ticker, target)
}

pub fn position(entity: &str, time: i64, ticker: &str, pos: f64) -> PositionEvent {
    PositionEvent::long_only(entity, time, ticker, pos)
}

/// Builder with empty mandatory streams already supplied.
pub fn base_builder() -> EventStoreBuilder {
    EventStore::builder().split(Vec::new()).positions(Vec::new())
}

/// One PM on two tickers, split evenly across two traders; every rule passes.
///
/// Previous-day targets and positions are carried in at `-1`.
/// AAA: t1 fills 80% then holds, t2 fills fully then closes.
/// BBB: both traders maintain a flat book.
pub fn clean_builder() -> EventStoreBuilder {
    use SignalKind::*;
    EventStore::builder()
        .pm_targets(vec![
            signal(PmTarget, "pm1", -1, "AAA", 2000.0),
            signal(PmTarget, "pm1", OPEN, "AAA", 3000.0),
            signal(PmTarget, "pm1", T2, "AAA", 1400.0),
            signal(PmTarget, "pm1", OPEN, "BBB", 0.0),
        ])
        .merged(vec![
            signal(Merged, "merged", -1, "AAA", 2000.0),
            signal(Merged, "merged", OPEN, "AAA", 3000.0),
            signal(Merged, "merged", T2, "AAA", 1400.0),
            signal(Merged, "merged", OPEN, "BBB", 0.0),
        ])
        .split(vec![
            signal(Split, "t1", -1, "AAA", 1000.0),
            signal(Split, "t2", -1, "AAA", 1000.0),
            signal(Split, "t1", OPEN, "AAA", 1500.0),
            signal(Split, "t2", OPEN, "AAA", 1500.0),
            signal(Split, "t1", T2, "AAA", 1400.0),
            signal(Split, "t2", T2, "AAA", 0.0),
            signal(Split, "t1", OPEN, "BBB", 0.0),
            signal(Split, "t2", OPEN, "BBB", 0.0),
        ])
        .positions(vec![
            position("t1", -1, "AAA", 1000.0),
            position("t2", -1, "AAA", 1000.0),
            position("t1", OPEN, "AAA", 1000.0),
            position("t2", OPEN, "AAA", 1000.0),
            position("t1", T2, "AAA", 1400.0),
            position("t2", T2, "AAA", 1500.0),
            position("t1", T3, "AAA", 1400.0),
            position("t2", T3, "AAA", 0.0),
            position("t1", OPEN, "BBB", 0.0),
            position("t2", OPEN, "BBB", 0.0),
            position("t1", T2, "BBB", 0.0),
            position("t2", T2, "BBB", 0.0),
        ])
        .virtual_positions(vec![
            position("pm1", -1, "AAA", 2000.0),
            position("pm1", OPEN, "AAA", 2000.0),
            position("pm1", T2, "AAA", 2900.0),
            position("pm1", T3, "AAA", 1400.0),
            position("pm1", -1, "BBB", 0.0),
            position("pm1", OPEN, "BBB", 0.0),
            position("pm1", T2, "BBB", 0.0),
        ])
}

pub fn run_of(builder: EventStoreBuilder) -> AnalysisRun {
    AnalysisRun::new(builder.build().expect("mandatory streams present"), AnalysisConfig::default())
}

pub fn clean_run() -> AnalysisRun {
    run_of(clean_builder())
}

/// Write the clean dataset as pipe-delimited files.
pub fn write_clean_dir(dir: &Path) {
    let signals = |rows: &[(&str, &str, &str, i64)]| {
        let mut s = String::from("alphaid|time|ticker|volume\n");
        for (e, t, k, v) in rows {
            s.push_str(&format!("{e}|{t}|{k}|{v}\n"));
        }
        s
    };
    let positions = |rows: &[(&str, &str, &str, i64)]| {
        let mut s = String::from(
            "alphaid|time|ticker|realtime_pos|realtime_long_pos|realtime_short_pos|realtime_avail_shot_vol\n",
        );
        for (e, t, k, v) in rows {
            s.push_str(&format!("{e}|{t}|{k}|{v}|{v}|0|0\n"));
        }
        s
    };
    let write = |name: &str, body: String| fs::write(dir.join(name), body).unwrap();

    write(
        "InCheckAlphaEv.csv",
        signals(&[
            ("pm1", "nil_last_alpha", "AAA", 2000),
            ("pm1", "93000000", "AAA", 3000),
            ("pm1", "94000000", "AAA", 1400),
            ("pm1", "93000000", "BBB", 0),
        ]),
    );
    write(
        "SplitAlphaEv.csv",
        signals(&[
            ("t1", "nil_last_alpha", "AAA", 1000),
            ("t2", "nil_last_alpha", "AAA", 1000),
            ("t1", "93000000", "AAA", 1500),
            ("t2", "93000000", "AAA", 1500),
            ("t1", "94000000", "AAA", 1400),
            ("t2", "94000000", "AAA", 0),
            ("t1", "93000000", "BBB", 0),
            ("t2", "93000000", "BBB", 0),
        ]),
    );
    write(
        "SplitCtxEv.csv",
        positions(&[
            ("t1", "nil_last_alpha", "AAA", 1000),
            ("t2", "nil_last_alpha", "AAA", 1000),
            ("t1", "93000000", "AAA", 1000),
            ("t2", "93000000", "AAA", 1000),
            ("t1", "94000000", "AAA", 1400),
            ("t2", "94000000", "AAA", 1500),
            ("t1", "95000000", "AAA", 1400),
            ("t2", "95000000", "AAA", 0),
            ("t1", "93000000", "BBB", 0),
            ("t2", "93000000", "BBB", 0),
            ("t1", "94000000", "BBB", 0),
            ("t2", "94000000", "BBB", 0),
        ]),
    );
    write(
        "VirtualPosEv.csv",
        positions(&[
            ("pm1", "nil_last_alpha", "AAA", 2000),
            ("pm1", "93000000", "AAA", 2000),
            ("pm1", "94000000", "AAA", 2900),
            ("pm1", "95000000", "AAA", 1400),
            ("pm1", "nil_last_alpha", "BBB", 0),
            ("pm1", "93000000", "BBB", 0),
            ("pm1", "94000000", "BBB", 0),
        ]),
    );
}

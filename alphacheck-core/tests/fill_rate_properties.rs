//! Property tests for the fill-rate engine.
//!
//! Uses proptest to verify, over random event streams:
//! 1. Filter projection: a filtered query equals the full cell set restricted to the filter
//! 2. Ordering: cells come out sorted by (time, ticker, entity)
//! 3. Pairing: every cell's next_time is the first later position of its series
//! 4. Arithmetic: fill_rate is actual / intended whenever it is defined

use proptest::prelude::*;
use alphacheck_core::domain::{EventTime, PositionEvent, SignalEvent, SignalKind, Ticker};
use alphacheck_core::{AnalysisConfig, Cell, CellFilter, EventStore, FillOutcome, FillRateEngine, JoinIndex};

// ── Strategies (proptest) ────────────────────────────────────────────

const TIMES: [i64; 5] = [-1, 93_000_000, 94_000_000, 95_000_000, 100_000_000];
const ENTITIES: [&str; 3] = ["t1", "t2", "t3"];
const TICKERS: [&str; 3] = ["AAA", "BBB", "CCC"];

fn arb_key() -> impl Strategy<Value = (usize, usize, usize)> {
    (0..ENTITIES.len(), 0..TIMES.len(), 0..TICKERS.len())
}

fn arb_volume() -> impl Strategy<Value = f64> {
    (0..40u32).prop_map(|lots| f64::from(lots) * 100.0)
}

fn arb_store() -> impl Strategy<Value = EventStore> {
    (
        prop::collection::vec((arb_key(), arb_volume()), 1..30),
        prop::collection::vec((arb_key(), arb_volume()), 1..40),
    )
        .prop_map(|(signals, positions)| {
            let split = signals
                .into_iter()
                .map(|((e, t, k), v)| {
                    SignalEvent::new(SignalKind::Split, ENTITIES[e], TIMES[t], TICKERS[k], v)
                })
                .collect();
            let positions = positions
                .into_iter()
                .map(|((e, t, k), v)| PositionEvent::long_only(ENTITIES[e], TIMES[t], TICKERS[k], v))
                .collect();
            EventStore::builder()
                .split(split)
                .positions(positions)
                .build()
                .expect("split and positions supplied")
        })
}

fn project(all: &[Cell], filter: &CellFilter) -> Vec<Cell> {
    all.iter().filter(|c| filter.matches(c)).cloned().collect()
}

// ── 1. Filter projection ─────────────────────────────────────────────

proptest! {
    /// Filtering before construction yields the same cells as filtering after.
    #[test]
    fn time_filter_is_projection_of_full(store in arb_store(), t in 0..TIMES.len()) {
        let index = JoinIndex::build(&store);
        let config = AnalysisConfig::default();
        let engine = FillRateEngine::new(&store, &index, &config);

        let all = engine.cells(&CellFilter::all());
        let filter = CellFilter::at_time(EventTime(TIMES[t]));
        prop_assert_eq!(engine.cells(&filter), project(&all, &filter));
    }

    #[test]
    fn ticker_filter_is_projection_of_full(store in arb_store(), k in 0..TICKERS.len()) {
        let index = JoinIndex::build(&store);
        let config = AnalysisConfig::default();
        let engine = FillRateEngine::new(&store, &index, &config);

        let all = engine.cells(&CellFilter::all());
        let filter = CellFilter::for_ticker(TICKERS[k]);
        prop_assert_eq!(engine.cells(&filter), project(&all, &filter));
    }

    #[test]
    fn cell_filter_is_projection_of_full(
        store in arb_store(),
        t in 0..TIMES.len(),
        k in 0..TICKERS.len(),
    ) {
        let index = JoinIndex::build(&store);
        let config = AnalysisConfig::default();
        let engine = FillRateEngine::new(&store, &index, &config);

        let all = engine.cells(&CellFilter::all());
        let filter = CellFilter::cell(EventTime(TIMES[t]), TICKERS[k]);
        prop_assert_eq!(engine.cells(&filter), project(&all, &filter));
    }
}

// ── 2-4. Ordering, pairing, arithmetic ───────────────────────────────

proptest! {
    #[test]
    fn cells_sorted_by_time_ticker_entity(store in arb_store()) {
        let index = JoinIndex::build(&store);
        let config = AnalysisConfig::default();
        let cells = FillRateEngine::new(&store, &index, &config).cells(&CellFilter::all());

        for pair in cells.windows(2) {
            let a = (pair[0].time, &pair[0].ticker, &pair[0].entity_id);
            let b = (pair[1].time, &pair[1].ticker, &pair[1].entity_id);
            prop_assert!(a < b, "out of order: {:?} then {:?}", a, b);
        }
    }

    #[test]
    fn next_time_is_first_later_position(store in arb_store()) {
        let index = JoinIndex::build(&store);
        let config = AnalysisConfig::default();
        let cells = FillRateEngine::new(&store, &index, &config).cells(&CellFilter::all());

        for cell in &cells {
            prop_assert!(cell.next_time > cell.time);
            let between = store.positions().rows().any(|r| {
                r.entity == &cell.entity_id
                    && r.ticker == &cell.ticker
                    && r.time > cell.time
                    && r.time < cell.next_time
            });
            prop_assert!(!between, "skipped an intermediate position for {:?}", cell);
        }
    }

    #[test]
    fn fill_rate_is_actual_over_intended(store in arb_store()) {
        let index = JoinIndex::build(&store);
        let config = AnalysisConfig::default();
        let cells = FillRateEngine::new(&store, &index, &config).cells(&CellFilter::all());

        for cell in &cells {
            prop_assert_eq!(cell.intended_trade, cell.target - cell.pos_t);
            prop_assert_eq!(cell.actual_trade, cell.pos_t1 - cell.pos_t);
            match cell.outcome {
                FillOutcome::Filled => {
                    let rate = cell.fill_rate.expect("filled cell has a rate");
                    prop_assert!((rate - cell.actual_trade / cell.intended_trade).abs() < 1e-12);
                }
                _ => prop_assert!(cell.fill_rate.is_none()),
            }
        }
    }
}

#[test]
fn unknown_ticker_filter_is_empty_not_error() {
    let store = EventStore::builder()
        .split(vec![SignalEvent::new(SignalKind::Split, "t1", 93_000_000, "AAA", 100.0)])
        .positions(vec![
            PositionEvent::long_only("t1", 93_000_000, "AAA", 0.0),
            PositionEvent::long_only("t1", 94_000_000, "AAA", 100.0),
        ])
        .build()
        .unwrap();
    let index = JoinIndex::build(&store);
    let config = AnalysisConfig::default();
    let engine = FillRateEngine::new(&store, &index, &config);

    let filter = CellFilter {
        time: None,
        ticker: Some(Ticker::new("NOPE")),
    };
    assert!(engine.cells(&filter).is_empty());
}

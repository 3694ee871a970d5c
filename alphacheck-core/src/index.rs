//! Join Index: precomputed lookup structures over an [`EventStore`].
//!
//! Built once per run in O(total records). Entity ids and tickers are interned
//! into dense keys so point lookups hash three machine words instead of two
//! strings. Every query-time operation is a hash probe or a binary search over
//! a sorted timeline; nothing here rescans a table.
//!
//! Previous-day baseline: a record counts as beginning-of-day carry-in when its
//! time is the literal `-1` marker or strictly before the run's first intraday
//! time (the earliest non-negative signal time). The latest such record per
//! (entity, ticker) wins.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

use crate::domain::{EntityId, EventTime, SignalKind, StreamKind, Ticker};
use crate::store::{EventStore, PositionTable, SignalTable};

/// Interned entity id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(u32);

/// Interned ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickerKey(u32);

/// Interned (entity, ticker) timeline key.
pub type SeriesKey = (EntityKey, TickerKey);

type PointKey = (EntityKey, EventTime, TickerKey);

#[derive(Debug)]
struct Interner<T> {
    ids: HashMap<T, u32>,
    values: Vec<T>,
}

impl<T> Default for Interner<T> {
    fn default() -> Self {
        Self {
            ids: HashMap::new(),
            values: Vec::new(),
        }
    }
}

impl<T: Clone + Eq + std::hash::Hash> Interner<T> {
    fn intern(&mut self, value: &T) -> u32 {
        if let Some(&id) = self.ids.get(value) {
            return id;
        }
        let id = self.values.len() as u32;
        self.values.push(value.clone());
        self.ids.insert(value.clone(), id);
        id
    }

    fn get(&self, value: &T) -> Option<u32> {
        self.ids.get(value).copied()
    }
}

/// Lookup structures for one keyed stream.
#[derive(Debug, Default)]
struct StreamIndex {
    point: HashMap<PointKey, usize>,
    by_time: BTreeMap<EventTime, Vec<usize>>,
    members: HashMap<(EventTime, TickerKey), Vec<EntityKey>>,
    timelines: HashMap<SeriesKey, Vec<EventTime>>,
    baseline: HashMap<SeriesKey, EventTime>,
    duplicates: usize,
}

impl StreamIndex {
    fn insert(&mut self, row: usize, entity: EntityKey, time: EventTime, ticker: TickerKey) {
        if self.point.insert((entity, time, ticker), row).is_some() {
            self.duplicates += 1;
        } else {
            self.members.entry((time, ticker)).or_default().push(entity);
            self.timelines.entry((entity, ticker)).or_default().push(time);
        }
        self.by_time.entry(time).or_default().push(row);
    }

    fn finish(&mut self, first_intraday: Option<EventTime>) {
        for (key, times) in self.timelines.iter_mut() {
            times.sort_unstable();
            times.dedup();
            let carry_in = times
                .iter()
                .rev()
                .find(|t| is_carry_in(**t, first_intraday))
                .copied();
            if let Some(t) = carry_in {
                self.baseline.insert(*key, t);
            }
        }
    }
}

fn is_carry_in(time: EventTime, first_intraday: Option<EventTime>) -> bool {
    match first_intraday {
        Some(open) => time.is_previous_day_marker() || time < open,
        None => time.is_previous_day_marker(),
    }
}

#[derive(Debug, Default)]
pub struct JoinIndex {
    entities: Interner<EntityId>,
    tickers: Interner<Ticker>,
    pm_targets: StreamIndex,
    merged: StreamIndex,
    split: StreamIndex,
    positions: StreamIndex,
    virtual_positions: StreamIndex,
    market: HashMap<(EventTime, TickerKey), usize>,
    unkeyed: StreamIndex,
    first_intraday: Option<EventTime>,
    /// Fill-rate origins: keys with a Split or Position record at a time.
    origins_by_time: BTreeMap<EventTime, Vec<SeriesKey>>,
    /// Fill-rate series per ticker (entities with Split or Position records).
    series_by_ticker: HashMap<TickerKey, Vec<EntityKey>>,
    series: BTreeSet<SeriesKey>,
}

impl JoinIndex {
    pub fn build(store: &EventStore) -> Self {
        let mut index = JoinIndex {
            first_intraday: first_intraday_time(store),
            ..Default::default()
        };

        if let Some(t) = store.pm_targets() {
            index.index_signals(t);
        }
        if let Some(t) = store.merged() {
            index.index_signals(t);
        }
        index.index_signals(store.split());
        index.index_positions(store.positions(), false);
        if let Some(t) = store.virtual_positions() {
            index.index_positions(t, true);
        }
        if let Some(market) = store.market() {
            for r in market.rows() {
                let ticker = TickerKey(index.tickers.intern(r.ticker));
                index.market.insert((r.time, ticker), r.row);
            }
        }

        let first_intraday = index.first_intraday;
        for stream in [
            &mut index.pm_targets,
            &mut index.merged,
            &mut index.split,
            &mut index.positions,
            &mut index.virtual_positions,
        ] {
            stream.finish(first_intraday);
        }
        index.build_series();

        for kind in StreamKind::ALL {
            if let Some(s) = index.stream(kind) {
                if s.duplicates > 0 {
                    warn!(stream = %kind, duplicates = s.duplicates, "duplicate (entity, time, ticker) records; last one wins");
                }
            }
        }
        debug!(
            entities = index.entities.values.len(),
            tickers = index.tickers.values.len(),
            series = index.series.len(),
            first_intraday = ?index.first_intraday,
            "join index built"
        );
        index
    }

    fn index_signals(&mut self, table: &SignalTable) {
        let mut stream = std::mem::take(self.signal_stream_mut(table.kind()));
        for r in table.rows() {
            let entity = EntityKey(self.entities.intern(r.entity));
            let ticker = TickerKey(self.tickers.intern(r.ticker));
            stream.insert(r.row, entity, r.time, ticker);
        }
        *self.signal_stream_mut(table.kind()) = stream;
    }

    fn index_positions(&mut self, table: &PositionTable, is_virtual: bool) {
        let mut stream = std::mem::take(if is_virtual {
            &mut self.virtual_positions
        } else {
            &mut self.positions
        });
        for r in table.rows() {
            let entity = EntityKey(self.entities.intern(r.entity));
            let ticker = TickerKey(self.tickers.intern(r.ticker));
            stream.insert(r.row, entity, r.time, ticker);
        }
        if is_virtual {
            self.virtual_positions = stream;
        } else {
            self.positions = stream;
        }
    }

    fn signal_stream_mut(&mut self, kind: SignalKind) -> &mut StreamIndex {
        match kind {
            SignalKind::PmTarget => &mut self.pm_targets,
            SignalKind::Merged => &mut self.merged,
            SignalKind::Split => &mut self.split,
        }
    }

    fn build_series(&mut self) {
        let mut origins: BTreeMap<EventTime, BTreeSet<SeriesKey>> = BTreeMap::new();
        for stream in [&self.split, &self.positions] {
            for (&key, times) in &stream.timelines {
                self.series.insert(key);
                for &t in times {
                    origins.entry(t).or_default().insert(key);
                }
            }
        }
        self.origins_by_time = origins
            .into_iter()
            .map(|(t, keys)| (t, keys.into_iter().collect()))
            .collect();
        for &(entity, ticker) in &self.series {
            self.series_by_ticker.entry(ticker).or_default().push(entity);
        }
    }

    fn stream(&self, kind: StreamKind) -> Option<&StreamIndex> {
        match kind {
            StreamKind::PmTarget => Some(&self.pm_targets),
            StreamKind::Merged => Some(&self.merged),
            StreamKind::Split => Some(&self.split),
            StreamKind::Position => Some(&self.positions),
            StreamKind::VirtualPosition => Some(&self.virtual_positions),
            StreamKind::Market => None,
        }
    }

    fn keyed(&self, kind: StreamKind) -> &StreamIndex {
        // Market has no entity axis; it is served by `market_row`.
        self.stream(kind).unwrap_or(&self.unkeyed)
    }

    // ─── Key resolution ──────────────────────────────────────────────

    pub fn entity_key(&self, entity: &EntityId) -> Option<EntityKey> {
        self.entities.get(entity).map(EntityKey)
    }

    pub fn ticker_key(&self, ticker: &Ticker) -> Option<TickerKey> {
        self.tickers.get(ticker).map(TickerKey)
    }

    pub fn entity(&self, key: EntityKey) -> &EntityId {
        &self.entities.values[key.0 as usize]
    }

    pub fn ticker(&self, key: TickerKey) -> &Ticker {
        &self.tickers.values[key.0 as usize]
    }

    /// Earliest non-negative signal time; anything before it is carry-in.
    pub fn first_intraday_time(&self) -> Option<EventTime> {
        self.first_intraday
    }

    pub fn is_carry_in(&self, time: EventTime) -> bool {
        is_carry_in(time, self.first_intraday)
    }

    // ─── Point lookups ───────────────────────────────────────────────

    /// Row of the record at (entity, time, ticker) in a keyed stream.
    pub fn row(
        &self,
        kind: StreamKind,
        entity: &EntityId,
        time: EventTime,
        ticker: &Ticker,
    ) -> Option<usize> {
        let e = self.entity_key(entity)?;
        let k = self.ticker_key(ticker)?;
        self.row_by_key(kind, (e, k), time)
    }

    pub fn row_by_key(&self, kind: StreamKind, series: SeriesKey, time: EventTime) -> Option<usize> {
        self.keyed(kind).point.get(&(series.0, time, series.1)).copied()
    }

    pub fn market_row(&self, time: EventTime, ticker: &Ticker) -> Option<usize> {
        let k = self.ticker_key(ticker)?;
        self.market.get(&(time, k)).copied()
    }

    // ─── Time / membership ───────────────────────────────────────────

    /// Distinct times of a keyed stream, ascending.
    pub fn times(&self, kind: StreamKind) -> impl Iterator<Item = EventTime> + '_ {
        self.keyed(kind).by_time.keys().copied()
    }

    /// All rows of a keyed stream recorded at `time`.
    pub fn rows_at(&self, kind: StreamKind, time: EventTime) -> &[usize] {
        self.keyed(kind)
            .by_time
            .get(&time)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Entities with a record at (time, ticker) in the given stream.
    pub fn entities_at(&self, kind: StreamKind, time: EventTime, ticker: &Ticker) -> Vec<&EntityId> {
        let Some(k) = self.ticker_key(ticker) else {
            return Vec::new();
        };
        self.keyed(kind)
            .members
            .get(&(time, k))
            .map(|keys| keys.iter().map(|&e| self.entity(e)).collect())
            .unwrap_or_default()
    }

    /// (time, ticker) pairs present in a keyed stream, with their entity keys.
    pub fn memberships(
        &self,
        kind: StreamKind,
    ) -> impl Iterator<Item = (EventTime, TickerKey, &[EntityKey])> + '_ {
        self.keyed(kind)
            .members
            .iter()
            .map(|(&(t, k), entities)| (t, k, entities.as_slice()))
    }

    // ─── Timelines ───────────────────────────────────────────────────

    /// Sorted distinct times of an (entity, ticker) series in a keyed stream.
    pub fn timeline(&self, kind: StreamKind, series: SeriesKey) -> &[EventTime] {
        self.keyed(kind)
            .timelines
            .get(&series)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Next Position time strictly after `time` for the series.
    pub fn next_position_time(&self, series: SeriesKey, time: EventTime) -> Option<EventTime> {
        let times = self.timeline(StreamKind::Position, series);
        let idx = times.partition_point(|&t| t <= time);
        times.get(idx).copied()
    }

    /// Latest record time at or before `time` in a keyed stream.
    pub fn at_or_before(&self, kind: StreamKind, series: SeriesKey, time: EventTime) -> Option<EventTime> {
        let times = self.timeline(kind, series);
        let idx = times.partition_point(|&t| t <= time);
        idx.checked_sub(1).map(|i| times[i])
    }

    /// Beginning-of-day carry-in record time for the series, if any.
    pub fn baseline_time(&self, kind: StreamKind, series: SeriesKey) -> Option<EventTime> {
        self.keyed(kind).baseline.get(&series).copied()
    }

    /// Row of the beginning-of-day carry-in record for the series.
    pub fn baseline_row(&self, kind: StreamKind, series: SeriesKey) -> Option<usize> {
        let t = self.baseline_time(kind, series)?;
        self.row_by_key(kind, series, t)
    }

    // ─── Fill-rate pre-filters ───────────────────────────────────────

    /// Every (entity, ticker) series with Split or Position records.
    pub fn series(&self) -> impl Iterator<Item = SeriesKey> + '_ {
        self.series.iter().copied()
    }

    /// Series with a Split or Position record at `time`.
    pub fn origins_at(&self, time: EventTime) -> &[SeriesKey] {
        self.origins_by_time
            .get(&time)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Entities with a Split or Position record at (time, ticker), ascending key order.
    pub fn origins_at_cell(&self, time: EventTime, ticker: TickerKey) -> Vec<EntityKey> {
        let mut entities: Vec<EntityKey> = [&self.split, &self.positions]
            .iter()
            .filter_map(|s| s.members.get(&(time, ticker)))
            .flatten()
            .copied()
            .collect();
        entities.sort_unstable();
        entities.dedup();
        entities
    }

    /// Entities with Split or Position records for `ticker`.
    pub fn series_for_ticker(&self, ticker: TickerKey) -> &[EntityKey] {
        self.series_by_ticker
            .get(&ticker)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Sorted union of Split and Position times for a series.
    pub fn origin_times(&self, series: SeriesKey) -> Vec<EventTime> {
        let mut times: Vec<EventTime> = self
            .timeline(StreamKind::Split, series)
            .iter()
            .chain(self.timeline(StreamKind::Position, series))
            .copied()
            .collect();
        times.sort_unstable();
        times.dedup();
        times
    }

    pub fn duplicate_records(&self, kind: StreamKind) -> usize {
        self.stream(kind).map_or(0, |s| s.duplicates)
    }
}

fn first_intraday_time(store: &EventStore) -> Option<EventTime> {
    [SignalKind::PmTarget, SignalKind::Merged, SignalKind::Split]
        .into_iter()
        .filter_map(|kind| store.signals(kind))
        .flat_map(|table| table.times().iter().copied())
        .filter(|t| !t.is_previous_day_marker())
        .min()
}

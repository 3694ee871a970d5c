//! Event Store: columnar, read-only tables for every input stream of a run.
//!
//! Each table is a struct of parallel vectors; a row index is the stable handle
//! the join index stores. Tables are filled once by [`EventStoreBuilder`] and
//! never mutated afterwards.

use serde::Serialize;
use std::collections::HashSet;

use crate::data::DataError;
use crate::domain::{
    EntityId, EventTime, MarketEvent, PositionEvent, SignalEvent, SignalKind, StreamKind, Ticker,
};

/// Length-prefixed so adjacent fields cannot shift bytes into each other.
fn hash_str(hasher: &mut blake3::Hasher, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

// ─── Signal table ────────────────────────────────────────────────────

/// Borrowed view of one signal row.
#[derive(Debug, Clone, Copy)]
pub struct SignalRow<'a> {
    pub row: usize,
    pub entity: &'a EntityId,
    pub time: EventTime,
    pub ticker: &'a Ticker,
    pub target: f64,
}

#[derive(Debug, Clone)]
pub struct SignalTable {
    kind: SignalKind,
    entity: Vec<EntityId>,
    time: Vec<EventTime>,
    ticker: Vec<Ticker>,
    target: Vec<f64>,
}

impl SignalTable {
    pub fn new(kind: SignalKind) -> Self {
        Self {
            kind,
            entity: Vec::new(),
            time: Vec::new(),
            ticker: Vec::new(),
            target: Vec::new(),
        }
    }

    pub fn from_events(
        kind: SignalKind,
        events: impl IntoIterator<Item = SignalEvent>,
    ) -> Result<Self, DataError> {
        let mut table = Self::new(kind);
        for event in events {
            table.push(event)?;
        }
        Ok(table)
    }

    /// Append a record. Records of another signal stage are rejected.
    pub fn push(&mut self, event: SignalEvent) -> Result<(), DataError> {
        if event.stream_kind != self.kind {
            return Err(DataError::StreamMismatch {
                stream: self.kind.into(),
                found: event.stream_kind,
            });
        }
        self.entity.push(event.entity_id);
        self.time.push(event.time);
        self.ticker.push(event.ticker);
        self.target.push(event.target_position);
        Ok(())
    }

    pub fn kind(&self) -> SignalKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    pub fn row(&self, row: usize) -> SignalRow<'_> {
        SignalRow {
            row,
            entity: &self.entity[row],
            time: self.time[row],
            ticker: &self.ticker[row],
            target: self.target[row],
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = SignalRow<'_>> + '_ {
        (0..self.len()).map(move |i| self.row(i))
    }

    pub fn target(&self, row: usize) -> f64 {
        self.target[row]
    }

    pub fn times(&self) -> &[EventTime] {
        &self.time
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.ticker
    }

    fn hash_into(&self, hasher: &mut blake3::Hasher) {
        for r in self.rows() {
            hash_str(hasher, r.entity.as_str());
            hasher.update(&r.time.raw().to_le_bytes());
            hash_str(hasher, r.ticker.as_str());
            hasher.update(&r.target.to_le_bytes());
        }
    }
}

// ─── Position table ──────────────────────────────────────────────────

/// Borrowed view of one position row.
#[derive(Debug, Clone, Copy)]
pub struct PositionRow<'a> {
    pub row: usize,
    pub entity: &'a EntityId,
    pub time: EventTime,
    pub ticker: &'a Ticker,
    pub pos: f64,
    pub long: f64,
    pub short: f64,
    pub avail_short: f64,
}

/// Shared by the trader Position stream and the PM VirtualPosition stream.
#[derive(Debug, Clone, Default)]
pub struct PositionTable {
    entity: Vec<EntityId>,
    time: Vec<EventTime>,
    ticker: Vec<Ticker>,
    pos: Vec<f64>,
    long: Vec<f64>,
    short: Vec<f64>,
    avail_short: Vec<f64>,
}

impl PositionTable {
    pub fn from_events(events: impl IntoIterator<Item = PositionEvent>) -> Self {
        let mut table = Self::default();
        for event in events {
            table.push(event);
        }
        table
    }

    pub fn push(&mut self, event: PositionEvent) {
        self.entity.push(event.entity_id);
        self.time.push(event.time);
        self.ticker.push(event.ticker);
        self.pos.push(event.realtime_pos);
        self.long.push(event.realtime_long_pos);
        self.short.push(event.realtime_short_pos);
        self.avail_short.push(event.realtime_avail_short_vol);
    }

    pub fn len(&self) -> usize {
        self.pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pos.is_empty()
    }

    pub fn row(&self, row: usize) -> PositionRow<'_> {
        PositionRow {
            row,
            entity: &self.entity[row],
            time: self.time[row],
            ticker: &self.ticker[row],
            pos: self.pos[row],
            long: self.long[row],
            short: self.short[row],
            avail_short: self.avail_short[row],
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = PositionRow<'_>> + '_ {
        (0..self.len()).map(move |i| self.row(i))
    }

    pub fn pos(&self, row: usize) -> f64 {
        self.pos[row]
    }

    pub fn times(&self) -> &[EventTime] {
        &self.time
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.ticker
    }

    fn hash_into(&self, hasher: &mut blake3::Hasher) {
        for r in self.rows() {
            hash_str(hasher, r.entity.as_str());
            hasher.update(&r.time.raw().to_le_bytes());
            hash_str(hasher, r.ticker.as_str());
            hasher.update(&r.pos.to_le_bytes());
            hasher.update(&r.long.to_le_bytes());
            hasher.update(&r.short.to_le_bytes());
            hasher.update(&r.avail_short.to_le_bytes());
        }
    }
}

// ─── Market table ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct MarketRow<'a> {
    pub row: usize,
    pub time: EventTime,
    pub ticker: &'a Ticker,
    pub last_price: f64,
    pub prev_close_price: f64,
}

#[derive(Debug, Clone, Default)]
pub struct MarketTable {
    time: Vec<EventTime>,
    ticker: Vec<Ticker>,
    last_price: Vec<f64>,
    prev_close_price: Vec<f64>,
}

impl MarketTable {
    pub fn from_events(events: impl IntoIterator<Item = MarketEvent>) -> Self {
        let mut table = Self::default();
        for event in events {
            table.time.push(event.time);
            table.ticker.push(event.ticker);
            table.last_price.push(event.last_price);
            table.prev_close_price.push(event.prev_close_price);
        }
        table
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn row(&self, row: usize) -> MarketRow<'_> {
        MarketRow {
            row,
            time: self.time[row],
            ticker: &self.ticker[row],
            last_price: self.last_price[row],
            prev_close_price: self.prev_close_price[row],
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = MarketRow<'_>> + '_ {
        (0..self.len()).map(move |i| self.row(i))
    }

    fn hash_into(&self, hasher: &mut blake3::Hasher) {
        for r in self.rows() {
            hasher.update(&r.time.raw().to_le_bytes());
            hash_str(hasher, r.ticker.as_str());
            hasher.update(&r.last_price.to_le_bytes());
            hasher.update(&r.prev_close_price.to_le_bytes());
        }
    }
}

// ─── Store ───────────────────────────────────────────────────────────

/// Record/time/ticker counts for one stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamSummary {
    pub stream: StreamKind,
    pub present: bool,
    pub records: usize,
    pub distinct_times: usize,
    pub distinct_tickers: usize,
}

impl StreamSummary {
    fn of(stream: StreamKind, times: &[EventTime], tickers: &[Ticker]) -> Self {
        Self {
            stream,
            present: !times.is_empty(),
            records: times.len(),
            distinct_times: times.iter().collect::<HashSet<_>>().len(),
            distinct_tickers: tickers.iter().collect::<HashSet<_>>().len(),
        }
    }

    fn absent(stream: StreamKind) -> Self {
        Self {
            stream,
            present: false,
            records: 0,
            distinct_times: 0,
            distinct_tickers: 0,
        }
    }
}

/// All streams of one analysis run.
#[derive(Debug, Clone)]
pub struct EventStore {
    pm_targets: Option<SignalTable>,
    merged: Option<SignalTable>,
    split: SignalTable,
    positions: PositionTable,
    virtual_positions: Option<PositionTable>,
    market: Option<MarketTable>,
}

impl EventStore {
    pub fn builder() -> EventStoreBuilder {
        EventStoreBuilder::default()
    }

    pub fn split(&self) -> &SignalTable {
        &self.split
    }

    pub fn positions(&self) -> &PositionTable {
        &self.positions
    }

    /// Optional streams come back as `None` when absent or empty.
    pub fn pm_targets(&self) -> Option<&SignalTable> {
        self.pm_targets.as_ref().filter(|t| !t.is_empty())
    }

    pub fn merged(&self) -> Option<&SignalTable> {
        self.merged.as_ref().filter(|t| !t.is_empty())
    }

    pub fn virtual_positions(&self) -> Option<&PositionTable> {
        self.virtual_positions.as_ref().filter(|t| !t.is_empty())
    }

    pub fn market(&self) -> Option<&MarketTable> {
        self.market.as_ref().filter(|t| !t.is_empty())
    }

    pub fn signals(&self, kind: SignalKind) -> Option<&SignalTable> {
        match kind {
            SignalKind::PmTarget => self.pm_targets(),
            SignalKind::Merged => self.merged(),
            SignalKind::Split => Some(&self.split),
        }
    }

    pub fn has_stream(&self, kind: StreamKind) -> bool {
        match kind {
            StreamKind::PmTarget => self.pm_targets().is_some(),
            StreamKind::Merged => self.merged().is_some(),
            StreamKind::VirtualPosition => self.virtual_positions().is_some(),
            StreamKind::Market => self.market().is_some(),
            StreamKind::Split | StreamKind::Position => true,
        }
    }

    pub fn total_records(&self) -> usize {
        self.pm_targets.as_ref().map_or(0, SignalTable::len)
            + self.merged.as_ref().map_or(0, SignalTable::len)
            + self.split.len()
            + self.positions.len()
            + self.virtual_positions.as_ref().map_or(0, PositionTable::len)
            + self.market.as_ref().map_or(0, MarketTable::len)
    }

    /// Per-stream counts in `StreamKind::ALL` order.
    pub fn summary(&self) -> Vec<StreamSummary> {
        StreamKind::ALL
            .iter()
            .map(|&kind| match kind {
                StreamKind::PmTarget | StreamKind::Merged | StreamKind::Split => {
                    let signal_kind = match kind {
                        StreamKind::PmTarget => SignalKind::PmTarget,
                        StreamKind::Merged => SignalKind::Merged,
                        _ => SignalKind::Split,
                    };
                    match self.signals(signal_kind) {
                        Some(t) => StreamSummary::of(kind, t.times(), t.tickers()),
                        None => StreamSummary::absent(kind),
                    }
                }
                StreamKind::Position => {
                    StreamSummary::of(kind, self.positions.times(), self.positions.tickers())
                }
                StreamKind::VirtualPosition => match self.virtual_positions() {
                    Some(t) => StreamSummary::of(kind, t.times(), t.tickers()),
                    None => StreamSummary::absent(kind),
                },
                StreamKind::Market => match self.market() {
                    Some(t) => StreamSummary::of(kind, &t.time, &t.ticker),
                    None => StreamSummary::absent(kind),
                },
            })
            .collect()
    }

    /// BLAKE3 content hash over every present stream, in a fixed stream order.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for kind in StreamKind::ALL {
            if !self.has_stream(kind) {
                continue;
            }
            hash_str(&mut hasher, kind.name());
            match kind {
                StreamKind::PmTarget => self.pm_targets.iter().for_each(|t| t.hash_into(&mut hasher)),
                StreamKind::Merged => self.merged.iter().for_each(|t| t.hash_into(&mut hasher)),
                StreamKind::Split => self.split.hash_into(&mut hasher),
                StreamKind::Position => self.positions.hash_into(&mut hasher),
                StreamKind::VirtualPosition => self
                    .virtual_positions
                    .iter()
                    .for_each(|t| t.hash_into(&mut hasher)),
                StreamKind::Market => self.market.iter().for_each(|t| t.hash_into(&mut hasher)),
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

/// Collects the loader's records and performs the load-time precondition check.
#[derive(Debug, Default)]
pub struct EventStoreBuilder {
    pm_targets: Option<Vec<SignalEvent>>,
    merged: Option<Vec<SignalEvent>>,
    split: Option<Vec<SignalEvent>>,
    positions: Option<Vec<PositionEvent>>,
    virtual_positions: Option<Vec<PositionEvent>>,
    market: Option<Vec<MarketEvent>>,
}

impl EventStoreBuilder {
    pub fn pm_targets(mut self, events: Vec<SignalEvent>) -> Self {
        self.pm_targets = Some(events);
        self
    }

    pub fn merged(mut self, events: Vec<SignalEvent>) -> Self {
        self.merged = Some(events);
        self
    }

    pub fn split(mut self, events: Vec<SignalEvent>) -> Self {
        self.split = Some(events);
        self
    }

    pub fn positions(mut self, events: Vec<PositionEvent>) -> Self {
        self.positions = Some(events);
        self
    }

    pub fn virtual_positions(mut self, events: Vec<PositionEvent>) -> Self {
        self.virtual_positions = Some(events);
        self
    }

    pub fn market(mut self, events: Vec<MarketEvent>) -> Self {
        self.market = Some(events);
        self
    }

    /// Fails with [`DataError::MissingStream`] when Split or Position was never supplied.
    pub fn build(self) -> Result<EventStore, DataError> {
        let split = self
            .split
            .ok_or(DataError::MissingStream(StreamKind::Split))?;
        let positions = self
            .positions
            .ok_or(DataError::MissingStream(StreamKind::Position))?;

        Ok(EventStore {
            pm_targets: self
                .pm_targets
                .map(|e| SignalTable::from_events(SignalKind::PmTarget, e))
                .transpose()?,
            merged: self
                .merged
                .map(|e| SignalTable::from_events(SignalKind::Merged, e))
                .transpose()?,
            split: SignalTable::from_events(SignalKind::Split, split)?,
            positions: PositionTable::from_events(positions),
            virtual_positions: self.virtual_positions.map(PositionTable::from_events),
            market: self.market.map(MarketTable::from_events),
        })
    }
}

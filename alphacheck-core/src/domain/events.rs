//! Input records handed over by the loader. Immutable for the duration of a run.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{EntityId, Ticker};
use super::time::EventTime;

/// Every stream the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamKind {
    PmTarget,
    Merged,
    Split,
    Position,
    VirtualPosition,
    Market,
}

impl StreamKind {
    pub const ALL: [StreamKind; 6] = [
        StreamKind::PmTarget,
        StreamKind::Merged,
        StreamKind::Split,
        StreamKind::Position,
        StreamKind::VirtualPosition,
        StreamKind::Market,
    ];

    /// Mandatory streams abort the run at load time when absent.
    pub fn is_mandatory(self) -> bool {
        matches!(self, StreamKind::Split | StreamKind::Position)
    }

    pub fn name(self) -> &'static str {
        match self {
            StreamKind::PmTarget => "pm_target",
            StreamKind::Merged => "merged",
            StreamKind::Split => "split",
            StreamKind::Position => "position",
            StreamKind::VirtualPosition => "virtual_position",
            StreamKind::Market => "market",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The three signal stages of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    PmTarget,
    Merged,
    Split,
}

impl From<SignalKind> for StreamKind {
    fn from(kind: SignalKind) -> Self {
        match kind {
            SignalKind::PmTarget => StreamKind::PmTarget,
            SignalKind::Merged => StreamKind::Merged,
            SignalKind::Split => StreamKind::Split,
        }
    }
}

/// A target-position signal. `target_position` is an absolute position to reach,
/// never a trade size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub stream_kind: SignalKind,
    pub entity_id: EntityId,
    pub time: EventTime,
    pub ticker: Ticker,
    pub target_position: f64,
}

impl SignalEvent {
    pub fn new(
        stream_kind: SignalKind,
        entity_id: impl Into<EntityId>,
        time: i64,
        ticker: impl Into<Ticker>,
        target_position: f64,
    ) -> Self {
        Self {
            stream_kind,
            entity_id: entity_id.into(),
            time: EventTime(time),
            ticker: ticker.into(),
            target_position,
        }
    }
}

/// A realized (or, on the virtual stream, attributed) position snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionEvent {
    pub entity_id: EntityId,
    pub time: EventTime,
    pub ticker: Ticker,
    pub realtime_pos: f64,
    pub realtime_long_pos: f64,
    pub realtime_short_pos: f64,
    pub realtime_avail_short_vol: f64,
}

impl PositionEvent {
    /// Long-only snapshot: `pos == long`, no short leg.
    pub fn long_only(
        entity_id: impl Into<EntityId>,
        time: i64,
        ticker: impl Into<Ticker>,
        realtime_pos: f64,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            time: EventTime(time),
            ticker: ticker.into(),
            realtime_pos,
            realtime_long_pos: realtime_pos,
            realtime_short_pos: 0.0,
            realtime_avail_short_vol: 0.0,
        }
    }
}

/// Market context for a ticker at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub time: EventTime,
    pub ticker: Ticker,
    pub last_price: f64,
    pub prev_close_price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_split_and_position_are_mandatory() {
        let mandatory: Vec<_> = StreamKind::ALL
            .iter()
            .copied()
            .filter(|k| k.is_mandatory())
            .collect();
        assert_eq!(mandatory, vec![StreamKind::Split, StreamKind::Position]);
    }

    #[test]
    fn test_long_only_position_keeps_identity() {
        let p = PositionEvent::long_only("t1", 93_000_000, "AAA", 1200.0);
        assert_eq!(p.realtime_pos, p.realtime_long_pos - p.realtime_short_pos);
    }

    #[test]
    fn test_stream_kind_serializes_screaming_snake() {
        let json = serde_json::to_string(&StreamKind::VirtualPosition).unwrap();
        assert_eq!(json, "\"VIRTUAL_POSITION\"");
    }
}

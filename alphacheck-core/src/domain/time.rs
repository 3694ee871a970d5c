//! Event time: an `i64` in HHMMSSmmm encoding (`93000000` = 09:30:00.000).
//!
//! The literal `-1` marks the previous trading day's closing state. Any other
//! time strictly before the first intraday time of a run is also accepted as
//! beginning-of-day carry-in; that comparison needs run context and is resolved
//! by the join index, not here.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventTime(pub i64);

impl EventTime {
    /// Literal previous-day marker (`nil_last_alpha` in raw files).
    pub const PREVIOUS_DAY: EventTime = EventTime(-1);

    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> i64 {
        self.0
    }

    pub fn is_previous_day_marker(self) -> bool {
        self.0 < 0
    }

    /// Parse a raw time token. Non-numeric tokens map to the previous-day marker.
    pub fn parse_token(token: &str) -> Self {
        token
            .trim()
            .parse::<i64>()
            .map(Self)
            .unwrap_or(Self::PREVIOUS_DAY)
    }

    /// Wall-clock reading of the encoded time, `None` for the marker or
    /// out-of-range encodings.
    pub fn clock(self) -> Option<NaiveTime> {
        if self.0 < 0 {
            return None;
        }
        let millis = (self.0 % 1_000) as u32;
        let secs = ((self.0 / 1_000) % 100) as u32;
        let mins = ((self.0 / 100_000) % 100) as u32;
        let hours = u32::try_from(self.0 / 10_000_000).ok()?;
        NaiveTime::from_hms_milli_opt(hours, mins, secs, millis)
    }

    /// Human-readable label used by reports.
    pub fn label(self) -> String {
        match self.clock() {
            Some(t) => t.format("%H:%M:%S%.3f").to_string(),
            None if self.is_previous_day_marker() => "prev-day".to_string(),
            None => self.0.to_string(),
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EventTime {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

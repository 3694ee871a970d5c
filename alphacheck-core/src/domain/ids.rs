use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity identifier: a PM id on the PmTarget/Merged/VirtualPosition streams,
/// a trader id on the Split/Position streams.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Instrument ticker (e.g. `600000.SH`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(pub String);

impl Ticker {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self(ticker.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Ticker {
    fn from(ticker: &str) -> Self {
        Self(ticker.to_string())
    }
}

impl From<String> for Ticker {
    fn from(ticker: String) -> Self {
        Self(ticker)
    }
}

/// Composite key of an (entity, ticker) timeline.
pub type EntityTicker = (EntityId, Ticker);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_order_lexicographically() {
        let mut ids = vec![EntityId::from("trader_b"), EntityId::from("trader_a")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "trader_a");
    }

    #[test]
    fn test_ticker_serializes_transparently() {
        let json = serde_json::to_string(&Ticker::from("600000.SH")).unwrap();
        assert_eq!(json, "\"600000.SH\"");
    }
}

//! Domain types for alphacheck

pub mod events;
pub mod finding;
pub mod ids;
pub mod time;

pub use events::{MarketEvent, PositionEvent, SignalEvent, SignalKind, StreamKind};
pub use finding::{Finding, Status};
pub use ids::{EntityId, EntityTicker, Ticker};
pub use time::EventTime;

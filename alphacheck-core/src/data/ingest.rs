//! Pipe-delimited event file loader.
//!
//! One run directory holds one file per stream. Split and Position files are
//! required; the rest are optional and simply leave their stream absent.
//! A missing `MergedAlphaEv.csv` falls back to the PM target file, since with a
//! single PM the merge stage is the identity. Virtual positions are read from
//! `VirtualPosEv.csv`, or from `VposResEv.csv` when only that name is present.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, warn};

use super::error::DataError;
use crate::domain::{EventTime, MarketEvent, PositionEvent, SignalEvent, SignalKind, StreamKind};
use crate::store::EventStore;

pub const PM_TARGET_FILE: &str = "InCheckAlphaEv.csv";
pub const MERGED_FILE: &str = "MergedAlphaEv.csv";
pub const SPLIT_FILE: &str = "SplitAlphaEv.csv";
pub const POSITION_FILE: &str = "SplitCtxEv.csv";
pub const VIRTUAL_POSITION_FILE: &str = "VirtualPosEv.csv";
pub const VIRTUAL_POSITION_ALT_FILE: &str = "VposResEv.csv";
pub const MARKET_FILE: &str = "MarketDataEv.csv";

const SIGNAL_COLUMNS: [&str; 4] = ["alphaid", "time", "ticker", "volume"];
const POSITION_COLUMNS: [&str; 6] = [
    "alphaid",
    "time",
    "ticker",
    "realtime_pos",
    "realtime_long_pos",
    "realtime_short_pos",
];
const AVAIL_SHORT_COLUMN: &str = "realtime_avail_shot_vol";
const AVAIL_SHORT_ALIAS: &str = "realtime_avail_short_vol";
const MARKET_COLUMNS: [&str; 4] = ["time", "ticker", "last_price", "prev_close_price"];

/// File name for a stream inside a run directory.
pub fn file_name(kind: StreamKind) -> &'static str {
    match kind {
        StreamKind::PmTarget => PM_TARGET_FILE,
        StreamKind::Merged => MERGED_FILE,
        StreamKind::Split => SPLIT_FILE,
        StreamKind::Position => POSITION_FILE,
        StreamKind::VirtualPosition => VIRTUAL_POSITION_FILE,
        StreamKind::Market => MARKET_FILE,
    }
}

/// Load every stream found in `dir` into an [`EventStore`].
pub fn load_dir(dir: &Path) -> Result<EventStore, DataError> {
    let path_of = |kind: StreamKind| dir.join(file_name(kind));

    let split = require(path_of(StreamKind::Split), StreamKind::Split)?;
    let positions = require(path_of(StreamKind::Position), StreamKind::Position)?;

    let mut builder = EventStore::builder()
        .split(read_signals(&split, SignalKind::Split)?)
        .positions(read_positions(&positions, StreamKind::Position)?);

    let pm_targets = match optional(path_of(StreamKind::PmTarget)) {
        Some(path) => Some(read_signals(&path, SignalKind::PmTarget)?),
        None => None,
    };

    let merged = match optional(path_of(StreamKind::Merged)) {
        Some(path) => Some(read_signals(&path, SignalKind::Merged)?),
        None => pm_targets.as_ref().map(|events| {
            warn!(
                file = MERGED_FILE,
                "merged stream missing, using PM targets as merged output"
            );
            events
                .iter()
                .cloned()
                .map(|e| SignalEvent {
                    stream_kind: SignalKind::Merged,
                    ..e
                })
                .collect()
        }),
    };

    if let Some(events) = pm_targets {
        builder = builder.pm_targets(events);
    }
    if let Some(events) = merged {
        builder = builder.merged(events);
    }
    let virtual_positions = optional(path_of(StreamKind::VirtualPosition))
        .or_else(|| optional(dir.join(VIRTUAL_POSITION_ALT_FILE)));
    if let Some(path) = virtual_positions {
        builder = builder.virtual_positions(read_positions(&path, StreamKind::VirtualPosition)?);
    }
    if let Some(path) = optional(path_of(StreamKind::Market)) {
        builder = builder.market(read_market(&path)?);
    }

    let store = builder.build()?;
    info!(
        dir = %dir.display(),
        records = store.total_records(),
        "event streams loaded"
    );
    Ok(store)
}

fn require(path: PathBuf, kind: StreamKind) -> Result<PathBuf, DataError> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(DataError::MissingStream(kind))
    }
}

fn optional(path: PathBuf) -> Option<PathBuf> {
    if path.is_file() {
        Some(path)
    } else {
        debug!(path = %path.display(), "optional stream file not present");
        None
    }
}

// ─── Column access ───────────────────────────────────────────────────

/// Header positions for one file, with the file path kept for error reporting.
struct Columns<'p> {
    path: &'p Path,
    stream: StreamKind,
    positions: HashMap<String, usize>,
}

impl<'p> Columns<'p> {
    fn new(path: &'p Path, stream: StreamKind, headers: &StringRecord) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_ascii_lowercase(), i))
            .collect();
        Self {
            path,
            stream,
            positions,
        }
    }

    fn require(&self, column: &str) -> Result<usize, DataError> {
        self.positions
            .get(column)
            .copied()
            .ok_or_else(|| DataError::MissingColumn {
                stream: self.stream,
                column: column.to_string(),
            })
    }

    fn require_any(&self, primary: &str, alias: &str) -> Result<usize, DataError> {
        self.positions
            .get(primary)
            .or_else(|| self.positions.get(alias))
            .copied()
            .ok_or_else(|| DataError::MissingColumn {
                stream: self.stream,
                column: primary.to_string(),
            })
    }

    fn text<'r>(&self, record: &'r StringRecord, idx: usize) -> &'r str {
        record.get(idx).unwrap_or("")
    }

    fn number(&self, record: &StringRecord, idx: usize, column: &str) -> Result<f64, DataError> {
        let raw = self.text(record, idx);
        raw.parse::<f64>().map_err(|_| DataError::Parse {
            path: self.path.to_path_buf(),
            line: record.position().map_or(0, |p| p.line()),
            column: column.to_string(),
            value: raw.to_string(),
        })
    }
}

fn open(path: &Path) -> Result<csv::Reader<File>, DataError> {
    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ReaderBuilder::new()
        .delimiter(b'|')
        .trim(Trim::All)
        .flexible(true)
        .from_reader(file))
}

fn headers(reader: &mut csv::Reader<File>, path: &Path) -> Result<StringRecord, DataError> {
    reader.headers().cloned().map_err(|source| DataError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

fn records<'r>(
    reader: &'r mut csv::Reader<File>,
    path: &Path,
) -> impl Iterator<Item = Result<StringRecord, DataError>> + 'r {
    let path = path.to_path_buf();
    reader.records().map(move |r| {
        r.map_err(|source| DataError::Csv {
            path: path.clone(),
            source,
        })
    })
}

// ─── Stream readers ──────────────────────────────────────────────────

pub fn read_signals(path: &Path, kind: SignalKind) -> Result<Vec<SignalEvent>, DataError> {
    let mut reader = open(path)?;
    let cols = Columns::new(path, kind.into(), &headers(&mut reader, path)?);
    let [entity, time, ticker, volume] = SIGNAL_COLUMNS.map(|c| cols.require(c));
    let (entity, time, ticker, volume) = (entity?, time?, ticker?, volume?);

    let mut events = Vec::new();
    for record in records(&mut reader, path) {
        let record = record?;
        events.push(SignalEvent {
            stream_kind: kind,
            entity_id: cols.text(&record, entity).into(),
            time: EventTime::parse_token(cols.text(&record, time)),
            ticker: cols.text(&record, ticker).into(),
            target_position: cols.number(&record, volume, "volume")?,
        });
    }
    debug!(stream = %StreamKind::from(kind), records = events.len(), "signal file read");
    Ok(events)
}

pub fn read_positions(path: &Path, stream: StreamKind) -> Result<Vec<PositionEvent>, DataError> {
    let mut reader = open(path)?;
    let cols = Columns::new(path, stream, &headers(&mut reader, path)?);
    let [entity, time, ticker, pos, long, short] = POSITION_COLUMNS.map(|c| cols.require(c));
    let (entity, time, ticker, pos, long, short) = (entity?, time?, ticker?, pos?, long?, short?);
    let avail = cols.require_any(AVAIL_SHORT_COLUMN, AVAIL_SHORT_ALIAS)?;

    let mut events = Vec::new();
    for record in records(&mut reader, path) {
        let record = record?;
        events.push(PositionEvent {
            entity_id: cols.text(&record, entity).into(),
            time: EventTime::parse_token(cols.text(&record, time)),
            ticker: cols.text(&record, ticker).into(),
            realtime_pos: cols.number(&record, pos, "realtime_pos")?,
            realtime_long_pos: cols.number(&record, long, "realtime_long_pos")?,
            realtime_short_pos: cols.number(&record, short, "realtime_short_pos")?,
            realtime_avail_short_vol: cols.number(&record, avail, AVAIL_SHORT_COLUMN)?,
        });
    }
    debug!(%stream, records = events.len(), "position file read");
    Ok(events)
}

pub fn read_market(path: &Path) -> Result<Vec<MarketEvent>, DataError> {
    let mut reader = open(path)?;
    let cols = Columns::new(path, StreamKind::Market, &headers(&mut reader, path)?);
    let [time, ticker, last, prev_close] = MARKET_COLUMNS.map(|c| cols.require(c));
    let (time, ticker, last, prev_close) = (time?, ticker?, last?, prev_close?);

    let mut events = Vec::new();
    for record in records(&mut reader, path) {
        let record = record?;
        events.push(MarketEvent {
            time: EventTime::parse_token(cols.text(&record, time)),
            ticker: cols.text(&record, ticker).into(),
            last_price: cols.number(&record, last, "last_price")?,
            prev_close_price: cols.number(&record, prev_close, "prev_close_price")?,
        });
    }
    Ok(events)
}

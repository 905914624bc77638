//! Receive loop: one source, one layout, one sink.
//!
//! The layout is fixed for the whole session. Malformed datagrams are
//! counted and logged, never fatal; only source and sink failures stop the
//! loop.

mod sink;

pub use sink::{JsonLinesSink, RecordSink, SinkError};

use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, info, warn};

use crate::packet::{Layout, decode_packet};
use crate::source::{CaptureSource, Datagram, DatagramSource, SourceError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub layout: Layout,
    /// Drop packets whose `is_race_on` flag is zero.
    pub race_only: bool,
    /// Stop after this many datagrams have been received.
    pub max_packets: Option<u64>,
}

impl SessionOptions {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            race_only: false,
            max_packets: None,
        }
    }
}

/// Counters and time bounds for one finished session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub layout: Layout,
    pub datagrams_total: u64,
    pub decoded: u64,
    pub emitted: u64,
    pub malformed: u64,
    /// Decoded packets dropped because the race was not on.
    pub idle: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// Decode every datagram from `source` and hand the packets to `sink`.
///
/// # Errors
/// Fails only when the source or the sink fails; malformed datagrams are
/// counted in the summary.
pub fn run_session<S, K>(
    mut source: S,
    options: SessionOptions,
    mut sink: K,
) -> Result<SessionSummary, SessionError>
where
    S: DatagramSource,
    K: RecordSink,
{
    let mut counters = Counters::default();
    let mut first_ts = None;
    let mut last_ts = None;

    while options
        .max_packets
        .is_none_or(|max| counters.datagrams_total < max)
    {
        let Some(Datagram { ts, src, payload }) = source.next_datagram()? else {
            break;
        };
        counters.datagrams_total += 1;
        update_ts_bounds(&mut first_ts, &mut last_ts, ts);

        let packet = match decode_packet(&payload, options.layout) {
            Ok(packet) => packet,
            Err(err) => {
                counters.malformed += 1;
                warn!(src = ?src, len = payload.len(), error = %err, "dropping datagram");
                continue;
            }
        };
        counters.decoded += 1;

        if options.race_only && !packet.is_race_on() {
            counters.idle += 1;
            debug!(timestamp_ms = packet.timestamp_ms(), "race not on, skipping");
            continue;
        }
        sink.write_packet(&packet)?;
        counters.emitted += 1;
    }
    sink.flush()?;

    let summary = SessionSummary {
        layout: options.layout,
        datagrams_total: counters.datagrams_total,
        decoded: counters.decoded,
        emitted: counters.emitted,
        malformed: counters.malformed,
        idle: counters.idle,
        time_start: ts_to_rfc3339(first_ts),
        time_end: ts_to_rfc3339(last_ts),
    };
    info!(
        datagrams = summary.datagrams_total,
        emitted = summary.emitted,
        malformed = summary.malformed,
        idle = summary.idle,
        "session finished"
    );
    Ok(summary)
}

/// Replay UDP datagrams from a capture file through a session.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
///
/// use forzadata_core::{JsonLinesSink, Layout, SessionOptions, decode_capture_file};
///
/// let sink = JsonLinesSink::new(std::io::stdout().lock());
/// let summary = decode_capture_file(
///     Path::new("session.pcapng"),
///     Some(5300),
///     SessionOptions::new(Layout::Dash),
///     sink,
/// )?;
/// eprintln!("{} packets", summary.emitted);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn decode_capture_file<K: RecordSink>(
    path: &Path,
    port: Option<u16>,
    options: SessionOptions,
    sink: K,
) -> Result<SessionSummary, SessionError> {
    let source = CaptureSource::open(path, port)?;
    run_session(source, options, sink)
}

#[derive(Default)]
struct Counters {
    datagrams_total: u64,
    decoded: u64,
    emitted: u64,
    malformed: u64,
    idle: u64,
}

fn update_ts_bounds(first: &mut Option<f64>, last: &mut Option<f64>, ts: Option<f64>) {
    let Some(ts) = ts else {
        return;
    };
    if first.is_none_or(|existing| ts < existing) {
        *first = Some(ts);
    }
    if last.is_none_or(|existing| ts > existing) {
        *last = Some(ts);
    }
}

fn ts_to_rfc3339(ts: Option<f64>) -> Option<String> {
    let ts = ts?;
    let nanos = (ts * 1_000_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}

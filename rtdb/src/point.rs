//! Telemetry point values.
//!
//! A [`Point`] is a snapshot of one measured quantity: value, quality code,
//! source timestamp, and optionally the time it was received. Points are plain
//! values. The store replaces them whole and hands out clones, so a reader
//! never observes a partially written point.
//!
//! # JSON Form
//!
//! Field names follow the established wire contract:
//!
//! ```json
//! {
//!   "Timestamp": "2024-03-01T12:00:00.125+0000",
//!   "TimestampRecv": "2024-03-01T12:00:00.300+0000",
//!   "Value": 42.5,
//!   "Quality": 0,
//!   "HasFreshData": true
//! }
//! ```
//!
//! `TimestampRecv` is omitted when unknown. `Quality` and `HasFreshData`
//! default to `0` and `false` when missing.

use serde::{Deserialize, Serialize};

use crate::timestamp::IsoTimestamp;

/// A measurement snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Point {
    /// When the measurement was taken at its source.
    pub timestamp: IsoTimestamp,

    /// When the measurement was ingested, if known.
    ///
    /// Kept separate from `timestamp` so late or reordered data can be told
    /// apart from live data.
    #[serde(
        rename = "TimestampRecv",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp_received: Option<IsoTimestamp>,

    /// The measured value.
    pub value: f64,

    /// Opaque status/quality code owned by the producer.
    #[serde(default)]
    pub quality: u32,

    /// Set on write, cleared by the first fresh read.
    #[serde(default)]
    pub has_fresh_data: bool,
}

impl Point {
    /// Creates a fresh point with no receipt time.
    pub fn new(value: f64, quality: u32, timestamp: IsoTimestamp) -> Self {
        Self {
            timestamp,
            timestamp_received: None,
            value,
            quality,
            has_fresh_data: true,
        }
    }

    /// Returns this point with the given receipt time.
    #[must_use]
    pub fn with_received(mut self, received: IsoTimestamp) -> Self {
        self.timestamp_received = Some(received);
        self
    }

    /// Returns `true` if the point has not been consumed by a fresh read.
    pub fn is_fresh(&self) -> bool {
        self.has_fresh_data
    }
}

//! # rtdb
//!
//! In-memory real-time point store with deadband change detection.
//!
//! rtdb holds the latest known value for every telemetry point in a
//! data-acquisition pipeline and decides, on each update, whether the new
//! value is worth propagating downstream. Redundant or insignificant updates
//! are suppressed before they reach storage, displays or alarms.
//!
//! **Status**: This crate is in early development. The API is not yet stable.
//!
//! ## Key Properties
//!
//! - One current [`Point`] per `u64` key, replaced whole on write
//! - Three change policies: value+quality, value+quality+timestamp, and
//!   numeric deadband (aperture)
//! - Linearizable decide-and-write per key under concurrent updates
//! - One-shot freshness flag for consumers that poll for new data
//! - No persistence, no background threads, no eviction
//!
//! ## Quick Start
//!
//! ```rust
//! use rtdb::{FilterConfig, IsoTimestamp, Point, PointStore, Priority};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PointStore::new();
//! let filter = FilterConfig::new(Priority::Deadband, Some(0.5))?;
//!
//! let ts = IsoTimestamp::parse("2024-03-01T12:00:00.000+0000")?;
//!
//! // First value for a key is always a change
//! assert!(store.is_point_changed_with(7, Point::new(100.0, 0, ts), &filter));
//!
//! // Inside the deadband: suppressed, store untouched
//! assert!(!store.is_point_changed_with(7, Point::new(100.4, 0, ts), &filter));
//!
//! // Outside the deadband: stored and reported
//! assert!(store.is_point_changed_with(7, Point::new(100.6, 0, ts), &filter));
//!
//! // Consumers pick the value up exactly once
//! if let Some(point) = store.get_fresh(7).into_fresh() {
//!     println!("{} = {} (q={})", point.timestamp, point.value, point.quality);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`PointStore`] — The guarded key → point map and the change decision
//! - [`Point`] — Value, quality, timestamps, freshness flag
//! - [`Priority`] — Closed set of change rules
//! - [`IsoTimestamp`] — Wire-format timestamps with a lenient parser
//!
//! ## Modules
//!
//! - [`store`] — Storage, locking, change detection, fresh reads
//! - [`policy`] — Change rules
//! - [`point`] — Point type and its JSON form
//! - [`timestamp`] — Timestamp parsing and rendering
//! - [`config`] — Store and filter configuration
//! - [`error`] — Error types

pub mod config;
pub mod error;
pub mod point;
pub mod policy;
pub mod store;
pub mod timestamp;

// Re-export primary API types at crate root for convenience.
pub use config::{FilterConfig, StoreConfig};
pub use error::{ConfigError, Result, RtdbError, TimestampError};
pub use point::Point;
pub use policy::Priority;
pub use store::{FreshRead, PointStore};
pub use timestamp::IsoTimestamp;

//! Wire timestamps for telemetry points.
//!
//! Points carry timestamps exchanged as text in the form
//! `YYYY-MM-DDTHH:MM:SS.sss±HHMM`. The fractional part is optional when
//! parsing. When rendering, it is truncated to milliseconds, trailing zeros
//! are trimmed, and it is left out entirely when zero:
//!
//! ```text
//! 2024-03-01T12:00:00+0000
//! 2024-03-01T12:00:00.5+0000
//! 2024-03-01T12:00:00.125-0700
//! ```
//!
//! # Fallback to "now"
//!
//! Ingestion is best-effort: a value that does not parse is replaced by the
//! current local time instead of failing the whole point. Every substitution
//! is logged at `warn` level and counted, see [`parse_fallbacks`]. Callers that
//! need to reject bad input use the strict [`IsoTimestamp::parse`].

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, FixedOffset, Local, TimeZone, Timelike};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, RtdbError, TimestampError};

/// chrono pattern for parsing; `%.f` accepts a missing fraction.
///
/// chrono tolerates unpadded fields, a signed year and a `+HH:MM` offset, so
/// input must pass [`has_wire_layout`] first.
const WIRE_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Length of `YYYY-MM-DDTHH:MM:SS`.
const DATE_TIME_LEN: usize = 19;

/// Length of `±HHMM`.
const OFFSET_LEN: usize = 5;

/// Number of timestamps replaced by the current time since process start.
static PARSE_FALLBACKS: AtomicU64 = AtomicU64::new(0);

/// Returns how many timestamps have been substituted with the current time
/// because they failed to parse.
///
/// The counter is process-wide and only ever increases.
pub fn parse_fallbacks() -> u64 {
    PARSE_FALLBACKS.load(Ordering::Relaxed)
}

/// A point in time with an explicit UTC offset.
///
/// Equality, ordering and hashing use the instant only, so the same moment
/// rendered in two offsets compares equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IsoTimestamp(DateTime<FixedOffset>);

impl IsoTimestamp {
    /// Returns the current local time.
    pub fn now() -> Self {
        let now = Local::now();
        Self(now.with_timezone(now.offset()))
    }

    /// Builds a timestamp from milliseconds since the Unix epoch, rendered in
    /// the given offset (seconds east of UTC).
    ///
    /// Returns `None` when the offset is out of range (±24h) or the instant is
    /// not representable.
    pub fn from_unix_millis(millis: i64, offset_secs: i32) -> Option<Self> {
        FixedOffset::east_opt(offset_secs)?
            .timestamp_millis_opt(millis)
            .single()
            .map(Self)
    }

    /// Parses the wire form strictly.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::Layout`] if `input` is not laid out exactly
    /// as `YYYY-MM-DDTHH:MM:SS[.fff]±HHMM` (zero-padded fields, no
    /// surrounding whitespace, no colon in the offset), and
    /// [`TimestampError::Malformed`] if the fields do not form a valid date
    /// and time.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rtdb::IsoTimestamp;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let ts = IsoTimestamp::parse("2024-03-01T12:00:00.250+0100")?;
    /// assert_eq!(ts.to_wire(), "2024-03-01T12:00:00.25+0100");
    /// assert!(IsoTimestamp::parse("2024-03-01T12:00:00Z").is_err());
    /// # Ok(())
    /// # }
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        if !has_wire_layout(input) {
            return Err(TimestampError::Layout {
                input: input.to_string(),
            }
            .into());
        }
        DateTime::parse_from_str(input, WIRE_PARSE_FORMAT)
            .map(Self)
            .map_err(|source| {
                TimestampError::Malformed {
                    input: input.to_string(),
                    source,
                }
                .into()
            })
    }

    /// Parses the wire form, substituting the current time on failure.
    ///
    /// The substitution is logged and counted (see [`parse_fallbacks`]).
    pub fn parse_or_now(input: &str) -> Self {
        match Self::parse(input) {
            Ok(ts) => ts,
            Err(err) => Self::fallback(&err),
        }
    }

    fn fallback(reason: &dyn fmt::Display) -> Self {
        PARSE_FALLBACKS.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(%reason, "unparseable timestamp, substituting current time");
        Self::now()
    }

    /// Returns the underlying chrono value.
    pub fn as_datetime(&self) -> &DateTime<FixedOffset> {
        &self.0
    }

    /// Renders the wire form, e.g. `2024-03-01T12:00:00.125+0100`.
    pub fn to_wire(&self) -> String {
        Wire(self).to_string()
    }
}

impl From<DateTime<FixedOffset>> for IsoTimestamp {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Self(value)
    }
}

impl FromStr for IsoTimestamp {
    type Err = RtdbError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Checks the byte layout `DDDD-DD-DDTDD:DD:DD[.D{1,9}]±DDDD`.
fn has_wire_layout(input: &str) -> bool {
    let bytes = input.as_bytes();
    if bytes.len() < DATE_TIME_LEN + OFFSET_LEN {
        return false;
    }
    let (date_time, rest) = bytes.split_at(DATE_TIME_LEN);
    let (fraction, offset) = rest.split_at(rest.len() - OFFSET_LEN);

    let date_time_ok = date_time.iter().enumerate().all(|(i, &b)| match i {
        4 | 7 => b == b'-',
        10 => b == b'T',
        13 | 16 => b == b':',
        _ => b.is_ascii_digit(),
    });
    let fraction_ok = match fraction.split_first() {
        None => true,
        Some((b'.', digits)) => {
            (1..=9).contains(&digits.len()) && digits.iter().all(u8::is_ascii_digit)
        }
        Some(_) => false,
    };
    let offset_ok = matches!(
        offset.split_first(),
        Some((b'+' | b'-', digits)) if digits.iter().all(u8::is_ascii_digit)
    );

    date_time_ok && fraction_ok && offset_ok
}

/// Writes `.f`, `.ff` or `.fff` for the millisecond part, or nothing when zero.
fn write_millis(f: &mut fmt::Formatter<'_>, dt: &DateTime<FixedOffset>) -> fmt::Result {
    // nanosecond() exceeds 1e9 during a leap second
    let mut frac = (dt.nanosecond() % 1_000_000_000) / 1_000_000;
    if frac == 0 {
        return Ok(());
    }
    let mut width = 3;
    while frac % 10 == 0 {
        frac /= 10;
        width -= 1;
    }
    write!(f, ".{frac:0width$}")
}

/// Display adapter for the wire form.
struct Wire<'a>(&'a IsoTimestamp);

impl fmt::Display for Wire<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dt = &self.0.0;
        write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S"))?;
        write_millis(f, dt)?;
        write!(f, "{}", dt.format("%z"))
    }
}

/// Human-readable form for logs and displays: `YYYY-MM-DD HH:MM:SS.sss`,
/// without the offset.
impl fmt::Display for IsoTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))?;
        write_millis(f, &self.0)
    }
}

impl Serialize for IsoTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(&Wire(self))
    }
}

impl<'de> Deserialize<'de> for IsoTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(IsoTimestampVisitor)
    }
}

/// Accepts any scalar. Strings are parsed leniently, everything else falls
/// back to the current time.
struct IsoTimestampVisitor;

impl Visitor<'_> for IsoTimestampVisitor {
    type Value = IsoTimestamp;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a timestamp string like 2024-03-01T12:00:00.000+0000")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<IsoTimestamp, E> {
        Ok(IsoTimestamp::parse_or_now(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<IsoTimestamp, E> {
        Ok(IsoTimestamp::fallback(&format_args!("integer {v}")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<IsoTimestamp, E> {
        Ok(IsoTimestamp::fallback(&format_args!("integer {v}")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<IsoTimestamp, E> {
        Ok(IsoTimestamp::fallback(&format_args!("number {v}")))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<IsoTimestamp, E> {
        Ok(IsoTimestamp::fallback(&format_args!("boolean {v}")))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<IsoTimestamp, E> {
        Ok(IsoTimestamp::fallback(&"null"))
    }
}

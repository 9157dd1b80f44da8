//! Change-significance policies.
//!
//! A [`Priority`] decides whether a candidate point differs meaningfully from
//! the point currently stored for the same key. Three rules exist:
//!
//! | Code | Variant | Changed when |
//! |------|---------|--------------|
//! | 1 | [`Priority::ValueQuality`] | value or quality differs |
//! | 2 | [`Priority::ValueQualityTimestamp`] | value, quality or timestamp differs |
//! | other | [`Priority::Deadband`] | `|Δvalue| > aperture`, or any value difference without an aperture |
//!
//! "Timestamp differs" means the instants differ: the same moment rendered in
//! another UTC offset is not a change.
//!
//! Value comparisons are plain IEEE comparisons: a `NaN` value always counts
//! as different under exact inequality and never exceeds an aperture.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, RtdbError};
use crate::point::Point;

/// Selects the rule used to judge whether a new point is a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Priority {
    /// Changed if value or quality differs (code 1).
    ValueQuality,
    /// Changed if value, quality or timestamp instant differs (code 2).
    ValueQualityTimestamp,
    /// Changed if the value moves by more than the aperture (any other code,
    /// canonically 0).
    #[default]
    Deadband,
}

impl Priority {
    /// Returns the numeric code of this priority.
    pub fn code(self) -> i64 {
        match self {
            Self::ValueQuality => 1,
            Self::ValueQualityTimestamp => 2,
            Self::Deadband => 0,
        }
    }

    /// Decides whether `candidate` is a significant change from `stored`.
    ///
    /// `aperture` only applies to [`Priority::Deadband`]. Without one the
    /// deadband rule falls back to exact value inequality and ignores quality
    /// and timestamp.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rtdb::{IsoTimestamp, Point, Priority};
    ///
    /// let ts = IsoTimestamp::parse_or_now("2024-03-01T12:00:00+0000");
    /// let stored = Point::new(100.0, 0, ts);
    ///
    /// assert!(!Priority::Deadband.is_changed(&stored, &Point::new(100.4, 0, ts), Some(0.5)));
    /// assert!(Priority::Deadband.is_changed(&stored, &Point::new(100.6, 0, ts), Some(0.5)));
    /// assert!(Priority::ValueQuality.is_changed(&stored, &Point::new(100.0, 1, ts), None));
    /// ```
    pub fn is_changed(self, stored: &Point, candidate: &Point, aperture: Option<f64>) -> bool {
        match self {
            Self::ValueQuality => {
                candidate.value != stored.value || candidate.quality != stored.quality
            }
            Self::ValueQualityTimestamp => {
                candidate.value != stored.value
                    || candidate.quality != stored.quality
                    || candidate.timestamp != stored.timestamp
            }
            Self::Deadband => match aperture {
                Some(aperture) => (candidate.value - stored.value).abs() > aperture,
                None => candidate.value != stored.value,
            },
        }
    }
}

impl From<i64> for Priority {
    fn from(code: i64) -> Self {
        match code {
            1 => Self::ValueQuality,
            2 => Self::ValueQualityTimestamp,
            _ => Self::Deadband,
        }
    }
}

impl From<Priority> for i64 {
    fn from(priority: Priority) -> Self {
        priority.code()
    }
}

impl FromStr for Priority {
    type Err = RtdbError;

    /// Accepts a numeric code or one of `value-quality`,
    /// `value-quality-timestamp`, `deadband`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<i64>() {
            return Ok(Self::from(code));
        }
        match s.to_ascii_lowercase().as_str() {
            "value-quality" => Ok(Self::ValueQuality),
            "value-quality-timestamp" => Ok(Self::ValueQualityTimestamp),
            "deadband" | "aperture" => Ok(Self::Deadband),
            _ => Err(ConfigError::UnknownPriority {
                value: s.to_string(),
            }
            .into()),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ValueQuality => "value-quality",
            Self::ValueQualityTimestamp => "value-quality-timestamp",
            Self::Deadband => "deadband",
        };
        f.write_str(name)
    }
}

//! Configuration for the point store and for change filtering.
//!
//! [`StoreConfig`] selects which bookkeeping the store performs on every
//! write. [`FilterConfig`] bundles a [`Priority`] with an optional deadband
//! aperture so callers that always filter the same way can load it once,
//! e.g. from a JSON file:
//!
//! ```json
//! { "priority": 0, "aperture": 0.5 }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::policy::Priority;

/// Store-wide write behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Mark every written point as fresh so that exactly one
    /// [`get_fresh`](crate::PointStore::get_fresh) observes it.
    ///
    /// When disabled the flag is stored exactly as the caller supplied it.
    pub track_freshness: bool,

    /// Fill in `timestamp_received` with the current time when a written
    /// point does not carry one.
    pub stamp_received: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            track_freshness: true,
            stamp_received: false,
        }
    }
}

/// A change policy plus its deadband aperture.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Which change rule to apply.
    #[serde(default)]
    pub priority: Priority,

    /// Deadband threshold, used only by [`Priority::Deadband`].
    ///
    /// `None` makes the deadband rule report any value difference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aperture: Option<f64>,
}

impl FilterConfig {
    /// Creates a validated filter configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAperture`] if the aperture is negative,
    /// NaN or infinite.
    pub fn new(priority: Priority, aperture: Option<f64>) -> Result<Self> {
        let config = Self { priority, aperture };
        config.validate()?;
        Ok(config)
    }

    /// Validates the aperture.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAperture`] if the aperture is negative,
    /// NaN or infinite.
    pub fn validate(&self) -> Result<()> {
        if let Some(aperture) = self.aperture
            && !(aperture.is_finite() && aperture >= 0.0)
        {
            return Err(ConfigError::InvalidAperture { aperture }.into());
        }
        Ok(())
    }

    /// Loads and validates a filter configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Read`] if the file cannot be read
    /// - [`ConfigError::Parse`] if it is not a valid filter configuration
    /// - [`ConfigError::InvalidAperture`] if the aperture is out of range
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }
}

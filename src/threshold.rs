//! Persistent flush-detection threshold.
//!
//! The threshold is the one parameter that is tuned per installation, so
//! it lives under its own key rather than inside [`SystemConfig`]
//! (crate::config::SystemConfig).  Stored as a postcard-encoded `u16`.

use log::{info, warn};

use crate::app::ports::{ConfigError, StorageError, StoragePort};
use crate::error::Result;

pub const NAMESPACE: &str = "latrine";
pub const KEY: &str = "threshold";

/// Used when nothing valid is stored.
pub const DEFAULT_THRESHOLD: u16 = 500;

pub struct ThresholdStore;

impl ThresholdStore {
    /// Range-check a candidate threshold.  Zero would report every
    /// sample below the baseline as a flush.
    pub fn validate(value: u16) -> core::result::Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::ValidationFailed("threshold must be non-zero"));
        }
        Ok(())
    }

    /// Stored threshold, or [`DEFAULT_THRESHOLD`] if missing, unreadable
    /// or out of range.
    pub fn load(storage: &impl StoragePort) -> u16 {
        let mut buf = [0u8; 8];
        let len = match storage.read(NAMESPACE, KEY, &mut buf) {
            Ok(n) => n,
            Err(StorageError::NotFound) => {
                info!("No stored threshold, using default {}", DEFAULT_THRESHOLD);
                return DEFAULT_THRESHOLD;
            }
            Err(e) => {
                warn!("Threshold read failed ({}), using default", e);
                return DEFAULT_THRESHOLD;
            }
        };
        match postcard::from_bytes::<u16>(&buf[..len]) {
            Ok(v) if Self::validate(v).is_ok() => v,
            Ok(v) => {
                warn!("Stored threshold {} out of range, using default", v);
                DEFAULT_THRESHOLD
            }
            Err(e) => {
                warn!("Stored threshold corrupt ({}), using default", e);
                DEFAULT_THRESHOLD
            }
        }
    }

    /// Validate and persist.
    pub fn save(storage: &mut impl StoragePort, value: u16) -> Result<()> {
        Self::validate(value)?;
        let mut buf = [0u8; 8];
        let bytes = postcard::to_slice(&value, &mut buf).map_err(|_| ConfigError::Corrupted)?;
        storage.write(NAMESPACE, KEY, bytes)?;
        info!("Threshold {} saved", value);
        Ok(())
    }
}

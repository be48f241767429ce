use chrono::Duration;
use thiserror::Error;

/// Window used when none is configured.
pub const DEFAULT_DEDUP_WINDOW_SECS: i64 = 5 * 60;

const MAX_DEDUP_WINDOW_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("dedup window must be positive, got {0}s")]
    NonPositiveWindow(i64),
    #[error("dedup window must be at most {max}s, got {got}s")]
    WindowTooLong { got: i64, max: i64 },
}

/// Tunables for the tracking pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerSettings {
    dedup_window: Duration,
}

impl TrackerSettings {
    /// # Errors
    ///
    /// Returns `SettingsError` if the window is not within `1s..=24h`.
    pub fn new(dedup_window_secs: i64) -> Result<Self, SettingsError> {
        if dedup_window_secs <= 0 {
            return Err(SettingsError::NonPositiveWindow(dedup_window_secs));
        }
        if dedup_window_secs > MAX_DEDUP_WINDOW_SECS {
            return Err(SettingsError::WindowTooLong {
                got: dedup_window_secs,
                max: MAX_DEDUP_WINDOW_SECS,
            });
        }
        Ok(Self {
            dedup_window: Duration::seconds(dedup_window_secs),
        })
    }

    #[must_use]
    pub fn dedup_window(&self) -> Duration {
        self.dedup_window
    }
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            dedup_window: Duration::seconds(DEFAULT_DEDUP_WINDOW_SECS),
        }
    }
}

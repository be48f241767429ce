//! Activity deduplication.
//!
//! Page trackers resend the same event (a video crossing its watch threshold
//! twice, a double-submitted click). An event is a duplicate when the same
//! (user, unit, section, activity type) was already recorded inside a sliding
//! window ending now.

use chrono::{DateTime, Duration, Utc};

use crate::model::{ActivityRecord, TrackerSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deduplicator {
    window: Duration,
}

impl Deduplicator {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    #[must_use]
    pub fn from_settings(settings: &TrackerSettings) -> Self {
        Self::new(settings.dedup_window())
    }

    /// Records created strictly after this instant fall inside the window.
    #[must_use]
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window
    }

    /// True when `recorded_at` suppresses a submission made at `now`.
    #[must_use]
    pub fn within_window(&self, recorded_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        recorded_at > self.window_start(now)
    }

    /// Decide whether `candidate` repeats something already in `history`.
    ///
    /// `history` may hold records of other tuples; only exact tuple matches
    /// count.
    #[must_use]
    pub fn is_duplicate(
        &self,
        candidate: &ActivityRecord,
        history: &[ActivityRecord],
        now: DateTime<Utc>,
    ) -> bool {
        history
            .iter()
            .any(|existing| existing.same_tuple(candidate) && self.within_window(existing.created_at, now))
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::from_settings(&TrackerSettings::default())
    }
}

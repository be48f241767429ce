use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{SectionId, UnitId, UserId};

/// Durable record that a section once reached 100%.
///
/// At most one exists per (user, unit, section). The engine creates markers but
/// never updates or removes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMarker {
    pub user_id: UserId,
    pub unit_id: UnitId,
    pub section_id: SectionId,
    pub completed_at: DateTime<Utc>,
}

impl CompletionMarker {
    #[must_use]
    pub fn new(
        user_id: UserId,
        unit_id: UnitId,
        section_id: SectionId,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            unit_id,
            section_id,
            completed_at,
        }
    }
}

/// Lifecycle of a (user, unit, section) as seen by the learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionState {
    NotStarted,
    InProgress,
    Completed,
}

impl SectionState {
    /// A marker wins over recomputed progress: once completed, always completed.
    #[must_use]
    pub fn derive(activity_count: usize, has_marker: bool) -> Self {
        if has_marker {
            Self::Completed
        } else if activity_count > 0 {
            Self::InProgress
        } else {
            Self::NotStarted
        }
    }
}

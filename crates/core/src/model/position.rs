use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{SectionId, UnitId, UserId};

/// Where a learner last was inside a unit, used to resume.
///
/// One per (user, unit); saving again replaces the section and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastPosition {
    pub user_id: UserId,
    pub unit_id: UnitId,
    pub section_id: SectionId,
    pub updated_at: DateTime<Utc>,
}

impl LastPosition {
    #[must_use]
    pub fn new(
        user_id: UserId,
        unit_id: UnitId,
        section_id: SectionId,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            unit_id,
            section_id,
            updated_at,
        }
    }
}

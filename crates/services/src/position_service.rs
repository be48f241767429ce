use std::sync::Arc;

use storage::repository::PositionRepository;
use tracker_core::model::{LastPosition, SectionId, UnitId, UserId};

use crate::Clock;
use crate::error::PositionError;

/// Remembers where a learner stopped so they can pick up from there.
#[derive(Clone)]
pub struct PositionService {
    clock: Clock,
    positions: Arc<dyn PositionRepository>,
}

impl PositionService {
    #[must_use]
    pub fn new(clock: Clock, positions: Arc<dyn PositionRepository>) -> Self {
        Self { clock, positions }
    }

    /// Overwrite the learner's position in the unit.
    ///
    /// # Errors
    ///
    /// Returns `PositionError::Storage` if the position cannot be stored.
    pub async fn save_position(
        &self,
        user_id: UserId,
        unit_id: UnitId,
        section_id: SectionId,
    ) -> Result<LastPosition, PositionError> {
        let position = LastPosition::new(user_id, unit_id, section_id, self.clock.now());
        self.positions.save_position(&position).await?;
        tracing::debug!(
            user = %user_id,
            unit = %unit_id,
            section = %position.section_id,
            "position saved"
        );
        Ok(position)
    }

    /// # Errors
    ///
    /// Returns `PositionError::Storage` on read failures.
    pub async fn resume_unit(
        &self,
        user_id: UserId,
        unit_id: UnitId,
    ) -> Result<Option<LastPosition>, PositionError> {
        Ok(self.positions.last_position(user_id, unit_id).await?)
    }

    /// The most recently visited section across the whole course.
    ///
    /// # Errors
    ///
    /// Returns `PositionError::Storage` on read failures.
    pub async fn resume_course(&self, user_id: UserId) -> Result<Option<LastPosition>, PositionError> {
        Ok(self.positions.latest_position(user_id).await?)
    }
}

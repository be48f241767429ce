use std::sync::Arc;

use serde::Serialize;
use storage::repository::{ActivityRepository, AppendOutcome, CompletionRepository};
use tracker_core::model::{
    ActivityPayload, ActivityRecord, ActivityType, SectionId, SectionProgress, UnitId, UserId,
};
use tracker_core::{CompletionPromoter, Deduplicator, InputError};

use crate::Clock;
use crate::error::TrackingError;

/// A validated activity event, not yet stamped or stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivitySubmission {
    pub user_id: UserId,
    pub unit_id: UnitId,
    pub section_id: SectionId,
    pub activity_type: ActivityType,
    pub payload: ActivityPayload,
}

impl ActivitySubmission {
    /// Validate raw collaborator input.
    ///
    /// A payload that is not a JSON object is dropped with a warning rather
    /// than rejecting the whole event.
    ///
    /// # Errors
    ///
    /// Returns `InputError` for zero ids or an empty/oversized section id or
    /// activity type.
    pub fn parse(
        user_id: u64,
        unit_id: u64,
        section_id: &str,
        activity_type: &str,
        payload: Option<&str>,
    ) -> Result<Self, InputError> {
        let user_id = UserId::try_new(user_id)?;
        let unit_id = UnitId::try_new(unit_id)?;
        let section_id = SectionId::new(section_id)?;
        let activity_type = ActivityType::parse(activity_type)?;
        let payload = match payload.map(ActivityPayload::parse) {
            None => ActivityPayload::empty(),
            Some(Ok(payload)) => payload,
            Some(Err(err)) => {
                tracing::warn!(
                    user = %user_id,
                    unit = %unit_id,
                    section = %section_id,
                    error = %err,
                    "discarding unreadable activity payload"
                );
                ActivityPayload::empty()
            }
        };
        Ok(Self {
            user_id,
            unit_id,
            section_id,
            activity_type,
            payload,
        })
    }
}

/// Result of one tracked event.
///
/// A duplicate is a successful call with `duplicate: true`; nothing was
/// stored or recomputed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackOutcome {
    pub accepted: bool,
    pub duplicate: bool,
    pub activity_id: Option<i64>,
    pub progress: Option<SectionProgress>,
    /// True only for the call that created the completion marker.
    pub newly_completed: bool,
}

impl TrackOutcome {
    fn duplicate() -> Self {
        Self {
            accepted: false,
            duplicate: true,
            activity_id: None,
            progress: None,
            newly_completed: false,
        }
    }
}

/// Accepts learner activity, recomputes the touched section and promotes it
/// to completed when it reaches 100%.
#[derive(Clone)]
pub struct TrackingService {
    clock: Clock,
    dedup: Deduplicator,
    activities: Arc<dyn ActivityRepository>,
    completions: Arc<dyn CompletionRepository>,
}

impl TrackingService {
    #[must_use]
    pub fn new(
        clock: Clock,
        dedup: Deduplicator,
        activities: Arc<dyn ActivityRepository>,
        completions: Arc<dyn CompletionRepository>,
    ) -> Self {
        Self {
            clock,
            dedup,
            activities,
            completions,
        }
    }

    /// Append the event unless an identical one landed inside the dedup
    /// window, then rescore its section from full history.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::Storage` when the store cannot be read or
    /// written. Storage failures are retryable when the store was unreachable.
    pub async fn track_activity(
        &self,
        submission: ActivitySubmission,
    ) -> Result<TrackOutcome, TrackingError> {
        let now = self.clock.now();
        let record = ActivityRecord::new(
            submission.user_id,
            submission.unit_id,
            submission.section_id,
            submission.activity_type,
            submission.payload,
            now,
        );

        let id = match self
            .activities
            .append_activity(&record, Some(self.dedup))
            .await?
        {
            AppendOutcome::Duplicate => {
                tracing::debug!(
                    user = %record.user_id,
                    unit = %record.unit_id,
                    section = %record.section_id,
                    activity = %record.activity_type,
                    "duplicate activity ignored"
                );
                return Ok(TrackOutcome::duplicate());
            }
            AppendOutcome::Accepted { id } => id,
        };

        let history = self
            .activities
            .activities(record.user_id, record.unit_id, Some(&record.section_id))
            .await?;
        let progress = SectionProgress::compute(&record.section_id, &history);

        let newly_completed =
            match CompletionPromoter::marker_for(record.user_id, record.unit_id, &progress, now) {
                Some(marker) => self.completions.record_completion(&marker).await?,
                None => false,
            };

        tracing::info!(
            user = %record.user_id,
            unit = %record.unit_id,
            section = %record.section_id,
            activity = %record.activity_type,
            percentage = progress.percentage,
            newly_completed,
            "activity tracked"
        );

        Ok(TrackOutcome {
            accepted: true,
            duplicate: false,
            activity_id: Some(id),
            progress: Some(progress),
            newly_completed,
        })
    }

    /// Record the learner's explicit "I did this" confirmation for a section.
    ///
    /// # Errors
    ///
    /// Same as [`TrackingService::track_activity`].
    pub async fn confirm_manual_check(
        &self,
        user_id: UserId,
        unit_id: UnitId,
        section_id: SectionId,
    ) -> Result<TrackOutcome, TrackingError> {
        self.track_activity(ActivitySubmission {
            user_id,
            unit_id,
            section_id,
            activity_type: ActivityType::ManualCheck,
            payload: ActivityPayload::manual_check(),
        })
        .await
    }
}

//! Completion promotion.
//!
//! Completion is one-way: once a section reaches 100% a marker is written and
//! later recomputations never take it away. Re-opening a section is an
//! administrative action outside this crate.

use chrono::{DateTime, Utc};

use crate::model::{CompletionMarker, SectionProgress, UnitId, UserId};

#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionPromoter;

impl CompletionPromoter {
    /// Marker to hand to the store when the section is complete.
    ///
    /// The store's insert is the idempotency guard; callers that have not
    /// looked up existing markers can write whatever this returns.
    #[must_use]
    pub fn marker_for(
        user_id: UserId,
        unit_id: UnitId,
        progress: &SectionProgress,
        at: DateTime<Utc>,
    ) -> Option<CompletionMarker> {
        progress.is_complete().then(|| {
            CompletionMarker::new(user_id, unit_id, progress.section_id.clone(), at)
        })
    }
}

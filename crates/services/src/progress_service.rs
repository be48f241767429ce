use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use storage::repository::{ActivityRepository, CompletionRepository};
use tracker_core::model::{
    ActivityRecord, SectionId, SectionProgress, SectionState, UnitId, UnitSummary, UserId,
};
use tracker_core::rollup::group_by_section;
use tracker_core::{is_known_section, roll_up};

use crate::error::ProgressError;

/// One section row of the admin drill-down for a learner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionDetail {
    pub progress: SectionProgress,
    pub state: SectionState,
    pub completed: bool,
    /// The learner's activity in this section, newest first.
    pub activities: Vec<ActivityRecord>,
}

/// Admin view of one learner in one unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitDetails {
    pub user_id: UserId,
    pub summary: UnitSummary,
    pub sections: Vec<SectionDetail>,
}

/// One learner's line in the cohort overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortRow {
    pub user_id: UserId,
    pub units: Vec<UnitSummary>,
}

/// Read side of the engine: every figure is recomputed from the activity log.
#[derive(Clone)]
pub struct ProgressService {
    activities: Arc<dyn ActivityRepository>,
    completions: Arc<dyn CompletionRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        activities: Arc<dyn ActivityRepository>,
        completions: Arc<dyn CompletionRepository>,
    ) -> Self {
        Self {
            activities,
            completions,
        }
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on read failures.
    pub async fn section_progress(
        &self,
        user_id: UserId,
        unit_id: UnitId,
        section_id: &SectionId,
    ) -> Result<SectionProgress, ProgressError> {
        let history = self
            .activities
            .activities(user_id, unit_id, Some(section_id))
            .await?;
        Ok(SectionProgress::compute(section_id, &history))
    }

    /// Progress of every section the learner has touched in the unit,
    /// ordered by section id.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on read failures.
    pub async fn unit_sections(
        &self,
        user_id: UserId,
        unit_id: UnitId,
    ) -> Result<Vec<SectionProgress>, ProgressError> {
        let history = self.activities.activities(user_id, unit_id, None).await?;
        Ok(group_by_section(&history)
            .iter()
            .map(|(id, records)| SectionProgress::compute(id, records))
            .collect())
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on read failures.
    pub async fn unit_summary(
        &self,
        user_id: UserId,
        unit_id: UnitId,
    ) -> Result<UnitSummary, ProgressError> {
        let sections = self.unit_sections(user_id, unit_id).await?;
        let summary = roll_up(unit_id, &sections);
        tracing::debug!(
            user = %user_id,
            unit = %unit_id,
            overall = summary.overall_percentage,
            "unit summary computed"
        );
        Ok(summary)
    }

    /// Summaries for every unit the learner has activity in, by unit id.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on read failures.
    pub async fn course_overview(&self, user_id: UserId) -> Result<Vec<UnitSummary>, ProgressError> {
        let units = self.activities.units_for_user(user_id).await?;
        let mut summaries = Vec::with_capacity(units.len());
        for unit_id in units {
            summaries.push(self.unit_summary(user_id, unit_id).await?);
        }
        Ok(summaries)
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on read failures.
    pub async fn completed_sections(
        &self,
        user_id: UserId,
        unit_id: UnitId,
    ) -> Result<BTreeSet<SectionId>, ProgressError> {
        Ok(self.completions.completed_sections(user_id, unit_id).await?)
    }

    /// Every recognised section of the unit, whether or not this learner has
    /// reached it yet.
    ///
    /// Section ids come from all learners' activity, so an admin sees the
    /// sections a learner skipped. Ids that match no known content prefix are
    /// left out as stale.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on read failures.
    pub async fn unit_details(
        &self,
        user_id: UserId,
        unit_id: UnitId,
    ) -> Result<UnitDetails, ProgressError> {
        let known = self.activities.sections_for_unit(unit_id).await?;
        let history = self.activities.activities(user_id, unit_id, None).await?;
        let completed = self.completions.completed_sections(user_id, unit_id).await?;
        let mut grouped = group_by_section(&history);

        // The filter below only hides rows; the unit figure must match `unit_summary`.
        let scored: Vec<SectionProgress> = grouped
            .iter()
            .map(|(id, records)| SectionProgress::compute(id, records))
            .collect();
        let summary = roll_up(unit_id, &scored);

        let sections: Vec<SectionDetail> = known
            .into_iter()
            .filter(|id| is_known_section(id.as_str()))
            .map(|id| {
                let mut activities = grouped.remove(&id).unwrap_or_default();
                let progress = SectionProgress::compute(&id, &activities);
                let is_completed = completed.contains(&id);
                activities.reverse();
                SectionDetail {
                    state: SectionState::derive(progress.activity_count, is_completed),
                    completed: is_completed,
                    progress,
                    activities,
                }
            })
            .collect();

        Ok(UnitDetails {
            user_id,
            summary,
            sections,
        })
    }

    /// Every learner against every unit seen in the log.
    ///
    /// Each row holds one summary per cohort unit in unit order, including
    /// units the learner never opened (scored 0).
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` on read failures.
    pub async fn cohort_overview(&self) -> Result<Vec<CohortRow>, ProgressError> {
        let learners = self.activities.learners().await?;
        let units = self.activities.all_units().await?;
        let mut rows = Vec::with_capacity(learners.len());
        for user_id in learners {
            let mut summaries = Vec::with_capacity(units.len());
            for unit_id in &units {
                summaries.push(self.unit_summary(user_id, *unit_id).await?);
            }
            rows.push(CohortRow {
                user_id,
                units: summaries,
            });
        }
        tracing::debug!(
            learners = rows.len(),
            units = units.len(),
            "cohort overview computed"
        );
        Ok(rows)
    }
}

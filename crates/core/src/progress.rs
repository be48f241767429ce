//! Section progress calculator.
//!
//! Pure scoring over a section's activity history. Nothing here is cached: the
//! same records always yield the same percentage.

use crate::classify::classify_section;
use crate::model::{ActivityRecord, ActivityType, SectionCategory, SectionId, SectionProgress};

/// Video watches needed to finish a tools demo section.
const TOOLS_DEMO_REQUIRED_WATCHES: f64 = 4.0;
/// Points per video in a generic tools section.
const TOOLS_POINTS_PER_WATCH: f64 = 25.0;
/// Points per activity of any kind in an unclassified section.
const OTHER_POINTS_PER_ACTIVITY: f64 = 20.0;

fn count_of(activities: &[ActivityRecord], kind: &ActivityType) -> usize {
    activities
        .iter()
        .filter(|a| &a.activity_type == kind)
        .count()
}

#[allow(clippy::cast_precision_loss)]
fn as_points(count: usize) -> f64 {
    count as f64
}

fn capped(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

fn binary(present: bool) -> f64 {
    if present { 100.0 } else { 0.0 }
}

/// Score a list of activities under a category's rule.
#[must_use]
pub fn score(category: SectionCategory, activities: &[ActivityRecord]) -> f64 {
    if activities.is_empty() {
        return 0.0;
    }

    match category {
        SectionCategory::Overview => {
            capped(as_points(count_of(activities, &ActivityType::VideoWatch)) * 100.0)
        }
        SectionCategory::ToolsDemo => {
            let watches = as_points(count_of(activities, &ActivityType::VideoWatch));
            capped(watches / TOOLS_DEMO_REQUIRED_WATCHES * 100.0)
        }
        SectionCategory::ToolsGeneric => capped(
            as_points(count_of(activities, &ActivityType::VideoWatch)) * TOOLS_POINTS_PER_WATCH,
        ),
        SectionCategory::Discussion => binary(count_of(activities, &ActivityType::Comment) > 0),
        SectionCategory::Task => binary(count_of(activities, &ActivityType::ManualCheck) > 0),
        SectionCategory::Other => capped(as_points(activities.len()) * OTHER_POINTS_PER_ACTIVITY),
    }
}

/// Percentage in `0.0..=100.0` for a section given all of its activities.
///
/// The caller is responsible for passing only the records of one
/// (user, unit, section).
///
/// ```
/// use tracker_core::compute_section_progress;
///
/// assert_eq!(compute_section_progress("overview", &[]), 0.0);
/// ```
#[must_use]
pub fn compute_section_progress(section_id: &str, activities: &[ActivityRecord]) -> f64 {
    score(classify_section(section_id), activities)
}

impl SectionProgress {
    /// Classify and score a section in one pass.
    #[must_use]
    pub fn compute(section_id: &SectionId, activities: &[ActivityRecord]) -> Self {
        let category = classify_section(section_id.as_str());
        Self {
            section_id: section_id.clone(),
            category,
            percentage: score(category, activities),
            activity_count: activities.len(),
        }
    }
}

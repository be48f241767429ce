//! Unit roll-up.
//!
//! Each unit is weighted as four equal buckets (overview, tools, discussion,
//! task). Within a bucket only the best section counts, so a unit with several
//! tools sub-sections is not penalised for the ones the learner skipped.
//! Sections classified `Other` are reported but carry no unit weight.
//!
//! The weighted sum is rounded exactly once, half away from zero.

use std::collections::BTreeMap;

use crate::model::{
    ActivityRecord, SectionId, SectionProgress, UnitCategory, UnitId, UnitSummary,
    display_percentage,
};

/// Best percentage per bucket; buckets without sections read as 0.
#[must_use]
pub fn breakdown(sections: &[SectionProgress]) -> BTreeMap<UnitCategory, f64> {
    let mut best: BTreeMap<UnitCategory, f64> =
        UnitCategory::ALL.iter().map(|c| (*c, 0.0)).collect();

    for section in sections {
        let Some(bucket) = section.category.unit_category() else {
            continue;
        };
        let slot = best.entry(bucket).or_insert(0.0);
        if section.percentage > *slot {
            *slot = section.percentage;
        }
    }

    best
}

/// Weighted, unrounded unit total.
#[must_use]
pub fn weighted_total(breakdown: &BTreeMap<UnitCategory, f64>) -> f64 {
    UnitCategory::ALL
        .iter()
        .map(|c| breakdown.get(c).copied().unwrap_or(0.0).clamp(0.0, 100.0) / 100.0 * c.weight())
        .sum()
}

/// Combine already-computed section progress into a unit summary.
#[must_use]
pub fn roll_up(unit_id: UnitId, sections: &[SectionProgress]) -> UnitSummary {
    let breakdown = breakdown(sections);
    let overall_percentage = display_percentage(weighted_total(&breakdown));
    UnitSummary {
        unit_id,
        overall_percentage,
        breakdown,
    }
}

/// Split a unit's flat activity list by section, preserving record order.
#[must_use]
pub fn group_by_section(activities: &[ActivityRecord]) -> BTreeMap<SectionId, Vec<ActivityRecord>> {
    let mut grouped: BTreeMap<SectionId, Vec<ActivityRecord>> = BTreeMap::new();
    for activity in activities {
        grouped
            .entry(activity.section_id.clone())
            .or_default()
            .push(activity.clone());
    }
    grouped
}

/// Score every section of a unit from its activities and roll them up.
#[must_use]
pub fn compute_unit_summary<'a, I>(unit_id: UnitId, sections: I) -> UnitSummary
where
    I: IntoIterator<Item = (&'a SectionId, &'a [ActivityRecord])>,
{
    let progress: Vec<SectionProgress> = sections
        .into_iter()
        .map(|(id, acts)| SectionProgress::compute(id, acts))
        .collect();
    roll_up(unit_id, &progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_section;
    use crate::model::{ActivityPayload, ActivityType, UserId};
    use crate::time::fixed_now;

    fn section(id: &str, percentage: f64) -> SectionProgress {
        SectionProgress {
            section_id: SectionId::new(id).unwrap(),
            category: classify_section(id),
            percentage,
            activity_count: 1,
        }
    }

    #[test]
    fn empty_unit_is_zero_with_full_breakdown() {
        let summary = roll_up(UnitId::new(1), &[]);
        assert_eq!(summary.overall_percentage, 0);
        assert_eq!(summary.breakdown.len(), 4);
        assert!(summary.breakdown.values().all(|v| *v == 0.0));
    }

    #[test]
    fn best_tools_section_wins() {
        let summary = roll_up(
            UnitId::new(1),
            &[section("tools_a", 60.0), section("tools_b", 90.0)],
        );
        assert_eq!(summary.category_percentage(UnitCategory::Tools), 90.0);
        assert_eq!(summary.overall_percentage, 23);
    }

    #[test]
    fn demo_and_generic_tools_are_merged() {
        let summary = roll_up(
            UnitId::new(1),
            &[section("tools_demo", 75.0), section("tools_oral", 100.0)],
        );
        assert_eq!(summary.category_percentage(UnitCategory::Tools), 100.0);
        assert_eq!(summary.overall_percentage, 25);
    }

    #[test]
    fn half_points_round_up() {
        let summary = roll_up(
            UnitId::new(1),
            &[
                section("overview", 100.0),
                section("tools", 50.0),
                section("discussion", 0.0),
                section("task", 100.0),
            ],
        );
        assert_eq!(weighted_total(&summary.breakdown), 62.5);
        assert_eq!(summary.overall_percentage, 63);
    }

    #[test]
    fn task_and_assignment_count_once() {
        let summary = roll_up(
            UnitId::new(1),
            &[section("task", 100.0), section("assignment", 100.0)],
        );
        assert_eq!(summary.overall_percentage, 25);
    }

    #[test]
    fn other_sections_do_not_contribute() {
        let summary = roll_up(UnitId::new(1), &[section("faq", 100.0)]);
        assert_eq!(summary.overall_percentage, 0);
    }

    #[test]
    fn complete_unit_is_one_hundred() {
        let summary = roll_up(
            UnitId::new(1),
            &[
                section("intro", 100.0),
                section("tools_demo", 100.0),
                section("discussion", 100.0),
                section("assignment", 100.0),
            ],
        );
        assert_eq!(summary.overall_percentage, 100);
    }

    #[test]
    fn summary_from_raw_activities() {
        let make = |sec: &str, kind: ActivityType| {
            ActivityRecord::new(
                UserId::new(1),
                UnitId::new(3),
                SectionId::new(sec).unwrap(),
                kind,
                ActivityPayload::empty(),
                fixed_now(),
            )
        };
        let acts = vec![
            make("overview", ActivityType::VideoWatch),
            make("tools_demo", ActivityType::VideoWatch),
            make("tools_demo", ActivityType::VideoWatch),
            make("discussion", ActivityType::Scroll),
        ];
        let grouped = group_by_section(&acts);
        assert_eq!(grouped.len(), 3);

        let summary = compute_unit_summary(
            UnitId::new(3),
            grouped.iter().map(|(id, a)| (id, a.as_slice())),
        );
        // 25 (overview) + 12.5 (tools 50%) + 0 + 0
        assert_eq!(summary.overall_percentage, 38);
        assert_eq!(summary.category_percentage(UnitCategory::Tools), 50.0);
    }
}

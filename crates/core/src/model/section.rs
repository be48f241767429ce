use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::SectionId;

/// Semantic kind of a section, decided from its identifier alone.
///
/// Closed set: every identifier maps to exactly one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionCategory {
    Overview,
    ToolsDemo,
    ToolsGeneric,
    Discussion,
    Task,
    Other,
}

impl SectionCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::ToolsDemo => "tools_demo",
            Self::ToolsGeneric => "tools_generic",
            Self::Discussion => "discussion",
            Self::Task => "task",
            Self::Other => "other",
        }
    }

    /// Bucket this category contributes to in the unit roll-up.
    ///
    /// `Other` carries no unit-level weight.
    #[must_use]
    pub fn unit_category(self) -> Option<UnitCategory> {
        match self {
            Self::Overview => Some(UnitCategory::Overview),
            Self::ToolsDemo | Self::ToolsGeneric => Some(UnitCategory::Tools),
            Self::Discussion => Some(UnitCategory::Discussion),
            Self::Task => Some(UnitCategory::Task),
            Self::Other => None,
        }
    }
}

impl fmt::Display for SectionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four weighted buckets of a unit summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitCategory {
    Overview,
    Tools,
    Discussion,
    Task,
}

impl UnitCategory {
    pub const ALL: [UnitCategory; 4] = [
        UnitCategory::Overview,
        UnitCategory::Tools,
        UnitCategory::Discussion,
        UnitCategory::Task,
    ];

    /// Share of the unit total, in percentage points.
    #[must_use]
    pub fn weight(self) -> f64 {
        match self {
            Self::Overview | Self::Tools | Self::Discussion | Self::Task => 25.0,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Tools => "tools",
            Self::Discussion => "discussion",
            Self::Task => "task",
        }
    }
}

impl fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of one section, recomputed from its activity history on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionProgress {
    pub section_id: SectionId,
    pub category: SectionCategory,
    /// Integer-valued, within `0.0..=100.0`. Not rounded.
    pub percentage: f64,
    pub activity_count: usize,
}

impl SectionProgress {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.percentage >= 100.0
    }

    /// Rounded value for display only; never compare this against 100.
    #[must_use]
    pub fn display_percentage(&self) -> u8 {
        display_percentage(self.percentage)
    }
}

/// Rounds and clamps a percentage into `0..=100` for display.
#[must_use]
pub fn display_percentage(value: f64) -> u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rounded = value.clamp(0.0, 100.0).round() as u8;
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one_hundred() {
        let total: f64 = UnitCategory::ALL.iter().map(|c| c.weight()).sum();
        assert_eq!(total, 100.0);
    }

    #[test]
    fn tools_variants_share_a_bucket() {
        assert_eq!(
            SectionCategory::ToolsDemo.unit_category(),
            SectionCategory::ToolsGeneric.unit_category()
        );
        assert_eq!(SectionCategory::Other.unit_category(), None);
    }

    #[test]
    fn display_percentage_clamps_and_rounds() {
        assert_eq!(display_percentage(62.5), 63);
        assert_eq!(display_percentage(140.0), 100);
        assert_eq!(display_percentage(-3.0), 0);
    }

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&SectionCategory::ToolsDemo).unwrap();
        assert_eq!(json, "\"tools_demo\"");
    }
}

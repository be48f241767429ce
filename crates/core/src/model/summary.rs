use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ids::UnitId;
use crate::model::section::UnitCategory;

/// Colour band of a unit percentage in progress listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressLevel {
    Low,
    Medium,
    High,
}

impl ProgressLevel {
    #[must_use]
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            80.. => Self::High,
            50..=79 => Self::Medium,
            _ => Self::Low,
        }
    }
}

/// Unit-level roll-up, computed fresh per request and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSummary {
    pub unit_id: UnitId,
    /// Weighted sum of the breakdown, rounded once.
    pub overall_percentage: u8,
    /// Best section percentage per bucket, unrounded. Always holds all four buckets.
    pub breakdown: BTreeMap<UnitCategory, f64>,
}

impl UnitSummary {
    #[must_use]
    pub fn level(&self) -> ProgressLevel {
        ProgressLevel::from_percentage(self.overall_percentage)
    }

    #[must_use]
    pub fn category_percentage(&self, category: UnitCategory) -> f64 {
        self.breakdown.get(&category).copied().unwrap_or(0.0)
    }
}

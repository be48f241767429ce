//! Section classification.
//!
//! Identifiers are free-form strings chosen by content authors, so the category
//! is inferred from prefixes and substrings. Rules live in one ordered table and
//! the first matching rule decides; matching is case-sensitive on the raw id.

use crate::model::SectionCategory;

/// How a rule's needles are tested against the identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Match {
    Prefix,
    Contains,
}

#[derive(Debug, Clone, Copy)]
struct Rule {
    how: Match,
    needles: &'static [&'static str],
    category: SectionCategory,
}

impl Rule {
    fn matches(&self, id: &str) -> bool {
        self.needles.iter().any(|needle| match self.how {
            Match::Prefix => id.starts_with(needle),
            Match::Contains => id.contains(needle),
        })
    }
}

/// Evaluated top to bottom.
///
/// Task/assignment prefixes sit above the tools rules so `task_tools_review`
/// stays a task; a task id that merely contains "tools" later on would
/// otherwise be scored as a tools section.
const RULES: &[Rule] = &[
    Rule {
        how: Match::Prefix,
        needles: &["overview", "intro"],
        category: SectionCategory::Overview,
    },
    Rule {
        how: Match::Prefix,
        needles: &["task", "assignment"],
        category: SectionCategory::Task,
    },
    Rule {
        how: Match::Contains,
        needles: &["tools_demo", "tools_intermediaries"],
        category: SectionCategory::ToolsDemo,
    },
    Rule {
        how: Match::Contains,
        needles: &["tools"],
        category: SectionCategory::ToolsGeneric,
    },
    Rule {
        how: Match::Contains,
        needles: &["discussion"],
        category: SectionCategory::Discussion,
    },
    Rule {
        how: Match::Contains,
        needles: &["task", "assignment"],
        category: SectionCategory::Task,
    },
];

/// Map a section identifier to its category.
///
/// ```
/// use tracker_core::classify_section;
/// use tracker_core::model::SectionCategory;
///
/// assert_eq!(classify_section("intro_video"), SectionCategory::Overview);
/// assert_eq!(classify_section("tools_demo_2"), SectionCategory::ToolsDemo);
/// assert_eq!(classify_section("faq"), SectionCategory::Other);
/// ```
#[must_use]
pub fn classify_section(section_id: &str) -> SectionCategory {
    RULES
        .iter()
        .find(|rule| rule.matches(section_id))
        .map_or(SectionCategory::Other, |rule| rule.category)
}

/// Prefixes of section ids that belong to real course content.
///
/// Anything else found in the activity log (renamed or retired anchors) is
/// left out of admin drill-downs.
pub const KNOWN_SECTION_PREFIXES: &[&str] = &[
    "overview",
    "intro",
    "tools",
    "discussion",
    "task",
    "assignment",
    "help_tools",
    "inspiration",
    "tools_demo",
    "tools_intermediaries",
    "tools_intro",
    "tools_oral",
    "tools_ask_me",
    "tools_learning_mode",
    "tools_document_analysis",
    "tools_screen_share",
    "tools_presentations",
    "tools_infographics",
    "tools_diagrams",
    "image-generators",
    "image-editing",
    "designs",
    "3d",
    "help-tools",
];

#[must_use]
pub fn is_known_section(section_id: &str) -> bool {
    KNOWN_SECTION_PREFIXES
        .iter()
        .any(|prefix| section_id.starts_with(prefix))
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::error::InputError;
use crate::model::ids::{SectionId, UnitId, UserId};

/// Longest activity type name accepted, in bytes.
pub const MAX_ACTIVITY_TYPE_LEN: usize = 50;

//
// ─── ACTIVITY TYPE ─────────────────────────────────────────────────────────────
//

/// Kind of learner interaction reported by the page tracker.
///
/// Names the tracker does not know yet are kept as `Other` rather than
/// rejected; they still count toward sections scored by the fallback rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ActivityType {
    VideoWatch,
    ButtonClick,
    Scroll,
    Comment,
    ManualCheck,
    Other(String),
}

impl ActivityType {
    /// Parse a wire name such as `"video_watch"`.
    ///
    /// # Errors
    ///
    /// Returns `InputError::EmptyActivityType` for blank input and
    /// `InputError::ActivityTypeTooLong` past [`MAX_ACTIVITY_TYPE_LEN`] bytes.
    pub fn parse(raw: &str) -> Result<Self, InputError> {
        if raw.trim().is_empty() {
            return Err(InputError::EmptyActivityType);
        }
        if raw.len() > MAX_ACTIVITY_TYPE_LEN {
            return Err(InputError::ActivityTypeTooLong {
                len: raw.len(),
                max: MAX_ACTIVITY_TYPE_LEN,
            });
        }
        Ok(match raw {
            "video_watch" => Self::VideoWatch,
            "button_click" => Self::ButtonClick,
            "scroll" => Self::Scroll,
            "comment" => Self::Comment,
            "manual_check" => Self::ManualCheck,
            other => Self::Other(other.to_owned()),
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::VideoWatch => "video_watch",
            Self::ButtonClick => "button_click",
            Self::Scroll => "scroll",
            Self::Comment => "comment",
            Self::ManualCheck => "manual_check",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ActivityType {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ActivityType> for String {
    fn from(value: ActivityType) -> Self {
        value.as_str().to_owned()
    }
}

//
// ─── PAYLOAD ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload must be a JSON object")]
    NotAnObject,
}

/// Opaque key/value data attached to an activity (video id, dwell time, ...).
///
/// Scoring never depends on payload contents, so a payload that fails to
/// parse is treated as empty by callers rather than failing the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityPayload(Map<String, Value>);

impl ActivityPayload {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Payload written for a learner ticking a section's checkbox.
    #[must_use]
    pub fn manual_check() -> Self {
        let mut map = Map::new();
        map.insert("checked".into(), Value::Bool(true));
        Self(map)
    }

    /// Parse a stored or submitted JSON document.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError` if `raw` is not a JSON object.
    pub fn parse(raw: &str) -> Result<Self, PayloadError> {
        match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::empty()),
            _ => Err(PayloadError::NotAnObject),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }
}

impl From<Map<String, Value>> for ActivityPayload {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

//
// ─── ACTIVITY RECORD ───────────────────────────────────────────────────────────
//

/// A single learner interaction, immutable once appended to the event store.
///
/// `id` is `None` until the store assigns one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: Option<i64>,
    pub user_id: UserId,
    pub unit_id: UnitId,
    pub section_id: SectionId,
    pub activity_type: ActivityType,
    pub payload: ActivityPayload,
    pub created_at: DateTime<Utc>,
}

impl ActivityRecord {
    #[must_use]
    pub fn new(
        user_id: UserId,
        unit_id: UnitId,
        section_id: SectionId,
        activity_type: ActivityType,
        payload: ActivityPayload,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            user_id,
            unit_id,
            section_id,
            activity_type,
            payload,
            created_at,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// True when both records describe the same (user, unit, section, type).
    #[must_use]
    pub fn same_tuple(&self, other: &ActivityRecord) -> bool {
        self.user_id == other.user_id
            && self.unit_id == other.unit_id
            && self.section_id == other.section_id
            && self.activity_type == other.activity_type
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types_parse() {
        assert_eq!(
            ActivityType::parse("video_watch").unwrap(),
            ActivityType::VideoWatch
        );
        assert_eq!(
            ActivityType::parse("manual_check").unwrap(),
            ActivityType::ManualCheck
        );
    }

    #[test]
    fn unknown_type_is_kept_not_rejected() {
        let kind = ActivityType::parse("quiz_answer").unwrap();
        assert_eq!(kind, ActivityType::Other("quiz_answer".into()));
        assert_eq!(kind.as_str(), "quiz_answer");
    }

    #[test]
    fn type_names_are_case_sensitive() {
        assert_eq!(
            ActivityType::parse("Comment").unwrap(),
            ActivityType::Other("Comment".into())
        );
    }

    #[test]
    fn blank_or_oversized_types_are_invalid() {
        assert_eq!(
            ActivityType::parse("").unwrap_err(),
            InputError::EmptyActivityType
        );
        let long = "a".repeat(MAX_ACTIVITY_TYPE_LEN + 1);
        assert!(matches!(
            ActivityType::parse(&long),
            Err(InputError::ActivityTypeTooLong { .. })
        ));
    }

    #[test]
    fn payload_parses_objects_only() {
        let payload = ActivityPayload::parse(r#"{"progress_percent":50}"#).unwrap();
        assert_eq!(payload.get("progress_percent"), Some(&Value::from(50)));
        assert!(ActivityPayload::parse("null").unwrap().is_empty());
        assert!(matches!(
            ActivityPayload::parse("[1,2]"),
            Err(PayloadError::NotAnObject)
        ));
        assert!(ActivityPayload::parse("{not json").is_err());
    }

    #[test]
    fn manual_check_payload_round_trips_through_json() {
        let json = ActivityPayload::manual_check().to_json();
        assert_eq!(json, r#"{"checked":true}"#);
        assert_eq!(
            ActivityPayload::parse(&json).unwrap(),
            ActivityPayload::manual_check()
        );
    }
}

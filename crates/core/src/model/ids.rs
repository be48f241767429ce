use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::InputError;

/// Longest section identifier accepted, in bytes.
pub const MAX_SECTION_ID_LEN: usize = 255;

/// Identifier of a learner, assigned by the external user store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(u64);

impl UserId {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Like [`UserId::new`], but rejects zero (an unset id on the wire).
    ///
    /// # Errors
    ///
    /// Returns `InputError::ZeroId` for `0`.
    pub fn try_new(id: u64) -> Result<Self, InputError> {
        if id == 0 {
            return Err(InputError::ZeroId { kind: "user id" });
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Identifier of a course unit (an external content id).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u64);

impl UnitId {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// # Errors
    ///
    /// Returns `InputError::ZeroId` for `0`.
    pub fn try_new(id: u64) -> Result<Self, InputError> {
        if id == 0 {
            return Err(InputError::ZeroId { kind: "unit id" });
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Free-form section identifier assigned by content authors.
///
/// The raw string is kept verbatim: classification is case-sensitive and no
/// trimming or lowercasing happens here.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectionId(String);

impl SectionId {
    /// # Errors
    ///
    /// Returns `InputError::EmptySectionId` for blank input and
    /// `InputError::SectionIdTooLong` past [`MAX_SECTION_ID_LEN`] bytes.
    pub fn new(raw: impl Into<String>) -> Result<Self, InputError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(InputError::EmptySectionId);
        }
        if raw.len() > MAX_SECTION_ID_LEN {
            return Err(InputError::SectionIdTooLong {
                len: raw.len(),
                max: MAX_SECTION_ID_LEN,
            });
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SectionId {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SectionId> for String {
    fn from(value: SectionId) -> Self {
        value.0
    }
}

impl AsRef<str> for SectionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Debug for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitId({})", self.0)
    }
}

impl fmt::Debug for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SectionId({:?})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing a numeric id from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for UserId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .ok()
            .and_then(|v| UserId::try_new(v).ok())
            .ok_or(ParseIdError { kind: "UserId" })
    }
}

impl FromStr for UnitId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .ok()
            .and_then(|v| UnitId::try_new(v).ok())
            .ok_or(ParseIdError { kind: "UnitId" })
    }
}

impl FromStr for SectionId {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionId::new(s)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_parses_and_displays() {
        let id: UserId = "42".parse().unwrap();
        assert_eq!(id, UserId::new(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn zero_ids_are_rejected() {
        assert!("0".parse::<UnitId>().is_err());
        assert_eq!(
            UserId::try_new(0).unwrap_err(),
            InputError::ZeroId { kind: "user id" }
        );
    }

    #[test]
    fn unit_id_rejects_garbage() {
        assert!("unit-7".parse::<UnitId>().is_err());
    }

    #[test]
    fn section_id_keeps_raw_text() {
        let id = SectionId::new("Tools_Demo ").unwrap();
        assert_eq!(id.as_str(), "Tools_Demo ");
    }

    #[test]
    fn section_id_rejects_blank_and_oversized() {
        assert_eq!(SectionId::new("   ").unwrap_err(), InputError::EmptySectionId);
        let long = "x".repeat(MAX_SECTION_ID_LEN + 1);
        assert!(matches!(
            SectionId::new(long),
            Err(InputError::SectionIdTooLong { len: 256, .. })
        ));
    }

    #[test]
    fn section_id_deserialization_validates() {
        let ok: SectionId = serde_json::from_str("\"overview\"").unwrap();
        assert_eq!(ok.as_str(), "overview");
        assert!(serde_json::from_str::<SectionId>("\"\"").is_err());
    }
}

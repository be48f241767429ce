use thiserror::Error;

/// Validation failures for identifiers and activity types.
///
/// These are client errors: nothing is computed or stored when one is raised.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InputError {
    #[error("{kind} must be non-zero")]
    ZeroId { kind: &'static str },

    #[error("section id cannot be empty")]
    EmptySectionId,

    #[error("section id too long ({len} bytes, max {max})")]
    SectionIdTooLong { len: usize, max: usize },

    #[error("activity type cannot be empty")]
    EmptyActivityType,

    #[error("activity type too long ({len} bytes, max {max})")]
    ActivityTypeTooLong { len: usize, max: usize },
}

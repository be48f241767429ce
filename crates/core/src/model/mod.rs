mod activity;
mod completion;
mod ids;
mod position;
mod section;
mod settings;
mod summary;

pub use ids::{MAX_SECTION_ID_LEN, ParseIdError, SectionId, UnitId, UserId};

pub use activity::{
    ActivityPayload, ActivityRecord, ActivityType, MAX_ACTIVITY_TYPE_LEN, PayloadError,
};
pub use completion::{CompletionMarker, SectionState};
pub use position::LastPosition;
pub use section::{SectionCategory, SectionProgress, UnitCategory, display_percentage};
pub use settings::{DEFAULT_DEDUP_WINDOW_SECS, SettingsError, TrackerSettings};
pub use summary::{ProgressLevel, UnitSummary};

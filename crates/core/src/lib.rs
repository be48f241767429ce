#![forbid(unsafe_code)]

pub mod classify;
pub mod completion;
pub mod dedup;
pub mod error;
pub mod model;
pub mod progress;
pub mod rollup;
pub mod time;

pub use classify::{classify_section, is_known_section};
pub use completion::CompletionPromoter;
pub use dedup::Deduplicator;
pub use error::InputError;
pub use progress::compute_section_progress;
pub use rollup::{compute_unit_summary, roll_up};
pub use time::Clock;

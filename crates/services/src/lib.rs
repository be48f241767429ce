#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod position_service;
pub mod progress_service;
pub mod tracking_service;

pub use tracker_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, PositionError, ProgressError, TrackingError};
pub use position_service::PositionService;
pub use progress_service::{CohortRow, ProgressService, SectionDetail, UnitDetails};
pub use tracking_service::{ActivitySubmission, TrackOutcome, TrackingService};

use std::sync::Arc;

use storage::repository::Storage;
use tracker_core::Deduplicator;
use tracker_core::model::TrackerSettings;

use crate::Clock;
use crate::error::AppServicesError;
use crate::position_service::PositionService;
use crate::progress_service::ProgressService;
use crate::tracking_service::TrackingService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    tracking: Arc<TrackingService>,
    progress: Arc<ProgressService>,
    positions: Arc<PositionService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: TrackerSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, settings))
    }

    #[must_use]
    pub fn in_memory(clock: Clock, settings: TrackerSettings) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, settings)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, settings: TrackerSettings) -> Self {
        let tracking = Arc::new(TrackingService::new(
            clock,
            Deduplicator::from_settings(&settings),
            Arc::clone(&storage.activities),
            Arc::clone(&storage.completions),
        ));
        let progress = Arc::new(ProgressService::new(
            Arc::clone(&storage.activities),
            Arc::clone(&storage.completions),
        ));
        let positions = Arc::new(PositionService::new(clock, Arc::clone(&storage.positions)));

        Self {
            tracking,
            progress,
            positions,
        }
    }

    #[must_use]
    pub fn tracking(&self) -> Arc<TrackingService> {
        Arc::clone(&self.tracking)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn positions(&self) -> Arc<PositionService> {
        Arc::clone(&self.positions)
    }
}

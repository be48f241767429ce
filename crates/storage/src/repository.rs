use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracker_core::Deduplicator;
use tracker_core::model::{
    ActivityRecord, CompletionMarker, LastPosition, SectionId, UnitId, UserId,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    /// The store could not be reached; the same request may succeed later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Connection(_))
    }
}

/// Result of an append guarded by the dedup window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AppendOutcome {
    Accepted { id: i64 },
    Duplicate,
}

impl AppendOutcome {
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, AppendOutcome::Duplicate)
    }
}

/// Append-only activity log.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Append `record` unless `dedup` finds the same (user, unit, section, type)
    /// inside its window ending at `record.created_at`.
    ///
    /// The check and the insert are a single atomic step, so concurrent
    /// submissions of the same event store at most one record. With `dedup`
    /// set to `None` the record is always appended.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn append_activity(
        &self,
        record: &ActivityRecord,
        dedup: Option<Deduplicator>,
    ) -> Result<AppendOutcome, StorageError>;

    /// Activities of a learner in a unit, optionally narrowed to one section,
    /// oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn activities(
        &self,
        user_id: UserId,
        unit_id: UnitId,
        section_id: Option<&SectionId>,
    ) -> Result<Vec<ActivityRecord>, StorageError>;

    /// Units the learner has any activity in, ascending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn units_for_user(&self, user_id: UserId) -> Result<Vec<UnitId>, StorageError>;

    /// Every learner with any recorded activity, ascending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn learners(&self) -> Result<Vec<UserId>, StorageError>;

    /// Every unit any learner has activity in, ascending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn all_units(&self) -> Result<Vec<UnitId>, StorageError>;

    /// Every section id seen in a unit across all learners, ascending.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn sections_for_unit(&self, unit_id: UnitId) -> Result<Vec<SectionId>, StorageError>;
}

#[async_trait]
pub trait CompletionRepository: Send + Sync {
    /// Insert the marker if none exists for its (user, unit, section).
    ///
    /// Returns `true` when a new marker was created; an existing marker is a
    /// no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn record_completion(&self, marker: &CompletionMarker) -> Result<bool, StorageError>;

    /// Completed section ids, de-duplicated.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn completed_sections(
        &self,
        user_id: UserId,
        unit_id: UnitId,
    ) -> Result<BTreeSet<SectionId>, StorageError>;
}

#[async_trait]
pub trait PositionRepository: Send + Sync {
    /// Insert or replace the learner's position in the unit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the position cannot be stored.
    async fn save_position(&self, position: &LastPosition) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn last_position(
        &self,
        user_id: UserId,
        unit_id: UnitId,
    ) -> Result<Option<LastPosition>, StorageError>;

    /// Most recently updated position across all units.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read failures.
    async fn latest_position(&self, user_id: UserId) -> Result<Option<LastPosition>, StorageError>;
}

#[derive(Default)]
struct ActivityLog {
    next_id: i64,
    records: Vec<ActivityRecord>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    activities: Arc<Mutex<ActivityLog>>,
    completions: Arc<Mutex<HashMap<(UserId, UnitId, SectionId), CompletionMarker>>>,
    positions: Arc<Mutex<HashMap<(UserId, UnitId), LastPosition>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))
}

#[async_trait]
impl ActivityRepository for InMemoryRepository {
    async fn append_activity(
        &self,
        record: &ActivityRecord,
        dedup: Option<Deduplicator>,
    ) -> Result<AppendOutcome, StorageError> {
        let mut log = lock(&self.activities)?;
        if let Some(dedup) = dedup {
            if dedup.is_duplicate(record, &log.records, record.created_at) {
                return Ok(AppendOutcome::Duplicate);
            }
        }
        log.next_id += 1;
        let id = log.next_id;
        log.records.push(record.clone().with_id(id));
        Ok(AppendOutcome::Accepted { id })
    }

    async fn activities(
        &self,
        user_id: UserId,
        unit_id: UnitId,
        section_id: Option<&SectionId>,
    ) -> Result<Vec<ActivityRecord>, StorageError> {
        let log = lock(&self.activities)?;
        let mut found: Vec<ActivityRecord> = log
            .records
            .iter()
            .filter(|r| r.user_id == user_id && r.unit_id == unit_id)
            .filter(|r| section_id.is_none_or(|s| &r.section_id == s))
            .cloned()
            .collect();
        found.sort_by_key(|r| (r.created_at, r.id));
        Ok(found)
    }

    async fn units_for_user(&self, user_id: UserId) -> Result<Vec<UnitId>, StorageError> {
        let log = lock(&self.activities)?;
        let units: BTreeSet<UnitId> = log
            .records
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.unit_id)
            .collect();
        Ok(units.into_iter().collect())
    }

    async fn learners(&self) -> Result<Vec<UserId>, StorageError> {
        let log = lock(&self.activities)?;
        let users: BTreeSet<UserId> = log.records.iter().map(|r| r.user_id).collect();
        Ok(users.into_iter().collect())
    }

    async fn all_units(&self) -> Result<Vec<UnitId>, StorageError> {
        let log = lock(&self.activities)?;
        let units: BTreeSet<UnitId> = log.records.iter().map(|r| r.unit_id).collect();
        Ok(units.into_iter().collect())
    }

    async fn sections_for_unit(&self, unit_id: UnitId) -> Result<Vec<SectionId>, StorageError> {
        let log = lock(&self.activities)?;
        let sections: BTreeSet<SectionId> = log
            .records
            .iter()
            .filter(|r| r.unit_id == unit_id)
            .map(|r| r.section_id.clone())
            .collect();
        Ok(sections.into_iter().collect())
    }
}

#[async_trait]
impl CompletionRepository for InMemoryRepository {
    async fn record_completion(&self, marker: &CompletionMarker) -> Result<bool, StorageError> {
        let mut guard = lock(&self.completions)?;
        let key = (marker.user_id, marker.unit_id, marker.section_id.clone());
        if guard.contains_key(&key) {
            return Ok(false);
        }
        guard.insert(key, marker.clone());
        Ok(true)
    }

    async fn completed_sections(
        &self,
        user_id: UserId,
        unit_id: UnitId,
    ) -> Result<BTreeSet<SectionId>, StorageError> {
        let guard = lock(&self.completions)?;
        Ok(guard
            .keys()
            .filter(|(u, n, _)| *u == user_id && *n == unit_id)
            .map(|(_, _, s)| s.clone())
            .collect())
    }
}

#[async_trait]
impl PositionRepository for InMemoryRepository {
    async fn save_position(&self, position: &LastPosition) -> Result<(), StorageError> {
        let mut guard = lock(&self.positions)?;
        guard.insert((position.user_id, position.unit_id), position.clone());
        Ok(())
    }

    async fn last_position(
        &self,
        user_id: UserId,
        unit_id: UnitId,
    ) -> Result<Option<LastPosition>, StorageError> {
        let guard = lock(&self.positions)?;
        Ok(guard.get(&(user_id, unit_id)).cloned())
    }

    async fn latest_position(&self, user_id: UserId) -> Result<Option<LastPosition>, StorageError> {
        let guard = lock(&self.positions)?;
        Ok(guard
            .values()
            .filter(|p| p.user_id == user_id)
            .max_by_key(|p| (p.updated_at, p.unit_id))
            .cloned())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub activities: Arc<dyn ActivityRepository>,
    pub completions: Arc<dyn CompletionRepository>,
    pub positions: Arc<dyn PositionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            activities: Arc::new(repo.clone()),
            completions: Arc::new(repo.clone()),
            positions: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use tracker_core::model::{ActivityPayload, ActivityType};
    use tracker_core::time::fixed_now;

    fn record(section: &str, kind: ActivityType, at: DateTime<Utc>) -> ActivityRecord {
        ActivityRecord::new(
            UserId::new(1),
            UnitId::new(5),
            SectionId::new(section).unwrap(),
            kind,
            ActivityPayload::empty(),
            at,
        )
    }

    #[tokio::test]
    async fn duplicate_inside_window_is_not_stored() {
        let repo = InMemoryRepository::new();
        let now = fixed_now();
        let dedup = Some(Deduplicator::default());

        let first = repo
            .append_activity(&record("overview", ActivityType::VideoWatch, now), dedup)
            .await
            .unwrap();
        let second = repo
            .append_activity(
                &record("overview", ActivityType::VideoWatch, now + Duration::minutes(2)),
                dedup,
            )
            .await
            .unwrap();

        assert_eq!(first, AppendOutcome::Accepted { id: 1 });
        assert!(second.is_duplicate());
        let stored = repo
            .activities(UserId::new(1), UnitId::new(5), None)
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, Some(1));
    }

    #[tokio::test]
    async fn append_without_dedup_always_stores() {
        let repo = InMemoryRepository::new();
        let now = fixed_now();
        for _ in 0..3 {
            repo.append_activity(&record("task", ActivityType::ManualCheck, now), None)
                .await
                .unwrap();
        }
        let stored = repo
            .activities(UserId::new(1), UnitId::new(5), None)
            .await
            .unwrap();
        assert_eq!(stored.len(), 3);
    }

    #[tokio::test]
    async fn activities_filter_by_section_and_sort_oldest_first() {
        let repo = InMemoryRepository::new();
        let now = fixed_now();
        repo.append_activity(&record("tools", ActivityType::VideoWatch, now), None)
            .await
            .unwrap();
        repo.append_activity(
            &record("tools", ActivityType::Scroll, now - Duration::minutes(1)),
            None,
        )
        .await
        .unwrap();
        repo.append_activity(&record("overview", ActivityType::VideoWatch, now), None)
            .await
            .unwrap();

        let tools = SectionId::new("tools").unwrap();
        let found = repo
            .activities(UserId::new(1), UnitId::new(5), Some(&tools))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].activity_type, ActivityType::Scroll);

        let sections = repo.sections_for_unit(UnitId::new(5)).await.unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(repo.units_for_user(UserId::new(1)).await.unwrap(), vec![UnitId::new(5)]);
    }

    #[tokio::test]
    async fn completion_is_recorded_once() {
        let repo = InMemoryRepository::new();
        let marker = CompletionMarker::new(
            UserId::new(1),
            UnitId::new(5),
            SectionId::new("overview").unwrap(),
            fixed_now(),
        );
        assert!(repo.record_completion(&marker).await.unwrap());
        assert!(!repo.record_completion(&marker).await.unwrap());

        let done = repo
            .completed_sections(UserId::new(1), UnitId::new(5))
            .await
            .unwrap();
        assert_eq!(done.len(), 1);
    }

    #[tokio::test]
    async fn latest_position_spans_units() {
        let repo = InMemoryRepository::new();
        let now = fixed_now();
        let older = LastPosition::new(
            UserId::new(1),
            UnitId::new(1),
            SectionId::new("overview").unwrap(),
            now,
        );
        let newer = LastPosition::new(
            UserId::new(1),
            UnitId::new(2),
            SectionId::new("tools").unwrap(),
            now + Duration::minutes(3),
        );
        repo.save_position(&older).await.unwrap();
        repo.save_position(&newer).await.unwrap();

        let latest = repo.latest_position(UserId::new(1)).await.unwrap().unwrap();
        assert_eq!(latest.unit_id, UnitId::new(2));
        assert!(repo.latest_position(UserId::new(9)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn learners_and_units_span_the_whole_log() {
        let repo = InMemoryRepository::new();
        for (user, unit) in [(3, 9), (1, 5), (3, 5)] {
            let mut rec = record("overview", ActivityType::VideoWatch, fixed_now());
            rec.user_id = UserId::new(user);
            rec.unit_id = UnitId::new(unit);
            repo.append_activity(&rec, None).await.unwrap();
        }

        assert_eq!(
            repo.learners().await.unwrap(),
            vec![UserId::new(1), UserId::new(3)]
        );
        assert_eq!(
            repo.all_units().await.unwrap(),
            vec![UnitId::new(5), UnitId::new(9)]
        );
        assert!(InMemoryRepository::new().learners().await.unwrap().is_empty());
    }

    #[test]
    fn only_connection_errors_are_retryable() {
        assert!(StorageError::Connection("down".into()).is_retryable());
        assert!(!StorageError::Serialization("bad".into()).is_retryable());
    }
}

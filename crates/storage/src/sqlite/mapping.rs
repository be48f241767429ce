use sqlx::Row;
use tracker_core::model::{
    ActivityPayload, ActivityRecord, ActivityType, LastPosition, SectionId, UnitId, UserId,
};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn unit_id_from_i64(v: i64) -> Result<UnitId, StorageError> {
    Ok(UnitId::new(i64_to_u64("unit_id", v)?))
}

pub(crate) fn section_id_from_str(v: String) -> Result<SectionId, StorageError> {
    SectionId::new(v).map_err(ser)
}

/// Stored payloads are opaque; an unreadable one degrades to empty instead of
/// hiding the whole record from scoring.
pub(crate) fn payload_from_column(id: i64, raw: Option<String>) -> ActivityPayload {
    let Some(raw) = raw else {
        return ActivityPayload::empty();
    };
    match ActivityPayload::parse(&raw) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(activity_id = id, error = %err, "unreadable activity payload, treating as empty");
            ActivityPayload::empty()
        }
    }
}

pub(crate) fn payload_to_column(payload: &ActivityPayload) -> Option<String> {
    (!payload.is_empty()).then(|| payload.to_json())
}

pub(crate) fn map_activity_row(row: &sqlx::sqlite::SqliteRow) -> Result<ActivityRecord, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let activity_type: String = row.try_get("activity_type").map_err(ser)?;

    Ok(ActivityRecord {
        id: Some(id),
        user_id: user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        unit_id: unit_id_from_i64(row.try_get::<i64, _>("unit_id").map_err(ser)?)?,
        section_id: section_id_from_str(row.try_get("section_id").map_err(ser)?)?,
        activity_type: ActivityType::parse(&activity_type).map_err(ser)?,
        payload: payload_from_column(id, row.try_get("payload").map_err(ser)?),
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn map_position_row(row: &sqlx::sqlite::SqliteRow) -> Result<LastPosition, StorageError> {
    Ok(LastPosition {
        user_id: user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        unit_id: unit_id_from_i64(row.try_get::<i64, _>("unit_id").map_err(ser)?)?,
        section_id: section_id_from_str(row.try_get("section_id").map_err(ser)?)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

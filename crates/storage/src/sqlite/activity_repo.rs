use sqlx::Row;
use tracker_core::Deduplicator;
use tracker_core::model::{ActivityRecord, SectionId, UnitId, UserId};

use super::{
    SqliteRepository,
    mapping::{
        conn, id_i64, map_activity_row, payload_to_column, section_id_from_str, ser,
        unit_id_from_i64, user_id_from_i64,
    },
};
use crate::repository::{ActivityRepository, AppendOutcome, StorageError};

#[async_trait::async_trait]
impl ActivityRepository for SqliteRepository {
    async fn append_activity(
        &self,
        record: &ActivityRecord,
        dedup: Option<Deduplicator>,
    ) -> Result<AppendOutcome, StorageError> {
        let user_id = id_i64("user_id", record.user_id.value())?;
        let unit_id = id_i64("unit_id", record.unit_id.value())?;
        // A NULL bound makes `created_at > NULL` unknown, so NOT EXISTS always holds.
        let window_start = dedup.map(|d| d.window_start(record.created_at));

        // Check and insert in one statement so concurrent submissions of the
        // same event cannot both pass the check.
        let res = sqlx::query(
            r"
                INSERT INTO activities (
                    user_id, unit_id, section_id, activity_type, payload, created_at
                )
                SELECT ?1, ?2, ?3, ?4, ?5, ?6
                WHERE NOT EXISTS (
                    SELECT 1 FROM activities
                    WHERE user_id = ?1
                      AND unit_id = ?2
                      AND section_id = ?3
                      AND activity_type = ?4
                      AND created_at > ?7
                )
            ",
        )
        .bind(user_id)
        .bind(unit_id)
        .bind(record.section_id.as_str())
        .bind(record.activity_type.as_str())
        .bind(payload_to_column(&record.payload))
        .bind(record.created_at)
        .bind(window_start)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Ok(AppendOutcome::Duplicate);
        }
        Ok(AppendOutcome::Accepted {
            id: res.last_insert_rowid(),
        })
    }

    async fn activities(
        &self,
        user_id: UserId,
        unit_id: UnitId,
        section_id: Option<&SectionId>,
    ) -> Result<Vec<ActivityRecord>, StorageError> {
        let user = id_i64("user_id", user_id.value())?;
        let unit = id_i64("unit_id", unit_id.value())?;

        // ?3 NULL means every section of the unit.
        let rows = sqlx::query(
            r"
                SELECT id, user_id, unit_id, section_id, activity_type, payload, created_at
                FROM activities
                WHERE user_id = ?1
                  AND unit_id = ?2
                  AND (?3 IS NULL OR section_id = ?3)
                ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(user)
        .bind(unit)
        .bind(section_id.map(SectionId::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_activity_row(&row)?);
        }
        Ok(out)
    }

    async fn units_for_user(&self, user_id: UserId) -> Result<Vec<UnitId>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT DISTINCT unit_id
                FROM activities
                WHERE user_id = ?1
                ORDER BY unit_id ASC
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| unit_id_from_i64(row.try_get::<i64, _>("unit_id").map_err(ser)?))
            .collect()
    }

    async fn learners(&self) -> Result<Vec<UserId>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT DISTINCT user_id
                FROM activities
                ORDER BY user_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?))
            .collect()
    }

    async fn all_units(&self) -> Result<Vec<UnitId>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT DISTINCT unit_id
                FROM activities
                ORDER BY unit_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| unit_id_from_i64(row.try_get::<i64, _>("unit_id").map_err(ser)?))
            .collect()
    }

    async fn sections_for_unit(&self, unit_id: UnitId) -> Result<Vec<SectionId>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT DISTINCT section_id
                FROM activities
                WHERE unit_id = ?1
                ORDER BY section_id ASC
            ",
        )
        .bind(id_i64("unit_id", unit_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| section_id_from_str(row.try_get("section_id").map_err(ser)?))
            .collect()
    }
}

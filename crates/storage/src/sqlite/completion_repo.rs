use std::collections::BTreeSet;

use sqlx::Row;
use tracker_core::model::{CompletionMarker, SectionId, UnitId, UserId};

use super::{
    SqliteRepository,
    mapping::{conn, id_i64, section_id_from_str, ser},
};
use crate::repository::{CompletionRepository, StorageError};

#[async_trait::async_trait]
impl CompletionRepository for SqliteRepository {
    async fn record_completion(&self, marker: &CompletionMarker) -> Result<bool, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO completions (user_id, unit_id, section_id, completed_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(user_id, unit_id, section_id) DO NOTHING
            ",
        )
        .bind(id_i64("user_id", marker.user_id.value())?)
        .bind(id_i64("unit_id", marker.unit_id.value())?)
        .bind(marker.section_id.as_str())
        .bind(marker.completed_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.rows_affected() == 1)
    }

    async fn completed_sections(
        &self,
        user_id: UserId,
        unit_id: UnitId,
    ) -> Result<BTreeSet<SectionId>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT DISTINCT section_id
                FROM completions
                WHERE user_id = ?1 AND unit_id = ?2
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(id_i64("unit_id", unit_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter()
            .map(|row| section_id_from_str(row.try_get("section_id").map_err(ser)?))
            .collect()
    }
}

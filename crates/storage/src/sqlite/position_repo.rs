use tracker_core::model::{LastPosition, UnitId, UserId};

use super::{
    SqliteRepository,
    mapping::{conn, id_i64, map_position_row},
};
use crate::repository::{PositionRepository, StorageError};

#[async_trait::async_trait]
impl PositionRepository for SqliteRepository {
    async fn save_position(&self, position: &LastPosition) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO last_positions (user_id, unit_id, section_id, updated_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(user_id, unit_id) DO UPDATE SET
                    section_id = excluded.section_id,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(id_i64("user_id", position.user_id.value())?)
        .bind(id_i64("unit_id", position.unit_id.value())?)
        .bind(position.section_id.as_str())
        .bind(position.updated_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn last_position(
        &self,
        user_id: UserId,
        unit_id: UnitId,
    ) -> Result<Option<LastPosition>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT user_id, unit_id, section_id, updated_at
                FROM last_positions
                WHERE user_id = ?1 AND unit_id = ?2
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .bind(id_i64("unit_id", unit_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_position_row).transpose()
    }

    async fn latest_position(&self, user_id: UserId) -> Result<Option<LastPosition>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT user_id, unit_id, section_id, updated_at
                FROM last_positions
                WHERE user_id = ?1
                ORDER BY updated_at DESC, unit_id DESC
                LIMIT 1
            ",
        )
        .bind(id_i64("user_id", user_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_position_row).transpose()
    }
}

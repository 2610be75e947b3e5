use srs_core::model::{UserId, VocabularyItem, VocabularyItemId};

use super::{
    SqliteRepository,
    mapping::{item_id_to_i64, map_vocabulary_row, user_id_to_text},
};
use crate::repository::{StorageError, VocabularyRepository};

#[async_trait::async_trait]
impl VocabularyRepository for SqliteRepository {
    async fn upsert_vocabulary_item(&self, item: &VocabularyItem) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO vocabulary_items (
                id, user_id, word, translation, language, comprehension_level
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user_id, id) DO UPDATE SET
                word = excluded.word,
                translation = excluded.translation,
                language = excluded.language,
                comprehension_level = excluded.comprehension_level
            ",
        )
        .bind(item_id_to_i64(item.id())?)
        .bind(user_id_to_text(item.user_id()))
        .bind(item.word())
        .bind(item.translation())
        .bind(item.language())
        .bind(i64::from(item.comprehension_level().value()))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_vocabulary_item(
        &self,
        user_id: UserId,
        id: VocabularyItemId,
    ) -> Result<Option<VocabularyItem>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, word, translation, language, comprehension_level
            FROM vocabulary_items
            WHERE user_id = ?1 AND id = ?2
            ",
        )
        .bind(user_id_to_text(user_id))
        .bind(item_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_vocabulary_row).transpose()
    }

    async fn list_vocabulary_items(
        &self,
        user_id: UserId,
    ) -> Result<Vec<VocabularyItem>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, word, translation, language, comprehension_level
            FROM vocabulary_items
            WHERE user_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(user_id_to_text(user_id))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(map_vocabulary_row(&row)?);
        }
        Ok(items)
    }

    async fn delete_vocabulary_item(
        &self,
        user_id: UserId,
        id: VocabularyItemId,
    ) -> Result<(), StorageError> {
        // review_records rows go with it via ON DELETE CASCADE
        let res = sqlx::query("DELETE FROM vocabulary_items WHERE user_id = ?1 AND id = ?2")
            .bind(user_id_to_text(user_id))
            .bind(item_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

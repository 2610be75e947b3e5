use srs_core::model::{ReviewRecord, UserId, VocabularyItemId};

use super::{
    SqliteRepository,
    mapping::{item_id_to_i64, map_review_record_row, user_id_to_text, write_error},
};
use crate::repository::{ReviewRecordRepository, StorageError};

const SELECT_COLUMNS: &str = r"
    SELECT
        user_id, vocabulary_item_id, interval_days, ease_factor, repetitions,
        next_review_date, last_reviewed_at, review_count,
        consecutive_correct, consecutive_incorrect, version
    FROM review_records
";

#[async_trait::async_trait]
impl ReviewRecordRepository for SqliteRepository {
    async fn get_review_record(
        &self,
        vocabulary_item_id: VocabularyItemId,
        user_id: UserId,
    ) -> Result<Option<ReviewRecord>, StorageError> {
        let sql = format!("{SELECT_COLUMNS} WHERE user_id = ?1 AND vocabulary_item_id = ?2");
        let row = sqlx::query(&sql)
            .bind(user_id_to_text(user_id))
            .bind(item_id_to_i64(vocabulary_item_id)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_review_record_row).transpose()
    }

    async fn upsert_review_record(
        &self,
        record: &ReviewRecord,
    ) -> Result<ReviewRecord, StorageError> {
        let user = user_id_to_text(record.user_id);
        let item = item_id_to_i64(record.vocabulary_item_id)?;
        let next_version = record.version.saturating_add(1);

        // version 0 means "not stored yet": insert, never overwrite.
        let sql = if record.version == 0 {
            r"
            INSERT INTO review_records (
                interval_days, ease_factor, repetitions, next_review_date, last_reviewed_at,
                review_count, consecutive_correct, consecutive_incorrect, version,
                user_id, vocabulary_item_id
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(user_id, vocabulary_item_id) DO NOTHING
            "
        } else {
            r"
            UPDATE review_records SET
                interval_days = ?1,
                ease_factor = ?2,
                repetitions = ?3,
                next_review_date = ?4,
                last_reviewed_at = ?5,
                review_count = ?6,
                consecutive_correct = ?7,
                consecutive_incorrect = ?8,
                version = ?9
            WHERE user_id = ?10 AND vocabulary_item_id = ?11 AND version = ?12
            "
        };

        let mut query = sqlx::query(sql)
            .bind(i64::from(record.interval_days))
            .bind(record.ease_factor)
            .bind(i64::from(record.repetitions))
            .bind(record.next_review_date)
            .bind(record.last_reviewed_at)
            .bind(i64::from(record.review_count))
            .bind(i64::from(record.consecutive_correct))
            .bind(i64::from(record.consecutive_incorrect))
            .bind(i64::from(next_version))
            .bind(user)
            .bind(item);
        if record.version > 0 {
            query = query.bind(i64::from(record.version));
        }

        let res = query
            .execute(&self.pool)
            .await
            .map_err(write_error)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        tracing::debug!(
            user_id = %record.user_id,
            vocabulary_item_id = %record.vocabulary_item_id,
            version = next_version,
            "review record stored"
        );

        let mut stored = record.clone();
        stored.version = next_version;
        Ok(stored)
    }

    async fn list_review_records(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ReviewRecord>, StorageError> {
        let sql = format!("{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY vocabulary_item_id ASC");
        let rows = sqlx::query(&sql)
            .bind(user_id_to_text(user_id))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_review_record_row(&row)?);
        }
        Ok(out)
    }
}

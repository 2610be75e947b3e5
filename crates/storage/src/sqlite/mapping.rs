use srs_core::model::{ReviewRecord, UserId, VocabularyItem, VocabularyItemId};
use sqlx::Row;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn item_id_to_i64(id: VocabularyItemId) -> Result<i64, StorageError> {
    i64::try_from(id.value())
        .map_err(|_| StorageError::Serialization("vocabulary_item_id overflow".into()))
}

pub(crate) fn item_id_from_i64(v: i64) -> Result<VocabularyItemId, StorageError> {
    u64::try_from(v)
        .map(VocabularyItemId::new)
        .map_err(|_| StorageError::Serialization("vocabulary_item_id sign overflow".into()))
}

pub(crate) fn user_id_to_text(id: UserId) -> String {
    id.to_string()
}

pub(crate) fn user_id_from_text(raw: &str) -> Result<UserId, StorageError> {
    raw.parse::<UserId>().map_err(ser)
}

pub(crate) fn map_vocabulary_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<VocabularyItem, StorageError> {
    let level: i64 = row.try_get("comprehension_level").map_err(ser)?;
    let level = u8::try_from(level)
        .map_err(|_| StorageError::Serialization(format!("invalid comprehension_level: {level}")))?;

    VocabularyItem::from_persisted(
        item_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        user_id_from_text(&row.try_get::<String, _>("user_id").map_err(ser)?)?,
        row.try_get("word").map_err(ser)?,
        row.try_get("translation").map_err(ser)?,
        row.try_get("language").map_err(ser)?,
        level,
    )
    .map_err(ser)
}

pub(crate) fn map_review_record_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ReviewRecord, StorageError> {
    Ok(ReviewRecord {
        vocabulary_item_id: item_id_from_i64(
            row.try_get::<i64, _>("vocabulary_item_id").map_err(ser)?,
        )?,
        user_id: user_id_from_text(&row.try_get::<String, _>("user_id").map_err(ser)?)?,
        interval_days: i64_to_u32("interval_days", row.try_get("interval_days").map_err(ser)?)?,
        ease_factor: row.try_get("ease_factor").map_err(ser)?,
        repetitions: i64_to_u32("repetitions", row.try_get("repetitions").map_err(ser)?)?,
        next_review_date: row.try_get("next_review_date").map_err(ser)?,
        last_reviewed_at: row.try_get("last_reviewed_at").map_err(ser)?,
        review_count: i64_to_u32("review_count", row.try_get("review_count").map_err(ser)?)?,
        consecutive_correct: i64_to_u32(
            "consecutive_correct",
            row.try_get("consecutive_correct").map_err(ser)?,
        )?,
        consecutive_incorrect: i64_to_u32(
            "consecutive_incorrect",
            row.try_get("consecutive_incorrect").map_err(ser)?,
        )?,
        version: i64_to_u32("version", row.try_get("version").map_err(ser)?)?,
    })
}

/// Classify a write error: a foreign-key violation means the vocabulary item
/// is missing, anything else is a connection-level failure.
pub(crate) fn write_error(err: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_foreign_key_violation() {
            return StorageError::NotFound;
        }
    }
    StorageError::Connection(err.to_string())
}

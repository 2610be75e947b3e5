use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the versioned schema migrations.
///
/// Version 1 creates vocabulary items, review records (cascading from their
/// item) and the due-date index.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS vocabulary_items (
                    id INTEGER NOT NULL,
                    user_id TEXT NOT NULL,
                    word TEXT NOT NULL,
                    translation TEXT NOT NULL,
                    language TEXT NOT NULL,
                    comprehension_level INTEGER NOT NULL
                        CHECK (comprehension_level BETWEEN 0 AND 5),
                    PRIMARY KEY (user_id, id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS review_records (
                    user_id TEXT NOT NULL,
                    vocabulary_item_id INTEGER NOT NULL,
                    interval_days INTEGER NOT NULL CHECK (interval_days >= 1),
                    ease_factor REAL NOT NULL CHECK (ease_factor >= 1.3),
                    repetitions INTEGER NOT NULL CHECK (repetitions >= 0),
                    next_review_date TEXT,
                    last_reviewed_at TEXT,
                    review_count INTEGER NOT NULL CHECK (review_count >= 0),
                    consecutive_correct INTEGER NOT NULL CHECK (consecutive_correct >= 0),
                    consecutive_incorrect INTEGER NOT NULL CHECK (consecutive_incorrect >= 0),
                    version INTEGER NOT NULL CHECK (version >= 1),
                    PRIMARY KEY (user_id, vocabulary_item_id),
                    FOREIGN KEY (user_id, vocabulary_item_id)
                        REFERENCES vocabulary_items(user_id, id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_review_records_user_next_review
                    ON review_records (user_id, next_review_date);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(version = 1, "applied schema migration");
    }

    Ok(())
}

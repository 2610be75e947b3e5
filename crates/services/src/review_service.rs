use std::sync::Arc;

use srs_core::{
    due::{ItemWithReview, index_records, select_due},
    model::{ReviewQuality, ReviewRecord, UserId, VocabularyItemId},
    scheduler::apply_review,
    time::Clock,
};
use storage::repository::{
    ReviewRecordRepository, Storage, StorageError, VocabularyRepository,
};

use crate::error::ReviewServiceError;

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Orchestrates review-record initialization, recording and due selection
/// against the repository interfaces.
#[derive(Clone)]
pub struct ReviewService {
    clock: Clock,
    vocabulary: Arc<dyn VocabularyRepository>,
    reviews: Arc<dyn ReviewRecordRepository>,
}

impl ReviewService {
    #[must_use]
    pub fn new(
        clock: Clock,
        vocabulary: Arc<dyn VocabularyRepository>,
        reviews: Arc<dyn ReviewRecordRepository>,
    ) -> Self {
        Self {
            clock,
            vocabulary,
            reviews,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, storage: &Storage) -> Self {
        Self::new(
            clock,
            Arc::clone(&storage.vocabulary),
            Arc::clone(&storage.reviews),
        )
    }

    /// Override the clock (useful for deterministic tests).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Ensure a review record exists for the item, creating the default one if
    /// absent. Calling it again returns the stored record unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::UpdateFailed` when the record cannot be
    /// read or written (including a missing vocabulary item).
    pub async fn initialize_review(
        &self,
        user_id: UserId,
        vocabulary_item_id: VocabularyItemId,
    ) -> Result<ReviewRecord, ReviewServiceError> {
        if let Some(existing) = self.load(user_id, vocabulary_item_id).await? {
            return Ok(existing);
        }

        let initial = ReviewRecord::initial(vocabulary_item_id, user_id, self.clock.now());
        match self.reviews.upsert_review_record(&initial).await {
            Ok(stored) => {
                tracing::debug!(
                    user_id = %user_id,
                    vocabulary_item_id = %vocabulary_item_id,
                    "review record initialized"
                );
                Ok(stored)
            }
            // lost a race with another initializer; theirs is equivalent
            Err(StorageError::Conflict) => self
                .load(user_id, vocabulary_item_id)
                .await?
                .ok_or(ReviewServiceError::UpdateFailed(StorageError::Conflict)),
            Err(err) => Err(update_failed(user_id, vocabulary_item_id, err)),
        }
    }

    /// Record a rating for the item and persist the rescheduled record.
    ///
    /// The quality is validated before anything is read or written. A missing
    /// record is initialized first.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::InvalidQuality` for values outside {0, 1, 3, 4}.
    /// Returns `ReviewServiceError::UpdateFailed` for any persistence failure.
    pub async fn record_review(
        &self,
        user_id: UserId,
        vocabulary_item_id: VocabularyItemId,
        quality: u8,
    ) -> Result<ReviewRecord, ReviewServiceError> {
        let quality = ReviewQuality::from_u8(quality)?;
        self.record_review_quality(user_id, vocabulary_item_id, quality)
            .await
    }

    /// Same as [`ReviewService::record_review`] with an already validated quality.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::UpdateFailed` for any persistence failure.
    pub async fn record_review_quality(
        &self,
        user_id: UserId,
        vocabulary_item_id: VocabularyItemId,
        quality: ReviewQuality,
    ) -> Result<ReviewRecord, ReviewServiceError> {
        let current = self.initialize_review(user_id, vocabulary_item_id).await?;
        let updated = apply_review(&current, quality, self.clock.now());

        let stored = self
            .persist(&updated)
            .await
            .map_err(|err| update_failed(user_id, vocabulary_item_id, err))?;

        tracing::debug!(
            user_id = %user_id,
            vocabulary_item_id = %vocabulary_item_id,
            quality = quality.value(),
            interval_days = stored.interval_days,
            "review recorded"
        );
        Ok(stored)
    }

    /// Items due for review, ordered never-scheduled first then by ascending
    /// next review date, truncated to `limit` when given.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::Storage` if either listing fails.
    pub async fn get_due_words(
        &self,
        user_id: UserId,
        limit: Option<usize>,
    ) -> Result<Vec<ItemWithReview>, ReviewServiceError> {
        let now = self.clock.now();
        let log_failure =
            |err: &StorageError| tracing::warn!(user_id = %user_id, error = %err, "due selection failed");
        let items = self
            .vocabulary
            .list_vocabulary_items(user_id)
            .await
            .inspect_err(log_failure)?;
        let records = self
            .reviews
            .list_review_records(user_id)
            .await
            .inspect_err(log_failure)?;

        let mut due = select_due(&items, &index_records(records), now);
        if let Some(limit) = limit {
            due.truncate(limit);
        }
        Ok(due)
    }

    /// Number of items currently due.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::Storage` if either listing fails.
    pub async fn get_due_words_count(&self, user_id: UserId) -> Result<usize, ReviewServiceError> {
        Ok(self.get_due_words(user_id, None).await?.len())
    }

    pub(crate) async fn persist(&self, record: &ReviewRecord) -> Result<ReviewRecord, StorageError> {
        self.reviews.upsert_review_record(record).await
    }

    async fn load(
        &self,
        user_id: UserId,
        vocabulary_item_id: VocabularyItemId,
    ) -> Result<Option<ReviewRecord>, ReviewServiceError> {
        self.reviews
            .get_review_record(vocabulary_item_id, user_id)
            .await
            .map_err(|err| update_failed(user_id, vocabulary_item_id, err))
    }
}

fn update_failed(
    user_id: UserId,
    vocabulary_item_id: VocabularyItemId,
    err: StorageError,
) -> ReviewServiceError {
    tracing::warn!(
        user_id = %user_id,
        vocabulary_item_id = %vocabulary_item_id,
        error = %err,
        "review record update failed"
    );
    ReviewServiceError::UpdateFailed(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use srs_core::model::{ComprehensionLevel, VocabularyItem};
    use srs_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    fn build_item(id: u64, user: UserId, word: &str) -> VocabularyItem {
        VocabularyItem::new(
            VocabularyItemId::new(id),
            user,
            word,
            "translation",
            "es",
            ComprehensionLevel::default(),
        )
        .unwrap()
    }

    fn service(repo: &InMemoryRepository, clock: Clock) -> ReviewService {
        ReviewService::new(clock, Arc::new(repo.clone()), Arc::new(repo.clone()))
    }

    #[tokio::test]
    async fn initialize_review_is_idempotent() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let item = build_item(1, user, "gato");
        repo.upsert_vocabulary_item(&item).await.unwrap();

        let svc = service(&repo, Clock::fixed(fixed_now()));
        let first = svc.initialize_review(user, item.id()).await.unwrap();
        assert_eq!(first.version, 1);
        assert_eq!(first.next_review_date, Some(fixed_now() + Duration::days(1)));

        let later = svc.with_clock(Clock::fixed(fixed_now() + Duration::days(3)));
        let second = later.initialize_review(user, item.id()).await.unwrap();
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn initialize_review_for_missing_item_fails() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo, Clock::fixed(fixed_now()));

        let err = svc
            .initialize_review(UserId::random(), VocabularyItemId::new(9))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReviewServiceError::UpdateFailed(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn record_review_rejects_invalid_quality_without_writing() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let item = build_item(1, user, "gato");
        repo.upsert_vocabulary_item(&item).await.unwrap();
        let svc = service(&repo, Clock::fixed(fixed_now()));

        for bad in [2, 5, 200] {
            let err = svc.record_review(user, item.id(), bad).await.unwrap_err();
            assert!(matches!(err, ReviewServiceError::InvalidQuality(_)));
        }
        assert!(
            repo.get_review_record(item.id(), user)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn record_review_initializes_then_schedules() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let item = build_item(1, user, "gato");
        repo.upsert_vocabulary_item(&item).await.unwrap();
        let now = fixed_now();
        let svc = service(&repo, Clock::fixed(now));

        let first = svc.record_review(user, item.id(), 3).await.unwrap();
        assert_eq!(first.interval_days, 1);
        assert_eq!(first.repetitions, 1);
        assert_eq!(first.review_count, 1);
        assert_eq!(first.last_reviewed_at, Some(now));
        assert_eq!(first.next_review_date, Some(now + Duration::days(1)));
        // initialized at version 1, then updated
        assert_eq!(first.version, 2);

        let second = svc.record_review(user, item.id(), 4).await.unwrap();
        assert_eq!(second.interval_days, 6);
        assert_eq!(second.repetitions, 2);
        assert_eq!(second.consecutive_correct, 2);

        let failed = svc.record_review(user, item.id(), 0).await.unwrap();
        assert_eq!(failed.interval_days, 1);
        assert_eq!(failed.repetitions, 0);
        assert_eq!(failed.consecutive_correct, 0);
        assert_eq!(failed.consecutive_incorrect, 1);
        assert_eq!(failed.review_count, 3);
    }

    #[tokio::test]
    async fn due_words_are_ordered_and_limited() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let now = fixed_now();

        for (id, word) in [(1, "uno"), (2, "dos"), (3, "tres"), (4, "cuatro")] {
            repo.upsert_vocabulary_item(&build_item(id, user, word))
                .await
                .unwrap();
        }

        let mut overdue = ReviewRecord::initial(VocabularyItemId::new(2), user, now);
        overdue.next_review_date = Some(now - Duration::days(2));
        repo.upsert_review_record(&overdue).await.unwrap();

        let mut future = ReviewRecord::initial(VocabularyItemId::new(3), user, now);
        future.next_review_date = Some(now + Duration::days(5));
        repo.upsert_review_record(&future).await.unwrap();

        let mut unscheduled = ReviewRecord::initial(VocabularyItemId::new(4), user, now);
        unscheduled.next_review_date = None;
        repo.upsert_review_record(&unscheduled).await.unwrap();

        let svc = service(&repo, Clock::fixed(now));
        let due = svc.get_due_words(user, None).await.unwrap();
        let ids: Vec<_> = due.iter().map(|d| d.item.id().value()).collect();
        // item 1 has no record; item 4 has no date; both come before the overdue one
        assert_eq!(ids, vec![1, 4, 2]);
        assert!(due.iter().all(|d| d.is_due_for_review));

        // limit applies to the sorted list, not to storage order
        let limited = svc.get_due_words(user, Some(2)).await.unwrap();
        let ids: Vec<_> = limited.iter().map(|d| d.item.id().value()).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(svc.get_due_words_count(user).await.unwrap(), 3);
        assert!(
            svc.get_due_words(UserId::random(), None)
                .await
                .unwrap()
                .is_empty()
        );
    }
}

use async_trait::async_trait;
use srs_core::model::{ReviewRecord, UserId, VocabularyItem, VocabularyItemId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for a user's vocabulary.
#[async_trait]
pub trait VocabularyRepository: Send + Sync {
    /// Persist or update a vocabulary item.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the item cannot be stored.
    async fn upsert_vocabulary_item(&self, item: &VocabularyItem) -> Result<(), StorageError>;

    /// Fetch a single item owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures. A missing item is `Ok(None)`.
    async fn get_vocabulary_item(
        &self,
        user_id: UserId,
        id: VocabularyItemId,
    ) -> Result<Option<VocabularyItem>, StorageError>;

    /// List every item owned by `user_id`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_vocabulary_items(
        &self,
        user_id: UserId,
    ) -> Result<Vec<VocabularyItem>, StorageError>;

    /// Delete an item and, with it, the user's review record for that item.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the item does not exist.
    async fn delete_vocabulary_item(
        &self,
        user_id: UserId,
        id: VocabularyItemId,
    ) -> Result<(), StorageError>;
}

/// Repository contract for per-(item, user) scheduling records.
#[async_trait]
pub trait ReviewRecordRepository: Send + Sync {
    /// Fetch the record for an item. Absence is `Ok(None)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_review_record(
        &self,
        vocabulary_item_id: VocabularyItemId,
        user_id: UserId,
    ) -> Result<Option<ReviewRecord>, StorageError>;

    /// Insert or update a record and return it as stored.
    ///
    /// The write is accepted only when `record.version` equals the stored
    /// version (0 for a record that does not exist yet). The returned record
    /// carries the bumped version.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` on a version mismatch,
    /// `StorageError::NotFound` if the vocabulary item does not exist, or
    /// other storage errors.
    async fn upsert_review_record(&self, record: &ReviewRecord)
    -> Result<ReviewRecord, StorageError>;

    /// List all records for a user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_review_records(&self, user_id: UserId)
    -> Result<Vec<ReviewRecord>, StorageError>;
}

type Key = (UserId, VocabularyItemId);

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    items: Arc<Mutex<HashMap<Key, VocabularyItem>>>,
    records: Arc<Mutex<HashMap<Key, ReviewRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VocabularyRepository for InMemoryRepository {
    async fn upsert_vocabulary_item(&self, item: &VocabularyItem) -> Result<(), StorageError> {
        let mut guard = self
            .items
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert((item.user_id(), item.id()), item.clone());
        Ok(())
    }

    async fn get_vocabulary_item(
        &self,
        user_id: UserId,
        id: VocabularyItemId,
    ) -> Result<Option<VocabularyItem>, StorageError> {
        let guard = self
            .items
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&(user_id, id)).cloned())
    }

    async fn list_vocabulary_items(
        &self,
        user_id: UserId,
    ) -> Result<Vec<VocabularyItem>, StorageError> {
        let guard = self
            .items
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut items: Vec<VocabularyItem> = guard
            .values()
            .filter(|item| item.user_id() == user_id)
            .cloned()
            .collect();
        items.sort_by_key(VocabularyItem::id);
        Ok(items)
    }

    async fn delete_vocabulary_item(
        &self,
        user_id: UserId,
        id: VocabularyItemId,
    ) -> Result<(), StorageError> {
        // Lock order: items, then records (matches upsert_review_record).
        let mut items = self
            .items
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut records = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        items.remove(&(user_id, id)).ok_or(StorageError::NotFound)?;
        records.remove(&(user_id, id));
        Ok(())
    }
}

#[async_trait]
impl ReviewRecordRepository for InMemoryRepository {
    async fn get_review_record(
        &self,
        vocabulary_item_id: VocabularyItemId,
        user_id: UserId,
    ) -> Result<Option<ReviewRecord>, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&(user_id, vocabulary_item_id)).cloned())
    }

    async fn upsert_review_record(
        &self,
        record: &ReviewRecord,
    ) -> Result<ReviewRecord, StorageError> {
        let key = (record.user_id, record.vocabulary_item_id);
        let items = self
            .items
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if !items.contains_key(&key) {
            return Err(StorageError::NotFound);
        }

        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let stored_version = guard.get(&key).map_or(0, |r| r.version);
        if stored_version != record.version {
            return Err(StorageError::Conflict);
        }

        let mut stored = record.clone();
        stored.version = record.version.saturating_add(1);
        guard.insert(key, stored.clone());
        Ok(stored)
    }

    async fn list_review_records(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ReviewRecord>, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut records: Vec<ReviewRecord> = guard
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.vocabulary_item_id);
        Ok(records)
    }
}

/// Aggregates vocabulary and review repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub vocabulary: Arc<dyn VocabularyRepository>,
    pub reviews: Arc<dyn ReviewRecordRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let vocabulary: Arc<dyn VocabularyRepository> = Arc::new(repo.clone());
        let reviews: Arc<dyn ReviewRecordRepository> = Arc::new(repo);
        Self {
            vocabulary,
            reviews,
        }
    }
}

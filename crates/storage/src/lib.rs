#![forbid(unsafe_code)]

pub mod config;
pub mod repository;
pub mod sqlite;

pub use config::StorageConfig;
pub use repository::{
    InMemoryRepository, ReviewRecordRepository, Storage, StorageError, VocabularyRepository,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{UserId, VocabularyItemId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum VocabularyError {
    #[error("word cannot be empty")]
    EmptyWord,

    #[error("language cannot be empty")]
    EmptyLanguage,

    #[error("comprehension level must be between 0 and 5, got {0}")]
    InvalidComprehensionLevel(u8),
}

//
// ─── COMPREHENSION LEVEL ───────────────────────────────────────────────────────
//

/// User-set "how well I know this" tag (0–5).
///
/// Purely informational: the scheduler never reads or writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ComprehensionLevel(u8);

impl ComprehensionLevel {
    pub const MAX: u8 = 5;

    /// # Errors
    ///
    /// Returns `VocabularyError::InvalidComprehensionLevel` for values above 5.
    pub fn new(level: u8) -> Result<Self, VocabularyError> {
        if level > Self::MAX {
            return Err(VocabularyError::InvalidComprehensionLevel(level));
        }
        Ok(Self(level))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

//
// ─── VOCABULARY ITEM ───────────────────────────────────────────────────────────
//

/// A word the learner has added, owned by a single user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyItem {
    id: VocabularyItemId,
    user_id: UserId,
    word: String,
    translation: String,
    language: String,
    comprehension_level: ComprehensionLevel,
}

impl VocabularyItem {
    /// Create a validated vocabulary item.
    ///
    /// Word and language are trimmed; the translation may be empty (the
    /// learner may fill it in later).
    ///
    /// # Errors
    ///
    /// Returns `VocabularyError` if the word or language is blank.
    pub fn new(
        id: VocabularyItemId,
        user_id: UserId,
        word: impl Into<String>,
        translation: impl Into<String>,
        language: impl Into<String>,
        comprehension_level: ComprehensionLevel,
    ) -> Result<Self, VocabularyError> {
        let word = normalize(word.into()).ok_or(VocabularyError::EmptyWord)?;
        let language = normalize(language.into()).ok_or(VocabularyError::EmptyLanguage)?;
        let translation = translation.into().trim().to_string();

        Ok(Self {
            id,
            user_id,
            word,
            translation,
            language,
            comprehension_level,
        })
    }

    /// Rehydrate an item from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `VocabularyError` if the stored row violates item invariants.
    pub fn from_persisted(
        id: VocabularyItemId,
        user_id: UserId,
        word: String,
        translation: String,
        language: String,
        comprehension_level: u8,
    ) -> Result<Self, VocabularyError> {
        let level = ComprehensionLevel::new(comprehension_level)?;
        Self::new(id, user_id, word, translation, language, level)
    }

    #[must_use]
    pub fn id(&self) -> VocabularyItemId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }

    #[must_use]
    pub fn translation(&self) -> &str {
        &self.translation
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    #[must_use]
    pub fn comprehension_level(&self) -> ComprehensionLevel {
        self.comprehension_level
    }

    pub fn set_comprehension_level(&mut self, level: ComprehensionLevel) {
        self.comprehension_level = level;
    }

    /// # Errors
    ///
    /// Returns `VocabularyError::EmptyWord` if the new word is blank.
    pub fn rename(&mut self, word: impl Into<String>) -> Result<(), VocabularyError> {
        self.word = normalize(word.into()).ok_or(VocabularyError::EmptyWord)?;
        Ok(())
    }

    pub fn set_translation(&mut self, translation: impl Into<String>) {
        self.translation = translation.into().trim().to_string();
    }
}

fn normalize(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

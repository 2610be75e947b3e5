use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{UserId, VocabularyItemId};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur during review operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("invalid review quality: {0} (expected 0, 1, 3 or 4)")]
    InvalidQuality(u8),
}

//
// ─── REVIEW QUALITY ───────────────────────────────────────────────────────────
//

/// Four-button recall rating.
///
/// The buttons map onto the SM-2 0–5 scale as 0/1/3/4. Quality 2 is never
/// produced by any button and is rejected by [`ReviewQuality::from_u8`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewQuality {
    /// Failed to recall.
    Again,
    /// Recalled only partially; still counts as a failure.
    Hard,
    /// Recalled correctly.
    Good,
    /// Recalled instantly.
    Easy,
}

impl ReviewQuality {
    /// All buttons in display order.
    pub const ALL: [ReviewQuality; 4] = [
        ReviewQuality::Again,
        ReviewQuality::Hard,
        ReviewQuality::Good,
        ReviewQuality::Easy,
    ];

    /// Lowest SM-2 quality that counts as a successful recall.
    pub const PASS_THRESHOLD: u8 = 3;

    /// Converts a raw SM-2 quality value into a button rating.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidQuality` for anything outside `{0, 1, 3, 4}`.
    pub fn from_u8(value: u8) -> Result<Self, ReviewError> {
        match value {
            0 => Ok(Self::Again),
            1 => Ok(Self::Hard),
            3 => Ok(Self::Good),
            4 => Ok(Self::Easy),
            _ => Err(ReviewError::InvalidQuality(value)),
        }
    }

    /// The SM-2 quality value fed to the calculator.
    #[must_use]
    pub fn value(self) -> u8 {
        match self {
            ReviewQuality::Again => 0,
            ReviewQuality::Hard => 1,
            ReviewQuality::Good => 3,
            ReviewQuality::Easy => 4,
        }
    }

    #[must_use]
    pub fn is_pass(self) -> bool {
        self.value() >= Self::PASS_THRESHOLD
    }
}

impl TryFrom<u8> for ReviewQuality {
    type Error = ReviewError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value)
    }
}

//
// ─── SCHEDULING STATE ─────────────────────────────────────────────────────────
//

/// The three SM-2 values the calculator reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulingState {
    pub interval_days: u32,
    pub ease_factor: f64,
    pub repetitions: u32,
}

impl SchedulingState {
    pub const INITIAL_INTERVAL_DAYS: u32 = 1;
    pub const INITIAL_EASE_FACTOR: f64 = 2.5;
    pub const MIN_EASE_FACTOR: f64 = 1.3;

    #[must_use]
    pub fn new(interval_days: u32, ease_factor: f64, repetitions: u32) -> Self {
        Self {
            interval_days,
            ease_factor,
            repetitions,
        }
    }
}

impl Default for SchedulingState {
    fn default() -> Self {
        Self::new(Self::INITIAL_INTERVAL_DAYS, Self::INITIAL_EASE_FACTOR, 0)
    }
}

//
// ─── REVIEW RECORD ────────────────────────────────────────────────────────────
//

/// Persisted scheduling record, one per (vocabulary item, user).
///
/// `version` is an optimistic-concurrency stamp: repositories only accept an
/// upsert whose version matches the stored one, then bump it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub vocabulary_item_id: VocabularyItemId,
    pub user_id: UserId,
    pub interval_days: u32,
    pub ease_factor: f64,
    pub repetitions: u32,
    pub next_review_date: Option<DateTime<Utc>>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub review_count: u32,
    pub consecutive_correct: u32,
    pub consecutive_incorrect: u32,
    pub version: u32,
}

impl ReviewRecord {
    /// Fresh record for an item that has never been scheduled.
    ///
    /// First review is due one day after initialization.
    #[must_use]
    pub fn initial(
        vocabulary_item_id: VocabularyItemId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        let state = SchedulingState::default();
        Self {
            vocabulary_item_id,
            user_id,
            interval_days: state.interval_days,
            ease_factor: state.ease_factor,
            repetitions: state.repetitions,
            next_review_date: Some(now + Duration::days(i64::from(state.interval_days))),
            last_reviewed_at: None,
            review_count: 0,
            consecutive_correct: 0,
            consecutive_incorrect: 0,
            version: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> SchedulingState {
        SchedulingState::new(self.interval_days, self.ease_factor, self.repetitions)
    }

    /// A record is due when undated or dated at/before `now`.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.next_review_date {
            None => true,
            Some(next) => next <= now,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

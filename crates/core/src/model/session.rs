use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ReviewQuality, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("too many ratings for a single session: {len}")]
    TooManyRatings { len: usize },
}

/// Aggregate summary for a completed review session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    user_id: UserId,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    total: u32,
    correct_count: u32,
    incorrect_count: u32,
}

impl SessionSummary {
    /// Build a summary from the ratings given during a session.
    ///
    /// A rating counts as correct when it passes (quality ≥ 3).
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if `completed_at` is before `started_at`.
    /// Returns `SessionSummaryError::TooManyRatings` if the count cannot fit in `u32`.
    pub fn from_ratings(
        user_id: UserId,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        ratings: &[ReviewQuality],
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }

        let total = u32::try_from(ratings.len())
            .map_err(|_| SessionSummaryError::TooManyRatings { len: ratings.len() })?;

        let mut correct_count = 0_u32;
        let mut incorrect_count = 0_u32;
        for quality in ratings {
            if quality.is_pass() {
                correct_count = correct_count.saturating_add(1);
            } else {
                incorrect_count = incorrect_count.saturating_add(1);
            }
        }

        Ok(Self {
            user_id,
            started_at,
            completed_at,
            total,
            correct_count,
            incorrect_count,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn incorrect_count(&self) -> u32 {
        self.incorrect_count
    }

    /// Whole seconds between session start and completion.
    #[must_use]
    pub fn elapsed_seconds(&self) -> i64 {
        self.completed_at
            .signed_duration_since(self.started_at)
            .num_seconds()
    }
}

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use srs_core::model::{
    ReviewQuality, ReviewRecord, SessionSummary, UserId, VocabularyItemId,
};
use storage::repository::{ReviewRecordRepository, VocabularyRepository};

use super::service::{ReviewSession, SessionReview};
use crate::Clock;
use crate::error::{ReviewServiceError, SessionError};
use crate::review_service::ReviewService;

/// A rating whose rescheduled record could not be written.
///
/// The session still advanced; the rating for this item is lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistenceWarning {
    pub vocabulary_item_id: VocabularyItemId,
    pub reason: String,
}

impl fmt::Display for PersistenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "review for item {} was not saved: {}",
            self.vocabulary_item_id, self.reason
        )
    }
}

/// Result of answering a single item in a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionAnswerResult {
    pub review: SessionReview,
    pub warning: Option<PersistenceWarning>,
    pub is_complete: bool,
    pub summary: Option<SessionSummary>,
}

/// Orchestrates session start and persisted answering.
#[derive(Clone)]
pub struct SessionLoopService {
    reviews: ReviewService,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        vocabulary: Arc<dyn VocabularyRepository>,
        reviews: Arc<dyn ReviewRecordRepository>,
    ) -> Self {
        Self {
            reviews: ReviewService::new(clock, vocabulary, reviews),
        }
    }

    #[must_use]
    pub fn from_review_service(reviews: ReviewService) -> Self {
        Self { reviews }
    }

    /// Snapshot the user's due items and show the first one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if nothing is due.
    /// Returns `SessionError::Review` if the due set cannot be read.
    pub async fn start_session(&self, user_id: UserId) -> Result<ReviewSession, SessionError> {
        let due = self.reviews.get_due_words(user_id, None).await?;
        let mut session = ReviewSession::new(user_id, due, self.reviews.clock().now())?;
        session.start()?;

        tracing::debug!(
            user_id = %user_id,
            total = session.progress().total,
            "review session started"
        );
        Ok(session)
    }

    /// Rate the revealed item, write its new record and advance.
    ///
    /// A failed write does not fail the call: it is logged and reported as
    /// `SessionAnswerResult::warning`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Review` for a quality outside {0, 1, 3, 4}.
    /// Returns `SessionError::InvalidTransition` if the item was not revealed.
    /// Returns `SessionError::Completed` if the session is already finished.
    pub async fn answer_current(
        &self,
        session: &mut ReviewSession,
        quality: u8,
    ) -> Result<SessionAnswerResult, SessionError> {
        let quality = ReviewQuality::from_u8(quality).map_err(ReviewServiceError::from)?;
        let pending = session.rate(quality, self.reviews.clock().now())?;

        let (stored, warning) = match self.reviews.persist(&pending.record).await {
            Ok(stored) => (Some(stored), None),
            Err(err) => {
                tracing::warn!(
                    user_id = %session.user_id(),
                    vocabulary_item_id = %pending.vocabulary_item_id,
                    error = %err,
                    "review not persisted; advancing session"
                );
                let warning = PersistenceWarning {
                    vocabulary_item_id: pending.vocabulary_item_id,
                    reason: err.to_string(),
                };
                (None, Some(warning))
            }
        };

        let review = session
            .finish_persist(stored, self.reviews.clock().now())?
            .clone();

        if let Some(summary) = session.summary() {
            tracing::info!(
                user_id = %summary.user_id(),
                total = summary.total(),
                correct = summary.correct_count(),
                incorrect = summary.incorrect_count(),
                elapsed_seconds = summary.elapsed_seconds(),
                "review session complete"
            );
        }

        Ok(SessionAnswerResult {
            review,
            warning,
            is_complete: session.is_complete(),
            summary: session.summary().cloned(),
        })
    }

    /// Drop an unfinished session, returning the records it already wrote.
    #[must_use]
    pub fn abandon(&self, session: ReviewSession) -> Vec<ReviewRecord> {
        let progress = session.progress();
        tracing::debug!(
            user_id = %session.user_id(),
            answered = progress.answered,
            remaining = progress.remaining,
            "review session abandoned"
        );
        session
            .results()
            .iter()
            .filter(|r| r.persisted)
            .map(|r| r.record.clone())
            .collect()
    }
}

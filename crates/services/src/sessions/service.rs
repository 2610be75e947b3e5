use chrono::{DateTime, Utc};
use serde::Serialize;
use srs_core::{
    due::ItemWithReview,
    model::{ReviewQuality, ReviewRecord, SessionSummary, UserId, VocabularyItemId},
    scheduler::{apply_review, preview_intervals},
};

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── STATES ────────────────────────────────────────────────────────────────────
//

/// Which side of the current item is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardFace {
    Front,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "face", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Presenting(CardFace),
    /// A rating was taken; the rescheduled record awaits its write.
    Persisting,
    Complete,
}

//
// ─── REVIEW RESULTS ────────────────────────────────────────────────────────────
//

/// Rescheduled record produced by a rating, waiting to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReview {
    pub vocabulary_item_id: VocabularyItemId,
    pub quality: ReviewQuality,
    pub record: ReviewRecord,
}

/// Outcome of one rated item within a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReview {
    pub vocabulary_item_id: VocabularyItemId,
    pub quality: ReviewQuality,
    /// The stored record on success, otherwise the computed one that was lost.
    pub record: ReviewRecord,
    pub persisted: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Review session over a due-set snapshot.
///
/// The queue is fixed at construction: items that become due later, or items
/// rescheduled during the session, are never added.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    user_id: UserId,
    queue: Vec<ItemWithReview>,
    current: usize,
    state: SessionState,
    pending: Option<PendingReview>,
    results: Vec<SessionReview>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    summary: Option<SessionSummary>,
}

impl ReviewSession {
    /// Create an idle session over the given due items.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if nothing is due.
    pub fn new(
        user_id: UserId,
        queue: Vec<ItemWithReview>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if queue.is_empty() {
            return Err(SessionError::Empty);
        }

        Ok(Self {
            user_id,
            queue,
            current: 0,
            state: SessionState::Idle,
            pending: None,
            results: Vec::new(),
            started_at,
            completed_at: None,
            summary: None,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn results(&self) -> &[SessionReview] {
        &self.results
    }

    #[must_use]
    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }

    /// Number of items not yet rated.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len().saturating_sub(self.results.len())
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.queue.len(),
            answered: self.results.len(),
            remaining: self.remaining(),
            is_complete: self.is_complete(),
        }
    }

    /// The item being shown, if the session is presenting or persisting.
    #[must_use]
    pub fn current_item(&self) -> Option<&ItemWithReview> {
        match self.state {
            SessionState::Presenting(_) | SessionState::Persisting => self.queue.get(self.current),
            SessionState::Idle | SessionState::Complete => None,
        }
    }

    /// Intervals each rating would give the current item, in `ReviewQuality::ALL` order.
    #[must_use]
    pub fn current_preview(&self) -> Option<[u32; 4]> {
        let item = self.current_item()?;
        let state = item
            .review
            .as_ref()
            .map(ReviewRecord::state)
            .unwrap_or_default();
        Some(preview_intervals(&state))
    }

    /// Show the front of the first item.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is idle.
    pub fn start(&mut self) -> Result<&ItemWithReview, SessionError> {
        self.transition(SessionState::Idle, "start")?;
        self.state = SessionState::Presenting(CardFace::Front);
        self.queue.get(self.current).ok_or(SessionError::Completed)
    }

    /// Flip the current item to its back face.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the front face is shown.
    pub fn reveal(&mut self) -> Result<&ItemWithReview, SessionError> {
        self.transition(SessionState::Presenting(CardFace::Front), "reveal")?;
        self.state = SessionState::Presenting(CardFace::Back);
        self.queue.get(self.current).ok_or(SessionError::Completed)
    }

    /// Rate the revealed item and compute its rescheduled record.
    ///
    /// The session moves to `Persisting` until [`ReviewSession::finish_persist`]
    /// is called with the write outcome.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the back face is shown.
    pub fn rate(
        &mut self,
        quality: ReviewQuality,
        reviewed_at: DateTime<Utc>,
    ) -> Result<PendingReview, SessionError> {
        self.transition(SessionState::Presenting(CardFace::Back), "rate")?;
        let item = self.queue.get(self.current).ok_or(SessionError::Completed)?;

        let current = item.review.clone().unwrap_or_else(|| {
            ReviewRecord::initial(item.item.id(), self.user_id, reviewed_at)
        });
        let pending = PendingReview {
            vocabulary_item_id: item.item.id(),
            quality,
            record: apply_review(&current, quality, reviewed_at),
        };

        self.pending = Some(pending.clone());
        self.state = SessionState::Persisting;
        Ok(pending)
    }

    /// Close the pending write and advance, whether or not it succeeded.
    ///
    /// `stored` carries the repository's copy on success and `None` on failure.
    /// `now` stamps completion when this was the last item; a `now` earlier
    /// than the session start (clock stepped back) completes at the start.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless a rating is pending.
    /// Returns `SessionError::Summary` if the ratings cannot be summarized; the
    /// session is left unchanged in that case.
    pub fn finish_persist(
        &mut self,
        stored: Option<ReviewRecord>,
        now: DateTime<Utc>,
    ) -> Result<&SessionReview, SessionError> {
        self.transition(SessionState::Persisting, "finish persisting")?;
        let Some(quality) = self.pending.as_ref().map(|p| p.quality) else {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                action: "finish persisting",
            });
        };

        // build the summary before touching any state
        let completion = if self.current + 1 >= self.queue.len() {
            let completed_at = now.max(self.started_at);
            let ratings: Vec<ReviewQuality> = self
                .results
                .iter()
                .map(|r| r.quality)
                .chain(std::iter::once(quality))
                .collect();
            let summary =
                SessionSummary::from_ratings(self.user_id, self.started_at, completed_at, &ratings)?;
            Some((summary, completed_at))
        } else {
            None
        };

        let Some(pending) = self.pending.take() else {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                action: "finish persisting",
            });
        };
        let persisted = stored.is_some();
        self.results.push(SessionReview {
            vocabulary_item_id: pending.vocabulary_item_id,
            quality: pending.quality,
            record: stored.unwrap_or(pending.record),
            persisted,
        });

        self.current += 1;
        match completion {
            Some((summary, completed_at)) => {
                self.summary = Some(summary);
                self.completed_at = Some(completed_at);
                self.state = SessionState::Complete;
            }
            None => self.state = SessionState::Presenting(CardFace::Front),
        }

        self.results.last().ok_or(SessionError::Completed)
    }

    fn transition(&self, expected: SessionState, action: &'static str) -> Result<(), SessionError> {
        if self.state == expected {
            return Ok(());
        }
        if self.state == SessionState::Complete {
            return Err(SessionError::Completed);
        }
        Err(SessionError::InvalidTransition {
            from: self.state,
            action,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use srs_core::model::{ComprehensionLevel, VocabularyItem};
    use srs_core::time::fixed_now;

    fn due_item(id: u64, user: UserId, review: Option<ReviewRecord>) -> ItemWithReview {
        let item = VocabularyItem::new(
            VocabularyItemId::new(id),
            user,
            format!("word{id}"),
            "translation",
            "fr",
            ComprehensionLevel::default(),
        )
        .unwrap();
        ItemWithReview {
            item,
            review,
            is_due_for_review: true,
            days_until_review: 0,
        }
    }

    fn queue(user: UserId, len: u64) -> Vec<ItemWithReview> {
        (1..=len).map(|id| due_item(id, user, None)).collect()
    }

    fn answer(
        session: &mut ReviewSession,
        quality: ReviewQuality,
        at: DateTime<Utc>,
    ) -> SessionReview {
        session.reveal().unwrap();
        let pending = session.rate(quality, at).unwrap();
        let mut stored = pending.record.clone();
        stored.version += 1;
        session.finish_persist(Some(stored), at).unwrap().clone()
    }

    #[test]
    fn empty_queue_is_rejected() {
        let err = ReviewSession::new(UserId::random(), Vec::new(), fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::Empty));
    }

    #[test]
    fn scripted_ratings_produce_summary() {
        let user = UserId::random();
        let start = fixed_now();
        let mut session = ReviewSession::new(user, queue(user, 4), start).unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.current_item().is_none());

        session.start().unwrap();
        let ratings = [
            ReviewQuality::Again,
            ReviewQuality::Good,
            ReviewQuality::Easy,
            ReviewQuality::Hard,
        ];
        for (step, quality) in ratings.into_iter().enumerate() {
            let at = start + Duration::seconds(30 * (i64::try_from(step).unwrap() + 1));
            answer(&mut session, quality, at);
        }

        assert!(session.is_complete());
        assert!(session.current_item().is_none());
        let summary = session.summary().expect("summary");
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.correct_count(), 2);
        assert_eq!(summary.incorrect_count(), 2);
        assert_eq!(summary.elapsed_seconds(), 120);
        assert_eq!(session.completed_at(), Some(start + Duration::seconds(120)));
    }

    #[test]
    fn transitions_follow_front_back_persist_order() {
        let user = UserId::random();
        let mut session = ReviewSession::new(user, queue(user, 2), fixed_now()).unwrap();

        let err = session.reveal().unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                from: SessionState::Idle,
                ..
            }
        ));

        session.start().unwrap();
        assert_eq!(session.state(), SessionState::Presenting(CardFace::Front));
        assert!(session.rate(ReviewQuality::Good, fixed_now()).is_err());

        session.reveal().unwrap();
        assert_eq!(session.state(), SessionState::Presenting(CardFace::Back));
        assert!(session.reveal().is_err());

        session.rate(ReviewQuality::Good, fixed_now()).unwrap();
        assert_eq!(session.state(), SessionState::Persisting);
        assert!(session.rate(ReviewQuality::Good, fixed_now()).is_err());

        session.finish_persist(None, fixed_now()).unwrap();
        assert_eq!(session.state(), SessionState::Presenting(CardFace::Front));
        assert_eq!(
            session.current_item().unwrap().item.id(),
            VocabularyItemId::new(2)
        );
    }

    #[test]
    fn failed_write_still_advances() {
        let user = UserId::random();
        let mut session = ReviewSession::new(user, queue(user, 1), fixed_now()).unwrap();
        session.start().unwrap();
        session.reveal().unwrap();
        let pending = session.rate(ReviewQuality::Easy, fixed_now()).unwrap();

        let review = session.finish_persist(None, fixed_now()).unwrap().clone();
        assert!(!review.persisted);
        assert_eq!(review.record, pending.record);
        assert!(session.is_complete());
        assert!(matches!(session.start(), Err(SessionError::Completed)));
        assert!(matches!(session.reveal(), Err(SessionError::Completed)));
    }

    #[test]
    fn completion_before_start_is_clamped_to_start() {
        let user = UserId::random();
        let start = fixed_now();
        let mut session = ReviewSession::new(user, queue(user, 1), start).unwrap();
        session.start().unwrap();
        session.reveal().unwrap();
        let pending = session.rate(ReviewQuality::Good, start).unwrap();

        let review = session
            .finish_persist(Some(pending.record), start - Duration::seconds(1))
            .unwrap()
            .clone();

        assert!(review.persisted);
        assert!(session.is_complete());
        assert_eq!(session.completed_at(), Some(start));
        let summary = session.summary().expect("summary");
        assert_eq!(summary.total(), 1);
        assert_eq!(summary.elapsed_seconds(), 0);
    }

    #[test]
    fn rating_uses_existing_record_and_keeps_version() {
        let user = UserId::random();
        let now = fixed_now();
        let mut existing = ReviewRecord::initial(VocabularyItemId::new(1), user, now);
        existing.repetitions = 1;
        existing.next_review_date = Some(now);
        existing.version = 3;

        let mut session =
            ReviewSession::new(user, vec![due_item(1, user, Some(existing))], now).unwrap();
        session.start().unwrap();
        assert_eq!(session.current_preview(), Some([1, 1, 6, 6]));
        session.reveal().unwrap();
        let pending = session.rate(ReviewQuality::Good, now).unwrap();

        assert_eq!(pending.record.interval_days, 6);
        assert_eq!(pending.record.repetitions, 2);
        assert_eq!(pending.record.version, 3);
        assert_eq!(pending.record.next_review_date, Some(now + Duration::days(6)));
    }

    #[test]
    fn progress_tracks_answers() {
        let user = UserId::random();
        let mut session = ReviewSession::new(user, queue(user, 3), fixed_now()).unwrap();
        session.start().unwrap();
        answer(&mut session, ReviewQuality::Good, fixed_now());

        assert_eq!(
            session.progress(),
            SessionProgress {
                total: 3,
                answered: 1,
                remaining: 2,
                is_complete: false,
            }
        );
    }
}

//! SM-2 scheduling.
//!
//! [`calculate_next_review`] is the pure state transition. [`apply_review`]
//! wraps it with the bookkeeping a persisted [`ReviewRecord`] carries (dates
//! and statistics).

use chrono::{DateTime, Duration, Utc};

use crate::model::{ReviewQuality, ReviewRecord, SchedulingState};

/// Interval used for the first successful review.
const FIRST_PASS_INTERVAL_DAYS: u32 = 1;
/// Interval used for the second consecutive successful review.
const SECOND_PASS_INTERVAL_DAYS: u32 = 6;
const FAIL_EASE_PENALTY: f64 = 0.2;

//
// ─── CALCULATOR ────────────────────────────────────────────────────────────────
//

/// Compute the next SM-2 state for a rating.
///
/// - Fail (`quality < 3`): interval 1, ease −0.2, repetitions reset to 0.
/// - Pass: interval 1, then 6, then `round(interval × ease)`; ease moves by
///   `0.1 − (5−q)(0.08 + (5−q)·0.02)`; repetitions +1.
///
/// Ease never drops below 1.3 and the interval never below 1 day.
///
/// # Examples
///
/// ```
/// # use srs_core::model::{ReviewQuality, SchedulingState};
/// # use srs_core::scheduler::calculate_next_review;
/// let first = calculate_next_review(ReviewQuality::Good, &SchedulingState::default());
/// let second = calculate_next_review(ReviewQuality::Good, &first);
/// assert_eq!(first.interval_days, 1);
/// assert_eq!(second.interval_days, 6);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn calculate_next_review(quality: ReviewQuality, current: &SchedulingState) -> SchedulingState {
    if !quality.is_pass() {
        return SchedulingState {
            interval_days: FIRST_PASS_INTERVAL_DAYS,
            ease_factor: clamp_ease(current.ease_factor - FAIL_EASE_PENALTY),
            repetitions: 0,
        };
    }

    let interval_days = match current.repetitions {
        0 => FIRST_PASS_INTERVAL_DAYS,
        1 => SECOND_PASS_INTERVAL_DAYS,
        _ => {
            let grown = (f64::from(current.interval_days.max(1)) * current.ease_factor).round();
            if grown >= f64::from(u32::MAX) {
                u32::MAX
            } else {
                (grown as u32).max(1)
            }
        }
    };

    SchedulingState {
        interval_days,
        ease_factor: clamp_ease(current.ease_factor + ease_delta(quality)),
        repetitions: current.repetitions.saturating_add(1),
    }
}

fn ease_delta(quality: ReviewQuality) -> f64 {
    let miss = f64::from(5 - quality.value());
    0.1 - miss * (0.08 + miss * 0.02)
}

fn clamp_ease(ease: f64) -> f64 {
    if ease.is_nan() {
        return SchedulingState::MIN_EASE_FACTOR;
    }
    ease.max(SchedulingState::MIN_EASE_FACTOR)
}

//
// ─── RECORD UPDATE ─────────────────────────────────────────────────────────────
//

/// Apply a rating to a stored record and return the updated record.
///
/// Besides the SM-2 state this stamps `last_reviewed_at`, moves
/// `next_review_date` to `reviewed_at + interval_days`, and updates the
/// review statistics. `version` is left untouched; repositories bump it on
/// a successful write.
#[must_use]
pub fn apply_review(
    record: &ReviewRecord,
    quality: ReviewQuality,
    reviewed_at: DateTime<Utc>,
) -> ReviewRecord {
    let next = calculate_next_review(quality, &record.state());
    let passed = quality.is_pass();

    ReviewRecord {
        vocabulary_item_id: record.vocabulary_item_id,
        user_id: record.user_id,
        interval_days: next.interval_days,
        ease_factor: next.ease_factor,
        repetitions: next.repetitions,
        next_review_date: Some(reviewed_at + Duration::days(i64::from(next.interval_days))),
        last_reviewed_at: Some(reviewed_at),
        review_count: record.review_count.saturating_add(1),
        consecutive_correct: if passed {
            record.consecutive_correct.saturating_add(1)
        } else {
            0
        },
        consecutive_incorrect: if passed {
            0
        } else {
            record.consecutive_incorrect.saturating_add(1)
        },
        version: record.version,
    }
}

/// Interval (in days) each button would produce from `state`, in
/// [`ReviewQuality::ALL`] order.
#[must_use]
pub fn preview_intervals(state: &SchedulingState) -> [u32; 4] {
    ReviewQuality::ALL.map(|quality| calculate_next_review(quality, state).interval_days)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

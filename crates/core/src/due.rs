use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ReviewRecord, VocabularyItem, VocabularyItemId};
use crate::time::days_until;

/// A due vocabulary item together with its scheduling record, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemWithReview {
    pub item: VocabularyItem,
    pub review: Option<ReviewRecord>,
    pub is_due_for_review: bool,
    /// Whole days until the scheduled review; negative when overdue, 0 when undated.
    pub days_until_review: i64,
}

impl ItemWithReview {
    #[must_use]
    pub fn next_review_date(&self) -> Option<DateTime<Utc>> {
        self.review.as_ref().and_then(|r| r.next_review_date)
    }
}

/// Select the items due at `now`, most overdue first.
///
/// An item is due when it has no record, its record has no date, or the date
/// is at or before `now`. Undated entries sort first; the rest ascend by
/// `next_review_date`. The sort is stable, so ties keep input order.
#[must_use]
pub fn select_due(
    items: &[VocabularyItem],
    records_by_item: &HashMap<VocabularyItemId, ReviewRecord>,
    now: DateTime<Utc>,
) -> Vec<ItemWithReview> {
    let mut due: Vec<ItemWithReview> = items
        .iter()
        .filter_map(|item| {
            let review = records_by_item.get(&item.id());
            if review.is_some_and(|r| !r.is_due(now)) {
                return None;
            }
            let days_until_review = review
                .and_then(|r| r.next_review_date)
                .map_or(0, |next| days_until(now, next));
            Some(ItemWithReview {
                item: item.clone(),
                review: review.cloned(),
                is_due_for_review: true,
                days_until_review,
            })
        })
        .collect();

    due.sort_by(|a, b| compare_due_dates(a.next_review_date(), b.next_review_date()));
    due
}

/// Index a user's records by vocabulary item.
#[must_use]
pub fn index_records(records: Vec<ReviewRecord>) -> HashMap<VocabularyItemId, ReviewRecord> {
    records
        .into_iter()
        .map(|r| (r.vocabulary_item_id, r))
        .collect()
}

fn compare_due_dates(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.cmp(&b),
    }
}

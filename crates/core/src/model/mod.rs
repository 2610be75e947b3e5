mod ids;
mod review;
mod session;
mod vocabulary;

pub use ids::{ParseIdError, UserId, VocabularyItemId};

pub use review::{ReviewError, ReviewQuality, ReviewRecord, SchedulingState};
pub use session::{SessionSummary, SessionSummaryError};
pub use vocabulary::{ComprehensionLevel, VocabularyError, VocabularyItem};

#![forbid(unsafe_code)]

pub mod error;
pub mod review_service;
pub mod sessions;

pub use srs_core::Clock;

pub use error::{ReviewServiceError, SessionError};
pub use review_service::ReviewService;

pub use sessions::{
    CardFace, PendingReview, PersistenceWarning, ReviewSession, SessionAnswerResult,
    SessionLoopService, SessionProgress, SessionReview, SessionState,
};

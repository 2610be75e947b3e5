mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::SessionProgress;
pub use service::{CardFace, PendingReview, ReviewSession, SessionReview, SessionState};
pub use workflow::{PersistenceWarning, SessionAnswerResult, SessionLoopService};

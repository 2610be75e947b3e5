#![forbid(unsafe_code)]

pub mod due;
pub mod model;
pub mod scheduler;
pub mod time;

pub use due::{ItemWithReview, select_due};
pub use time::Clock;

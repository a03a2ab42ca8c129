pub mod session;

pub use session::{
    is_allowed_duration, SessionRecord, ALLOWED_DURATIONS_MINUTES, DEFAULT_DURATION_MINUTES,
};

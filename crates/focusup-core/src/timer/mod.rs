mod engine;

pub use engine::{FocusTimer, TimerState, DEFAULT_DURATION_SECS};

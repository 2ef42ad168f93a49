//! Monotonic microsecond clock for scheduling, plus wall-clock formatting
//! for the terminal prompt. `system_get_time()` in the original firmware
//! is the direct ancestor of [`Clock::now_us`].

use chrono::Local;
use std::time::Instant;

#[derive(Clone)]
pub struct Clock {
    epoch: Instant,
}

impl Clock {
    pub fn new() -> Self {
        Clock { epoch: Instant::now() }
    }

    /// Microseconds since this clock was created. Monotonic, never wraps
    /// within any realistic process lifetime.
    pub fn now_us(&self) -> u64 {
        self.epoch.elapsed().as_micros() as u64
    }

    /// `HH:MM:SS` for the terminal prompt, using local wall-clock time.
    pub fn prompt_time(&self) -> String {
        Local::now().format("%H:%M:%S").to_string()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

use std::time::{Duration, Instant};

/// Pausable stopwatch for the recording HUD.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElapsedClock {
    accumulated: Duration,
    running_since: Option<Instant>,
}

impl ElapsedClock {
    /// Zero and start running.
    pub fn restart(&mut self) {
        self.accumulated = Duration::ZERO;
        self.running_since = Some(Instant::now());
    }

    /// Stop accumulating. No-op when already paused.
    pub fn pause(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += since.elapsed();
        }
    }

    /// Continue accumulating. No-op when already running.
    pub fn resume(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    /// Zero and stop.
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.running_since = None;
    }

    /// Time accumulated while running.
    pub fn elapsed(&self) -> Duration {
        self.accumulated + self.running_since.map_or(Duration::ZERO, |since| since.elapsed())
    }

    /// Whether the clock is currently accumulating.
    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Consecutive refresh failures tolerated before auto-refresh disables
/// itself and requires a manual reset.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshTimerState {
    Running,
    Paused,
    Disabled,
}

/// Explicit finite-state auto-refresh timer. Transitions happen on tick
/// results and operator actions; callers drive the actual clock and ask
/// `should_tick` before each poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshTimer {
    state: RefreshTimerState,
    consecutive_failures: u32,
    interval: Duration,
}

impl RefreshTimer {
    pub fn new(interval: Duration) -> Self {
        Self { state: RefreshTimerState::Running, consecutive_failures: 0, interval }
    }

    pub fn state(&self) -> RefreshTimerState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// A tick is due only while running; the caller additionally gates on
    /// whether any file is still processing.
    pub fn should_tick(&self) -> bool {
        self.state == RefreshTimerState::Running
    }

    pub fn tick_success(&mut self) {
        if self.state == RefreshTimerState::Running {
            self.consecutive_failures = 0;
        }
    }

    /// Counts a failed refresh; the third consecutive failure disables the
    /// timer so no further automatic tick occurs.
    pub fn tick_failure(&mut self) -> RefreshTimerState {
        if self.state == RefreshTimerState::Running {
            self.consecutive_failures += 1;
            if self.consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                self.state = RefreshTimerState::Disabled;
            }
        }
        self.state
    }

    /// Operator pause. Persisted per session by the caller.
    pub fn stop(&mut self) {
        if self.state == RefreshTimerState::Running {
            self.state = RefreshTimerState::Paused;
        }
    }

    /// Resumes a paused timer. A disabled timer stays disabled until
    /// `reset`.
    pub fn start(&mut self) {
        if self.state == RefreshTimerState::Paused {
            self.state = RefreshTimerState::Running;
        }
    }

    /// Manual re-arm after the failure shutoff: clears the counter and
    /// returns to `Running` from any state.
    pub fn reset(&mut self) {
        self.state = RefreshTimerState::Running;
        self.consecutive_failures = 0;
    }
}

impl Default for RefreshTimer {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}

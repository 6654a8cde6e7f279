//! Focus timer implementation.
//!
//! The timer is a wall-clock-based state machine. It does not use internal
//! threads and never decrements by a fixed step: remaining time is always
//! derived from `now - run_started_at`, so any number of missed ticks (the
//! background process being suspended) is absorbed by the next one.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |
//!           v
//!       Completed -> Idle
//! ```
//!
//! Every command takes the current time (epoch milliseconds) explicitly,
//! which makes the engine a pure function of `(state, now)`.

use serde::{Deserialize, Serialize};

use crate::events::TimerEvent;
use crate::protocol::TimerSnapshot;

/// Default focus session length: 25 minutes.
pub const DEFAULT_DURATION_SECS: u64 = 25 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

/// Process-wide countdown, persisted under the local `timerState` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusTimer {
    is_running: bool,
    is_paused: bool,
    remaining_seconds: u64,
    /// Baseline the current run counts down from; reset on every resume.
    target_duration_seconds: u64,
    /// Epoch ms of the last start/resume. Set iff running and not paused.
    #[serde(default)]
    run_started_at: Option<u64>,
    #[serde(skip, default = "default_duration_secs")]
    default_duration_seconds: u64,
}

fn default_duration_secs() -> u64 {
    DEFAULT_DURATION_SECS
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_SECS)
    }
}

impl FocusTimer {
    /// Create an idle timer with the given session length.
    pub fn new(default_duration_seconds: u64) -> Self {
        let duration = default_duration_seconds.max(1);
        Self {
            is_running: false,
            is_paused: false,
            remaining_seconds: duration,
            target_duration_seconds: duration,
            run_started_at: None,
            default_duration_seconds: duration,
        }
    }

    /// Rebuild a timer from its persisted form and fast-forward it to `now`
    /// exactly as a tick would, completing it if the run ran out while the
    /// process was away.
    pub fn restore(
        mut stored: FocusTimer,
        default_duration_seconds: u64,
        now_ms: u64,
    ) -> (Self, Option<TimerEvent>) {
        stored.default_duration_seconds = default_duration_seconds.max(1);
        stored.sanitize(now_ms);
        let event = stored.tick(now_ms);
        (stored, event)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        match (self.is_running, self.is_paused) {
            (true, false) => TimerState::Running,
            (true, true) => TimerState::Paused,
            _ => TimerState::Idle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn target_duration_seconds(&self) -> u64 {
        self.target_duration_seconds
    }

    pub fn run_started_at(&self) -> Option<u64> {
        self.run_started_at
    }

    pub fn default_duration_seconds(&self) -> u64 {
        self.default_duration_seconds
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            remaining_seconds: self.remaining_seconds,
            is_running: self.is_running,
            is_paused: self.is_paused,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start from idle, or resume when paused. Already running is a no-op.
    pub fn start(&mut self, now_ms: u64) -> Option<TimerEvent> {
        match self.state() {
            TimerState::Running => None,
            TimerState::Paused => self.resume(now_ms),
            TimerState::Idle => {
                if self.remaining_seconds == 0 {
                    self.remaining_seconds = self.default_duration_seconds;
                }
                self.is_running = true;
                self.is_paused = false;
                self.run_started_at = Some(now_ms);
                self.target_duration_seconds = self.remaining_seconds;
                Some(TimerEvent::TimerStarted {
                    remaining_secs: self.remaining_seconds,
                    at_ms: now_ms,
                })
            }
        }
    }

    /// Toggle: freeze a running timer, or resume a paused one.
    pub fn pause(&mut self, now_ms: u64) -> Option<TimerEvent> {
        match self.state() {
            TimerState::Running => {
                self.remaining_seconds = self.derive_remaining(now_ms);
                if self.remaining_seconds == 0 {
                    // Nothing left to freeze; the run is over.
                    return Some(self.complete(now_ms));
                }
                self.is_paused = true;
                self.run_started_at = None;
                Some(TimerEvent::TimerPaused {
                    remaining_secs: self.remaining_seconds,
                    at_ms: now_ms,
                })
            }
            TimerState::Paused => self.resume(now_ms),
            TimerState::Idle => None,
        }
    }

    fn resume(&mut self, now_ms: u64) -> Option<TimerEvent> {
        self.is_paused = false;
        self.run_started_at = Some(now_ms);
        self.target_duration_seconds = self.remaining_seconds;
        Some(TimerEvent::TimerResumed {
            remaining_secs: self.remaining_seconds,
            at_ms: now_ms,
        })
    }

    /// Unconditionally return to idle defaults.
    pub fn reset(&mut self, now_ms: u64) -> Option<TimerEvent> {
        self.return_to_idle();
        Some(TimerEvent::TimerReset { at_ms: now_ms })
    }

    /// Call periodically. Returns `TimerTicked` when the remaining time
    /// changed and `TimerCompleted` when the countdown reached zero.
    pub fn tick(&mut self, now_ms: u64) -> Option<TimerEvent> {
        if self.state() != TimerState::Running {
            return None;
        }
        let remaining = self.derive_remaining(now_ms);
        if remaining == self.remaining_seconds && remaining > 0 {
            return None;
        }
        self.remaining_seconds = remaining;
        if remaining == 0 {
            return Some(self.complete(now_ms));
        }
        Some(TimerEvent::TimerTicked {
            remaining_secs: remaining,
            at_ms: now_ms,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn derive_remaining(&self, now_ms: u64) -> u64 {
        let elapsed_secs = self
            .run_started_at
            .map(|started| now_ms.saturating_sub(started) / 1000)
            .unwrap_or(0);
        self.target_duration_seconds.saturating_sub(elapsed_secs)
    }

    fn complete(&mut self, now_ms: u64) -> TimerEvent {
        let duration_minutes = self.default_duration_seconds / 60;
        self.return_to_idle();
        TimerEvent::TimerCompleted {
            duration_minutes,
            at_ms: now_ms,
        }
    }

    fn return_to_idle(&mut self) {
        self.is_running = false;
        self.is_paused = false;
        self.remaining_seconds = self.default_duration_seconds;
        self.target_duration_seconds = self.default_duration_seconds;
        self.run_started_at = None;
    }

    /// Repair a persisted state that violates the timer invariants.
    fn sanitize(&mut self, now_ms: u64) {
        if !self.is_running {
            self.return_to_idle();
            return;
        }
        if self.target_duration_seconds == 0 {
            self.target_duration_seconds = self.remaining_seconds.max(1);
        }
        self.remaining_seconds = self.remaining_seconds.min(self.target_duration_seconds);
        if self.is_paused {
            self.run_started_at = None;
        } else if self.run_started_at.is_none() {
            self.target_duration_seconds = self.remaining_seconds.max(1);
            self.run_started_at = Some(now_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_700_000_000_000;

    #[test]
    fn start_pause_resume() {
        let mut timer = FocusTimer::default();
        assert_eq!(timer.state(), TimerState::Idle);

        assert!(timer.start(T0).is_some());
        assert_eq!(timer.state(), TimerState::Running);
        assert_eq!(timer.run_started_at(), Some(T0));

        let paused = timer.pause(T0 + 60_000);
        assert_eq!(
            paused,
            Some(TimerEvent::TimerPaused {
                remaining_secs: 1440,
                at_ms: T0 + 60_000
            })
        );
        assert_eq!(timer.state(), TimerState::Paused);
        assert_eq!(timer.run_started_at(), None);

        assert!(timer.pause(T0 + 120_000).is_some());
        assert_eq!(timer.state(), TimerState::Running);
        assert_eq!(timer.target_duration_seconds(), 1440);
        assert_eq!(timer.run_started_at(), Some(T0 + 120_000));
    }

    #[test]
    fn start_while_running_is_noop() {
        let mut timer = FocusTimer::default();
        timer.start(T0);
        assert!(timer.start(T0 + 5_000).is_none());
        assert_eq!(timer.run_started_at(), Some(T0));
    }

    #[test]
    fn start_while_paused_resumes() {
        let mut timer = FocusTimer::default();
        timer.start(T0);
        timer.pause(T0 + 10_000);
        let event = timer.start(T0 + 50_000);
        assert!(matches!(event, Some(TimerEvent::TimerResumed { remaining_secs: 1490, .. })));
    }

    #[test]
    fn pause_on_idle_does_nothing() {
        let mut timer = FocusTimer::default();
        assert!(timer.pause(T0).is_none());
        assert_eq!(timer, FocusTimer::default());
    }

    #[test]
    fn tick_derives_from_wall_clock() {
        let mut timer = FocusTimer::default();
        timer.start(T0);
        assert!(timer.tick(T0 + 400).is_none());
        let event = timer.tick(T0 + 90_500);
        assert_eq!(
            event,
            Some(TimerEvent::TimerTicked {
                remaining_secs: 1410,
                at_ms: T0 + 90_500
            })
        );
    }

    #[test]
    fn tick_ignored_while_paused() {
        let mut timer = FocusTimer::default();
        timer.start(T0);
        timer.pause(T0 + 1_000);
        assert!(timer.tick(T0 + 600_000).is_none());
        assert_eq!(timer.remaining_seconds(), 1499);
    }

    #[test]
    fn single_late_tick_completes() {
        let mut timer = FocusTimer::default();
        timer.start(T0);
        let event = timer.tick(T0 + 1500 * 1000);
        assert!(matches!(
            event,
            Some(TimerEvent::TimerCompleted { duration_minutes: 25, .. })
        ));
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.remaining_seconds(), DEFAULT_DURATION_SECS);
    }

    #[test]
    fn pause_after_expiry_completes() {
        let mut timer = FocusTimer::default();
        timer.start(T0);
        let event = timer.pause(T0 + 2_000_000);
        assert!(event.is_some_and(|e| e.is_completion()));
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut timer = FocusTimer::default();
        timer.start(T0);
        timer.tick(T0 + 30_000);
        timer.reset(T0 + 31_000);
        let once = timer.clone();
        timer.reset(T0 + 32_000);
        assert_eq!(timer, once);
        assert_eq!(timer, FocusTimer::default());
    }

    #[test]
    fn clock_going_backwards_does_not_underflow() {
        let mut timer = FocusTimer::default();
        timer.start(T0);
        assert!(timer.tick(T0 - 10_000).is_none());
        assert_eq!(timer.remaining_seconds(), DEFAULT_DURATION_SECS);
    }

    #[test]
    fn restore_fast_forwards_running_timer() {
        let mut timer = FocusTimer::default();
        timer.start(T0);
        let json = serde_json::to_string(&timer).unwrap();
        let stored: FocusTimer = serde_json::from_str(&json).unwrap();

        let (restored, event) = FocusTimer::restore(stored, DEFAULT_DURATION_SECS, T0 + 600_000);
        assert!(matches!(event, Some(TimerEvent::TimerTicked { remaining_secs: 900, .. })));
        assert_eq!(restored.remaining_seconds(), 900);
        assert_eq!(restored.state(), TimerState::Running);
    }

    #[test]
    fn restore_completes_expired_timer() {
        let mut timer = FocusTimer::default();
        timer.start(T0);
        let (restored, event) = FocusTimer::restore(timer, DEFAULT_DURATION_SECS, T0 + 3_600_000);
        assert!(event.is_some_and(|e| e.is_completion()));
        assert_eq!(restored.state(), TimerState::Idle);
    }

    #[test]
    fn restore_repairs_inconsistent_state() {
        let json = r#"{"isRunning":true,"isPaused":false,"remainingSeconds":2000,"targetDurationSeconds":1500}"#;
        let stored: FocusTimer = serde_json::from_str(json).unwrap();
        let (restored, _) = FocusTimer::restore(stored, DEFAULT_DURATION_SECS, T0);
        assert!(restored.remaining_seconds() <= restored.target_duration_seconds());
        assert_eq!(restored.run_started_at(), Some(T0));
    }

    #[test]
    fn persisted_form_uses_camel_case_keys() {
        let timer = FocusTimer::default();
        let value = serde_json::to_value(&timer).unwrap();
        assert_eq!(value["remainingSeconds"], 1500);
        assert_eq!(value["targetDurationSeconds"], 1500);
        assert_eq!(value["isRunning"], false);
        assert!(value.get("defaultDurationSeconds").is_none());
    }
}

//! Timer commands and the side effects of timer events.

use tracing::{debug, info};

use super::{report_delivery, Coordinator};
use crate::events::TimerEvent;
use crate::host::{BrowserHost, Notification};
use crate::protocol::Broadcast;
use crate::storage::{keys, KeyValueStore, Scope};

impl<S, H> Coordinator<S, H>
where
    S: KeyValueStore,
    H: BrowserHost,
{
    pub async fn start_timer(&mut self, now_ms: u64) {
        match self.timer.start(now_ms) {
            Some(event) => self.apply_timer_event(event).await,
            None => debug!("timer already running"),
        }
    }

    pub async fn pause_timer(&mut self, now_ms: u64) {
        if let Some(event) = self.timer.pause(now_ms) {
            self.apply_timer_event(event).await;
        }
    }

    pub async fn reset_timer(&mut self, now_ms: u64) {
        if let Some(event) = self.timer.reset(now_ms) {
            self.apply_timer_event(event).await;
        }
    }

    /// Recompute the remaining time from the wall clock.
    pub async fn timer_tick(&mut self, now_ms: u64) {
        if let Some(event) = self.timer.tick(now_ms) {
            self.apply_timer_event(event).await;
        }
    }

    /// Persist the timer and fan the event out to the panel.
    pub(super) async fn apply_timer_event(&mut self, event: TimerEvent) {
        self.persist_timer().await;
        let snapshot = self.timer.snapshot();

        match event {
            TimerEvent::TimerCompleted {
                duration_minutes, ..
            } => {
                let streak = self.counters.add_focus_minutes(duration_minutes);
                self.persist(Scope::Sync, keys::FOCUS_STREAK, &streak).await;
                info!(duration_minutes, streak, "focus session complete");

                let notification = Notification::basic(
                    "Focus Session Complete!",
                    format!(
                        "Great job! You completed a {duration_minutes}-minute focus session."
                    ),
                );
                self.notify_info(&notification).await;
                report_delivery(
                    "timer completed",
                    self.host.broadcast(&Broadcast::TimerCompleted(snapshot)).await,
                );
            }
            other => {
                debug!(event = ?other, "timer event");
                report_delivery(
                    "timer update",
                    self.host.broadcast(&Broadcast::TimerUpdate(snapshot)).await,
                );
            }
        }
    }
}

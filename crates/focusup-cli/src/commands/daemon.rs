//! Long-running mode: the CLI plays the browser's background process.
//!
//! Reads one JSON object per line on stdin. Objects with an `event` field
//! are host events (tab changes, notification clicks, alarms); anything
//! else is a coordinator request whose response is written back as a JSON
//! line. Outbound messages share stdout, tagged with `event`.

use std::time::Duration;

use focusup_core::{now_ms, Alarm, AlarmSpec, TabId};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::{load_coordinator, CliCoordinator, CliResult};
use crate::host::Output;

const CLOCK_RESOLUTION: Duration = Duration::from_millis(250);

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
enum HostEvent {
    TabUpdated {
        tab_id: TabId,
        url: String,
    },
    TabActivated {
        tab_id: TabId,
        #[serde(default)]
        url: Option<String>,
    },
    TabRemoved {
        tab_id: TabId,
    },
    NotificationButton {
        id: String,
        index: usize,
    },
    Alarm {
        name: String,
    },
}

/// Pending alarms, keyed by name. Re-registering an alarm replaces it.
#[derive(Debug, Default)]
struct AlarmTable {
    entries: Vec<AlarmSpec>,
}

impl AlarmTable {
    fn extend(&mut self, specs: impl IntoIterator<Item = AlarmSpec>) {
        for spec in specs {
            self.entries.retain(|e| e.alarm != spec.alarm);
            self.entries.push(spec);
        }
    }

    /// Alarms due at `now`. Periodic alarms that fell behind fire once and
    /// skip ahead; one-shot alarms are dropped after firing.
    fn due(&mut self, now: u64) -> Vec<Alarm> {
        let mut fired = Vec::new();
        self.entries.retain_mut(|spec| {
            if spec.when_ms > now {
                return true;
            }
            fired.push(spec.alarm);
            match spec.period_ms.filter(|p| *p > 0) {
                Some(period) => {
                    let behind = (now - spec.when_ms) / period + 1;
                    spec.when_ms += behind * period;
                    true
                }
                None => false,
            }
        });
        fired
    }
}

pub async fn run() -> CliResult {
    let mut coordinator = load_coordinator(Output::JsonLines).await?;
    coordinator.install_alarms(now_ms()).await;

    let mut alarms = AlarmTable::default();
    alarms.extend(coordinator.host().take_scheduled());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut clock = tokio::time::interval(CLOCK_RESOLUTION);
    clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!("daemon started");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => handle_line(&mut coordinator, &line).await,
                    None => break,
                }
            }
            _ = clock.tick() => {
                let now = now_ms();
                for alarm in alarms.due(now) {
                    coordinator.on_alarm(alarm, now).await;
                }
            }
        }
        alarms.extend(coordinator.host().take_scheduled());
    }

    info!("stdin closed, daemon exiting");
    Ok(())
}

async fn handle_line(coordinator: &mut CliCoordinator, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    let now = now_ms();

    let is_event = serde_json::from_str::<serde_json::Value>(line)
        .map(|v| v.get("event").is_some())
        .unwrap_or(false);
    if is_event {
        match serde_json::from_str::<HostEvent>(line) {
            Ok(event) => dispatch(coordinator, event, now).await,
            Err(e) => warn!(error = %e, "malformed host event"),
        }
        return;
    }

    if let Some(response) = coordinator.handle_json(line, now).await {
        match serde_json::to_string(&response) {
            Ok(json) => println!("{json}"),
            Err(e) => warn!(error = %e, "failed to encode response"),
        }
    }
}

async fn dispatch(coordinator: &mut CliCoordinator, event: HostEvent, now: u64) {
    debug!(?event, "host event");
    match event {
        HostEvent::TabUpdated { tab_id, url } => {
            coordinator.host().open_tab(tab_id, &url);
            coordinator.on_tab_updated(tab_id, &url, now).await;
        }
        HostEvent::TabActivated { tab_id, url } => {
            if let Some(url) = url {
                coordinator.host().open_tab(tab_id, &url);
            }
            coordinator.on_tab_activated(tab_id, now).await;
        }
        HostEvent::TabRemoved { tab_id } => {
            coordinator.on_tab_removed(tab_id).await;
            coordinator.host().close_tab(tab_id);
        }
        HostEvent::NotificationButton { id, index } => {
            coordinator.on_notification_button(&id, index, now).await;
        }
        HostEvent::Alarm { name } => match Alarm::from_name(&name) {
            Some(alarm) => coordinator.on_alarm(alarm, now).await,
            None => warn!(%name, "unknown alarm"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(alarm: Alarm, when_ms: u64, period_ms: Option<u64>) -> AlarmSpec {
        AlarmSpec {
            alarm,
            when_ms,
            period_ms,
        }
    }

    #[test]
    fn periodic_alarms_coalesce_when_late() {
        let mut table = AlarmTable::default();
        table.extend([spec(Alarm::TimerTick, 1_000, Some(1_000))]);
        assert!(table.due(999).is_empty());
        assert_eq!(table.due(5_500), vec![Alarm::TimerTick]);
        assert!(table.due(5_900).is_empty());
        assert_eq!(table.due(6_000), vec![Alarm::TimerTick]);
    }

    #[test]
    fn one_shot_alarms_fire_once() {
        let mut table = AlarmTable::default();
        table.extend([spec(Alarm::BreakOver, 10, None)]);
        assert_eq!(table.due(10), vec![Alarm::BreakOver]);
        assert!(table.due(20).is_empty());
    }

    #[test]
    fn rescheduling_replaces_the_alarm() {
        let mut table = AlarmTable::default();
        table.extend([spec(Alarm::BreakOver, 10, None)]);
        table.extend([spec(Alarm::BreakOver, 50, None)]);
        assert!(table.due(20).is_empty());
        assert_eq!(table.due(50), vec![Alarm::BreakOver]);
    }

    #[test]
    fn host_events_decode() {
        let event: HostEvent =
            serde_json::from_str(r#"{"event":"tabUpdated","tabId":3,"url":"https://x.com/"}"#)
                .unwrap();
        assert_eq!(
            event,
            HostEvent::TabUpdated {
                tab_id: 3,
                url: "https://x.com/".into()
            }
        );
        let event: HostEvent =
            serde_json::from_str(r#"{"event":"notificationButton","id":"n1","index":1}"#).unwrap();
        assert_eq!(
            event,
            HostEvent::NotificationButton {
                id: "n1".into(),
                index: 1
            }
        );
    }
}

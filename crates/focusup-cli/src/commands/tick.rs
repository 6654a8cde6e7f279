use focusup_core::{now_ms, Alarm};

use super::{load_coordinator, CliResult};
use crate::host::Output;

/// Deliver one round of the periodic alarms, for use from cron or a
/// systemd timer. A missed midnight is caught up while loading.
pub async fn run() -> CliResult {
    let mut coordinator = load_coordinator(Output::Human).await?;
    let now = now_ms();
    coordinator.on_alarm(Alarm::TimerTick, now).await;
    coordinator.on_alarm(Alarm::SiteTrackingCheck, now).await;

    let timer = coordinator.timer();
    println!(
        "{:?} {:02}:{:02}",
        timer.state(),
        timer.remaining_seconds() / 60,
        timer.remaining_seconds() % 60
    );
    Ok(())
}

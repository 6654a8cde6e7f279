use clap::Subcommand;
use focusup_core::{Broadcast, CoreClient, Request, Response};

use super::{open_panel, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the focus timer, or resume it when paused
    Start,
    /// Pause a running timer, or resume a paused one
    Pause,
    /// Reset to idle state
    Reset,
    /// Print current timer state as JSON
    Status,
}

pub async fn run(action: TimerAction) -> CliResult {
    let as_json = matches!(action, TimerAction::Status);
    let (mut panel, client, _store) = open_panel().await?;

    let request = match action {
        TimerAction::Start => {
            let request = panel.start_command();
            if request.is_none() {
                println!("timer already running");
            }
            request
        }
        TimerAction::Pause => {
            let request = panel.pause_command().or_else(|| {
                // Pause doubles as resume.
                panel.timer().is_paused.then_some(Request::PauseTimer)
            });
            if request.is_none() {
                println!("timer is not running");
            }
            request
        }
        TimerAction::Reset => Some(panel.reset_command()),
        TimerAction::Status => None,
    };

    if let Some(request) = request {
        client.request(&request).await?;
        if let Some(Response::TimerState(snapshot)) =
            client.request(&Request::GetTimerState).await?
        {
            panel.apply(&Broadcast::TimerUpdate(snapshot));
        }
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&panel.timer())?);
    } else {
        println!("{} {}", panel.status_label(), panel.timer_display());
    }
    Ok(())
}

use clap::Args;
use serde_json::json;

use super::{open_panel, CliResult};

#[derive(Args)]
pub struct StatsArgs {
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: StatsArgs) -> CliResult {
    let (panel, _client, _store) = open_panel().await?;

    if args.json {
        let stats = json!({
            "blockedToday": panel.blocked_count(),
            "focusStreakMinutes": panel.focus_streak(),
            "timer": panel.timer(),
        });
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Sites blocked today: {}", panel.blocked_count());
        println!("Focus streak:        {} min", panel.focus_streak());
        println!("{} {}", panel.status_label(), panel.timer_display());
    }
    Ok(())
}

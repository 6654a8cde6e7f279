use chrono::{Local, TimeZone};
use clap::Subcommand;
use focusup_core::site::host_from_url;
use focusup_core::{now_ms, Request, Response, TabId};
use serde_json::json;

use super::{load_coordinator, CliCoordinator, CliResult};
use crate::host::Output;

#[derive(Subcommand)]
pub enum SiteAction {
    /// A tab finished loading a URL
    Visit {
        url: String,
        /// Tab the URL was loaded in
        #[arg(long, default_value_t = 1)]
        tab: TabId,
    },
    /// Switch to a tab showing a URL
    Activate {
        url: String,
        #[arg(long)]
        tab: TabId,
    },
    /// A tab was closed
    Close {
        #[arg(long)]
        tab: TabId,
    },
    /// Grant temporary access to a site
    Grant {
        host: String,
        /// Length of the grant (defaults to the configured grant length)
        #[arg(long)]
        minutes: Option<u64>,
    },
    /// Classify a URL without touching tracking
    Check { url: String },
    /// Print tracking state and active grants as JSON
    Status,
}

pub async fn run(action: SiteAction) -> CliResult {
    let mut coordinator = load_coordinator(Output::Human).await?;
    let now = now_ms();

    match action {
        SiteAction::Visit { url, tab } => {
            coordinator.host().open_tab(tab, &url);
            coordinator.on_tab_updated(tab, &url, now).await;
            print_tracking(&coordinator);
        }
        SiteAction::Activate { url, tab } => {
            coordinator.host().open_tab(tab, &url);
            coordinator.on_tab_activated(tab, now).await;
            print_tracking(&coordinator);
        }
        SiteAction::Close { tab } => {
            coordinator.on_tab_removed(tab).await;
            coordinator.host().close_tab(tab);
            print_tracking(&coordinator);
        }
        SiteAction::Grant { host, minutes } => {
            let request = Request::GrantTempAccess {
                site: host.clone(),
                minutes,
            };
            match coordinator.handle_request(request, now).await {
                Some(Response::Ack(ack)) if ack.success => {
                    let expiry = coordinator
                        .tracking()
                        .grant_expiry(&focusup_core::site::normalize_host(&host));
                    match expiry {
                        Some(ms) => println!("access to {host} granted until {}", format_local(ms)),
                        None => println!("access to {host} granted"),
                    }
                }
                _ => return Err(format!("cannot grant access to '{host}'").into()),
            }
        }
        SiteAction::Check { url } => {
            let Some(host) = host_from_url(&url) else {
                return Err(format!("not a URL with a host: {url}").into());
            };
            if !coordinator.blocklist().is_distracting(&host) {
                println!("{host}: not distracting");
            } else if let Some(expiry) = coordinator
                .tracking()
                .grant_expiry(&host)
                .filter(|_| coordinator.tracking().has_valid_grant(&host, now))
            {
                println!("{host}: distracting (granted until {})", format_local(expiry));
            } else {
                println!("{host}: distracting");
            }
        }
        SiteAction::Status => {
            let tracking = coordinator.tracking();
            let grants: serde_json::Map<_, _> = tracking
                .grants()
                .iter()
                .filter(|(_, expiry)| now < **expiry)
                .map(|(host, expiry)| (host.clone(), json!(format_local(*expiry))))
                .collect();
            let status = json!({
                "currentHost": tracking.current_host(),
                "watchStartedAt": tracking.watch_started_at().map(format_local),
                "activeTabId": tracking.active_tab_id(),
                "warningAlreadyShown": tracking.warning_already_shown(),
                "temporaryGrants": grants,
                "blockedToday": coordinator.counters().blocked_today,
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}

fn print_tracking(coordinator: &CliCoordinator) {
    match coordinator.tracking().session() {
        Some(session) => println!(
            "tracking {} on tab {} since {}",
            session.host,
            session.tab_id,
            format_local(session.started_at)
        ),
        None => println!("not tracking"),
    }
}

pub(crate) fn format_local(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(|ms| Local.timestamp_millis_opt(ms).single())
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

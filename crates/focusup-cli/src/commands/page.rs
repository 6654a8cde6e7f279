use clap::Subcommand;
use focusup_core::site::BlockList;
use focusup_core::{now_ms, Config, Database, Overlay, PageEffect, PageMonitor, Settings};

use super::CliResult;

#[derive(Subcommand)]
pub enum PageAction {
    /// Run the in-page check for a URL and print what the page would do
    Check {
        url: String,
        /// Pretend the page already holds a grace token
        #[arg(long)]
        grace: bool,
    },
}

pub async fn run(action: PageAction) -> CliResult {
    match action {
        PageAction::Check { url, grace } => {
            let config = Config::load()?;
            let db = Database::open()?;
            let settings = Settings::load(&db).await?;

            let mut blocklist = BlockList::new(&config.blocklist.builtin);
            blocklist.set_custom(&settings.custom_sites);

            let now = now_ms();
            let mut monitor = PageMonitor::new(url, blocklist, settings, config.page());
            if grace {
                monitor.grant_grace(now);
            }
            let effects = monitor.on_load(now);
            for effect in &effects {
                println!("{}", describe(effect));
            }
        }
    }
    Ok(())
}

fn describe(effect: &PageEffect) -> String {
    match effect {
        PageEffect::ShowOverlay(overlay) => {
            let [primary, secondary] = overlay.buttons();
            let kind = match overlay {
                Overlay::Focus => "focus",
                Overlay::Warning { .. } => "warning",
            };
            format!(
                "show {kind} overlay: {} {} [{primary}] [{secondary}]",
                overlay.title(),
                overlay.message()
            )
        }
        PageEffect::HideOverlay => "hide overlay".to_string(),
        PageEffect::NavigateBack => "navigate back".to_string(),
        PageEffect::SendToCore(request) => format!("send {}", request.action()),
        PageEffect::ScheduleCheck { delay_ms } => format!("re-check in {delay_ms} ms"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effects_are_described() {
        assert_eq!(
            describe(&PageEffect::ScheduleCheck { delay_ms: 2000 }),
            "re-check in 2000 ms"
        );
        assert!(describe(&PageEffect::ShowOverlay(Overlay::Focus)).contains("[Stay Focused]"));
    }
}

use clap::Subcommand;
use focusup_core::storage::SettingKey;
use focusup_core::CoreClient;

use super::{open_panel, CliResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print one setting, or all of them as JSON
    Get {
        /// Setting name (e.g. "strictMode", "notifications")
        name: Option<String>,
    },
    /// Flip a boolean setting
    Toggle { name: String },
    /// Add a site to the custom block list
    AddSite { host: String },
}

pub async fn run(action: SettingsAction) -> CliResult {
    let (mut panel, client, store) = open_panel().await?;

    match action {
        SettingsAction::Get { name: None } => {
            println!("{}", serde_json::to_string_pretty(panel.settings())?);
        }
        SettingsAction::Get { name: Some(name) } => {
            let key: SettingKey = name.parse()?;
            println!("{}", panel.settings().value(key));
        }
        SettingsAction::Toggle { name } => {
            let key: SettingKey = name.parse()?;
            let request = panel.toggle_setting(&store, key).await?;
            client.request(&request).await?;
            println!("{key} = {}", panel.settings().value(key));
        }
        SettingsAction::AddSite { host } => {
            let request = panel.add_custom_site(&store, &host).await?;
            client.request(&request).await?;
            println!("custom sites: {}", panel.settings().custom_sites.join(", "));
        }
    }
    Ok(())
}

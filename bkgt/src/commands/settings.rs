//! Settings commands
//!
//! Changes are written to `settings.json` and take effect on the next run.

use crate::app::AppState;
use crate::error::{AppError, Result};
use crate::services::settings::{NotificationSettings, SearchSettings, SettingsService};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Print the settings in effect
    Show,

    /// Change catalog search settings
    Search {
        #[arg(long)]
        page_size: Option<u32>,
        #[arg(long)]
        fuzzy_threshold: Option<f32>,
        #[arg(long)]
        log_searches: Option<bool>,
    },

    /// Change notification settings
    Notifications {
        #[arg(long)]
        limit: Option<u32>,
        /// Notification body; must contain {subject}
        #[arg(long)]
        template: Option<String>,
        #[arg(long)]
        retention_days: Option<u32>,
    },
}

pub async fn run(state: &AppState, command: SettingsCommand) -> Result<serde_json::Value> {
    let service = || match &state.data_dir {
        Some(dir) => Ok(SettingsService::new(dir.clone())),
        None => Err(AppError::Settings(
            "in-memory state has no settings file".to_string(),
        )),
    };

    match command {
        SettingsCommand::Show => Ok(serde_json::to_value(&state.settings)?),
        SettingsCommand::Search {
            page_size,
            fuzzy_threshold,
            log_searches,
        } => {
            let current = &state.settings.search;
            let search = SearchSettings {
                default_page_size: page_size.unwrap_or(current.default_page_size),
                fuzzy_threshold: fuzzy_threshold.unwrap_or(current.fuzzy_threshold),
                log_searches: log_searches.unwrap_or(current.log_searches),
            };

            service()?.update_search(search.clone()).await?;
            Ok(serde_json::to_value(search)?)
        }
        SettingsCommand::Notifications {
            limit,
            template,
            retention_days,
        } => {
            let current = &state.settings.notifications;
            let notifications = NotificationSettings {
                default_limit: limit.unwrap_or(current.default_limit),
                message_template: template.unwrap_or_else(|| current.message_template.clone()),
                retention_days: retention_days.unwrap_or(current.retention_days),
            };

            service()?.update_notifications(notifications.clone()).await?;
            Ok(serde_json::to_value(notifications)?)
        }
    }
}

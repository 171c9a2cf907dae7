//! Notification commands

use crate::app::AppState;
use crate::database::NotificationKind;
use crate::error::Result;
use clap::Subcommand;
use serde_json::json;

#[derive(Subcommand)]
pub enum NotificationCommand {
    /// Notifications for a user, newest first
    List {
        user_id: i64,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        unread: bool,
    },

    /// Number of unread notifications
    Count { user_id: i64 },

    /// Mark one notification read
    Read { id: i64 },

    /// Mark every notification of a user read
    ReadAll { user_id: i64 },

    /// Delete a notification
    Delete { id: i64 },

    /// Create a notification directly
    Create {
        user_id: i64,
        message: String,
        #[arg(long, default_value = "info")]
        kind: NotificationKind,
    },

    /// Remove read notifications older than the retention window
    Cleanup {
        #[arg(long)]
        days: Option<u32>,
    },
}

pub async fn run(state: &AppState, command: NotificationCommand) -> Result<serde_json::Value> {
    let service = &state.notifications;

    match command {
        NotificationCommand::List {
            user_id,
            limit,
            unread,
        } => Ok(serde_json::to_value(service.list(user_id, limit, unread).await?)?),
        NotificationCommand::Count { user_id } => {
            let unread = service.unread_count(user_id).await?;
            Ok(json!({ "user_id": user_id, "unread": unread }))
        }
        NotificationCommand::Read { id } => {
            let changed = service.mark_read(id).await?;
            Ok(json!({ "id": id, "changed": changed }))
        }
        NotificationCommand::ReadAll { user_id } => {
            let changed = service.mark_all_read(user_id).await?;
            Ok(json!({ "user_id": user_id, "changed": changed }))
        }
        NotificationCommand::Delete { id } => {
            let removed = service.delete(id).await?;
            Ok(json!({ "id": id, "removed": removed }))
        }
        NotificationCommand::Create {
            user_id,
            message,
            kind,
        } => Ok(serde_json::to_value(service.create(user_id, &message, kind).await?)?),
        NotificationCommand::Cleanup { days } => {
            let days = days.unwrap_or(state.settings.notifications.retention_days);
            let removed = service.cleanup_read_older_than(days).await?;
            Ok(json!({ "days": days, "removed": removed }))
        }
    }
}

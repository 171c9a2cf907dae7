//! Messaging commands

use crate::app::AppState;
use crate::database::NewMessage;
use crate::error::Result;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum MessageCommand {
    /// Send a message and notify its recipients
    Send {
        /// Sending user id
        #[arg(long = "from")]
        sender: i64,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        body: String,
        /// Recipients: all, coaches, managers or user ids, comma separated
        #[arg(long = "to", value_delimiter = ',', required = true)]
        recipients: Vec<String>,
    },

    /// Show one message
    Show { id: i64 },

    /// Messages sent by or addressed to a user
    List {
        user_id: i64,
        #[arg(long, default_value_t = 20)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
}

pub async fn run(state: &AppState, command: MessageCommand) -> Result<serde_json::Value> {
    match command {
        MessageCommand::Send {
            sender,
            subject,
            body,
            recipients,
        } => {
            let report = state
                .messaging
                .dispatch(NewMessage {
                    sender_id: Some(sender),
                    subject,
                    body,
                    recipients,
                })
                .await?;
            Ok(serde_json::to_value(report)?)
        }
        MessageCommand::Show { id } => {
            Ok(serde_json::to_value(state.messaging.get_message(id).await?)?)
        }
        MessageCommand::List {
            user_id,
            limit,
            offset,
        } => {
            let messages = state
                .messaging
                .list_user_messages(user_id, limit, offset)
                .await?;
            Ok(serde_json::to_value(messages)?)
        }
    }
}

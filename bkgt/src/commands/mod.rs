//! Command-line commands
//!
//! This module organizes commands into logical submodules:
//! - `items`: Catalog CRUD, search and search analytics
//! - `users`: Directory users and roles
//! - `messages`: Sending and reading messages
//! - `notifications`: Per-user notification inbox
//! - `settings`: Runtime settings file
//!
//! Every command takes the `AppState` and returns a JSON value for printing.

pub mod items;
pub mod messages;
pub mod notifications;
pub mod settings;
pub mod users;

use crate::app::AppState;
use crate::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bkgt")]
#[command(author, version, about = "BKGT equipment catalog and club messaging")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the database and settings
    #[arg(long, env = "BKGT_DATA_DIR", default_value = "bkgt-data", global = true)]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Equipment catalog
    #[command(subcommand)]
    Items(items::ItemCommand),

    /// Directory users and roles
    #[command(subcommand)]
    Users(users::UserCommand),

    /// Messages between club members
    #[command(subcommand)]
    Messages(messages::MessageCommand),

    /// Per-user notifications
    #[command(subcommand)]
    Notifications(notifications::NotificationCommand),

    /// Runtime settings
    #[command(subcommand)]
    Settings(settings::SettingsCommand),
}

/// Run one command against the application state
pub async fn run(state: &AppState, command: Command) -> Result<serde_json::Value> {
    match command {
        Command::Items(cmd) => items::run(state, cmd).await,
        Command::Users(cmd) => users::run(state, cmd).await,
        Command::Messages(cmd) => messages::run(state, cmd).await,
        Command::Notifications(cmd) => notifications::run(state, cmd).await,
        Command::Settings(cmd) => settings::run(state, cmd).await,
    }
}

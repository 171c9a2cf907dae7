//! Directory commands

use crate::app::AppState;
use crate::database::Role;
use crate::error::Result;
use clap::Subcommand;
use serde_json::json;

#[derive(Subcommand)]
pub enum UserCommand {
    /// Register a user
    Add {
        login: String,
        #[arg(long)]
        name: Option<String>,
        /// Role to grant; repeat for several (coach, manager, admin)
        #[arg(long = "role")]
        roles: Vec<Role>,
    },

    /// Grant a role to an existing user
    Grant { user_id: i64, role: Role },

    /// Show the roles held by a user
    Roles { user_id: i64 },
}

pub async fn run(state: &AppState, command: UserCommand) -> Result<serde_json::Value> {
    match command {
        UserCommand::Add { login, name, roles } => {
            let display_name = name.unwrap_or_else(|| login.clone());
            let user = state.directory.add_user(&login, &display_name, &roles).await?;
            Ok(json!({ "user": user, "roles": roles }))
        }
        UserCommand::Grant { user_id, role } => {
            state.directory.grant_role(user_id, role).await?;
            Ok(json!({ "user_id": user_id, "granted": role }))
        }
        UserCommand::Roles { user_id } => {
            let roles = state.directory.roles(user_id).await?;
            Ok(json!({ "user_id": user_id, "roles": roles }))
        }
    }
}

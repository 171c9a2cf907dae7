//! User directory service
//!
//! Local stand-in for the club's identity provider: users, their roles,
//! and the capabilities those roles grant.

use crate::database::{Capability, Repository, Role, User};
use crate::error::Result;
use crate::services::recipients::RoleProvider;
use async_trait::async_trait;

#[derive(Clone)]
pub struct UserDirectory {
    repo: Repository,
}

impl UserDirectory {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Register a user with an optional set of roles
    pub async fn add_user(&self, login: &str, display_name: &str, roles: &[Role]) -> Result<User> {
        tracing::info!("Adding user: {}", login);

        let user = self.repo.create_user(login, display_name).await?;
        for role in roles {
            self.repo.grant_role(user.id, *role).await?;
        }

        Ok(user)
    }

    pub async fn grant_role(&self, user_id: i64, role: Role) -> Result<()> {
        tracing::info!("Granting {} to user {}", role.as_str(), user_id);
        self.repo.grant_role(user_id, role).await
    }

    pub async fn roles(&self, user_id: i64) -> Result<Vec<Role>> {
        self.repo.list_user_roles(user_id).await
    }
}

#[async_trait]
impl RoleProvider for UserDirectory {
    async fn all_users(&self) -> Result<Vec<i64>> {
        self.repo.list_user_ids().await
    }

    async fn users_with_role(&self, role: Role) -> Result<Vec<i64>> {
        self.repo.list_user_ids_with_role(role).await
    }

    async fn has_capability(&self, user_id: i64, capability: Capability) -> Result<bool> {
        let roles = self.repo.list_user_roles(user_id).await?;
        Ok(roles
            .iter()
            .any(|role| role.capabilities().contains(&capability)))
    }
}

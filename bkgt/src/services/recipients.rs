//! Recipient resolution
//!
//! Expands the recipient specs supplied with a message into concrete
//! user ids, using whatever identity provider the caller wires in.

use crate::database::{Capability, Role};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// Source of user and role information
#[async_trait]
pub trait RoleProvider: Send + Sync {
    /// Every known user id
    async fn all_users(&self) -> Result<Vec<i64>>;

    /// User ids currently holding `role`
    async fn users_with_role(&self, role: Role) -> Result<Vec<i64>>;

    async fn has_capability(&self, user_id: i64, capability: Capability) -> Result<bool>;
}

/// Symbolic recipient groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientGroup {
    All,
    Coaches,
    Managers,
}

/// One parsed entry of a message's recipient list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientSpec {
    Group(RecipientGroup),
    User(i64),
}

impl RecipientSpec {
    /// Parse a group tag or a positive user id. Anything else yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();

        match raw.to_lowercase().as_str() {
            "all" => Some(Self::Group(RecipientGroup::All)),
            "coaches" => Some(Self::Group(RecipientGroup::Coaches)),
            "managers" => Some(Self::Group(RecipientGroup::Managers)),
            _ => match raw.parse::<i64>() {
                Ok(id) if id > 0 => Some(Self::User(id)),
                _ => None,
            },
        }
    }
}

/// Expands recipient specs into unique user ids
#[derive(Clone)]
pub struct RecipientResolver {
    provider: Arc<dyn RoleProvider>,
}

impl RecipientResolver {
    pub fn new(provider: Arc<dyn RoleProvider>) -> Self {
        Self { provider }
    }

    /// Resolve specs to user ids in first-seen order without duplicates.
    ///
    /// Unknown tags and malformed ids are skipped.
    pub async fn resolve<S: AsRef<str>>(&self, specs: &[S]) -> Result<Vec<i64>> {
        let mut seen = HashSet::new();
        let mut user_ids = Vec::new();

        for raw in specs {
            let raw = raw.as_ref();

            let ids = match RecipientSpec::parse(raw) {
                Some(RecipientSpec::Group(RecipientGroup::All)) => self.provider.all_users().await?,
                Some(RecipientSpec::Group(RecipientGroup::Coaches)) => {
                    self.provider.users_with_role(Role::Coach).await?
                }
                Some(RecipientSpec::Group(RecipientGroup::Managers)) => {
                    self.provider.users_with_role(Role::Manager).await?
                }
                Some(RecipientSpec::User(id)) => vec![id],
                None => {
                    tracing::debug!("Skipping unknown recipient spec: {:?}", raw);
                    continue;
                }
            };

            for id in ids {
                if seen.insert(id) {
                    user_ids.push(id);
                }
            }
        }

        Ok(user_ids)
    }
}

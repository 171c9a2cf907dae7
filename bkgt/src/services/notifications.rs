//! Notifications service
//!
//! Per-user notification inbox: listing, unread counts, read-state
//! transitions and removal. Read and delete operations are idempotent.

use crate::config::MAX_NOTIFICATION_LIMIT;
use crate::database::{Notification, NotificationKind, Repository};
use crate::error::Result;
use crate::services::settings::NotificationSettings;
use chrono::{Duration, Utc};

#[derive(Clone)]
pub struct NotificationsService {
    repo: Repository,
    default_limit: u32,
}

impl NotificationsService {
    pub fn new(repo: Repository, settings: &NotificationSettings) -> Self {
        Self {
            repo,
            default_limit: settings.default_limit,
        }
    }

    /// Notifications for a user, newest first
    pub async fn list(
        &self,
        user_id: i64,
        limit: Option<u32>,
        unread_only: bool,
    ) -> Result<Vec<Notification>> {
        let limit = limit.unwrap_or(self.default_limit).min(MAX_NOTIFICATION_LIMIT);
        self.repo.list_notifications(user_id, limit, unread_only).await
    }

    pub async fn unread_count(&self, user_id: i64) -> Result<i64> {
        self.repo.count_unread_notifications(user_id).await
    }

    /// Create a standalone notification
    pub async fn create(
        &self,
        user_id: i64,
        message: &str,
        kind: NotificationKind,
    ) -> Result<Notification> {
        self.repo.create_notification(user_id, message, kind).await
    }

    /// Mark one notification read. Returns whether anything changed.
    pub async fn mark_read(&self, notification_id: i64) -> Result<bool> {
        let changed = self.repo.mark_notification_read(notification_id).await?;
        tracing::debug!("Marked notification {} read ({} changed)", notification_id, changed);
        Ok(changed > 0)
    }

    /// Mark every notification of a user read. Returns how many changed.
    pub async fn mark_all_read(&self, user_id: i64) -> Result<u64> {
        let changed = self.repo.mark_all_notifications_read(user_id).await?;
        tracing::info!("Marked {} notifications read for user {}", changed, user_id);
        Ok(changed)
    }

    /// Delete a notification. A missing id is not an error; returns
    /// whether a row was removed.
    pub async fn delete(&self, notification_id: i64) -> Result<bool> {
        let removed = self.repo.delete_notification(notification_id).await?;
        if removed == 0 {
            tracing::debug!("Notification {} already absent", notification_id);
        }
        Ok(removed > 0)
    }

    /// Remove read notifications older than `days`
    pub async fn cleanup_read_older_than(&self, days: u32) -> Result<u64> {
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        let removed = self.repo.delete_read_notifications_before(cutoff).await?;

        tracing::info!("Removed {} read notifications older than {} days", removed, days);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_memory_pool;

    async fn create_test_service() -> NotificationsService {
        let repo = Repository::new(create_memory_pool().await.unwrap());
        NotificationsService::new(repo, &NotificationSettings::default())
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let service = create_test_service().await;

        for text in ["first", "second", "third"] {
            service.create(1, text, NotificationKind::Info).await.unwrap();
        }
        service.create(2, "other user", NotificationKind::Info).await.unwrap();

        let list = service.list(1, None, false).await.unwrap();
        let messages: Vec<&str> = list.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["third", "second", "first"]);

        let limited = service.list(1, Some(2), false).await.unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn test_unread_filter_and_count() {
        let service = create_test_service().await;

        let a = service.create(1, "a", NotificationKind::Info).await.unwrap();
        service.create(1, "b", NotificationKind::Warning).await.unwrap();

        assert!(service.mark_read(a.id).await.unwrap());
        assert!(!service.mark_read(a.id).await.unwrap());

        assert_eq!(service.unread_count(1).await.unwrap(), 1);
        let unread = service.list(1, None, true).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].message, "b");
        assert_eq!(unread[0].kind, NotificationKind::Warning);
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let service = create_test_service().await;

        for _ in 0..3 {
            service.create(4, "ping", NotificationKind::Info).await.unwrap();
        }

        assert_eq!(service.mark_all_read(4).await.unwrap(), 3);
        assert_eq!(service.unread_count(4).await.unwrap(), 0);
        assert_eq!(service.mark_all_read(4).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let service = create_test_service().await;
        let n = service.create(1, "bye", NotificationKind::Info).await.unwrap();

        assert!(service.delete(n.id).await.unwrap());
        assert!(!service.delete(n.id).await.unwrap());
        assert!(!service.delete(12345).await.unwrap());
        assert!(service.list(1, None, false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_only_removes_old_read() {
        let service = create_test_service().await;

        let read = service.create(1, "read", NotificationKind::Info).await.unwrap();
        service.create(1, "unread", NotificationKind::Info).await.unwrap();
        service.mark_read(read.id).await.unwrap();

        // Nothing is older than a day yet
        assert_eq!(service.cleanup_read_older_than(1).await.unwrap(), 0);

        sqlx::query("UPDATE notifications SET created_at = ?")
            .bind(Utc::now() - Duration::days(40))
            .execute(service.repo.pool())
            .await
            .unwrap();

        assert_eq!(service.cleanup_read_older_than(30).await.unwrap(), 1);

        let remaining = service.list(1, None, false).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].message, "unread");
    }
}

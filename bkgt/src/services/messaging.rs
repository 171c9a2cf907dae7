//! Messaging service
//!
//! Validates outgoing messages, records them with their resolved
//! recipients, and fans out one notification per recipient.

use crate::config::{MAX_SUBJECT_LENGTH, SUBJECT_PLACEHOLDER};
use crate::database::{Capability, Message, NewMessage, NotificationKind, Repository};
use crate::error::{AppError, Result};
use crate::services::recipients::{RecipientResolver, RoleProvider};
use crate::services::settings::NotificationSettings;
use serde::Serialize;
use std::sync::Arc;

/// Outcome of a dispatch. `created < resolved` means some notification
/// inserts failed after the message was stored.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub message: Message,
    pub resolved: usize,
    pub created: usize,
}

#[derive(Clone)]
pub struct MessagingService {
    repo: Repository,
    provider: Arc<dyn RoleProvider>,
    resolver: RecipientResolver,
    template: String,
}

impl MessagingService {
    pub fn new(
        repo: Repository,
        provider: Arc<dyn RoleProvider>,
        settings: &NotificationSettings,
    ) -> Self {
        Self {
            repo,
            resolver: RecipientResolver::new(provider.clone()),
            provider,
            template: settings.message_template.clone(),
        }
    }

    /// Validate, store and fan out a message
    pub async fn dispatch(&self, message: NewMessage) -> Result<DispatchReport> {
        let sender_id = self.authorize(message.sender_id).await?;

        let subject = message.subject.trim();
        let body = message.body.trim();

        if subject.is_empty() || body.is_empty() {
            tracing::warn!("Message from {} rejected: empty subject or body", sender_id);
            return Err(AppError::InvalidMessage(
                "subject and body must not be empty".to_string(),
            ));
        }
        if subject.chars().count() > MAX_SUBJECT_LENGTH {
            return Err(AppError::InvalidMessage(format!(
                "subject longer than {} characters",
                MAX_SUBJECT_LENGTH
            )));
        }

        let recipient_ids = self.resolver.resolve(message.recipients.as_slice()).await?;

        let stored = self
            .repo
            .create_message(sender_id, subject, body, &message.recipients, &recipient_ids)
            .await?;

        let text = self.template.replace(SUBJECT_PLACEHOLDER, &stored.subject);
        let mut created = 0;

        for user_id in &recipient_ids {
            match self
                .repo
                .create_notification(*user_id, &text, NotificationKind::Message)
                .await
            {
                Ok(_) => created += 1,
                Err(e) => tracing::error!(
                    "Failed to notify user {} of message {}: {}",
                    user_id,
                    stored.id,
                    e
                ),
            }
        }

        tracing::info!(
            "Message {} sent by {}: {} of {} recipients notified",
            stored.id,
            sender_id,
            created,
            recipient_ids.len()
        );

        Ok(DispatchReport {
            message: stored,
            resolved: recipient_ids.len(),
            created,
        })
    }

    pub async fn get_message(&self, id: i64) -> Result<Message> {
        self.repo.get_message(id).await
    }

    /// Messages sent by or addressed to a user, newest first
    pub async fn list_user_messages(
        &self,
        user_id: i64,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Message>> {
        self.repo.list_user_messages(user_id, limit, offset).await
    }

    async fn authorize(&self, sender_id: Option<i64>) -> Result<i64> {
        let sender_id = match sender_id {
            Some(id) if id > 0 => id,
            _ => {
                tracing::warn!("Message rejected: no sender identified");
                return Err(AppError::Unauthorized("no sender identified".to_string()));
            }
        };

        if !self
            .provider
            .has_capability(sender_id, Capability::SendMessages)
            .await?
        {
            tracing::warn!("Message rejected: user {} may not send messages", sender_id);
            return Err(AppError::Unauthorized(format!(
                "user {} may not send messages",
                sender_id
            )));
        }

        Ok(sender_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{create_memory_pool, Role};
    use crate::services::notifications::NotificationsService;
    use crate::services::recipients::tests::StaticDirectory;

    const SENDER: i64 = 1;

    async fn create_test_services() -> (MessagingService, NotificationsService) {
        let repo = Repository::new(create_memory_pool().await.unwrap());
        let directory = StaticDirectory::default()
            .with_role(SENDER, Role::Admin)
            .with_role(5, Role::Coach)
            .with_role(7, Role::Coach)
            .with_user(8);

        let settings = NotificationSettings::default();
        let messaging = MessagingService::new(repo.clone(), Arc::new(directory), &settings);
        let notifications = NotificationsService::new(repo, &settings);

        (messaging, notifications)
    }

    fn message(sender: Option<i64>, subject: &str, body: &str, to: &[&str]) -> NewMessage {
        NewMessage {
            sender_id: sender,
            subject: subject.to_string(),
            body: body.to_string(),
            recipients: to.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_dispatch_to_coaches_and_explicit_id() {
        let (messaging, notifications) = create_test_services().await;

        let report = messaging
            .dispatch(message(Some(SENDER), "Hello", "Hi", &["coaches", "42"]))
            .await
            .unwrap();

        assert_eq!(report.resolved, 3);
        assert_eq!(report.created, 3);
        assert_eq!(report.message.recipients, vec!["coaches", "42"]);

        for user in [5, 7, 42] {
            let list = notifications.list(user, None, false).await.unwrap();
            assert_eq!(list.len(), 1);
            assert_eq!(list[0].message, "New message: Hello");
            assert_eq!(list[0].kind, NotificationKind::Message);
            assert!(!list[0].is_read);
        }

        assert!(notifications.list(8, None, false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_all_notifies_each_user_once() {
        let (messaging, notifications) = create_test_services().await;

        let report = messaging
            .dispatch(message(Some(SENDER), "Game day", "Be there", &["all", "5", "coaches"]))
            .await
            .unwrap();

        assert_eq!(report.resolved, 4);
        assert_eq!(notifications.unread_count(5).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_without_recipients_succeeds() {
        let (messaging, _) = create_test_services().await;

        let report = messaging
            .dispatch(message(Some(SENDER), "Note", "To self", &["players"]))
            .await
            .unwrap();

        assert_eq!(report.resolved, 0);
        assert_eq!(report.created, 0);
        assert!(messaging.get_message(report.message.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_or_unprivileged_sender() {
        let (messaging, notifications) = create_test_services().await;

        let result = messaging.dispatch(message(None, "Hi", "There", &["all"])).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));

        let result = messaging.dispatch(message(Some(8), "Hi", "There", &["all"])).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));

        assert_eq!(notifications.unread_count(5).await.unwrap(), 0);
        assert!(messaging.list_user_messages(8, 10, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_subject_or_body() {
        let (messaging, notifications) = create_test_services().await;

        let result = messaging
            .dispatch(message(Some(SENDER), "  ", "Body", &["coaches"]))
            .await;
        assert!(matches!(result, Err(AppError::InvalidMessage(_))));

        let result = messaging
            .dispatch(message(Some(SENDER), "Subject", "", &["coaches"]))
            .await;
        assert!(matches!(result, Err(AppError::InvalidMessage(_))));

        let long_subject = "x".repeat(MAX_SUBJECT_LENGTH + 1);
        let result = messaging
            .dispatch(message(Some(SENDER), &long_subject, "Body", &["coaches"]))
            .await;
        assert!(matches!(result, Err(AppError::InvalidMessage(_))));

        assert_eq!(notifications.unread_count(5).await.unwrap(), 0);
        assert!(messaging
            .list_user_messages(SENDER, 10, 0)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_failed_notification_is_skipped() {
        let (messaging, notifications) = create_test_services().await;

        sqlx::query(
            "CREATE TRIGGER reject_user_7 BEFORE INSERT ON notifications \
             WHEN NEW.user_id = 7 BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .execute(messaging.repo.pool())
        .await
        .unwrap();

        let report = messaging
            .dispatch(message(Some(SENDER), "Hello", "Hi", &["coaches", "42"]))
            .await
            .unwrap();

        assert_eq!(report.resolved, 3);
        assert_eq!(report.created, 2);

        let stored = messaging.get_message(report.message.id).await.unwrap();
        assert_eq!(stored.subject, "Hello");

        assert_eq!(notifications.unread_count(5).await.unwrap(), 1);
        assert_eq!(notifications.unread_count(7).await.unwrap(), 0);
        assert_eq!(notifications.unread_count(42).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_numeric_recipients_from_json() {
        let (messaging, notifications) = create_test_services().await;

        let new_message: NewMessage = serde_json::from_str(
            r#"{"sender_id":1,"subject":"Kit","body":"Collect kit","recipients":["managers",42,7]}"#,
        )
        .unwrap();
        assert_eq!(new_message.recipients, vec!["managers", "42", "7"]);

        let report = messaging.dispatch(new_message).await.unwrap();
        assert_eq!(report.created, 2);
        assert_eq!(notifications.unread_count(42).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_user_messages() {
        let (messaging, _) = create_test_services().await;

        messaging
            .dispatch(message(Some(SENDER), "First", "1", &["coaches"]))
            .await
            .unwrap();
        messaging
            .dispatch(message(Some(SENDER), "Second", "2", &["8"]))
            .await
            .unwrap();

        let for_coach = messaging.list_user_messages(5, 10, 0).await.unwrap();
        assert_eq!(for_coach.len(), 1);
        assert_eq!(for_coach[0].subject, "First");

        let for_sender = messaging.list_user_messages(SENDER, 10, 0).await.unwrap();
        let subjects: Vec<&str> = for_sender.iter().map(|m| m.subject.as_str()).collect();
        assert_eq!(subjects, vec!["Second", "First"]);
    }
}

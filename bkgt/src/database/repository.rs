//! Repository layer for database operations
//!
//! This module provides CRUD operations for all entities.
//! Multi-row writes that must land together use transactions.

use super::models::*;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

/// Raw message row; recipients are stored as a JSON array
#[derive(FromRow)]
struct MessageRow {
    id: i64,
    sender_id: i64,
    subject: String,
    body: String,
    recipients: String,
    sent_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = AppError;

    fn try_from(row: MessageRow) -> Result<Self> {
        Ok(Message {
            id: row.id,
            sender_id: row.sender_id,
            subject: row.subject,
            body: row.body,
            recipients: serde_json::from_str(&row.recipients)?,
            sent_at: row.sent_at,
        })
    }
}

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ===== Catalog =====

    /// Create a new catalog item
    pub async fn create_item(&self, req: CreateItemRequest) -> Result<Item> {
        let now = Utc::now();

        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO inventory_items (
                unique_identifier, title, size, notes, storage_location,
                condition_status, condition_reason, sticker_code, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&req.unique_identifier)
        .bind(&req.title)
        .bind(&req.size)
        .bind(&req.notes)
        .bind(&req.storage_location)
        .bind(req.condition_status)
        .bind(&req.condition_reason)
        .bind(&req.sticker_code)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created item: {} ({})", item.id, item.unique_identifier);
        Ok(item)
    }

    /// Get an item by ID
    pub async fn get_item(&self, id: i64) -> Result<Item> {
        sqlx::query_as::<_, Item>("SELECT * FROM inventory_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::ItemNotFound(id))
    }

    /// List items in creation order, optionally restricted to one condition
    pub async fn list_items(&self, condition: Option<ConditionStatus>) -> Result<Vec<Item>> {
        let items = match condition {
            Some(status) => {
                sqlx::query_as::<_, Item>(
                    "SELECT * FROM inventory_items WHERE condition_status = ? ORDER BY id ASC",
                )
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Item>("SELECT * FROM inventory_items ORDER BY id ASC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(items)
    }

    /// Update the mutable attributes of an item
    pub async fn update_item(&self, req: UpdateItemRequest) -> Result<Item> {
        let now = Utc::now();

        let mut query = "UPDATE inventory_items SET updated_at = ?".to_string();
        let mut params: Vec<String> = Vec::new();

        let columns = [
            ("title", req.title.clone()),
            ("size", req.size.clone()),
            ("notes", req.notes.clone()),
            ("storage_location", req.storage_location.clone()),
            (
                "condition_status",
                req.condition_status.map(|s| s.as_str().to_string()),
            ),
            ("condition_reason", req.condition_reason.clone()),
            ("sticker_code", req.sticker_code.clone()),
        ];

        for (column, value) in columns {
            if let Some(value) = value {
                query.push_str(&format!(", {} = ?", column));
                params.push(value);
            }
        }

        query.push_str(" WHERE id = ?");

        let mut q = sqlx::query(&query).bind(now);
        for param in &params {
            q = q.bind(param);
        }

        let rows_affected = q.bind(req.id).execute(&self.pool).await?.rows_affected();

        if rows_affected == 0 {
            return Err(AppError::ItemNotFound(req.id));
        }

        self.get_item(req.id).await
    }

    /// Delete an item
    pub async fn delete_item(&self, id: i64) -> Result<()> {
        let rows = sqlx::query("DELETE FROM inventory_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::ItemNotFound(id));
        }

        tracing::debug!("Deleted item: {}", id);
        Ok(())
    }

    // ===== Directory =====

    /// Create a directory user
    pub async fn create_user(&self, login: &str, display_name: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (login, display_name, created_at)
            VALUES (?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(login)
        .bind(display_name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created user: {} ({})", user.id, user.login);
        Ok(user)
    }

    /// Grant a role; granting a role twice is a no-op
    pub async fn grant_role(&self, user_id: i64, role: Role) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?, ?)")
            .bind(user_id)
            .bind(role)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Granted role {} to user {}", role.as_str(), user_id);
        Ok(())
    }

    pub async fn list_user_ids(&self) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar("SELECT id FROM users ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    pub async fn list_user_ids_with_role(&self, role: Role) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar(
            "SELECT user_id FROM user_roles WHERE role = ? ORDER BY user_id ASC",
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    pub async fn list_user_roles(&self, user_id: i64) -> Result<Vec<Role>> {
        let roles = sqlx::query_scalar("SELECT role FROM user_roles WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    // ===== Messages =====

    /// Insert a message together with its resolved recipients
    pub async fn create_message(
        &self,
        sender_id: i64,
        subject: &str,
        body: &str,
        recipient_specs: &[String],
        recipient_ids: &[i64],
    ) -> Result<Message> {
        let recipients_json = serde_json::to_string(recipient_specs)?;
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (sender_id, subject, body, recipients, sent_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(sender_id)
        .bind(subject)
        .bind(body)
        .bind(&recipients_json)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        for user_id in recipient_ids {
            sqlx::query("INSERT INTO message_recipients (message_id, user_id) VALUES (?, ?)")
                .bind(row.id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            "Created message: {} with {} recipients",
            row.id,
            recipient_ids.len()
        );
        row.try_into()
    }

    pub async fn get_message(&self, id: i64) -> Result<Message> {
        sqlx::query_as::<_, MessageRow>("SELECT * FROM messages WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::MessageNotFound(id))?
            .try_into()
    }

    /// Messages sent by or delivered to a user, newest first
    pub async fn list_user_messages(
        &self,
        user_id: i64,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT * FROM messages
            WHERE sender_id = ?
               OR id IN (SELECT message_id FROM message_recipients WHERE user_id = ?)
            ORDER BY sent_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Message::try_from).collect()
    }

    // ===== Notifications =====

    pub async fn create_notification(
        &self,
        user_id: i64,
        message: &str,
        kind: NotificationKind,
    ) -> Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, message, kind, is_read, created_at)
            VALUES (?, ?, ?, 0, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(message)
        .bind(kind)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created {} notification {} for user {}", kind, notification.id, user_id);
        Ok(notification)
    }

    /// Notifications for a user, newest first
    pub async fn list_notifications(
        &self,
        user_id: i64,
        limit: u32,
        unread_only: bool,
    ) -> Result<Vec<Notification>> {
        let mut query = "SELECT * FROM notifications WHERE user_id = ?".to_string();

        if unread_only {
            query.push_str(" AND is_read = 0");
        }

        query.push_str(" ORDER BY created_at DESC, id DESC LIMIT ?");

        let notifications = sqlx::query_as::<_, Notification>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(notifications)
    }

    pub async fn count_unread_notifications(&self, user_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Returns the number of notifications that changed state
    pub async fn mark_notification_read(&self, id: i64) -> Result<u64> {
        let rows = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND is_read = 0")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows)
    }

    pub async fn mark_all_notifications_read(&self, user_id: i64) -> Result<u64> {
        let rows =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
                .bind(user_id)
                .execute(&self.pool)
                .await?
                .rows_affected();

        Ok(rows)
    }

    pub async fn delete_notification(&self, id: i64) -> Result<u64> {
        let rows = sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows)
    }

    /// Delete read notifications created before `cutoff`
    pub async fn delete_read_notifications_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let rows = sqlx::query("DELETE FROM notifications WHERE is_read = 1 AND created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows)
    }

    // ===== Search analytics =====

    pub async fn record_search(&self, entry: &SearchLogEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO search_logs (
                search_term, results_count, search_fields, search_operator,
                fuzzy, search_time_ms, user_id, timestamp
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.search_term)
        .bind(entry.results_count)
        .bind(&entry.search_fields)
        .bind(&entry.search_operator)
        .bind(entry.fuzzy)
        .bind(entry.search_time_ms)
        .bind(entry.user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most frequent search terms
    pub async fn search_term_stats(&self, limit: u32) -> Result<Vec<SearchTermStats>> {
        let stats = sqlx::query_as::<_, SearchTermStats>(
            r#"
            SELECT search_term,
                   COUNT(*) AS searches,
                   CAST(AVG(results_count) AS REAL) AS avg_results,
                   CAST(AVG(search_time_ms) AS REAL) AS avg_time_ms
            FROM search_logs
            GROUP BY search_term
            ORDER BY searches DESC, search_term ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_memory_pool;

    async fn create_test_repo() -> Repository {
        Repository::new(create_memory_pool().await.unwrap())
    }

    fn item(identifier: &str, title: &str) -> CreateItemRequest {
        CreateItemRequest {
            unique_identifier: identifier.to_string(),
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_get_item() {
        let repo = create_test_repo().await;

        let created = repo
            .create_item(CreateItemRequest {
                size: Some("Large".to_string()),
                ..item("0001-0001-00001", "Helmet")
            })
            .await
            .unwrap();

        let fetched = repo.get_item(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.size.as_deref(), Some("Large"));
        assert_eq!(fetched.notes, None);
        assert_eq!(fetched.condition_status, ConditionStatus::Normal);
    }

    #[tokio::test]
    async fn test_duplicate_identifier_is_rejected() {
        let repo = create_test_repo().await;

        repo.create_item(item("DUP-1", "Helmet")).await.unwrap();
        let result = repo.create_item(item("DUP-1", "Shoulder pads")).await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_update_item_keeps_identifier() {
        let repo = create_test_repo().await;
        let created = repo.create_item(item("0001-0001-00002", "Jersey")).await.unwrap();

        let updated = repo
            .update_item(UpdateItemRequest {
                id: created.id,
                notes: Some("Torn sleeve".to_string()),
                condition_status: Some(ConditionStatus::NeedsRepair),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.unique_identifier, "0001-0001-00002");
        assert_eq!(updated.title, "Jersey");
        assert_eq!(updated.notes.as_deref(), Some("Torn sleeve"));
        assert_eq!(updated.condition_status, ConditionStatus::NeedsRepair);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_item() {
        let repo = create_test_repo().await;

        let update = repo
            .update_item(UpdateItemRequest {
                id: 99,
                title: Some("Ghost".to_string()),
                ..Default::default()
            })
            .await;
        assert!(matches!(update, Err(AppError::ItemNotFound(99))));

        let delete = repo.delete_item(99).await;
        assert!(matches!(delete, Err(AppError::ItemNotFound(99))));
    }

    #[tokio::test]
    async fn test_list_items_by_condition() {
        let repo = create_test_repo().await;

        repo.create_item(item("A", "Ball")).await.unwrap();
        repo.create_item(CreateItemRequest {
            condition_status: ConditionStatus::Scrapped,
            ..item("B", "Old ball")
        })
        .await
        .unwrap();

        let all = repo.list_items(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].unique_identifier, "A");

        let scrapped = repo.list_items(Some(ConditionStatus::Scrapped)).await.unwrap();
        assert_eq!(scrapped.len(), 1);
        assert_eq!(scrapped[0].unique_identifier, "B");
    }

    #[tokio::test]
    async fn test_roles() {
        let repo = create_test_repo().await;

        let coach = repo.create_user("coach", "Coach").await.unwrap();
        let player = repo.create_user("player", "Player").await.unwrap();

        repo.grant_role(coach.id, Role::Coach).await.unwrap();
        repo.grant_role(coach.id, Role::Coach).await.unwrap();

        assert_eq!(repo.list_user_ids().await.unwrap(), vec![coach.id, player.id]);
        assert_eq!(
            repo.list_user_ids_with_role(Role::Coach).await.unwrap(),
            vec![coach.id]
        );
        assert_eq!(repo.list_user_roles(coach.id).await.unwrap(), vec![Role::Coach]);
        assert!(repo.list_user_roles(player.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_message_round_trip() {
        let repo = create_test_repo().await;
        let specs = vec!["coaches".to_string(), "42".to_string()];

        let message = repo
            .create_message(1, "Practice", "Moved to 18:00", &specs, &[5, 42])
            .await
            .unwrap();

        let fetched = repo.get_message(message.id).await.unwrap();
        assert_eq!(fetched.recipients, specs);

        let for_recipient = repo.list_user_messages(42, 10, 0).await.unwrap();
        assert_eq!(for_recipient.len(), 1);

        let for_sender = repo.list_user_messages(1, 10, 0).await.unwrap();
        assert_eq!(for_sender.len(), 1);

        let for_stranger = repo.list_user_messages(7, 10, 0).await.unwrap();
        assert!(for_stranger.is_empty());
    }

    #[tokio::test]
    async fn test_notification_read_state() {
        let repo = create_test_repo().await;

        let n = repo
            .create_notification(3, "Hello", NotificationKind::Info)
            .await
            .unwrap();
        assert!(!n.is_read);
        assert_eq!(repo.count_unread_notifications(3).await.unwrap(), 1);

        assert_eq!(repo.mark_notification_read(n.id).await.unwrap(), 1);
        assert_eq!(repo.mark_notification_read(n.id).await.unwrap(), 0);
        assert_eq!(repo.count_unread_notifications(3).await.unwrap(), 0);

        assert_eq!(repo.delete_notification(n.id).await.unwrap(), 1);
        assert_eq!(repo.delete_notification(n.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_term_stats() {
        let repo = create_test_repo().await;

        for (term, count) in [("TDJ", 1), ("TDJ", 3), ("helmet", 0)] {
            repo.record_search(&SearchLogEntry {
                search_term: term.to_string(),
                results_count: count,
                search_fields: "size".to_string(),
                search_operator: "OR".to_string(),
                fuzzy: false,
                search_time_ms: 2,
                user_id: None,
            })
            .await
            .unwrap();
        }

        let stats = repo.search_term_stats(10).await.unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].search_term, "TDJ");
        assert_eq!(stats[0].searches, 2);
        assert!((stats[0].avg_results - 2.0).abs() < f64::EPSILON);
    }
}

//! Settings service
//!
//! Manages runtime settings persistence using JSON file storage.

use crate::config::{
    DEFAULT_FUZZY_THRESHOLD, DEFAULT_MESSAGE_TEMPLATE, DEFAULT_NOTIFICATION_LIMIT,
    DEFAULT_NOTIFICATION_RETENTION_DAYS, DEFAULT_SEARCH_PAGE_SIZE, MAX_FUZZY_THRESHOLD,
    MAX_NOTIFICATION_LIMIT, MAX_NOTIFICATION_RETENTION_DAYS, MAX_SEARCH_PAGE_SIZE,
    MIN_FUZZY_THRESHOLD, SETTINGS_FILE_NAME, SUBJECT_PLACEHOLDER,
};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// Catalog search behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Page size used when a caller does not ask for one
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    /// Minimum similarity ratio for a fuzzy token match
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f32,
    /// Whether searches from the command line are recorded for analytics
    #[serde(default = "default_true")]
    pub log_searches: bool,
}

fn default_page_size() -> u32 {
    DEFAULT_SEARCH_PAGE_SIZE
}

fn default_fuzzy_threshold() -> f32 {
    DEFAULT_FUZZY_THRESHOLD
}

fn default_true() -> bool {
    true
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            fuzzy_threshold: default_fuzzy_threshold(),
            log_searches: true,
        }
    }
}

/// Notification fan-out and listing behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_notification_limit")]
    pub default_limit: u32,
    /// Body of a message notification; `{subject}` is replaced
    #[serde(default = "default_message_template")]
    pub message_template: String,
    /// Read notifications older than this are removed by cleanup
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_notification_limit() -> u32 {
    DEFAULT_NOTIFICATION_LIMIT
}

fn default_message_template() -> String {
    DEFAULT_MESSAGE_TEMPLATE.to_string()
}

fn default_retention_days() -> u32 {
    DEFAULT_NOTIFICATION_RETENTION_DAYS
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            default_limit: default_notification_limit(),
            message_template: default_message_template(),
            retention_days: default_retention_days(),
        }
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppSettings {
    #[serde(default)]
    pub search: SearchSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
}

impl AppSettings {
    /// Check every value against the limits in `config`
    pub fn validate(&self) -> Result<()> {
        let search = &self.search;
        if search.default_page_size == 0 || search.default_page_size > MAX_SEARCH_PAGE_SIZE {
            return Err(AppError::Settings(format!(
                "search.default_page_size must be between 1 and {}",
                MAX_SEARCH_PAGE_SIZE
            )));
        }
        if !(MIN_FUZZY_THRESHOLD..=MAX_FUZZY_THRESHOLD).contains(&search.fuzzy_threshold) {
            return Err(AppError::Settings(format!(
                "search.fuzzy_threshold must be between {} and {}",
                MIN_FUZZY_THRESHOLD, MAX_FUZZY_THRESHOLD
            )));
        }

        let notifications = &self.notifications;
        if notifications.default_limit == 0
            || notifications.default_limit > MAX_NOTIFICATION_LIMIT
        {
            return Err(AppError::Settings(format!(
                "notifications.default_limit must be between 1 and {}",
                MAX_NOTIFICATION_LIMIT
            )));
        }
        if !notifications.message_template.contains(SUBJECT_PLACEHOLDER) {
            return Err(AppError::Settings(format!(
                "notifications.message_template must contain {}",
                SUBJECT_PLACEHOLDER
            )));
        }
        if notifications.retention_days == 0
            || notifications.retention_days > MAX_NOTIFICATION_RETENTION_DAYS
        {
            return Err(AppError::Settings(format!(
                "notifications.retention_days must be between 1 and {}",
                MAX_NOTIFICATION_RETENTION_DAYS
            )));
        }

        Ok(())
    }
}

/// Service for managing application settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            settings_path: data_dir.join(SETTINGS_FILE_NAME),
        }
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Settings(format!("Failed to parse settings: {}", e)))?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate and save settings to disk
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        settings.validate()?;

        let content = serde_json::to_string_pretty(settings)?;

        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    pub async fn update_search(&self, search: SearchSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.search = search;
        self.save(&settings).await
    }

    pub async fn update_notifications(&self, notifications: NotificationSettings) -> Result<()> {
        let mut settings = self.load().await?;
        settings.notifications = notifications;
        self.save(&settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_service() -> (SettingsService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let service = SettingsService::new(temp_dir.path().to_path_buf());
        (service, temp_dir)
    }

    #[tokio::test]
    async fn test_default_settings_created_on_load() {
        let (service, temp) = create_test_service();

        let settings = service.load().await.unwrap();

        assert_eq!(settings.search.default_page_size, 10);
        assert!(settings.search.log_searches);
        assert_eq!(settings.notifications.message_template, "New message: {subject}");
        assert!(temp.path().join(SETTINGS_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let (service, temp) = create_test_service();
        std::fs::write(
            temp.path().join(SETTINGS_FILE_NAME),
            r#"{"search":{"fuzzy_threshold":0.9}}"#,
        )
        .unwrap();

        let settings = service.load().await.unwrap();

        assert!((settings.search.fuzzy_threshold - 0.9).abs() < f32::EPSILON);
        assert_eq!(settings.search.default_page_size, 10);
        assert_eq!(settings.notifications, NotificationSettings::default());
    }

    #[tokio::test]
    async fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();

        {
            let service = SettingsService::new(temp_dir.path().to_path_buf());
            service
                .update_notifications(NotificationSettings {
                    message_template: "Nytt meddelande: {subject}".to_string(),
                    ..NotificationSettings::default()
                })
                .await
                .unwrap();
        }

        {
            let service = SettingsService::new(temp_dir.path().to_path_buf());
            let loaded = service.load().await.unwrap();
            assert_eq!(
                loaded.notifications.message_template,
                "Nytt meddelande: {subject}"
            );
        }
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected() {
        let (service, _temp) = create_test_service();

        let result = service
            .update_search(SearchSettings {
                fuzzy_threshold: 0.1,
                ..SearchSettings::default()
            })
            .await;
        assert!(matches!(result, Err(AppError::Settings(_))));

        let result = service
            .update_notifications(NotificationSettings {
                message_template: "no placeholder".to_string(),
                ..NotificationSettings::default()
            })
            .await;
        assert!(matches!(result, Err(AppError::Settings(_))));
    }
}

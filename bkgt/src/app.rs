//! Application state and initialization
//!
//! This module owns the service graph. The process entry point builds one
//! `AppState` and hands references to whatever transport drives it.

use crate::config::DATABASE_FILE_NAME;
use crate::database::{create_memory_pool, create_pool, Repository};
use crate::error::Result;
use crate::services::{
    AppSettings, CatalogService, MessagingService, NotificationsService, SettingsService,
    UserDirectory,
};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub data_dir: Option<PathBuf>,
    pub settings: AppSettings,
    pub catalog: CatalogService,
    pub directory: UserDirectory,
    pub messaging: MessagingService,
    pub notifications: NotificationsService,
}

impl AppState {
    /// Open (creating if needed) the database and settings under `data_dir`
    pub async fn open(data_dir: &Path) -> Result<Self> {
        tracing::info!("Initializing application in {:?}", data_dir);

        std::fs::create_dir_all(data_dir)?;

        let settings = SettingsService::new(data_dir.to_path_buf()).load().await?;
        let pool = create_pool(&data_dir.join(DATABASE_FILE_NAME)).await?;

        let mut state = Self::build(pool, settings);
        state.data_dir = Some(data_dir.to_path_buf());

        tracing::info!("Application initialized successfully");
        Ok(state)
    }

    /// State backed by a private in-memory database
    pub async fn in_memory(settings: AppSettings) -> Result<Self> {
        settings.validate()?;
        let pool = create_memory_pool().await?;
        Ok(Self::build(pool, settings))
    }

    fn build(pool: SqlitePool, settings: AppSettings) -> Self {
        let repo = Repository::new(pool);
        let directory = UserDirectory::new(repo.clone());

        Self {
            data_dir: None,
            catalog: CatalogService::new(repo.clone(), &settings.search),
            messaging: MessagingService::new(
                repo.clone(),
                Arc::new(directory.clone()),
                &settings.notifications,
            ),
            notifications: NotificationsService::new(repo, &settings.notifications),
            directory,
            settings,
        }
    }
}

//! Catalog service
//!
//! Equipment item lifecycle plus search. Searches load the candidate
//! rows (pre-filtered by condition in SQL) and hand them to the
//! `SearchEngine`.

use crate::config::MAX_LOGGED_TERM_LENGTH;
use crate::database::{
    CreateItemRequest, Item, Repository, SearchLogEntry, SearchTermStats, UpdateItemRequest,
};
use crate::error::Result;
use crate::services::search::{SearchEngine, SearchQuery};
use crate::services::settings::SearchSettings;
use std::sync::Arc;
use std::time::Instant;

/// Service for managing and searching catalog items
#[derive(Clone)]
pub struct CatalogService {
    repo: Repository,
    engine: Arc<SearchEngine>,
}

impl CatalogService {
    pub fn new(repo: Repository, settings: &SearchSettings) -> Self {
        Self {
            repo,
            engine: Arc::new(SearchEngine::new(settings.fuzzy_threshold)),
        }
    }

    pub async fn create_item(&self, req: CreateItemRequest) -> Result<Item> {
        tracing::info!("Creating item: {}", req.unique_identifier);

        let item = self.repo.create_item(req).await?;

        tracing::info!("Item created successfully: {}", item.id);
        Ok(item)
    }

    pub async fn get_item(&self, id: i64) -> Result<Item> {
        self.repo.get_item(id).await
    }

    pub async fn list_items(&self) -> Result<Vec<Item>> {
        self.repo.list_items(None).await
    }

    pub async fn update_item(&self, req: UpdateItemRequest) -> Result<Item> {
        tracing::debug!("Updating item: {}", req.id);
        self.repo.update_item(req).await
    }

    pub async fn delete_item(&self, id: i64) -> Result<()> {
        tracing::info!("Deleting item: {}", id);
        self.repo.delete_item(id).await
    }

    /// Search the catalog. Read-only.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Item>> {
        let candidates = self.repo.list_items(query.condition).await?;
        let candidate_count = candidates.len();

        let results = self.engine.run(candidates, query);

        tracing::debug!(
            "Search {:?} matched {} of {} items",
            query.term,
            results.len(),
            candidate_count
        );

        Ok(results)
    }

    /// Search and record the request in the analytics log
    pub async fn search_logged(
        &self,
        query: &SearchQuery,
        user_id: Option<i64>,
    ) -> Result<Vec<Item>> {
        let started = Instant::now();
        let results = self.search(query).await?;
        let elapsed_ms = started.elapsed().as_millis() as i64;

        let fields: Vec<&str> = query.effective_fields().iter().map(|f| f.as_str()).collect();
        let entry = SearchLogEntry {
            search_term: query.term.trim().chars().take(MAX_LOGGED_TERM_LENGTH).collect(),
            results_count: results.len() as i64,
            search_fields: fields.join(","),
            search_operator: query.operator.as_str().to_string(),
            fuzzy: query.fuzzy,
            search_time_ms: elapsed_ms,
            user_id,
        };

        if let Err(e) = self.repo.record_search(&entry).await {
            tracing::warn!("Failed to record search analytics: {}", e);
        }

        Ok(results)
    }

    /// Most frequent search terms with average result count and latency
    pub async fn search_analytics(&self, limit: u32) -> Result<Vec<SearchTermStats>> {
        self.repo.search_term_stats(limit).await
    }
}

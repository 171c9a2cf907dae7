//! Catalog commands
//!
//! CRUD operations, search and search analytics for equipment items.

use crate::app::AppState;
use crate::database::{ConditionStatus, CreateItemRequest, UpdateItemRequest};
use crate::error::Result;
use crate::services::search::{
    MatchMode, Operator, SearchField, SearchQuery, Sort, SortDirection, SortKey,
};
use clap::Subcommand;
use serde_json::json;

#[derive(Subcommand)]
pub enum ItemCommand {
    /// Add an item to the catalog
    Add {
        /// Unique identifier, e.g. 0001-0002-00003
        #[arg(long)]
        identifier: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        size: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, default_value = "normal")]
        condition: ConditionStatus,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        sticker: Option<String>,
    },

    /// Show one item
    Get { id: i64 },

    /// List every item in creation order
    List,

    /// Change mutable attributes of an item
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        size: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        condition: Option<ConditionStatus>,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        sticker: Option<String>,
    },

    /// Remove an item
    Delete { id: i64 },

    /// Search the catalog
    Search {
        /// Search term; omit to match everything
        #[arg(default_value = "")]
        term: String,
        /// Comma separated fields, e.g. size,notes
        #[arg(long)]
        fields: Option<String>,
        #[arg(long, default_value = "partial")]
        mode: MatchMode,
        #[arg(long)]
        fuzzy: bool,
        #[arg(long, default_value = "OR")]
        operator: Operator,
        #[arg(long)]
        condition: Option<ConditionStatus>,
        #[arg(long)]
        sort: Option<SortKey>,
        #[arg(long)]
        desc: bool,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
        /// User performing the search, recorded in analytics
        #[arg(long)]
        user: Option<i64>,
    },

    /// Most frequent search terms
    Analytics {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

pub async fn run(state: &AppState, command: ItemCommand) -> Result<serde_json::Value> {
    match command {
        ItemCommand::Add {
            identifier,
            title,
            size,
            notes,
            location,
            condition,
            reason,
            sticker,
        } => {
            let item = state
                .catalog
                .create_item(CreateItemRequest {
                    unique_identifier: identifier,
                    title,
                    size,
                    notes,
                    storage_location: location,
                    condition_status: condition,
                    condition_reason: reason,
                    sticker_code: sticker,
                })
                .await?;
            Ok(serde_json::to_value(item)?)
        }
        ItemCommand::Get { id } => Ok(serde_json::to_value(state.catalog.get_item(id).await?)?),
        ItemCommand::List => Ok(serde_json::to_value(state.catalog.list_items().await?)?),
        ItemCommand::Update {
            id,
            title,
            size,
            notes,
            location,
            condition,
            reason,
            sticker,
        } => {
            let item = state
                .catalog
                .update_item(UpdateItemRequest {
                    id,
                    title,
                    size,
                    notes,
                    storage_location: location,
                    condition_status: condition,
                    condition_reason: reason,
                    sticker_code: sticker,
                })
                .await?;
            Ok(serde_json::to_value(item)?)
        }
        ItemCommand::Delete { id } => {
            state.catalog.delete_item(id).await?;
            Ok(json!({ "deleted": id }))
        }
        ItemCommand::Search {
            term,
            fields,
            mode,
            fuzzy,
            operator,
            condition,
            sort,
            desc,
            limit,
            offset,
            user,
        } => {
            let fields = match fields {
                Some(list) => SearchField::parse_list(&list)?,
                None => Vec::new(),
            };

            let query = SearchQuery {
                term,
                fields,
                mode,
                fuzzy,
                operator,
                condition,
                sort: sort.map(|key| Sort {
                    key,
                    direction: if desc { SortDirection::Desc } else { SortDirection::Asc },
                }),
                limit: Some(limit.unwrap_or(state.settings.search.default_page_size)),
                offset: Some(offset),
            };

            let items = if state.settings.search.log_searches {
                state.catalog.search_logged(&query, user).await?
            } else {
                state.catalog.search(&query).await?
            };

            Ok(json!({ "count": items.len(), "items": items }))
        }
        ItemCommand::Analytics { limit } => {
            Ok(serde_json::to_value(state.catalog.search_analytics(limit).await?)?)
        }
    }
}

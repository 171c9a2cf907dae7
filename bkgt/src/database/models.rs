//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde so the command line can print them as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Physical condition of a piece of equipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ConditionStatus {
    #[default]
    Normal,
    NeedsRepair,
    Repaired,
    ReportedLost,
    Scrapped,
}

impl ConditionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::NeedsRepair => "needs_repair",
            Self::Repaired => "repaired",
            Self::ReportedLost => "reported_lost",
            Self::Scrapped => "scrapped",
        }
    }
}

impl FromStr for ConditionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "needs_repair" => Ok(Self::NeedsRepair),
            "repaired" => Ok(Self::Repaired),
            "reported_lost" => Ok(Self::ReportedLost),
            "scrapped" => Ok(Self::Scrapped),
            other => Err(format!("unknown condition status: {}", other)),
        }
    }
}

/// A catalogued equipment item.
///
/// `id` and `unique_identifier` never change after creation. Every other
/// attribute except `title` may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: i64,
    pub unique_identifier: String,
    pub title: String,
    pub size: Option<String>,
    pub notes: Option<String>,
    pub storage_location: Option<String>,
    pub condition_status: ConditionStatus,
    pub condition_reason: Option<String>,
    pub sticker_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create item request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateItemRequest {
    pub unique_identifier: String,
    pub title: String,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub storage_location: Option<String>,
    #[serde(default)]
    pub condition_status: ConditionStatus,
    #[serde(default)]
    pub condition_reason: Option<String>,
    #[serde(default)]
    pub sticker_code: Option<String>,
}

/// Update item request. Only `Some` fields are written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateItemRequest {
    pub id: i64,
    pub title: Option<String>,
    pub size: Option<String>,
    pub notes: Option<String>,
    pub storage_location: Option<String>,
    pub condition_status: Option<ConditionStatus>,
    pub condition_reason: Option<String>,
    pub sticker_code: Option<String>,
}

/// Roles recognised by the club directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum Role {
    #[serde(rename = "bkgt_admin")]
    #[sqlx(rename = "bkgt_admin")]
    Admin,
    #[serde(rename = "bkgt_coach")]
    #[sqlx(rename = "bkgt_coach")]
    Coach,
    #[serde(rename = "bkgt_manager")]
    #[sqlx(rename = "bkgt_manager")]
    Manager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "bkgt_admin",
            Self::Coach => "bkgt_coach",
            Self::Manager => "bkgt_manager",
        }
    }

    /// Capabilities granted by this role
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Self::Admin | Self::Coach | Self::Manager => &[Capability::SendMessages],
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bkgt_admin" | "admin" => Ok(Self::Admin),
            "bkgt_coach" | "coach" => Ok(Self::Coach),
            "bkgt_manager" | "manager" => Ok(Self::Manager),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Permission checked before privileged operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    SendMessages,
}

/// A member of the club directory
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// Message submitted by a sender, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    pub sender_id: Option<i64>,
    pub subject: String,
    pub body: String,
    /// Group tags (`all`, `coaches`, `managers`) or user ids
    #[serde(deserialize_with = "recipient_specs")]
    pub recipients: Vec<String>,
}

/// Accept recipient specs given as strings or bare numbers
fn recipient_specs<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;

    Ok(values
        .into_iter()
        .filter_map(|value| match value {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect())
}

/// A persisted message. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub subject: String,
    pub body: String,
    /// Recipient specs exactly as supplied by the sender
    pub recipients: Vec<String>,
    pub sent_at: DateTime<Utc>,
}

/// Notification type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum NotificationKind {
    Message,
    #[default]
    Info,
    Warning,
    Alert,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Message => "message",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Alert => "alert",
        };
        f.write_str(s)
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "message" => Ok(Self::Message),
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "alert" => Ok(Self::Alert),
            other => Err(format!("unknown notification kind: {}", other)),
        }
    }
}

/// Per-user notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// One executed search, recorded for analytics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchLogEntry {
    pub search_term: String,
    pub results_count: i64,
    /// Comma separated field names
    pub search_fields: String,
    pub search_operator: String,
    pub fuzzy: bool,
    pub search_time_ms: i64,
    pub user_id: Option<i64>,
}

/// Aggregated analytics for one search term
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SearchTermStats {
    pub search_term: String,
    pub searches: i64,
    pub avg_results: f64,
    pub avg_time_ms: f64,
}

//! Catalog search engine
//!
//! Query types and the in-memory matcher applied to items loaded from
//! the repository. Text matching happens here rather than in SQL so
//! that exact, partial and fuzzy modes share one code path.

use crate::config::{DEFAULT_FUZZY_THRESHOLD, MAX_SEARCH_PAGE_SIZE};
use crate::database::{ConditionStatus, Item};
use crate::error::{AppError, Result};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Text attributes of an item that can be searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    Title,
    UniqueIdentifier,
    Size,
    Notes,
    StorageLocation,
    ConditionReason,
    StickerCode,
}

impl SearchField {
    /// Fields searched when a query names none
    pub const DEFAULTS: &'static [SearchField] = &[
        SearchField::Title,
        SearchField::UniqueIdentifier,
        SearchField::Size,
        SearchField::Notes,
        SearchField::StorageLocation,
        SearchField::StickerCode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::UniqueIdentifier => "unique_identifier",
            Self::Size => "size",
            Self::Notes => "notes",
            Self::StorageLocation => "storage_location",
            Self::ConditionReason => "condition_reason",
            Self::StickerCode => "sticker_code",
        }
    }

    /// Value of this field on `item`, if present
    pub fn value<'a>(&self, item: &'a Item) -> Option<&'a str> {
        match self {
            Self::Title => Some(item.title.as_str()),
            Self::UniqueIdentifier => Some(item.unique_identifier.as_str()),
            Self::Size => item.size.as_deref(),
            Self::Notes => item.notes.as_deref(),
            Self::StorageLocation => item.storage_location.as_deref(),
            Self::ConditionReason => item.condition_reason.as_deref(),
            Self::StickerCode => item.sticker_code.as_deref(),
        }
    }

    /// Parse a comma separated field list such as `"storage_location,size"`.
    ///
    /// Blank entries are skipped; an unknown name fails the whole list.
    pub fn parse_list(list: &str) -> Result<Vec<SearchField>> {
        let mut fields = Vec::new();

        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let field: SearchField = name.parse()?;
            if !fields.contains(&field) {
                fields.push(field);
            }
        }

        Ok(fields)
    }
}

impl FromStr for SearchField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "unique_identifier" => Ok(Self::UniqueIdentifier),
            "size" => Ok(Self::Size),
            "notes" => Ok(Self::Notes),
            "storage_location" => Ok(Self::StorageLocation),
            "condition_reason" => Ok(Self::ConditionReason),
            "sticker_code" => Ok(Self::StickerCode),
            _ => Err(AppError::InvalidQueryField(s.to_string())),
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the term is compared with a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Case-insensitive substring
    #[default]
    Partial,
    /// Case-insensitive equality with the whole value
    Exact,
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "partial" => Ok(Self::Partial),
            "exact" => Ok(Self::Exact),
            other => Err(format!("unknown search mode: {}", other)),
        }
    }
}

/// How per-field matches are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    And,
    #[default]
    Or,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AND" => Ok(Self::And),
            "OR" => Ok(Self::Or),
            other => Err(format!("unknown search operator: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Title,
    Size,
    StorageLocation,
    CreatedAt,
    UpdatedAt,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "size" => Ok(Self::Size),
            "storage_location" => Ok(Self::StorageLocation),
            "created_at" => Ok(Self::CreatedAt),
            "updated_at" => Ok(Self::UpdatedAt),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub key: SortKey,
    #[serde(default)]
    pub direction: SortDirection,
}

/// A catalog search request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Empty means no text filter
    #[serde(default)]
    pub term: String,
    /// Empty means `SearchField::DEFAULTS`
    #[serde(default)]
    pub fields: Vec<SearchField>,
    #[serde(default)]
    pub mode: MatchMode,
    /// Typo tolerant matching; ignored in exact mode
    #[serde(default)]
    pub fuzzy: bool,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default)]
    pub condition: Option<ConditionStatus>,
    #[serde(default)]
    pub sort: Option<Sort>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
}

impl SearchQuery {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Default::default()
        }
    }

    pub fn fields(mut self, fields: Vec<SearchField>) -> Self {
        self.fields = fields;
        self
    }

    pub fn mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn fuzzy(mut self, fuzzy: bool) -> Self {
        self.fuzzy = fuzzy;
        self
    }

    pub fn operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    pub fn condition(mut self, condition: ConditionStatus) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn sort(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort = Some(Sort { key, direction });
        self
    }

    pub fn page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Fields this query actually searches
    pub fn effective_fields(&self) -> &[SearchField] {
        if self.fields.is_empty() {
            SearchField::DEFAULTS
        } else {
            &self.fields
        }
    }
}

/// Matches items against a query
pub struct SearchEngine {
    fuzzy_threshold: f32,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZY_THRESHOLD)
    }
}

impl SearchEngine {
    pub fn new(fuzzy_threshold: f32) -> Self {
        Self { fuzzy_threshold }
    }

    /// Filter, sort and paginate `items`, which must be in creation order
    pub fn run(&self, items: Vec<Item>, query: &SearchQuery) -> Vec<Item> {
        let term = query.term.trim().to_lowercase();
        let fields = query.effective_fields();
        let skim = SkimMatcherV2::default();

        let mut matched: Vec<Item> = items
            .into_iter()
            .filter(|item| query.condition.map_or(true, |c| item.condition_status == c))
            .filter(|item| term.is_empty() || self.matches_item(&skim, item, fields, &term, query))
            .collect();

        if let Some(sort) = query.sort {
            matched.sort_by(|a, b| compare_by(a, b, sort));
        }

        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query
            .limit
            .map(|l| l.min(MAX_SEARCH_PAGE_SIZE) as usize)
            .unwrap_or(usize::MAX);

        matched.into_iter().skip(offset).take(limit).collect()
    }

    fn matches_item(
        &self,
        skim: &SkimMatcherV2,
        item: &Item,
        fields: &[SearchField],
        term: &str,
        query: &SearchQuery,
    ) -> bool {
        let mut hits = fields.iter().map(|field| {
            field
                .value(item)
                .is_some_and(|value| self.matches_value(skim, value, term, query))
        });

        match query.operator {
            Operator::And => hits.all(|hit| hit),
            Operator::Or => hits.any(|hit| hit),
        }
    }

    /// `term` is already trimmed and lowercased
    fn matches_value(
        &self,
        skim: &SkimMatcherV2,
        value: &str,
        term: &str,
        query: &SearchQuery,
    ) -> bool {
        let value = value.trim().to_lowercase();

        match query.mode {
            MatchMode::Exact => value == term,
            MatchMode::Partial => {
                value.contains(term) || (query.fuzzy && self.fuzzy_matches(skim, &value, term))
            }
        }
    }

    /// Typo tolerance, checked against the whole value and each word of it.
    /// A subsequence hit only counts when the term covers at least the
    /// threshold share of the word's characters.
    fn fuzzy_matches(&self, skim: &SkimMatcherV2, value: &str, term: &str) -> bool {
        let term_len = term.chars().count() as f32;

        std::iter::once(value)
            .chain(value.split(|c: char| !c.is_alphanumeric()))
            .filter(|token| !token.is_empty())
            .any(|token| {
                let coverage = term_len / token.chars().count() as f32;
                (coverage >= self.fuzzy_threshold && skim.fuzzy_match(token, term).is_some())
                    || similarity(token, term) >= self.fuzzy_threshold
            })
    }
}

/// Character level similarity ratio in `0.0..=1.0`
pub fn similarity(a: &str, b: &str) -> f32 {
    similar::TextDiff::from_chars(a, b).ratio()
}

fn compare_by(a: &Item, b: &Item, sort: Sort) -> Ordering {
    let text = |item: &Item| -> Option<String> {
        match sort.key {
            SortKey::Title => Some(item.title.to_lowercase()),
            SortKey::Size => item.size.as_deref().map(str::to_lowercase),
            SortKey::StorageLocation => item.storage_location.as_deref().map(str::to_lowercase),
            SortKey::CreatedAt | SortKey::UpdatedAt => None,
        }
    };

    let ordering = match sort.key {
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)),
        SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        _ => match (text(a), text(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            // Missing values always sort last
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => return Ordering::Equal,
        },
    };

    match sort.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

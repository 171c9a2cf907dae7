//! Application configuration constants
//!
//! Central location for defaults, resource limits, and validation
//! boundaries used by the catalog and messaging services.

// ===== Storage =====

/// File name of the SQLite database inside the data directory
pub const DATABASE_FILE_NAME: &str = "bkgt.db";

/// File name of the runtime settings inside the data directory
pub const SETTINGS_FILE_NAME: &str = "settings.json";

// ===== Search Limits =====

/// Default number of items returned per search page
pub const DEFAULT_SEARCH_PAGE_SIZE: u32 = 10;

/// Maximum page size a caller may request
pub const MAX_SEARCH_PAGE_SIZE: u32 = 500;

/// Default similarity ratio a token must reach to count as a fuzzy match
pub const DEFAULT_FUZZY_THRESHOLD: f32 = 0.75;

/// Lowest accepted fuzzy threshold (below this nearly everything matches)
pub const MIN_FUZZY_THRESHOLD: f32 = 0.5;

/// Highest accepted fuzzy threshold (1.0 is exact equality)
pub const MAX_FUZZY_THRESHOLD: f32 = 1.0;

/// Maximum search term length accepted for analytics logging
pub const MAX_LOGGED_TERM_LENGTH: usize = 255;

// ===== Notification Limits =====

/// Default number of notifications returned by a listing
pub const DEFAULT_NOTIFICATION_LIMIT: u32 = 20;

/// Maximum number of notifications returned by a listing
pub const MAX_NOTIFICATION_LIMIT: u32 = 200;

/// Default body template for message notifications; `{subject}` is substituted
pub const DEFAULT_MESSAGE_TEMPLATE: &str = "New message: {subject}";

/// Placeholder replaced by the message subject in the notification template
pub const SUBJECT_PLACEHOLDER: &str = "{subject}";

/// Default age in days after which read notifications are removed by cleanup
pub const DEFAULT_NOTIFICATION_RETENTION_DAYS: u32 = 30;

/// Maximum notification retention in days (1 year)
pub const MAX_NOTIFICATION_RETENTION_DAYS: u32 = 365;

// ===== Messaging Limits =====

/// Maximum subject length in characters
pub const MAX_SUBJECT_LENGTH: usize = 255;

//! Services module
//!
//! Business logic services that coordinate between commands and repository.

pub mod catalog;
pub mod directory;
pub mod messaging;
pub mod notifications;
pub mod recipients;
pub mod search;
pub mod settings;

pub use catalog::CatalogService;
pub use directory::UserDirectory;
pub use messaging::{DispatchReport, MessagingService};
pub use notifications::NotificationsService;
pub use recipients::{RecipientResolver, RecipientSpec, RoleProvider};
pub use search::{
    MatchMode, Operator, SearchEngine, SearchField, SearchQuery, SortDirection, SortKey,
};
pub use settings::{AppSettings, SettingsService};

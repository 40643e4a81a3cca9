//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod auth;
mod auth_interceptor;
mod data_storage;
pub mod logging;
mod recipe;
mod shopping_list;

pub use auth::AuthService;
pub use auth_interceptor::{AuthInterceptor, AUTH_QUERY_PARAM};
pub use data_storage::DataStorageService;
pub use logging::{EntryPoint, EventFamily, FamilyStats, LogEntry, LogEvent, LogQuery, LoggingService};
pub use recipe::RecipeService;
pub use shopping_list::ShoppingListService;

/// Buffered snapshots per change channel before slow receivers start lagging
pub const CHANGE_CHANNEL_CAPACITY: usize = 16;

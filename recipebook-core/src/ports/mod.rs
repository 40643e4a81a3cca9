//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. Services depend
//! only on these traits, not on concrete implementations.

mod clock;
mod identity;
mod navigator;
mod recipe_store;
mod session_storage;

pub use clock::Clock;
pub use identity::IdentityProvider;
pub use navigator::Navigator;
pub use recipe_store::RecipeStore;
pub use session_storage::SessionStorage;

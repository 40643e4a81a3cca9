//! Core domain entities
//!
//! Pure data structures with validation logic - no I/O or external dependencies.

pub mod auth;
mod ingredient;
mod recipe;
pub mod result;
mod user;
mod view;

pub use auth::{AuthErrorKind, AuthResponse, Credentials};
pub use ingredient::Ingredient;
pub use recipe::Recipe;
pub use user::{User, SESSION_KEY};
pub use view::View;

//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Firebase Identity Toolkit client for IdentityProvider
//! - Firebase Realtime Database client for RecipeStore
//! - File and in-memory key-value stores for SessionStorage
//! - System clock, navigator and an offline backend

pub mod firebase;
pub mod session_storage;
pub mod system;

#[cfg(test)]
pub mod firebase_mock;

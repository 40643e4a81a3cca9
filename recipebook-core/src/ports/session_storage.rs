//! Local persistent key-value storage port

use crate::domain::result::Result;

/// String key-value storage that survives restarts (the session record lives here)
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error
    fn remove_item(&self, key: &str) -> Result<()>;
}

//! Remote recipe document port

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::Recipe;

/// A single remote document holding every recipe
#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Read the whole document; an empty store yields an empty list
    async fn load(&self) -> Result<Vec<Recipe>>;

    /// Overwrite the whole document
    async fn save(&self, recipes: &[Recipe]) -> Result<()>;
}

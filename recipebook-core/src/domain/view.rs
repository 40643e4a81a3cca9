//! Views the front end can be sent to

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Sign-in / sign-up screen
    Auth,
    /// Recipe list
    Recipes,
    /// Shopping list
    ShoppingList,
}

impl View {
    pub fn path(&self) -> &'static str {
        match self {
            View::Auth => "/auth",
            View::Recipes => "/recipes",
            View::ShoppingList => "/shopping-list",
        }
    }
}

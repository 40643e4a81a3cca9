//! Shopping list service - owns the ingredient list

use std::sync::{Mutex, MutexGuard};

use tokio::sync::broadcast;

use crate::domain::result::{Error, Result};
use crate::domain::Ingredient;

use super::CHANGE_CHANNEL_CAPACITY;

/// Shopping list service
///
/// Every mutation broadcasts the full list to current subscribers. Late
/// subscribers only see later changes; read `get_ingredients` first.
pub struct ShoppingListService {
    ingredients: Mutex<Vec<Ingredient>>,
    changed: broadcast::Sender<Vec<Ingredient>>,
    editing: broadcast::Sender<usize>,
}

impl Default for ShoppingListService {
    fn default() -> Self {
        Self::new()
    }
}

impl ShoppingListService {
    /// Create the service with the starter list
    pub fn new() -> Self {
        Self::with_ingredients(vec![
            Ingredient::new("Potatoes", 5.0),
            Ingredient::new("Tomatoes", 7.0),
        ])
    }

    /// Create the service with an empty list
    pub fn empty() -> Self {
        Self::with_ingredients(Vec::new())
    }

    pub fn with_ingredients(ingredients: Vec<Ingredient>) -> Self {
        let (changed, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let (editing, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            ingredients: Mutex::new(ingredients),
            changed,
            editing,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Ingredient>> {
        self.ingredients.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Subscribe to list snapshots
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<Ingredient>> {
        self.changed.subscribe()
    }

    /// Subscribe to the index of the item selected for editing
    pub fn subscribe_editing(&self) -> broadcast::Receiver<usize> {
        self.editing.subscribe()
    }

    /// Announce that the item at `index` is being edited
    pub fn start_editing(&self, index: usize) -> Result<Ingredient> {
        let ingredient = self.get_ingredient(index)?;
        let _ = self.editing.send(index);
        Ok(ingredient)
    }

    /// A copy of the current list
    pub fn get_ingredients(&self) -> Vec<Ingredient> {
        self.lock().clone()
    }

    pub fn get_ingredient(&self, index: usize) -> Result<Ingredient> {
        let ingredients = self.lock();
        ingredients
            .get(index)
            .cloned()
            .ok_or_else(|| Error::index_out_of_range("Ingredient", index, ingredients.len()))
    }

    /// Append an ingredient if its amount is positive
    ///
    /// Returns whether it was added. Nothing is emitted otherwise.
    pub fn add_ingredient(&self, ingredient: Ingredient) -> bool {
        // NaN must fail this too
        if !(ingredient.amount > 0.0) {
            return false;
        }
        let mut ingredients = self.lock();
        ingredients.push(ingredient);
        self.emit(&ingredients);
        true
    }

    /// Append every ingredient as given, with no amount check
    pub fn add_ingredients(&self, new_ingredients: Vec<Ingredient>) {
        let mut ingredients = self.lock();
        ingredients.extend(new_ingredients);
        self.emit(&ingredients);
    }

    pub fn update_ingredient(&self, index: usize, ingredient: Ingredient) -> Result<()> {
        let mut ingredients = self.lock();
        let len = ingredients.len();
        let slot = ingredients
            .get_mut(index)
            .ok_or_else(|| Error::index_out_of_range("Ingredient", index, len))?;
        *slot = ingredient;
        self.emit(&ingredients);
        Ok(())
    }

    pub fn delete_ingredient(&self, index: usize) -> Result<Ingredient> {
        let mut ingredients = self.lock();
        if index >= ingredients.len() {
            return Err(Error::index_out_of_range("Ingredient", index, ingredients.len()));
        }
        let removed = ingredients.remove(index);
        self.emit(&ingredients);
        Ok(removed)
    }

    fn emit(&self, ingredients: &[Ingredient]) {
        // No subscribers is fine
        let _ = self.changed.send(ingredients.to_vec());
    }
}

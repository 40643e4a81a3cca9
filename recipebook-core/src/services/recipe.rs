//! Recipe service - owns the recipe list

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;

use crate::domain::result::{Error, Result};
use crate::domain::{Ingredient, Recipe};

use super::shopping_list::ShoppingListService;
use super::CHANGE_CHANNEL_CAPACITY;

/// Recipe service
///
/// Same change semantics as the shopping list: each mutation broadcasts the
/// whole list, with no replay for late subscribers.
pub struct RecipeService {
    recipes: Mutex<Vec<Recipe>>,
    changed: broadcast::Sender<Vec<Recipe>>,
    shopping_list: Arc<ShoppingListService>,
}

impl RecipeService {
    pub fn new(shopping_list: Arc<ShoppingListService>) -> Self {
        let (changed, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            recipes: Mutex::new(Vec::new()),
            changed,
            shopping_list,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Recipe>> {
        self.recipes.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Subscribe to list snapshots
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<Recipe>> {
        self.changed.subscribe()
    }

    /// Replace the whole list (after a remote fetch)
    pub fn set_recipes(&self, recipes: Vec<Recipe>) {
        let mut current = self.lock();
        *current = recipes;
        self.emit(&current);
    }

    /// A copy of the current list
    pub fn get_recipes(&self) -> Vec<Recipe> {
        self.lock().clone()
    }

    pub fn get_recipe(&self, index: usize) -> Result<Recipe> {
        let recipes = self.lock();
        recipes
            .get(index)
            .cloned()
            .ok_or_else(|| Error::index_out_of_range("Recipe", index, recipes.len()))
    }

    /// Send ingredients to the shopping list
    pub fn add_ingredients_to_shopping_list(&self, ingredients: Vec<Ingredient>) {
        self.shopping_list.add_ingredients(ingredients);
    }

    /// Append a recipe; returns its index
    pub fn add_recipe(&self, recipe: Recipe) -> usize {
        let mut recipes = self.lock();
        recipes.push(recipe);
        self.emit(&recipes);
        recipes.len() - 1
    }

    pub fn update_recipe(&self, index: usize, recipe: Recipe) -> Result<()> {
        let mut recipes = self.lock();
        let len = recipes.len();
        let slot = recipes
            .get_mut(index)
            .ok_or_else(|| Error::index_out_of_range("Recipe", index, len))?;
        *slot = recipe;
        self.emit(&recipes);
        Ok(())
    }

    pub fn delete_recipe(&self, index: usize) -> Result<Recipe> {
        let mut recipes = self.lock();
        if index >= recipes.len() {
            return Err(Error::index_out_of_range("Recipe", index, recipes.len()));
        }
        let removed = recipes.remove(index);
        self.emit(&recipes);
        Ok(removed)
    }

    fn emit(&self, recipes: &[Recipe]) {
        let _ = self.changed.send(recipes.to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    fn burger() -> Recipe {
        Recipe::new(
            "Burger",
            "Big and juicy",
            "http://img/burger",
            vec![Ingredient::new("Buns", 2.0), Ingredient::new("Meat", 1.0)],
        )
    }

    fn salad() -> Recipe {
        Recipe::new("Salad", "Green", "http://img/salad", vec![])
    }

    fn service() -> (RecipeService, Arc<ShoppingListService>) {
        let shopping_list = Arc::new(ShoppingListService::empty());
        (RecipeService::new(shopping_list.clone()), shopping_list)
    }

    #[test]
    fn test_add_and_get() {
        let (service, _) = service();
        let mut rx = service.subscribe();

        assert_eq!(service.add_recipe(burger()), 0);
        assert_eq!(service.add_recipe(salad()), 1);

        assert_eq!(service.get_recipe(1).unwrap(), salad());
        assert_eq!(rx.try_recv().unwrap(), vec![burger()]);
        assert_eq!(rx.try_recv().unwrap(), vec![burger(), salad()]);
    }

    #[test]
    fn test_update_and_delete() {
        let (service, _) = service();
        service.set_recipes(vec![burger(), salad()]);
        let mut rx = service.subscribe();

        let mut edited = burger();
        edited.name = "Cheeseburger".to_string();
        service.update_recipe(0, edited.clone()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), vec![edited.clone(), salad()]);

        let removed = service.delete_recipe(1).unwrap();
        assert_eq!(removed, salad());
        assert_eq!(rx.try_recv().unwrap(), vec![edited]);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_set_recipes_replaces_and_emits() {
        let (service, _) = service();
        service.add_recipe(burger());
        let mut rx = service.subscribe();

        service.set_recipes(vec![salad()]);
        assert_eq!(service.get_recipes(), vec![salad()]);
        assert_eq!(rx.try_recv().unwrap(), vec![salad()]);
    }

    #[test]
    fn test_out_of_range() {
        let (service, _) = service();
        service.add_recipe(burger());
        let mut rx = service.subscribe();

        assert!(matches!(service.get_recipe(1), Err(Error::NotFound(_))));
        assert!(matches!(service.update_recipe(3, salad()), Err(Error::NotFound(_))));
        assert!(matches!(service.delete_recipe(1), Err(Error::NotFound(_))));
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_copies_are_independent() {
        let (service, _) = service();
        service.add_recipe(burger());
        let snapshot = service.get_recipes();

        let mut edited = burger();
        edited.ingredients.clear();
        service.update_recipe(0, edited).unwrap();

        assert_eq!(snapshot[0].ingredients.len(), 2);
    }

    #[test]
    fn test_add_ingredients_to_shopping_list() {
        let (service, shopping_list) = service();
        let mut rx = shopping_list.subscribe();

        service.add_ingredients_to_shopping_list(burger().ingredients);

        assert_eq!(shopping_list.get_ingredients(), burger().ingredients);
        assert_eq!(rx.try_recv().unwrap(), burger().ingredients);
    }
}

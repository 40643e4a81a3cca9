//! Data storage service - moves the recipe list to and from the remote document

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::domain::result::Result;
use crate::domain::Recipe;
use crate::ports::RecipeStore;

use super::logging::{record, LogEvent, LoggingService};
use super::recipe::RecipeService;

/// Data storage service
#[derive(Clone)]
pub struct DataStorageService {
    store: Arc<dyn RecipeStore>,
    recipes: Arc<RecipeService>,
    logger: Option<Arc<LoggingService>>,
}

impl DataStorageService {
    pub fn new(
        store: Arc<dyn RecipeStore>,
        recipes: Arc<RecipeService>,
        logger: Option<Arc<LoggingService>>,
    ) -> Self {
        Self {
            store,
            recipes,
            logger,
        }
    }

    /// Overwrite the remote document with the current list, in the background
    ///
    /// Failures only reach the event log. The handle can be awaited to know
    /// when the attempt is over. Must be called from within a Tokio runtime.
    pub fn store_recipes(&self) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            let _ = service.try_store_recipes().await;
        })
    }

    /// Overwrite the remote document with the current list
    ///
    /// Returns how many recipes were written.
    pub async fn try_store_recipes(&self) -> Result<usize> {
        let recipes = self.recipes.get_recipes();
        match self.store.save(&recipes).await {
            Ok(()) => {
                self.log(LogEvent::new("recipes_stored"));
                Ok(recipes.len())
            }
            Err(e) => {
                self.log(LogEvent::new("recipes_store_failed").with_error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Load the remote document and make it the current list
    ///
    /// Nothing is sent until the returned future is awaited. Missing
    /// ingredient lists come back empty, and an empty document yields an
    /// empty list.
    pub async fn fetch_recipes(&self) -> Result<Vec<Recipe>> {
        match self.store.load().await {
            Ok(recipes) => {
                self.recipes.set_recipes(recipes.clone());
                self.log(LogEvent::new("recipes_fetched"));
                Ok(recipes)
            }
            Err(e) => {
                self.log(LogEvent::new("recipes_fetch_failed").with_error(e.to_string()));
                Err(e)
            }
        }
    }

    fn log(&self, event: LogEvent) {
        record(self.logger.as_deref(), event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::Error;
    use crate::domain::Ingredient;
    use crate::services::{LogQuery, ShoppingListService};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Recipe store keeping the raw JSON document, like the remote one
    #[derive(Default)]
    struct JsonDocumentStore {
        document: Mutex<Option<String>>,
        loads: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl RecipeStore for JsonDocumentStore {
        async fn load(&self) -> Result<Vec<Recipe>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            let document = self.document.lock().unwrap().clone();
            match document {
                Some(json) => Ok(serde_json::from_str::<Option<Vec<Recipe>>>(&json)?.unwrap_or_default()),
                None => Ok(Vec::new()),
            }
        }

        async fn save(&self, recipes: &[Recipe]) -> Result<()> {
            if self.fail {
                return Err(Error::storage("HTTP 500"));
            }
            *self.document.lock().unwrap() = Some(serde_json::to_string(recipes)?);
            Ok(())
        }
    }

    fn service(store: Arc<JsonDocumentStore>) -> (DataStorageService, Arc<RecipeService>) {
        let recipes = Arc::new(RecipeService::new(Arc::new(ShoppingListService::empty())));
        (DataStorageService::new(store, recipes.clone(), None), recipes)
    }

    fn burger() -> Recipe {
        Recipe::new("Burger", "Big", "http://img/burger", vec![Ingredient::new("Buns", 2.0)])
    }

    #[tokio::test]
    async fn test_fetch_after_store_returns_stored_list() {
        let store = Arc::new(JsonDocumentStore::default());
        let (service, recipes) = service(store.clone());
        recipes.add_recipe(burger());
        recipes.add_recipe(Recipe::new("Salad", "Green", "http://img/salad", vec![]));

        service.store_recipes().await.unwrap();

        recipes.set_recipes(Vec::new());
        let mut rx = recipes.subscribe();

        let fetched = service.fetch_recipes().await.unwrap();
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0], burger());
        assert!(fetched[1].ingredients.is_empty());
        assert_eq!(recipes.get_recipes(), fetched);
        assert_eq!(rx.try_recv().unwrap(), fetched);
    }

    #[tokio::test]
    async fn test_fetch_normalizes_missing_ingredients() {
        let store = Arc::new(JsonDocumentStore::default());
        *store.document.lock().unwrap() = Some(
            r#"[{"name":"Toast","description":"Crunchy","imagePath":"x"},
                {"name":"Soup","description":"Hot","imagePath":"y","ingredients":null}]"#
                .to_string(),
        );
        let (service, _) = service(store);

        let fetched = service.fetch_recipes().await.unwrap();
        assert!(fetched.iter().all(|r| r.ingredients.is_empty()));
    }

    #[tokio::test]
    async fn test_fetch_of_null_document_is_empty() {
        let store = Arc::new(JsonDocumentStore::default());
        *store.document.lock().unwrap() = Some("null".to_string());
        let (service, recipes) = service(store);
        recipes.add_recipe(burger());

        assert!(service.fetch_recipes().await.unwrap().is_empty());
        assert!(recipes.get_recipes().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_is_lazy() {
        let store = Arc::new(JsonDocumentStore::default());
        let (service, _) = service(store.clone());

        let pending = service.fetch_recipes();
        assert_eq!(store.loads.load(Ordering::SeqCst), 0);

        pending.await.unwrap();
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_store_failure_is_not_propagated() {
        let store = Arc::new(JsonDocumentStore {
            fail: true,
            ..Default::default()
        });
        let dir = tempdir().unwrap();
        let logger = Arc::new(
            LoggingService::new(dir.path(), crate::services::EntryPoint::Cli, "test").unwrap(),
        );
        let recipes = Arc::new(RecipeService::new(Arc::new(ShoppingListService::empty())));
        recipes.add_recipe(burger());
        let service = DataStorageService::new(store, recipes, Some(logger.clone()));

        service.store_recipes().await.unwrap();
        assert!(service.try_store_recipes().await.is_err());

        let errors = logger.query(&LogQuery::errors(10)).unwrap();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.event == "recipes_store_failed"));
    }
}

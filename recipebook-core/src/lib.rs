//! Recipe Book Core - Business logic for recipes and a shopping list
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core entities (Ingredient, Recipe, User, auth payloads)
//! - **ports**: Trait definitions for external dependencies (IdentityProvider, RecipeStore, SessionStorage)
//! - **services**: Business logic orchestration and change channels
//! - **adapters**: Concrete implementations (Firebase, file storage, system clock)

pub mod domain;
pub mod ports;
pub mod services;
pub mod adapters;
pub mod config;
pub mod log_migrations;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::firebase::{FirebaseAuthClient, FirebaseRecipeStore};
use adapters::session_storage::FileSessionStorage;
use adapters::system::{OfflineBackend, RecordingNavigator, SystemClock};
use config::Config;
use ports::{Clock, IdentityProvider, RecipeStore, SessionStorage};
use services::*;

// Re-export commonly used types at crate root
pub use domain::{AuthErrorKind, Credentials, Ingredient, Recipe, User, View};
pub use domain::result::{Error, OperationResult};

/// Injected ports for building a context
pub struct ContextParts {
    pub identity: Arc<dyn IdentityProvider>,
    pub storage: Arc<dyn SessionStorage>,
    pub clock: Arc<dyn Clock>,
    pub logger: Option<Arc<LoggingService>>,
}

/// Main context for Recipe Book operations
///
/// Holds the configuration, the event log and all services, wired so that
/// the recipe store sees the auth service's current user.
pub struct RecipeBookContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub logger: Option<Arc<LoggingService>>,
    pub navigator: Arc<RecordingNavigator>,
    pub shopping_list_service: Arc<ShoppingListService>,
    pub recipe_service: Arc<RecipeService>,
    pub auth_service: Arc<AuthService>,
    pub data_storage_service: DataStorageService,
}

impl RecipeBookContext {
    /// Create a context backed by Firebase and files in `data_dir`
    pub fn new(data_dir: &Path, entry_point: EntryPoint) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let config = Config::load(data_dir)?;

        // A broken event log must not keep the app from starting
        let logger = LoggingService::new(data_dir, entry_point, env!("CARGO_PKG_VERSION"))
            .ok()
            .map(Arc::new);

        let identity = Arc::new(FirebaseAuthClient::new(&config)?);
        let recipes_url = config.recipes_url.clone();

        let parts = ContextParts {
            identity,
            storage: Arc::new(FileSessionStorage::new(data_dir)),
            clock: Arc::new(SystemClock),
            logger,
        };

        Self::with_parts(config, data_dir, parts, |interceptor| {
            let store: Arc<dyn RecipeStore> = Arc::new(FirebaseRecipeStore::new(&recipes_url, interceptor)?);
            Ok(store)
        })
    }

    /// Create a context that reads and clears the stored session without a backend
    ///
    /// Needs no API key. Sign-in and recipe calls fail with a configuration error.
    pub fn local(data_dir: &Path, entry_point: EntryPoint) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        let config = Config::load(data_dir)?;
        let logger = LoggingService::new(data_dir, entry_point, env!("CARGO_PKG_VERSION"))
            .ok()
            .map(Arc::new);

        let parts = ContextParts {
            identity: Arc::new(OfflineBackend),
            storage: Arc::new(FileSessionStorage::new(data_dir)),
            clock: Arc::new(SystemClock),
            logger,
        };

        Self::with_parts(config, data_dir, parts, |_| {
            let store: Arc<dyn RecipeStore> = Arc::new(OfflineBackend);
            Ok(store)
        })
    }

    /// Create a context from injected ports
    ///
    /// `make_store` receives the interceptor bound to the new auth service.
    pub fn with_parts<F>(config: Config, data_dir: &Path, parts: ContextParts, make_store: F) -> Result<Self>
    where
        F: FnOnce(AuthInterceptor) -> Result<Arc<dyn RecipeStore>>,
    {
        let ContextParts {
            identity,
            storage,
            clock,
            logger,
        } = parts;

        let navigator = Arc::new(RecordingNavigator::new());
        let shopping_list_service = Arc::new(ShoppingListService::new());
        let recipe_service = Arc::new(RecipeService::new(Arc::clone(&shopping_list_service)));

        let auth_service = AuthService::new(
            identity,
            storage,
            navigator.clone(),
            Arc::clone(&clock),
            logger.clone(),
        );

        let interceptor = AuthInterceptor::new(auth_service.subscribe_user(), clock);
        let store = make_store(interceptor)?;
        let data_storage_service = DataStorageService::new(store, Arc::clone(&recipe_service), logger.clone());

        Ok(Self {
            config,
            data_dir: data_dir.to_path_buf(),
            logger,
            navigator,
            shopping_list_service,
            recipe_service,
            auth_service,
            data_storage_service,
        })
    }

    /// Record an event, ignoring logging failures
    pub fn log(&self, event: LogEvent) {
        logging::record(self.logger.as_deref(), event);
    }
}

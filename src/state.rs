use std::sync::Arc;

use tracing::info;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::guard::{guard, RouteDecision};
use crate::interaction::RecipeInteraction;
use crate::meal_plan::MealPlanStore;
use crate::models::RecipeSummary;
use crate::notify::{NotificationSink, Notifier, TracingSink};
use crate::session::SessionManager;
use crate::storage::{open_store, DurableStore};
use crate::transport::{ApiTransport, HttpTransport};

/// Process-wide application state, built once at startup and handed to
/// views by reference.
///
/// One `AppState` per UI context: it is the single writer for the identity
/// and the meal plan.
#[derive(Clone)]
pub struct AppState {
    storage: Arc<dyn DurableStore>,
    transport: Arc<dyn ApiTransport>,
    session: Arc<SessionManager>,
    meal_plan: Arc<MealPlanStore>,
    notifier: Notifier,
    config: ClientConfig,
}

impl AppState {
    /// Open storage and the HTTP transport described by `config`.
    pub fn open(config: ClientConfig) -> Result<Self> {
        let storage = open_store(config.storage, &config.resolved_data_dir())?;
        let transport = Arc::new(HttpTransport::new(
            &config.server_domain,
            config.request_timeout(),
        )?);
        Self::with_parts(config, storage, transport, Arc::new(TracingSink))
    }

    /// Assemble state from explicit collaborators.
    pub fn with_parts(
        config: ClientConfig,
        storage: Arc<dyn DurableStore>,
        transport: Arc<dyn ApiTransport>,
        sink: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        let notifier = Notifier::new(sink);
        let meal_plan = Arc::new(MealPlanStore::load(storage.clone())?);
        let session = Arc::new(SessionManager::restore(
            storage.clone(),
            transport.clone(),
            meal_plan.clone(),
            notifier.clone(),
        )?);

        info!("Application state ready ({})", config.server_domain);
        Ok(Self {
            storage,
            transport,
            session,
            meal_plan,
            notifier,
            config,
        })
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn meal_plan(&self) -> &Arc<MealPlanStore> {
        &self.meal_plan
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn storage(&self) -> &Arc<dyn DurableStore> {
        &self.storage
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Interaction state for a recipe shown in a newly opened view.
    pub fn recipe_view(&self, recipe: RecipeSummary) -> RecipeInteraction {
        RecipeInteraction::new(
            recipe,
            self.session.clone(),
            self.transport.clone(),
            self.config.lookup_timeout(),
        )
    }

    pub fn guard(&self, path: &str) -> RouteDecision {
        guard(path, &self.session)
    }
}

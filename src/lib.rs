pub mod config;
mod error;
pub mod guard;
pub mod interaction;
pub mod meal_plan;
pub mod models;
pub mod notify;
pub mod session;
pub mod state;
pub mod storage;
pub mod transport;

pub use config::ClientConfig;
pub use error::{RecipeStateError, Result};
pub use interaction::{InteractionFlag, InteractionState, RecipeInteraction};
pub use meal_plan::{MealPlanEntry, MealPlanStore};
pub use models::{RecipeId, RecipeSummary};
pub use notify::{NotificationSink, Notifier, Severity};
pub use session::{SessionIdentity, SessionManager, ValidationOutcome};
pub use state::AppState;
pub use storage::DurableStore;
pub use transport::{ApiResponse, ApiTransport, TransportError};

/// Install the fmt subscriber, filtered by `RUST_LOG` and defaulting to `info`.
/// Does nothing if a global subscriber is already set.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

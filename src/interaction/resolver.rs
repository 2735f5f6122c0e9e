use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, warn};

use super::decode::recipe_ids;
use super::{InteractionFlag, InteractionState};
use crate::models::RecipeSummary;
use crate::session::SessionManager;
use crate::transport::ApiTransport;

#[derive(Debug, Default, Clone, Copy)]
struct FlagSlot {
    value: bool,
    /// Bumped on every write or lookup start. A lookup only writes its result
    /// if nothing else touched the flag since it started.
    generation: u64,
}

#[derive(Debug, Default)]
struct Slots {
    liked: FlagSlot,
    favorited: FlagSlot,
    viewed: FlagSlot,
    loaded: bool,
}

impl Slots {
    fn slot(&mut self, flag: InteractionFlag) -> &mut FlagSlot {
        match flag {
            InteractionFlag::Liked => &mut self.liked,
            InteractionFlag::Favorited => &mut self.favorited,
            InteractionFlag::Viewed => &mut self.viewed,
        }
    }

    fn state(&self) -> InteractionState {
        InteractionState {
            liked: self.liked.value,
            favorited: self.favorited.value,
            viewed: self.viewed.value,
            loaded: self.loaded,
        }
    }
}

/// Interaction state for one recipe in one view.
///
/// Each flag takes the recipe's hint when it has one, otherwise a lookup
/// against the matching user list. Lookups run concurrently and fail
/// independently; a failed or timed-out lookup leaves its flag false.
/// Setter calls always win over a lookup that is still in flight.
pub struct RecipeInteraction {
    recipe: RecipeSummary,
    session: Arc<SessionManager>,
    transport: Arc<dyn ApiTransport>,
    lookup_timeout: Duration,
    slots: Mutex<Slots>,
}

impl RecipeInteraction {
    pub fn new(
        recipe: RecipeSummary,
        session: Arc<SessionManager>,
        transport: Arc<dyn ApiTransport>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            recipe,
            session,
            transport,
            lookup_timeout,
            slots: Mutex::new(Slots::default()),
        }
    }

    pub fn recipe(&self) -> &RecipeSummary {
        &self.recipe
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        // Slots hold plain values, a poisoned lock still has a usable state
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> InteractionState {
        self.slots().state()
    }

    pub fn is_liked(&self) -> bool {
        self.state().liked
    }

    pub fn is_favorited(&self) -> bool {
        self.state().favorited
    }

    pub fn is_viewed(&self) -> bool {
        self.state().viewed
    }

    pub fn is_loaded(&self) -> bool {
        self.state().loaded
    }

    /// Resolve all three flags and mark the state loaded.
    ///
    /// Viewers without an authenticated session skip every lookup, including
    /// a restored username that has not been validated yet.
    pub async fn load_recipe_state(&self) -> InteractionState {
        if !self.session.is_authenticated() {
            debug!(
                "Not authenticated, recipe {} state left at defaults",
                self.recipe.id
            );
            return self.mark_loaded();
        }

        tokio::join!(
            self.resolve(InteractionFlag::Liked),
            self.resolve(InteractionFlag::Favorited),
            self.resolve(InteractionFlag::Viewed),
        );

        self.mark_loaded()
    }

    fn mark_loaded(&self) -> InteractionState {
        let mut slots = self.slots();
        slots.loaded = true;
        slots.state()
    }

    async fn resolve(&self, flag: InteractionFlag) {
        if let Some(hint) = flag.hint(&self.recipe) {
            debug!("Using {} hint for recipe {}: {}", flag, self.recipe.id, hint);
            self.set(flag, hint);
            return;
        }

        let generation = {
            let mut slots = self.slots();
            let slot = slots.slot(flag);
            slot.generation += 1;
            slot.generation
        };

        let found = self.lookup(flag).await;

        let mut slots = self.slots();
        let slot = slots.slot(flag);
        if slot.generation == generation {
            slot.value = found;
        } else {
            debug!(
                "Dropping stale {} lookup for recipe {}",
                flag, self.recipe.id
            );
        }
    }

    /// True iff the recipe appears in the flag's list. Every failure is false.
    async fn lookup(&self, flag: InteractionFlag) -> bool {
        let endpoint = flag.endpoint();
        let response =
            match tokio::time::timeout(self.lookup_timeout, self.transport.get(endpoint)).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    warn!("Error checking {} state for recipe {}: {}", flag, self.recipe.id, e);
                    return false;
                }
                Err(_) => {
                    warn!(
                        "Checking {} state for recipe {} timed out after {:?}",
                        flag, self.recipe.id, self.lookup_timeout
                    );
                    return false;
                }
            };

        if !response.is_success() {
            warn!(
                "Error checking {} state for recipe {}: {} returned status {}",
                flag, self.recipe.id, endpoint, response.status
            );
            return false;
        }

        recipe_ids(&response.body).contains(&self.recipe.id)
    }

    fn set(&self, flag: InteractionFlag, value: bool) {
        let mut slots = self.slots();
        let slot = slots.slot(flag);
        slot.generation += 1;
        slot.value = value;
    }

    pub fn update_liked_state(&self, liked: bool) {
        self.set(InteractionFlag::Liked, liked);
    }

    pub fn update_favorited_state(&self, favorited: bool) {
        self.set(InteractionFlag::Favorited, favorited);
    }

    pub fn update_viewed_state(&self, viewed: bool) {
        self.set(InteractionFlag::Viewed, viewed);
    }
}

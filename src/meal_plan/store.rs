use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use super::types::MealPlanEntry;
use crate::error::{RecipeStateError, Result};
use crate::models::{RecipeId, RecipeSummary};
use crate::storage::{DurableStore, MEAL_PLAN_KEY};

/// Ordered, durable meal plan.
///
/// Every mutation runs under one lock: the list is copied, changed, written
/// to storage in full, and only then committed in memory ([`Self::clear`]
/// empties memory first). Concurrent callers are serialized instead of
/// losing each other's updates.
///
/// Operations that find nothing to change (unknown recipe, index out of
/// range, boundary move) return `Ok(false)` and write nothing.
pub struct MealPlanStore {
    storage: Arc<dyn DurableStore>,
    entries: Mutex<Vec<MealPlanEntry>>,
}

impl MealPlanStore {
    /// Load the plan from storage. A missing key is an empty plan; an
    /// unreadable value is logged and also treated as empty.
    pub fn load(storage: Arc<dyn DurableStore>) -> Result<Self> {
        let entries = match storage.get(MEAL_PLAN_KEY)? {
            None => Vec::new(),
            Some(json) => match serde_json::from_str::<Vec<MealPlanEntry>>(&json) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Stored meal plan is unreadable ({}), starting empty", e);
                    Vec::new()
                }
            },
        };

        info!("Loaded meal plan with {} entries", entries.len());
        Ok(Self {
            storage,
            entries: Mutex::new(entries),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<MealPlanEntry>>> {
        self.entries
            .lock()
            .map_err(|_| RecipeStateError::Storage("meal plan lock poisoned".to_string()))
    }

    /// Snapshot of the current plan, in order.
    pub fn entries(&self) -> Vec<MealPlanEntry> {
        self.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<MealPlanEntry> {
        self.lock().ok()?.get(index).cloned()
    }

    /// First entry for `recipe_id`.
    pub fn find(&self, recipe_id: &RecipeId) -> Option<MealPlanEntry> {
        self.lock()
            .ok()?
            .iter()
            .find(|e| e.recipe_id() == recipe_id)
            .cloned()
    }

    /// Run `change` against a copy of the list. When it reports a change the
    /// copy is persisted and committed.
    fn mutate(&self, change: impl FnOnce(&mut Vec<MealPlanEntry>) -> bool) -> Result<bool> {
        let mut entries = self.lock()?;
        let mut next = entries.clone();
        if !change(&mut next) {
            return Ok(false);
        }

        let json = serde_json::to_string(&next)?;
        self.storage.set(MEAL_PLAN_KEY, &json)?;
        *entries = next;
        Ok(true)
    }

    /// Append a recipe. The same recipe may appear more than once.
    pub fn add(&self, recipe: RecipeSummary) -> Result<()> {
        let id = recipe.id.clone();
        self.mutate(|entries| {
            entries.push(MealPlanEntry::new(recipe));
            true
        })?;
        info!("Added recipe {} to meal plan", id);
        Ok(())
    }

    /// Set the step count for the first entry of `recipe_id`.
    /// Re-initializing with the same count keeps existing progress.
    pub fn init_steps(&self, recipe_id: &RecipeId, total_steps: usize) -> Result<bool> {
        let applied = self.mutate(|entries| {
            match entries.iter_mut().find(|e| e.recipe_id() == recipe_id) {
                Some(entry) => {
                    entry.init_steps(total_steps);
                    true
                }
                None => false,
            }
        })?;

        if applied {
            debug!("Initialized {} steps for recipe {}", total_steps, recipe_id);
        } else {
            debug!("No meal plan entry for recipe {}, step init skipped", recipe_id);
        }
        Ok(applied)
    }

    /// Flip one step of the first entry of `recipe_id`.
    pub fn toggle_step(&self, recipe_id: &RecipeId, step_index: usize) -> Result<bool> {
        let mut found = false;
        let applied = self.mutate(|entries| {
            match entries.iter_mut().find(|e| e.recipe_id() == recipe_id) {
                Some(entry) => {
                    found = true;
                    entry.toggle_step(step_index)
                }
                None => false,
            }
        })?;

        if !found {
            debug!("No meal plan entry for recipe {}, toggle skipped", recipe_id);
        } else if !applied {
            warn!(
                "Step {} is out of range for recipe {}, toggle skipped",
                step_index, recipe_id
            );
        }
        Ok(applied)
    }

    /// Remove the entry at `index`. Returns the removed entry, or `None`
    /// when the index is out of bounds.
    pub fn remove(&self, index: usize) -> Result<Option<MealPlanEntry>> {
        let mut removed = None;
        self.mutate(|entries| {
            if index < entries.len() {
                removed = Some(entries.remove(index));
                true
            } else {
                false
            }
        })?;

        match &removed {
            Some(entry) => info!("Removed recipe {} from meal plan", entry.recipe_id()),
            None => debug!("Meal plan index {} out of bounds, remove skipped", index),
        }
        Ok(removed)
    }

    /// Empty the plan and delete its storage key.
    ///
    /// Memory is emptied even when the key cannot be removed, so a failed
    /// clear never hands the old plan to the next identity.
    pub fn clear(&self) -> Result<()> {
        let mut entries = self.lock()?;
        entries.clear();
        if let Err(e) = self.storage.remove(MEAL_PLAN_KEY) {
            warn!("Cleared meal plan in memory but not in storage: {}", e);
            return Err(e);
        }
        info!("Cleared meal plan");
        Ok(())
    }

    /// Swap the entry at `index` with the one before it.
    pub fn move_up(&self, index: usize) -> Result<bool> {
        self.mutate(|entries| {
            if index > 0 && index < entries.len() {
                entries.swap(index - 1, index);
                true
            } else {
                false
            }
        })
    }

    /// Swap the entry at `index` with the one after it.
    pub fn move_down(&self, index: usize) -> Result<bool> {
        self.mutate(|entries| {
            if index + 1 < entries.len() {
                entries.swap(index, index + 1);
                true
            } else {
                false
            }
        })
    }
}

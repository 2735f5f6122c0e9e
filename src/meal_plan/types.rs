use serde::{Deserialize, Serialize};

use crate::models::{RecipeId, RecipeSummary};

/// A recipe snapshot in the meal plan together with its cooking progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanEntry {
    #[serde(flatten)]
    pub recipe: RecipeSummary,
    #[serde(default)]
    pub completed_steps: Vec<bool>,
    #[serde(default)]
    pub total_steps: usize,
}

impl MealPlanEntry {
    /// New entry with no step tracking yet.
    pub fn new(recipe: RecipeSummary) -> Self {
        Self {
            recipe,
            completed_steps: Vec::new(),
            total_steps: 0,
        }
    }

    pub fn recipe_id(&self) -> &RecipeId {
        &self.recipe.id
    }

    /// Number of steps marked done.
    pub fn completed_count(&self) -> usize {
        self.completed_steps.iter().filter(|done| **done).count()
    }

    /// True once steps are initialized and every one is done.
    pub fn is_complete(&self) -> bool {
        self.total_steps > 0 && self.completed_count() == self.total_steps
    }

    /// Set the step count. Progress is kept only when the count is unchanged.
    pub(crate) fn init_steps(&mut self, total_steps: usize) {
        self.total_steps = total_steps;
        if self.completed_steps.len() != total_steps {
            self.completed_steps = vec![false; total_steps];
        }
    }

    /// Flip one step. Returns false when `step_index` is out of range.
    pub(crate) fn toggle_step(&mut self, step_index: usize) -> bool {
        match self.completed_steps.get_mut(step_index) {
            Some(done) => {
                *done = !*done;
                true
            }
            None => false,
        }
    }
}

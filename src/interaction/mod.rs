pub mod decode;
pub mod resolver;

use serde::Serialize;

use crate::models::RecipeSummary;

pub use resolver::RecipeInteraction;

/// Per-view interaction flags for one recipe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InteractionState {
    pub liked: bool,
    pub favorited: bool,
    pub viewed: bool,
    /// Set once resolution has finished, successfully or not.
    pub loaded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionFlag {
    Liked,
    Favorited,
    Viewed,
}

impl InteractionFlag {
    /// List endpoint reporting the user's recipes for this flag.
    pub fn endpoint(&self) -> &'static str {
        match self {
            InteractionFlag::Liked => "/users/liked",
            InteractionFlag::Favorited => "/users/favorites",
            InteractionFlag::Viewed => "/users/viewed",
        }
    }

    /// Value already known by the view that supplied the recipe.
    pub fn hint(&self, recipe: &RecipeSummary) -> Option<bool> {
        match self {
            InteractionFlag::Liked => recipe.liked,
            InteractionFlag::Favorited => recipe.favorited,
            InteractionFlag::Viewed => recipe.viewed,
        }
    }
}

impl std::fmt::Display for InteractionFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InteractionFlag::Liked => "liked",
            InteractionFlag::Favorited => "favorited",
            InteractionFlag::Viewed => "viewed",
        };
        f.write_str(name)
    }
}

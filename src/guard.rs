//! Route gating for an external router.
//!
//! Protected views require a known username. This is the cheap identity
//! check; it does not contact the server.

use crate::session::SessionManager;

pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Main,
    Register,
    Login,
    Search,
    Recipe,
    UsersLiked,
    UsersFavorites,
    UsersMealPlan,
    NotFound,
}

impl Route {
    /// Match a path against the route table. Unknown paths are `NotFound`.
    pub fn from_path(path: &str) -> Self {
        let path = path.split(|c| c == '?' || c == '#').next().unwrap_or("");
        // Leading, trailing and doubled slashes don't change the route
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Main,
            ["register"] => Route::Register,
            ["login"] => Route::Login,
            ["recipes", "search"] => Route::Search,
            ["recipes", _] => Route::Recipe,
            ["users", "liked"] => Route::UsersLiked,
            ["users", "favorites"] => Route::UsersFavorites,
            ["users", "meal-plan"] => Route::UsersMealPlan,
            _ => Route::NotFound,
        }
    }

    /// Whether the route shows personal data.
    pub fn requires_identity(&self) -> bool {
        matches!(
            self,
            Route::UsersLiked | Route::UsersFavorites | Route::UsersMealPlan
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    RedirectToLogin,
}

pub fn guard(path: &str, session: &SessionManager) -> RouteDecision {
    if Route::from_path(path).requires_identity() && !session.has_identity() {
        RouteDecision::RedirectToLogin
    } else {
        RouteDecision::Allow
    }
}

pub mod store;
pub mod types;

pub use store::MealPlanStore;
pub use types::MealPlanEntry;

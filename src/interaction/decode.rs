//! Decoding of the liked / favorites / viewed list responses.
//!
//! Two shapes are accepted:
//! - wrapped: `{"recipes": [{"id": ...}, ...]}`
//! - bare: `[{"id": ...}, ...]`
//!
//! Any other body decodes to an empty list. Items without a usable `id` are
//! skipped.

use serde_json::Value;

use crate::models::RecipeId;

pub fn recipe_ids(body: &Value) -> Vec<RecipeId> {
    let items = match body {
        Value::Object(map) => map.get("recipes").and_then(Value::as_array),
        Value::Array(items) => Some(items),
        _ => None,
    };

    items
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("id").and_then(RecipeId::from_value))
                .collect()
        })
        .unwrap_or_default()
}

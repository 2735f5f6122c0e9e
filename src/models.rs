use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Recipe identifier as the API reports it.
/// External catalogue recipes use numeric ids, user-created ones use strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecipeId {
    Numeric(i64),
    Text(String),
}

impl RecipeId {
    /// Parse an id out of a raw JSON value. Anything other than an integer
    /// or a string is not an id.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RecipeId::Numeric),
            Value::String(s) => Some(RecipeId::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeId::Numeric(n) => write!(f, "{}", n),
            RecipeId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecipeId {
    fn from(id: i64) -> Self {
        RecipeId::Numeric(id)
    }
}

impl From<&str> for RecipeId {
    fn from(id: &str) -> Self {
        RecipeId::Text(id.to_string())
    }
}

impl From<String> for RecipeId {
    fn from(id: String) -> Self {
        RecipeId::Text(id)
    }
}

/// Recipe summary as shown in list and preview views.
///
/// `liked`, `favorited` and `viewed` are optional hints supplied by a listing
/// view that already knows the answer. Fields this crate does not model are
/// kept in `extra` so a stored snapshot round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSummary {
    pub id: RecipeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_in_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorited: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewed: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecipeSummary {
    pub fn new(id: impl Into<RecipeId>) -> Self {
        Self {
            id: id.into(),
            title: None,
            image: None,
            ready_in_minutes: None,
            liked: None,
            favorited: None,
            viewed: None,
            extra: Map::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecipeStateError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for RecipeStateError {
    fn from(err: rusqlite::Error) -> Self {
        RecipeStateError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for RecipeStateError {
    fn from(err: std::io::Error) -> Self {
        RecipeStateError::Storage(err.to_string())
    }
}

impl From<RecipeStateError> for String {
    fn from(err: RecipeStateError) -> Self {
        err.to_string()
    }
}

pub type Result<T> = std::result::Result<T, RecipeStateError>;

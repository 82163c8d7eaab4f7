use thiserror::Error;

/// Errors raised while turning configuration text into typed entities.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid {field} on {entity_id}: {reason}")]
    InvalidField {
        entity_id: String,
        field: &'static str,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;

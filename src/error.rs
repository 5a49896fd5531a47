use thiserror::Error;

use crate::models::{Platform, Tab};

pub type AppResult<T> = Result<T, AppError>;

/// Ошибки проверки, которые не дают начать отправку
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Webhook URL for {0} is not configured")]
    MissingWebhook(Tab),

    #[error("Select at least one platform for {0}")]
    EmptySelection(Tab),

    #[error("Platform {platform} is not available on {tab}")]
    UnsupportedPlatform { tab: Tab, platform: Platform },

    #[error("Enter post text or attach an image")]
    EmptyContent,

    #[error("Only image files can be attached (got {0})")]
    NotAnImage(String),

    #[error("Image must be 10 MB or smaller (got {0})")]
    ImageTooLarge(String),

    #[error("A send is already in progress on {0}")]
    Busy(Tab),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unknown tab: {0}")]
    UnknownTab(String),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("{0}")]
    Custom(String),
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Custom(s)
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::Custom(s.to_string())
    }
}

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("File '{name}' is {size} bytes, larger than the {limit} byte upload limit")]
    SizeLimitExceeded { name: String, size: u64, limit: u64 },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    General(String),
}

impl AppError {
    /// Message shown to the user in a notification. Backend-provided messages
    /// pass through untouched; transport details are replaced by a generic line.
    pub fn user_message(&self) -> String {
        match self {
            Self::PermissionDenied(_) => {
                "You do not have permission to perform this action".to_string()
            }
            Self::NotFound(msg) | Self::Validation(msg) => msg.clone(),
            Self::Network(_) => "Could not reach the document server".to_string(),
            Self::SizeLimitExceeded { .. } => self.to_string(),
            _ => "Unexpected error".to_string(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StripError {
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("Task failed: {0}")]
    Task(String),
}

impl StripError {
    pub fn fetch(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction(message.into())
    }

    /// Errors that only invalidate a single feed entry rather than the whole source.
    pub fn is_entry_local(&self) -> bool {
        matches!(self, Self::Extraction(_) | Self::FeedParse(_) | Self::Selector { .. })
    }
}

impl From<crate::config::ConfigError> for StripError {
    fn from(e: crate::config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StripError>;

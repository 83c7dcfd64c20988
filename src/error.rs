#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to fetch feed: {0}")]
    FetchError(String),

    #[error("Error parsing feed: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("File watcher error: {0}")]
    WatchError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::FetchError(err.to_string())
    }
}

impl From<rss::Error> for AppError {
    fn from(err: rss::Error) -> Self {
        AppError::ParseError(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<notify::Error> for AppError {
    fn from(err: notify::Error) -> Self {
        AppError::WatchError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

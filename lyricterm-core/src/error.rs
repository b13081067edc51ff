use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Argument errors
    #[error("Invalid start position '{input}': expected mm:ss or seconds")]
    InvalidPosition { input: String },

    #[error("Invalid speed multiplier {speed}: must be a positive number")]
    InvalidSpeed { speed: f64 },

    // Lyrics errors
    #[error("No result found for track: {track}")]
    LyricsNotFound { track: String },

    #[error("No synced lyrics found for track: {track}")]
    NoSyncedLyrics { track: String },

    #[error("Lyrics provider {provider} failed: {reason}")]
    LyricsProviderFailed { provider: String, reason: String },

    // Network errors
    #[error("Network request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Network request failed: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // Terminal errors
    #[error("Terminal output failed: {0}")]
    RenderFailed(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

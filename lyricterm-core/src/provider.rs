use crate::error::CoreError;
use crate::lrc::LyricTrack;
use async_trait::async_trait;

/// Query parameters for fetching lyrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsQuery {
    /// Track name
    pub track_name: String,
    /// Artist name, used to narrow the search
    pub artist_name: Option<String>,
}

impl LyricsQuery {
    /// Create a new lyrics query
    pub fn new(track_name: impl Into<String>) -> Self {
        Self {
            track_name: track_name.into(),
            artist_name: None,
        }
    }

    /// Set artist name
    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist_name = Some(artist.into());
        self
    }
}

/// Result from a lyrics provider
#[derive(Debug, Clone)]
pub enum LyricsResult {
    /// Synchronized lyrics with timing
    Synced(LyricTrack),
    /// Plain text lyrics without timing
    Unsynced(String),
    /// No lyrics found
    NotFound,
}

/// Lyrics with provider metadata
#[derive(Debug, Clone)]
pub struct FetchedLyrics {
    /// The lyrics result
    pub result: LyricsResult,
    /// Provider-specific ID (e.g., LRCLIB's numeric ID as string)
    pub provider_id: String,
    /// Track name as reported by the provider
    pub track_name: Option<String>,
    /// Artist name as reported by the provider
    pub artist_name: Option<String>,
    /// No search result carried synced lyrics, so the first result was used
    pub fell_back_to_plain: bool,
}

/// Trait for lyrics providers
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Fetch lyrics for a query
    async fn fetch(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError>;
}

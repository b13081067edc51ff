use async_trait::async_trait;
use lyricterm_core::{
    CoreError, FetchedLyrics, LyricTrack, LyricsConfig, LyricsProvider, LyricsQuery, LyricsResult,
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Connect timeout for HTTP requests (5 seconds)
const CONNECT_TIMEOUT_SECS: u64 = 5;

const USER_AGENT: &str = concat!("lyricterm/", env!("CARGO_PKG_VERSION"));

/// LRCLIB.net lyrics provider
pub struct LrclibProvider {
    client: ClientWithMiddleware,
    api_url: String,
}

impl LrclibProvider {
    /// Create a provider using the API URL, timeout and retry count from config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: &LyricsConfig) -> Result<Self, CoreError> {
        // Base client with timeout
        let base_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        // Wrap with retry middleware (exponential backoff)
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(base_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, query: &LyricsQuery) -> String {
        let mut url = format!(
            "{}/search?track_name={}",
            self.api_url,
            urlencoding::encode(&query.track_name)
        );

        if let Some(ref artist) = query.artist_name {
            use std::fmt::Write;
            let _ = write!(url, "&artist_name={}", urlencoding::encode(artist));
        }

        url
    }
}

/// Response from LRCLIB API
/// Note: API returns additional fields (albumName, duration) that we don't use;
/// serde ignores unknown fields by default.
#[derive(Debug, Deserialize)]
struct LrclibResponse {
    id: i64,
    #[serde(rename = "trackName")]
    track_name: Option<String>,
    #[serde(rename = "artistName")]
    artist_name: Option<String>,
    #[serde(default)]
    instrumental: bool,
    #[serde(rename = "plainLyrics")]
    plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics", alias = "synced_lyrics")]
    synced_lyrics: Option<String>,
}

impl LrclibResponse {
    fn has_synced_lyrics(&self) -> bool {
        self.synced_lyrics
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
    }
}

#[async_trait]
impl LyricsProvider for LrclibProvider {
    fn name(&self) -> &'static str {
        "lrclib"
    }

    async fn fetch(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError> {
        info!(
            "Fetching lyrics from LRCLIB for: {} (artist: {:?})",
            query.track_name, query.artist_name
        );

        let url = self.search_url(query);
        info!("LRCLIB GET (search): {}", url);

        let response = self.client.get(&url).send().await?;
        info!("LRCLIB response status: {}", response.status());

        if !response.status().is_success() {
            warn!("LRCLIB search returned status: {}", response.status());
            return Err(CoreError::LyricsProviderFailed {
                provider: self.name().to_string(),
                reason: format!("LRCLIB search returned status: {}", response.status()),
            });
        }

        let results: Vec<LrclibResponse> = response.json().await?;
        debug!("LRCLIB search returned {} records", results.len());

        match select_record(results) {
            Some((result, fell_back)) => {
                let mut fetched = parse_response(result);
                fetched.fell_back_to_plain = fell_back;
                Ok(fetched)
            }
            None => Err(CoreError::LyricsNotFound {
                track: query.track_name.clone(),
            }),
        }
    }
}

/// Pick the first record with non-empty synced lyrics, otherwise the first
/// record of any kind. The flag is set when the fallback was taken.
fn select_record(results: Vec<LrclibResponse>) -> Option<(LrclibResponse, bool)> {
    if let Some(index) = results.iter().position(LrclibResponse::has_synced_lyrics) {
        return results.into_iter().nth(index).map(|record| (record, false));
    }

    let first = results.into_iter().next()?;
    info!(
        "No synced lyrics in search results, falling back to plain lyrics (lrclib id: {})",
        first.id
    );
    Some((first, true))
}

fn parse_response(result: LrclibResponse) -> FetchedLyrics {
    let provider_id = result.id.to_string();
    let track_name = result.track_name;
    let artist_name = result.artist_name;
    let fetched = |lyrics: LyricsResult| FetchedLyrics {
        result: lyrics,
        provider_id: provider_id.clone(),
        track_name: track_name.clone(),
        artist_name: artist_name.clone(),
        fell_back_to_plain: false,
    };

    if result.instrumental {
        debug!("Track is instrumental (lrclib id: {})", result.id);
        return fetched(LyricsResult::NotFound);
    }

    // Prefer synced lyrics
    if let Some(synced) = result.synced_lyrics {
        if !synced.trim().is_empty() {
            let track = LyricTrack::parse(&synced);
            debug!(
                "Got synced lyrics with {} lines (lrclib id: {})",
                track.len(),
                result.id
            );
            return fetched(LyricsResult::Synced(track));
        }
    }

    // Fall back to plain lyrics
    if let Some(plain) = result.plain_lyrics {
        if !plain.trim().is_empty() {
            debug!("Got plain lyrics (lrclib id: {})", result.id);
            return fetched(LyricsResult::Unsynced(plain));
        }
    }

    fetched(LyricsResult::NotFound)
}

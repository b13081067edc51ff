use clap::Parser;
use lyricterm_core::{
    parse_start_position, AnsiTerminal, CoreError, FetchedLyrics, LyricTermConfig, LyricTrack,
    LyricsProvider, LyricsQuery, LyricsResult, PlaybackConfig, PlaybackDriver, PlaybackOutcome,
    TerminalStyle,
};
use lyricterm_lyrics_lrclib::LrclibProvider;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Exit status when playback is interrupted with Ctrl+C
const EXIT_INTERRUPTED: u8 = 130;

const FALLBACK_WARNING: &str = "\u{26a0}\u{fe0f}  No synced lyrics found. Falling back to plain lyrics.";

/// Display synced lyrics from lrclib.net in the console
#[derive(Parser, Debug)]
#[command(name = "lyricterm")]
#[command(version)]
struct Args {
    /// Track name (e.g. 'ILYSB')
    #[arg(long)]
    track: String,

    /// Artist name
    #[arg(long)]
    artist: Option<String>,

    /// Start time (mm:ss or seconds)
    #[arg(long, default_value = "0")]
    start: String,

    /// Playback speed multiplier [default: from config, 1.0]
    #[arg(long)]
    speed: Option<f64>,

    /// Delay between typed characters in milliseconds [default: from config, 50]
    #[arg(long)]
    char_delay_ms: Option<u64>,

    /// Path to the config file
    #[arg(long, env = "LYRICTERM_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(LyricTermConfig::config_path);
    init_tracing(check_file_logging_enabled(&config_path));

    let config = match LyricTermConfig::load_or_create_at(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            return ExitCode::FAILURE;
        }
    };

    match run(args, &config).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            eprintln!("{}", exit_message(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, config: &LyricTermConfig) -> Result<ExitCode, CoreError> {
    let start = parse_start_position(&args.start)?;
    let speed = args.speed.unwrap_or(config.playback.speed);
    let playback = PlaybackConfig::new(start, speed)?;
    let char_delay = args
        .char_delay_ms
        .map_or_else(|| config.playback.char_delay(), Duration::from_millis);

    eprintln!("Searching...");
    let provider = LrclibProvider::from_config(&config.lyrics)?;
    let mut query = LyricsQuery::new(&args.track);
    if let Some(artist) = args.artist {
        query = query.with_artist(artist);
    }

    let fetched = provider.fetch(&query).await?;
    let track = synced_track(&query, &fetched)?;

    let style = TerminalStyle::ANSI.with_highlight(config.display.highlight);
    println!(
        "{}Now playing:{} {} \u{2014} {}",
        style.highlight,
        style.reset,
        fetched.artist_name.as_deref().unwrap_or("Unknown artist"),
        fetched.track_name.as_deref().unwrap_or(&query.track_name)
    );
    println!("Start offset: {:.2}s | Speed: x{speed}", start.as_secs_f64());

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, stopping playback...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    tokio::select! {
        () = cancel_token.cancelled() => return Ok(ExitCode::from(EXIT_INTERRUPTED)),
        () = tokio::time::sleep(config.playback.intro_pause()) => {}
    }

    info!(
        "Playing {} lines from {:?} at x{} (provider: {}, id: {})",
        track.len(),
        start,
        speed,
        provider.name(),
        fetched.provider_id
    );

    let driver = PlaybackDriver::new(playback).with_char_delay(char_delay);
    let mut terminal = AnsiTerminal::stdout(style);
    match driver.play(track, &mut terminal, &cancel_token).await? {
        PlaybackOutcome::Finished { .. } => {
            println!("\nDone.");
            Ok(ExitCode::SUCCESS)
        }
        PlaybackOutcome::Cancelled { lines_rendered } => {
            info!("Playback cancelled after {} lines", lines_rendered);
            println!();
            Ok(ExitCode::from(EXIT_INTERRUPTED))
        }
    }
}

/// The playable track from a fetch result, or the reason there is none
fn synced_track<'a>(
    query: &LyricsQuery,
    fetched: &'a FetchedLyrics,
) -> Result<&'a LyricTrack, CoreError> {
    let no_synced = || CoreError::NoSyncedLyrics {
        track: query.track_name.clone(),
    };

    if let Some(warning) = fallback_warning(fetched) {
        eprintln!("{warning}");
    }

    match &fetched.result {
        LyricsResult::Synced(track) if !track.is_empty() => Ok(track),
        LyricsResult::Synced(_) => {
            info!("Synced lyrics contained no timed lines");
            Err(no_synced())
        }
        LyricsResult::Unsynced(_) | LyricsResult::NotFound => Err(no_synced()),
    }
}

fn fallback_warning(fetched: &FetchedLyrics) -> Option<&'static str> {
    fetched.fell_back_to_plain.then_some(FALLBACK_WARNING)
}

/// Human-readable message printed before exiting with a failure
fn exit_message(e: &CoreError) -> String {
    match e {
        CoreError::LyricsNotFound { .. } => "Failed to fetch: No result found.".to_string(),
        CoreError::NoSyncedLyrics { .. } => "No synced lyrics found.".to_string(),
        CoreError::NetworkError(_)
        | CoreError::MiddlewareError(_)
        | CoreError::LyricsProviderFailed { .. } => format!("Failed to fetch: {e}"),
        _ => e.to_string(),
    }
}

/// Check if file logging is enabled by reading the config file.
/// This is done before full config loading to set up tracing first.
/// Returns `false` if config doesn't exist or can't be parsed.
fn check_file_logging_enabled(config_path: &Path) -> bool {
    // Minimal structs to parse just the logging.enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let Ok(content) = std::fs::read_to_string(config_path) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing on stderr and optional file logging. Console logs
/// default to warnings only so they don't interleave with the lyrics.
fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if file_logging_enabled {
        let log_path = lyricterm_core::paths::log_file_path();

        // Create config directory if needed
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Upper bound for `lyrics.max_retries`
const MAX_RETRIES_LIMIT: u32 = 10;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LyricTermConfig {
    #[serde(default)]
    pub playback: PlaybackSettings,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub lyrics: LyricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackSettings {
    /// Speed multiplier used when `--speed` is not given
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Delay between characters of the animated line
    #[serde(default = "default_char_delay_ms")]
    pub char_delay_ms: u64,
    /// Pause between the "Now playing" banner and the first frame
    #[serde(default = "default_intro_pause_ms")]
    pub intro_pause_ms: u64,
}

const fn default_speed() -> f64 {
    1.0
}

const fn default_char_delay_ms() -> u64 {
    50
}

const fn default_intro_pause_ms() -> u64 {
    800
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            char_delay_ms: default_char_delay_ms(),
            intro_pause_ms: default_intro_pause_ms(),
        }
    }
}

impl PlaybackSettings {
    #[must_use]
    pub const fn char_delay(&self) -> Duration {
        Duration::from_millis(self.char_delay_ms)
    }

    #[must_use]
    pub const fn intro_pause(&self) -> Duration {
        Duration::from_millis(self.intro_pause_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub highlight: HighlightColor,
}

/// Foreground colour of the line being typed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HighlightColor {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    #[default]
    Cyan,
    White,
}

impl HighlightColor {
    #[must_use]
    pub const fn ansi_foreground(self) -> &'static str {
        match self {
            Self::Red => "\x1b[31m",
            Self::Green => "\x1b[32m",
            Self::Yellow => "\x1b[33m",
            Self::Blue => "\x1b[34m",
            Self::Magenta => "\x1b[35m",
            Self::Cyan => "\x1b[36m",
            Self::White => "\x1b[37m",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LyricsConfig {
    /// Base URL of the LRCLIB API
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries for transient HTTP failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_api_url() -> String {
    "https://lrclib.net/api".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_max_retries() -> u32 {
    3
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to a file next to the config
    #[serde(default)]
    pub enabled: bool,
}

impl LyricTermConfig {
    /// Get the config file path (~/.config/lyricterm/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from `path`. If the file does not exist, a commented
    /// template is written there and the defaults are returned. Failing to
    /// write the template is logged and the defaults are still returned.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing config file cannot be read, parsed, or fails validation.
    pub fn load_or_create_at(path: &Path) -> Result<Self> {
        if !path.exists() {
            match write_template(path) {
                Ok(()) => info!("Created config template at {}", path.display()),
                Err(e) => warn!(
                    "Could not write config template to {}: {e}; using defaults",
                    path.display()
                ),
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate config from TOML text
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigParseError`] for malformed TOML and
    /// [`CoreError::ConfigInvalid`] for out-of-range values.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let speed = self.playback.speed;
        if !speed.is_finite() || speed <= 0.0 {
            return Err(CoreError::ConfigInvalid {
                message: format!("playback.speed must be a positive number, got {speed}"),
            });
        }
        if self.lyrics.api_url.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "lyrics.api_url must not be empty".to_string(),
            });
        }
        if self.lyrics.timeout_secs == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "lyrics.timeout_secs must be at least 1".to_string(),
            });
        }
        if self.lyrics.max_retries > MAX_RETRIES_LIMIT {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "lyrics.max_retries must be at most {MAX_RETRIES_LIMIT}, got {}",
                    self.lyrics.max_retries
                ),
            });
        }
        Ok(())
    }
}

const CONFIG_TEMPLATE: &str = r#"# lyricterm configuration
# ~/.config/lyricterm/config.toml

[playback]
# Default speed multiplier (overridden by --speed)
speed = 1.0
# Delay between characters of the line being typed
char_delay_ms = 50
# Pause after the "Now playing" banner before the first line
intro_pause_ms = 800

[display]
# Colour of the current line: "red", "green", "yellow", "blue", "magenta", "cyan", "white"
highlight = "cyan"

[lyrics]
api_url = "https://lrclib.net/api"
timeout_secs = 10
max_retries = 3

[logging]
# Write logs to ~/.config/lyricterm/lyricterm.log
enabled = false
"#;

fn write_template(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, CONFIG_TEMPLATE)
}

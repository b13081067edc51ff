pub mod clock;
pub mod config;
pub mod error;
pub mod lrc;
pub mod paths;
pub mod player;
pub mod provider;
pub mod render;
pub mod time;

pub use clock::{PlaybackClock, PlaybackConfig};
pub use config::{
    DisplayConfig, HighlightColor, LoggingConfig, LyricTermConfig, LyricsConfig, PlaybackSettings,
};
pub use error::CoreError;
pub use lrc::{LyricLine, LyricTrack};
pub use player::{DriverState, PlaybackDriver, PlaybackOutcome, PlaybackSession, HISTORY_LEN};
pub use provider::{FetchedLyrics, LyricsProvider, LyricsQuery, LyricsResult};
pub use render::{
    render_frame, AnsiTerminal, CursorGuard, FrameStatus, RenderSurface, TerminalStyle,
    DEFAULT_CHAR_DELAY,
};
pub use time::parse_start_position;

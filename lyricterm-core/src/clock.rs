//! Virtual playback clock.
//!
//! Maps a lyric line's offset onto a deadline relative to the instant a
//! playback session started, taking the start offset and speed multiplier
//! into account. Every deadline is derived from the same start instant, so
//! time spent rendering one line never pushes later lines back.

use crate::error::{CoreError, Result};
use std::time::Duration;
use tokio::time::Instant;

/// Longest wait the clock schedules. Waits that would exceed it (very slow
/// speeds, huge offsets) are clamped here instead of overflowing.
pub const MAX_WAIT: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Start offset and speed for one playback session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackConfig {
    start_offset: Duration,
    speed: f64,
}

impl PlaybackConfig {
    /// Create a playback config.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSpeed`] if `speed` is not a finite positive number.
    pub fn new(start_offset: Duration, speed: f64) -> Result<Self> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(CoreError::InvalidSpeed { speed });
        }

        Ok(Self {
            start_offset,
            speed,
        })
    }

    #[must_use]
    pub const fn start_offset(&self) -> Duration {
        self.start_offset
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            start_offset: Duration::ZERO,
            speed: 1.0,
        }
    }
}

/// Converts lyric offsets into waits and deadlines
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaybackClock {
    config: PlaybackConfig,
}

impl PlaybackClock {
    #[must_use]
    pub const fn new(config: PlaybackConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Wall-clock time after session start at which `offset` is due:
    /// `(offset - start_offset) / speed`.
    ///
    /// Returns `None` for offsets before the start offset; those lines are
    /// never waited on. Waits longer than [`MAX_WAIT`] are clamped to it.
    #[must_use]
    pub fn scheduled_wait(&self, offset: Duration) -> Option<Duration> {
        let ahead = offset.checked_sub(self.config.start_offset)?;
        let wait = Duration::try_from_secs_f64(ahead.as_secs_f64() / self.config.speed)
            .map_or(MAX_WAIT, |wait| wait.min(MAX_WAIT));
        Some(wait)
    }

    /// Absolute deadline for `offset` in a session that started at `started_at`
    #[must_use]
    pub fn deadline(&self, started_at: Instant, offset: Duration) -> Option<Instant> {
        let wait = self.scheduled_wait(offset)?;
        started_at
            .checked_add(wait)
            .or_else(|| started_at.checked_add(MAX_WAIT))
    }
}

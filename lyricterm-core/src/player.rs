//! Playback driver for synced lyrics.
//!
//! Walks a [`LyricTrack`] in order, waits for each line's deadline on the
//! [`PlaybackClock`] and redraws the scrollback plus the animated line on a
//! [`RenderSurface`]. A session runs on a single task; the only suspension
//! points are the deadline wait and the per-character animation delay, and
//! both race the cancellation token.

use crate::clock::{PlaybackClock, PlaybackConfig};
use crate::error::{CoreError, Result};
use crate::lrc::{LyricLine, LyricTrack};
use crate::render::{render_frame, CursorGuard, FrameStatus, RenderSurface, DEFAULT_CHAR_DELAY};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Number of previously rendered lines kept in the scrollback
pub const HISTORY_LEN: usize = 3;

/// Where a playback session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    NotStarted,
    Seeking,
    Waiting,
    Rendering,
    Finished,
    Cancelled,
}

/// How a playback session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every line after the start offset was rendered
    Finished { lines_rendered: usize },
    /// The cancellation token fired before the last line completed
    Cancelled { lines_rendered: usize },
}

impl PlaybackOutcome {
    #[must_use]
    pub const fn lines_rendered(&self) -> usize {
        match self {
            Self::Finished { lines_rendered } | Self::Cancelled { lines_rendered } => {
                *lines_rendered
            }
        }
    }
}

/// Runtime state of one pass over a track
#[derive(Debug)]
pub struct PlaybackSession<'t> {
    track: &'t LyricTrack,
    next: usize,
    history: VecDeque<&'t str>,
    started_at: Instant,
    state: DriverState,
    lines_rendered: usize,
}

impl<'t> PlaybackSession<'t> {
    #[must_use]
    pub fn new(track: &'t LyricTrack) -> Self {
        Self {
            track,
            next: 0,
            history: VecDeque::with_capacity(HISTORY_LEN),
            started_at: Instant::now(),
            state: DriverState::NotStarted,
            lines_rendered: 0,
        }
    }

    /// Skip every line that starts before `start_offset`. The last skipped
    /// line, if any, becomes the first scrollback entry.
    pub fn seek(&mut self, start_offset: Duration) {
        self.set_state(DriverState::Seeking);

        let track = self.track;
        let skipped = track
            .iter()
            .take_while(|line| line.offset < start_offset)
            .count();
        self.next = skipped;

        if let Some(last) = skipped.checked_sub(1).and_then(|i| track.lines().get(i)) {
            self.push_history(&last.text);
        }

        debug!(
            "Seeked past {} of {} lines (start offset {:?})",
            skipped,
            track.len(),
            start_offset
        );
    }

    /// Mark now as the instant all deadlines are measured from
    pub fn start_clock(&mut self) {
        self.started_at = Instant::now();
    }

    #[must_use]
    pub const fn started_at(&self) -> Instant {
        self.started_at
    }

    #[must_use]
    pub const fn state(&self) -> DriverState {
        self.state
    }

    /// Recently rendered lines, oldest first
    #[must_use]
    pub const fn history(&self) -> &VecDeque<&'t str> {
        &self.history
    }

    /// The next line to be rendered
    #[must_use]
    pub fn next_line(&self) -> Option<&'t LyricLine> {
        self.track.lines().get(self.next)
    }

    /// Advance past the current line after it was fully rendered
    pub fn complete_line(&mut self) {
        if let Some(line) = self.next_line() {
            self.push_history(&line.text);
            self.next += 1;
            self.lines_rendered += 1;
        }
    }

    fn push_history(&mut self, text: &'t str) {
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(text);
    }

    fn set_state(&mut self, state: DriverState) {
        trace!("Playback state {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    fn finish(&mut self) -> PlaybackOutcome {
        self.set_state(DriverState::Finished);
        PlaybackOutcome::Finished {
            lines_rendered: self.lines_rendered,
        }
    }

    fn cancel(&mut self) -> PlaybackOutcome {
        self.set_state(DriverState::Cancelled);
        PlaybackOutcome::Cancelled {
            lines_rendered: self.lines_rendered,
        }
    }
}

/// Plays a lyric track onto a render surface in real time
#[derive(Debug, Clone, Copy)]
pub struct PlaybackDriver {
    clock: PlaybackClock,
    char_delay: Duration,
}

impl PlaybackDriver {
    #[must_use]
    pub const fn new(config: PlaybackConfig) -> Self {
        Self {
            clock: PlaybackClock::new(config),
            char_delay: DEFAULT_CHAR_DELAY,
        }
    }

    /// Set the delay between characters of the animated line
    #[must_use]
    pub const fn with_char_delay(mut self, char_delay: Duration) -> Self {
        self.char_delay = char_delay;
        self
    }

    /// Play `track` on `surface` until every line is shown or `cancel` fires.
    ///
    /// The cursor is hidden for the duration of playback and shown again
    /// exactly once on every exit path, including when this future is
    /// dropped before completion.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RenderFailed`] if writing to the terminal fails.
    pub async fn play<S>(
        &self,
        track: &LyricTrack,
        surface: &mut S,
        cancel: &CancellationToken,
    ) -> Result<PlaybackOutcome>
    where
        S: RenderSurface + ?Sized,
    {
        let mut session = PlaybackSession::new(track);
        session.seek(self.clock.config().start_offset());

        surface.clear_screen().map_err(CoreError::RenderFailed)?;
        let mut cursor = CursorGuard::hide(surface)?;
        session.start_clock();

        let played = self.run(&mut session, cursor.surface(), cancel).await;
        let restored = cursor.restore();
        let outcome = played?;
        restored?;

        info!(
            "Playback ended: {:?} ({} of {} lines)",
            session.state(),
            outcome.lines_rendered(),
            track.len()
        );
        Ok(outcome)
    }

    async fn run<S>(
        &self,
        session: &mut PlaybackSession<'_>,
        surface: &mut S,
        cancel: &CancellationToken,
    ) -> Result<PlaybackOutcome>
    where
        S: RenderSurface + ?Sized,
    {
        while let Some(line) = session.next_line() {
            if cancel.is_cancelled() {
                return Ok(session.cancel());
            }

            session.set_state(DriverState::Waiting);
            if let Some(deadline) = self.clock.deadline(session.started_at(), line.offset) {
                trace!(
                    "Waiting {:?} for line at {:?}",
                    deadline.saturating_duration_since(Instant::now()),
                    line.offset
                );
                tokio::select! {
                    () = cancel.cancelled() => return Ok(session.cancel()),
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }

            session.set_state(DriverState::Rendering);
            let status = render_frame(
                surface,
                session.history().iter().copied(),
                &line.text,
                self.char_delay,
                cancel,
            )
            .await?;

            if status == FrameStatus::Interrupted {
                return Ok(session.cancel());
            }
            session.complete_line();
        }

        surface.move_to_bottom().map_err(CoreError::RenderFailed)?;
        surface.flush().map_err(CoreError::RenderFailed)?;
        Ok(session.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::{Call, RecordingSurface};

    fn example_track() -> LyricTrack {
        LyricTrack::parse("[0:01]Hello\n[0:02]World\n[0:00.5]Intro")
    }

    fn driver(start_ms: u64, speed: f64) -> PlaybackDriver {
        match PlaybackConfig::new(Duration::from_millis(start_ms), speed) {
            Ok(config) => PlaybackDriver::new(config).with_char_delay(Duration::ZERO),
            Err(e) => unreachable!("valid config rejected: {e}"),
        }
    }

    fn frame_offsets(surface: &RecordingSurface, start: Instant) -> Vec<(Duration, String)> {
        surface
            .frames()
            .into_iter()
            .map(|f| (f.typed_at - start, f.typed))
            .collect()
    }

    #[test]
    fn test_seek_without_skipping_seeds_nothing() {
        let track = example_track();
        let mut session = PlaybackSession::new(&track);
        session.seek(Duration::ZERO);

        assert_eq!(session.state(), DriverState::Seeking);
        assert!(session.history().is_empty());
        assert_eq!(session.next_line().map(|l| l.text.as_str()), Some("Intro"));
    }

    #[test]
    fn test_seek_seeds_last_skipped_line() {
        let track = example_track();
        let mut session = PlaybackSession::new(&track);
        session.seek(Duration::from_millis(1500));

        assert_eq!(session.history().iter().copied().collect::<Vec<_>>(), vec!["Hello"]);
        assert_eq!(session.next_line().map(|l| l.text.as_str()), Some("World"));
    }

    #[test]
    fn test_seek_at_exact_offset_keeps_line() {
        let track = example_track();
        let mut session = PlaybackSession::new(&track);
        session.seek(Duration::from_secs(1));

        assert_eq!(session.history().iter().copied().collect::<Vec<_>>(), vec!["Intro"]);
        assert_eq!(session.next_line().map(|l| l.text.as_str()), Some("Hello"));
    }

    #[test]
    fn test_seek_past_end() {
        let track = example_track();
        let mut session = PlaybackSession::new(&track);
        session.seek(Duration::from_secs(60));

        assert!(session.next_line().is_none());
        assert_eq!(session.history().iter().copied().collect::<Vec<_>>(), vec!["World"]);
    }

    #[test]
    fn test_history_keeps_most_recent_three() {
        let track = LyricTrack::parse("[00:01]a\n[00:02]b\n[00:03]c\n[00:04]d\n[00:05]e");
        let mut session = PlaybackSession::new(&track);
        session.seek(Duration::ZERO);

        for expected_len in [1, 2, 3, 3, 3] {
            session.complete_line();
            assert_eq!(session.history().len(), expected_len);
        }
        assert_eq!(
            session.history().iter().copied().collect::<Vec<_>>(),
            vec!["c", "d", "e"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_plays_from_start_offset_with_seeded_history() {
        let track = example_track();
        let mut surface = RecordingSurface::default();
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let outcome = driver(1500, 1.0).play(&track, &mut surface, &cancel).await;

        assert!(matches!(outcome, Ok(PlaybackOutcome::Finished { lines_rendered: 1 })));
        let frames = surface.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].typed, "World");
        assert_eq!(frames[0].dimmed, vec!["Hello".to_string()]);
        assert_eq!(frames[0].typed_at - start, Duration::from_millis(500));
        assert_eq!(surface.count(&Call::ShowCursor), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lines_rendered_on_schedule() {
        let track = example_track();
        let mut surface = RecordingSurface::default();
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let outcome = driver(0, 1.0).play(&track, &mut surface, &cancel).await;

        assert!(matches!(outcome, Ok(PlaybackOutcome::Finished { lines_rendered: 3 })));
        assert_eq!(
            frame_offsets(&surface, start),
            vec![
                (Duration::from_millis(500), "Intro".to_string()),
                (Duration::from_secs(1), "Hello".to_string()),
                (Duration::from_secs(2), "World".to_string()),
            ]
        );
        let frames = surface.frames();
        assert!(frames[0].dimmed.is_empty());
        assert_eq!(frames[2].dimmed, vec!["Intro".to_string(), "Hello".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_speed_scales_schedule() {
        let track = example_track();
        let mut surface = RecordingSurface::default();
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let outcome = driver(0, 2.0).play(&track, &mut surface, &cancel).await;

        assert!(outcome.is_ok());
        let offsets: Vec<_> = frame_offsets(&surface, start)
            .into_iter()
            .map(|(at, _)| at)
            .collect();
        assert_eq!(
            offsets,
            vec![
                Duration::from_millis(250),
                Duration::from_millis(500),
                Duration::from_secs(1)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_scrollback_never_exceeds_three_lines() {
        let track = LyricTrack::parse(
            "[00:01]one\n[00:02]two\n[00:03]three\n[00:04]four\n[00:05]five\n[00:06]six",
        );
        let mut surface = RecordingSurface::default();
        let cancel = CancellationToken::new();

        let outcome = driver(0, 1.0).play(&track, &mut surface, &cancel).await;

        assert!(matches!(outcome, Ok(PlaybackOutcome::Finished { lines_rendered: 6 })));
        let frames = surface.frames();
        assert!(frames.iter().all(|f| f.dimmed.len() <= HISTORY_LEN));
        assert_eq!(
            frames[5].dimmed,
            vec!["three".to_string(), "four".to_string(), "five".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_animation_does_not_delay_later_lines() {
        let track = LyricTrack::parse("[00:01]abcdefghij\n[00:01.20]b\n[00:03]c");
        let mut surface = RecordingSurface::default();
        let cancel = CancellationToken::new();
        let start = Instant::now();
        let driver = driver(0, 1.0).with_char_delay(Duration::from_millis(50));

        let outcome = driver.play(&track, &mut surface, &cancel).await;

        assert!(outcome.is_ok());
        let offsets: Vec<_> = frame_offsets(&surface, start)
            .into_iter()
            .map(|(at, _)| at)
            .collect();
        assert_eq!(
            offsets,
            vec![
                Duration::from_secs(1),
                Duration::from_millis(1500),
                Duration::from_secs(3)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_finish_moves_to_bottom_then_restores_cursor() {
        let track = example_track();
        let mut surface = RecordingSurface::default();
        let cancel = CancellationToken::new();

        let outcome = driver(0, 1.0).play(&track, &mut surface, &cancel).await;

        assert!(outcome.is_ok());
        let tail: Vec<_> = surface.calls.iter().rev().take(4).rev().map(|(_, c)| c.clone()).collect();
        assert_eq!(
            tail,
            vec![Call::MoveToBottom, Call::Flush, Call::ShowCursor, Call::Flush]
        );
        assert_eq!(surface.count(&Call::HideCursor), 1);
        assert_eq!(surface.count(&Call::ShowCursor), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_first_line() {
        let track = example_track();
        let mut surface = RecordingSurface::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = driver(0, 1.0).play(&track, &mut surface, &cancel).await;

        assert!(matches!(outcome, Ok(PlaybackOutcome::Cancelled { lines_rendered: 0 })));
        assert!(surface.frames().is_empty());
        assert_eq!(surface.count(&Call::ShowCursor), 1);
        assert_eq!(surface.count(&Call::MoveToBottom), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_while_waiting() {
        let track = LyricTrack::parse("[00:01]first\n[00:02]second");
        let mut surface = RecordingSurface::default();
        let cancel = CancellationToken::new();
        let start = Instant::now();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            canceller.cancel();
        });

        let outcome = driver(0, 1.0).play(&track, &mut surface, &cancel).await;

        assert!(matches!(outcome, Ok(PlaybackOutcome::Cancelled { lines_rendered: 1 })));
        assert_eq!(Instant::now() - start, Duration::from_millis(1500));
        assert_eq!(surface.count(&Call::ShowCursor), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_near_zero_speed_waits_until_cancelled() {
        let track = LyricTrack::parse("[00:00]first\n[00:05]second");
        let mut surface = RecordingSurface::default();
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            canceller.cancel();
        });

        let outcome = driver(0, 1e-300).play(&track, &mut surface, &cancel).await;

        assert!(matches!(outcome, Ok(PlaybackOutcome::Cancelled { lines_rendered: 1 })));
        assert_eq!(surface.count(&Call::ShowCursor), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_mid_animation() {
        let track = example_track();
        let cancel = CancellationToken::new();
        let mut surface = RecordingSurface {
            cancel_on_frame: Some((2, cancel.clone())),
            ..Default::default()
        };
        let driver = driver(0, 1.0).with_char_delay(Duration::from_millis(50));

        let outcome = driver.play(&track, &mut surface, &cancel).await;

        assert!(matches!(outcome, Ok(PlaybackOutcome::Cancelled { lines_rendered: 1 })));
        assert_eq!(surface.frames().len(), 2);
        assert_eq!(surface.count(&Call::ShowCursor), 1);
        assert_eq!(surface.count(&Call::MoveToBottom), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_error_still_restores_cursor() {
        let track = example_track();
        let mut surface = RecordingSurface {
            fail_on_char: Some(2),
            ..Default::default()
        };
        let cancel = CancellationToken::new();

        let outcome = driver(0, 1.0).play(&track, &mut surface, &cancel).await;

        assert!(matches!(outcome, Err(CoreError::RenderFailed(_))));
        assert_eq!(surface.count(&Call::ShowCursor), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_playback_restores_cursor() {
        let track = example_track();
        let mut surface = RecordingSurface::default();
        let cancel = CancellationToken::new();
        let driver = driver(0, 1.0);

        let timed_out = tokio::time::timeout(
            Duration::from_millis(700),
            driver.play(&track, &mut surface, &cancel),
        )
        .await;

        assert!(timed_out.is_err());
        assert_eq!(surface.frames().len(), 1);
        assert_eq!(surface.count(&Call::ShowCursor), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_track_finishes_immediately() {
        let track = LyricTrack::default();
        let mut surface = RecordingSurface::default();
        let cancel = CancellationToken::new();

        let outcome = driver(0, 1.0).play(&track, &mut surface, &cancel).await;

        assert!(matches!(outcome, Ok(PlaybackOutcome::Finished { lines_rendered: 0 })));
        assert_eq!(surface.count(&Call::ShowCursor), 1);
    }
}

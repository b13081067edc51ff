//! Terminal output for lyrics playback.
//!
//! [`RenderSurface`] is the minimal set of terminal operations the player
//! needs. [`AnsiTerminal`] implements it with ANSI escape sequences over any
//! writer; tests substitute a recording fake.

use crate::config::HighlightColor;
use crate::error::{CoreError, Result};
use std::io::{self, Write};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Default delay between characters of the animated line
pub const DEFAULT_CHAR_DELAY: Duration = Duration::from_millis(50);

/// Escape sequences used by [`AnsiTerminal`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalStyle {
    pub clear: &'static str,
    pub bold: &'static str,
    pub dim: &'static str,
    pub reset: &'static str,
    pub highlight: &'static str,
    pub hide_cursor: &'static str,
    pub show_cursor: &'static str,
    pub move_to_bottom: &'static str,
}

impl TerminalStyle {
    pub const ANSI: Self = Self {
        clear: "\x1b[2J\x1b[H",
        bold: "\x1b[1m",
        dim: "\x1b[2m",
        reset: "\x1b[0m",
        highlight: "\x1b[36m",
        hide_cursor: "\x1b[?25l",
        show_cursor: "\x1b[?25h",
        move_to_bottom: "\x1b[999B",
    };

    /// ANSI style with a different highlight colour for the current line
    #[must_use]
    pub const fn with_highlight(self, color: HighlightColor) -> Self {
        Self {
            highlight: color.ansi_foreground(),
            ..self
        }
    }
}

impl Default for TerminalStyle {
    fn default() -> Self {
        Self::ANSI
    }
}

/// Terminal operations needed to play lyrics
pub trait RenderSurface {
    /// Erase everything and move the cursor to the top-left corner
    fn clear_screen(&mut self) -> io::Result<()>;

    fn hide_cursor(&mut self) -> io::Result<()>;

    fn show_cursor(&mut self) -> io::Result<()>;

    /// Move the cursor to the bottom of the visible area
    fn move_to_bottom(&mut self) -> io::Result<()>;

    /// Print an empty line
    fn blank_line(&mut self) -> io::Result<()>;

    /// Print a scrollback line in the dimmed style
    fn dimmed_line(&mut self, text: &str) -> io::Result<()>;

    /// Switch to the bold highlight style for the animated line
    fn begin_highlight(&mut self) -> io::Result<()>;

    /// Print one character of the animated line and make it visible
    fn put_char(&mut self, ch: char) -> io::Result<()>;

    /// Reset styling after the animated line
    fn end_highlight(&mut self) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;
}

/// [`RenderSurface`] writing ANSI escape sequences
pub struct AnsiTerminal<W: Write> {
    out: W,
    style: TerminalStyle,
}

impl AnsiTerminal<io::Stdout> {
    /// Terminal on standard output with the given style
    #[must_use]
    pub fn stdout(style: TerminalStyle) -> Self {
        Self::new(io::stdout(), style)
    }
}

impl<W: Write> AnsiTerminal<W> {
    pub const fn new(out: W, style: TerminalStyle) -> Self {
        Self { out, style }
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderSurface for AnsiTerminal<W> {
    fn clear_screen(&mut self) -> io::Result<()> {
        self.out.write_all(self.style.clear.as_bytes())?;
        self.out.flush()
    }

    fn hide_cursor(&mut self) -> io::Result<()> {
        self.out.write_all(self.style.hide_cursor.as_bytes())
    }

    fn show_cursor(&mut self) -> io::Result<()> {
        self.out.write_all(self.style.show_cursor.as_bytes())
    }

    fn move_to_bottom(&mut self) -> io::Result<()> {
        self.out.write_all(self.style.move_to_bottom.as_bytes())
    }

    fn blank_line(&mut self) -> io::Result<()> {
        self.out.write_all(b"\n")
    }

    fn dimmed_line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "{}{}{}", self.style.dim, text, self.style.reset)
    }

    fn begin_highlight(&mut self) -> io::Result<()> {
        write!(self.out, "{}{}", self.style.bold, self.style.highlight)
    }

    fn put_char(&mut self, ch: char) -> io::Result<()> {
        let mut buf = [0_u8; 4];
        self.out.write_all(ch.encode_utf8(&mut buf).as_bytes())?;
        self.out.flush()
    }

    fn end_highlight(&mut self) -> io::Result<()> {
        self.out.write_all(self.style.reset.as_bytes())?;
        self.out.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Hides the cursor for its lifetime and shows it again exactly once.
///
/// [`CursorGuard::restore`] restores visibility and reports errors; if it was
/// never called (early return, panic, or the owning future being dropped)
/// the guard restores visibility on drop.
pub struct CursorGuard<'a, S: RenderSurface + ?Sized> {
    surface: &'a mut S,
    restored: bool,
}

impl<'a, S: RenderSurface + ?Sized> CursorGuard<'a, S> {
    /// Hide the cursor on `surface`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RenderFailed`] if the cursor cannot be hidden. The
    /// cursor is shown again before returning in that case.
    pub fn hide(surface: &'a mut S) -> Result<Self> {
        let mut guard = Self {
            surface,
            restored: false,
        };
        guard.surface.hide_cursor().map_err(CoreError::RenderFailed)?;
        Ok(guard)
    }

    pub fn surface(&mut self) -> &mut S {
        &mut *self.surface
    }

    /// Show the cursor again and flush.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RenderFailed`] if writing to the terminal fails.
    pub fn restore(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        self.surface.show_cursor().map_err(CoreError::RenderFailed)?;
        self.surface.flush().map_err(CoreError::RenderFailed)
    }
}

impl<S: RenderSurface + ?Sized> Drop for CursorGuard<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!("Failed to restore cursor visibility: {}", e);
        }
    }
}

/// How a frame's animation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Complete,
    Interrupted,
}

/// Draw one playback frame: a blank line, the dimmed scrollback (oldest
/// first), another blank line, then `current` typed out one character at a
/// time in the highlight style.
///
/// Stops early with [`FrameStatus::Interrupted`] if `cancel` fires during
/// the animation; the style is still reset.
///
/// # Errors
///
/// Returns [`CoreError::RenderFailed`] if writing to the terminal fails.
pub async fn render_frame<'h, S, H>(
    surface: &mut S,
    history: H,
    current: &str,
    char_delay: Duration,
    cancel: &CancellationToken,
) -> Result<FrameStatus>
where
    S: RenderSurface + ?Sized,
    H: IntoIterator<Item = &'h str>,
{
    surface.clear_screen().map_err(CoreError::RenderFailed)?;
    surface.blank_line().map_err(CoreError::RenderFailed)?;
    for line in history {
        surface.dimmed_line(line).map_err(CoreError::RenderFailed)?;
    }
    surface.blank_line().map_err(CoreError::RenderFailed)?;

    surface.begin_highlight().map_err(CoreError::RenderFailed)?;
    let mut status = FrameStatus::Complete;
    for ch in current.chars() {
        surface.put_char(ch).map_err(CoreError::RenderFailed)?;
        if char_delay.is_zero() {
            continue;
        }
        tokio::select! {
            () = cancel.cancelled() => {
                status = FrameStatus::Interrupted;
                break;
            }
            () = tokio::time::sleep(char_delay) => {}
        }
    }
    surface.end_highlight().map_err(CoreError::RenderFailed)?;

    Ok(status)
}

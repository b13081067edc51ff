use std::ops::RangeInclusive;
use std::time::Duration;

/// Parsed synced lyrics, sorted by offset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LyricTrack {
    lines: Vec<LyricLine>,
}

/// A single line of lyrics with timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    /// Scheduled display time from the beginning of the track
    pub offset: Duration,
    pub text: String,
}

impl LyricLine {
    pub fn new(offset: Duration, text: impl Into<String>) -> Self {
        Self {
            offset,
            text: text.into(),
        }
    }
}

impl LyricTrack {
    /// Parse synced lyrics text like `[01:02.50]Some words` into a track.
    ///
    /// Lines end at `\n`, `\r\n` or a bare `\r`. Lines without a leading
    /// `[m:ss]` or `[m:ss.fff]` tag are dropped. Lines sharing an offset keep
    /// their relative order.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let lines: Vec<LyricLine> = input
            .trim()
            .split(['\n', '\r'])
            .filter_map(parse_lyric_line)
            .collect();
        Self::from_lines(lines)
    }

    /// Build a track from already-timed lines, sorting them by offset.
    #[must_use]
    pub fn from_lines(mut lines: Vec<LyricLine>) -> Self {
        lines.sort_by_key(|l| l.offset);
        Self { lines }
    }

    #[must_use]
    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LyricLine> {
        self.lines.iter()
    }
}

impl<'a> IntoIterator for &'a LyricTrack {
    type Item = &'a LyricLine;
    type IntoIter = std::slice::Iter<'a, LyricLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

/// Parse a lyric line like `[00:12.34] Hello world`
fn parse_lyric_line(line: &str) -> Option<LyricLine> {
    let rest = line.strip_prefix('[')?;
    let end = rest.find(']')?;
    let offset = parse_timestamp(&rest[..end])?;
    let text = rest[end + 1..].trim_start();

    Some(LyricLine::new(offset, text))
}

/// Parse the inside of a time tag: `m:ss`, `mm:ss`, optionally followed by
/// `.f`, `.ff` or `.fff`
fn parse_timestamp(s: &str) -> Option<Duration> {
    let (minutes, rest) = s.split_once(':')?;
    let (seconds, fraction) = match rest.split_once('.') {
        Some((seconds, fraction)) => (seconds, Some(fraction)),
        None => (rest, None),
    };

    if !is_digits(minutes, 1..=2) || !is_digits(seconds, 2..=2) {
        return None;
    }

    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    let millis = match fraction {
        Some(fraction) => parse_fraction_millis(fraction)?,
        None => 0,
    };

    Some(Duration::from_millis(minutes * 60_000 + seconds * 1000 + millis))
}

/// Right-pad a 1-3 digit fraction to milliseconds (`5` -> 500, `12` -> 120)
fn parse_fraction_millis(fraction: &str) -> Option<u64> {
    if !is_digits(fraction, 1..=3) {
        return None;
    }

    let value: u64 = fraction.parse().ok()?;
    let scale = match fraction.len() {
        1 => 100,
        2 => 10,
        _ => 1,
    };

    Some(value * scale)
}

fn is_digits(s: &str, len: RangeInclusive<usize>) -> bool {
    len.contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

//! Parsing of user-supplied playback positions.

use crate::error::{CoreError, Result};
use std::time::Duration;

/// Parse a start position given as `mm:ss` (seconds may be fractional) or as
/// a plain number of seconds.
///
/// `"1:30"` is 90 seconds, `"45.5"` is 45.5 seconds.
///
/// # Errors
///
/// Returns [`CoreError::InvalidPosition`] for malformed, negative or
/// non-finite input.
pub fn parse_start_position(input: &str) -> Result<Duration> {
    let invalid = || CoreError::InvalidPosition {
        input: input.to_string(),
    };
    let trimmed = input.trim();

    let secs = match trimmed.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: u32 = minutes.trim().parse().map_err(|_| invalid())?;
            let seconds: f64 = seconds.trim().parse().map_err(|_| invalid())?;
            if seconds.is_sign_negative() {
                return Err(invalid());
            }
            f64::from(minutes) * 60.0 + seconds
        }
        None => trimmed.parse::<f64>().map_err(|_| invalid())?,
    };

    Duration::try_from_secs_f64(secs).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_and_seconds() {
        assert!(matches!(parse_start_position("1:30"), Ok(d) if d == Duration::from_secs(90)));
        assert!(matches!(parse_start_position("0:07.25"), Ok(d) if d == Duration::from_millis(7250)));
        assert!(matches!(parse_start_position("12:00"), Ok(d) if d == Duration::from_secs(720)));
    }

    #[test]
    fn test_plain_seconds() {
        assert!(matches!(parse_start_position("45.5"), Ok(d) if d == Duration::from_millis(45_500)));
        assert!(matches!(parse_start_position("0"), Ok(d) if d.is_zero()));
        assert!(matches!(parse_start_position(" 3 "), Ok(d) if d == Duration::from_secs(3)));
    }

    #[test]
    fn test_rejects_malformed_input() {
        for input in ["", "abc", "1:2:3", "1.5:00", "-3", "1:-5", "inf", "NaN", ":30"] {
            assert!(
                matches!(
                    parse_start_position(input),
                    Err(CoreError::InvalidPosition { .. })
                ),
                "accepted {input:?}"
            );
        }
    }
}

//! Clock-face formatting for remaining/elapsed seconds.

use crate::error::ValidationError;

const SECS_PER_HOUR: u64 = 3600;

/// `MM:SS` below one hour, `HH:MM:SS` from one hour up.
pub fn format_clock(seconds: u64) -> String {
    let hours = seconds / SECS_PER_HOUR;
    let minutes = (seconds / 60) % 60;
    let secs = seconds % 60;
    if seconds >= SECS_PER_HOUR {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// Inverse of [`format_clock`].
///
/// Minute and second fields must be below 60; the hour field is unbounded.
pub fn parse_clock(text: &str) -> Result<u64, ValidationError> {
    let invalid = || ValidationError::InvalidClock(text.to_string());

    let fields = text
        .trim()
        .split(':')
        .map(|part| {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse::<u64>().map_err(|_| invalid())
        })
        .collect::<Result<Vec<_>, _>>()?;

    let (hours, minutes, secs) = match fields.as_slice() {
        [m, s] => (0, *m, *s),
        [h, m, s] => (*h, *m, *s),
        _ => return Err(invalid()),
    };
    if minutes >= 60 || secs >= 60 {
        return Err(invalid());
    }

    hours
        .checked_mul(SECS_PER_HOUR)
        .and_then(|h| h.checked_add(minutes * 60 + secs))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_form_below_an_hour() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(59), "00:59");
        assert_eq!(format_clock(25 * 60), "25:00");
        assert_eq!(format_clock(3599), "59:59");
    }

    #[test]
    fn long_form_from_an_hour() {
        assert_eq!(format_clock(3600), "01:00:00");
        assert_eq!(format_clock(3725), "01:02:05");
        assert_eq!(format_clock(100 * 3600), "100:00:00");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_clock("").is_err());
        assert!(parse_clock("12").is_err());
        assert!(parse_clock("1:60").is_err());
        assert!(parse_clock("a:10").is_err());
        assert!(parse_clock("1:2:3:4").is_err());
        assert!(parse_clock("-1:00").is_err());
    }

    #[test]
    fn parse_accepts_both_forms() {
        assert_eq!(parse_clock("24:59"), Ok(24 * 60 + 59));
        assert_eq!(parse_clock("01:00:00"), Ok(3600));
    }

    proptest! {
        #[test]
        fn format_then_parse_recovers_seconds(s in 0u64..1_000_000) {
            let text = format_clock(s);
            let colons = text.matches(':').count();
            prop_assert_eq!(colons, if s < 3600 { 1 } else { 2 });
            prop_assert_eq!(parse_clock(&text), Ok(s));
        }
    }
}

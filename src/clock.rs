//! Lap and session time formatting.
//!
//! Times are displayed as `M:SS.mmm` where `M` is the total number of minutes, so a race
//! time of one and a half hours renders as `90:00.000`. Sub-millisecond precision is
//! truncated, not rounded.

use std::time::Duration;

use crate::errors::PitwallError;

/// Formats a duration as `M:SS.mmm`.
pub fn format_clock(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    let minutes = total_ms / 60_000;
    let seconds = (total_ms / 1_000) % 60;
    let millis = total_ms % 1_000;
    format!("{minutes}:{seconds:02}.{millis:03}")
}

/// Formats an optional duration, absent values become an empty string.
pub fn format_optional_clock(duration: Option<Duration>) -> String {
    duration.map(format_clock).unwrap_or_default()
}

/// Parses a clock string back into a duration.
///
/// Accepts `M:SS.mmm` as produced by [`format_clock`] as well as the upstream
/// `H:MM:SS.mmm` form. The fractional part may carry up to nine digits.
pub fn parse_clock(value: &str) -> Result<Duration, PitwallError> {
    let invalid = || PitwallError::InvalidClock {
        value: value.to_string(),
    };

    let parts: Vec<&str> = value.trim().split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [m, s] => (0, parse_whole(m).ok_or_else(invalid)?, *s),
        [h, m, s] => (
            parse_whole(h).ok_or_else(invalid)?,
            parse_whole(m).ok_or_else(invalid)?,
            *s,
        ),
        _ => return Err(invalid()),
    };

    let (whole_seconds, fraction) = seconds.split_once('.').unwrap_or((seconds, ""));
    let whole_seconds = parse_whole(whole_seconds).ok_or_else(invalid)?;
    if whole_seconds >= 60 || (parts.len() == 3 && minutes >= 60) {
        return Err(invalid());
    }
    if fraction.len() > 9 || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let nanos = if fraction.is_empty() {
        0
    } else {
        // right-pad to nanosecond precision
        format!("{fraction:0<9}").parse::<u32>().map_err(|_| invalid())?
    };

    let secs = hours
        .checked_mul(3_600)
        .and_then(|secs| secs.checked_add(minutes.checked_mul(60)?))
        .and_then(|secs| secs.checked_add(whole_seconds))
        .ok_or_else(invalid)?;
    Ok(Duration::new(secs, nanos))
}

fn parse_whole(value: &str) -> Option<u64> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

/// Serde adapter storing optional durations as fractional seconds, the way timing exports
/// carry them. Values are kept at microsecond precision.
pub mod option_seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<f64>::deserialize(deserializer)?
            .map(|secs| {
                if !secs.is_finite() || secs < 0. {
                    return Err(D::Error::custom(format!("invalid duration: {secs}")));
                }
                Ok(Duration::from_micros((secs * 1e6).round() as u64))
            })
            .transpose()
    }
}

//! Duration codec.
//!
//! The backend reports durations as `"<h>h<m>m<s>s"` text (e.g. `"1h23m4.500s"`),
//! while the engine works in seconds. This module converts between the two.
//!
//! [`format_hm`] drops sub-minute precision and [`format_hms`] keeps whole
//! seconds. Both truncate.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::error::DurationError;

static STRICT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)h(\d+)m(\d+(?:\.\d+)?)s$").expect("strict duration pattern is valid")
});

static LOOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)h)?(?:(\d+)m)?(?:(\d+(?:\.\d+)?)s)?$")
        .expect("loose duration pattern is valid")
});

/// Parse `<int>h<int>m<real>s` into seconds.
///
/// All three components are required.
pub fn parse(text: &str) -> Result<f64, DurationError> {
    let trimmed = text.trim();
    let caps = STRICT
        .captures(trimmed)
        .ok_or_else(|| DurationError::Malformed(text.to_string()))?;
    let hours = component(caps.get(1), text)?;
    let minutes = component(caps.get(2), text)?;
    let seconds = component(caps.get(3), text)?;
    Ok(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Parse any non-empty, ordered subset of the `h`, `m` and `s` components.
///
/// Session records drop leading zero components (`"23m4.5s"`, `"12.3s"`),
/// so aggregation over them uses this grammar instead of [`parse`].
pub fn parse_loose(text: &str) -> Result<f64, DurationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DurationError::Malformed(text.to_string()));
    }
    let caps = LOOSE
        .captures(trimmed)
        .ok_or_else(|| DurationError::Malformed(text.to_string()))?;
    let mut total = 0.0;
    for (index, scale) in [(1, 3600.0), (2, 60.0), (3, 1.0)] {
        if let Some(m) = caps.get(index) {
            total += component(Some(m), text)? * scale;
        }
    }
    Ok(total)
}

/// Parse with [`parse`], treating malformed text as zero.
///
/// The offending text is appended to `skipped` so callers can report it.
pub fn parse_or_zero(text: &str, skipped: &mut Vec<String>) -> f64 {
    match parse(text) {
        Ok(secs) => secs,
        Err(err) => {
            warn!(%err, "treating malformed duration as zero");
            skipped.push(text.to_string());
            0.0
        }
    }
}

/// `5425` -> `"1h30m"`.
pub fn format_hm(seconds: f64) -> String {
    let (h, m, _) = split(seconds);
    format!("{h}h{m}m")
}

/// `5425` -> `"1h30m25s"`.
pub fn format_hms(seconds: f64) -> String {
    let (h, m, s) = split(seconds);
    format!("{h}h{m}m{s}s")
}

/// `5425` -> `"01:30:25"`, the ticking timer display.
pub fn format_clock(seconds: f64) -> String {
    let (h, m, s) = split(seconds);
    format!("{h:02}:{m:02}:{s:02}")
}

/// `27000` -> `"7h 30min"`, used for sleep summaries.
pub fn format_human(seconds: f64) -> String {
    let (h, m, _) = split(seconds);
    format!("{h}h {m}min")
}

fn component(m: Option<regex::Match<'_>>, original: &str) -> Result<f64, DurationError> {
    m.and_then(|m| m.as_str().parse::<f64>().ok())
        .ok_or_else(|| DurationError::Malformed(original.to_string()))
}

/// Whole hours, minutes and seconds. Negative and non-finite input count as zero.
fn split(seconds: f64) -> (u64, u64, u64) {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.trunc() as u64
    } else {
        0
    };
    (total / 3600, (total % 3600) / 60, total % 60)
}

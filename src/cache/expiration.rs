//! Expiration Module
//!
//! Normalizes the ways a caller can say "when should this entry die" into a
//! single absolute naive-UTC timestamp, or `None` for "never".

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeDelta, TimeZone};

use crate::error::{Error, Result};

// == Expiration ==
/// A user-supplied expiration specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiration {
    /// The entry never expires
    #[default]
    Never,
    /// The entry expires this long after the write
    After(Duration),
    /// The entry expires at this absolute UTC instant
    At(NaiveDateTime),
}

impl Expiration {
    // == Resolve ==
    /// Resolves to an absolute instant against `now`.
    ///
    /// Callers pass one `now` sample per write so that every part of a session
    /// agrees on the boundary instant.
    pub fn resolve(&self, now: NaiveDateTime) -> Result<Option<NaiveDateTime>> {
        match self {
            Expiration::Never => Ok(None),
            Expiration::At(at) => Ok(Some(*at)),
            Expiration::After(after) => {
                let delta = TimeDelta::from_std(*after).map_err(|_| {
                    Error::InvalidExpirationKind(format!("duration out of range: {after:?}"))
                })?;
                now.checked_add_signed(delta).map(Some).ok_or_else(|| {
                    Error::InvalidExpirationKind(format!("{now} + {after:?} overflows"))
                })
            }
        }
    }

    /// Returns true if this is `Expiration::Never`.
    pub fn is_never(&self) -> bool {
        matches!(self, Expiration::Never)
    }
}

// == Conversions ==
impl From<Duration> for Expiration {
    fn from(after: Duration) -> Self {
        Expiration::After(after)
    }
}

impl From<NaiveDateTime> for Expiration {
    fn from(at: NaiveDateTime) -> Self {
        Expiration::At(at)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Expiration {
    fn from(at: DateTime<Tz>) -> Self {
        Expiration::At(at.naive_utc())
    }
}

impl<T: Into<Expiration>> From<Option<T>> for Expiration {
    fn from(spec: Option<T>) -> Self {
        spec.map(Into::into).unwrap_or_default()
    }
}

impl TryFrom<TimeDelta> for Expiration {
    type Error = Error;

    fn try_from(delta: TimeDelta) -> Result<Self> {
        delta
            .to_std()
            .map(Expiration::After)
            .map_err(|_| Error::InvalidExpirationKind(format!("negative duration: {delta}")))
    }
}

// == Parsing ==
impl FromStr for Expiration {
    type Err = Error;

    /// Accepts `never`, a duration (`30`, `30s`, `250ms`, `5m`, `2h`, `1d`),
    /// an RFC 3339 timestamp, or a naive `YYYY-MM-DDTHH:MM:SS[.f]` UTC timestamp.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s.eq_ignore_ascii_case("never") || s.eq_ignore_ascii_case("none") {
            return Ok(Expiration::Never);
        }

        if let Some(duration) = parse_duration(s)? {
            return Ok(Expiration::After(duration));
        }

        if let Ok(at) = DateTime::parse_from_rfc3339(s) {
            return Ok(at.into());
        }

        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(at) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(Expiration::At(at));
            }
        }

        Err(Error::InvalidExpirationKind(format!(
            "expected never, a duration or a timestamp, got {s:?}"
        )))
    }
}

/// Parses `<digits>[ms|s|m|h|d]`. Returns `Ok(None)` when `s` is not shaped
/// like a duration at all, so timestamp parsing can have a go.
fn parse_duration(s: &str) -> Result<Option<Duration>> {
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);

    if digits.is_empty() {
        if s.starts_with('-') {
            return Err(Error::InvalidExpirationKind(format!(
                "negative duration: {s}"
            )));
        }
        return Ok(None);
    }

    let multiplier_ms: u64 = match unit {
        "ms" => 1,
        "" | "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        _ => return Ok(None),
    };

    let amount: u64 = digits
        .parse()
        .map_err(|_| Error::InvalidExpirationKind(format!("duration out of range: {s}")))?;

    amount
        .checked_mul(multiplier_ms)
        .map(|ms| Some(Duration::from_millis(ms)))
        .ok_or_else(|| Error::InvalidExpirationKind(format!("duration out of range: {s}")))
}

impl fmt::Display for Expiration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expiration::Never => write!(f, "never"),
            Expiration::After(after) => write!(f, "after {after:?}"),
            Expiration::At(at) => write!(f, "at {}", at.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

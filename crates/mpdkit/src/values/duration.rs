use std::{fmt, sync::LazyLock};

use chrono::TimeDelta;
use regex::Regex;

use super::{MpdValue, Rational};

static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(-)?P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d*)?|\.\d+)S)?)?$",
    )
    .unwrap()
});

const SECONDS_PER_DAY: i128 = 86_400;

/// Longest accepted duration, about 292 billion years. Keeps nanosecond arithmetic on
/// durations inside `i128`.
const MAX_SECONDS: i128 = i64::MAX as i128;

/// An `xs:duration` value.
///
/// The parsed length is exact; the lexical form it was read from is kept so that
/// re-serialization reproduces `PT1M30S` rather than a normalized `PT90S`. Years count
/// as 365 days and months as 30 days, since an MPD duration is never anchored to a
/// calendar date.
#[derive(Debug, Clone)]
pub struct XsDuration {
    seconds: Rational,
    raw: Option<String>,
}

impl XsDuration {
    pub fn from_seconds(seconds: impl Into<Rational>) -> Self {
        Self {
            seconds: seconds.into(),
            raw: None,
        }
    }

    pub fn from_rational(seconds: Rational) -> Self {
        Self { seconds, raw: None }
    }

    pub fn seconds(&self) -> Rational {
        self.seconds
    }

    pub fn to_time_delta(&self) -> TimeDelta {
        self.seconds.to_time_delta()
    }

    pub fn parse(s: &str) -> Option<Self> {
        let caps = DURATION_REGEX.captures(s)?;
        // "P" and "PT" alone are not valid durations
        if (2..=7).all(|i| caps.get(i).is_none()) {
            return None;
        }
        if s.ends_with('T') {
            return None;
        }

        let int = |i: usize| -> Option<i128> {
            match caps.get(i) {
                Some(m) => m.as_str().parse().ok(),
                None => Some(0),
            }
        };
        let (second_part, fraction_part) = match caps.get(7) {
            Some(m) => m.as_str().split_once('.').unwrap_or((m.as_str(), "")),
            None => ("", ""),
        };
        let second_part: i128 = match second_part {
            "" => 0,
            digits => digits.parse().ok()?,
        };

        let days = int(2)?
            .checked_mul(365)?
            .checked_add(int(3)?.checked_mul(30)?)?
            .checked_add(int(4)?)?;
        let whole = days
            .checked_mul(SECONDS_PER_DAY)?
            .checked_add(int(5)?.checked_mul(3600)?)?
            .checked_add(int(6)?.checked_mul(60)?)?
            .checked_add(second_part)?;
        if whole > MAX_SECONDS {
            return None;
        }
        // the value keeps nanoseconds, the lexical form keeps every digit
        let fraction_part = &fraction_part[..fraction_part.len().min(9)];
        let fraction = match fraction_part {
            "" => Rational::ZERO,
            digits => Rational::new(digits.parse().ok()?, 10i128.pow(digits.len() as u32)),
        };

        let mut seconds = Rational::from_integer(whole) + fraction;
        if caps.get(1).is_some() {
            seconds = -seconds;
        }

        Some(Self {
            seconds,
            raw: Some(s.to_string()),
        })
    }

    /// Canonical `PT{h}H{m}M{s}S` rendering, ignoring the lexical form.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        if self.seconds.is_negative() {
            out.push('-');
        }
        out.push_str("PT");

        let total = self.seconds.abs();
        let whole = total.floor();
        let hours = whole / 3600;
        let minutes = whole % 3600 / 60;
        let seconds = total - Rational::from_integer(hours * 3600 + minutes * 60);

        if hours > 0 {
            out.push_str(&format!("{hours}H"));
        }
        if minutes > 0 {
            out.push_str(&format!("{minutes}M"));
        }
        if !seconds.is_zero() || (hours == 0 && minutes == 0) {
            out.push_str(&seconds.to_decimal_string(9));
            out.push('S');
        }
        out
    }
}

impl Default for XsDuration {
    fn default() -> Self {
        Self::from_rational(Rational::ZERO)
    }
}

impl PartialEq for XsDuration {
    fn eq(&self, other: &Self) -> bool {
        self.seconds == other.seconds
    }
}

impl Eq for XsDuration {}

impl PartialOrd for XsDuration {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for XsDuration {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.seconds.cmp(&other.seconds)
    }
}

impl fmt::Display for XsDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.raw {
            Some(raw) => f.write_str(raw),
            None => f.write_str(&self.canonical()),
        }
    }
}

impl MpdValue for XsDuration {
    const EXPECTED: &'static str = "xs:duration";

    fn parse_value(s: &str) -> Option<Self> {
        Self::parse(s)
    }

    fn format_value(&self) -> String {
        self.to_string()
    }
}

use std::fmt;

use super::{MpdValue, Rational};

/// An `xs:double` attribute such as `@availabilityTimeOffset` or `@maxPlayoutRate`.
///
/// `INF` is meaningful for `@availabilityTimeOffset`, so infinities are kept instead of
/// being rejected.
#[derive(Debug, Clone)]
pub struct Decimal {
    value: f64,
    raw: Option<String>,
}

impl Decimal {
    pub fn new(value: f64) -> Self {
        Self { value, raw: None }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_infinite(&self) -> bool {
        self.value.is_infinite()
    }

    /// The exact value, or `None` for infinities and NaN.
    pub fn to_rational(&self) -> Option<Rational> {
        if !self.value.is_finite() {
            return None;
        }
        self.raw
            .as_deref()
            .and_then(Rational::from_decimal_str)
            .or_else(|| Rational::from_decimal_str(&format!("{}", self.value)))
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value || (self.value.is_nan() && other.value.is_nan())
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(raw) = &self.raw {
            return f.write_str(raw);
        }
        if self.value.is_nan() {
            f.write_str("NaN")
        } else if self.value == f64::INFINITY {
            f.write_str("INF")
        } else if self.value == f64::NEG_INFINITY {
            f.write_str("-INF")
        } else {
            write!(f, "{}", self.value)
        }
    }
}

impl MpdValue for Decimal {
    const EXPECTED: &'static str = "xs:double";

    fn parse_value(s: &str) -> Option<Self> {
        let value = match s {
            "INF" | "+INF" => f64::INFINITY,
            "-INF" => f64::NEG_INFINITY,
            "NaN" => f64::NAN,
            // Rust would also accept "inf" and "infinity"
            _ if s.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') => {
                return None
            }
            _ => s.parse().ok()?,
        };
        Some(Self {
            value,
            raw: Some(s.to_string()),
        })
    }

    fn format_value(&self) -> String {
        self.to_string()
    }
}

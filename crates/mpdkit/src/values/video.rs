use std::fmt;

use super::{parse_integer, MpdValue, Rational};

/// An aspect ratio such as `@sar="1:1"` or `@par="16:9"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ratio {
    pub numerator: u64,
    pub denominator: u64,
}

impl Ratio {
    pub fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.numerator, self.denominator)
    }
}

impl MpdValue for Ratio {
    const EXPECTED: &'static str = "ratio (n:m)";

    fn parse_value(s: &str) -> Option<Self> {
        let (n, d) = s.split_once(':')?;
        Some(Self::new(parse_integer(n)?, parse_integer(d)?))
    }

    fn format_value(&self) -> String {
        self.to_string()
    }
}

/// `@frameRate`, either an integer or a `numerator/denominator` pair like `30000/1001`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRate {
    pub numerator: u64,
    pub denominator: Option<u64>,
}

impl FrameRate {
    pub fn new(numerator: u64, denominator: Option<u64>) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn to_rational(&self) -> Rational {
        Rational::new(
            self.numerator as i128,
            self.denominator.unwrap_or(1) as i128,
        )
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.denominator {
            Some(denominator) => write!(f, "{}/{}", self.numerator, denominator),
            None => write!(f, "{}", self.numerator),
        }
    }
}

impl MpdValue for FrameRate {
    const EXPECTED: &'static str = "frame rate";

    fn parse_value(s: &str) -> Option<Self> {
        match s.split_once('/') {
            Some((n, d)) => {
                let denominator: u64 = parse_integer(d)?;
                (denominator != 0).then_some(())?;
                Some(Self::new(parse_integer(n)?, Some(denominator)))
            }
            None => Some(Self::new(parse_integer(s)?, None)),
        }
    }

    fn format_value(&self) -> String {
        self.to_string()
    }
}

/// `@scanType`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VideoScan {
    Progressive,
    Interlaced,
    Unknown,
}

impl MpdValue for VideoScan {
    const EXPECTED: &'static str = "scan type (progressive, interlaced, unknown)";

    fn parse_value(s: &str) -> Option<Self> {
        match s {
            "progressive" => Some(Self::Progressive),
            "interlaced" => Some(Self::Interlaced),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    fn format_value(&self) -> String {
        match self {
            Self::Progressive => "progressive",
            Self::Interlaced => "interlaced",
            Self::Unknown => "unknown",
        }
        .to_string()
    }
}

use std::fmt;

use super::{parse_integer, MpdValue};

/// Stream access point type (ISO/IEC 14496-12 Annex I), `0` through `6`.
///
/// Type 0 means "no SAP guaranteed" when used in `@startWithSAP`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sap(u8);

impl Sap {
    pub const MAX: u8 = 6;

    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Types 1 to 3 allow decoding to start without any preceding data.
    pub fn is_clean_random_access(&self) -> bool {
        (1..=3).contains(&self.0)
    }
}

impl fmt::Display for Sap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl MpdValue for Sap {
    const EXPECTED: &'static str = "SAP type (0-6)";

    fn parse_value(s: &str) -> Option<Self> {
        Self::new(parse_integer(s)?)
    }

    fn format_value(&self) -> String {
        self.to_string()
    }
}

/// `ConditionalUintType`: either a boolean or an unsigned integer, as used by
/// `@segmentAlignment` and `@subsegmentAlignment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionalUint {
    Bool(bool),
    UInt(u64),
}

impl ConditionalUint {
    pub fn is_aligned(&self) -> bool {
        !matches!(self, Self::Bool(false))
    }
}

impl MpdValue for ConditionalUint {
    const EXPECTED: &'static str = "boolean or unsigned integer";

    fn parse_value(s: &str) -> Option<Self> {
        match s {
            "true" => Some(Self::Bool(true)),
            "false" => Some(Self::Bool(false)),
            _ => Some(Self::UInt(parse_integer(s)?)),
        }
    }

    fn format_value(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::UInt(u) => u.to_string(),
        }
    }
}

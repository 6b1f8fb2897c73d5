//! Leaf value types of the MPD schema.

use std::{fmt::Display, str::FromStr};

mod byte_range;
mod codecs;
mod datetime;
mod decimal;
mod duration;
mod leap_second;
mod rational;
mod sap;
mod uintv;
mod video;

pub use byte_range::ByteRange;
pub use codecs::{Codecs, ContentType};
pub use datetime::XsDateTime;
pub use decimal::Decimal;
pub use duration::XsDuration;
pub use leap_second::LeapSecondInformation;
pub use rational::Rational;
pub use sap::{ConditionalUint, Sap};
pub use uintv::{UIntVWithId, UIntVector};
pub use video::{FrameRate, Ratio, VideoScan};

/// A value that lives in an attribute (or text node) and has a lexical form.
pub trait MpdValue: Sized {
    /// Human readable name of the accepted lexical space, used in parse errors.
    const EXPECTED: &'static str;

    fn parse_value(s: &str) -> Option<Self>;

    fn format_value(&self) -> String;
}

impl MpdValue for String {
    const EXPECTED: &'static str = "string";

    fn parse_value(s: &str) -> Option<Self> {
        Some(s.to_string())
    }

    fn format_value(&self) -> String {
        self.clone()
    }
}

impl MpdValue for bool {
    const EXPECTED: &'static str = "boolean";

    fn parse_value(s: &str) -> Option<Self> {
        match s {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    fn format_value(&self) -> String {
        self.to_string()
    }
}

/// Parses an integer written in canonical form only. `0640`, `+5` and `-0` are
/// rejected because they could not be written back as they were read.
pub(crate) fn parse_integer<T: FromStr + Display>(s: &str) -> Option<T> {
    let value: T = s.parse().ok()?;
    (value.to_string() == s).then_some(value)
}

macro_rules! integer_value {
    ($($ty:ty => $expected:literal),* $(,)?) => {
        $(
            impl MpdValue for $ty {
                const EXPECTED: &'static str = $expected;

                fn parse_value(s: &str) -> Option<Self> {
                    parse_integer(s)
                }

                fn format_value(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

integer_value! {
    u8 => "unsigned byte",
    u32 => "unsigned int",
    u64 => "unsigned long",
    i64 => "long",
}

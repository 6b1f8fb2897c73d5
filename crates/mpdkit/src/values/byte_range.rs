use std::fmt;

use super::{parse_integer, MpdValue};

/// A contiguous byte range, as used by `@mediaRange`, `@indexRange` and `Initialization@range`.
/// Written as a single RFC 7233 byte-range-spec: `first-last`, or `first-` for an open end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub offset: u64,
    pub length: Option<u64>,
}

impl ByteRange {
    pub fn new(offset: u64, length: Option<u64>) -> Self {
        Self { offset, length }
    }

    pub fn last_byte(&self) -> Option<u64> {
        self.length.map(|length| self.offset + length - 1)
    }

    pub fn to_http_range(&self) -> String {
        format!("bytes={self}")
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.last_byte() {
            Some(last) => write!(f, "{}-{}", self.offset, last),
            None => write!(f, "{}-", self.offset),
        }
    }
}

impl MpdValue for ByteRange {
    const EXPECTED: &'static str = "byte range (first-last)";

    fn parse_value(s: &str) -> Option<Self> {
        let (start, end) = s.split_once('-')?;
        let first_byte_pos: u64 = parse_integer(start)?;
        let length = if end.is_empty() {
            None
        } else {
            let last_byte_pos: u64 = parse_integer(end)?;
            // 0-500 means 501 bytes
            Some(last_byte_pos.checked_sub(first_byte_pos)? + 1)
        };
        Some(Self::new(first_byte_pos, length))
    }

    fn format_value(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_http_range() {
        let range = ByteRange::new(10, Some(10));
        assert_eq!(range.to_http_range(), "bytes=10-19");

        let range = ByteRange::new(10, None);
        assert_eq!(range.to_http_range(), "bytes=10-");
    }

    #[test]
    fn test_parse() {
        assert_eq!(ByteRange::parse_value("0-500"), Some(ByteRange::new(0, Some(501))));
        assert_eq!(ByteRange::parse_value("862-"), Some(ByteRange::new(862, None)));
        assert_eq!(ByteRange::parse_value("10-5"), None);
        assert_eq!(ByteRange::parse_value("-500"), None);
    }
}

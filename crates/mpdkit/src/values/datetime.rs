use std::fmt;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use super::MpdValue;

/// An `xs:dateTime` instant.
///
/// Values without a timezone designator are read as UTC, which is what every
/// deployed packager means by them.
#[derive(Debug, Clone)]
pub struct XsDateTime {
    value: DateTime<Utc>,
    raw: Option<String>,
}

impl XsDateTime {
    pub fn new(value: DateTime<Utc>) -> Self {
        Self { value, raw: None }
    }

    pub fn value(&self) -> DateTime<Utc> {
        self.value
    }

    pub fn parse(s: &str) -> Option<Self> {
        let value = DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| {
                NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.and_utc())
            })
            .ok()?;

        Some(Self {
            value,
            raw: Some(s.to_string()),
        })
    }
}

impl From<DateTime<Utc>> for XsDateTime {
    fn from(value: DateTime<Utc>) -> Self {
        Self::new(value)
    }
}

impl PartialEq for XsDateTime {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for XsDateTime {}

impl PartialOrd for XsDateTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for XsDateTime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value.cmp(&other.value)
    }
}

impl fmt::Display for XsDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.raw {
            Some(raw) => f.write_str(raw),
            None => f.write_str(&self.value.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

impl MpdValue for XsDateTime {
    const EXPECTED: &'static str = "xs:dateTime";

    fn parse_value(s: &str) -> Option<Self> {
        Self::parse(s)
    }

    fn format_value(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_parse() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(XsDateTime::parse("2024-01-02T03:04:05Z").unwrap().value(), expected);
        assert_eq!(XsDateTime::parse("2024-01-02T03:04:05").unwrap().value(), expected);
        assert_eq!(
            XsDateTime::parse("2024-01-02T05:04:05+02:00").unwrap().value(),
            expected
        );
        assert!(XsDateTime::parse("yesterday").is_none());
    }

    #[test]
    fn test_format() {
        let raw = "2024-01-02T05:04:05+02:00";
        assert_eq!(XsDateTime::parse(raw).unwrap().to_string(), raw);

        let built = XsDateTime::new(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        assert_eq!(built.to_string(), "2024-01-02T03:04:05Z");
    }
}

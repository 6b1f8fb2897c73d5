use std::fmt;

use super::MpdValue;

/// An RFC 6381 `@codecs` list.
///
/// Entries are kept exactly as written, including any whitespace after the commas, so
/// that the attribute re-serializes byte for byte. [`Codecs::iter`] yields trimmed entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Codecs(Vec<String>);

impl Codecs {
    pub fn new<I, S>(codecs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(codecs.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|c| c.trim())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, codec: &str) -> bool {
        self.iter().any(|c| c == codec)
    }

    /// Four-character sample entry of every codec, e.g. `avc1` for `avc1.64001f`.
    pub fn sample_entries(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .map(|c| c.split_once('.').map(|(entry, _)| entry).unwrap_or(c))
    }
}

impl fmt::Display for Codecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

impl MpdValue for Codecs {
    const EXPECTED: &'static str = "codecs list";

    fn parse_value(s: &str) -> Option<Self> {
        if s.trim().is_empty() {
            return None;
        }
        Some(Self(s.split(',').map(String::from).collect()))
    }

    fn format_value(&self) -> String {
        self.to_string()
    }
}

/// Top-level type defined in [RFC6838](https://datatracker.ietf.org/doc/html/rfc6838#section-4.2)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentType {
    Text,
    Image,
    Audio,
    Video,
    Application,
    Font,
    Custom(String),
}

impl ContentType {
    pub fn from_string(input: &str) -> Self {
        match input {
            "text" => Self::Text,
            "image" => Self::Image,
            "audio" => Self::Audio,
            "video" => Self::Video,
            "application" => Self::Application,
            "font" => Self::Font,
            _ => Self::Custom(input.to_string()),
        }
    }

    /// Top-level type of a mime type such as `video/mp4; profiles="cmfc"`.
    pub fn from_mime_type(mime_type: &str) -> Self {
        Self::from_string(mime_type.split_once('/').map(|(t, _)| t).unwrap_or(mime_type))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Application => "application",
            Self::Font => "font",
            Self::Custom(custom) => custom,
        }
    }
}

impl MpdValue for ContentType {
    const EXPECTED: &'static str = "content type";

    fn parse_value(s: &str) -> Option<Self> {
        Some(Self::from_string(s))
    }

    fn format_value(&self) -> String {
        self.as_str().to_string()
    }
}

//! Extension points of the MPD: scheme-identified descriptors, event streams and labels.

use crate::{
    codec::{Node, NodeReader, NodeWriter},
    element::{Element, Extras},
    error::MpdResult,
    values::Rational,
    xlink::XLink,
};

pub const MP4_PROTECTION_SCHEME: &str = "urn:mpeg:dash:mp4protection:2011";
pub const ROLE_SCHEME: &str = "urn:mpeg:dash:role:2011";
pub const AUDIO_CHANNEL_CONFIGURATION_SCHEME: &str =
    "urn:mpeg:dash:23003:3:audio_channel_configuration:2011";

/// `DescriptorType`: a scheme URI, an optional value and an opaque payload.
///
/// Used for `ContentProtection`, `Role`, `EssentialProperty`, `UTCTiming` and every other
/// extension point. The recognized schemes are decoded on demand by [`Descriptor::interpret`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub scheme_id_uri: String,
    pub value: Option<String>,
    pub id: Option<String>,
    /// Scheme specific payload such as `cenc:pssh`.
    pub children: Vec<Element>,
    pub extras: Extras,
}

/// Known meaning of a [`Descriptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation<'a> {
    /// The common encryption signalling descriptor.
    Mp4Protection {
        scheme: Option<&'a str>,
        default_kid: Option<&'a str>,
    },
    /// A DRM system descriptor identified by its system id.
    DrmSystem {
        system_id: String,
        default_kid: Option<&'a str>,
        pssh: Option<&'a str>,
    },
    Role(&'a str),
    AudioChannels(u32),
    UtcTiming {
        method: UtcTimingMethod,
        value: Option<&'a str>,
    },
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtcTimingMethod {
    HttpXsDate,
    HttpIso,
    HttpNtp,
    HttpHead,
    Ntp,
    Sntp,
    Direct,
}

impl UtcTimingMethod {
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        Some(match scheme {
            "urn:mpeg:dash:utc:http-xsdate:2014" => Self::HttpXsDate,
            "urn:mpeg:dash:utc:http-iso:2014" => Self::HttpIso,
            "urn:mpeg:dash:utc:http-ntp:2014" => Self::HttpNtp,
            "urn:mpeg:dash:utc:http-head:2014" => Self::HttpHead,
            "urn:mpeg:dash:utc:ntp:2014" => Self::Ntp,
            "urn:mpeg:dash:utc:sntp:2014" => Self::Sntp,
            "urn:mpeg:dash:utc:direct:2014" => Self::Direct,
            _ => return None,
        })
    }
}

impl Descriptor {
    pub fn new(scheme_id_uri: impl Into<String>, value: Option<&str>) -> Self {
        Self {
            scheme_id_uri: scheme_id_uri.into(),
            value: value.map(String::from),
            id: None,
            children: Vec::new(),
            extras: Extras::default(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.extras.attributes.get(name).map(String::as_str)
    }

    pub fn default_kid(&self) -> Option<&str> {
        self.attribute("cenc:default_KID")
    }

    pub fn robustness(&self) -> Option<&str> {
        self.attribute("robustness")
    }

    fn payload(&self, name: &str) -> Option<&str> {
        self.children
            .iter()
            .find(|c| c.name == name || c.local_name() == name)
            .and_then(|c| c.text.as_deref())
            .map(str::trim)
    }

    pub fn interpret(&self) -> Interpretation<'_> {
        let scheme = self.scheme_id_uri.as_str();
        if scheme.eq_ignore_ascii_case(MP4_PROTECTION_SCHEME) {
            return Interpretation::Mp4Protection {
                scheme: self.value.as_deref(),
                default_kid: self.default_kid(),
            };
        }
        if let Some(uuid) = scheme
            .get(..9)
            .filter(|prefix| prefix.eq_ignore_ascii_case("urn:uuid:"))
            .map(|_| &scheme[9..])
        {
            return Interpretation::DrmSystem {
                system_id: uuid.to_ascii_lowercase(),
                default_kid: self.default_kid(),
                pssh: self.payload("pssh"),
            };
        }
        if scheme == ROLE_SCHEME {
            if let Some(value) = self.value.as_deref() {
                return Interpretation::Role(value);
            }
        }
        if scheme == AUDIO_CHANNEL_CONFIGURATION_SCHEME {
            if let Some(channels) = self.value.as_deref().and_then(|v| v.parse().ok()) {
                return Interpretation::AudioChannels(channels);
            }
        }
        if let Some(method) = UtcTimingMethod::from_scheme(scheme) {
            return Interpretation::UtcTiming {
                method,
                value: self.value.as_deref(),
            };
        }
        Interpretation::Other
    }
}

impl Node for Descriptor {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            scheme_id_uri: reader.req("schemeIdUri")?,
            value: reader.opt("value")?,
            id: reader.opt("id")?,
            children: reader.raw_children(),
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .req_attr("schemeIdUri", &self.scheme_id_uri)
            .attr("value", self.value.as_ref())
            .attr("id", self.id.as_ref())
            .elements(&self.children)
            .finish(&self.extras)
    }
}

/// `EventStream` (in a period) or `InbandEventStream` (in a representation, without events).
#[derive(Debug, Clone, PartialEq)]
pub struct EventStream {
    pub xlink: Option<XLink>,
    pub scheme_id_uri: String,
    pub value: Option<String>,
    pub timescale: Option<u64>,
    pub presentation_time_offset: Option<u64>,
    pub events: Vec<Event>,
    pub extras: Extras,
}

impl EventStream {
    pub fn new(scheme_id_uri: impl Into<String>) -> Self {
        Self {
            xlink: None,
            scheme_id_uri: scheme_id_uri.into(),
            value: None,
            timescale: None,
            presentation_time_offset: None,
            events: Vec::new(),
            extras: Extras::default(),
        }
    }

    pub fn timescale(&self) -> u64 {
        self.timescale.unwrap_or(1)
    }

    /// Start of `event` in seconds relative to the period start.
    pub fn event_start(&self, event: &Event) -> Rational {
        let pto = self.presentation_time_offset.unwrap_or(0) as i128;
        Rational::new(
            event.presentation_time.unwrap_or(0) as i128 - pto,
            self.timescale() as i128,
        )
    }

    pub fn event_duration(&self, event: &Event) -> Option<Rational> {
        event
            .duration
            .map(|d| Rational::new(d as i128, self.timescale() as i128))
    }
}

impl Node for EventStream {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        let xlink = XLink::read(&mut reader)?;
        // an unresolved remote element has no further required content
        let scheme_id_uri = match xlink {
            Some(_) => reader.opt("schemeIdUri")?.unwrap_or_default(),
            None => reader.req("schemeIdUri")?,
        };
        Ok(Self {
            xlink,
            scheme_id_uri,
            value: reader.opt("value")?,
            timescale: reader.opt("timescale")?,
            presentation_time_offset: reader.opt("presentationTimeOffset")?,
            events: reader.children("Event")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        let writer = XLink::write(self.xlink.as_ref(), NodeWriter::new(name));
        let writer = if self.xlink.is_some() && self.scheme_id_uri.is_empty() {
            writer
        } else {
            writer.req_attr("schemeIdUri", &self.scheme_id_uri)
        };
        writer
            .attr("value", self.value.as_ref())
            .attr("timescale", self.timescale.as_ref())
            .attr("presentationTimeOffset", self.presentation_time_offset.as_ref())
            .children("Event", &self.events)
            .finish(&self.extras)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub presentation_time: Option<u64>,
    pub duration: Option<u64>,
    pub id: Option<u64>,
    pub content_encoding: Option<String>,
    pub message_data: Option<String>,
    pub text: Option<String>,
    pub children: Vec<Element>,
    pub extras: Extras,
}

impl Node for Event {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            presentation_time: reader.opt("presentationTime")?,
            duration: reader.opt("duration")?,
            id: reader.opt("id")?,
            content_encoding: reader.opt("contentEncoding")?,
            message_data: reader.opt("messageData")?,
            text: reader.text(),
            children: reader.raw_children(),
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .attr("presentationTime", self.presentation_time.as_ref())
            .attr("duration", self.duration.as_ref())
            .attr("id", self.id.as_ref())
            .attr("contentEncoding", self.content_encoding.as_ref())
            .attr("messageData", self.message_data.as_ref())
            .text(self.text.as_deref())
            .elements(&self.children)
            .finish(&self.extras)
    }
}

/// `Label` / `GroupLabel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub id: Option<u64>,
    pub lang: Option<String>,
    pub text: String,
    pub extras: Extras,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            lang: None,
            text: text.into(),
            extras: Extras::default(),
        }
    }
}

impl Node for Label {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            id: reader.opt("id")?,
            lang: reader.opt("lang")?,
            text: reader.text().unwrap_or_default(),
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .attr("id", self.id.as_ref())
            .attr("lang", self.lang.as_ref())
            .text((!self.text.is_empty()).then_some(self.text.as_str()))
            .finish(&self.extras)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_protection() {
        let element = Element::new("ContentProtection")
            .with_attribute("schemeIdUri", "urn:mpeg:dash:mp4protection:2011")
            .with_attribute("value", "cenc")
            .with_attribute("cenc:default_KID", "10000000-1000-1000-1000-100000000001");
        let descriptor = Descriptor::decode(&element).unwrap();
        assert_eq!(
            descriptor.interpret(),
            Interpretation::Mp4Protection {
                scheme: Some("cenc"),
                default_kid: Some("10000000-1000-1000-1000-100000000001"),
            }
        );
        assert_eq!(descriptor.encode("ContentProtection"), element);
    }

    #[test]
    fn test_drm_system() {
        let element = Element::new("ContentProtection")
            .with_attribute(
                "schemeIdUri",
                "urn:uuid:EDEF8BA9-79D6-4ACE-A3C8-27DCD51D21ED",
            )
            .with_child(Element::new("cenc:pssh").with_text(" AAAANHBzc2g= "));
        let descriptor = Descriptor::decode(&element).unwrap();
        assert_eq!(
            descriptor.interpret(),
            Interpretation::DrmSystem {
                system_id: "edef8ba9-79d6-4ace-a3c8-27dcd51d21ed".to_string(),
                default_kid: None,
                pssh: Some("AAAANHBzc2g="),
            }
        );
        assert_eq!(descriptor.encode("ContentProtection"), element);
    }

    #[test]
    fn test_other_interpretations() {
        assert_eq!(
            Descriptor::new(ROLE_SCHEME, Some("main")).interpret(),
            Interpretation::Role("main")
        );
        assert_eq!(
            Descriptor::new(AUDIO_CHANNEL_CONFIGURATION_SCHEME, Some("2")).interpret(),
            Interpretation::AudioChannels(2)
        );
        assert_eq!(
            Descriptor::new("urn:mpeg:dash:utc:direct:2014", Some("2024-01-01T00:00:00Z"))
                .interpret(),
            Interpretation::UtcTiming {
                method: UtcTimingMethod::Direct,
                value: Some("2024-01-01T00:00:00Z"),
            }
        );
        assert_eq!(
            Descriptor::new("urn:example:custom", None).interpret(),
            Interpretation::Other
        );
    }

    #[test]
    fn test_missing_scheme() {
        assert!(Descriptor::decode(&Element::new("Role")).is_err());
    }

    #[test]
    fn test_event_timing() {
        let element = Element::new("EventStream")
            .with_attribute("schemeIdUri", "urn:scte:scte35:2013:xml")
            .with_attribute("timescale", "90000")
            .with_attribute("presentationTimeOffset", "90000")
            .with_child(
                Element::new("Event")
                    .with_attribute("presentationTime", "270000")
                    .with_attribute("duration", "45000")
                    .with_attribute("id", "1"),
            );
        let stream = EventStream::decode(&element).unwrap();
        let event = &stream.events[0];
        assert_eq!(stream.event_start(event), Rational::from_integer(2));
        assert_eq!(stream.event_duration(event), Some(Rational::new(1, 2)));
        assert_eq!(stream.encode("EventStream"), element);
    }
}

use crate::{
    codec::{Node, NodeReader, NodeWriter},
    descriptor::Descriptor,
    element::{Element, Extras},
    error::MpdResult,
    values::{Decimal, XsDuration},
};

/// A leaf element whose only content is text, such as `Title` or `Copyright`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextElement {
    pub text: String,
    pub extras: Extras,
}

impl Node for TextElement {
    fn decode(element: &Element) -> MpdResult<Self> {
        let reader = NodeReader::new(element);
        Ok(Self {
            text: reader.text().unwrap_or_default(),
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .text((!self.text.is_empty()).then_some(self.text.as_str()))
            .finish(&self.extras)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramInformation {
    pub lang: Option<String>,
    pub more_information_url: Option<String>,
    pub title: Option<TextElement>,
    pub source: Option<TextElement>,
    pub copyright: Option<TextElement>,
    pub extras: Extras,
}

impl Node for ProgramInformation {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            lang: reader.opt("lang")?,
            more_information_url: reader.opt("moreInformationURL")?,
            title: reader.child("Title")?,
            source: reader.child("Source")?,
            copyright: reader.child("Copyright")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .attr("lang", self.lang.as_ref())
            .attr("moreInformationURL", self.more_information_url.as_ref())
            .child("Title", self.title.as_ref())
            .child("Source", self.source.as_ref())
            .child("Copyright", self.copyright.as_ref())
            .finish(&self.extras)
    }
}

/// `Location` or `PatchLocation`: where to fetch the next version of the manifest (or a
/// patch for it) from.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub url: String,
    pub service_location: Option<String>,
    /// Only meaningful on `PatchLocation`.
    pub ttl: Option<Decimal>,
    pub extras: Extras,
}

impl Location {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            service_location: None,
            ttl: None,
            extras: Extras::default(),
        }
    }
}

impl Node for Location {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            url: reader.required_text()?,
            service_location: reader.opt("serviceLocation")?,
            ttl: reader.opt("ttl")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .attr("serviceLocation", self.service_location.as_ref())
            .attr("ttl", self.ttl.as_ref())
            .text(Some(&self.url))
            .finish(&self.extras)
    }
}

/// `ServiceDescription/Latency`, in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Latency {
    pub reference_id: Option<u64>,
    pub target: Option<u64>,
    pub max: Option<u64>,
    pub min: Option<u64>,
    pub extras: Extras,
}

impl Node for Latency {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            reference_id: reader.opt("referenceId")?,
            target: reader.opt("target")?,
            max: reader.opt("max")?,
            min: reader.opt("min")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .attr("referenceId", self.reference_id.as_ref())
            .attr("target", self.target.as_ref())
            .attr("max", self.max.as_ref())
            .attr("min", self.min.as_ref())
            .finish(&self.extras)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackRate {
    pub max: Option<Decimal>,
    pub min: Option<Decimal>,
    pub extras: Extras,
}

impl Node for PlaybackRate {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            max: reader.opt("max")?,
            min: reader.opt("min")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .attr("max", self.max.as_ref())
            .attr("min", self.min.as_ref())
            .finish(&self.extras)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceDescription {
    pub id: Option<u64>,
    pub scopes: Vec<Descriptor>,
    pub latencies: Vec<Latency>,
    pub playback_rates: Vec<PlaybackRate>,
    pub extras: Extras,
}

impl Node for ServiceDescription {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            id: reader.opt("id")?,
            scopes: reader.children("Scope")?,
            latencies: reader.children("Latency")?,
            playback_rates: reader.children("PlaybackRate")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .attr("id", self.id.as_ref())
            .children("Scope", &self.scopes)
            .children("Latency", &self.latencies)
            .children("PlaybackRate", &self.playback_rates)
            .finish(&self.extras)
    }
}

/// `Metrics/Range`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsRange {
    pub starttime: Option<XsDuration>,
    pub duration: Option<XsDuration>,
    pub extras: Extras,
}

impl Node for MetricsRange {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            starttime: reader.opt("starttime")?,
            duration: reader.opt("duration")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .attr("starttime", self.starttime.as_ref())
            .attr("duration", self.duration.as_ref())
            .finish(&self.extras)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    /// Whitespace separated metric keys.
    pub metrics: String,
    pub ranges: Vec<MetricsRange>,
    pub reportings: Vec<Descriptor>,
    pub extras: Extras,
}

impl Node for Metrics {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            metrics: reader.req("metrics")?,
            ranges: reader.children("Range")?,
            reportings: reader.children("Reporting")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .req_attr("metrics", &self.metrics)
            .children("Range", &self.ranges)
            .children("Reporting", &self.reportings)
            .finish(&self.extras)
    }
}

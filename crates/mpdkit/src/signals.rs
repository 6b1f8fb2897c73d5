//! Small signalling elements carried by the common attribute set: switching points,
//! random access points, producer reference times, popularity rates and resync points.

use crate::{
    codec::{Node, NodeReader, NodeWriter},
    descriptor::Descriptor,
    element::{Element, Extras},
    error::MpdResult,
    values::{Decimal, XsDuration},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Switching {
    pub interval: u64,
    /// `media` (default) or `bitstream`.
    pub switching_type: Option<String>,
    pub extras: Extras,
}

impl Node for Switching {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            interval: reader.req("interval")?,
            switching_type: reader.opt("type")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .req_attr("interval", &self.interval)
            .attr("type", self.switching_type.as_ref())
            .finish(&self.extras)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomAccess {
    pub interval: u64,
    /// `closed` (default), `open` or `gradual`.
    pub access_type: Option<String>,
    pub min_buffer_time: Option<XsDuration>,
    pub bandwidth: Option<u64>,
    pub extras: Extras,
}

impl Node for RandomAccess {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            interval: reader.req("interval")?,
            access_type: reader.opt("type")?,
            min_buffer_time: reader.opt("minBufferTime")?,
            bandwidth: reader.opt("bandwidth")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .req_attr("interval", &self.interval)
            .attr("type", self.access_type.as_ref())
            .attr("minBufferTime", self.min_buffer_time.as_ref())
            .attr("bandwidth", self.bandwidth.as_ref())
            .finish(&self.extras)
    }
}

/// Maps a media presentation time onto the wall clock time it was produced at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerReferenceTime {
    pub id: u64,
    pub inband: Option<bool>,
    /// `encoder` (default), `captured` or `application`.
    pub reference_type: Option<String>,
    pub application_scheme: Option<String>,
    pub wall_clock_time: String,
    pub presentation_time: u64,
    pub utc_timing: Option<Descriptor>,
    pub extras: Extras,
}

impl Node for ProducerReferenceTime {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            id: reader.req("id")?,
            inband: reader.opt("inband")?,
            reference_type: reader.opt("type")?,
            application_scheme: reader.opt("applicationScheme")?,
            wall_clock_time: reader.req("wallClockTime")?,
            presentation_time: reader.req("presentationTime")?,
            utc_timing: reader.child("UTCTiming")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .req_attr("id", &self.id)
            .attr("inband", self.inband.as_ref())
            .attr("type", self.reference_type.as_ref())
            .attr("applicationScheme", self.application_scheme.as_ref())
            .req_attr("wallClockTime", &self.wall_clock_time)
            .req_attr("presentationTime", &self.presentation_time)
            .child("UTCTiming", self.utc_timing.as_ref())
            .finish(&self.extras)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPopularityRate {
    pub source: String,
    pub source_description: Option<String>,
    pub rates: Vec<PopularityRate>,
    pub extras: Extras,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopularityRate {
    /// 1 to 100.
    pub popularity_rate: u8,
    pub start: Option<u64>,
    pub r: Option<i64>,
    pub extras: Extras,
}

impl Node for ContentPopularityRate {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            source: reader.req("source")?,
            source_description: reader.opt("source_description")?,
            rates: reader.children("PR")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .req_attr("source", &self.source)
            .attr("source_description", self.source_description.as_ref())
            .children("PR", &self.rates)
            .finish(&self.extras)
    }
}

impl Node for PopularityRate {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            popularity_rate: reader.req("popularityRate")?,
            start: reader.opt("start")?,
            r: reader.opt("r")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .req_attr("popularityRate", &self.popularity_rate)
            .attr("start", self.start.as_ref())
            .attr("r", self.r.as_ref())
            .finish(&self.extras)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resync {
    pub resync_type: Option<u8>,
    pub dt: Option<u64>,
    pub di_max: Option<Decimal>,
    pub di_min: Option<Decimal>,
    pub marker: Option<bool>,
    pub extras: Extras,
}

impl Node for Resync {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            resync_type: reader.opt("type")?,
            dt: reader.opt("dT")?,
            di_max: reader.opt("dImax")?,
            di_min: reader.opt("dImin")?,
            marker: reader.opt("marker")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .attr("type", self.resync_type.as_ref())
            .attr("dT", self.dt.as_ref())
            .attr("dImax", self.di_max.as_ref())
            .attr("dImin", self.di_min.as_ref())
            .attr("marker", self.marker.as_ref())
            .finish(&self.extras)
    }
}

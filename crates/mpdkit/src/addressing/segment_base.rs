use crate::{
    codec::{Node, NodeReader, NodeWriter},
    element::{Element, Extras},
    error::MpdResult,
    values::{ByteRange, Decimal, Rational, XsDuration},
};

use super::timeline::SegmentTimeline;

/// `URLType`, used by `Initialization`, `RepresentationIndex` and `BitstreamSwitching`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceUrl {
    pub source_url: Option<String>,
    pub range: Option<ByteRange>,
    pub extras: Extras,
}

impl Node for SourceUrl {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            source_url: reader.opt("sourceURL")?,
            range: reader.opt("range")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .attr("sourceURL", self.source_url.as_ref())
            .attr("range", self.range.as_ref())
            .finish(&self.extras)
    }
}

/// `FailoverContent`: time ranges for which the segments carry no media.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailoverContent {
    pub valid: Option<bool>,
    pub entries: Vec<Fcs>,
    pub extras: Extras,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fcs {
    pub t: u64,
    pub d: Option<u64>,
    pub extras: Extras,
}

impl Node for FailoverContent {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            valid: reader.opt("valid")?,
            entries: reader.children("FCS")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .attr("valid", self.valid.as_ref())
            .children("FCS", &self.entries)
            .finish(&self.extras)
    }
}

impl Node for Fcs {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            t: reader.req("t")?,
            d: reader.opt("d")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .req_attr("t", &self.t)
            .attr("d", self.d.as_ref())
            .finish(&self.extras)
    }
}

/// `SegmentBase`: addressing of a representation stored as a single indexed file, and the
/// timing attributes every other addressing element extends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentBase {
    pub timescale: Option<u64>,
    pub presentation_time_offset: Option<u64>,
    pub ept_delta: Option<i64>,
    pub pd_delta: Option<i64>,
    pub presentation_duration: Option<u64>,
    pub time_shift_buffer_depth: Option<XsDuration>,
    pub index_range: Option<ByteRange>,
    pub index_range_exact: Option<bool>,
    pub availability_time_offset: Option<Decimal>,
    pub availability_time_complete: Option<bool>,

    pub initialization: Option<SourceUrl>,
    pub representation_index: Option<SourceUrl>,
    pub failover_content: Option<FailoverContent>,
    pub extras: Extras,
}

impl SegmentBase {
    pub fn timescale(&self) -> u64 {
        self.timescale.unwrap_or(1)
    }

    pub fn presentation_time_offset(&self) -> u64 {
        self.presentation_time_offset.unwrap_or(0)
    }

    /// Converts a duration in timescale units into seconds.
    pub fn to_seconds(&self, value: i128) -> Rational {
        Rational::new(value, self.timescale().max(1) as i128)
    }

    /// Fills every field left undeclared from the same kind of element at an outer scope.
    pub fn inherit(&mut self, outer: &SegmentBase) {
        macro_rules! inherit {
            ($($field:ident),*) => {
                $(
                    if self.$field.is_none() {
                        self.$field = outer.$field.clone();
                    }
                )*
            };
        }
        inherit!(
            timescale,
            presentation_time_offset,
            ept_delta,
            pd_delta,
            presentation_duration,
            time_shift_buffer_depth,
            index_range,
            index_range_exact,
            availability_time_offset,
            availability_time_complete,
            initialization,
            representation_index,
            failover_content
        );
    }

    pub(crate) fn read(reader: &mut NodeReader) -> MpdResult<Self> {
        Ok(Self {
            timescale: reader.opt("timescale")?,
            presentation_time_offset: reader.opt("presentationTimeOffset")?,
            ept_delta: reader.opt("eptDelta")?,
            pd_delta: reader.opt("pdDelta")?,
            presentation_duration: reader.opt("presentationDuration")?,
            time_shift_buffer_depth: reader.opt("timeShiftBufferDepth")?,
            index_range: reader.opt("indexRange")?,
            index_range_exact: reader.opt("indexRangeExact")?,
            availability_time_offset: reader.opt("availabilityTimeOffset")?,
            availability_time_complete: reader.opt("availabilityTimeComplete")?,
            initialization: reader.child("Initialization")?,
            representation_index: reader.child("RepresentationIndex")?,
            failover_content: reader.child("FailoverContent")?,
            extras: Extras::default(),
        })
    }

    pub(crate) fn write(&self, writer: NodeWriter) -> NodeWriter {
        writer
            .attr("timescale", self.timescale.as_ref())
            .attr("presentationTimeOffset", self.presentation_time_offset.as_ref())
            .attr("eptDelta", self.ept_delta.as_ref())
            .attr("pdDelta", self.pd_delta.as_ref())
            .attr("presentationDuration", self.presentation_duration.as_ref())
            .attr("timeShiftBufferDepth", self.time_shift_buffer_depth.as_ref())
            .attr("indexRange", self.index_range.as_ref())
            .attr("indexRangeExact", self.index_range_exact.as_ref())
            .attr("availabilityTimeOffset", self.availability_time_offset.as_ref())
            .attr(
                "availabilityTimeComplete",
                self.availability_time_complete.as_ref(),
            )
            .child("Initialization", self.initialization.as_ref())
            .child("RepresentationIndex", self.representation_index.as_ref())
            .child("FailoverContent", self.failover_content.as_ref())
    }
}

impl Node for SegmentBase {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        let mut base = Self::read(&mut reader)?;
        base.extras = reader.finish();
        Ok(base)
    }

    fn encode(&self, name: &str) -> Element {
        self.write(NodeWriter::new(name)).finish(&self.extras)
    }
}

/// `MultipleSegmentBaseType`, shared by `SegmentList` and `SegmentTemplate`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipleSegmentBase {
    pub base: SegmentBase,
    /// Constant segment duration in timescale units.
    pub duration: Option<u64>,
    pub start_number: Option<u64>,
    pub end_number: Option<u64>,
    pub segment_timeline: Option<SegmentTimeline>,
    pub bitstream_switching: Option<SourceUrl>,
}

impl MultipleSegmentBase {
    pub fn start_number(&self) -> u64 {
        self.start_number.unwrap_or(1)
    }

    pub fn inherit(&mut self, outer: &MultipleSegmentBase) {
        self.base.inherit(&outer.base);
        if self.duration.is_none() {
            self.duration = outer.duration;
        }
        if self.start_number.is_none() {
            self.start_number = outer.start_number;
        }
        if self.end_number.is_none() {
            self.end_number = outer.end_number;
        }
        if self.segment_timeline.is_none() {
            self.segment_timeline = outer.segment_timeline.clone();
        }
        if self.bitstream_switching.is_none() {
            self.bitstream_switching = outer.bitstream_switching.clone();
        }
    }

    pub(crate) fn read(reader: &mut NodeReader) -> MpdResult<Self> {
        Ok(Self {
            base: SegmentBase::read(reader)?,
            duration: reader.opt("duration")?,
            start_number: reader.opt("startNumber")?,
            end_number: reader.opt("endNumber")?,
            segment_timeline: reader.child("SegmentTimeline")?,
            bitstream_switching: reader.child("BitstreamSwitching")?,
        })
    }

    pub(crate) fn write(&self, writer: NodeWriter) -> NodeWriter {
        self.base
            .write(writer)
            .attr("duration", self.duration.as_ref())
            .attr("startNumber", self.start_number.as_ref())
            .attr("endNumber", self.end_number.as_ref())
            .child("SegmentTimeline", self.segment_timeline.as_ref())
            .child("BitstreamSwitching", self.bitstream_switching.as_ref())
    }
}

use crate::{
    codec::{Node, NodeReader, NodeWriter},
    element::{Element, Extras},
    error::MpdResult,
    values::ByteRange,
};

use super::segment_base::MultipleSegmentBase;

/// `SegmentURL`: one explicitly listed media segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentUrl {
    pub media: Option<String>,
    pub media_range: Option<ByteRange>,
    pub index: Option<String>,
    pub index_range: Option<ByteRange>,
    pub extras: Extras,
}

impl SegmentUrl {
    pub fn new(media: impl Into<String>) -> Self {
        Self {
            media: Some(media.into()),
            ..Default::default()
        }
    }
}

impl Node for SegmentUrl {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            media: reader.opt("media")?,
            media_range: reader.opt("mediaRange")?,
            index: reader.opt("index")?,
            index_range: reader.opt("indexRange")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .attr("media", self.media.as_ref())
            .attr("mediaRange", self.media_range.as_ref())
            .attr("index", self.index.as_ref())
            .attr("indexRange", self.index_range.as_ref())
            .finish(&self.extras)
    }
}

/// `SegmentList`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentList {
    pub multiple: MultipleSegmentBase,
    pub segment_urls: Vec<SegmentUrl>,
    pub extras: Extras,
}

impl SegmentList {
    /// Takes the segment information of an outer list when none is declared here.
    pub fn inherit(&mut self, outer: &SegmentList) {
        self.multiple.inherit(&outer.multiple);
        if self.segment_urls.is_empty() {
            self.segment_urls = outer.segment_urls.clone();
        }
    }
}

impl Node for SegmentList {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            multiple: MultipleSegmentBase::read(&mut reader)?,
            segment_urls: reader.children("SegmentURL")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        self.multiple
            .write(NodeWriter::new(name))
            .children("SegmentURL", &self.segment_urls)
            .finish(&self.extras)
    }
}

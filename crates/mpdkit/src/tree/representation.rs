use crate::{
    addressing::SegmentAddressing,
    base::CommonAttributes,
    codec::{Node, NodeReader, NodeWriter},
    element::{Element, Extras},
    error::MpdResult,
    url::BaseUrl,
    values::{UIntVector, XsDuration},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Representation {
    pub common: CommonAttributes,
    pub id: String,
    pub bandwidth: u64,
    pub quality_ranking: Option<u32>,
    /// Whitespace separated ids of the representations this one depends on.
    pub dependency_id: Option<String>,
    pub association_id: Option<String>,
    pub association_type: Option<String>,
    pub media_stream_structure_id: Option<String>,

    pub base_urls: Vec<BaseUrl>,
    pub extended_bandwidths: Vec<ExtendedBandwidth>,
    pub sub_representations: Vec<SubRepresentation>,
    pub addressing: SegmentAddressing,
    pub extras: Extras,
}

impl Representation {
    pub fn new(id: impl Into<String>, bandwidth: u64) -> Self {
        Self {
            id: id.into(),
            bandwidth,
            ..Default::default()
        }
    }

    pub fn dependency_ids(&self) -> impl Iterator<Item = &str> {
        self.dependency_id
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
    }
}

impl Node for Representation {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            common: CommonAttributes::read(&mut reader)?,
            id: reader.req("id")?,
            bandwidth: reader.req("bandwidth")?,
            quality_ranking: reader.opt("qualityRanking")?,
            dependency_id: reader.opt("dependencyId")?,
            association_id: reader.opt("associationId")?,
            association_type: reader.opt("associationType")?,
            media_stream_structure_id: reader.opt("mediaStreamStructureId")?,
            base_urls: reader.children("BaseURL")?,
            extended_bandwidths: reader.children("ExtendedBandwidth")?,
            sub_representations: reader.children("SubRepresentation")?,
            addressing: SegmentAddressing::read(&mut reader)?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        let writer = NodeWriter::new(name)
            .req_attr("id", &self.id)
            .req_attr("bandwidth", &self.bandwidth)
            .attr("qualityRanking", self.quality_ranking.as_ref())
            .attr("dependencyId", self.dependency_id.as_ref())
            .attr("associationId", self.association_id.as_ref())
            .attr("associationType", self.association_type.as_ref())
            .attr("mediaStreamStructureId", self.media_stream_structure_id.as_ref());
        let writer = self
            .common
            .write(writer)
            .children("BaseURL", &self.base_urls)
            .children("ExtendedBandwidth", &self.extended_bandwidths)
            .children("SubRepresentation", &self.sub_representations);
        self.addressing.write(writer).finish(&self.extras)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubRepresentation {
    pub common: CommonAttributes,
    pub level: Option<u32>,
    pub dependency_level: Option<UIntVector>,
    pub bandwidth: Option<u64>,
    /// Whitespace separated `ContentComponent` ids.
    pub content_component: Option<String>,
    pub extras: Extras,
}

impl Node for SubRepresentation {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            common: CommonAttributes::read(&mut reader)?,
            level: reader.opt("level")?,
            dependency_level: reader.opt("dependencyLevel")?,
            bandwidth: reader.opt("bandwidth")?,
            content_component: reader.opt("contentComponent")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        let writer = NodeWriter::new(name)
            .attr("level", self.level.as_ref())
            .attr("dependencyLevel", self.dependency_level.as_ref())
            .attr("bandwidth", self.bandwidth.as_ref())
            .attr("contentComponent", self.content_component.as_ref());
        self.common.write(writer).finish(&self.extras)
    }
}

/// `ExtendedBandwidth`: bandwidth of a variable bitrate representation as a set of
/// (buffer time, bandwidth) pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendedBandwidth {
    pub vbr: Option<bool>,
    pub model_pairs: Vec<ModelPair>,
    pub extras: Extras,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelPair {
    pub buffer_time: XsDuration,
    pub bandwidth: u64,
    pub extras: Extras,
}

impl ExtendedBandwidth {
    /// The smallest bandwidth whose buffer time fits in `buffer_time`.
    pub fn bandwidth_for(&self, buffer_time: &XsDuration) -> Option<u64> {
        self.model_pairs
            .iter()
            .filter(|pair| pair.buffer_time <= *buffer_time)
            .map(|pair| pair.bandwidth)
            .min()
    }
}

impl Node for ExtendedBandwidth {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            vbr: reader.opt("vbr")?,
            model_pairs: reader.children("ModelPair")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .attr("vbr", self.vbr.as_ref())
            .children("ModelPair", &self.model_pairs)
            .finish(&self.extras)
    }
}

impl Node for ModelPair {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            buffer_time: reader.req("bufferTime")?,
            bandwidth: reader.req("bandwidth")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .req_attr("bufferTime", &self.buffer_time)
            .req_attr("bandwidth", &self.bandwidth)
            .finish(&self.extras)
    }
}

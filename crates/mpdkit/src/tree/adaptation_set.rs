use crate::{
    addressing::SegmentAddressing,
    base::CommonAttributes,
    codec::{Node, NodeReader, NodeWriter},
    descriptor::Descriptor,
    element::{Element, Extras},
    error::MpdResult,
    url::BaseUrl,
    values::{ConditionalUint, ContentType, FrameRate, Ratio, UIntVector},
    xlink::XLink,
};

use super::{groups::ContentComponent, representation::Representation};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdaptationSet {
    pub xlink: Option<XLink>,
    pub common: CommonAttributes,
    pub id: Option<u64>,
    pub group: Option<u32>,
    pub lang: Option<String>,
    pub content_type: Option<ContentType>,
    pub par: Option<Ratio>,
    pub min_bandwidth: Option<u64>,
    pub max_bandwidth: Option<u64>,
    pub min_width: Option<u64>,
    pub max_width: Option<u64>,
    pub min_height: Option<u64>,
    pub max_height: Option<u64>,
    pub min_frame_rate: Option<FrameRate>,
    pub max_frame_rate: Option<FrameRate>,
    pub segment_alignment: Option<ConditionalUint>,
    pub subsegment_alignment: Option<ConditionalUint>,
    pub subsegment_starts_with_sap: Option<u8>,
    pub bitstream_switching: Option<bool>,
    pub initialization_set_ref: Option<UIntVector>,
    pub initialization_principal: Option<String>,

    pub accessibilities: Vec<Descriptor>,
    pub roles: Vec<Descriptor>,
    pub ratings: Vec<Descriptor>,
    pub viewpoints: Vec<Descriptor>,
    pub content_components: Vec<ContentComponent>,
    pub base_urls: Vec<BaseUrl>,
    pub addressing: SegmentAddressing,
    pub representations: Vec<Representation>,
    pub extras: Extras,
}

impl AdaptationSet {
    pub fn representation_by_id(&self, id: &str) -> Option<&Representation> {
        self.representations.iter().find(|r| r.id == id)
    }

    /// `@contentType`, falling back to the top-level type of `@mimeType`.
    pub fn content_type(&self) -> Option<ContentType> {
        self.content_type.clone().or_else(|| {
            self.common
                .mime_type
                .as_deref()
                .map(ContentType::from_mime_type)
        })
    }

    pub fn is_placeholder(&self) -> bool {
        self.xlink.as_ref().is_some_and(XLink::is_pending)
    }
}

impl Node for AdaptationSet {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            xlink: XLink::read(&mut reader)?,
            common: CommonAttributes::read(&mut reader)?,
            id: reader.opt("id")?,
            group: reader.opt("group")?,
            lang: reader.opt("lang")?,
            content_type: reader.opt("contentType")?,
            par: reader.opt("par")?,
            min_bandwidth: reader.opt("minBandwidth")?,
            max_bandwidth: reader.opt("maxBandwidth")?,
            min_width: reader.opt("minWidth")?,
            max_width: reader.opt("maxWidth")?,
            min_height: reader.opt("minHeight")?,
            max_height: reader.opt("maxHeight")?,
            min_frame_rate: reader.opt("minFrameRate")?,
            max_frame_rate: reader.opt("maxFrameRate")?,
            segment_alignment: reader.opt("segmentAlignment")?,
            subsegment_alignment: reader.opt("subsegmentAlignment")?,
            subsegment_starts_with_sap: reader.opt("subsegmentStartsWithSAP")?,
            bitstream_switching: reader.opt("bitstreamSwitching")?,
            initialization_set_ref: reader.opt("initializationSetRef")?,
            initialization_principal: reader.opt("initializationPrincipal")?,
            accessibilities: reader.children("Accessibility")?,
            roles: reader.children("Role")?,
            ratings: reader.children("Rating")?,
            viewpoints: reader.children("Viewpoint")?,
            content_components: reader.children("ContentComponent")?,
            base_urls: reader.children("BaseURL")?,
            addressing: SegmentAddressing::read(&mut reader)?,
            representations: reader.children("Representation")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        let writer = XLink::write(self.xlink.as_ref(), NodeWriter::new(name))
            .attr("id", self.id.as_ref())
            .attr("group", self.group.as_ref())
            .attr("lang", self.lang.as_ref())
            .attr("contentType", self.content_type.as_ref())
            .attr("par", self.par.as_ref())
            .attr("minBandwidth", self.min_bandwidth.as_ref())
            .attr("maxBandwidth", self.max_bandwidth.as_ref())
            .attr("minWidth", self.min_width.as_ref())
            .attr("maxWidth", self.max_width.as_ref())
            .attr("minHeight", self.min_height.as_ref())
            .attr("maxHeight", self.max_height.as_ref())
            .attr("minFrameRate", self.min_frame_rate.as_ref())
            .attr("maxFrameRate", self.max_frame_rate.as_ref())
            .attr("segmentAlignment", self.segment_alignment.as_ref())
            .attr("subsegmentAlignment", self.subsegment_alignment.as_ref())
            .attr("subsegmentStartsWithSAP", self.subsegment_starts_with_sap.as_ref())
            .attr("bitstreamSwitching", self.bitstream_switching.as_ref())
            .attr("initializationSetRef", self.initialization_set_ref.as_ref())
            .attr("initializationPrincipal", self.initialization_principal.as_ref());
        let writer = self
            .common
            .write(writer)
            .children("Accessibility", &self.accessibilities)
            .children("Role", &self.roles)
            .children("Rating", &self.ratings)
            .children("Viewpoint", &self.viewpoints)
            .children("ContentComponent", &self.content_components)
            .children("BaseURL", &self.base_urls);
        self.addressing
            .write(writer)
            .children("Representation", &self.representations)
            .finish(&self.extras)
    }
}

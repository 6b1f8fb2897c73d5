use crate::{
    addressing::SegmentAddressing,
    codec::{Node, NodeReader, NodeWriter},
    descriptor::{Descriptor, EventStream, Label},
    element::{Element, Extras},
    error::MpdResult,
    url::BaseUrl,
    values::XsDuration,
    xlink::XLink,
};

use super::{
    adaptation_set::AdaptationSet,
    groups::{Preselection, Subset},
    program::ServiceDescription,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Period {
    pub xlink: Option<XLink>,
    pub id: Option<String>,
    pub start: Option<XsDuration>,
    pub duration: Option<XsDuration>,
    pub bitstream_switching: Option<bool>,

    pub base_urls: Vec<BaseUrl>,
    pub addressing: SegmentAddressing,
    pub asset_identifier: Option<Descriptor>,
    pub event_streams: Vec<EventStream>,
    pub service_descriptions: Vec<ServiceDescription>,
    pub content_protections: Vec<Descriptor>,
    pub adaptation_sets: Vec<AdaptationSet>,
    pub subsets: Vec<Subset>,
    pub supplemental_properties: Vec<Descriptor>,
    pub group_labels: Vec<Label>,
    pub preselections: Vec<Preselection>,
    pub extras: Extras,
}

impl Period {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn adaptation_set_by_id(&self, id: u64) -> Option<&AdaptationSet> {
        self.adaptation_sets.iter().find(|a| a.id == Some(id))
    }

    /// Whether this period is an unresolved remote element.
    pub fn is_placeholder(&self) -> bool {
        self.xlink.as_ref().is_some_and(XLink::is_pending)
    }
}

impl Node for Period {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            xlink: XLink::read(&mut reader)?,
            id: reader.opt("id")?,
            start: reader.opt("start")?,
            duration: reader.opt("duration")?,
            bitstream_switching: reader.opt("bitstreamSwitching")?,
            base_urls: reader.children("BaseURL")?,
            addressing: SegmentAddressing::read(&mut reader)?,
            asset_identifier: reader.child("AssetIdentifier")?,
            event_streams: reader.children("EventStream")?,
            service_descriptions: reader.children("ServiceDescription")?,
            content_protections: reader.children("ContentProtection")?,
            adaptation_sets: reader.children("AdaptationSet")?,
            subsets: reader.children("Subset")?,
            supplemental_properties: reader.children("SupplementalProperty")?,
            group_labels: reader.children("GroupLabel")?,
            preselections: reader.children("Preselection")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        let writer = XLink::write(self.xlink.as_ref(), NodeWriter::new(name))
            .attr("id", self.id.as_ref())
            .attr("start", self.start.as_ref())
            .attr("duration", self.duration.as_ref())
            .attr("bitstreamSwitching", self.bitstream_switching.as_ref())
            .children("BaseURL", &self.base_urls);
        self.addressing
            .write(writer)
            .child("AssetIdentifier", self.asset_identifier.as_ref())
            .children("EventStream", &self.event_streams)
            .children("ServiceDescription", &self.service_descriptions)
            .children("ContentProtection", &self.content_protections)
            .children("AdaptationSet", &self.adaptation_sets)
            .children("Subset", &self.subsets)
            .children("SupplementalProperty", &self.supplemental_properties)
            .children("GroupLabel", &self.group_labels)
            .children("Preselection", &self.preselections)
            .finish(&self.extras)
    }
}

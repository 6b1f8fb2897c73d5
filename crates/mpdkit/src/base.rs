//! The common attributes and elements shared by `AdaptationSet`, `Representation`,
//! `SubRepresentation`, `Preselection` and `InitializationSet` (`RepresentationBaseType`),
//! and the override chain that resolves them.

use crate::{
    codec::{NodeReader, NodeWriter},
    descriptor::{Descriptor, EventStream, Label},
    error::MpdResult,
    signals::{ContentPopularityRate, ProducerReferenceTime, RandomAccess, Resync, Switching},
    values::{Codecs, Decimal, FrameRate, Ratio, Sap, UIntVector, VideoScan},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonAttributes {
    pub profiles: Option<String>,
    pub width: Option<u64>,
    pub height: Option<u64>,
    pub sar: Option<Ratio>,
    pub frame_rate: Option<FrameRate>,
    /// One value, or a `min max` pair.
    pub audio_sampling_rate: Option<UIntVector>,
    pub mime_type: Option<String>,
    pub segment_profiles: Option<String>,
    pub codecs: Option<Codecs>,
    pub container_profiles: Option<String>,
    pub maximum_sap_period: Option<Decimal>,
    pub start_with_sap: Option<Sap>,
    pub max_playout_rate: Option<Decimal>,
    pub coding_dependency: Option<bool>,
    pub scan_type: Option<VideoScan>,
    pub selection_priority: Option<u32>,
    pub tag: Option<String>,

    pub frame_packings: Vec<Descriptor>,
    pub audio_channel_configurations: Vec<Descriptor>,
    pub content_protections: Vec<Descriptor>,
    pub output_protections: Vec<Descriptor>,
    pub essential_properties: Vec<Descriptor>,
    pub supplemental_properties: Vec<Descriptor>,
    pub inband_event_streams: Vec<EventStream>,
    pub switchings: Vec<Switching>,
    pub random_accesses: Vec<RandomAccess>,
    pub group_labels: Vec<Label>,
    pub labels: Vec<Label>,
    pub producer_reference_times: Vec<ProducerReferenceTime>,
    pub content_popularity_rates: Vec<ContentPopularityRate>,
    pub resyncs: Vec<Resync>,
}

/// Every attribute and element of [`CommonAttributes`], addressable for override resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Profiles,
    Width,
    Height,
    Sar,
    FrameRate,
    AudioSamplingRate,
    MimeType,
    SegmentProfiles,
    Codecs,
    ContainerProfiles,
    MaximumSapPeriod,
    StartWithSap,
    MaxPlayoutRate,
    CodingDependency,
    ScanType,
    SelectionPriority,
    Tag,
    FramePacking,
    AudioChannelConfiguration,
    ContentProtection,
    OutputProtection,
    EssentialProperty,
    SupplementalProperty,
    InbandEventStream,
    Switching,
    RandomAccess,
    GroupLabel,
    Label,
    ProducerReferenceTime,
    ContentPopularityRate,
    Resync,
}

impl Attribute {
    pub const ALL: [Attribute; 31] = [
        Self::Profiles,
        Self::Width,
        Self::Height,
        Self::Sar,
        Self::FrameRate,
        Self::AudioSamplingRate,
        Self::MimeType,
        Self::SegmentProfiles,
        Self::Codecs,
        Self::ContainerProfiles,
        Self::MaximumSapPeriod,
        Self::StartWithSap,
        Self::MaxPlayoutRate,
        Self::CodingDependency,
        Self::ScanType,
        Self::SelectionPriority,
        Self::Tag,
        Self::FramePacking,
        Self::AudioChannelConfiguration,
        Self::ContentProtection,
        Self::OutputProtection,
        Self::EssentialProperty,
        Self::SupplementalProperty,
        Self::InbandEventStream,
        Self::Switching,
        Self::RandomAccess,
        Self::GroupLabel,
        Self::Label,
        Self::ProducerReferenceTime,
        Self::ContentPopularityRate,
        Self::Resync,
    ];

    /// Name as it appears in the document: attributes without the `@`, elements by tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::Width => "width",
            Self::Height => "height",
            Self::Sar => "sar",
            Self::FrameRate => "frameRate",
            Self::AudioSamplingRate => "audioSamplingRate",
            Self::MimeType => "mimeType",
            Self::SegmentProfiles => "segmentProfiles",
            Self::Codecs => "codecs",
            Self::ContainerProfiles => "containerProfiles",
            Self::MaximumSapPeriod => "maximumSAPPeriod",
            Self::StartWithSap => "startWithSAP",
            Self::MaxPlayoutRate => "maxPlayoutRate",
            Self::CodingDependency => "codingDependency",
            Self::ScanType => "scanType",
            Self::SelectionPriority => "selectionPriority",
            Self::Tag => "tag",
            Self::FramePacking => "FramePacking",
            Self::AudioChannelConfiguration => "AudioChannelConfiguration",
            Self::ContentProtection => "ContentProtection",
            Self::OutputProtection => "OutputProtection",
            Self::EssentialProperty => "EssentialProperty",
            Self::SupplementalProperty => "SupplementalProperty",
            Self::InbandEventStream => "InbandEventStream",
            Self::Switching => "Switching",
            Self::RandomAccess => "RandomAccess",
            Self::GroupLabel => "GroupLabel",
            Self::Label => "Label",
            Self::ProducerReferenceTime => "ProducerReferenceTime",
            Self::ContentPopularityRate => "ContentPopularityRate",
            Self::Resync => "Resync",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    pub fn is_element(&self) -> bool {
        self.name().starts_with(|c: char| c.is_ascii_uppercase())
    }

    /// Whether an undeclared value is taken from the enclosing node.
    ///
    /// Selection priority, tags, labels, group labels and popularity rates describe the
    /// node they are declared on and are never inherited.
    pub fn is_inheritable(&self) -> bool {
        !matches!(
            self,
            Self::SelectionPriority
                | Self::Tag
                | Self::GroupLabel
                | Self::Label
                | Self::ContentPopularityRate
        )
    }
}

/// A borrowed view of one value of [`CommonAttributes`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeValue<'a> {
    Text(&'a str),
    UInt(u64),
    Bool(bool),
    Ratio(&'a Ratio),
    FrameRate(&'a FrameRate),
    UIntList(&'a UIntVector),
    Codecs(&'a Codecs),
    Decimal(&'a Decimal),
    Sap(Sap),
    Scan(&'a VideoScan),
    Descriptors(&'a [Descriptor]),
    EventStreams(&'a [EventStream]),
    Switchings(&'a [Switching]),
    RandomAccesses(&'a [RandomAccess]),
    Labels(&'a [Label]),
    ProducerReferenceTimes(&'a [ProducerReferenceTime]),
    ContentPopularityRates(&'a [ContentPopularityRate]),
    Resyncs(&'a [Resync]),
}

fn non_empty<T>(items: &[T]) -> Option<&[T]> {
    (!items.is_empty()).then_some(items)
}

impl CommonAttributes {
    /// The value declared directly on this node. Empty element lists count as undeclared.
    pub fn get(&self, attribute: Attribute) -> Option<AttributeValue<'_>> {
        use AttributeValue as V;

        match attribute {
            Attribute::Profiles => self.profiles.as_deref().map(V::Text),
            Attribute::Width => self.width.map(V::UInt),
            Attribute::Height => self.height.map(V::UInt),
            Attribute::Sar => self.sar.as_ref().map(V::Ratio),
            Attribute::FrameRate => self.frame_rate.as_ref().map(V::FrameRate),
            Attribute::AudioSamplingRate => self.audio_sampling_rate.as_ref().map(V::UIntList),
            Attribute::MimeType => self.mime_type.as_deref().map(V::Text),
            Attribute::SegmentProfiles => self.segment_profiles.as_deref().map(V::Text),
            Attribute::Codecs => self.codecs.as_ref().map(V::Codecs),
            Attribute::ContainerProfiles => self.container_profiles.as_deref().map(V::Text),
            Attribute::MaximumSapPeriod => self.maximum_sap_period.as_ref().map(V::Decimal),
            Attribute::StartWithSap => self.start_with_sap.map(V::Sap),
            Attribute::MaxPlayoutRate => self.max_playout_rate.as_ref().map(V::Decimal),
            Attribute::CodingDependency => self.coding_dependency.map(V::Bool),
            Attribute::ScanType => self.scan_type.as_ref().map(V::Scan),
            Attribute::SelectionPriority => self.selection_priority.map(|p| V::UInt(p as u64)),
            Attribute::Tag => self.tag.as_deref().map(V::Text),
            Attribute::FramePacking => non_empty(&self.frame_packings).map(V::Descriptors),
            Attribute::AudioChannelConfiguration => {
                non_empty(&self.audio_channel_configurations).map(V::Descriptors)
            }
            Attribute::ContentProtection => {
                non_empty(&self.content_protections).map(V::Descriptors)
            }
            Attribute::OutputProtection => non_empty(&self.output_protections).map(V::Descriptors),
            Attribute::EssentialProperty => {
                non_empty(&self.essential_properties).map(V::Descriptors)
            }
            Attribute::SupplementalProperty => {
                non_empty(&self.supplemental_properties).map(V::Descriptors)
            }
            Attribute::InbandEventStream => {
                non_empty(&self.inband_event_streams).map(V::EventStreams)
            }
            Attribute::Switching => non_empty(&self.switchings).map(V::Switchings),
            Attribute::RandomAccess => non_empty(&self.random_accesses).map(V::RandomAccesses),
            Attribute::GroupLabel => non_empty(&self.group_labels).map(V::Labels),
            Attribute::Label => non_empty(&self.labels).map(V::Labels),
            Attribute::ProducerReferenceTime => {
                non_empty(&self.producer_reference_times).map(V::ProducerReferenceTimes)
            }
            Attribute::ContentPopularityRate => {
                non_empty(&self.content_popularity_rates).map(V::ContentPopularityRates)
            }
            Attribute::Resync => non_empty(&self.resyncs).map(V::Resyncs),
        }
    }

    /// Clears the locally declared value so that it is inherited again.
    pub fn unset(&mut self, attribute: Attribute) {
        match attribute {
            Attribute::Profiles => self.profiles = None,
            Attribute::Width => self.width = None,
            Attribute::Height => self.height = None,
            Attribute::Sar => self.sar = None,
            Attribute::FrameRate => self.frame_rate = None,
            Attribute::AudioSamplingRate => self.audio_sampling_rate = None,
            Attribute::MimeType => self.mime_type = None,
            Attribute::SegmentProfiles => self.segment_profiles = None,
            Attribute::Codecs => self.codecs = None,
            Attribute::ContainerProfiles => self.container_profiles = None,
            Attribute::MaximumSapPeriod => self.maximum_sap_period = None,
            Attribute::StartWithSap => self.start_with_sap = None,
            Attribute::MaxPlayoutRate => self.max_playout_rate = None,
            Attribute::CodingDependency => self.coding_dependency = None,
            Attribute::ScanType => self.scan_type = None,
            Attribute::SelectionPriority => self.selection_priority = None,
            Attribute::Tag => self.tag = None,
            Attribute::FramePacking => self.frame_packings.clear(),
            Attribute::AudioChannelConfiguration => self.audio_channel_configurations.clear(),
            Attribute::ContentProtection => self.content_protections.clear(),
            Attribute::OutputProtection => self.output_protections.clear(),
            Attribute::EssentialProperty => self.essential_properties.clear(),
            Attribute::SupplementalProperty => self.supplemental_properties.clear(),
            Attribute::InbandEventStream => self.inband_event_streams.clear(),
            Attribute::Switching => self.switchings.clear(),
            Attribute::RandomAccess => self.random_accesses.clear(),
            Attribute::GroupLabel => self.group_labels.clear(),
            Attribute::Label => self.labels.clear(),
            Attribute::ProducerReferenceTime => self.producer_reference_times.clear(),
            Attribute::ContentPopularityRate => self.content_popularity_rates.clear(),
            Attribute::Resync => self.resyncs.clear(),
        }
    }

    pub(crate) fn read(reader: &mut NodeReader) -> MpdResult<Self> {
        Ok(Self {
            profiles: reader.opt("profiles")?,
            width: reader.opt("width")?,
            height: reader.opt("height")?,
            sar: reader.opt("sar")?,
            frame_rate: reader.opt("frameRate")?,
            audio_sampling_rate: reader.opt("audioSamplingRate")?,
            mime_type: reader.opt("mimeType")?,
            segment_profiles: reader.opt("segmentProfiles")?,
            codecs: reader.opt("codecs")?,
            container_profiles: reader.opt("containerProfiles")?,
            maximum_sap_period: reader.opt("maximumSAPPeriod")?,
            start_with_sap: reader.opt("startWithSAP")?,
            max_playout_rate: reader.opt("maxPlayoutRate")?,
            coding_dependency: reader.opt("codingDependency")?,
            scan_type: reader.opt("scanType")?,
            selection_priority: reader.opt("selectionPriority")?,
            tag: reader.opt("tag")?,
            frame_packings: reader.children("FramePacking")?,
            audio_channel_configurations: reader.children("AudioChannelConfiguration")?,
            content_protections: reader.children("ContentProtection")?,
            output_protections: reader.children("OutputProtection")?,
            essential_properties: reader.children("EssentialProperty")?,
            supplemental_properties: reader.children("SupplementalProperty")?,
            inband_event_streams: reader.children("InbandEventStream")?,
            switchings: reader.children("Switching")?,
            random_accesses: reader.children("RandomAccess")?,
            group_labels: reader.children("GroupLabel")?,
            labels: reader.children("Label")?,
            producer_reference_times: reader.children("ProducerReferenceTime")?,
            content_popularity_rates: reader.children("ContentPopularityRate")?,
            resyncs: reader.children("Resync")?,
        })
    }

    /// Writes attributes and the common child elements, which come first in every
    /// derived element.
    pub(crate) fn write(&self, writer: NodeWriter) -> NodeWriter {
        writer
            .attr("profiles", self.profiles.as_ref())
            .attr("width", self.width.as_ref())
            .attr("height", self.height.as_ref())
            .attr("sar", self.sar.as_ref())
            .attr("frameRate", self.frame_rate.as_ref())
            .attr("audioSamplingRate", self.audio_sampling_rate.as_ref())
            .attr("mimeType", self.mime_type.as_ref())
            .attr("segmentProfiles", self.segment_profiles.as_ref())
            .attr("codecs", self.codecs.as_ref())
            .attr("containerProfiles", self.container_profiles.as_ref())
            .attr("maximumSAPPeriod", self.maximum_sap_period.as_ref())
            .attr("startWithSAP", self.start_with_sap.as_ref())
            .attr("maxPlayoutRate", self.max_playout_rate.as_ref())
            .attr("codingDependency", self.coding_dependency.as_ref())
            .attr("scanType", self.scan_type.as_ref())
            .attr("selectionPriority", self.selection_priority.as_ref())
            .attr("tag", self.tag.as_ref())
            .children("FramePacking", &self.frame_packings)
            .children("AudioChannelConfiguration", &self.audio_channel_configurations)
            .children("ContentProtection", &self.content_protections)
            .children("OutputProtection", &self.output_protections)
            .children("EssentialProperty", &self.essential_properties)
            .children("SupplementalProperty", &self.supplemental_properties)
            .children("InbandEventStream", &self.inband_event_streams)
            .children("Switching", &self.switchings)
            .children("RandomAccess", &self.random_accesses)
            .children("GroupLabel", &self.group_labels)
            .children("Label", &self.labels)
            .children("ProducerReferenceTime", &self.producer_reference_times)
            .children("ContentPopularityRate", &self.content_popularity_rates)
            .children("Resync", &self.resyncs)
    }
}

/// Resolves `attribute` over an override chain ordered from the most specific node
/// outwards (e.g. `[sub_representation, representation, adaptation_set]`).
///
/// Nothing is cached: every call walks the chain, so an edit to an ancestor is visible
/// to its descendants immediately.
pub fn effective<'a>(
    chain: &[&'a CommonAttributes],
    attribute: Attribute,
) -> Option<AttributeValue<'a>> {
    if !attribute.is_inheritable() {
        return chain.first().copied()?.get(attribute);
    }
    chain.iter().copied().find_map(|node| node.get(attribute))
}

/// Typed variant of [`effective`].
pub fn effective_with<'a, T: 'a>(
    chain: &[&'a CommonAttributes],
    attribute: Attribute,
    select: impl Fn(&'a CommonAttributes) -> Option<T>,
) -> Option<T> {
    if !attribute.is_inheritable() {
        return select(chain.first().copied()?);
    }
    chain.iter().copied().find_map(select)
}

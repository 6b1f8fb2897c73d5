use std::fmt;

use crate::{
    codec::{Node, NodeReader, NodeWriter},
    descriptor::Descriptor,
    element::{Element, Extras},
    error::{MpdError, MpdResult, ParseReason},
    url::BaseUrl,
    values::{LeapSecondInformation, MpdValue, UIntVWithId, XsDateTime, XsDuration},
};

use super::{
    groups::InitializationSet,
    period::Period,
    program::{Location, Metrics, ProgramInformation, ServiceDescription},
    validate,
};

pub const MPD_NAMESPACE: &str = "urn:mpeg:dash:schema:mpd:2011";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PresentationType {
    #[default]
    Static,
    Dynamic,
}

impl fmt::Display for PresentationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        })
    }
}

impl MpdValue for PresentationType {
    const EXPECTED: &'static str = "static or dynamic";

    fn parse_value(s: &str) -> Option<Self> {
        match s {
            "static" => Some(Self::Static),
            "dynamic" => Some(Self::Dynamic),
            _ => None,
        }
    }

    fn format_value(&self) -> String {
        self.to_string()
    }
}

/// The root `MPD` element.
///
/// A manifest is built once from a generic element tree, validated as a whole, and can be
/// serialized back into an equivalent tree. Edits go through the all-or-nothing
/// operations in [`crate::tree`] rather than through the public fields, which offer no
/// validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pub id: Option<String>,
    pub profiles: String,
    pub presentation_type: Option<PresentationType>,
    pub availability_start_time: Option<XsDateTime>,
    pub publish_time: Option<XsDateTime>,
    pub availability_end_time: Option<XsDateTime>,
    pub media_presentation_duration: Option<XsDuration>,
    pub minimum_update_period: Option<XsDuration>,
    pub min_buffer_time: XsDuration,
    pub time_shift_buffer_depth: Option<XsDuration>,
    pub suggested_presentation_delay: Option<XsDuration>,
    pub max_segment_duration: Option<XsDuration>,
    pub max_subsegment_duration: Option<XsDuration>,

    pub program_informations: Vec<ProgramInformation>,
    pub base_urls: Vec<BaseUrl>,
    pub locations: Vec<Location>,
    pub patch_locations: Vec<Location>,
    pub service_descriptions: Vec<ServiceDescription>,
    pub initialization_sets: Vec<InitializationSet>,
    pub initialization_groups: Vec<UIntVWithId>,
    pub initialization_presentations: Vec<UIntVWithId>,
    pub content_protections: Vec<Descriptor>,
    pub periods: Vec<Period>,
    pub metrics: Vec<Metrics>,
    pub essential_properties: Vec<Descriptor>,
    pub supplemental_properties: Vec<Descriptor>,
    pub utc_timings: Vec<Descriptor>,
    pub leap_second_information: Option<LeapSecondInformation>,
    pub extras: Extras,
}

impl Manifest {
    /// Builds and validates a manifest. Nothing is returned unless the whole tree is
    /// well-formed and valid.
    pub fn build(element: &Element) -> MpdResult<Self> {
        if element.name != "MPD" {
            return Err(MpdError::parse(
                &element.name,
                ParseReason::UnexpectedElement {
                    expected: "MPD".to_string(),
                    found: element.name.clone(),
                },
            ));
        }
        if let Some(namespace) = element.attribute("xmlns") {
            if namespace != MPD_NAMESPACE {
                return Err(MpdError::parse(
                    "MPD",
                    ParseReason::InvalidValue {
                        attribute: "xmlns".to_string(),
                        value: namespace.to_string(),
                        expected: MPD_NAMESPACE.to_string(),
                    },
                ));
            }
        }

        let manifest = Self::decode(element)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn serialize(&self) -> Element {
        self.encode("MPD")
    }

    /// Runs every document level check [`Manifest::build`] performs.
    pub fn validate(&self) -> MpdResult<()> {
        validate::validate(self)
    }

    pub fn presentation_type(&self) -> PresentationType {
        self.presentation_type.unwrap_or_default()
    }

    pub fn is_dynamic(&self) -> bool {
        self.presentation_type() == PresentationType::Dynamic
    }

    /// A dynamic presentation that can actually be joined live.
    pub fn is_live(&self) -> bool {
        self.is_dynamic() && self.availability_start_time.is_some()
    }

    pub fn profiles(&self) -> impl Iterator<Item = &str> {
        self.profiles.split(',').map(str::trim).filter(|p| !p.is_empty())
    }

    pub fn period_by_id(&self, id: &str) -> Option<&Period> {
        self.periods.iter().find(|p| p.id.as_deref() == Some(id))
    }

    #[cfg(feature = "xml")]
    pub fn from_xml(xml: &str) -> MpdResult<Self> {
        Self::build(&crate::xml::parse(xml)?)
    }

    #[cfg(feature = "xml")]
    pub fn to_xml(&self) -> MpdResult<String> {
        crate::xml::write(&self.serialize())
    }
}

impl Node for Manifest {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        let manifest = Self {
            id: reader.opt("id")?,
            profiles: reader.req("profiles")?,
            presentation_type: reader.opt("type")?,
            availability_start_time: reader.opt("availabilityStartTime")?,
            publish_time: reader.opt("publishTime")?,
            availability_end_time: reader.opt("availabilityEndTime")?,
            media_presentation_duration: reader.opt("mediaPresentationDuration")?,
            minimum_update_period: reader.opt("minimumUpdatePeriod")?,
            min_buffer_time: reader.req("minBufferTime")?,
            time_shift_buffer_depth: reader.opt("timeShiftBufferDepth")?,
            suggested_presentation_delay: reader.opt("suggestedPresentationDelay")?,
            max_segment_duration: reader.opt("maxSegmentDuration")?,
            max_subsegment_duration: reader.opt("maxSubsegmentDuration")?,
            program_informations: reader.children("ProgramInformation")?,
            base_urls: reader.children("BaseURL")?,
            locations: reader.children("Location")?,
            patch_locations: reader.children("PatchLocation")?,
            service_descriptions: reader.children("ServiceDescription")?,
            initialization_sets: reader.children("InitializationSet")?,
            initialization_groups: reader.children("InitializationGroup")?,
            initialization_presentations: reader.children("InitializationPresentation")?,
            content_protections: reader.children("ContentProtection")?,
            periods: reader.children("Period")?,
            metrics: reader.children("Metrics")?,
            essential_properties: reader.children("EssentialProperty")?,
            supplemental_properties: reader.children("SupplementalProperty")?,
            utc_timings: reader.children("UTCTiming")?,
            leap_second_information: reader.child("LeapSecondInformation")?,
            extras: reader.finish(),
        };
        if manifest.periods.is_empty() {
            return Err(MpdError::parse(
                "MPD",
                ParseReason::MissingChild("Period".to_string()),
            ));
        }
        Ok(manifest)
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .attr("id", self.id.as_ref())
            .req_attr("profiles", &self.profiles)
            .attr("type", self.presentation_type.as_ref())
            .attr("availabilityStartTime", self.availability_start_time.as_ref())
            .attr("publishTime", self.publish_time.as_ref())
            .attr("availabilityEndTime", self.availability_end_time.as_ref())
            .attr(
                "mediaPresentationDuration",
                self.media_presentation_duration.as_ref(),
            )
            .attr("minimumUpdatePeriod", self.minimum_update_period.as_ref())
            .req_attr("minBufferTime", &self.min_buffer_time)
            .attr("timeShiftBufferDepth", self.time_shift_buffer_depth.as_ref())
            .attr(
                "suggestedPresentationDelay",
                self.suggested_presentation_delay.as_ref(),
            )
            .attr("maxSegmentDuration", self.max_segment_duration.as_ref())
            .attr("maxSubsegmentDuration", self.max_subsegment_duration.as_ref())
            .children("ProgramInformation", &self.program_informations)
            .children("BaseURL", &self.base_urls)
            .children("Location", &self.locations)
            .children("PatchLocation", &self.patch_locations)
            .children("ServiceDescription", &self.service_descriptions)
            .children("InitializationSet", &self.initialization_sets)
            .children("InitializationGroup", &self.initialization_groups)
            .children("InitializationPresentation", &self.initialization_presentations)
            .children("ContentProtection", &self.content_protections)
            .children("Period", &self.periods)
            .children("Metrics", &self.metrics)
            .children("EssentialProperty", &self.essential_properties)
            .children("SupplementalProperty", &self.supplemental_properties)
            .children("UTCTiming", &self.utc_timings)
            .child("LeapSecondInformation", self.leap_second_information.as_ref())
            .finish(&self.extras)
    }
}

//! Borrowed views of a node together with its ancestors.
//!
//! Owned nodes do not point at their parents, so everything that depends on the
//! ownership chain (attribute overrides, base URLs, addressing, timing) is reached
//! through these views.

use url::Url;

use crate::{
    addressing::{Addressing, ResolveContext, SegmentResolver},
    base::{self, Attribute, AttributeValue, CommonAttributes},
    config::BaseUrlPolicy,
    error::MpdResult,
    url::{resolve_base_url, BaseUrl, ResolvedBaseUrl},
    values::{Codecs, ContentType, FrameRate, Rational},
};

use super::{
    adaptation_set::AdaptationSet,
    manifest::Manifest,
    period::Period,
    representation::{Representation, SubRepresentation},
};

#[derive(Debug, Clone, Copy)]
pub struct PeriodRef<'a> {
    pub manifest: &'a Manifest,
    pub period: &'a Period,
    pub index: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct AdaptationSetRef<'a> {
    pub period: PeriodRef<'a>,
    pub adaptation_set: &'a AdaptationSet,
    pub index: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct RepresentationRef<'a> {
    pub adaptation_set: AdaptationSetRef<'a>,
    pub representation: &'a Representation,
    pub index: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct SubRepresentationRef<'a> {
    pub representation: RepresentationRef<'a>,
    pub sub_representation: &'a SubRepresentation,
    pub index: usize,
}

impl Manifest {
    pub fn period(&self, index: usize) -> Option<PeriodRef<'_>> {
        self.periods.get(index).map(|period| PeriodRef {
            manifest: self,
            period,
            index,
        })
    }

    pub fn period_refs(&self) -> impl Iterator<Item = PeriodRef<'_>> {
        (0..self.periods.len()).filter_map(|i| self.period(i))
    }

    /// Every representation of every period, in document order.
    pub fn representations(&self) -> impl Iterator<Item = RepresentationRef<'_>> {
        self.period_refs()
            .flat_map(|p| p.adaptation_sets().collect::<Vec<_>>())
            .flat_map(|a| a.representations().collect::<Vec<_>>())
    }
}

impl<'a> PeriodRef<'a> {
    pub fn adaptation_set(&self, index: usize) -> Option<AdaptationSetRef<'a>> {
        self.period
            .adaptation_sets
            .get(index)
            .map(|adaptation_set| AdaptationSetRef {
                period: *self,
                adaptation_set,
                index,
            })
    }

    pub fn adaptation_sets(&self) -> impl Iterator<Item = AdaptationSetRef<'a>> + 'a {
        let this = *self;
        (0..self.period.adaptation_sets.len()).filter_map(move |i| this.adaptation_set(i))
    }

    pub fn base_url_levels(&self) -> Vec<&'a [BaseUrl]> {
        vec![
            self.manifest.base_urls.as_slice(),
            self.period.base_urls.as_slice(),
        ]
    }

    pub fn base_url(&self, location: Option<&Url>, policy: &BaseUrlPolicy) -> MpdResult<ResolvedBaseUrl> {
        resolve_base_url(location, &self.base_url_levels(), policy)
    }

    /// Start of the period in presentation time.
    pub fn start(&self) -> MpdResult<Rational> {
        self.manifest.period_start(self.index)
    }

    pub fn duration(&self) -> MpdResult<Option<Rational>> {
        self.manifest.period_duration(self.index)
    }
}

impl<'a> AdaptationSetRef<'a> {
    pub fn representation(&self, index: usize) -> Option<RepresentationRef<'a>> {
        self.adaptation_set
            .representations
            .get(index)
            .map(|representation| RepresentationRef {
                adaptation_set: *self,
                representation,
                index,
            })
    }

    pub fn representations(&self) -> impl Iterator<Item = RepresentationRef<'a>> + 'a {
        let this = *self;
        (0..self.adaptation_set.representations.len()).filter_map(move |i| this.representation(i))
    }

    pub fn representation_by_id(&self, id: &str) -> Option<RepresentationRef<'a>> {
        self.representations()
            .find(|r| r.representation.id == id)
    }

    pub fn manifest(&self) -> &'a Manifest {
        self.period.manifest
    }

    pub fn effective(&self, attribute: Attribute) -> Option<AttributeValue<'a>> {
        base::effective(&[&self.adaptation_set.common], attribute)
    }

    pub fn base_url_levels(&self) -> Vec<&'a [BaseUrl]> {
        let mut levels = self.period.base_url_levels();
        levels.push(self.adaptation_set.base_urls.as_slice());
        levels
    }

    pub fn base_url(&self, location: Option<&Url>, policy: &BaseUrlPolicy) -> MpdResult<ResolvedBaseUrl> {
        resolve_base_url(location, &self.base_url_levels(), policy)
    }
}

impl<'a> RepresentationRef<'a> {
    pub fn sub_representation(&self, index: usize) -> Option<SubRepresentationRef<'a>> {
        self.representation
            .sub_representations
            .get(index)
            .map(|sub_representation| SubRepresentationRef {
                representation: *self,
                sub_representation,
                index,
            })
    }

    pub fn manifest(&self) -> &'a Manifest {
        self.adaptation_set.manifest()
    }

    pub fn period(&self) -> PeriodRef<'a> {
        self.adaptation_set.period
    }

    pub fn id(&self) -> &'a str {
        &self.representation.id
    }

    pub fn bandwidth(&self) -> u64 {
        self.representation.bandwidth
    }

    /// The override chain, most specific first.
    pub fn chain(&self) -> [&'a CommonAttributes; 2] {
        [
            &self.representation.common,
            &self.adaptation_set.adaptation_set.common,
        ]
    }

    pub fn effective(&self, attribute: Attribute) -> Option<AttributeValue<'a>> {
        base::effective(&self.chain(), attribute)
    }

    pub fn mime_type(&self) -> Option<&'a str> {
        base::effective_with(&self.chain(), Attribute::MimeType, |c| c.mime_type.as_deref())
    }

    pub fn codecs(&self) -> Option<&'a Codecs> {
        base::effective_with(&self.chain(), Attribute::Codecs, |c| c.codecs.as_ref())
    }

    pub fn width(&self) -> Option<u64> {
        base::effective_with(&self.chain(), Attribute::Width, |c| c.width)
    }

    pub fn height(&self) -> Option<u64> {
        base::effective_with(&self.chain(), Attribute::Height, |c| c.height)
    }

    pub fn frame_rate(&self) -> Option<FrameRate> {
        base::effective_with(&self.chain(), Attribute::FrameRate, |c| c.frame_rate)
    }

    pub fn content_type(&self) -> Option<ContentType> {
        self.adaptation_set
            .adaptation_set
            .content_type
            .clone()
            .or_else(|| self.mime_type().map(ContentType::from_mime_type))
    }

    /// `@lang` lives on the adaptation set only.
    pub fn lang(&self) -> Option<&'a str> {
        self.adaptation_set.adaptation_set.lang.as_deref()
    }

    pub fn base_url_levels(&self) -> Vec<&'a [BaseUrl]> {
        let mut levels = self.adaptation_set.base_url_levels();
        levels.push(self.representation.base_urls.as_slice());
        levels
    }

    pub fn base_url(&self, location: Option<&Url>, policy: &BaseUrlPolicy) -> MpdResult<ResolvedBaseUrl> {
        resolve_base_url(location, &self.base_url_levels(), policy)
    }

    /// The addressing in effect, merged over representation, adaptation set and period.
    pub fn addressing(&self) -> Option<Addressing> {
        Addressing::effective(&[
            &self.representation.addressing,
            &self.adaptation_set.adaptation_set.addressing,
            &self.period().period.addressing,
        ])
    }

    pub fn segments(&self, context: &ResolveContext) -> MpdResult<SegmentResolver<'a>> {
        SegmentResolver::new(*self, context)
    }
}

impl<'a> SubRepresentationRef<'a> {
    pub fn chain(&self) -> [&'a CommonAttributes; 3] {
        let [representation, adaptation_set] = self.representation.chain();
        [&self.sub_representation.common, representation, adaptation_set]
    }

    pub fn effective(&self, attribute: Attribute) -> Option<AttributeValue<'a>> {
        base::effective(&self.chain(), attribute)
    }
}

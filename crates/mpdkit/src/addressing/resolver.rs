//! Turns the addressing in effect for a representation into segment locations.

use chrono::{DateTime, Utc};
use url::Url;

use crate::{
    config::{BaseUrlPolicy, ResolverConfig},
    error::{InvalidReason, MpdError, MpdResult},
    timing::{offset, AvailabilityWindow},
    tree::RepresentationRef,
    url::{merge_baseurls, ResolvedBaseUrl},
    values::{ByteRange, Rational, XsDuration},
};

use super::{
    segment_base::{SegmentBase, SourceUrl},
    template::TemplateVariables,
    timeline::{TimelineIter, TimelineSegment},
    Addressing, AddressingScheme,
};

/// What the caller knows that the manifest does not: where it was retrieved from, what
/// time it is, and how to pick among alternative `BaseURL`s.
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    pub location: Option<Url>,
    /// Wall-clock "now". Only consulted for the open-ended last period of a dynamic
    /// presentation.
    pub now: Option<DateTime<Utc>>,
    pub base_url_policy: BaseUrlPolicy,
}

impl ResolveContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_location(mut self, location: Url) -> Self {
        self.location = Some(location);
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn with_policy(mut self, policy: BaseUrlPolicy) -> Self {
        self.base_url_policy = policy;
        self
    }
}

impl From<&ResolverConfig> for ResolveContext {
    fn from(config: &ResolverConfig) -> Self {
        Self::new().with_policy(config.base_url_policy.clone())
    }
}

/// A resource plus an optional byte range within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentLocation {
    pub url: Url,
    pub byte_range: Option<ByteRange>,
}

/// One media segment of a representation.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Zero-based position among the representation's segments.
    pub index: u64,
    /// `startNumber + index`, the value of `$Number$`.
    pub number: u64,
    /// Earliest presentation time in timescale units, the value of `$Time$`.
    pub time: Option<u64>,
    /// Start relative to the period start, in seconds.
    pub start: Rational,
    pub duration: Option<Rational>,
    pub url: Url,
    pub byte_range: Option<ByteRange>,
}

impl Segment {
    pub fn end(&self) -> Option<Rational> {
        self.duration.map(|duration| self.start + duration)
    }

    pub fn location(&self) -> SegmentLocation {
        SegmentLocation {
            url: self.url.clone(),
            byte_range: self.byte_range,
        }
    }
}

/// Segment queries for one representation, over a snapshot of the manifest.
#[derive(Debug, Clone)]
pub struct SegmentResolver<'a> {
    representation: RepresentationRef<'a>,
    addressing: Addressing,
    base: ResolvedBaseUrl,
    period_start: Rational,
    /// How far into the period segments exist, in seconds. `None` when unknown.
    bound: Option<Rational>,
}

impl<'a> SegmentResolver<'a> {
    pub fn new(representation: RepresentationRef<'a>, context: &ResolveContext) -> MpdResult<Self> {
        let base = representation.base_url(context.location.as_ref(), &context.base_url_policy)?;
        // nothing declared anywhere: the representation is a single file at its BaseURL
        let addressing = representation
            .addressing()
            .unwrap_or_else(|| Addressing::Indexed(SegmentBase::default()));

        let period = representation.period();
        let manifest = representation.manifest();
        let period_start = period.start()?;
        let bound = match period.duration()? {
            Some(duration) => Some(duration),
            None => match context.now {
                Some(now) if manifest.is_dynamic() => manifest
                    .presentation_time_at(now)
                    .map(|time| (time - period_start).max(Rational::ZERO)),
                _ => None,
            },
        };

        Ok(Self {
            representation,
            addressing,
            base,
            period_start,
            bound,
        })
    }

    pub fn scheme(&self) -> AddressingScheme {
        self.addressing.scheme()
    }

    pub fn addressing(&self) -> &Addressing {
        &self.addressing
    }

    pub fn base_url(&self) -> &ResolvedBaseUrl {
        &self.base
    }

    /// Start of the period on the MPD timeline, in seconds.
    pub fn period_start(&self) -> Rational {
        self.period_start
    }

    fn segment_base(&self) -> &SegmentBase {
        self.addressing.segment_base()
    }

    fn start_number(&self) -> u64 {
        self.addressing
            .multiple()
            .map(|m| m.start_number())
            .unwrap_or(1)
    }

    fn duration(&self) -> Option<u64> {
        self.addressing
            .multiple()
            .and_then(|m| m.duration)
            .filter(|d| *d > 0)
    }

    fn url(&self, relative: Option<&str>) -> MpdResult<Url> {
        match relative.map(str::trim) {
            Some(relative) if !relative.is_empty() => merge_baseurls(&self.base.url, relative),
            _ => Ok(self.base.url.clone()),
        }
    }

    fn source(&self, source: &SourceUrl) -> MpdResult<SegmentLocation> {
        Ok(SegmentLocation {
            url: self.url(source.source_url.as_deref())?,
            byte_range: source.range,
        })
    }

    fn variables(&self) -> TemplateVariables {
        let mut variables = TemplateVariables::new();
        variables
            .insert(TemplateVariables::REPRESENTATION_ID, self.representation.id())
            .insert(TemplateVariables::BANDWIDTH, self.representation.bandwidth());
        variables
    }

    /// The bound of the timeline in timescale units, for expanding `@r=-1`.
    fn timeline_end(&self) -> Option<u64> {
        let base = self.segment_base();
        let units = (self.bound? * Rational::from(base.timescale().max(1))).ceil();
        let end = base.presentation_time_offset() as i128 + units.max(0);
        Some(end.min(u64::MAX as i128) as u64)
    }

    /// Number of segments allowed by `@endNumber`.
    fn end_number_limit(&self) -> Option<u64> {
        let end_number = self.addressing.multiple()?.end_number?;
        Some(end_number.saturating_add(1).saturating_sub(self.start_number()))
    }

    /// The initialization segment, if the representation has one.
    pub fn initialization(&self) -> MpdResult<Option<SegmentLocation>> {
        if let Addressing::Template(template) = &self.addressing {
            if let Some(initialization) = &template.initialization {
                let url = self.variables().resolve(initialization);
                return Ok(Some(SegmentLocation {
                    url: self.url(Some(&url))?,
                    byte_range: None,
                }));
            }
        }
        self.segment_base()
            .initialization
            .as_ref()
            .map(|source| self.source(source))
            .transpose()
    }

    /// The segment index of the representation (`RepresentationIndex`, or the
    /// `@indexRange` of a single indexed file).
    pub fn index_location(&self) -> MpdResult<Option<SegmentLocation>> {
        let base = self.segment_base();
        if let Some(index) = &base.representation_index {
            return self.source(index).map(Some);
        }
        match (&self.addressing, &base.index_range) {
            (Addressing::Indexed(_), Some(range)) => Ok(Some(SegmentLocation {
                url: self.url(None)?,
                byte_range: Some(*range),
            })),
            _ => Ok(None),
        }
    }

    /// Number of segments, or `None` when they go on without a known end (a live
    /// template, or a trailing `@r=-1` with no bound).
    pub fn segment_count(&self) -> MpdResult<Option<u64>> {
        let count = match &self.addressing {
            Addressing::Indexed(_) => Some(1),
            Addressing::List(list) => {
                let urls = list.segment_urls.len() as u64;
                match &list.multiple.segment_timeline {
                    Some(timeline) => Some(
                        timeline
                            .len(self.timeline_end())
                            .map_or(urls, |len| len.min(urls)),
                    ),
                    None => Some(urls),
                }
            }
            Addressing::Template(template) => match &template.multiple.segment_timeline {
                Some(timeline) => timeline.len(self.timeline_end()),
                None => match self.duration() {
                    Some(duration) => self.bound.map(|bound| {
                        let timescale = Rational::from(self.segment_base().timescale().max(1));
                        let count = (bound * timescale / Rational::from(duration)).ceil();
                        count.clamp(0, u64::MAX as i128) as u64
                    }),
                    None => Some(1),
                },
            },
        };

        Ok(match (count, self.end_number_limit()) {
            (Some(count), Some(limit)) => Some(count.min(limit)),
            (None, Some(limit)) => Some(limit),
            (count, None) => count,
        })
    }

    fn out_of_range(&self, index: u64, count: Option<u64>) -> MpdError {
        MpdError::range(
            "segment index",
            index,
            match count {
                Some(count) => format!("0..{count}"),
                None => "a segment inside the timeline".to_string(),
            },
        )
    }

    /// The segment at zero-based position `index`.
    pub fn segment(&self, index: u64) -> MpdResult<Segment> {
        let count = self.segment_count()?;
        if count.is_some_and(|count| index >= count) {
            return Err(self.out_of_range(index, count));
        }

        match self.addressing.timeline() {
            Some(timeline) => {
                let entry = timeline
                    .segment(index, self.timeline_end())
                    .ok_or_else(|| self.out_of_range(index, count))?;
                self.timeline_segment(entry)
            }
            None => self.numbered_segment(index),
        }
    }

    /// The segment whose `$Number$` is `number`.
    pub fn segment_by_number(&self, number: u64) -> MpdResult<Segment> {
        let start_number = self.start_number();
        if number < start_number {
            return Err(MpdError::range(
                "segment number",
                number,
                format!(">= {start_number}"),
            ));
        }
        self.segment(number - start_number)
    }

    /// The segment containing the period-relative time `time` (seconds), if any.
    pub fn segment_at(&self, time: Rational) -> MpdResult<Option<Segment>> {
        if time.is_negative() || self.bound.is_some_and(|bound| time >= bound) {
            return Ok(None);
        }
        let base = self.segment_base();
        let units = (time * Rational::from(base.timescale().max(1))).floor();
        let count = self.segment_count()?;

        let index = match (self.addressing.timeline(), self.duration()) {
            (Some(timeline), _) => {
                let media_time = base.presentation_time_offset() as i128 + units;
                let media_time = media_time.clamp(0, u64::MAX as i128) as u64;
                match timeline.segment_at(media_time, self.timeline_end()) {
                    Some(entry) => entry.index,
                    None => return Ok(None),
                }
            }
            (None, Some(duration)) => (units / duration as i128) as u64,
            (None, None) => 0,
        };
        if count.is_some_and(|count| index >= count) {
            return Ok(None);
        }
        self.segment(index).map(Some)
    }

    /// Every segment in order. Lazy: an open-ended representation yields segments until
    /// the caller stops asking.
    pub fn segments(&self) -> MpdResult<Segments<'_>> {
        let count = self.segment_count()?;
        let timeline = self
            .addressing
            .timeline()
            .map(|timeline| timeline.iter(self.timeline_end()));
        Ok(Segments {
            resolver: self,
            timeline,
            index: 0,
            count,
        })
    }

    fn timeline_segment(&self, entry: TimelineSegment) -> MpdResult<Segment> {
        let base = self.segment_base();
        let relative = entry.time as i128 - base.presentation_time_offset() as i128;
        let number = self.number(entry.index)?;
        let (url, byte_range) = self.media(entry.index, number, Some(entry.time))?;
        Ok(Segment {
            index: entry.index,
            number,
            time: Some(entry.time),
            start: base.to_seconds(relative),
            duration: Some(base.to_seconds(entry.duration as i128)),
            url,
            byte_range,
        })
    }

    /// `$Number$` of the segment at `index`.
    fn number(&self, index: u64) -> MpdResult<u64> {
        self.start_number()
            .checked_add(index)
            .ok_or_else(|| MpdError::range("segment index", index, "a segment number below 2^64"))
    }

    fn numbered_segment(&self, index: u64) -> MpdResult<Segment> {
        let base = self.segment_base();
        let number = self.number(index)?;
        let (time, start, duration) = match self.duration() {
            Some(duration) => {
                let offset = index as i128 * duration as i128;
                let time = base.presentation_time_offset() as i128 + offset;
                (
                    Some(time.min(u64::MAX as i128) as u64),
                    base.to_seconds(offset),
                    Some(base.to_seconds(duration as i128)),
                )
            }
            None => (None, Rational::ZERO, self.bound),
        };
        let (url, byte_range) = self.media(index, number, time)?;
        Ok(Segment {
            index,
            number,
            time,
            start,
            duration,
            url,
            byte_range,
        })
    }

    fn media(&self, index: u64, number: u64, time: Option<u64>) -> MpdResult<(Url, Option<ByteRange>)> {
        match &self.addressing {
            Addressing::Indexed(_) => Ok((self.url(None)?, None)),
            Addressing::List(list) => {
                let segment_url = usize::try_from(index)
                    .ok()
                    .and_then(|i| list.segment_urls.get(i))
                    .ok_or_else(|| self.out_of_range(index, Some(list.segment_urls.len() as u64)))?;
                Ok((
                    self.url(segment_url.media.as_deref())?,
                    segment_url.media_range,
                ))
            }
            Addressing::Template(template) => {
                let media = template.media.as_deref().ok_or_else(|| {
                    MpdError::invalid(
                        "SegmentTemplate",
                        InvalidReason::Constraint("@media is required to address segments".to_string()),
                    )
                })?;
                let mut variables = self.variables();
                variables
                    .insert(TemplateVariables::NUMBER, number)
                    .insert_optional(TemplateVariables::TIME, time);
                Ok((self.url(Some(&variables.resolve(media)))?, None))
            }
        }
    }

    /// `@availabilityTimeOffset` summed over the addressing and the `BaseURL` chain.
    /// `None` stands for `INF`.
    fn availability_time_offset(&self) -> Option<Rational> {
        let local = match &self.segment_base().availability_time_offset {
            Some(offset) => offset.to_rational()?,
            None => Rational::ZERO,
        };
        Some(local + self.base.availability_time_offset?)
    }

    fn time_shift_buffer_depth(&self) -> Option<&XsDuration> {
        self.segment_base()
            .time_shift_buffer_depth
            .as_ref()
            .or(self.base.time_shift_buffer_depth.as_ref())
            .or(self.representation.manifest().time_shift_buffer_depth.as_ref())
    }

    /// When `segment` can be fetched.
    ///
    /// In a dynamic presentation a segment becomes available once it is complete,
    /// `availabilityStartTime + period start + segment end`, moved earlier by the
    /// availability time offset, and stays available for `timeShiftBufferDepth` after
    /// it completes. In a static presentation everything is available while the
    /// manifest is.
    pub fn availability_window(&self, segment: &Segment) -> AvailabilityWindow {
        let manifest = self.representation.manifest();
        if !manifest.is_dynamic() {
            return manifest.static_availability();
        }
        let Some(zero) = manifest.availability_start_time.as_ref().map(|t| t.value()) else {
            return AvailabilityWindow::unbounded();
        };

        let end = segment.end().or(self.bound).unwrap_or(segment.start);
        let complete = self.period_start + end;
        let start = match self.availability_time_offset() {
            Some(ato) => complete - ato,
            None => self.period_start,
        };

        let start = manifest.to_civil(offset(zero, start));
        let mut end = self
            .time_shift_buffer_depth()
            .map(|depth| manifest.to_civil(offset(zero, complete + depth.seconds())));
        if let Some(availability_end) = &manifest.availability_end_time {
            let availability_end = availability_end.value();
            end = Some(end.map_or(availability_end, |end| end.min(availability_end)));
        }

        AvailabilityWindow {
            start: Some(start),
            end,
        }
    }

    pub fn is_available(&self, segment: &Segment, at: DateTime<Utc>) -> bool {
        self.availability_window(segment).contains(at)
    }
}

/// Iterator over the segments of a representation, see [`SegmentResolver::segments`].
pub struct Segments<'r> {
    resolver: &'r SegmentResolver<'r>,
    timeline: Option<TimelineIter<'r>>,
    index: u64,
    count: Option<u64>,
}

impl Iterator for Segments<'_> {
    type Item = MpdResult<Segment>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.count.is_some_and(|count| self.index >= count) {
            return None;
        }
        let segment = match &mut self.timeline {
            Some(timeline) => {
                let entry = timeline.next()?;
                self.resolver.timeline_segment(entry)
            }
            None => self.resolver.numbered_segment(self.index),
        };
        self.index += 1;
        Some(segment)
    }
}

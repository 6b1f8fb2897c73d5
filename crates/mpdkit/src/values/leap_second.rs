use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    codec::{Node, NodeReader, NodeWriter},
    element::{Element, Extras},
    error::MpdResult,
};

use super::XsDateTime;

/// `LeapSecondInformation`: the TAI-UTC offset in effect at the availability start time,
/// and optionally the next announced change.
///
/// The MPD timeline counts elapsed seconds. Once a leap second has been inserted, civil
/// UTC lags the timeline by the difference between the current offset and
/// `@availabilityStartLeapOffset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeapSecondInformation {
    pub availability_start_leap_offset: i64,
    pub next_availability_start_leap_offset: Option<i64>,
    pub next_leap_change_time: Option<XsDateTime>,
    pub extras: Extras,
}

impl LeapSecondInformation {
    pub fn new(availability_start_leap_offset: i64) -> Self {
        Self {
            availability_start_leap_offset,
            next_availability_start_leap_offset: None,
            next_leap_change_time: None,
            extras: Extras::default(),
        }
    }

    pub fn with_next_change(mut self, offset: i64, at: DateTime<Utc>) -> Self {
        self.next_availability_start_leap_offset = Some(offset);
        self.next_leap_change_time = Some(XsDateTime::new(at));
        self
    }

    /// TAI-UTC offset in effect at `at`.
    pub fn offset_at(&self, at: DateTime<Utc>) -> i64 {
        match (
            self.next_availability_start_leap_offset,
            &self.next_leap_change_time,
        ) {
            (Some(offset), Some(change)) if at >= change.value() => offset,
            _ => self.availability_start_leap_offset,
        }
    }

    fn correction(&self, at: DateTime<Utc>) -> TimeDelta {
        TimeDelta::seconds(self.offset_at(at) - self.availability_start_leap_offset)
    }

    /// Maps `availabilityStartTime + elapsed` onto civil UTC.
    pub fn to_civil(&self, timeline: DateTime<Utc>) -> DateTime<Utc> {
        timeline - self.correction(timeline)
    }

    /// Maps a civil UTC instant back onto the elapsed-seconds timeline.
    pub fn to_timeline(&self, civil: DateTime<Utc>) -> DateTime<Utc> {
        civil + self.correction(civil)
    }
}

impl Node for LeapSecondInformation {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            availability_start_leap_offset: reader.req("availabilityStartLeapOffset")?,
            next_availability_start_leap_offset: reader.opt("nextAvailabilityStartLeapOffset")?,
            next_leap_change_time: reader.opt("nextLeapChangeTime")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .req_attr(
                "availabilityStartLeapOffset",
                &self.availability_start_leap_offset,
            )
            .attr(
                "nextAvailabilityStartLeapOffset",
                self.next_availability_start_leap_offset.as_ref(),
            )
            .attr("nextLeapChangeTime", self.next_leap_change_time.as_ref())
            .finish(&self.extras)
    }
}

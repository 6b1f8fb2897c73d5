//! The MPD timeline: where periods sit on it, and how it maps onto wall-clock time.
//!
//! Presentation times are seconds since the zero point of the MPD timeline, kept as
//! [`Rational`]s. For a dynamic presentation the zero point is `@availabilityStartTime`.
//! The timeline counts elapsed seconds, so once a leap second is inserted civil UTC lags
//! behind it; [`LeapSecondInformation`](crate::values::LeapSecondInformation) describes by
//! how much.

use chrono::{DateTime, Utc};

use crate::{
    error::{InvalidReason, MpdError, MpdResult},
    tree::{Manifest, PeriodRef},
    values::Rational,
};

/// The span of wall-clock time during which a segment can be fetched. `None` bounds are
/// open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AvailabilityWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl AvailabilityWindow {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Whether `at` lies in `[start, end)`.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| start <= at) && self.end.is_none_or(|end| at < end)
    }
}

/// `at + seconds`, saturating at the range chrono can represent.
pub(crate) fn offset(at: DateTime<Utc>, seconds: Rational) -> DateTime<Utc> {
    at.checked_add_signed(seconds.to_time_delta())
        .unwrap_or(if seconds.is_negative() {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}

impl Manifest {
    fn period_index_error(&self, index: usize) -> MpdError {
        MpdError::range(
            "period index",
            index,
            format!("0..{}", self.periods.len()),
        )
    }

    /// Start of the period at `index` on the MPD timeline.
    ///
    /// An explicit `@start` wins. Otherwise the period follows the previous one, which
    /// then needs a `@duration`. The first period of a static presentation starts at zero
    /// when it declares nothing.
    pub fn period_start(&self, index: usize) -> MpdResult<Rational> {
        if index >= self.periods.len() {
            return Err(self.period_index_error(index));
        }

        let mut start = Rational::ZERO;
        for (i, period) in self.periods[..=index].iter().enumerate() {
            start = match (&period.start, i) {
                (Some(explicit), _) => explicit.seconds(),
                (None, 0) if self.is_dynamic() => {
                    return Err(MpdError::invalid(
                        "Period",
                        InvalidReason::Constraint(
                            "the first period of a dynamic presentation needs @start".to_string(),
                        ),
                    ))
                }
                (None, 0) => Rational::ZERO,
                (None, _) => match &self.periods[i - 1].duration {
                    Some(previous) => start + previous.seconds(),
                    None => {
                        return Err(MpdError::invalid(
                            "Period",
                            InvalidReason::Constraint(format!(
                                "period {i} has no @start and the period before it has no @duration"
                            )),
                        ))
                    }
                },
            };
        }
        Ok(start)
    }

    /// Duration of the period at `index`: its `@duration`, else up to the next period's
    /// `@start`, else (for the last period) up to `@mediaPresentationDuration`. `None`
    /// when the period is still open, as in a live presentation.
    pub fn period_duration(&self, index: usize) -> MpdResult<Option<Rational>> {
        let Some(period) = self.periods.get(index) else {
            return Err(self.period_index_error(index));
        };
        if let Some(duration) = &period.duration {
            return Ok(Some(duration.seconds()));
        }

        let start = self.period_start(index)?;
        let end = match self.periods.get(index + 1) {
            Some(next) => next.start.as_ref().map(|s| s.seconds()),
            None => self.media_presentation_duration.as_ref().map(|d| d.seconds()),
        };
        Ok(end.map(|end| (end - start).max(Rational::ZERO)))
    }

    /// End of the period at `index` on the MPD timeline, if known.
    pub fn period_end(&self, index: usize) -> MpdResult<Option<Rational>> {
        let start = self.period_start(index)?;
        Ok(self.period_duration(index)?.map(|duration| start + duration))
    }

    /// The period whose `[start, end)` contains the presentation time `time`.
    pub fn period_at(&self, time: Rational) -> Option<PeriodRef<'_>> {
        self.period_refs().find(|period| {
            let Ok(start) = period.start() else {
                return false;
            };
            match period.duration() {
                Ok(Some(duration)) => start <= time && time < start + duration,
                Ok(None) => start <= time,
                Err(_) => false,
            }
        })
    }

    /// Civil UTC time at which the presentation time `time` occurs.
    pub fn wall_clock_at(&self, time: Rational) -> Option<DateTime<Utc>> {
        let zero = self.availability_start_time.as_ref()?.value();
        Some(self.to_civil(offset(zero, time)))
    }

    /// Presentation time corresponding to the civil UTC instant `now`.
    pub fn presentation_time_at(&self, now: DateTime<Utc>) -> Option<Rational> {
        let zero = self.availability_start_time.as_ref()?.value();
        Some(Rational::from_time_delta(self.to_timeline(now) - zero))
    }

    pub(crate) fn to_civil(&self, timeline: DateTime<Utc>) -> DateTime<Utc> {
        match &self.leap_second_information {
            Some(leap) => leap.to_civil(timeline),
            None => timeline,
        }
    }

    pub(crate) fn to_timeline(&self, civil: DateTime<Utc>) -> DateTime<Utc> {
        match &self.leap_second_information {
            Some(leap) => leap.to_timeline(civil),
            None => civil,
        }
    }

    /// Availability of a static presentation: everything, for the lifetime of the
    /// manifest.
    pub fn static_availability(&self) -> AvailabilityWindow {
        AvailabilityWindow {
            start: self.availability_start_time.as_ref().map(|t| t.value()),
            end: self.availability_end_time.as_ref().map(|t| t.value()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::{
        tree::Period,
        values::{LeapSecondInformation, XsDateTime, XsDuration},
    };

    fn period(start: Option<u64>, duration: Option<u64>) -> Period {
        Period {
            start: start.map(XsDuration::from_seconds),
            duration: duration.map(XsDuration::from_seconds),
            ..Default::default()
        }
    }

    #[test]
    fn test_implicit_period_starts() {
        let manifest = Manifest {
            periods: vec![
                period(None, Some(30)),
                period(None, Some(20)),
                period(Some(60), None),
            ],
            media_presentation_duration: Some(XsDuration::from_seconds(90u64)),
            ..Default::default()
        };

        assert_eq!(manifest.period_start(0).unwrap(), Rational::ZERO);
        assert_eq!(manifest.period_start(1).unwrap(), Rational::from(30u64));
        assert_eq!(manifest.period_start(2).unwrap(), Rational::from(60u64));
        assert_eq!(manifest.period_duration(2).unwrap(), Some(Rational::from(30u64)));
        assert!(manifest.period_start(3).is_err());

        let at = manifest.period_at(Rational::from(45u64)).unwrap();
        assert_eq!(at.index, 1);
        assert!(manifest.period_at(Rational::from(90u64)).is_none());
    }

    #[test]
    fn test_duration_from_next_start() {
        let manifest = Manifest {
            periods: vec![period(Some(0), None), period(Some(12), None)],
            ..Default::default()
        };
        assert_eq!(manifest.period_duration(0).unwrap(), Some(Rational::from(12u64)));
        assert_eq!(manifest.period_duration(1).unwrap(), None);
    }

    #[test]
    fn test_missing_start() {
        let manifest = Manifest {
            periods: vec![period(None, None), period(None, None)],
            ..Default::default()
        };
        assert!(manifest.period_start(1).is_err());
    }

    #[test]
    fn test_leap_seconds() {
        let zero = DateTime::parse_from_rfc3339("2016-12-31T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let change = DateTime::parse_from_rfc3339("2017-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let manifest = Manifest {
            availability_start_time: Some(XsDateTime::new(zero)),
            leap_second_information: Some(LeapSecondInformation::new(36).with_next_change(37, change)),
            ..Default::default()
        };

        // before the change, the timeline and civil time agree
        let noon = Rational::from(43_200u64);
        assert_eq!(manifest.wall_clock_at(noon), Some(zero + TimeDelta::hours(12)));

        // two days in, civil time is one second behind
        let later = Rational::from(172_800u64);
        assert_eq!(
            manifest.wall_clock_at(later),
            Some(zero + TimeDelta::days(2) - TimeDelta::seconds(1))
        );
        assert_eq!(
            manifest.presentation_time_at(zero + TimeDelta::days(2) - TimeDelta::seconds(1)),
            Some(later)
        );
    }

    #[test]
    fn test_window_contains() {
        let t0 = DateTime::<Utc>::UNIX_EPOCH;
        let window = AvailabilityWindow {
            start: Some(t0),
            end: Some(t0 + TimeDelta::seconds(10)),
        };
        assert!(window.contains(t0));
        assert!(!window.contains(t0 + TimeDelta::seconds(10)));
        assert!(AvailabilityWindow::unbounded().contains(t0));
    }
}

use crate::{
    codec::{Node, NodeReader, NodeWriter},
    element::{Element, Extras},
    error::{InvalidReason, MpdError, MpdResult, ParseReason},
};

/// One `S` element of a `SegmentTimeline`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S {
    /// Explicit start time in timescale units.
    pub t: Option<u64>,
    pub n: Option<u64>,
    pub d: u64,
    /// Number of additional segments with the same duration; `-1` repeats until the
    /// next `S@t`, the period end or "now".
    pub r: Option<i64>,
    pub k: Option<u64>,
    pub extras: Extras,
}

impl S {
    pub fn new(t: Option<u64>, d: u64, r: i64) -> Self {
        Self {
            t,
            n: None,
            d,
            r: (r != 0).then_some(r),
            k: None,
            extras: Extras::default(),
        }
    }

    pub fn repeat(&self) -> i64 {
        self.r.unwrap_or(0)
    }
}

impl Node for S {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        let s = Self {
            t: reader.opt("t")?,
            n: reader.opt("n")?,
            d: reader.req("d")?,
            r: reader.opt("r")?,
            k: reader.opt("k")?,
            extras: reader.finish(),
        };
        if s.repeat() < -1 {
            return Err(MpdError::parse(
                "S",
                ParseReason::InvalidValue {
                    attribute: "r".to_string(),
                    value: s.repeat().to_string(),
                    expected: "repeat count >= -1".to_string(),
                },
            ));
        }
        Ok(s)
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .attr("t", self.t.as_ref())
            .attr("n", self.n.as_ref())
            .req_attr("d", &self.d)
            .attr("r", self.r.as_ref())
            .attr("k", self.k.as_ref())
            .finish(&self.extras)
    }
}

/// A run-length encoded list of segment durations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentTimeline {
    pub entries: Vec<S>,
    pub extras: Extras,
}

/// One expanded segment of a timeline, in timescale units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineSegment {
    /// Zero-based position in the expanded timeline.
    pub index: u64,
    pub time: u64,
    pub duration: u64,
}

impl TimelineSegment {
    pub fn end(&self) -> u64 {
        self.time.saturating_add(self.duration)
    }
}

/// The segments one `S` entry expands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Run {
    /// Index of the first segment of the run.
    first: u64,
    time: u64,
    duration: u64,
    /// `None` when the entry repeats without a bound.
    count: Option<u64>,
}

impl Run {
    /// Segments that fit before the media timeline runs out of `u64`.
    fn limit(&self) -> u64 {
        let fits = (u64::MAX - self.time) / self.duration.max(1);
        self.count.map_or(fits, |count| count.min(fits))
    }

    fn segment(&self, offset: u64) -> TimelineSegment {
        TimelineSegment {
            index: self.first.saturating_add(offset),
            time: self.time + offset * self.duration,
            duration: self.duration,
        }
    }
}

/// Walks the entries of a timeline without expanding them.
struct Runs<'a> {
    entries: &'a [S],
    end: Option<u64>,
    entry: usize,
    time: u64,
    index: u64,
    done: bool,
}

impl Iterator for Runs<'_> {
    type Item = Run;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let s = self.entries.get(self.entry)?;
        let time = s.t.unwrap_or(self.time);
        let count = if s.repeat() >= 0 {
            Some(s.repeat() as u64 + 1)
        } else {
            self.entries
                .get(self.entry + 1)
                .and_then(|next| next.t)
                .or(self.end)
                // every segment starting before the boundary
                .map(|boundary| boundary.saturating_sub(time).div_ceil(s.d.max(1)))
        };
        let run = Run {
            first: self.index,
            time,
            duration: s.d,
            count,
        };

        let limit = run.limit();
        if run.count != Some(limit) {
            // unbounded, or the media timeline overflows inside this run
            self.done = true;
        }
        self.entry += 1;
        self.time = time + limit * s.d;
        self.index = self.index.saturating_add(limit);
        Some(run)
    }
}

impl SegmentTimeline {
    pub fn new(entries: Vec<S>) -> Self {
        Self {
            entries,
            extras: Extras::default(),
        }
    }

    /// Checks the ordering rules that expansion relies on.
    pub fn validate(&self) -> MpdResult<()> {
        let invalid = |reason: String| {
            MpdError::invalid("SegmentTimeline", InvalidReason::Constraint(reason))
        };

        let mut next_time = 0u64;
        for (i, s) in self.entries.iter().enumerate() {
            if s.d == 0 {
                return Err(invalid(format!("S[{i}] has a zero duration")));
            }
            if let Some(t) = s.t {
                if t < next_time {
                    return Err(invalid(format!(
                        "S[{i}]@t={t} overlaps the previous segment ending at {next_time}"
                    )));
                }
                next_time = t;
            }
            if s.repeat() < 0 {
                match self.entries.get(i + 1) {
                    Some(next) => match next.t {
                        Some(t) => next_time = t,
                        None => {
                            return Err(invalid(format!(
                                "S[{i}]@r=-1 must be followed by an S with @t"
                            )))
                        }
                    },
                    None => return Ok(()),
                }
            } else {
                next_time = next_time.saturating_add(s.d.saturating_mul(s.repeat() as u64 + 1));
            }
        }
        Ok(())
    }

    fn runs(&self, end: Option<u64>) -> Runs<'_> {
        Runs {
            entries: &self.entries,
            end,
            entry: 0,
            time: 0,
            index: 0,
            done: false,
        }
    }

    /// Expands the timeline. `end` bounds a trailing `@r=-1`; without it the last entry
    /// repeats until the media timeline overflows.
    pub fn iter(&self, end: Option<u64>) -> TimelineIter<'_> {
        TimelineIter {
            runs: self.runs(end),
            run: None,
            offset: 0,
        }
    }

    /// Whether expansion never ends for the given bound.
    pub fn is_unbounded(&self, end: Option<u64>) -> bool {
        end.is_none() && self.entries.last().is_some_and(|s| s.repeat() < 0)
    }

    /// Number of segments, or `None` when the expansion is unbounded.
    pub fn len(&self, end: Option<u64>) -> Option<u64> {
        if self.is_unbounded(end) {
            return None;
        }
        Some(
            self.runs(end)
                .fold(0u64, |len, run| len.saturating_add(run.limit())),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The segment at `index`, found without expanding the entries before it.
    pub fn segment(&self, index: u64, end: Option<u64>) -> Option<TimelineSegment> {
        self.runs(end)
            .take_while(|run| run.first <= index)
            .find(|run| index - run.first < run.limit())
            .map(|run| run.segment(index - run.first))
    }

    /// The segment whose `[time, time + duration)` contains `time`.
    pub fn segment_at(&self, time: u64, end: Option<u64>) -> Option<TimelineSegment> {
        self.runs(end)
            .take_while(|run| run.time <= time)
            .find_map(|run| {
                let offset = (time - run.time) / run.duration.max(1);
                (offset < run.limit()).then(|| run.segment(offset))
            })
    }
}

pub struct TimelineIter<'a> {
    runs: Runs<'a>,
    run: Option<Run>,
    offset: u64,
}

impl Iterator for TimelineIter<'_> {
    type Item = TimelineSegment;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.run {
                Some(run) if self.offset < run.limit() => {
                    let segment = run.segment(self.offset);
                    self.offset += 1;
                    return Some(segment);
                }
                _ => {
                    self.run = Some(self.runs.next()?);
                    self.offset = 0;
                }
            }
        }
    }
}

impl Node for SegmentTimeline {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            entries: reader.children("S")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .children("S", &self.entries)
            .finish(&self.extras)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts(timeline: &SegmentTimeline, end: Option<u64>) -> Vec<(u64, u64)> {
        timeline.iter(end).map(|s| (s.time, s.duration)).collect()
    }

    #[test]
    fn test_expand_repeat() {
        let timeline = SegmentTimeline::new(vec![S::new(Some(0), 10, 2), S::new(Some(30), 5, 0)]);
        assert_eq!(
            starts(&timeline, None),
            vec![(0, 10), (10, 10), (20, 10), (30, 5)]
        );
        assert_eq!(timeline.len(None), Some(4));
        assert_eq!(timeline.segment(3, None).map(|s| s.time), Some(30));
        assert_eq!(timeline.segment(4, None), None);
    }

    #[test]
    fn test_implicit_start() {
        let timeline = SegmentTimeline::new(vec![S::new(Some(100), 10, 1), S::new(None, 20, 0)]);
        assert_eq!(starts(&timeline, None), vec![(100, 10), (110, 10), (120, 20)]);
    }

    #[test]
    fn test_negative_repeat_until_next() {
        let timeline = SegmentTimeline::new(vec![S::new(Some(0), 4, -1), S::new(Some(10), 5, 0)]);
        // segments starting at 0, 4 and 8 begin before the next S@t
        assert_eq!(starts(&timeline, None), vec![(0, 4), (4, 4), (8, 4), (10, 5)]);
    }

    #[test]
    fn test_negative_repeat_until_end() {
        let timeline = SegmentTimeline::new(vec![S::new(Some(0), 10, -1)]);
        assert!(timeline.is_unbounded(None));
        assert_eq!(timeline.len(None), None);
        assert_eq!(timeline.len(Some(35)), Some(4));
        assert_eq!(timeline.len(Some(30)), Some(3));
        // unbounded expansion is still usable lazily
        assert_eq!(timeline.segment(1000, None).map(|s| s.time), Some(10000));
    }

    #[test]
    fn test_far_index_without_expansion() {
        let timeline = SegmentTimeline::new(vec![S::new(Some(0), 4, 9), S::new(None, 10, -1)]);
        let segment = timeline.segment(1_000_000_000_000_000, None).unwrap();
        assert_eq!(segment.time, 40 + (1_000_000_000_000_000 - 10) * 10);
        assert_eq!(timeline.segment_at(segment.time + 3, None), Some(segment));
    }

    #[test]
    fn test_media_time_overflow() {
        let start = u64::MAX - 2500;
        let timeline = SegmentTimeline::new(vec![S::new(Some(start), 1000, -1)]);
        // only the segments that end before u64::MAX exist
        assert_eq!(starts(&timeline, None), vec![(start, 1000), (start + 1000, 1000)]);
        assert_eq!(timeline.segment(2, None), None);
        assert_eq!(timeline.segment_at(u64::MAX - 10, None), None);

        let timeline = SegmentTimeline::new(vec![S::new(Some(u64::MAX - 600), 1000, 5)]);
        assert_eq!(timeline.len(None), Some(0));
        assert_eq!(timeline.iter(None).next(), None);
    }

    #[test]
    fn test_segment_at() {
        let timeline = SegmentTimeline::new(vec![S::new(Some(0), 10, 2), S::new(Some(40), 5, 0)]);
        assert_eq!(timeline.segment_at(15, None).map(|s| s.index), Some(1));
        assert_eq!(timeline.segment_at(30, None), None);
        assert_eq!(timeline.segment_at(42, None).map(|s| s.index), Some(3));
        assert_eq!(timeline.segment_at(45, None), None);
    }

    #[test]
    fn test_validate() {
        let overlapping =
            SegmentTimeline::new(vec![S::new(Some(0), 10, 2), S::new(Some(20), 5, 0)]);
        assert!(overlapping.validate().is_err());

        let open_middle = SegmentTimeline::new(vec![S::new(Some(0), 10, -1), S::new(None, 5, 0)]);
        assert!(open_middle.validate().is_err());

        let fine = SegmentTimeline::new(vec![S::new(Some(0), 10, -1), S::new(Some(50), 5, -1)]);
        assert!(fine.validate().is_ok());
    }

    #[test]
    fn test_missing_duration() {
        let element = Element::new("S").with_attribute("t", "0");
        assert!(S::decode(&element).is_err());
        let element = Element::new("S").with_attribute("d", "1").with_attribute("r", "-2");
        assert!(S::decode(&element).is_err());
    }
}

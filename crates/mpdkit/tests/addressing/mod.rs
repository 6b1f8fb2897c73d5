use chrono::{DateTime, TimeDelta, Utc};
use mpdkit::{addressing::AddressingScheme, values::Rational, ErrorKind, Manifest, ResolveContext};

use crate::{AssertWrapper, LIVE_MPD, STATIC_MPD};

fn t0() -> DateTime<Utc> {
    "2024-01-01T00:00:00Z".parse().unwrap()
}

#[test]
fn test_template_number_padding() -> anyhow::Result<()> {
    let manifest = Manifest::from_xml(STATIC_MPD)?;
    let v0 = manifest.representations().next().assert_success();
    let resolver = v0.segments(&ResolveContext::new())?;
    assert_eq!(resolver.scheme(), AddressingScheme::Template);

    // 60s period in 4s segments
    assert_eq!(resolver.segment_count()?, Some(15));

    let first = resolver.segment(0)?;
    assert_eq!(first.number, 7);
    assert_eq!(first.url.as_str(), "https://a/x/y/seg-v0-00007.m4s");
    assert_eq!(first.duration, Some(Rational::from(4u64)));

    let init = resolver.initialization()?.assert_success();
    assert_eq!(init.url.as_str(), "https://a/x/y/init-v0.mp4");

    let by_number = resolver.segment_by_number(10)?;
    assert_eq!(by_number.index, 3);
    assert_eq!(by_number.start, Rational::from(12u64));

    let error = resolver.segment_by_number(6).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Range);
    let error = resolver.segment(15).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Range);
    Ok(())
}

#[test]
fn test_timeline_segments() -> anyhow::Result<()> {
    let manifest = Manifest::from_xml(STATIC_MPD)?;
    let a0 = manifest.representations().nth(2).assert_success();
    let resolver = a0.segments(&ResolveContext::new())?;
    assert_eq!(resolver.scheme(), AddressingScheme::Timeline);

    let segments = resolver.segments()?.collect::<Result<Vec<_>, _>>()?;
    let starts: Vec<Rational> = segments.iter().map(|s| s.start).collect();
    let durations: Vec<Rational> = segments.iter().filter_map(|s| s.duration).collect();
    assert_eq!(starts, [0u64, 10, 20, 30].map(Rational::from));
    assert_eq!(durations, [10u64, 10, 10, 5].map(Rational::from));
    assert_eq!(segments[3].url.as_str(), "https://a/x/y/audio-30.m4s");
    assert_eq!(segments[3].time, Some(30));

    let at = resolver.segment_at(Rational::from(25u64))?.assert_success();
    assert_eq!(at.index, 2);
    // past the last timeline entry
    resolver.segment_at(Rational::from(40u64))?.assert_error();
    Ok(())
}

#[test]
fn test_live_availability() -> anyhow::Result<()> {
    let manifest = Manifest::from_xml(LIVE_MPD)?;
    let v0 = manifest.representations().next().assert_success();

    let now = t0() + TimeDelta::seconds(200);
    let resolver = v0.segments(&ResolveContext::new().at(now))?;
    assert_eq!(resolver.segment_count()?, Some(20));

    // segment ending at 100s
    let segment = resolver.segment(9)?;
    assert_eq!(segment.end(), Some(Rational::from(100u64)));
    assert_eq!(segment.url.as_str(), "https://cdn.example.com/live/v0/10.m4s");

    let window = resolver.availability_window(&segment);
    assert_eq!(window.start, Some(t0() + TimeDelta::seconds(100)));
    assert_eq!(window.end, Some(t0() + TimeDelta::seconds(160)));

    assert!(!resolver.is_available(&segment, t0() + TimeDelta::seconds(99)));
    assert!(resolver.is_available(&segment, t0() + TimeDelta::seconds(100)));
    assert!(resolver.is_available(&segment, t0() + TimeDelta::seconds(159)));
    assert!(!resolver.is_available(&segment, t0() + TimeDelta::seconds(160)));
    Ok(())
}

#[test]
fn test_live_without_clock() -> anyhow::Result<()> {
    let manifest = Manifest::from_xml(LIVE_MPD)?;
    let v0 = manifest.representations().next().assert_success();
    let resolver = v0.segments(&ResolveContext::new())?;

    assert_eq!(resolver.segment_count()?, None);
    // lazily open ended
    let numbers: Vec<u64> = resolver
        .segments()?
        .take(3)
        .map(|s| s.map(|s| s.number))
        .collect::<Result<_, _>>()?;
    assert_eq!(numbers, [1, 2, 3]);
    Ok(())
}

#[test]
fn test_static_availability_is_unbounded() -> anyhow::Result<()> {
    let manifest = Manifest::from_xml(STATIC_MPD)?;
    let v0 = manifest.representations().next().assert_success();
    let resolver = v0.segments(&ResolveContext::new())?;
    let segment = resolver.segment(0)?;
    assert!(resolver.is_available(&segment, t0()));
    Ok(())
}

#[test]
fn test_timeline_near_end_of_media_time() -> anyhow::Result<()> {
    let manifest = Manifest::from_xml(&LIVE_MPD.replace(
        r#"<SegmentTemplate timescale="1" duration="10" startNumber="1" media="$RepresentationID$/$Number$.m4s"/>"#,
        r#"<SegmentTemplate timescale="1000" media="$Time$.m4s">
        <SegmentTimeline>
          <S t="18446744073709549000" d="1000" r="-1"/>
        </SegmentTimeline>
      </SegmentTemplate>"#,
    ))?;
    let v0 = manifest.representations().next().assert_success();
    let resolver = v0.segments(&ResolveContext::new())?;
    assert_eq!(resolver.scheme(), AddressingScheme::Timeline);
    assert_eq!(resolver.segment_count()?, None);

    // two segments end before the media timeline runs out, the third would not
    let last = resolver.segment(1)?;
    assert_eq!(last.time, Some(18446744073709550000));
    let error = resolver.segment(2).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Range);
    assert_eq!(resolver.segments()?.count(), 2);

    // a far index is answered without walking the timeline
    resolver.segment(u64::MAX - 1).assert_error();
    Ok(())
}

use chrono::{DateTime, TimeDelta, Utc};
use mpdkit::{values::Rational, ErrorKind, Manifest};

use crate::{AssertWrapper, LIVE_MPD};

const MULTI_PERIOD: &str = r#"<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" profiles="urn:mpeg:dash:profile:isoff-on-demand:2011" minBufferTime="PT1.5S" mediaPresentationDuration="PT1M30S">
  <Period id="intro" duration="PT30S"/>
  <Period id="main" duration="PT20S"/>
  <Period id="credits" start="PT60S"/>
</MPD>"#;

fn at(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

#[test]
fn test_period_timeline() -> anyhow::Result<()> {
    let manifest = Manifest::from_xml(MULTI_PERIOD)?;
    let seconds = |s: u64| Rational::from(s);

    assert_eq!(manifest.period_start(0)?, seconds(0));
    assert_eq!(manifest.period_start(1)?, seconds(30));
    assert_eq!(manifest.period_start(2)?, seconds(60));
    // the last period runs until mediaPresentationDuration
    assert_eq!(manifest.period_duration(2)?, Some(seconds(30)));
    assert_eq!(manifest.period_end(1)?, Some(seconds(50)));

    let period = manifest.period_at(seconds(45)).assert_success();
    assert_eq!(period.period.id.as_deref(), Some("main"));
    // the gap between main and credits belongs to no period
    manifest.period_at(seconds(55)).assert_error();
    manifest.period_at(seconds(90)).assert_error();

    let error = manifest.period_start(3).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Range);
    Ok(())
}

#[test]
fn test_static_has_no_wall_clock() -> anyhow::Result<()> {
    let manifest = Manifest::from_xml(MULTI_PERIOD)?;
    manifest.wall_clock_at(Rational::ZERO).assert_error();
    let window = manifest.static_availability();
    assert!(window.contains(at("1970-01-01T00:00:00Z")));
    Ok(())
}

#[test]
fn test_live_wall_clock() -> anyhow::Result<()> {
    let manifest = Manifest::from_xml(LIVE_MPD)?;
    assert!(manifest.is_dynamic());

    let t0 = at("2024-01-01T00:00:00Z");
    assert_eq!(
        manifest.wall_clock_at(Rational::from(90u64)),
        Some(t0 + TimeDelta::seconds(90))
    );
    assert_eq!(
        manifest.presentation_time_at(t0 + TimeDelta::milliseconds(2500)),
        Some(Rational::new(5, 2))
    );
    // a live period stays open
    assert_eq!(manifest.period_duration(0)?, None);
    Ok(())
}

#[test]
fn test_leap_second_during_presentation() -> anyhow::Result<()> {
    let manifest = Manifest::from_xml(
        r#"<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" profiles="urn:mpeg:dash:profile:isoff-live:2011" type="dynamic" availabilityStartTime="2016-12-31T23:59:00Z" minBufferTime="PT2S">
  <Period id="p0" start="PT0S"/>
  <LeapSecondInformation availabilityStartLeapOffset="36" nextAvailabilityStartLeapOffset="37" nextLeapChangeTime="2017-01-01T00:00:00Z"/>
</MPD>"#,
    )?;

    // before the change civil time and the timeline agree
    assert_eq!(
        manifest.wall_clock_at(Rational::from(30u64)),
        Some(at("2016-12-31T23:59:30Z"))
    );
    // after it civil time lags one second behind
    let civil = at("2017-01-01T00:00:59Z");
    assert_eq!(manifest.wall_clock_at(Rational::from(120u64)), Some(civil));
    assert_eq!(
        manifest.presentation_time_at(civil),
        Some(Rational::from(120u64))
    );
    Ok(())
}

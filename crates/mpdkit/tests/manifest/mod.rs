use mpdkit::{
    base::Attribute,
    values::{FrameRate, Rational},
    BaseUrlPolicy, Element, ErrorKind, InsertPosition, Manifest,
};

use crate::{AssertWrapper, LIVE_MPD, REMOTE_MPD, STATIC_MPD};

const INTERLEAVED_MPD: &str = r#"<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" xmlns:ext="urn:example:ext" profiles="urn:mpeg:dash:profile:isoff-on-demand:2011" minBufferTime="PT1.5S">
  <ProgramInformation lang="en">
    <ext:Note>kept as written</ext:Note>
    <Title>Demo</Title>
  </ProgramInformation>
  <Period id="p0" duration="PT10S"/>
  <ext:Marker at="10"/>
  <Period id="p1" duration="PT5S">
    <AdaptationSet id="1" mimeType="video/mp4">
      <Representation id="v0" bandwidth="500000"/>
      <ext:Between/>
      <Representation id="v1" bandwidth="900000"/>
    </AdaptationSet>
  </Period>
  <BaseURL>https://late.example.com/</BaseURL>
</MPD>"#;

#[test]
fn test_build_serialize_round_trip() -> anyhow::Result<()> {
    let manifest = Manifest::from_xml(STATIC_MPD)?;
    let rebuilt = Manifest::build(&manifest.serialize()).assert_success();
    assert_eq!(rebuilt, manifest);

    // the same through text
    let rebuilt = Manifest::from_xml(&manifest.to_xml()?)?;
    assert_eq!(rebuilt, manifest);
    Ok(())
}

#[test]
fn test_element_round_trip() -> anyhow::Result<()> {
    for source in [STATIC_MPD, LIVE_MPD, REMOTE_MPD, INTERLEAVED_MPD] {
        let element = mpdkit::xml::parse(source)?;
        let manifest = Manifest::build(&element).assert_success();
        assert_eq!(manifest.serialize(), element);
    }
    Ok(())
}

#[test]
fn test_interleaved_children_keep_their_place() -> anyhow::Result<()> {
    let manifest = Manifest::from_xml(INTERLEAVED_MPD)?;
    let element = manifest.serialize();
    let names: Vec<&str> = element.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        ["ProgramInformation", "Period", "ext:Marker", "Period", "BaseURL"]
    );

    let note = &element.children[0].children[0];
    assert_eq!(note.name, "ext:Note");
    assert_eq!(note.text.as_deref(), Some("kept as written"));

    // an edit moves nothing else around
    let mut edited = manifest.clone();
    edited.set_attribute("/MPD/Period[@id='p1']", "duration", "PT6S")?;
    let element = edited.serialize();
    let names: Vec<&str> = element.children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        ["ProgramInformation", "Period", "ext:Marker", "Period", "BaseURL"]
    );
    Ok(())
}

#[test]
fn test_non_canonical_numbers_rejected() -> anyhow::Result<()> {
    for width in ["0640", "+640"] {
        let error = Manifest::from_xml(
            &STATIC_MPD.replace(r#"width="1280""#, &format!(r#"width="{width}""#)),
        )
        .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Parse);
    }
    Ok(())
}

#[test]
fn test_overlong_duration_rejected() -> anyhow::Result<()> {
    let error = Manifest::from_xml(&STATIC_MPD.replace(
        r#"mediaPresentationDuration="PT60S""#,
        r#"mediaPresentationDuration="P99999999999999999999999999999999999999Y""#,
    ))
    .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Parse);
    Ok(())
}

#[test]
fn test_foreign_content_survives() -> anyhow::Result<()> {
    let manifest = Manifest::from_xml(STATIC_MPD)?;
    assert_eq!(
        manifest.extras.attributes.get("ext:origin").map(String::as_str),
        Some("encoder-7")
    );

    let element = manifest.serialize();
    assert_eq!(element.attribute("ext:origin"), Some("encoder-7"));
    assert_eq!(element.attribute("xmlns:ext"), Some("urn:example:ext"));

    let adaptation_set = element
        .children_named("Period")
        .next()
        .and_then(|period| period.children_named("AdaptationSet").next())
        .assert_success();
    let analytics = adaptation_set
        .children_named("ext:Analytics")
        .next()
        .assert_success();
    assert_eq!(analytics.attribute("beacon"), Some("https://a/beacon"));
    Ok(())
}

#[test]
fn test_lexical_form_kept() -> anyhow::Result<()> {
    let manifest = Manifest::from_xml(STATIC_MPD)?;
    let element = manifest.serialize();
    assert_eq!(element.attribute("minBufferTime"), Some("PT2.000S"));
    assert_eq!(element.attribute("mediaPresentationDuration"), Some("PT60S"));
    Ok(())
}

#[test]
fn test_frame_rate_override() -> anyhow::Result<()> {
    let manifest = Manifest::from_xml(STATIC_MPD)?;
    let video = manifest.period(0).and_then(|p| p.adaptation_set(0)).assert_success();

    let v0 = video.representation_by_id("v0").assert_success();
    assert_eq!(v0.frame_rate(), Some(FrameRate::new(30000, Some(1001))));
    assert_eq!(v0.mime_type(), Some("video/mp4"));
    assert!(v0.codecs().is_some_and(|c| c.contains("avc1.64001f")));

    let v1 = video.representation_by_id("v1").assert_success();
    assert_eq!(v1.frame_rate(), Some(FrameRate::new(60, None)));
    assert!(v1.effective(Attribute::FrameRate).is_some());
    assert_eq!(v1.width(), Some(1920));
    Ok(())
}

#[test]
fn test_representations_in_document_order() -> anyhow::Result<()> {
    let manifest = Manifest::from_xml(STATIC_MPD)?;
    let ids: Vec<&str> = manifest.representations().map(|r| r.id()).collect();
    assert_eq!(ids, ["v0", "v1", "a0"]);

    let audio = manifest.period(0).and_then(|p| p.adaptation_set(1)).assert_success();
    let a0 = audio.representation_by_id("a0").assert_success();
    assert_eq!(a0.lang(), Some("en"));
    assert!(manifest.period(1).is_none());
    Ok(())
}

#[test]
fn test_base_url_chain() -> anyhow::Result<()> {
    let manifest = Manifest::from_xml(STATIC_MPD)?;
    let v0 = manifest.representations().next().assert_success();
    let base = v0.base_url(None, &BaseUrlPolicy::First)?;
    assert_eq!(base.url.as_str(), "https://a/x/y/");
    Ok(())
}

#[test]
fn test_conflicting_addressing_rejected() {
    let element = Element::new("MPD")
        .with_attribute("profiles", "urn:mpeg:dash:profile:full:2011")
        .with_attribute("minBufferTime", "PT2S")
        .with_child(
            Element::new("Period").with_child(
                Element::new("AdaptationSet").with_child(
                    Element::new("Representation")
                        .with_attribute("id", "r")
                        .with_attribute("bandwidth", "1000")
                        .with_child(
                            Element::new("SegmentList")
                                .with_attribute("duration", "2")
                                .with_child(Element::new("SegmentURL").with_attribute("media", "a.m4s")),
                        )
                        .with_child(
                            Element::new("SegmentTemplate").with_attribute("media", "$Number$.m4s"),
                        ),
                ),
            ),
        );

    let error = Manifest::build(&element).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Invalid);
}

#[test]
fn test_malformed_documents() {
    Manifest::from_xml("<MPD><Period></MPD>").assert_error();
    // profiles and minBufferTime are required
    Manifest::from_xml(r#"<MPD><Period/></MPD>"#).assert_error();
    // a dynamic presentation needs availabilityStartTime
    let error = Manifest::from_xml(
        r#"<MPD profiles="urn:mpeg:dash:profile:isoff-live:2011" type="dynamic" minBufferTime="PT2S"><Period start="PT0S"/></MPD>"#,
    )
    .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Invalid);

    let error = Manifest::from_xml(
        r#"<MPD profiles="urn:mpeg:dash:profile:isoff-live:2011" minBufferTime="PT2S" type="live"><Period/></MPD>"#,
    )
    .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Parse);
}

#[test]
fn test_edit_all_or_nothing() -> anyhow::Result<()> {
    let mut manifest = Manifest::from_xml(STATIC_MPD)?;
    let before = manifest.clone();

    // a second representation with an existing id makes the period invalid
    let duplicate = Element::new("Representation")
        .with_attribute("id", "v0")
        .with_attribute("bandwidth", "1");
    let error = manifest
        .insert_child(
            "/MPD/Period[@id='p0']/AdaptationSet[@id='1']",
            InsertPosition::Append,
            duplicate,
        )
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Invalid);
    assert_eq!(manifest, before);

    manifest.remove_child("/MPD/Period/AdaptationSet[@id='2']")?;
    manifest.set_attribute("/MPD/Period[1]", "start", "PT0S")?;
    let period = manifest.period(0).assert_success();
    assert_eq!(period.adaptation_sets().count(), 1);
    assert_eq!(period.start()?, Rational::ZERO);

    manifest.remove_attribute("/MPD/Period", "start")?;
    assert!(manifest.periods[0].start.is_none());

    manifest.remove_child("/MPD/Period[@id='nope']").assert_error();
    Ok(())
}

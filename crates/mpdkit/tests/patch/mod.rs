use std::sync::Arc;

use mpdkit::{values::Rational, ErrorKind, Manifest, ManifestHandle, Patch, ResolveContext};

use crate::{AssertWrapper, LIVE_MPD, PATCH_XML};

#[test]
fn test_apply_patch() -> anyhow::Result<()> {
    let patch = Patch::from_xml(PATCH_XML)?;
    assert_eq!(patch.operations.len(), 3);

    let mut manifest = Manifest::from_xml(LIVE_MPD)?;
    patch.apply(&mut manifest)?;

    let element = manifest.serialize();
    assert_eq!(element.attribute("minimumUpdatePeriod"), Some("PT4S"));
    assert_eq!(element.attribute("publishTime"), Some("2024-01-01T00:01:00Z"));
    assert!(manifest.locations.is_empty());

    let ids: Vec<Option<&str>> = manifest.periods.iter().map(|p| p.id.as_deref()).collect();
    assert_eq!(ids, [Some("p0"), Some("p1")]);
    // p0 now ends where p1 starts
    assert_eq!(manifest.period_duration(0)?, Some(Rational::from(60u64)));

    let p1 = manifest.period(1).and_then(|p| p.adaptation_set(0)).assert_success();
    let v0 = p1.representation_by_id("v0").assert_success();
    let segment = v0.segments(&ResolveContext::new())?.segment(0)?;
    assert_eq!(
        segment.url.as_str(),
        "https://cdn.example.com/live/p1/v0/1.m4s"
    );
    Ok(())
}

#[test]
fn test_patch_for_other_manifest() -> anyhow::Result<()> {
    let patch = Patch::from_xml(PATCH_XML)?;
    let mut manifest = Manifest::from_xml(&LIVE_MPD.replace(r#"id="live""#, r#"id="other""#))?;
    let before = manifest.clone();

    let error = patch.apply(&mut manifest).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Invalid);
    assert_eq!(manifest, before);
    Ok(())
}

#[test]
fn test_failed_patch_changes_nothing() -> anyhow::Result<()> {
    // the second operation points at nothing, so the first one is not kept either
    let patch = Patch::from_xml(
        r#"<Patch mpdId="live" originalPublishTime="2024-01-01T00:00:00Z">
  <replace sel="/MPD/@minimumUpdatePeriod">PT8S</replace>
  <remove sel="/MPD/Period[@id='missing']"/>
</Patch>"#,
    )?;
    let mut manifest = Manifest::from_xml(LIVE_MPD)?;
    let before = manifest.clone();

    patch.apply(&mut manifest).assert_error();
    assert_eq!(manifest, before);
    Ok(())
}

#[test]
fn test_handle_refresh_with_patch() -> anyhow::Result<()> {
    let handle = ManifestHandle::new(Manifest::from_xml(LIVE_MPD)?);
    let reader: Arc<Manifest> = handle.snapshot();

    let patch = Patch::from_xml(PATCH_XML)?;
    let updated = handle.apply_patch(&patch)?;
    assert_eq!(updated.periods.len(), 2);

    // a reader holding the old snapshot is not affected
    assert_eq!(reader.periods.len(), 1);
    assert_eq!(handle.snapshot().periods.len(), 2);

    // the same patch no longer matches the new publish time
    handle.apply_patch(&patch).assert_error();
    assert_eq!(handle.snapshot().periods.len(), 2);
    Ok(())
}

#[test]
fn test_concurrent_patches_apply_once() -> anyhow::Result<()> {
    let handle = ManifestHandle::new(Manifest::from_xml(LIVE_MPD)?);
    let patch = Patch::from_xml(PATCH_XML)?;

    // both writers patch the same publish time, only one of them can win
    let results: Vec<_> = std::thread::scope(|scope| {
        let writers: Vec<_> = (0..2)
            .map(|_| scope.spawn(|| handle.apply_patch(&patch)))
            .collect();
        writers
            .into_iter()
            .map(|writer| writer.join().expect("patch thread panicked"))
            .collect()
    });

    let applied: Vec<&Arc<Manifest>> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(applied.len(), 1);
    assert!(Arc::ptr_eq(applied[0], &handle.snapshot()));
    assert_eq!(handle.snapshot().periods.len(), 2);
    Ok(())
}

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex},
    time::Duration,
};

use bytes::Bytes;
use mpdkit::{
    values::Rational,
    xlink::{build_resolved, XLinkState, XLinkTarget},
    Element, ErrorKind, Fetcher, Manifest, MpdError, MpdResult, ResolverConfig, XLinkConfig,
    XLinkFailurePolicy, XLinkResolver,
};
use url::Url;

use crate::{init_test_tracing, AssertWrapper, REMOTE_MPD};

const VIDEO_SET: &str = r#"<AdaptationSet id="1" mimeType="video/mp4">
  <SegmentTemplate timescale="1" duration="2" media="$RepresentationID$/$Number$.m4s"/>
  <Representation id="v0" bandwidth="800000"/>
</AdaptationSet>"#;

const FIRST_BREAK: &str = r#"<Period id="ad1" duration="PT10S"/>
<Period id="ad2" duration="PT5S"/>"#;

#[derive(Clone, Copy)]
enum Reply {
    Body(&'static str, u64),
    Hang,
}

#[derive(Default)]
struct MemoryFetcher {
    replies: HashMap<String, Reply>,
    requests: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    fn reply(mut self, uri: &str, body: &'static str, delay_ms: u64) -> Self {
        self.replies.insert(uri.to_string(), Reply::Body(body, delay_ms));
        self
    }

    fn hang(mut self, uri: &str) -> Self {
        self.replies.insert(uri.to_string(), Reply::Hang);
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch(&self, uri: &Url) -> impl Future<Output = MpdResult<Bytes>> + Send {
        self.requests.lock().unwrap().push(uri.to_string());
        let reply = self.replies.get(uri.as_str()).copied();
        let uri = uri.to_string();
        async move {
            match reply {
                Some(Reply::Body(body, delay_ms)) => {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    Ok(Bytes::from_static(body.as_bytes()))
                }
                Some(Reply::Hang) => std::future::pending().await,
                None => Err(MpdError::Fetch {
                    uri,
                    reason: "HTTP status 404 Not Found".to_string(),
                }),
            }
        }
    }
}

fn fetcher() -> MemoryFetcher {
    // the slower fetch finishes last but is still spliced in document order
    MemoryFetcher::default()
        .reply("https://ads.example.com/breaks/first.xml", FIRST_BREAK, 50)
        .reply("https://ads.example.com/sets/video.xml", VIDEO_SET, 0)
}

fn config(failure_policy: XLinkFailurePolicy) -> ResolverConfig {
    ResolverConfig {
        xlink: XLinkConfig {
            failure_policy,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn period_ids(manifest: &Manifest) -> Vec<Option<&str>> {
    manifest.periods.iter().map(|p| p.id.as_deref()).collect()
}

#[tokio::test]
async fn test_resolve_on_load() -> anyhow::Result<()> {
    init_test_tracing();
    let fetcher = Arc::new(fetcher());
    let resolver = XLinkResolver::new(fetcher.clone(), ResolverConfig::default());
    let element = mpdkit::xml::parse(REMOTE_MPD)?;
    let (manifest, reports) = build_resolved(&element, &resolver, None).await?;

    assert_eq!(reports.len(), 3);
    assert!(reports.iter().all(|r| r.error.is_none()));
    assert!(reports.iter().all(|r| r.state == XLinkState::Resolved));

    // the resolve-to-zero period is gone, the onRequest one stays a placeholder
    assert_eq!(
        period_ids(&manifest),
        [Some("main"), Some("ad1"), Some("ad2"), None]
    );
    assert_eq!(manifest.pending_xlinks(), [XLinkTarget::Period(3)]);

    let main = manifest.period(0).assert_success();
    let video = main.adaptation_set(0).assert_success();
    assert!(video.adaptation_set.xlink.is_none());
    assert!(video.representation_by_id("v0").is_some());

    // inferred starts follow the spliced periods
    assert_eq!(manifest.period_start(1)?, Rational::from(30u64));
    assert_eq!(manifest.period_start(2)?, Rational::from(40u64));

    // resolve-to-zero needs no fetch
    let mut requests = fetcher.requests();
    requests.sort();
    assert_eq!(
        requests,
        [
            "https://ads.example.com/breaks/first.xml",
            "https://ads.example.com/sets/video.xml",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_failure_retained() -> anyhow::Result<()> {
    init_test_tracing();
    let resolver = XLinkResolver::new(fetcher(), config(XLinkFailurePolicy::RetainAndReport));
    let mut manifest = Manifest::from_xml(REMOTE_MPD)?;
    resolver.resolve_on_load(&mut manifest, None).await;

    let report = resolver
        .resolve(&mut manifest, XLinkTarget::Period(3), None)
        .await;
    let error = report.error.assert_success();
    assert_eq!(error.kind(), ErrorKind::Fetch);
    assert!(matches!(report.state, XLinkState::Failed(_)));

    let placeholder = manifest.periods[3].xlink.as_ref().assert_success();
    assert!(matches!(placeholder.state, XLinkState::Failed(_)));
    // still pending, a later attempt may succeed
    assert_eq!(manifest.pending_xlinks(), [XLinkTarget::Period(3)]);

    // the placeholder serializes as it was declared
    let element = manifest.serialize();
    let last = element.children_named("Period").last().assert_success();
    assert_eq!(last.attribute("xlink:href"), Some("breaks/later.xml"));
    Ok(())
}

#[tokio::test]
async fn test_failure_removed() -> anyhow::Result<()> {
    init_test_tracing();
    let resolver = XLinkResolver::new(fetcher(), config(XLinkFailurePolicy::Remove));
    let mut manifest = Manifest::from_xml(REMOTE_MPD)?;
    resolver.resolve_on_load(&mut manifest, None).await;

    let report = resolver
        .resolve(&mut manifest, XLinkTarget::Period(3), None)
        .await;
    assert!(report.error.is_some());
    assert_eq!(period_ids(&manifest), [Some("main"), Some("ad1"), Some("ad2")]);
    assert!(manifest.pending_xlinks().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_fragment_of_wrong_kind() -> anyhow::Result<()> {
    init_test_tracing();
    let fetcher = MemoryFetcher::default()
        .reply("https://ads.example.com/breaks/first.xml", VIDEO_SET, 0)
        .reply("https://ads.example.com/sets/video.xml", VIDEO_SET, 0);
    let resolver = XLinkResolver::new(fetcher, ResolverConfig::default());
    let mut manifest = Manifest::from_xml(REMOTE_MPD)?;
    let reports = resolver.resolve_on_load(&mut manifest, None).await;

    let failed = reports
        .iter()
        .find(|r| r.target == XLinkTarget::Period(1))
        .assert_success();
    assert_eq!(
        failed.error.as_ref().map(MpdError::kind),
        Some(ErrorKind::Parse)
    );
    // the placeholder is kept where it was
    assert!(manifest.periods[1].is_placeholder());
    assert!(manifest.validate().is_ok());
    Ok(())
}

#[tokio::test]
async fn test_cancellation() -> anyhow::Result<()> {
    init_test_tracing();
    let fetcher = fetcher().hang("https://ads.example.com/breaks/later.xml");
    let resolver = XLinkResolver::new(fetcher, ResolverConfig::default());
    let mut manifest = Manifest::from_xml(REMOTE_MPD)?;
    resolver.resolve_on_load(&mut manifest, None).await;
    let before = manifest.clone();

    let token = resolver.cancellation_token();
    let (report, ()) = tokio::join!(
        resolver.resolve(&mut manifest, XLinkTarget::Period(3), None),
        async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        }
    );

    assert!(matches!(report.error, Some(MpdError::Cancelled)));
    assert_eq!(report.state, XLinkState::Unresolved);
    assert_eq!(manifest, before);
    Ok(())
}

#[tokio::test]
async fn test_resolve_on_request() -> anyhow::Result<()> {
    init_test_tracing();
    let fetcher = fetcher().reply(
        "https://ads.example.com/breaks/later.xml",
        r#"<Period id="ad3" duration="PT15S"/>"#,
        0,
    );
    let resolver = XLinkResolver::new(fetcher, ResolverConfig::default());
    let mut manifest = Manifest::from_xml(REMOTE_MPD)?;
    resolver.resolve_on_load(&mut manifest, None).await;

    let report = resolver
        .resolve(&mut manifest, XLinkTarget::Period(3), None)
        .await;
    assert!(report.error.is_none());
    assert_eq!(report.href, "breaks/later.xml");
    assert_eq!(
        period_ids(&manifest),
        [Some("main"), Some("ad1"), Some("ad2"), Some("ad3")]
    );
    assert!(manifest.pending_xlinks().is_empty());

    // fully resolved manifests round trip like any other
    let rebuilt = Manifest::build(&manifest.serialize())?;
    assert_eq!(rebuilt, manifest);
    Ok(())
}

#[test]
fn test_placeholder_without_href() {
    let element = Element::new("MPD")
        .with_attribute("profiles", "urn:mpeg:dash:profile:isoff-live:2011")
        .with_attribute("minBufferTime", "PT2S")
        .with_child(Element::new("Period").with_attribute("xlink:actuate", "onLoad"));
    let error = Manifest::build(&element).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Parse);
}

#[tokio::test]
async fn test_only_period_is_never_removed() -> anyhow::Result<()> {
    init_test_tracing();
    let source = r#"<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" xmlns:xlink="http://www.w3.org/1999/xlink" profiles="urn:mpeg:dash:profile:isoff-live:2011" minBufferTime="PT2S">
  <Period xlink:href="urn:mpeg:dash:resolve-to-zero:2013" xlink:actuate="onLoad"/>
</MPD>"#;

    for policy in [XLinkFailurePolicy::RetainAndReport, XLinkFailurePolicy::Remove] {
        let resolver = XLinkResolver::new(MemoryFetcher::default(), config(policy));
        let (manifest, reports) =
            build_resolved(&mpdkit::xml::parse(source)?, &resolver, None).await?;

        assert_eq!(reports.len(), 1);
        let error = reports[0].error.as_ref().assert_success();
        assert_eq!(error.kind(), ErrorKind::Invalid);
        assert!(matches!(reports[0].state, XLinkState::Failed(_)));

        // the placeholder stays, so the manifest can still be rebuilt and edited
        assert_eq!(manifest.periods.len(), 1);
        Manifest::build(&manifest.serialize()).assert_success();
    }
    Ok(())
}

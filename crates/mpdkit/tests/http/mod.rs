use mpdkit::{
    xlink::XLinkTarget, ErrorKind, Fetcher, HttpFetcher, Manifest, ResolverConfig, XLinkResolver,
};
use url::Url;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::{init_test_tracing, AssertWrapper};

async fn setup_mock_server(route: &str, status: u16, body: &str) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&mock_server)
        .await;

    mock_server
}

#[tokio::test]
async fn test_fetch_status() -> anyhow::Result<()> {
    init_test_tracing();
    let server = setup_mock_server("/missing.xml", 404, "not here").await;
    let fetcher = HttpFetcher::default();

    let uri = Url::parse(&format!("{}/missing.xml", server.uri()))?;
    let error = fetcher.fetch(&uri).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Fetch);
    Ok(())
}

#[tokio::test]
async fn test_resolve_relative_to_location() -> anyhow::Result<()> {
    init_test_tracing();
    let server = setup_mock_server(
        "/live/ads/break.xml",
        200,
        r#"<Period id="ad" duration="PT10S"/>"#,
    )
    .await;

    let mut manifest = Manifest::from_xml(
        r#"<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" xmlns:xlink="http://www.w3.org/1999/xlink" profiles="urn:mpeg:dash:profile:isoff-live:2011" minBufferTime="PT2S">
  <Period id="main" duration="PT30S"/>
  <Period xlink:href="ads/break.xml"/>
</MPD>"#,
    )?;
    // the manifest has no BaseURL, so the href resolves against where it came from
    let location = Url::parse(&format!("{}/live/manifest.mpd", server.uri()))?;

    let resolver = XLinkResolver::new(HttpFetcher::default(), ResolverConfig::default());
    let report = resolver
        .resolve(&mut manifest, XLinkTarget::Period(1), Some(&location))
        .await;
    assert!(report.error.is_none());

    let ad = manifest.periods.get(1).assert_success();
    assert_eq!(ad.id.as_deref(), Some("ad"));
    Ok(())
}

//! Remote elements (`xlink:href`) and their resolution.
//!
//! A `Period`, `AdaptationSet` or `EventStream` carrying `xlink:href` is a placeholder.
//! Resolving it fetches the referenced fragment, checks that it only contains elements of
//! the placeholder's kind, and splices those elements in place of the placeholder. A
//! fragment may hold zero or more elements; `urn:mpeg:dash:resolve-to-zero:2013`
//! resolves to zero elements without a fetch.

use std::{fmt, future::Future, sync::Arc};

use bytes::Bytes;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::{
    codec::{Node, NodeReader, NodeWriter},
    config::{ResolverConfig, XLinkFailurePolicy},
    element::Element,
    error::{MpdError, MpdResult, ParseReason},
    tree::{Manifest, Period},
    url::{merge_baseurls, resolve_base_url, BaseUrl},
    values::MpdValue,
};

pub const RESOLVE_TO_ZERO: &str = "urn:mpeg:dash:resolve-to-zero:2013";

/// `xlink:actuate`. The schema default is `onRequest`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Actuate {
    /// Resolve while loading the manifest.
    OnLoad,
    /// Resolve when the client is about to use the element.
    #[default]
    OnRequest,
}

impl MpdValue for Actuate {
    const EXPECTED: &'static str = "onLoad or onRequest";

    fn parse_value(s: &str) -> Option<Self> {
        match s {
            "onLoad" => Some(Self::OnLoad),
            "onRequest" => Some(Self::OnRequest),
            _ => None,
        }
    }

    fn format_value(&self) -> String {
        match self {
            Self::OnLoad => "onLoad",
            Self::OnRequest => "onRequest",
        }
        .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XLinkState {
    Unresolved,
    Fetching,
    Resolved,
    Failed(String),
}

impl fmt::Display for XLinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved => f.write_str("unresolved"),
            Self::Fetching => f.write_str("fetching"),
            Self::Resolved => f.write_str("resolved"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// The remote reference of a placeholder element. The state is runtime only and never
/// serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XLink {
    pub href: String,
    pub actuate: Option<Actuate>,
    pub state: XLinkState,
}

impl XLink {
    pub fn new(href: impl Into<String>, actuate: Actuate) -> Self {
        Self {
            href: href.into(),
            actuate: Some(actuate),
            state: XLinkState::Unresolved,
        }
    }

    pub fn actuate(&self) -> Actuate {
        self.actuate.unwrap_or_default()
    }

    pub fn is_resolve_to_zero(&self) -> bool {
        self.href.trim() == RESOLVE_TO_ZERO
    }

    /// Whether resolution still has to happen (a failed placeholder can be retried).
    pub fn is_pending(&self) -> bool {
        !matches!(self.state, XLinkState::Resolved)
    }

    pub(crate) fn read(reader: &mut NodeReader) -> MpdResult<Option<XLink>> {
        let href: Option<String> = reader.opt("xlink:href")?;
        let actuate = reader.opt("xlink:actuate")?;
        match href {
            Some(href) => Ok(Some(XLink {
                href,
                actuate,
                state: XLinkState::Unresolved,
            })),
            None if actuate.is_some() => Err(reader.error(ParseReason::MissingAttribute(
                "xlink:href".to_string(),
            ))),
            None => Ok(None),
        }
    }

    pub(crate) fn write(xlink: Option<&XLink>, writer: NodeWriter) -> NodeWriter {
        match xlink {
            Some(xlink) => writer
                .req_attr("xlink:href", &xlink.href)
                .attr("xlink:actuate", xlink.actuate.as_ref()),
            None => writer,
        }
    }
}

/// The external collaborator that retrieves remote fragments.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, uri: &Url) -> impl Future<Output = MpdResult<Bytes>> + Send;
}

impl<F: Fetcher> Fetcher for Arc<F> {
    fn fetch(&self, uri: &Url) -> impl Future<Output = MpdResult<Bytes>> + Send {
        self.as_ref().fetch(uri)
    }
}

/// Turns fetched bytes into the top-level elements of a fragment.
pub type FragmentParser = fn(&[u8]) -> MpdResult<Vec<Element>>;

/// Position of a placeholder in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum XLinkTarget {
    Period(usize),
    AdaptationSet { period: usize, index: usize },
    EventStream { period: usize, index: usize },
}

impl XLinkTarget {
    fn element_name(&self) -> &'static str {
        match self {
            Self::Period(_) => "Period",
            Self::AdaptationSet { .. } => "AdaptationSet",
            Self::EventStream { .. } => "EventStream",
        }
    }

    fn period(&self) -> usize {
        match self {
            Self::Period(period)
            | Self::AdaptationSet { period, .. }
            | Self::EventStream { period, .. } => *period,
        }
    }
}

/// Outcome of one placeholder in one resolution run. Targets are reported by their
/// position before the run spliced anything.
#[derive(Debug)]
pub struct XLinkReport {
    pub target: XLinkTarget,
    pub href: String,
    pub state: XLinkState,
    pub error: Option<MpdError>,
}

impl Manifest {
    fn xlink(&self, target: XLinkTarget) -> Option<&XLink> {
        match target {
            XLinkTarget::Period(i) => self.periods.get(i)?.xlink.as_ref(),
            XLinkTarget::AdaptationSet { period, index } => self
                .periods
                .get(period)?
                .adaptation_sets
                .get(index)?
                .xlink
                .as_ref(),
            XLinkTarget::EventStream { period, index } => self
                .periods
                .get(period)?
                .event_streams
                .get(index)?
                .xlink
                .as_ref(),
        }
    }

    fn xlink_mut(&mut self, target: XLinkTarget) -> Option<&mut XLink> {
        match target {
            XLinkTarget::Period(i) => self.periods.get_mut(i)?.xlink.as_mut(),
            XLinkTarget::AdaptationSet { period, index } => self
                .periods
                .get_mut(period)?
                .adaptation_sets
                .get_mut(index)?
                .xlink
                .as_mut(),
            XLinkTarget::EventStream { period, index } => self
                .periods
                .get_mut(period)?
                .event_streams
                .get_mut(index)?
                .xlink
                .as_mut(),
        }
    }

    /// Every placeholder that still needs resolving, in document order.
    ///
    /// Placeholders nested in an unresolved `Period` placeholder are left out: resolving
    /// the period replaces them.
    pub fn pending_xlinks(&self) -> Vec<XLinkTarget> {
        let mut targets = Vec::new();
        for (p, period) in self.periods.iter().enumerate() {
            if period.is_placeholder() {
                targets.push(XLinkTarget::Period(p));
                continue;
            }
            for (index, adaptation_set) in period.adaptation_sets.iter().enumerate() {
                if adaptation_set.is_placeholder() {
                    targets.push(XLinkTarget::AdaptationSet { period: p, index });
                }
            }
            for (index, event_stream) in period.event_streams.iter().enumerate() {
                if event_stream.xlink.as_ref().is_some_and(XLink::is_pending) {
                    targets.push(XLinkTarget::EventStream { period: p, index });
                }
            }
        }
        targets
    }

    /// The base URL a placeholder's relative `xlink:href` resolves against: that of the
    /// element containing it.
    fn xlink_base(&self, target: XLinkTarget, location: Option<&Url>, config: &ResolverConfig) -> Option<Url> {
        let mut levels: Vec<&[BaseUrl]> = vec![self.base_urls.as_slice()];
        if !matches!(target, XLinkTarget::Period(_)) {
            levels.push(self.periods.get(target.period())?.base_urls.as_slice());
        }
        resolve_base_url(location, &levels, &config.base_url_policy)
            .ok()
            .map(|resolved| resolved.url)
    }

    /// Replaces the placeholder with `elements`, keeping the manifest valid. On error the
    /// manifest is unchanged.
    fn splice(&mut self, target: XLinkTarget, elements: &[Element]) -> MpdResult<()> {
        fn decode_all<T: Node>(name: &str, elements: &[Element]) -> MpdResult<Vec<T>> {
            elements
                .iter()
                .map(|element| {
                    if element.name != name {
                        return Err(MpdError::parse(
                            &element.name,
                            ParseReason::UnexpectedElement {
                                expected: name.to_string(),
                                found: element.name.clone(),
                            },
                        ));
                    }
                    T::decode(element)
                })
                .collect()
        }

        fn replace<T>(items: &mut Vec<T>, index: usize, with: Vec<T>) -> Option<(usize, Vec<T>)> {
            if index >= items.len() {
                return None;
            }
            let len = with.len();
            let removed = items.splice(index..=index, with).collect();
            Some((len, removed))
        }

        fn restore<T>(items: &mut Vec<T>, index: usize, len: usize, removed: Vec<T>) {
            items.splice(index..index + len, removed);
        }

        let missing = || MpdError::NotFound(format!("{target:?}"));
        let name = target.element_name();
        match target {
            XLinkTarget::Period(index) => {
                let nodes = decode_all(name, elements)?;
                let (len, removed) = replace(&mut self.periods, index, nodes).ok_or_else(missing)?;
                if let Err(e) = self.validate() {
                    restore(&mut self.periods, index, len, removed);
                    return Err(e);
                }
            }
            XLinkTarget::AdaptationSet { period, index } => {
                let nodes = decode_all(name, elements)?;
                let items = &mut self.periods.get_mut(period).ok_or_else(missing)?.adaptation_sets;
                let (len, removed) = replace(items, index, nodes).ok_or_else(missing)?;
                if let Err(e) = self.validate() {
                    restore(&mut self.periods[period].adaptation_sets, index, len, removed);
                    return Err(e);
                }
            }
            XLinkTarget::EventStream { period, index } => {
                let nodes = decode_all(name, elements)?;
                let items = &mut self.periods.get_mut(period).ok_or_else(missing)?.event_streams;
                let (len, removed) = replace(items, index, nodes).ok_or_else(missing)?;
                if let Err(e) = self.validate() {
                    restore(&mut self.periods[period].event_streams, index, len, removed);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Drops the placeholder, unless that would leave the manifest invalid (such as an
    /// MPD without periods).
    fn remove_placeholder(&mut self, target: XLinkTarget) -> MpdResult<()> {
        self.splice(target, &[])
    }
}

enum Outcome {
    Fragment(Vec<Element>),
    Failed(MpdError),
    Cancelled,
}

/// Resolves remote elements of a manifest through a caller supplied [`Fetcher`].
pub struct XLinkResolver<F> {
    fetcher: F,
    config: ResolverConfig,
    parser: FragmentParser,
    cancel: CancellationToken,
}

impl<F: Fetcher> XLinkResolver<F> {
    #[cfg(feature = "xml")]
    pub fn new(fetcher: F, config: ResolverConfig) -> Self {
        Self::with_parser(fetcher, config, crate::xml::parse_fragment)
    }

    pub fn with_parser(fetcher: F, config: ResolverConfig, parser: FragmentParser) -> Self {
        Self {
            fetcher,
            config,
            parser,
            cancel: CancellationToken::new(),
        }
    }

    /// Cancelling the token stops in-flight fetches. Their placeholders are left
    /// unresolved.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Resolves every `onLoad` placeholder, including those brought in by resolved
    /// fragments, up to the configured depth.
    pub async fn resolve_on_load(
        &self,
        manifest: &mut Manifest,
        location: Option<&Url>,
    ) -> Vec<XLinkReport> {
        let mut reports = Vec::new();
        for _ in 0..=self.config.xlink.max_depth {
            let targets: Vec<XLinkTarget> = manifest
                .pending_xlinks()
                .into_iter()
                .filter(|t| {
                    manifest
                        .xlink(*t)
                        .is_some_and(|x| x.actuate() == Actuate::OnLoad && x.state == XLinkState::Unresolved)
                })
                .collect();
            if targets.is_empty() || self.cancel.is_cancelled() {
                break;
            }
            reports.extend(self.resolve_many(manifest, &targets, location).await);
        }
        reports
    }

    /// Resolves a single placeholder regardless of its actuation, e.g. an `onRequest`
    /// period the client is about to play.
    pub async fn resolve(
        &self,
        manifest: &mut Manifest,
        target: XLinkTarget,
        location: Option<&Url>,
    ) -> XLinkReport {
        let mut reports = self.resolve_many(manifest, &[target], location).await;
        reports.pop().unwrap_or_else(|| XLinkReport {
            target,
            href: String::new(),
            state: XLinkState::Unresolved,
            error: Some(MpdError::NotFound(format!("{target:?}"))),
        })
    }

    /// Resolves independent placeholders, fetching concurrently when configured to.
    /// Results are spliced in document order whatever order the fetches complete in.
    pub async fn resolve_many(
        &self,
        manifest: &mut Manifest,
        targets: &[XLinkTarget],
        location: Option<&Url>,
    ) -> Vec<XLinkReport> {
        let mut targets = targets.to_vec();
        targets.sort();
        targets.dedup();

        let mut reports = Vec::with_capacity(targets.len());
        let mut requests = Vec::with_capacity(targets.len());
        for target in targets {
            let Some(xlink) = manifest.xlink_mut(target) else {
                reports.push(XLinkReport {
                    target,
                    href: String::new(),
                    state: XLinkState::Unresolved,
                    error: Some(MpdError::NotFound(format!("{target:?}"))),
                });
                continue;
            };
            xlink.state = XLinkState::Fetching;
            let href = xlink.href.clone();
            requests.push((target, href));
        }

        let mut fetches = Vec::with_capacity(requests.len());
        for (target, href) in &requests {
            let base = manifest.xlink_base(*target, location, &self.config);
            fetches.push(self.fetch_fragment(href, base));
        }
        let outcomes = if self.config.xlink.concurrent {
            join_all(fetches).await
        } else {
            let mut outcomes = Vec::with_capacity(fetches.len());
            for fetch in fetches {
                outcomes.push(fetch.await);
            }
            outcomes
        };

        // splice from the back so that earlier indices stay valid, children before
        // their periods
        let mut results: Vec<_> = requests.into_iter().zip(outcomes).collect();
        results.sort_by_key(|((target, _), _)| {
            let child = !matches!(target, XLinkTarget::Period(_));
            (std::cmp::Reverse(child), std::cmp::Reverse(*target))
        });

        for ((target, href), outcome) in results {
            let report = self.settle(manifest, target, href, outcome);
            match &report.error {
                None => tracing::info!(href = %report.href, state = %report.state, "Resolved remote element"),
                Some(e) => tracing::warn!(href = %report.href, state = %report.state, "Remote element not resolved: {e}"),
            }
            reports.push(report);
        }
        reports.sort_by_key(|r| r.target);
        reports
    }

    async fn fetch_fragment(&self, href: &str, base: Option<Url>) -> Outcome {
        if href.trim() == RESOLVE_TO_ZERO {
            return Outcome::Fragment(Vec::new());
        }
        let uri = match &base {
            Some(base) => merge_baseurls(base, href.trim()),
            None => Url::parse(href.trim()).map_err(MpdError::from),
        };
        let uri = match uri {
            Ok(uri) => uri,
            Err(e) => return Outcome::Failed(e),
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Outcome::Cancelled,
            fetched = self.fetcher.fetch(&uri) => {
                match fetched.and_then(|bytes| (self.parser)(&bytes)) {
                    Ok(elements) => Outcome::Fragment(elements),
                    Err(e) => Outcome::Failed(e),
                }
            }
        }
    }

    fn settle(
        &self,
        manifest: &mut Manifest,
        target: XLinkTarget,
        href: String,
        outcome: Outcome,
    ) -> XLinkReport {
        let error = match outcome {
            Outcome::Cancelled => {
                if let Some(xlink) = manifest.xlink_mut(target) {
                    xlink.state = XLinkState::Unresolved;
                }
                return XLinkReport {
                    target,
                    href,
                    state: XLinkState::Unresolved,
                    error: Some(MpdError::Cancelled),
                };
            }
            Outcome::Fragment(elements) => match manifest.splice(target, &elements) {
                Ok(()) => {
                    return XLinkReport {
                        target,
                        href,
                        state: XLinkState::Resolved,
                        error: None,
                    }
                }
                Err(e) => e,
            },
            Outcome::Failed(e) => e,
        };

        let state = XLinkState::Failed(error.to_string());
        let removed = match self.config.xlink.failure_policy {
            XLinkFailurePolicy::Remove => match manifest.remove_placeholder(target) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Keeping failed placeholder: {e}");
                    false
                }
            },
            XLinkFailurePolicy::RetainAndReport => false,
        };
        if !removed {
            if let Some(xlink) = manifest.xlink_mut(target) {
                xlink.state = state.clone();
            }
        }
        XLinkReport {
            target,
            href,
            state,
            error: Some(error),
        }
    }
}

/// Builds a manifest and resolves its `onLoad` placeholders.
pub async fn build_resolved<F: Fetcher>(
    element: &Element,
    resolver: &XLinkResolver<F>,
    location: Option<&Url>,
) -> MpdResult<(Manifest, Vec<XLinkReport>)> {
    let mut manifest = Manifest::build(element)?;
    let reports = resolver.resolve_on_load(&mut manifest, location).await;
    Ok((manifest, reports))
}

impl Period {
    /// A `Period` placeholder pointing at `href`.
    pub fn remote(href: impl Into<String>, actuate: Actuate) -> Self {
        Self {
            xlink: Some(XLink::new(href, actuate)),
            ..Default::default()
        }
    }
}

//! `BaseURL` elements and effective base URL composition.

use url::Url;

use crate::{
    codec::{Node, NodeReader, NodeWriter},
    config::BaseUrlPolicy,
    element::{Element, Extras},
    error::{MpdError, MpdResult},
    values::{Decimal, Rational, XsDuration},
};

#[derive(Debug, Clone, PartialEq)]
pub struct BaseUrl {
    pub url: String,
    pub service_location: Option<String>,
    pub byte_range: Option<String>,
    pub availability_time_offset: Option<Decimal>,
    pub availability_time_complete: Option<bool>,
    pub time_shift_buffer_depth: Option<XsDuration>,
    pub range_access: Option<bool>,
    pub extras: Extras,
}

impl BaseUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            service_location: None,
            byte_range: None,
            availability_time_offset: None,
            availability_time_complete: None,
            time_shift_buffer_depth: None,
            range_access: None,
            extras: Extras::default(),
        }
    }

    /// `@dvb:priority`, lower is preferred.
    pub fn priority(&self) -> Option<u64> {
        self.extras
            .attributes
            .get("dvb:priority")
            .and_then(|p| p.parse().ok())
    }

    /// `@dvb:weight`.
    pub fn weight(&self) -> Option<u64> {
        self.extras
            .attributes
            .get("dvb:weight")
            .and_then(|w| w.parse().ok())
    }
}

impl Node for BaseUrl {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            url: reader.required_text()?,
            service_location: reader.opt("serviceLocation")?,
            byte_range: reader.opt("byteRange")?,
            availability_time_offset: reader.opt("availabilityTimeOffset")?,
            availability_time_complete: reader.opt("availabilityTimeComplete")?,
            time_shift_buffer_depth: reader.opt("timeShiftBufferDepth")?,
            range_access: reader.opt("rangeAccess")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .attr("serviceLocation", self.service_location.as_ref())
            .attr("byteRange", self.byte_range.as_ref())
            .attr("availabilityTimeOffset", self.availability_time_offset.as_ref())
            .attr(
                "availabilityTimeComplete",
                self.availability_time_complete.as_ref(),
            )
            .attr("timeShiftBufferDepth", self.time_shift_buffer_depth.as_ref())
            .attr("rangeAccess", self.range_access.as_ref())
            .text(Some(&self.url))
            .finish(&self.extras)
    }
}

impl BaseUrlPolicy {
    /// Picks one of the `BaseURL`s declared on a single node.
    pub fn select<'a>(&self, urls: &'a [BaseUrl]) -> Option<&'a BaseUrl> {
        match self {
            Self::First => urls.first(),
            Self::ServiceLocation(location) => urls
                .iter()
                .find(|u| u.service_location.as_deref() == Some(location.as_str()))
                .or_else(|| urls.first()),
            // min_by_key keeps the first of equal keys
            Self::HighestPriority => urls.iter().min_by_key(|u| u.priority().unwrap_or(u64::MAX)),
        }
    }
}

pub(crate) fn is_absolute_url(s: &str) -> bool {
    Url::parse(s).is_ok()
}

/// RFC 3986 reference resolution. The query of `current` only survives an empty
/// reference (or a fragment-only one), never a path.
pub(crate) fn merge_baseurls(current: &Url, new: &str) -> MpdResult<Url> {
    Ok(current.join(new)?)
}

/// The base URL in effect for a node, together with the availability attributes that
/// `BaseURL` elements contribute along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBaseUrl {
    pub url: Url,
    /// Sum of `@availabilityTimeOffset` along the chain; `None` if any of them is `INF`.
    pub availability_time_offset: Option<Rational>,
    pub availability_time_complete: Option<bool>,
    pub time_shift_buffer_depth: Option<XsDuration>,
}

/// Composes the base URL of a node from the `BaseURL` elements of each level of its
/// ownership chain, outermost (`MPD`) first. `location` is where the manifest was
/// retrieved from and roots the chain.
pub fn resolve_base_url(
    location: Option<&Url>,
    levels: &[&[BaseUrl]],
    policy: &BaseUrlPolicy,
) -> MpdResult<ResolvedBaseUrl> {
    let mut current = location.cloned();
    let mut availability_time_offset = Some(Rational::ZERO);
    let mut availability_time_complete = None;
    let mut time_shift_buffer_depth = None;

    for level in levels {
        let Some(base_url) = policy.select(level) else {
            continue;
        };
        let url = base_url.url.trim();
        current = Some(match &current {
            Some(current) => merge_baseurls(current, url)?,
            None if is_absolute_url(url) => Url::parse(url)?,
            None => return Err(MpdError::UnresolvableUrl(url.to_string())),
        });

        if let Some(offset) = &base_url.availability_time_offset {
            availability_time_offset = match (availability_time_offset, offset.to_rational()) {
                (Some(sum), Some(offset)) => Some(sum + offset),
                _ => None,
            };
        }
        if base_url.availability_time_complete.is_some() {
            availability_time_complete = base_url.availability_time_complete;
        }
        if base_url.time_shift_buffer_depth.is_some() {
            time_shift_buffer_depth = base_url.time_shift_buffer_depth.clone();
        }
    }

    let url = current.ok_or_else(|| MpdError::UnresolvableUrl(String::new()))?;
    Ok(ResolvedBaseUrl {
        url,
        availability_time_offset,
        availability_time_complete,
        time_shift_buffer_depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(url: &str) -> BaseUrl {
        BaseUrl::new(url)
    }

    #[test]
    fn test_merge_baseurls() {
        let current = Url::parse("https://example.com/manifest.mpd?auth=secret").unwrap();
        assert_eq!(
            merge_baseurls(&current, "/video42.mp4").unwrap().as_str(),
            "https://example.com/video42.mp4"
        );
        assert_eq!(
            merge_baseurls(&current, "video/").unwrap().as_str(),
            "https://example.com/video/"
        );
        assert_eq!(
            merge_baseurls(&current, "").unwrap().as_str(),
            "https://example.com/manifest.mpd?auth=secret"
        );
        assert_eq!(
            merge_baseurls(&current, "?auth=other").unwrap().as_str(),
            "https://example.com/manifest.mpd?auth=other"
        );
        assert_eq!(
            merge_baseurls(&current, "../up/x.m4s").unwrap().as_str(),
            "https://example.com/up/x.m4s"
        );
        assert_eq!(
            merge_baseurls(&current, "/video42.mp4?auth=new").unwrap().as_str(),
            "https://example.com/video42.mp4?auth=new"
        );
        assert_eq!(
            merge_baseurls(&current, "https://cdn.example.com/a/").unwrap().as_str(),
            "https://cdn.example.com/a/"
        );
    }

    #[test]
    fn test_chain() {
        let mpd = [base("https://a/x/")];
        let period = [base("y/")];
        let levels: [&[BaseUrl]; 3] = [&mpd, &period, &[]];
        let resolved = resolve_base_url(None, &levels, &BaseUrlPolicy::First).unwrap();
        assert_eq!(resolved.url.as_str(), "https://a/x/y/");
    }

    #[test]
    fn test_location_roots_the_chain() {
        // the manifest's query does not leak into resolved paths
        let location = Url::parse("https://origin/live/manifest.mpd?token=abc").unwrap();
        let video = [base("video/")];
        let levels: [&[BaseUrl]; 1] = [&video];
        let resolved =
            resolve_base_url(Some(&location), &levels, &BaseUrlPolicy::First).unwrap();
        assert_eq!(resolved.url.as_str(), "https://origin/live/video/");

        let resolved = resolve_base_url(Some(&location), &[], &BaseUrlPolicy::First).unwrap();
        assert_eq!(resolved.url, location);
    }

    #[test]
    fn test_unresolvable() {
        let video = [base("video/")];
        let levels: [&[BaseUrl]; 1] = [&video];
        let err = resolve_base_url(None, &levels, &BaseUrlPolicy::First).unwrap_err();
        assert!(matches!(err, MpdError::UnresolvableUrl(_)));
        assert!(resolve_base_url(None, &[], &BaseUrlPolicy::First).is_err());
    }

    #[test]
    fn test_policies() {
        let mut cdn1 = base("https://cdn1/");
        cdn1.service_location = Some("cdn1".to_string());
        cdn1.extras.attributes.insert("dvb:priority".to_string(), "2".to_string());
        let mut cdn2 = base("https://cdn2/");
        cdn2.service_location = Some("cdn2".to_string());
        cdn2.extras.attributes.insert("dvb:priority".to_string(), "1".to_string());
        let urls = [cdn1, cdn2];

        assert_eq!(BaseUrlPolicy::First.select(&urls).unwrap().url, "https://cdn1/");
        assert_eq!(
            BaseUrlPolicy::ServiceLocation("cdn2".to_string())
                .select(&urls)
                .unwrap()
                .url,
            "https://cdn2/"
        );
        assert_eq!(
            BaseUrlPolicy::ServiceLocation("nope".to_string())
                .select(&urls)
                .unwrap()
                .url,
            "https://cdn1/"
        );
        assert_eq!(
            BaseUrlPolicy::HighestPriority.select(&urls).unwrap().url,
            "https://cdn2/"
        );
    }

    #[test]
    fn test_availability_offsets_sum() {
        use crate::values::MpdValue;

        let mut outer = base("https://a/");
        outer.availability_time_offset = Decimal::parse_value("1.5");
        let mut inner = base("b/");
        inner.availability_time_offset = Decimal::parse_value("2");
        let (outer, inner_list) = ([outer], [inner.clone()]);
        let levels: [&[BaseUrl]; 2] = [&outer, &inner_list];
        let resolved = resolve_base_url(None, &levels, &BaseUrlPolicy::First).unwrap();
        assert_eq!(resolved.availability_time_offset, Some(Rational::new(7, 2)));

        inner.availability_time_offset = Decimal::parse_value("INF");
        let (outer, inner_list) = ([base("https://a/")], [inner]);
        let levels: [&[BaseUrl]; 2] = [&outer, &inner_list];
        let resolved = resolve_base_url(None, &levels, &BaseUrlPolicy::First).unwrap();
        assert_eq!(resolved.availability_time_offset, None);
    }
}

use serde::{Deserialize, Serialize};

use crate::error::MpdResult;

/// Which `BaseURL` to use when a node declares several.
///
/// The standard leaves the tie-break open, so this is a caller decision. The default
/// picks the first declared element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseUrlPolicy {
    #[default]
    First,
    /// Prefer the `BaseURL` whose `@serviceLocation` matches, falling back to the first.
    ServiceLocation(String),
    /// Prefer the lowest `@dvb:priority`, ties broken by declaration order.
    HighestPriority,
}

/// What happens to a remote element placeholder whose fetch or validation fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XLinkFailurePolicy {
    /// Drop the placeholder from the document.
    Remove,
    /// Keep the placeholder, mark it failed and report the error.
    #[default]
    RetainAndReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XLinkConfig {
    pub failure_policy: XLinkFailurePolicy,
    /// How many times a resolved fragment may itself contain `onLoad` placeholders that
    /// are resolved in the same run.
    pub max_depth: usize,
    /// Fetch independent placeholders concurrently.
    pub concurrent: bool,
}

impl Default for XLinkConfig {
    fn default() -> Self {
        Self {
            failure_policy: XLinkFailurePolicy::default(),
            max_depth: 1,
            concurrent: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub base_url_policy: BaseUrlPolicy,
    pub xlink: XLinkConfig,
}

impl ResolverConfig {
    pub fn from_json(json: &str) -> MpdResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

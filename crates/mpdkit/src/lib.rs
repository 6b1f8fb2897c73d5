//! MPEG-DASH media presentation description (MPD) document model.
//!
//! A [`Manifest`] is built from a generic [`Element`] tree, validated as a whole, and can be
//! serialized back without losing extensions it does not understand. On top of the tree:
//!
//! - attribute overrides along `Representation` → `AdaptationSet` ([`base`]),
//! - segment addressing and resolution ([`addressing`]),
//! - `BaseURL` composition ([`mod@url`]),
//! - period timing and segment availability ([`timing`]),
//! - remote elements ([`xlink`]),
//! - all-or-nothing edits and MPD patches ([`patch`]),
//! - a copy-on-refresh handle for live sessions ([`ManifestHandle`]).
//!
//! Reading XML text is behind the `xml` feature; an HTTP [`Fetcher`] behind `reqwest`.

pub mod addressing;
pub mod base;
mod codec;
pub mod config;
pub mod descriptor;
pub mod element;
pub mod error;
mod handle;
#[cfg(feature = "reqwest")]
mod http;
pub mod patch;
pub mod signals;
pub mod timing;
pub mod tree;
pub mod url;
pub mod values;
pub mod xlink;
#[cfg(feature = "xml")]
pub mod xml;

pub use addressing::{ResolveContext, Segment, SegmentLocation, SegmentResolver};
pub use codec::Node;
pub use config::{BaseUrlPolicy, ResolverConfig, XLinkConfig, XLinkFailurePolicy};
pub use element::Element;
pub use error::{ErrorKind, MpdError, MpdResult};
pub use handle::ManifestHandle;
#[cfg(feature = "reqwest")]
pub use http::HttpFetcher;
pub use patch::Patch;
pub use timing::AvailabilityWindow;
pub use tree::{EditOperation, InsertPosition, Manifest, Selector};
pub use xlink::{Fetcher, XLinkResolver};

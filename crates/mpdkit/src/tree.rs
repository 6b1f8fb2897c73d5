//! The manifest document tree: `MPD`, `Period`, `AdaptationSet`, `Representation` and
//! the elements they own.

mod adaptation_set;
mod context;
mod edit;
mod groups;
mod manifest;
mod period;
mod program;
mod representation;
mod validate;

pub use adaptation_set::AdaptationSet;
pub use context::{AdaptationSetRef, PeriodRef, RepresentationRef, SubRepresentationRef};
pub use edit::{EditOperation, InsertPosition, Selector};
pub use groups::{ContentComponent, InitializationSet, Preselection, Subset};
pub use manifest::{Manifest, PresentationType, MPD_NAMESPACE};
pub use period::Period;
pub use program::{
    Latency, Location, Metrics, MetricsRange, PlaybackRate, ProgramInformation,
    ServiceDescription, TextElement,
};
pub use representation::{ExtendedBandwidth, ModelPair, Representation, SubRepresentation};

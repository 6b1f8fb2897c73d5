//! Segment addressing: `SegmentBase`, `SegmentList`, `SegmentTemplate` and
//! `SegmentTimeline`, and the resolver that turns queries into segment locations.

mod list;
mod resolver;
mod segment_base;
mod template;
mod timeline;

pub use list::{SegmentList, SegmentUrl};
pub use resolver::{ResolveContext, Segment, SegmentLocation, SegmentResolver, Segments};
pub use segment_base::{FailoverContent, Fcs, MultipleSegmentBase, SegmentBase, SourceUrl};
pub use template::{SegmentTemplate, TemplateVariables};
pub use timeline::{SegmentTimeline, TimelineIter, TimelineSegment, S};

use crate::{
    codec::{NodeReader, NodeWriter},
    error::{InvalidReason, MpdError, MpdResult},
};

/// The addressing elements a single `Period`, `AdaptationSet` or `Representation` declares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentAddressing {
    pub segment_base: Option<SegmentBase>,
    pub segment_list: Option<SegmentList>,
    pub segment_template: Option<SegmentTemplate>,
}

/// The addressing in effect for a representation, merged over its scopes.
#[derive(Debug, Clone, PartialEq)]
pub enum Addressing {
    /// A single file, optionally with a segment index (`SegmentBase`).
    Indexed(SegmentBase),
    List(SegmentList),
    Template(SegmentTemplate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingScheme {
    Indexed,
    List,
    Template,
    /// A list or template whose segments are laid out by a `SegmentTimeline`.
    Timeline,
}

impl Addressing {
    pub fn scheme(&self) -> AddressingScheme {
        match self {
            Self::Indexed(_) => AddressingScheme::Indexed,
            Self::List(list) if list.multiple.segment_timeline.is_some() => {
                AddressingScheme::Timeline
            }
            Self::Template(template) if template.multiple.segment_timeline.is_some() => {
                AddressingScheme::Timeline
            }
            Self::List(_) => AddressingScheme::List,
            Self::Template(_) => AddressingScheme::Template,
        }
    }

    pub fn segment_base(&self) -> &SegmentBase {
        match self {
            Self::Indexed(base) => base,
            Self::List(list) => &list.multiple.base,
            Self::Template(template) => &template.multiple.base,
        }
    }

    pub fn multiple(&self) -> Option<&MultipleSegmentBase> {
        match self {
            Self::Indexed(_) => None,
            Self::List(list) => Some(&list.multiple),
            Self::Template(template) => Some(&template.multiple),
        }
    }

    pub fn timeline(&self) -> Option<&SegmentTimeline> {
        self.multiple()?.segment_timeline.as_ref()
    }

    /// Resolves addressing over scopes ordered from the most specific outwards.
    ///
    /// The nearest scope that declares addressing selects the scheme; outer scopes that
    /// declare the same kind of element fill in attributes left undeclared.
    pub fn effective(scopes: &[&SegmentAddressing]) -> Option<Addressing> {
        let (position, nearest) = scopes
            .iter()
            .enumerate()
            .find_map(|(i, scope)| scope.declared().map(|a| (i, a)))?;

        let mut addressing = nearest;
        for outer in &scopes[position + 1..] {
            match &mut addressing {
                Self::Indexed(base) => {
                    if let Some(outer) = &outer.segment_base {
                        base.inherit(outer);
                    }
                }
                Self::List(list) => {
                    if let Some(outer) = &outer.segment_list {
                        list.inherit(outer);
                    }
                }
                Self::Template(template) => {
                    if let Some(outer) = &outer.segment_template {
                        template.inherit(outer);
                    }
                }
            }
        }
        Some(addressing)
    }
}

impl SegmentAddressing {
    pub fn is_empty(&self) -> bool {
        self.segment_base.is_none() && self.segment_list.is_none() && self.segment_template.is_none()
    }

    /// The element declared on this scope. When several are declared (which
    /// [`SegmentAddressing::validate`] rejects), a template wins over a list over a base.
    pub fn declared(&self) -> Option<Addressing> {
        if let Some(template) = &self.segment_template {
            return Some(Addressing::Template(template.clone()));
        }
        if let Some(list) = &self.segment_list {
            return Some(Addressing::List(list.clone()));
        }
        self.segment_base.clone().map(Addressing::Indexed)
    }

    pub fn validate(&self, element: &str) -> MpdResult<()> {
        let found: Vec<&'static str> = [
            self.segment_base.as_ref().map(|_| "SegmentBase"),
            self.segment_list.as_ref().map(|_| "SegmentList"),
            self.segment_template.as_ref().map(|_| "SegmentTemplate"),
        ]
        .into_iter()
        .flatten()
        .collect();

        if found.len() > 1 {
            return Err(MpdError::invalid(
                element,
                InvalidReason::ConflictingAddressing { found },
            ));
        }

        let multiple = self
            .segment_list
            .as_ref()
            .map(|l| &l.multiple)
            .or(self.segment_template.as_ref().map(|t| &t.multiple));
        if let Some(multiple) = multiple {
            if multiple.base.timescale == Some(0) {
                return Err(MpdError::invalid(
                    element,
                    InvalidReason::Constraint("@timescale must be positive".to_string()),
                ));
            }
            if multiple.duration.is_some() && multiple.segment_timeline.is_some() {
                return Err(MpdError::invalid(
                    element,
                    InvalidReason::Constraint(
                        "@duration and SegmentTimeline are mutually exclusive".to_string(),
                    ),
                ));
            }
            if let Some(timeline) = &multiple.segment_timeline {
                timeline.validate()?;
            }
        }
        if self.segment_base.as_ref().and_then(|b| b.timescale) == Some(0) {
            return Err(MpdError::invalid(
                element,
                InvalidReason::Constraint("@timescale must be positive".to_string()),
            ));
        }
        Ok(())
    }

    pub(crate) fn read(reader: &mut NodeReader) -> MpdResult<Self> {
        Ok(Self {
            segment_base: reader.child("SegmentBase")?,
            segment_list: reader.child("SegmentList")?,
            segment_template: reader.child("SegmentTemplate")?,
        })
    }

    pub(crate) fn write(&self, writer: NodeWriter) -> NodeWriter {
        writer
            .child("SegmentBase", self.segment_base.as_ref())
            .child("SegmentList", self.segment_list.as_ref())
            .child("SegmentTemplate", self.segment_template.as_ref())
    }
}

//! MPD patch documents (`<Patch>`): an ordered list of `add`, `replace` and `remove`
//! operations against a published manifest.

use crate::{
    codec::{Node, NodeReader, NodeWriter},
    element::{Element, Extras},
    error::{InvalidReason, MpdError, MpdResult, ParseReason},
    tree::{EditOperation, InsertPosition, Manifest, Selector},
    values::{MpdValue, XsDateTime},
};

impl MpdValue for InsertPosition {
    const EXPECTED: &'static str = "prepend, append, before or after";

    fn parse_value(s: &str) -> Option<Self> {
        match s {
            "append" => Some(Self::Append),
            "prepend" => Some(Self::Prepend),
            "before" => Some(Self::Before),
            "after" => Some(Self::After),
            _ => None,
        }
    }

    fn format_value(&self) -> String {
        match self {
            Self::Append => "append",
            Self::Prepend => "prepend",
            Self::Before => "before",
            Self::After => "after",
        }
        .to_string()
    }
}

impl MpdValue for Selector {
    const EXPECTED: &'static str = "path selector";

    fn parse_value(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    fn format_value(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub mpd_id: Option<String>,
    /// `@publishTime` of the manifest this patch applies to.
    pub original_publish_time: Option<XsDateTime>,
    /// `@publishTime` of the manifest after the patch.
    pub publish_time: Option<XsDateTime>,
    pub operations: Vec<EditOperation>,
    pub extras: Extras,
}

fn decode_operation(element: &Element) -> MpdResult<EditOperation> {
    let mut reader = NodeReader::new(element);
    let selector: Selector = reader.req("sel")?;
    let operation = match element.local_name() {
        "add" => {
            let position: Option<InsertPosition> = reader.opt("pos")?;
            let kind: Option<String> = reader.opt("type")?;
            match kind.as_deref().and_then(|k| k.strip_prefix('@')) {
                Some(name) => EditOperation::SetAttribute {
                    selector,
                    name: name.to_string(),
                    value: reader.text().unwrap_or_default(),
                },
                None => EditOperation::Insert {
                    selector,
                    position: position.unwrap_or_default(),
                    elements: reader.raw_children(),
                },
            }
        }
        "replace" => match selector.split_attribute() {
            (selector, Some(name)) => EditOperation::SetAttribute {
                selector,
                name,
                value: reader.text().unwrap_or_default(),
            },
            (selector, None) => EditOperation::Replace {
                selector,
                elements: reader.raw_children(),
            },
        },
        "remove" => EditOperation::Remove { selector },
        other => {
            return Err(reader.error(ParseReason::UnexpectedElement {
                expected: "add, replace or remove".to_string(),
                found: other.to_string(),
            }))
        }
    };
    Ok(operation)
}

fn encode_operation(operation: &EditOperation) -> Element {
    match operation {
        EditOperation::Insert {
            selector,
            position,
            elements,
        } => NodeWriter::new("add")
            .req_attr("sel", selector)
            .attr(
                "pos",
                Some(position).filter(|p| **p != InsertPosition::Append),
            )
            .elements(elements)
            .finish(&Extras::default()),
        EditOperation::Replace { selector, elements } => NodeWriter::new("replace")
            .req_attr("sel", selector)
            .elements(elements)
            .finish(&Extras::default()),
        EditOperation::Remove { selector } => NodeWriter::new("remove")
            .req_attr("sel", selector)
            .finish(&Extras::default()),
        EditOperation::SetAttribute {
            selector,
            name,
            value,
        } => NodeWriter::new("add")
            .req_attr("sel", selector)
            .req_attr("type", &format!("@{name}"))
            .text(Some(value.as_str()))
            .finish(&Extras::default()),
    }
}

impl Node for Patch {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        let mpd_id = reader.opt("mpdId")?;
        let original_publish_time = reader.opt("originalPublishTime")?;
        let publish_time = reader.opt("publishTime")?;

        let mut operations = Vec::new();
        let mut others = Vec::new();
        for child in reader.raw_children() {
            match child.local_name() {
                "add" | "replace" | "remove" => operations.push(decode_operation(&child)?),
                _ => others.push(child),
            }
        }
        let mut extras = reader.finish();
        extras.children = others;

        Ok(Self {
            mpd_id,
            original_publish_time,
            publish_time,
            operations,
            extras,
        })
    }

    fn encode(&self, name: &str) -> Element {
        let operations: Vec<Element> = self.operations.iter().map(encode_operation).collect();
        NodeWriter::new(name)
            .attr("mpdId", self.mpd_id.as_ref())
            .attr("originalPublishTime", self.original_publish_time.as_ref())
            .attr("publishTime", self.publish_time.as_ref())
            .elements(&operations)
            .finish(&self.extras)
    }
}

impl Patch {
    pub fn build(element: &Element) -> MpdResult<Self> {
        if element.local_name() != "Patch" {
            return Err(MpdError::parse(
                &element.name,
                ParseReason::UnexpectedElement {
                    expected: "Patch".to_string(),
                    found: element.name.clone(),
                },
            ));
        }
        Self::decode(element)
    }

    #[cfg(feature = "xml")]
    pub fn from_xml(xml: &str) -> MpdResult<Self> {
        Self::build(&crate::xml::parse(xml)?)
    }

    fn check_target(&self, manifest: &Manifest) -> MpdResult<()> {
        let mismatch = |what: &str| {
            MpdError::invalid(
                "Patch",
                InvalidReason::Constraint(format!("{what} does not match the manifest")),
            )
        };
        if let Some(mpd_id) = &self.mpd_id {
            if manifest.id.as_ref() != Some(mpd_id) {
                return Err(mismatch("@mpdId"));
            }
        }
        if let Some(original) = &self.original_publish_time {
            if manifest.publish_time.as_ref() != Some(original) {
                return Err(mismatch("@originalPublishTime"));
            }
        }
        Ok(())
    }

    /// Applies the patch to `manifest`, all or nothing, and moves its `@publishTime`
    /// forward.
    pub fn apply(&self, manifest: &mut Manifest) -> MpdResult<()> {
        self.check_target(manifest)?;

        let mut operations = self.operations.clone();
        if let Some(publish_time) = &self.publish_time {
            operations.push(EditOperation::SetAttribute {
                selector: "/MPD".parse()?,
                name: "publishTime".to_string(),
                value: publish_time.format_value(),
            });
        }
        manifest.apply(&operations)?;
        tracing::info!(
            operations = self.operations.len(),
            publish_time = ?manifest.publish_time.as_ref().map(ToString::to_string),
            "Applied MPD patch"
        );
        Ok(())
    }
}

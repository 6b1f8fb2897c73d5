use regex::{Regex, Replacer};
use std::{collections::HashMap, sync::LazyLock};

use crate::{
    codec::{Node, NodeReader, NodeWriter},
    element::{Element, Extras},
    error::MpdResult,
};

use super::segment_base::MultipleSegmentBase;

// Identifiers take an optional `%0<width>d` format tag and nothing else, so padding is
// done by hand rather than through a printf implementation. `$$` is an escaped dollar
// sign. Unknown identifiers and variables without a value stay in place verbatim.
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\$|\$(RepresentationID|Number|Time|Bandwidth|SubNumber)(?:%0(\d+)d)?\$")
        .unwrap()
});

/// Values for the identifiers of a `SegmentTemplate` URL pattern.
#[derive(Debug, Clone, Default)]
pub struct TemplateVariables {
    args: HashMap<&'static str, String>,
}

impl TemplateVariables {
    pub const REPRESENTATION_ID: &'static str = "RepresentationID";
    pub const NUMBER: &'static str = "Number";
    pub const TIME: &'static str = "Time";
    pub const BANDWIDTH: &'static str = "Bandwidth";
    pub const SUB_NUMBER: &'static str = "SubNumber";

    pub fn new() -> Self {
        Self {
            args: HashMap::with_capacity(5),
        }
    }

    pub fn insert(&mut self, key: &'static str, value: impl ToString) -> &mut Self {
        self.args.insert(key, value.to_string());
        self
    }

    pub fn insert_optional(&mut self, key: &'static str, value: Option<impl ToString>) -> &mut Self {
        if let Some(value) = value {
            self.insert(key, value);
        }
        self
    }

    pub fn remove(&mut self, key: &'static str) -> &mut Self {
        self.args.remove(key);
        self
    }

    pub fn resolve(&self, template: &str) -> String {
        TEMPLATE_REGEX
            .replace_all(template, TemplateReplacer(&self.args))
            .to_string()
    }
}

struct TemplateReplacer<'a>(&'a HashMap<&'static str, String>);

impl Replacer for TemplateReplacer<'_> {
    fn replace_append(&mut self, caps: &regex::Captures<'_>, dst: &mut String) {
        let whole = &caps[0];
        let Some(key) = caps.get(1) else {
            // `$$`
            dst.push('$');
            return;
        };
        let Some(value) = self.0.get(key.as_str()) else {
            dst.push_str(whole);
            return;
        };

        match caps.get(2).map(|m| m.as_str().parse::<usize>()) {
            Some(Ok(width)) => dst.push_str(&format!("{value:0>width$}")),
            // a width that does not even fit in usize can not be honoured
            Some(Err(_)) => dst.push_str(whole),
            None => dst.push_str(value),
        }
    }
}

/// `SegmentTemplate`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentTemplate {
    pub multiple: MultipleSegmentBase,
    pub media: Option<String>,
    pub index: Option<String>,
    pub initialization: Option<String>,
    /// `@bitstreamSwitching`, a template for the bitstream switching segment.
    pub bitstream_switching: Option<String>,
    pub extras: Extras,
}

impl SegmentTemplate {
    pub fn inherit(&mut self, outer: &SegmentTemplate) {
        self.multiple.inherit(&outer.multiple);
        if self.media.is_none() {
            self.media = outer.media.clone();
        }
        if self.index.is_none() {
            self.index = outer.index.clone();
        }
        if self.initialization.is_none() {
            self.initialization = outer.initialization.clone();
        }
        if self.bitstream_switching.is_none() {
            self.bitstream_switching = outer.bitstream_switching.clone();
        }
    }
}

impl Node for SegmentTemplate {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            multiple: MultipleSegmentBase::read(&mut reader)?,
            media: reader.opt("media")?,
            index: reader.opt("index")?,
            initialization: reader.opt("initialization")?,
            bitstream_switching: reader.opt("bitstreamSwitching")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        self.multiple
            .write(NodeWriter::new(name))
            .attr("media", self.media.as_ref())
            .attr("index", self.index.as_ref())
            .attr("initialization", self.initialization.as_ref())
            .attr("bitstreamSwitching", self.bitstream_switching.as_ref())
            .finish(&self.extras)
    }
}

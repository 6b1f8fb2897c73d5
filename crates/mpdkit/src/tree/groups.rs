use crate::{
    base::CommonAttributes,
    codec::{Node, NodeReader, NodeWriter},
    descriptor::Descriptor,
    element::{Element, Extras},
    error::MpdResult,
    values::{ContentType, FrameRate, Ratio, UIntVector},
};

/// `ContentComponent`: one media component of a multiplexed representation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentComponent {
    pub id: Option<u64>,
    pub lang: Option<String>,
    pub content_type: Option<ContentType>,
    pub par: Option<Ratio>,
    pub tag: Option<String>,
    pub accessibilities: Vec<Descriptor>,
    pub roles: Vec<Descriptor>,
    pub ratings: Vec<Descriptor>,
    pub viewpoints: Vec<Descriptor>,
    pub extras: Extras,
}

impl Node for ContentComponent {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            id: reader.opt("id")?,
            lang: reader.opt("lang")?,
            content_type: reader.opt("contentType")?,
            par: reader.opt("par")?,
            tag: reader.opt("tag")?,
            accessibilities: reader.children("Accessibility")?,
            roles: reader.children("Role")?,
            ratings: reader.children("Rating")?,
            viewpoints: reader.children("Viewpoint")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .attr("id", self.id.as_ref())
            .attr("lang", self.lang.as_ref())
            .attr("contentType", self.content_type.as_ref())
            .attr("par", self.par.as_ref())
            .attr("tag", self.tag.as_ref())
            .children("Accessibility", &self.accessibilities)
            .children("Role", &self.roles)
            .children("Rating", &self.ratings)
            .children("Viewpoint", &self.viewpoints)
            .finish(&self.extras)
    }
}

/// `Subset`: a set of adaptation sets that may be presented together.
#[derive(Debug, Clone, PartialEq)]
pub struct Subset {
    pub contains: UIntVector,
    pub id: Option<String>,
    pub extras: Extras,
}

impl Node for Subset {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            contains: reader.req("contains")?,
            id: reader.opt("id")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .req_attr("contains", &self.contains)
            .attr("id", self.id.as_ref())
            .finish(&self.extras)
    }
}

/// `Preselection`: a combination of adaptation sets forming one experience.
#[derive(Debug, Clone, PartialEq)]
pub struct Preselection {
    pub common: CommonAttributes,
    pub id: Option<String>,
    /// Whitespace separated ids; the first one is the main adaptation set.
    pub preselection_components: String,
    pub lang: Option<String>,
    pub order: Option<String>,
    pub accessibilities: Vec<Descriptor>,
    pub roles: Vec<Descriptor>,
    pub ratings: Vec<Descriptor>,
    pub viewpoints: Vec<Descriptor>,
    pub extras: Extras,
}

impl Preselection {
    pub const DEFAULT_ID: &'static str = "1";

    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or(Self::DEFAULT_ID)
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.preselection_components.split_whitespace()
    }
}

impl Node for Preselection {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            common: CommonAttributes::read(&mut reader)?,
            id: reader.opt("id")?,
            preselection_components: reader.req("preselectionComponents")?,
            lang: reader.opt("lang")?,
            order: reader.opt("order")?,
            accessibilities: reader.children("Accessibility")?,
            roles: reader.children("Role")?,
            ratings: reader.children("Rating")?,
            viewpoints: reader.children("Viewpoint")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        let writer = NodeWriter::new(name)
            .attr("id", self.id.as_ref())
            .req_attr("preselectionComponents", &self.preselection_components)
            .attr("lang", self.lang.as_ref())
            .attr("order", self.order.as_ref());
        self.common
            .write(writer)
            .children("Accessibility", &self.accessibilities)
            .children("Role", &self.roles)
            .children("Rating", &self.ratings)
            .children("Viewpoint", &self.viewpoints)
            .finish(&self.extras)
    }
}

/// `InitializationSet`: a common initialization for adaptation sets across periods.
#[derive(Debug, Clone, PartialEq)]
pub struct InitializationSet {
    pub common: CommonAttributes,
    pub id: u64,
    pub in_all_periods: Option<bool>,
    pub content_type: Option<ContentType>,
    pub par: Option<Ratio>,
    pub max_width: Option<u64>,
    pub max_height: Option<u64>,
    pub max_frame_rate: Option<FrameRate>,
    pub initialization: Option<String>,
    pub accessibilities: Vec<Descriptor>,
    pub roles: Vec<Descriptor>,
    pub ratings: Vec<Descriptor>,
    pub viewpoints: Vec<Descriptor>,
    pub extras: Extras,
}

impl InitializationSet {
    pub fn in_all_periods(&self) -> bool {
        self.in_all_periods.unwrap_or(true)
    }
}

impl Node for InitializationSet {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        Ok(Self {
            common: CommonAttributes::read(&mut reader)?,
            id: reader.req("id")?,
            in_all_periods: reader.opt("inAllPeriods")?,
            content_type: reader.opt("contentType")?,
            par: reader.opt("par")?,
            max_width: reader.opt("maxWidth")?,
            max_height: reader.opt("maxHeight")?,
            max_frame_rate: reader.opt("maxFrameRate")?,
            initialization: reader.opt("initialization")?,
            accessibilities: reader.children("Accessibility")?,
            roles: reader.children("Role")?,
            ratings: reader.children("Rating")?,
            viewpoints: reader.children("Viewpoint")?,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        let writer = NodeWriter::new(name)
            .req_attr("id", &self.id)
            .attr("inAllPeriods", self.in_all_periods.as_ref())
            .attr("contentType", self.content_type.as_ref())
            .attr("par", self.par.as_ref())
            .attr("maxWidth", self.max_width.as_ref())
            .attr("maxHeight", self.max_height.as_ref())
            .attr("maxFrameRate", self.max_frame_rate.as_ref())
            .attr("initialization", self.initialization.as_ref());
        self.common
            .write(writer)
            .children("Accessibility", &self.accessibilities)
            .children("Role", &self.roles)
            .children("Rating", &self.ratings)
            .children("Viewpoint", &self.viewpoints)
            .finish(&self.extras)
    }
}

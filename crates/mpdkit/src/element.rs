use std::collections::BTreeMap;

/// A generic parsed XML element.
///
/// This is the boundary between the document model and whatever tokenizer produced the
/// markup: the model is built from an `Element` tree and serialized back into one.
/// Attribute names are kept qualified (`xlink:href`, `cenc:default_KID`), and attribute
/// order is normalized by the map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Element>,
    pub text: Option<String>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name
            .rsplit_once(':')
            .map(|(_, local)| local)
            .unwrap_or(&self.name)
    }
}

/// Attributes and children a typed node did not recognize.
///
/// They are carried through untouched so that extensions from foreign namespaces survive
/// a build / serialize round trip.
#[derive(Debug, Clone, Default)]
pub struct Extras {
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Element>,
    /// Names of all children, recognized or not, in document order. Serialization puts
    /// children back in this order. Not part of equality.
    pub layout: Vec<String>,
}

impl Extras {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty()
    }
}

impl PartialEq for Extras {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes && self.children == other.children
    }
}

impl Eq for Extras {}

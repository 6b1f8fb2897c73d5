//! Mapping between generic [`Element`]s and typed nodes.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::{
    element::{Element, Extras},
    error::{MpdError, MpdResult, ParseReason},
    values::MpdValue,
};

/// A typed node that can be built from, and serialized back into, a generic element.
///
/// `encode` takes the element name because several node types appear under more than
/// one name (a descriptor can be a `Role`, an `EssentialProperty`, ...).
pub trait Node: Sized {
    fn decode(element: &Element) -> MpdResult<Self>;

    fn encode(&self, name: &str) -> Element;
}

/// Consumes the attributes and children of one element. Whatever is not consumed ends
/// up in [`Extras`].
pub(crate) struct NodeReader<'a> {
    element: &'a Element,
    attributes: BTreeMap<&'a str, &'a str>,
    taken: Vec<bool>,
}

impl<'a> NodeReader<'a> {
    pub fn new(element: &'a Element) -> Self {
        Self {
            element,
            attributes: element
                .attributes
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
            taken: vec![false; element.children.len()],
        }
    }

    pub fn error(&self, reason: ParseReason) -> MpdError {
        MpdError::parse(&self.element.name, reason)
    }

    pub fn opt<T: MpdValue>(&mut self, name: &str) -> MpdResult<Option<T>> {
        let Some(value) = self.attributes.remove(name) else {
            return Ok(None);
        };
        match T::parse_value(value) {
            Some(parsed) => Ok(Some(parsed)),
            None => Err(self.error(ParseReason::InvalidValue {
                attribute: name.to_string(),
                value: value.to_string(),
                expected: T::EXPECTED.to_string(),
            })),
        }
    }

    pub fn req<T: MpdValue>(&mut self, name: &str) -> MpdResult<T> {
        self.opt(name)?
            .ok_or_else(|| self.error(ParseReason::MissingAttribute(name.to_string())))
    }

    pub fn children<T: Node>(&mut self, name: &str) -> MpdResult<Vec<T>> {
        let mut nodes = Vec::new();
        for (child, taken) in self.element.children.iter().zip(self.taken.iter_mut()) {
            if !*taken && child.name == name {
                *taken = true;
                nodes.push(T::decode(child)?);
            }
        }
        Ok(nodes)
    }

    pub fn child<T: Node>(&mut self, name: &str) -> MpdResult<Option<T>> {
        let mut nodes = self.children(name)?;
        if nodes.len() > 1 {
            return Err(self.error(ParseReason::TooManyChildren(name.to_string())));
        }
        Ok(nodes.pop())
    }

    /// Children kept as generic elements, e.g. the payload of a descriptor.
    pub fn raw_children(&mut self) -> Vec<Element> {
        let mut elements = Vec::new();
        for (child, taken) in self.element.children.iter().zip(self.taken.iter_mut()) {
            if !*taken {
                *taken = true;
                elements.push(child.clone());
            }
        }
        elements
    }

    pub fn text(&self) -> Option<String> {
        self.element.text.clone()
    }

    pub fn required_text(&self) -> MpdResult<String> {
        match self.element.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => Err(self.error(ParseReason::Malformed("text content is required".to_string()))),
        }
    }

    pub fn finish(self) -> Extras {
        let children: Vec<Element> = self
            .element
            .children
            .iter()
            .zip(self.taken.iter())
            .filter(|(_, taken)| !**taken)
            .map(|(child, _)| child.clone())
            .collect();

        if !self.attributes.is_empty() || !children.is_empty() {
            tracing::debug!(
                element = %self.element.name,
                attributes = ?self.attributes.keys().collect::<Vec<_>>(),
                children = ?children.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                "Preserving unrecognized content"
            );
        }

        Extras {
            attributes: self
                .attributes
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children,
            layout: self.element.children.iter().map(|c| c.name.clone()).collect(),
        }
    }
}

pub(crate) struct NodeWriter {
    element: Element,
}

impl NodeWriter {
    pub fn new(name: &str) -> Self {
        Self {
            element: Element::new(name),
        }
    }

    pub fn attr<T: MpdValue>(mut self, name: &str, value: Option<&T>) -> Self {
        if let Some(value) = value {
            self.element
                .attributes
                .insert(name.to_string(), value.format_value());
        }
        self
    }

    pub fn req_attr<T: MpdValue>(self, name: &str, value: &T) -> Self {
        self.attr(name, Some(value))
    }

    pub fn child<N: Node>(mut self, name: &str, node: Option<&N>) -> Self {
        if let Some(node) = node {
            self.element.children.push(node.encode(name));
        }
        self
    }

    pub fn children<N: Node>(mut self, name: &str, nodes: &[N]) -> Self {
        self.element
            .children
            .extend(nodes.iter().map(|node| node.encode(name)));
        self
    }

    pub fn elements(mut self, elements: &[Element]) -> Self {
        self.element.children.extend(elements.iter().cloned());
        self
    }

    pub fn text(mut self, text: Option<&str>) -> Self {
        self.element.text = text.map(String::from);
        self
    }

    pub fn finish(mut self, extras: &Extras) -> Element {
        for (k, v) in &extras.attributes {
            self.element
                .attributes
                .entry(k.clone())
                .or_insert_with(|| v.clone());
        }
        self.element.children.extend(extras.children.iter().cloned());
        if !extras.layout.is_empty() {
            let children = std::mem::take(&mut self.element.children);
            self.element.children = restore_layout(children, &extras.layout);
        }
        self.element
    }
}

/// Reorders children by the names recorded in `layout`.
///
/// Children of one name fill that name's slots in writer order. Surplus children of a name
/// follow its last slot, unused slots are dropped, and names missing from the layout go
/// to the end.
fn restore_layout(children: Vec<Element>, layout: &[String]) -> Vec<Element> {
    let mut last_slot: HashMap<&str, usize> = HashMap::new();
    for (i, name) in layout.iter().enumerate() {
        last_slot.insert(name.as_str(), i);
    }

    let mut pending: HashMap<&str, VecDeque<Element>> = HashMap::new();
    let mut unplaced = Vec::new();
    for child in children {
        match last_slot.get_key_value(child.name.as_str()) {
            Some((name, _)) => pending.entry(*name).or_default().push_back(child),
            None => unplaced.push(child),
        }
    }

    let mut ordered = Vec::with_capacity(layout.len() + unplaced.len());
    for (i, name) in layout.iter().enumerate() {
        let Some(queue) = pending.get_mut(name.as_str()) else {
            continue;
        };
        if last_slot.get(name.as_str()) == Some(&i) {
            ordered.extend(queue.drain(..));
        } else if let Some(child) = queue.pop_front() {
            ordered.push(child);
        }
    }
    ordered.extend(unplaced);
    ordered
}

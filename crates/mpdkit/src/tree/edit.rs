//! All-or-nothing edits addressed by a path selector.
//!
//! A selector is a restricted XPath: absolute element steps with optional predicates, and
//! an optional trailing attribute step.
//!
//! ```text
//! /MPD/Period[@id='p1']/AdaptationSet[2]/SegmentTemplate/@startNumber
//! ```
//!
//! `[n]` picks the n-th (1-based) of the candidates left by the predicates before it;
//! `[@name='value']` keeps candidates whose attribute matches. Every step must select
//! exactly one element.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;

use crate::{
    element::Element,
    error::{InvalidReason, MpdError, MpdResult, ParseReason},
};

use super::manifest::Manifest;

static STEP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/([A-Za-z_][\w:.\-]*)((?:\[[^\]]*\])*)").unwrap()
});

static ATTRIBUTE_STEP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/@([A-Za-z_][\w:.\-]*)$").unwrap());

static PREDICATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[\s*(?:(\d+)|@([A-Za-z_][\w:.\-]*)\s*=\s*(?:'([^']*)'|"([^"]*)"))\s*\]"#)
        .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Predicate {
    Position(usize),
    Attribute(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    name: String,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    raw: String,
    steps: Vec<Step>,
    attribute: Option<String>,
}

impl Selector {
    /// The trailing `@name` step, if any.
    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    /// Splits off the trailing attribute step.
    pub fn split_attribute(mut self) -> (Selector, Option<String>) {
        let attribute = self.attribute.take();
        if let Some(name) = &attribute {
            let suffix = format!("/@{name}");
            if let Some(raw) = self.raw.trim_end().strip_suffix(&suffix) {
                self.raw = raw.to_string();
            }
        }
        (self, attribute)
    }

    fn malformed(raw: &str, what: &str) -> MpdError {
        MpdError::parse(
            "Selector",
            ParseReason::Malformed(format!("{what} in selector {raw:?}")),
        )
    }

    fn parse_predicates(raw: &str, mut predicates: &str) -> MpdResult<Vec<Predicate>> {
        let mut parsed = Vec::new();
        while !predicates.is_empty() {
            let caps = PREDICATE_REGEX
                .captures(predicates)
                .filter(|caps| caps.get(0).is_some_and(|m| m.start() == 0))
                .ok_or_else(|| Self::malformed(raw, "unsupported predicate"))?;

            if let Some(position) = caps.get(1) {
                let position: usize = position
                    .as_str()
                    .parse()
                    .map_err(|_| Self::malformed(raw, "position out of range"))?;
                if position == 0 {
                    return Err(Self::malformed(raw, "positions start at 1"));
                }
                parsed.push(Predicate::Position(position));
            } else {
                let name = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
                let value = caps
                    .get(3)
                    .or(caps.get(4))
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                parsed.push(Predicate::Attribute(name.to_string(), value.to_string()));
            }
            predicates = &predicates[caps.get(0).map(|m| m.end()).unwrap_or(predicates.len())..];
        }
        Ok(parsed)
    }

    /// Finds the child index path of the selected element below `root`.
    fn locate(&self, root: &Element) -> MpdResult<Vec<usize>> {
        let Some((first, rest)) = self.steps.split_first() else {
            return Err(Self::malformed(&self.raw, "no element step"));
        };
        if !first.predicates.is_empty() {
            return Err(Self::malformed(&self.raw, "predicate on the root step"));
        }
        if first.name != root.name {
            return Err(MpdError::NotFound(self.raw.clone()));
        }

        let mut path = Vec::with_capacity(rest.len());
        let mut current = root;
        for step in rest {
            let mut candidates: Vec<usize> = current
                .children
                .iter()
                .enumerate()
                .filter(|(_, child)| child.name == step.name)
                .map(|(i, _)| i)
                .collect();

            for predicate in &step.predicates {
                candidates = match predicate {
                    Predicate::Position(n) => candidates.get(n - 1).copied().into_iter().collect(),
                    Predicate::Attribute(name, value) => candidates
                        .into_iter()
                        .filter(|&i| current.children[i].attribute(name) == Some(value.as_str()))
                        .collect(),
                };
            }

            let index = match candidates.as_slice() {
                [] => return Err(MpdError::NotFound(self.raw.clone())),
                [index] => *index,
                _ => {
                    return Err(MpdError::invalid(
                        &step.name,
                        InvalidReason::Constraint(format!(
                            "selector {:?} matches {} elements",
                            self.raw,
                            candidates.len()
                        )),
                    ))
                }
            };
            path.push(index);
            current = &current.children[index];
        }
        Ok(path)
    }
}

impl FromStr for Selector {
    type Err = MpdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut rest = raw.trim();
        let mut steps = Vec::new();
        let mut attribute = None;

        while !rest.is_empty() {
            if let Some(caps) = ATTRIBUTE_STEP_REGEX.captures(rest) {
                attribute = Some(caps[1].to_string());
                break;
            }
            let caps = STEP_REGEX
                .captures(rest)
                .ok_or_else(|| Self::malformed(raw, "unsupported step"))?;
            steps.push(Step {
                name: caps[1].to_string(),
                predicates: Self::parse_predicates(raw, &caps[2])?,
            });
            rest = &rest[caps[0].len()..];
        }

        if steps.is_empty() {
            return Err(Self::malformed(raw, "no element step"));
        }
        Ok(Self {
            raw: raw.to_string(),
            steps,
            attribute,
        })
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Where [`EditOperation::Insert`] puts new elements, relative to the selected one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InsertPosition {
    /// As the last children of the selected element.
    #[default]
    Append,
    /// As the first children of the selected element.
    Prepend,
    /// As siblings right before the selected element.
    Before,
    /// As siblings right after the selected element.
    After,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditOperation {
    Insert {
        selector: Selector,
        position: InsertPosition,
        elements: Vec<Element>,
    },
    /// Replaces the selected element with `elements`.
    Replace {
        selector: Selector,
        elements: Vec<Element>,
    },
    /// Removes the selected element, or the selected attribute.
    Remove { selector: Selector },
    /// Adds or overwrites an attribute of the selected element.
    SetAttribute {
        selector: Selector,
        name: String,
        value: String,
    },
}

fn element_at_mut<'a>(
    root: &'a mut Element,
    path: &[usize],
    selector: &Selector,
) -> MpdResult<&'a mut Element> {
    let mut current = root;
    for &index in path {
        current = current
            .children
            .get_mut(index)
            .ok_or_else(|| MpdError::NotFound(selector.raw.clone()))?;
    }
    Ok(current)
}

fn no_attribute_step(selector: &Selector) -> MpdResult<()> {
    match &selector.attribute {
        Some(_) => Err(Selector::malformed(
            &selector.raw,
            "attribute step not allowed here",
        )),
        None => Ok(()),
    }
}

/// Splits a path into the parent path and the index below it.
fn split_parent<'p>(path: &'p [usize], selector: &Selector) -> MpdResult<(&'p [usize], usize)> {
    match path.split_last() {
        Some((index, parent)) => Ok((parent, *index)),
        None => Err(MpdError::invalid(
            "MPD",
            InvalidReason::Constraint(format!(
                "selector {:?} addresses the root element",
                selector.raw
            )),
        )),
    }
}

impl EditOperation {
    pub fn selector(&self) -> &Selector {
        match self {
            Self::Insert { selector, .. }
            | Self::Replace { selector, .. }
            | Self::Remove { selector }
            | Self::SetAttribute { selector, .. } => selector,
        }
    }

    /// Applies this operation to a generic tree. On error the tree may be partially
    /// modified; callers work on a copy.
    pub(crate) fn apply_to(&self, root: &mut Element) -> MpdResult<()> {
        let selector = self.selector();
        let path = selector.locate(root)?;

        match self {
            Self::Insert {
                position, elements, ..
            } => {
                no_attribute_step(selector)?;
                match position {
                    InsertPosition::Append => {
                        let target = element_at_mut(root, &path, selector)?;
                        target.children.extend(elements.iter().cloned());
                    }
                    InsertPosition::Prepend => {
                        let target = element_at_mut(root, &path, selector)?;
                        target.children.splice(0..0, elements.iter().cloned());
                    }
                    InsertPosition::Before | InsertPosition::After => {
                        let (parent, index) = split_parent(&path, selector)?;
                        let at = match position {
                            InsertPosition::Before => index,
                            _ => index + 1,
                        };
                        let parent = element_at_mut(root, parent, selector)?;
                        parent.children.splice(at..at, elements.iter().cloned());
                    }
                }
            }
            Self::Replace { elements, .. } => {
                no_attribute_step(selector)?;
                let (parent, index) = split_parent(&path, selector)?;
                let parent = element_at_mut(root, parent, selector)?;
                parent
                    .children
                    .splice(index..=index, elements.iter().cloned());
            }
            Self::Remove { .. } => match &selector.attribute {
                Some(name) => {
                    let target = element_at_mut(root, &path, selector)?;
                    if target.attributes.remove(name).is_none() {
                        return Err(MpdError::NotFound(selector.raw.clone()));
                    }
                }
                None => {
                    let (parent, index) = split_parent(&path, selector)?;
                    element_at_mut(root, parent, selector)?.children.remove(index);
                }
            },
            Self::SetAttribute { name, value, .. } => {
                no_attribute_step(selector)?;
                let target = element_at_mut(root, &path, selector)?;
                target.attributes.insert(name.clone(), value.clone());
            }
        }
        Ok(())
    }
}

impl Manifest {
    /// Applies `operations` in order. Either all of them apply and the result is a valid
    /// manifest, or `self` is left untouched and the first error is returned.
    pub fn apply(&mut self, operations: &[EditOperation]) -> MpdResult<()> {
        let mut root = self.serialize();
        for operation in operations {
            operation.apply_to(&mut root)?;
        }
        *self = Manifest::build(&root)?;
        tracing::debug!(operations = operations.len(), "Applied manifest edits");
        Ok(())
    }

    pub fn insert_child(
        &mut self,
        selector: &str,
        position: InsertPosition,
        element: Element,
    ) -> MpdResult<()> {
        self.apply(&[EditOperation::Insert {
            selector: selector.parse()?,
            position,
            elements: vec![element],
        }])
    }

    pub fn replace_child(&mut self, selector: &str, element: Element) -> MpdResult<()> {
        self.apply(&[EditOperation::Replace {
            selector: selector.parse()?,
            elements: vec![element],
        }])
    }

    pub fn remove_child(&mut self, selector: &str) -> MpdResult<()> {
        self.apply(&[EditOperation::Remove {
            selector: selector.parse()?,
        }])
    }

    pub fn set_attribute(&mut self, selector: &str, name: &str, value: &str) -> MpdResult<()> {
        self.apply(&[EditOperation::SetAttribute {
            selector: selector.parse()?,
            name: name.to_string(),
            value: value.to_string(),
        }])
    }

    pub fn remove_attribute(&mut self, selector: &str, name: &str) -> MpdResult<()> {
        self.apply(&[EditOperation::Remove {
            selector: format!("{}/@{name}", selector.trim_end_matches('/')).parse()?,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Element {
        Element::new("MPD")
            .with_child(Element::new("Period").with_attribute("id", "p0"))
            .with_child(
                Element::new("Period")
                    .with_attribute("id", "p1")
                    .with_child(Element::new("AdaptationSet").with_attribute("id", "1"))
                    .with_child(Element::new("AdaptationSet").with_attribute("id", "2")),
            )
    }

    #[test]
    fn test_parse_selector() {
        let selector: Selector = "/MPD/Period[@id='p1']/AdaptationSet[2]/@id".parse().unwrap();
        assert_eq!(selector.steps.len(), 3);
        assert_eq!(
            selector.steps[1].predicates,
            vec![Predicate::Attribute("id".to_string(), "p1".to_string())]
        );
        assert_eq!(selector.steps[2].predicates, vec![Predicate::Position(2)]);
        assert_eq!(selector.attribute(), Some("id"));

        assert!("MPD/Period".parse::<Selector>().is_err());
        assert!("/MPD/Period[last()]".parse::<Selector>().is_err());
        assert!("/MPD/Period[0]".parse::<Selector>().is_err());
        assert!("/MPD/@id/Period".parse::<Selector>().is_err());
    }

    #[test]
    fn test_locate() {
        let root = root();
        let locate = |s: &str| s.parse::<Selector>().unwrap().locate(&root);

        assert_eq!(locate("/MPD").unwrap(), Vec::<usize>::new());
        assert_eq!(locate("/MPD/Period[2]/AdaptationSet[@id=\"2\"]").unwrap(), vec![1, 1]);
        assert!(matches!(
            locate("/MPD/Period[@id='p9']"),
            Err(MpdError::NotFound(_))
        ));
        assert!(matches!(locate("/MPD/Period"), Err(MpdError::Invalid { .. })));
    }

    #[test]
    fn test_apply_operations() {
        let mut root = root();
        EditOperation::Insert {
            selector: "/MPD/Period[@id='p0']".parse().unwrap(),
            position: InsertPosition::After,
            elements: vec![Element::new("Period").with_attribute("id", "new")],
        }
        .apply_to(&mut root)
        .unwrap();
        let ids: Vec<_> = root.children.iter().filter_map(|c| c.attribute("id")).collect();
        assert_eq!(ids, ["p0", "new", "p1"]);

        EditOperation::Remove {
            selector: "/MPD/Period[@id='p1']/AdaptationSet[1]".parse().unwrap(),
        }
        .apply_to(&mut root)
        .unwrap();
        assert_eq!(root.children[2].children.len(), 1);

        EditOperation::SetAttribute {
            selector: "/MPD/Period[@id='new']".parse().unwrap(),
            name: "start".to_string(),
            value: "PT10S".to_string(),
        }
        .apply_to(&mut root)
        .unwrap();
        assert_eq!(root.children[1].attribute("start"), Some("PT10S"));

        let missing = EditOperation::Remove {
            selector: "/MPD/Period[@id='new']/@duration".parse().unwrap(),
        }
        .apply_to(&mut root);
        assert!(matches!(missing, Err(MpdError::NotFound(_))));
    }
}

use std::{
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
};

use crate::{
    codec::{Node, NodeReader, NodeWriter},
    element::{Element, Extras},
    error::{MpdResult, ParseReason},
};

use super::{parse_integer, MpdValue};

/// A whitespace-separated list of unsigned integers (`UIntVectorType`).
///
/// A parsed list remembers its original spacing. Equality only looks at the values.
#[derive(Debug, Clone, Default)]
pub struct UIntVector {
    values: Vec<u64>,
    raw: Option<String>,
}

impl UIntVector {
    pub fn new(values: Vec<u64>) -> Self {
        Self { values, raw: None }
    }

    pub fn into_inner(self) -> Vec<u64> {
        self.values
    }
}

impl PartialEq for UIntVector {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl Eq for UIntVector {}

impl Hash for UIntVector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.values.hash(state);
    }
}

impl Deref for UIntVector {
    type Target = [u64];

    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl fmt::Display for UIntVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(raw) = &self.raw {
            return f.write_str(raw);
        }
        let values: Vec<String> = self.values.iter().map(u64::to_string).collect();
        f.write_str(&values.join(" "))
    }
}

impl MpdValue for UIntVector {
    const EXPECTED: &'static str = "whitespace separated unsigned integers";

    fn parse_value(s: &str) -> Option<Self> {
        let values = s
            .split_whitespace()
            .map(parse_integer)
            .collect::<Option<Vec<u64>>>()?;
        Some(Self {
            values,
            raw: Some(s.to_string()),
        })
    }

    fn format_value(&self) -> String {
        self.to_string()
    }
}

/// A [`UIntVector`] element carrying an `@id`, such as `InitializationGroup` or
/// `PresentationGroup`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UIntVWithId {
    pub id: u64,
    pub values: UIntVector,
    pub extras: Extras,
}

impl UIntVWithId {
    pub fn new(id: u64, values: Vec<u64>) -> Self {
        Self {
            id,
            values: UIntVector::new(values),
            extras: Extras::default(),
        }
    }
}

impl Deref for UIntVWithId {
    type Target = [u64];

    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl Node for UIntVWithId {
    fn decode(element: &Element) -> MpdResult<Self> {
        let mut reader = NodeReader::new(element);
        let id = reader.req("id")?;
        let text = reader.text().unwrap_or_default();
        let values = UIntVector::parse_value(&text).ok_or_else(|| {
            reader.error(ParseReason::InvalidValue {
                attribute: "#text".to_string(),
                value: text.clone(),
                expected: UIntVector::EXPECTED.to_string(),
            })
        })?;

        Ok(Self {
            id,
            values,
            extras: reader.finish(),
        })
    }

    fn encode(&self, name: &str) -> Element {
        NodeWriter::new(name)
            .req_attr("id", &self.id)
            .text(Some(&self.values.to_string()))
            .finish(&self.extras)
    }
}

//! Tree-shaped message payload

use crate::values::{TypeTag, Value};
use serde::{Deserialize, Serialize};

/// A named node in a message payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    name: String,
    body: ElementBody,
}

/// Contents of an element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementBody {
    /// Leaf value: declared type tag plus its wire text
    Scalar { tag: TypeTag, text: String },
    /// Ordered named sub-fields
    Complex(Vec<Element>),
    /// Repeated values or table rows
    Sequence(Vec<Element>),
}

impl Element {
    /// Create a scalar element from a typed value
    pub fn scalar(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            body: ElementBody::Scalar {
                tag: value.type_tag(),
                text: value.to_text(),
            },
        }
    }

    /// Create a scalar element from an explicit tag and raw text
    pub fn raw(name: impl Into<String>, tag: TypeTag, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: ElementBody::Scalar {
                tag,
                text: text.into(),
            },
        }
    }

    /// Create a complex element with named children
    pub fn complex(name: impl Into<String>, children: Vec<Element>) -> Self {
        Self {
            name: name.into(),
            body: ElementBody::Complex(children),
        }
    }

    /// Create a sequence element
    pub fn sequence(name: impl Into<String>, values: Vec<Element>) -> Self {
        Self {
            name: name.into(),
            body: ElementBody::Sequence(values),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &ElementBody {
        &self.body
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.body, ElementBody::Scalar { .. })
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.body, ElementBody::Sequence(_))
    }

    /// Declared type tag, for scalars
    pub fn type_tag(&self) -> Option<&TypeTag> {
        match &self.body {
            ElementBody::Scalar { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Number of values held: sequence length, or 1 for scalars and complex elements
    pub fn num_values(&self) -> usize {
        match &self.body {
            ElementBody::Sequence(values) => values.len(),
            _ => 1,
        }
    }

    /// Number of named sub-fields (0 for scalars and sequences)
    pub fn num_elements(&self) -> usize {
        match &self.body {
            ElementBody::Complex(children) => children.len(),
            _ => 0,
        }
    }

    /// Append a child to a complex or sequence element.
    ///
    /// Scalars are turned into a complex element holding only the new child.
    pub fn push(&mut self, child: Element) {
        match &mut self.body {
            ElementBody::Complex(children) | ElementBody::Sequence(children) => {
                children.push(child)
            }
            ElementBody::Scalar { .. } => self.body = ElementBody::Complex(vec![child]),
        }
    }

    /// Mutable access to a direct child, used while building payloads
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        match &mut self.body {
            ElementBody::Complex(children) | ElementBody::Sequence(children) => {
                children.iter_mut().find(|c| c.name == name)
            }
            ElementBody::Scalar { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_encodes_tag_and_text() {
        let e = Element::scalar("PX_LAST", 101.25);
        assert_eq!(e.name(), "PX_LAST");
        assert_eq!(e.type_tag(), Some(&TypeTag::Float64));
        assert_eq!(
            e.body(),
            &ElementBody::Scalar {
                tag: TypeTag::Float64,
                text: "101.25".to_string()
            }
        );
    }

    #[test]
    fn test_counts() {
        let row = Element::complex(
            "row",
            vec![Element::scalar("a", 1), Element::scalar("b", 2)],
        );
        let table = Element::sequence("table", vec![row.clone(), row]);
        assert_eq!(table.num_values(), 2);
        assert_eq!(table.num_elements(), 0);
        assert_eq!(Element::scalar("x", true).num_values(), 1);
    }

    #[test]
    fn test_push_and_child_mut() {
        let mut root = Element::complex("request", vec![]);
        root.push(Element::sequence("securities", vec![]));
        root.child_mut("securities")
            .unwrap()
            .push(Element::scalar("security", "IBM US Equity"));
        assert_eq!(root.num_elements(), 1);
        assert_eq!(root.child_mut("securities").unwrap().num_values(), 1);
        assert!(root.child_mut("fields").is_none());
    }
}

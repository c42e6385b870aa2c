//! Message walker
//!
//! Typed extraction of fields from an [`Element`] tree. Every lookup fails
//! explicitly: an absent field is [`WalkError::FieldNotFound`], which is
//! distinct from a field that is present with the wrong shape or type.

use crate::element::{Element, ElementBody};
use crate::error::{WalkError, WalkResult};
use crate::values::Value;
use chrono::NaiveDateTime;

/// A scalar leaf found by [`walk`], addressed by its dotted path
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub path: String,
    pub value: Value,
}

/// Look up a named sub-field of a complex element
pub fn get_field<'a>(element: &'a Element, name: &str) -> WalkResult<&'a Element> {
    match element.body() {
        ElementBody::Complex(children) => children
            .iter()
            .find(|child| child.name() == name)
            .ok_or_else(|| WalkError::FieldNotFound {
                element: element.name().to_string(),
                field: name.to_string(),
            }),
        _ => Err(WalkError::NotComplex(element.name().to_string())),
    }
}

pub fn has_field(element: &Element, name: &str) -> bool {
    get_field(element, name).is_ok()
}

/// Typed value of a scalar element, dispatched on its declared tag.
///
/// Unknown tags come back as [`Value::Unknown`] holding the raw text.
pub fn typed_value(element: &Element) -> WalkResult<Value> {
    match element.body() {
        ElementBody::Scalar { tag, text } => {
            Value::parse(tag, text).ok_or_else(|| WalkError::InvalidValue {
                field: element.name().to_string(),
                tag: tag.to_string(),
                text: text.clone(),
            })
        }
        _ => Err(WalkError::NotScalar(element.name().to_string())),
    }
}

/// Typed value of the named sub-field
pub fn get_value(element: &Element, name: &str) -> WalkResult<Value> {
    typed_value(get_field(element, name)?)
}

/// Sub-field rendered as text, whatever its type
pub fn get_string(element: &Element, name: &str) -> WalkResult<String> {
    Ok(get_value(element, name)?.to_string())
}

/// Numeric sub-field
pub fn get_f64(element: &Element, name: &str) -> WalkResult<f64> {
    let value = get_value(element, name)?;
    value.as_f64().ok_or_else(|| WalkError::WrongType {
        field: name.to_string(),
        expected: "number",
        actual: value.type_tag().to_string(),
    })
}

/// Date or datetime sub-field; plain dates are taken at midnight
pub fn get_datetime(element: &Element, name: &str) -> WalkResult<NaiveDateTime> {
    match get_value(element, name)? {
        Value::Datetime(dt) => Ok(dt),
        Value::Date(d) => Ok(d.and_time(chrono::NaiveTime::MIN)),
        other => Err(WalkError::WrongType {
            field: name.to_string(),
            expected: "datetime",
            actual: other.type_tag().to_string(),
        }),
    }
}

/// Named sub-fields of a complex element, in order
pub fn children(element: &Element) -> WalkResult<std::slice::Iter<'_, Element>> {
    match element.body() {
        ElementBody::Complex(children) => Ok(children.iter()),
        _ => Err(WalkError::NotComplex(element.name().to_string())),
    }
}

/// Iterator over the values of a sequence element
#[derive(Debug, Clone)]
pub struct Sequence<'a> {
    inner: std::slice::Iter<'a, Element>,
}

impl<'a> Iterator for Sequence<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Sequence<'_> {}

/// Walk the values of a sequence (one row per value for bulk fields)
pub fn walk_sequence(element: &Element) -> WalkResult<Sequence<'_>> {
    match element.body() {
        ElementBody::Sequence(values) => Ok(Sequence {
            inner: values.iter(),
        }),
        _ => Err(WalkError::NotASequence(element.name().to_string())),
    }
}

/// Flatten every scalar leaf below `element` into `path = value` pairs.
///
/// Sequence entries are addressed as `name[i]`. An element with no
/// sub-fields yields an empty list.
pub fn walk(element: &Element) -> WalkResult<Vec<FieldValue>> {
    let mut out = Vec::new();
    match element.body() {
        ElementBody::Scalar { .. } => out.push(FieldValue {
            path: element.name().to_string(),
            value: typed_value(element)?,
        }),
        _ => collect(element, "", &mut out)?,
    }
    Ok(out)
}

fn collect(element: &Element, prefix: &str, out: &mut Vec<FieldValue>) -> WalkResult<()> {
    match element.body() {
        ElementBody::Scalar { .. } => out.push(FieldValue {
            path: prefix.to_string(),
            value: typed_value(element)?,
        }),
        ElementBody::Complex(children) => {
            for child in children {
                collect(child, &join(prefix, child.name()), out)?;
            }
        }
        ElementBody::Sequence(values) => {
            for (i, value) in values.iter().enumerate() {
                let base = if prefix.is_empty() {
                    element.name()
                } else {
                    prefix
                };
                collect(value, &format!("{}[{}]", base, i), out)?;
            }
        }
    }
    Ok(())
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

//! Outbound requests

use crate::element::Element;
use crate::values::Value;
use serde::{Deserialize, Serialize};

/// A request to a named operation of a gateway service.
///
/// Built once through [`RequestBuilder`]; there are no mutators, so a sent
/// request cannot change underneath its response stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    service: String,
    operation: String,
    params: Element,
}

impl Request {
    pub fn builder(service: impl Into<String>, operation: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(service, operation)
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Parameter tree, a complex element named after the operation
    pub fn params(&self) -> &Element {
        &self.params
    }
}

/// Builder for [`Request`]
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    service: String,
    operation: String,
    fields: Vec<Element>,
}

impl RequestBuilder {
    pub fn new(service: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            operation: operation.into(),
            fields: Vec::new(),
        }
    }

    /// Append one value to the repeated parameter `name` (e.g. `securities`)
    pub fn append(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.sequence_mut(name).push(Element::scalar(name, value));
        self
    }

    /// Append every value of `values` to the repeated parameter `name`
    pub fn extend<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        for value in values {
            self = self.append(name, value);
        }
        self
    }

    /// Set the scalar parameter `name`, replacing any previous value
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Self {
        let element = Element::scalar(name, value);
        match self.fields.iter_mut().find(|e| e.name() == name) {
            Some(existing) => *existing = element,
            None => self.fields.push(element),
        }
        self
    }

    /// Append a row of named fields to the table parameter `table`
    /// (e.g. one `overrides` entry with `fieldId` and `value`)
    pub fn row<'a, I>(mut self, table: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let cells = fields
            .into_iter()
            .map(|(name, value)| Element::scalar(name, value))
            .collect();
        self.sequence_mut(table).push(Element::complex(table, cells));
        self
    }

    pub fn build(self) -> Request {
        Request {
            params: Element::complex(self.operation.clone(), self.fields),
            service: self.service,
            operation: self.operation,
        }
    }

    fn sequence_mut(&mut self, name: &str) -> &mut Element {
        let index = match self.fields.iter().position(|e| e.name() == name) {
            Some(index) => index,
            None => {
                self.fields.push(Element::sequence(name, Vec::new()));
                self.fields.len() - 1
            }
        };
        &mut self.fields[index]
    }
}

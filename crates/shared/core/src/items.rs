//! Per-item error results
//!
//! A response can carry errors for individual securities or fields while
//! the response as a whole succeeds. These are data to display, not faults.

use crate::element::Element;
use crate::error::WalkResult;
use crate::names::Names;
use crate::walker::{get_field, get_value, has_field, walk_sequence};
use std::fmt;

/// Error description shared by security errors and field exceptions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub source: String,
    pub code: i32,
    pub category: String,
    pub subcategory: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: String::new(),
            code: 0,
            category: category.into(),
            subcategory: String::new(),
            message: message.into(),
        }
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = subcategory.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>, code: i32) -> Self {
        self.source = source.into();
        self.code = code;
        self
    }

    /// Read an error description; `category` and `message` are required
    pub fn from_element(element: &Element) -> WalkResult<Self> {
        let text = |name: &str| -> WalkResult<String> {
            if has_field(element, name) {
                Ok(get_value(element, name)?.to_string())
            } else {
                Ok(String::new())
            }
        };
        let code = if has_field(element, Names::CODE) {
            match get_value(element, Names::CODE)?.as_f64() {
                Some(code) => code as i32,
                None => 0,
            }
        } else {
            0
        };
        Ok(Self {
            source: text(Names::SOURCE)?,
            code,
            category: get_value(element, Names::CATEGORY)?.to_string(),
            subcategory: text(Names::SUBCATEGORY)?,
            message: get_value(element, Names::MESSAGE)?.to_string(),
        })
    }

    pub fn to_element(&self, name: &str) -> Element {
        Element::complex(
            name,
            vec![
                Element::scalar(Names::SOURCE, self.source.as_str()),
                Element::scalar(Names::CODE, self.code),
                Element::scalar(Names::CATEGORY, self.category.as_str()),
                Element::scalar(Names::SUBCATEGORY, self.subcategory.as_str()),
                Element::scalar(Names::MESSAGE, self.message.as_str()),
            ],
        )
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subcategory.is_empty() {
            write!(f, "{}: {}", self.category, self.message)
        } else {
            write!(f, "{}/{}: {}", self.category, self.subcategory, self.message)
        }
    }
}

/// The gateway could not resolve a requested security
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityError {
    pub security: String,
    pub info: ErrorInfo,
}

impl fmt::Display for SecurityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.security, self.info)
    }
}

/// A requested field could not be served for one security
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldException {
    pub field_id: String,
    pub info: ErrorInfo,
}

impl FieldException {
    pub fn to_element(&self) -> Element {
        Element::complex(
            Names::FIELD_EXCEPTIONS,
            vec![
                Element::scalar(Names::FIELD_ID, self.field_id.as_str()),
                self.info.to_element(Names::ERROR_INFO),
            ],
        )
    }
}

impl fmt::Display for FieldException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_id, self.info)
    }
}

/// Security-level error of a `securityData` element, if any
pub fn security_error(security_data: &Element) -> WalkResult<Option<SecurityError>> {
    if !has_field(security_data, Names::SECURITY_ERROR) {
        return Ok(None);
    }
    let security = if has_field(security_data, Names::SECURITY) {
        get_value(security_data, Names::SECURITY)?.to_string()
    } else {
        String::new()
    };
    let info = ErrorInfo::from_element(get_field(security_data, Names::SECURITY_ERROR)?)?;
    Ok(Some(SecurityError { security, info }))
}

/// Field exceptions of a `securityData` (or subscription status) element
pub fn field_exceptions(parent: &Element) -> WalkResult<Vec<FieldException>> {
    if !has_field(parent, Names::FIELD_EXCEPTIONS) {
        return Ok(Vec::new());
    }
    walk_sequence(get_field(parent, Names::FIELD_EXCEPTIONS)?)?
        .map(|entry| {
            Ok(FieldException {
                field_id: get_value(entry, Names::FIELD_ID)?.to_string(),
                info: ErrorInfo::from_element(get_field(entry, Names::ERROR_INFO)?)?,
            })
        })
        .collect()
}

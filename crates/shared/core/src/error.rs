use crate::correlation::CorrelationId;
use thiserror::Error;

/// Structural errors raised while walking a message payload.
///
/// Per-item results such as `securityError` are not errors at this level;
/// they are parsed into [`crate::items`] types and reported per security.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalkError {
    #[error("Field '{field}' not found in '{element}'")]
    FieldNotFound { element: String, field: String },

    #[error("Field '{field}' has type {actual}, expected {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
        actual: String,
    },

    #[error("Element '{0}' is not a scalar")]
    NotScalar(String),

    #[error("Element '{0}' is not a sequence")]
    NotASequence(String),

    #[error("Element '{0}' has no named sub-fields")]
    NotComplex(String),

    #[error("Field '{field}' holds '{text}', which is not a valid {tag}")]
    InvalidValue {
        field: String,
        tag: String,
        text: String,
    },
}

impl WalkError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FieldNotFound { .. })
    }
}

pub type WalkResult<T> = std::result::Result<T, WalkError>;

/// Errors building a subscription list
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionListError {
    #[error("Correlation id {0} is already used by another subscription")]
    DuplicateCorrelationId(CorrelationId),

    #[error("Subscription topic is empty")]
    EmptyTopic,
}

//! Error types for the store.
//!
//! Missing optional sub-models are not errors: lenses degrade to `None` or a
//! no-op. Everything listed here is a genuine failure of the call that
//! produced it.

use serde_json::Value;
use thiserror::Error;

/// Errors raised by store operations and structural utilities.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A value could not be converted to or from its serialized tree.
    #[error("failed to (de)serialize state: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An operation that merges or writes keys was given a non-object value.
    #[error("expected {context} to be an object, found {found}")]
    NotAnObject {
        context: &'static str,
        found: &'static str,
    },

    /// A property key addressed an array element that does not exist.
    #[error("index {index} is out of bounds for an array of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A property write named a field the sub-model does not have.
    #[error("property '{key}' does not exist on the selected model")]
    UnknownProperty { key: String },

    /// A property key used on an array was not a valid index.
    #[error("key '{key}' is not a valid array index")]
    InvalidIndex { key: String },
}

/// Result alias used throughout the crate.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Name of a JSON value's kind, used in error messages.
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

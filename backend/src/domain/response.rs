//! Response envelope and field-level error taxonomy.
//!
//! A resolution always yields a [`GraphqlResponse`]: the best-effort data tree
//! plus every error met along the way, each attributed to its response path.

use serde::Serialize;
use serde_json::Value;

use super::ids::IdValidationError;
use super::ports::StoreError;

/// Field-level failures raised while resolving a selection tree.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    /// Malformed identifier, unknown enum value, missing argument or unknown
    /// field. Raised before any store access.
    #[error("{message}")]
    Validation { message: String },
    /// A non-null field produced null.
    #[error("Cannot return null for non-nullable field {type_name}.{field}.")]
    Nullability {
        type_name: &'static str,
        field: String,
    },
    /// The store failed while serving this field.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResolveError {
    /// Build a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Stable code placed under `extensions.code`.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Nullability { .. } => "NULLABILITY_ERROR",
            Self::Store(_) => "STORE_ERROR",
        }
    }
}

impl From<IdValidationError> for ResolveError {
    fn from(value: IdValidationError) -> Self {
        Self::validation(value.to_string())
    }
}

/// One step of a response path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Path from the data root to a field.
pub type ResponsePath = Vec<PathSegment>;

/// Machine-readable error metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorExtensions {
    pub code: &'static str,
}

/// Structured error attached to a response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<ResponsePath>,
    pub extensions: ErrorExtensions,
}

impl GraphqlError {
    /// Error raised while resolving the field at `path`.
    pub fn at(path: ResponsePath, error: &ResolveError) -> Self {
        Self {
            message: error.to_string(),
            path: Some(path),
            extensions: ErrorExtensions { code: error.code() },
        }
    }

    /// Error raised before execution started, with no path.
    pub fn request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            extensions: ErrorExtensions { code },
        }
    }
}

/// Data tree plus accumulated errors.
///
/// `data` is absent when the request failed before execution and `null` when
/// a null bubbled up to the root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphqlResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphqlError>,
}

impl GraphqlResponse {
    /// Response for a request rejected before execution.
    pub fn rejected(error: GraphqlError) -> Self {
        Self {
            data: None,
            errors: vec![error],
        }
    }

    /// Look up a value in the data tree by JSON pointer, e.g. `/users/0/name`.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.pointer(pointer))
    }
}

//! Query document adapter.
//!
//! Turns the JSON request body of a GraphQL call into the selection tree the
//! resolution driver consumes. Parsing is delegated to `graphql-parser`; this
//! module only picks the operation, substitutes variables, flattens
//! fragments and evaluates `@skip`/`@include`.

mod document;

pub use document::{DocumentError, build_selection};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::domain::{Field, GraphqlError, GraphqlResponse};

/// Request body for `POST /graphql`.
///
/// Example JSON:
/// `{"query":"query Q($id: UUID!) { user(id: $id) { name } }","variables":{"id":"…"}}`
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest {
    #[schema(example = "{ users { name } }")]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub variables: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl GraphqlRequest {
    /// Request with a query and nothing else.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: None,
            operation_name: None,
        }
    }

    /// Convert the request into a root selection set.
    ///
    /// # Examples
    /// ```
    /// use feedgraph::inbound::graphql::GraphqlRequest;
    ///
    /// let selection = GraphqlRequest::new("{ users { name } }")
    ///     .selection()
    ///     .expect("valid query");
    /// assert_eq!(selection[0].name, "users");
    /// ```
    pub fn selection(&self) -> Result<Vec<Field>, DocumentError> {
        let empty = Map::new();
        build_selection(
            &self.query,
            self.operation_name.as_deref(),
            self.variables.as_ref().unwrap_or(&empty),
        )
    }
}

impl From<DocumentError> for GraphqlError {
    fn from(value: DocumentError) -> Self {
        Self::request(value.code(), value.to_string())
    }
}

impl From<DocumentError> for GraphqlResponse {
    fn from(value: DocumentError) -> Self {
        Self::rejected(value.into())
    }
}

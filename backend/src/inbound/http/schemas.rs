//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema definitions required for OpenAPI documentation
//! using utoipa's external schema registration.
//!
//! The schema wrappers mirror the structure of their corresponding domain
//! types but live in the inbound adapter layer where framework concerns belong.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// A dependency such as the record store is not reachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
}

/// OpenAPI schema for [`crate::domain::Error`].
///
/// Transport error payload with machine-readable code and human-readable
/// message.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "request body is not a GraphQL request")]
    message: String,
}

/// OpenAPI schema for [`crate::domain::ErrorExtensions`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorExtensions)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorExtensionsSchema {
    /// Stable error code, e.g. `VALIDATION_ERROR` or `STORE_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    code: String,
}

/// OpenAPI schema for [`crate::domain::GraphqlError`].
#[derive(ToSchema)]
#[schema(as = crate::domain::GraphqlError)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct GraphqlErrorSchema {
    /// Human-readable message.
    #[schema(example = "identifier \"42\" must be a valid UUID")]
    message: String,
    /// Response keys and list indices leading to the failed field.
    #[schema(value_type = Option<Vec<Object>>, example = json!(["users", 1, "posts"]))]
    path: Option<Vec<serde_json::Value>>,
    /// Machine-readable metadata.
    extensions: ErrorExtensionsSchema,
}

/// OpenAPI schema for [`crate::domain::GraphqlResponse`].
///
/// `data` is absent when the request was rejected before execution.
#[derive(ToSchema)]
#[schema(as = crate::domain::GraphqlResponse)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct GraphqlResponseSchema {
    /// Response tree shaped like the selection set.
    #[schema(value_type = Option<Object>)]
    data: Option<serde_json::Value>,
    /// Errors met while resolving, omitted when empty.
    errors: Option<Vec<GraphqlErrorSchema>>,
}

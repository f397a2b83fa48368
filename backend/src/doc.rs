//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the HTTP surface. It registers:
//!
//! - **Paths**: the GraphQL endpoint and the health probes
//! - **Schemas**: domain type wrappers ([`ErrorSchema`], [`ErrorCodeSchema`],
//!   [`GraphqlResponseSchema`], [`GraphqlErrorSchema`]) that provide OpenAPI
//!   definitions without coupling domain types to the utoipa framework
//!
//! The generated specification is exported via
//! `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::graphql::GraphqlRequest;
use crate::inbound::http::schemas::{
    ErrorCodeSchema, ErrorExtensionsSchema, ErrorSchema, GraphqlErrorSchema,
    GraphqlResponseSchema,
};
use utoipa::OpenApi;

/// OpenAPI document for the HTTP surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "feedgraph API",
        description = "GraphQL query endpoint over member tiers, users, profiles, posts and subscriptions, plus health probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::graphql::execute_query,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        GraphqlRequest,
        GraphqlResponseSchema,
        GraphqlErrorSchema,
        ErrorExtensionsSchema,
        ErrorSchema,
        ErrorCodeSchema
    )),
    tags(
        (name = "graphql", description = "Query execution"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying OpenAPI document structure.

    use super::*;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    // Note: utoipa replaces :: with . in schema names
    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";
    const RESPONSE_SCHEMA_NAME: &str = "crate.domain.GraphqlResponse";

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn openapi_error_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get(ERROR_SCHEMA_NAME).expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
    }

    #[test]
    fn openapi_response_schema_has_data_and_errors() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let response_schema = schemas
            .get(RESPONSE_SCHEMA_NAME)
            .expect("GraphqlResponse schema");

        assert_object_schema_has_field(response_schema, "data");
        assert_object_schema_has_field(response_schema, "errors");
    }

    #[test]
    fn openapi_lists_graphql_and_health_paths() {
        let doc = ApiDoc::openapi();
        for path in ["/graphql", "/health/ready", "/health/live"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}

//! GraphQL endpoint.
//!
//! ```text
//! POST /graphql {"query":"{ users { name } }"}
//! POST /        {"query":"{ users { name } }"}
//! ```
//!
//! Every well-formed JSON body is answered with `200` and a response
//! envelope; query failures are reported inside it. Only bodies that are not
//! a JSON request object are rejected at the HTTP level.

use actix_web::{post, web};
use tracing::debug;

use crate::domain::{Error, GraphqlResponse};
use crate::inbound::graphql::GraphqlRequest;
use crate::inbound::http::schemas::{ErrorSchema, GraphqlResponseSchema};
use crate::inbound::http::state::HttpState;

/// JSON extractor settings for GraphQL requests.
///
/// Malformed bodies become a `400` carrying the domain error payload.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        Error::invalid_request(format!("request body is not a GraphQL request: {err}")).into()
    })
}

async fn respond(state: &HttpState, request: GraphqlRequest) -> web::Json<GraphqlResponse> {
    let response = match request.selection() {
        Ok(selection) => state.driver.execute(&selection).await,
        Err(err) => {
            debug!(error = %err, code = err.code(), "query document rejected");
            GraphqlResponse::from(err)
        }
    };
    web::Json(response)
}

/// Execute a GraphQL query.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use feedgraph::inbound::http::graphql::{execute_query, json_config};
///
/// let app = App::new().app_data(json_config()).service(execute_query);
/// ```
#[utoipa::path(
    post,
    path = "/graphql",
    request_body = GraphqlRequest,
    responses(
        (status = 200, description = "Response envelope with data and field errors", body = GraphqlResponseSchema),
        (status = 400, description = "Body is not a GraphQL request", body = ErrorSchema)
    ),
    tags = ["graphql"],
    operation_id = "executeQuery"
)]
#[post("/graphql")]
pub async fn execute_query(
    state: web::Data<HttpState>,
    payload: web::Json<GraphqlRequest>,
) -> web::Json<GraphqlResponse> {
    respond(&state, payload.into_inner()).await
}

/// Execute a GraphQL query posted to the site root.
#[post("/")]
pub async fn execute_query_at_root(
    state: web::Data<HttpState>,
    payload: web::Json<GraphqlRequest>,
) -> web::Json<GraphqlResponse> {
    respond(&state, payload.into_inner()).await
}

//! Health endpoints: liveness & readiness probes for orchestration and load balancers.
//! Document endpoints in OpenAPI via Utoipa.
use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::http::header::{self, HeaderValue};
use actix_web::{HttpResponse, ResponseError, get, web};
use tracing::warn;

use crate::domain::{Error, RecordKind};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Shared health state for readiness and liveness checks.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
        }
    }
}

impl HealthState {
    /// Create a new health state starting as not ready but live.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the service as ready.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Flag the service as unhealthy so liveness checks fail fast during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Return readiness state.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Return liveness state.
    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn probe_response(probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }

    fn unavailable(error: &Error) -> HttpResponse {
        let mut response = error.error_response();
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}

/// Readiness probe. Return 200 once the server is initialised and the record
/// store answers a member tier scan; return 503 otherwise. A store failure
/// carries the domain error payload.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server or record store is not ready", body = ErrorSchema)
    )
)]
#[get("/health/ready")]
pub async fn ready(health: web::Data<HealthState>, state: web::Data<HttpState>) -> HttpResponse {
    if !health.is_ready() {
        return HealthState::probe_response(false);
    }
    match state.store.scan_all(RecordKind::MemberTier).await {
        Ok(_) => HealthState::probe_response(true),
        Err(error) => {
            warn!(%error, "readiness probe could not reach the record store");
            HealthState::unavailable(&Error::service_unavailable("record store is not reachable"))
        }
    }
}

/// Liveness probe. Return 200 while the process is marked alive and 503 once draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(health: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(health.is_alive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;

    use crate::domain::ports::StoreError;
    use crate::outbound::memory::InMemoryRecordStore;
    use crate::test_support::{RecordingStore, StoreCall};

    async fn probe(uri: &str, health: HealthState, store: RecordingStore) -> StatusCode {
        probe_with_body(uri, health, store).await.0
    }

    async fn probe_with_body(
        uri: &str,
        health: HealthState,
        store: RecordingStore,
    ) -> (StatusCode, actix_web::web::Bytes) {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(health))
                .app_data(web::Data::new(HttpState::new(Arc::new(store))))
                .service(ready)
                .service(live),
        )
        .await;
        let request = actix_test::TestRequest::get().uri(uri).to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
            Some(&b"no-store"[..])
        );
        let status = response.status();
        (status, actix_test::read_body(response).await)
    }

    fn healthy_store() -> RecordingStore {
        RecordingStore::new(Arc::new(InMemoryRecordStore::default()))
    }

    fn ready_state() -> HealthState {
        let state = HealthState::new();
        state.mark_ready();
        state
    }

    #[rstest]
    #[actix_web::test]
    async fn ready_waits_for_initialisation() {
        assert_eq!(
            probe("/health/ready", HealthState::new(), healthy_store()).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            probe("/health/ready", ready_state(), healthy_store()).await,
            StatusCode::OK
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn ready_fails_when_the_store_is_unreachable() {
        let store = healthy_store().fail_when(
            |call| matches!(call, StoreCall::ScanAll { .. }),
            StoreError::connection("refused"),
        );
        let (status, body) = probe_with_body("/health/ready", ready_state(), store).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let payload: Error = serde_json::from_slice(&body).expect("error payload");
        assert_eq!(
            payload,
            Error::service_unavailable("record store is not reachable")
        );
    }

    #[rstest]
    #[actix_web::test]
    async fn live_reports_draining() {
        let state = HealthState::new();
        assert_eq!(
            probe("/health/live", HealthState::new(), healthy_store()).await,
            StatusCode::OK
        );
        state.mark_unhealthy();
        assert_eq!(
            probe("/health/live", state, healthy_store()).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}

//! Shared helper utilities for backend integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`; this
//! module gives them one way to load the bundled dataset and run query text
//! through the document adapter and the resolution driver.
#![allow(dead_code, reason = "each test crate uses a subset of the helpers")]

use std::path::PathBuf;
use std::sync::Arc;

use feedgraph::domain::ports::RecordStore;
use feedgraph::domain::{GraphqlResponse, ResolutionDriver};
use feedgraph::inbound::graphql::GraphqlRequest;
use feedgraph::outbound::memory::{Dataset, InMemoryRecordStore};
use feedgraph::test_support::RecordingStore;
use serde_json::Value;

pub const ADA: &str = "3f1b6c2e-8d4a-4b7e-9a61-2c5d8e0f1a01";
pub const GRACE: &str = "3f1b6c2e-8d4a-4b7e-9a61-2c5d8e0f1a02";
pub const ALAN: &str = "3f1b6c2e-8d4a-4b7e-9a61-2c5d8e0f1a03";

/// Path of the dataset shipped with the service.
pub fn seed_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("seed.json")
}

/// In-memory store holding the bundled dataset.
pub fn seed_store() -> InMemoryRecordStore {
    let dataset = Dataset::load(&seed_path()).expect("bundled seed loads");
    InMemoryRecordStore::try_from(dataset).expect("bundled seed is consistent")
}

/// Recording wrapper around the bundled dataset.
pub fn recording_seed_store() -> Arc<RecordingStore> {
    Arc::new(RecordingStore::new(Arc::new(seed_store())))
}

/// Run `query` with `variables` (a JSON object or `null`).
pub async fn run(store: Arc<RecordingStore>, query: &str, variables: Value) -> GraphqlResponse {
    let request = GraphqlRequest {
        query: query.to_owned(),
        variables: match variables {
            Value::Object(map) => Some(map),
            _ => None,
        },
        operation_name: None,
    };
    let store: Arc<dyn RecordStore> = store;
    match request.selection() {
        Ok(selection) => ResolutionDriver::new(store).execute(&selection).await,
        Err(err) => GraphqlResponse::from(err),
    }
}

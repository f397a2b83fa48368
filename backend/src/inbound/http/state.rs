//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on the record store port and the resolution driver, and remain
//! testable against an in-memory store.

use std::sync::Arc;

use crate::domain::ResolutionDriver;
use crate::domain::ports::RecordStore;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub store: Arc<dyn RecordStore>,
    pub driver: ResolutionDriver,
}

impl HttpState {
    /// Build state around one record store.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use feedgraph::inbound::http::state::HttpState;
    /// use feedgraph::outbound::memory::InMemoryRecordStore;
    ///
    /// let state = HttpState::new(Arc::new(InMemoryRecordStore::default()));
    /// let _driver = state.driver.clone();
    /// ```
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            driver: ResolutionDriver::new(Arc::clone(&store)),
            store,
        }
    }
}

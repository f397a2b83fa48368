//! Field-resolution engine and its adapters.
//!
//! The engine lives in [`domain`]; [`inbound`] turns HTTP requests and query
//! documents into selection trees and [`outbound`] provides record stores.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by tooling.
pub use doc::ApiDoc;

//! PostgreSQL persistence adapter using Diesel.
//!
//! - **Thin adapter**: `DieselRecordStore` only translates between Diesel rows
//!   and domain records. No resolution logic lives here.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Async pooling**: connections come from a `bb8` pool through
//!   `diesel-async`.
//!
//! # Example
//!
//! ```no_run
//! use feedgraph::outbound::persistence::{DbPool, DieselRecordStore, PoolConfig};
//!
//! # async fn build() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/feedgraph")).await?;
//! let store = DieselRecordStore::new(pool);
//! # let _ = store;
//! # Ok(())
//! # }
//! ```

mod diesel_error_mapping;
mod diesel_record_store;
mod models;
mod pool;
mod schema;

pub use diesel_record_store::DieselRecordStore;
pub use pool::{DbPool, PoolConfig, PoolError};

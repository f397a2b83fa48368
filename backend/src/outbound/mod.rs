//! Outbound adapters implementing domain ports.
//!
//! - **memory**: in-memory record store seeded from a JSON dataset
//! - **persistence**: PostgreSQL record store using Diesel
//!
//! Adapters convert between domain records and storage representations. They
//! contain no resolution logic.

pub mod memory;
pub mod persistence;

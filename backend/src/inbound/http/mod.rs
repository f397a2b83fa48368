//! HTTP inbound adapter exposing the GraphQL endpoint and health probes.

pub mod error;
pub mod graphql;
pub mod health;
pub mod schemas;
pub mod state;

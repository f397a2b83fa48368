//! Inbound adapters that translate external requests into calls on the
//! resolution engine while keeping framework details at the edge.
//!
//! Query documents are converted under [`graphql`]; HTTP handlers live under
//! [`http`].

pub mod graphql;
pub mod http;

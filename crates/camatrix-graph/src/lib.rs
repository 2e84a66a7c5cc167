//! camatrix-graph: Microsoft Graph directory client
//!
//! Everything the matrix needs from the directory funnels through
//! [`GraphClient`]: bearer-token acquisition, paginated collection fetches
//! following `@odata.nextLink`, and a TTL-bounded response cache absorbing
//! repeated lookups of the same group or user within one run.
//!
//! The client implements the `camatrix-domain` seams
//! ([`camatrix_domain::DirectoryReader`], [`camatrix_domain::GroupReader`]),
//! so the domain crate never sees HTTP.

pub mod auth;
pub mod cache;
pub mod client;
pub mod error;
pub mod odata;

pub use auth::TokenProvider;
pub use cache::ResponseCache;
pub use client::GraphClient;
pub use error::{GraphError, GraphResult};

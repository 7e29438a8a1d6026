//! Main ravenlayer crate providing a session-scoped client for RavenDB-style document databases.
//!
//! This crate is the primary entry point for users of ravenlayer. It re-exports the core
//! types from the sub-crates and provides access to the available transports.
//!
//! # Features
//!
//! - **Unit-of-work sessions** - Every document is fetched at most once per session
//! - **Change tracking** - Fetch-time snapshots let a session report what was modified
//! - **Related documents** - Include fields are resolved with the fewest possible round-trips
//! - **Queryable results** - Filter, order and project loaded documents in memory
//!
//! # Quick Start
//!
//! ```ignore
//! use ravenlayer::{prelude::*, memory::InMemoryTransport};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ClientError> {
//!     let transport = InMemoryTransport::builder().build().await?;
//!     transport.put("Northwind", "orders/1", json!({ "Company": "companies/85", "Freight": 32.38 })).await?;
//!     transport.put("Northwind", "companies/85", json!({ "Name": "Vins et alcools Chevalier" })).await?;
//!
//!     let store = DocumentStore::new(transport, ConnectionInfo::new("localhost", 8080, "Northwind"));
//!     let session = store.open_session();
//!
//!     // One round-trip for the order and its company
//!     let loaded = session.load_with_includes("orders/1", ["Company"]).await?;
//!     let company = loaded.includes.first();
//!
//!     // Served from the session cache
//!     let again = session.load("companies/85").await?;
//!
//!     // Change tracking
//!     if let Some(order) = loaded.document() {
//!         order.set("Freight", 40.0)?;
//!     }
//!     assert!(session.is_dirty("orders/1").await);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! A typed `DocumentStore` can be converted into a store over a boxed transport with
//! `into_dyn`, which allows choosing the transport at runtime:
//!
//! ```ignore
//! use ravenlayer::{prelude::*, memory::InMemoryTransport};
//!
//! let store: DynDocumentStore = DocumentStore::new(InMemoryTransport::new(), ConnectionInfo::default())
//!     .into_dyn();
//! let session = store.open_session();
//! ```
//!
//! # Transports
//!
//! - [`memory`] - In-memory transport for development and testing
//! - `http` - HTTP transport for a real server (requires the `http` feature)

pub mod prelude;

pub use ravenlayer_core::{
    comparable, connection, document, error, load, queryable, session, session_cache, store,
    transport,
};

// Re-export JSON types for convenience
pub use serde_json;

/// In-memory transport implementations.
pub mod memory {
    pub use ravenlayer_memory::{InMemoryTransport, InMemoryTransportBuilder, RecordedRequest};
}

/// HTTP transport implementations.
///
/// This module is only available when the `http` feature is enabled.
#[cfg(feature = "http")]
pub mod http {
    pub use ravenlayer_http::{HttpTransport, HttpTransportBuilder};
}

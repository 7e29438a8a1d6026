//! In-memory transport for ravenlayer.
//!
//! This crate provides a thread-safe, in-memory implementation of the `Transport` trait.
//! It plays the part of the database server without a network, and records every request
//! it receives so that the number of round-trips a session makes can be asserted on.
//!
//! # Features
//!
//! - **Per-database storage** - Documents are grouped by the database named in the connection
//! - **Server-side includes** - Batch requests resolve include fields like the server does
//! - **Request log** - Every `get` and `post` is recorded in arrival order
//! - **Failure injection** - The next request can be made to fail with any client error
//!
//! # Quick Start
//!
//! ```ignore
//! use ravenlayer::{prelude::*, memory::InMemoryTransport};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = InMemoryTransport::builder().build().await?;
//!     transport.put("Default", "docs/1", json!({ "Title": "Hello" })).await?;
//!
//!     let store = DocumentStore::new(transport.clone(), ConnectionInfo::default());
//!     let loaded = store.open_session().load("docs/1").await?;
//!
//!     assert_eq!(loaded.results.len(), 1);
//!     assert_eq!(transport.request_count().await, 1);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as ravenlayer_memory;

pub mod transport;

pub use transport::{InMemoryTransport, InMemoryTransportBuilder, RecordedRequest};

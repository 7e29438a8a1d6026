//! A session-scoped client access layer for RavenDB-style HTTP document databases.
//!
//! This crate is the core of the ravenlayer project and provides:
//!
//! - **Documents** ([`document`]) - Schema-less documents, immutable metadata and snapshots
//! - **Queryable sequences** ([`queryable`]) - In-memory query operators over load results
//! - **Session cache** ([`session_cache`]) - Fetch-time snapshots and change tracking
//! - **Sessions** ([`session`]) - The load orchestrator: cache, single fetch, or batch
//! - **Transports** ([`transport`]) - The network boundary sessions fetch through
//! - **Document store** ([`store`]) - Binds a transport to a database and opens sessions
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use ravenlayer::{prelude::*, memory::InMemoryTransport};
//!
//! let store = DocumentStore::new(transport, ConnectionInfo::default());
//! let session = store.open_session();
//!
//! let loaded = session.load(["docs/1", "docs/2"]).await?;
//! let newest = loaded.results.order_by("Created").last();
//! ```

#[allow(unused_extern_crates)]
extern crate self as ravenlayer_core;

pub mod comparable;
pub mod connection;
pub mod document;
pub mod error;
pub mod load;
pub mod queryable;
pub mod session;
pub mod session_cache;
pub mod store;
pub mod transport;

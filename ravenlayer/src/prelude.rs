//! Convenient re-exports of commonly used types from ravenlayer.
//!
//! ```ignore
//! use ravenlayer::prelude::*;
//! ```
//!
//! This provides access to:
//! - Documents, metadata and snapshots
//! - Stores, sessions and load results
//! - Queryable sequences
//! - Transports and their builders
//! - Error types

pub use ravenlayer_core::{
    connection::ConnectionInfo,
    document::{Document, FieldChange, Metadata, Snapshot},
    error::{ClientError, ClientResult},
    load::{Identifiers, Loaded},
    queryable::{FieldAccess, Queryable},
    session::DocumentSession,
    store::{DocumentStore, DynDocumentStore, IntoDynDocumentStore},
    transport::{BatchResponse, Transport, TransportBuilder},
};

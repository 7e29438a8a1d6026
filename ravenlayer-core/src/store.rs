//! Document store: a transport bound to a database, and the factory for sessions.
//!
//! - [`DocumentStore`] - Typed store for a specific transport implementation
//! - [`DynDocumentStore`] - Store over a boxed transport for runtime selection
//!
//! # Example
//!
//! ```ignore
//! use ravenlayer::{prelude::*, memory::InMemoryTransport};
//!
//! let store = DocumentStore::new(transport, ConnectionInfo::new("localhost", 8080, "Northwind"));
//! let session = store.open_session();
//! let order = session.load("orders/1").await?;
//! ```

use std::sync::Arc;

use crate::{connection::ConnectionInfo, session::DocumentSession, transport::Transport};

/// A transport bound to connection settings.
///
/// The store itself holds no documents. Each [`DocumentSession`] it opens has its own cache,
/// so discarding a session and opening a new one starts from a clean slate.
#[derive(Debug)]
pub struct DocumentStore<T: Transport> {
    transport: Arc<T>,
    connection: ConnectionInfo,
}

impl<T: Transport + 'static> DocumentStore<T> {
    /// Creates a new document store with the given transport and connection settings.
    pub fn new(transport: T, connection: ConnectionInfo) -> Self {
        Self {
            transport: Arc::new(transport),
            connection,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn connection(&self) -> &ConnectionInfo {
        &self.connection
    }

    /// Opens a session against the store's database.
    pub fn open_session(&self) -> DocumentSession<T> {
        DocumentSession::new(Arc::clone(&self.transport), self.connection.clone())
    }

    /// Opens a session against another database on the same server.
    pub fn open_session_for(&self, database: &str) -> DocumentSession<T> {
        DocumentSession::new(
            Arc::clone(&self.transport),
            ConnectionInfo {
                database: database.to_string(),
                ..self.connection.clone()
            },
        )
    }
}

/// A store whose transport is chosen at runtime.
pub type DynDocumentStore = DocumentStore<Box<dyn Transport>>;

/// Conversion trait for erasing the transport type of a store.
pub trait IntoDynDocumentStore {
    /// Converts this store into a store over a boxed transport.
    fn into_dyn(self) -> DynDocumentStore;
}

impl<T: Transport + 'static> IntoDynDocumentStore for DocumentStore<T> {
    fn into_dyn(self) -> DynDocumentStore {
        DocumentStore::new(Box::new(self.transport) as Box<dyn Transport>, self.connection)
    }
}

//! Document sessions: the load orchestrator.
//!
//! A [`DocumentSession`] is one unit of work. It owns a [`SessionCache`] and decides, for
//! every load, whether the request can be answered from the cache, needs a single fetch,
//! or needs a batched fetch:
//!
//! | request                                   | network                                           |
//! |-------------------------------------------|---------------------------------------------------|
//! | one id, cached                            | none; an independent copy of the snapshot is returned |
//! | one id, not cached                        | one `get`                                         |
//! | one id + includes, primary not cached     | one `post` for `[id]` with the include names      |
//! | one id + includes, primary cached         | none, one `get`, or one `post` for 0, 1, or more uncached includes |
//! | many ids (with or without includes)       | always one `post`                                 |
//!
//! Everything fetched is recorded in the cache before it is returned. Concurrent single
//! fetches of the same identifier share one in-flight request.
//!
//! # Example
//!
//! ```ignore
//! use ravenlayer::prelude::*;
//!
//! let session = store.open_session();
//! let loaded = session.load_with_includes("orders/1", ["CustomerId"]).await?;
//! let order = loaded.document().expect("order exists");
//! let customer = loaded.includes.first();
//!
//! order.set("Status", "Shipped")?;
//! assert!(session.is_dirty("orders/1").await);
//! ```

use futures::future::{BoxFuture, FutureExt, Shared};
use mea::{mutex::Mutex, rwlock::RwLock};
use serde_json::Value;
use std::{
    collections::{HashMap, HashSet},
    fmt,
    slice,
    sync::Arc,
};
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use crate::{
    connection::ConnectionInfo,
    document::{Document, FieldChange, Snapshot},
    error::ClientResult,
    load::{Identifiers, Loaded},
    queryable::Queryable,
    session_cache::SessionCache,
    transport::Transport,
};

type PendingGet = Shared<BoxFuture<'static, ClientResult<Option<Document>>>>;

/// A unit of work against one database.
///
/// Sessions are created by [`DocumentStore::open_session`](crate::store::DocumentStore::open_session)
/// and are meant to be short-lived; the cache grows for as long as the session is kept.
/// All operations take `&self` and may run concurrently.
pub struct DocumentSession<T: Transport> {
    id: Uuid,
    transport: Arc<T>,
    connection: ConnectionInfo,
    cache: RwLock<SessionCache>,
    in_flight: Mutex<HashMap<String, PendingGet>>,
}

impl<T: Transport> fmt::Debug for DocumentSession<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentSession")
            .field("id", &self.id)
            .field("connection", &self.connection)
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl<T: Transport + 'static> DocumentSession<T> {
    pub(crate) fn new(transport: Arc<T>, connection: ConnectionInfo) -> Self {
        let id = Uuid::new_v4();
        debug!(session = %id, database = %connection.database, "session opened");

        Self {
            id,
            transport,
            connection,
            cache: RwLock::new(SessionCache::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn connection(&self) -> &ConnectionInfo {
        &self.connection
    }

    /// Loads one document or a batch of documents.
    ///
    /// A batch always goes to the network. Identifiers this session already tracks are
    /// answered with their tracked handles rather than the re-fetched copies, so edits made
    /// through either load stay visible to [`is_dirty`](DocumentSession::is_dirty).
    ///
    /// # Errors
    ///
    /// Any transport error is returned unchanged.
    pub async fn load(&self, ids: impl Into<Identifiers>) -> ClientResult<Loaded> {
        self.load_with_includes(ids, Vec::<String>::new()).await
    }

    /// Loads documents and resolves the documents referenced by `includes`.
    ///
    /// Each include names a field of the primary document whose string value is the
    /// identifier of a related document. Fields that are missing, null, or not strings are
    /// skipped and do not appear in [`Loaded::includes`]. An empty include list is the same
    /// as [`load`](DocumentSession::load).
    ///
    /// # Errors
    ///
    /// Any transport error is returned unchanged. Include resolution fails as a unit.
    #[instrument(level = "debug", skip_all, fields(session = %self.id))]
    pub async fn load_with_includes<I, S>(
        &self,
        ids: impl Into<Identifiers>,
        includes: I,
    ) -> ClientResult<Loaded>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let includes = includes
            .into_iter()
            .map(Into::into)
            .collect::<Vec<String>>();
        let includes = (!includes.is_empty()).then_some(includes);

        match (ids.into(), includes) {
            (Identifiers::Single(id), None) => self.load_single(&id).await,
            (Identifiers::Single(id), Some(includes)) => {
                self.load_single_with_includes(&id, &includes).await
            }
            (Identifiers::Many(ids), includes) => self.load_batch(&ids, includes.as_deref()).await,
        }
    }

    async fn load_single(&self, id: &str) -> ClientResult<Loaded> {
        if let Some(document) = self.cached_copy(id).await {
            debug!(id, "cache hit");
            return Ok(Loaded::from_results(vec![document]));
        }

        debug!(id, "cache miss");
        Ok(match self.fetch_one(id).await? {
            Some(document) => Loaded::from_results(vec![document]),
            None => Loaded::default(),
        })
    }

    async fn load_single_with_includes(&self, id: &str, includes: &[String]) -> ClientResult<Loaded> {
        let Some(document) = self.cached_copy(id).await else {
            debug!(id, "primary not cached, loading as a batch");
            return self.load_batch(slice::from_ref(&id.to_string()), Some(includes)).await;
        };

        let (mut included, uncached) = self.partition_includes(&document, includes).await;
        debug!(
            id,
            cached = included.len(),
            uncached = uncached.len(),
            "resolving includes"
        );

        match uncached.as_slice() {
            [] => {}
            [related] => included.extend(self.fetch_one(related).await?),
            _ => {
                let response = self.transport.post(&uncached, None, &self.connection).await?;
                included.extend(self.record(response.results).await);
            }
        }

        Ok(Loaded {
            results: Queryable::new(vec![document]),
            includes: Queryable::new(included),
        })
    }

    /// Splits the include targets of `document` into cached copies and identifiers that
    /// still need fetching. Both lists are free of duplicates and keep field order.
    async fn partition_includes(
        &self,
        document: &Document,
        includes: &[String],
    ) -> (Vec<Document>, Vec<String>) {
        let cache = self.cache.read().await;
        let mut seen = HashSet::new();
        let mut included = Vec::new();
        let mut uncached = Vec::new();

        for field in includes {
            let related = match document.get(field) {
                Some(Value::String(related)) => related,
                _ => {
                    trace!(field = %field, "include field holds no identifier");
                    continue;
                }
            };

            if !seen.insert(related.clone()) {
                continue;
            }

            match cache.get(&related) {
                Some(snapshot) => included.push(snapshot.to_document()),
                None => uncached.push(related),
            }
        }

        (included, uncached)
    }

    async fn load_batch(&self, ids: &[String], includes: Option<&[String]>) -> ClientResult<Loaded> {
        debug!(count = ids.len(), includes = ?includes, "batch fetch");

        let response = self.transport.post(ids, includes, &self.connection).await?;

        Ok(Loaded {
            results: Queryable::new(self.record(response.results).await),
            includes: Queryable::new(self.record(response.includes).await),
        })
    }

    /// Fetches one document with a `get` and records it. Concurrent callers for the same
    /// identifier await the same request.
    async fn fetch_one(&self, id: &str) -> ClientResult<Option<Document>> {
        let pending = {
            let mut in_flight = self.in_flight.lock().await;

            match in_flight.get(id) {
                Some(pending) => {
                    trace!(id, "joining in-flight request");
                    pending.clone()
                }
                None => {
                    let transport = Arc::clone(&self.transport);
                    let connection = self.connection.clone();
                    let key = id.to_string();
                    let pending = async move { transport.get(&key, &connection).await }
                        .boxed()
                        .shared();

                    in_flight.insert(id.to_string(), pending.clone());
                    pending
                }
            }
        };

        let result = match pending.clone().await {
            Ok(Some(document)) => Ok(self.record(vec![document]).await.pop()),
            other => other,
        };

        let mut in_flight = self.in_flight.lock().await;
        if in_flight
            .get(id)
            .is_some_and(|current| current.ptr_eq(&pending))
        {
            in_flight.remove(id);
        }

        result
    }

    async fn cached_copy(&self, id: &str) -> Option<Document> {
        self.cache.read().await.get(id).map(Snapshot::to_document)
    }

    /// Records `documents` and returns the tracked handle for each. A document the session
    /// already holds comes back as its existing handle, local edits included.
    async fn record(&self, documents: Vec<Document>) -> Vec<Document> {
        if documents.is_empty() {
            return documents;
        }

        let mut cache = self.cache.write().await;

        documents
            .into_iter()
            .map(|document| {
                if cache.record(&document) {
                    trace!(id = document.id(), "recorded");
                    return document;
                }

                cache.tracked(document.id()).cloned().unwrap_or(document)
            })
            .collect()
    }

    /// True if `id` has been fetched in this session.
    pub async fn is_loaded(&self, id: &str) -> bool {
        self.cache.read().await.has(id)
    }

    /// The live document for `id`: the same handle the first load returned.
    pub async fn tracked(&self, id: &str) -> Option<Document> {
        self.cache.read().await.tracked(id).cloned()
    }

    /// The state of `id` as it was fetched.
    pub async fn snapshot(&self, id: &str) -> Option<Snapshot> {
        self.cache.read().await.get(id).cloned()
    }

    /// True if the tracked document for `id` was modified since it was fetched.
    pub async fn is_dirty(&self, id: &str) -> bool {
        self.cache.read().await.is_dirty(id)
    }

    /// Every modified tracked document, ordered by identifier.
    pub async fn dirty_documents(&self) -> Queryable<Document> {
        let cache = self.cache.read().await;

        cache
            .dirty_ids()
            .iter()
            .filter_map(|id| cache.tracked(id).cloned())
            .collect()
    }

    /// Field-level changes of the tracked document for `id`.
    pub async fn diff(&self, id: &str) -> Vec<FieldChange> {
        self.cache.read().await.diff(id)
    }

    /// Number of documents recorded in this session.
    pub async fn cached_count(&self) -> usize {
        self.cache.read().await.len()
    }
}

//! In-memory transport implementation.
//!
//! Documents are kept per database in HashMaps behind async-aware read-write locks. Every
//! call is appended to a request log before it is served, which makes the number and shape
//! of network round-trips observable in tests.

use async_trait::async_trait;
use chrono::Utc;
use mea::rwlock::RwLock;
use serde_json::Value;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Duration,
};
use tracing::trace;
use uuid::Uuid;

use ravenlayer_core::{
    connection::ConnectionInfo,
    document::{Document, Metadata},
    error::{ClientError, ClientResult},
    transport::{BatchResponse, Transport, TransportBuilder},
};

type DatabaseMap = HashMap<String, Document>;
type StoreMap = HashMap<String, DatabaseMap>;

/// One call received by an [`InMemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedRequest {
    Get {
        database: String,
        id: String,
    },
    Post {
        database: String,
        ids: Vec<String>,
        includes: Option<Vec<String>>,
    },
}

impl RecordedRequest {
    pub fn is_get(&self) -> bool {
        matches!(self, RecordedRequest::Get { .. })
    }

    pub fn is_post(&self) -> bool {
        matches!(self, RecordedRequest::Post { .. })
    }
}

/// Thread-safe in-memory transport.
///
/// `InMemoryTransport` is cloneable and uses `Arc`-wrapped state; clones share documents
/// and the request log, so a test can keep one clone for assertions while a store owns
/// another.
///
/// Every response hands out a fresh copy of the stored document, the way a network
/// response would.
///
/// # Example
///
/// ```ignore
/// use ravenlayer_memory::InMemoryTransport;
/// use serde_json::json;
///
/// let transport = InMemoryTransport::new();
/// transport.put("Northwind", "orders/1", json!({ "Total": 12.5 })).await?;
///
/// let store = DocumentStore::new(transport.clone(), ConnectionInfo::new("localhost", 8080, "Northwind"));
/// store.open_session().load("orders/1").await?;
///
/// assert_eq!(transport.request_count().await, 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryTransport {
    /// database -> (document id -> document)
    store: Arc<RwLock<StoreMap>>,
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
    /// Returned by the next request instead of serving it
    failure: Arc<RwLock<Option<ClientError>>>,
    latency: Option<Duration>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> InMemoryTransportBuilder {
        InMemoryTransportBuilder::default()
    }

    /// Stores `fields` as document `id`, synthesizing metadata the way a server would:
    /// an entity name derived from the identifier prefix, a fresh etag and the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidDocument`] if `fields` is not a JSON object.
    pub async fn put(&self, database: &str, id: &str, fields: Value) -> ClientResult<()> {
        let Value::Object(fields) = fields else {
            return Err(ClientError::InvalidDocument(format!(
                "document {id} must be a JSON object"
            )));
        };

        let mut metadata = Metadata::new(id)
            .with_etag(Uuid::new_v4().to_string())
            .with_last_modified(Utc::now());
        if let Some(entity_name) = entity_name_for(id) {
            metadata = metadata.with_entity_name(entity_name);
        }

        self.put_document(database, Document::new(metadata, fields))
            .await;

        Ok(())
    }

    /// Stores a document with its metadata as-is, replacing any document with the same id.
    pub async fn put_document(&self, database: &str, document: Document) {
        self.store
            .write()
            .await
            .entry(database.to_string())
            .or_default()
            .insert(document.id().to_string(), document);
    }

    /// All requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }

    pub async fn clear_requests(&self) {
        self.requests.write().await.clear();
    }

    /// Makes the next request fail with `error`. The request is still logged.
    pub async fn fail_next(&self, error: ClientError) {
        *self.failure.write().await = Some(error);
    }

    async fn begin(&self, request: RecordedRequest) -> ClientResult<()> {
        trace!(?request, "in-memory request");
        self.requests.write().await.push(request);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.failure.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// `orders/1` -> `Orders`
fn entity_name_for(id: &str) -> Option<String> {
    let (prefix, _) = id.split_once('/')?;
    let mut chars = prefix.chars();
    let first = chars.next()?;

    Some(first.to_uppercase().chain(chars).collect())
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn get(&self, id: &str, connection: &ConnectionInfo) -> ClientResult<Option<Document>> {
        self.begin(RecordedRequest::Get {
            database: connection.database.clone(),
            id: id.to_string(),
        })
        .await?;

        Ok(self
            .store
            .read()
            .await
            .get(&connection.database)
            .and_then(|database| database.get(id))
            .map(Document::deep_clone))
    }

    async fn post(
        &self,
        ids: &[String],
        includes: Option<&[String]>,
        connection: &ConnectionInfo,
    ) -> ClientResult<BatchResponse> {
        self.begin(RecordedRequest::Post {
            database: connection.database.clone(),
            ids: ids.to_vec(),
            includes: includes.map(<[String]>::to_vec),
        })
        .await?;

        let store = self.store.read().await;
        let Some(database) = store.get(&connection.database) else {
            return Ok(BatchResponse::default());
        };

        let results = ids
            .iter()
            .filter_map(|id| database.get(id))
            .map(Document::deep_clone)
            .collect::<Vec<_>>();

        // Includes are resolved server-side from the primary documents' fields
        let mut seen = HashSet::new();
        let included = results
            .iter()
            .flat_map(|document| {
                includes
                    .unwrap_or_default()
                    .iter()
                    .filter_map(move |field| match document.get(field) {
                        Some(Value::String(related)) => Some(related),
                        _ => None,
                    })
            })
            .filter(|related| seen.insert(related.clone()))
            .filter_map(|related| database.get(&related))
            .map(Document::deep_clone)
            .collect::<Vec<_>>();

        Ok(BatchResponse {
            results,
            includes: included,
        })
    }
}

/// Builder for constructing [`InMemoryTransport`] instances.
///
/// # Example
///
/// ```ignore
/// use ravenlayer_memory::InMemoryTransport;
/// use ravenlayer::transport::TransportBuilder;
///
/// let transport = InMemoryTransport::builder()
///     .with_latency(Duration::from_millis(20))
///     .build()
///     .await?;
/// ```
#[derive(Default)]
pub struct InMemoryTransportBuilder {
    documents: Vec<(String, Document)>,
    latency: Option<Duration>,
}

impl InMemoryTransportBuilder {
    /// Seeds `database` with `document`.
    pub fn with_document(mut self, database: &str, document: Document) -> Self {
        self.documents.push((database.to_string(), document));
        self
    }

    /// Delays every response, which keeps requests in flight long enough to overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

#[async_trait]
impl TransportBuilder for InMemoryTransportBuilder {
    type Transport = InMemoryTransport;

    async fn build(self) -> ClientResult<Self::Transport> {
        let transport = InMemoryTransport {
            latency: self.latency,
            ..InMemoryTransport::default()
        };

        for (database, document) in self.documents {
            transport.put_document(&database, document).await;
        }

        Ok(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn northwind() -> ConnectionInfo {
        ConnectionInfo::new("localhost", 8080, "Northwind")
    }

    #[test]
    fn entity_names_come_from_the_id_prefix() {
        assert_eq!(entity_name_for("orders/1").as_deref(), Some("Orders"));
        assert_eq!(entity_name_for("standalone"), None);
        assert_eq!(entity_name_for("/1"), None);
    }

    #[tokio::test]
    async fn get_serves_copies_and_logs_requests() {
        let transport = InMemoryTransport::new();
        transport
            .put("Northwind", "orders/1", json!({ "Total": 10 }))
            .await
            .unwrap();

        let first = transport.get("orders/1", &northwind()).await.unwrap().unwrap();
        let second = transport.get("orders/1", &northwind()).await.unwrap().unwrap();

        assert_eq!(first, second);
        assert!(!Document::ptr_eq(&first, &second));
        assert_eq!(first.metadata().entity_name.as_deref(), Some("Orders"));
        assert!(first.metadata().etag.is_some());
        assert!(transport.get("orders/2", &northwind()).await.unwrap().is_none());
        assert_eq!(transport.request_count().await, 3);
        assert!(transport.requests().await.iter().all(RecordedRequest::is_get));
    }

    #[tokio::test]
    async fn post_resolves_includes_server_side() {
        let transport = InMemoryTransport::new();
        transport
            .put("Northwind", "orders/1", json!({ "CustomerId": "customers/1" }))
            .await
            .unwrap();
        transport
            .put("Northwind", "orders/2", json!({ "CustomerId": "customers/1" }))
            .await
            .unwrap();
        transport
            .put("Northwind", "customers/1", json!({ "Name": "Alfreds" }))
            .await
            .unwrap();

        let ids = vec!["orders/1".to_string(), "orders/2".to_string(), "orders/9".to_string()];
        let includes = vec!["CustomerId".to_string()];
        let response = transport
            .post(&ids, Some(&includes), &northwind())
            .await
            .unwrap();

        assert_eq!(response.results.len(), 2);
        assert_eq!(response.includes.len(), 1);
        assert_eq!(response.includes[0].id(), "customers/1");
        assert_eq!(
            transport.requests().await,
            vec![RecordedRequest::Post {
                database: "Northwind".to_string(),
                ids,
                includes: Some(includes),
            }]
        );
    }

    #[tokio::test]
    async fn failures_are_one_shot() {
        let transport = InMemoryTransport::new();
        transport
            .fail_next(ClientError::Transport("connection refused".to_string()))
            .await;

        assert_eq!(
            transport.get("orders/1", &northwind()).await,
            Err(ClientError::Transport("connection refused".to_string()))
        );
        assert_eq!(transport.get("orders/1", &northwind()).await, Ok(None));
        assert_eq!(transport.request_count().await, 2);
    }

    #[tokio::test]
    async fn builder_seeds_documents() {
        let transport = InMemoryTransport::builder()
            .with_document("Northwind", Document::new(Metadata::new("orders/1"), Default::default()))
            .build()
            .await
            .unwrap();

        assert!(transport.get("orders/1", &northwind()).await.unwrap().is_some());
        assert!(
            transport
                .put("Northwind", "orders/2", json!([1, 2]))
                .await
                .is_err()
        );
    }
}

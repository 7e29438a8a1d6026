//! The network boundary of a session.
//!
//! A [`Transport`] issues exactly one request per call and reports its outcome as-is:
//! no retries, no caching, no connection policy. Sessions decide *whether* to call it;
//! transports only decide *how*.
//!
//! # Implementations
//!
//! - `ravenlayer-http` talks to a real server over HTTP.
//! - `ravenlayer-memory` serves documents from memory and records every request.
//!
//! # Example
//!
//! ```ignore
//! use ravenlayer::{transport::Transport, connection::ConnectionInfo};
//!
//! let connection = ConnectionInfo::new("localhost", 8080, "Northwind");
//! let order = transport.get("orders/1", &connection).await?;
//! let batch = transport
//!     .post(&["orders/1".into(), "orders/2".into()], None, &connection)
//!     .await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt::Debug, sync::Arc};

use crate::{connection::ConnectionInfo, document::Document, error::ClientResult};

/// The body of a batched fetch: `{ "Results": [...], "Includes": [...] }`.
///
/// Servers answer `null` for identifiers they cannot resolve; those entries are dropped
/// when decoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    #[serde(rename = "Results", default, deserialize_with = "skip_nulls")]
    pub results: Vec<Document>,
    #[serde(rename = "Includes", default, deserialize_with = "skip_nulls")]
    pub includes: Vec<Document>,
}

fn skip_nulls<'de, D>(deserializer: D) -> Result<Vec<Document>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Option<Document>>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .collect())
}

/// Abstract interface for fetching documents from a remote store.
///
/// # Error Handling
///
/// Implementations classify failures into the network-sourced variants of
/// [`ClientError`](crate::error::ClientError): `MalformedRequest`, `Server`, `Parse`
/// and `Transport`.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Fetches one document.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the server has no document with this identifier. A returned document
    /// carries metadata for `id`.
    async fn get(&self, id: &str, connection: &ConnectionInfo) -> ClientResult<Option<Document>>;

    /// Fetches many documents in one request.
    ///
    /// # Arguments
    ///
    /// * `ids` - The identifiers to fetch, sent as the request body
    /// * `includes` - Field names whose values the server should resolve as related documents
    /// * `connection` - Target database
    async fn post(
        &self,
        ids: &[String],
        includes: Option<&[String]>,
        connection: &ConnectionInfo,
    ) -> ClientResult<BatchResponse>;
}

#[async_trait]
impl<T> Transport for &T
where
    T: Transport + ?Sized,
{
    async fn get(&self, id: &str, connection: &ConnectionInfo) -> ClientResult<Option<Document>> {
        (**self).get(id, connection).await
    }

    async fn post(
        &self,
        ids: &[String],
        includes: Option<&[String]>,
        connection: &ConnectionInfo,
    ) -> ClientResult<BatchResponse> {
        (**self).post(ids, includes, connection).await
    }
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn get(&self, id: &str, connection: &ConnectionInfo) -> ClientResult<Option<Document>> {
        (**self).get(id, connection).await
    }

    async fn post(
        &self,
        ids: &[String],
        includes: Option<&[String]>,
        connection: &ConnectionInfo,
    ) -> ClientResult<BatchResponse> {
        (**self).post(ids, includes, connection).await
    }
}

#[async_trait]
impl<T> Transport for Box<T>
where
    T: Transport + ?Sized,
{
    async fn get(&self, id: &str, connection: &ConnectionInfo) -> ClientResult<Option<Document>> {
        (**self).get(id, connection).await
    }

    async fn post(
        &self,
        ids: &[String],
        includes: Option<&[String]>,
        connection: &ConnectionInfo,
    ) -> ClientResult<BatchResponse> {
        (**self).post(ids, includes, connection).await
    }
}

/// Factory trait for creating transports.
#[async_trait]
pub trait TransportBuilder {
    type Transport: Transport;

    async fn build(self) -> ClientResult<Self::Transport>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn batch_response_drops_unresolved_entries() {
        let response: BatchResponse = serde_json::from_value(json!({
            "Results": [
                { "Name": "a", "@metadata": { "@id": "docs/1" } },
                null
            ],
            "Includes": null
        }))
        .unwrap();

        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].id(), "docs/1");
        assert!(response.includes.is_empty());
    }

    #[test]
    fn batch_response_tolerates_missing_includes() {
        let response: BatchResponse = serde_json::from_value(json!({ "Results": [] })).unwrap();

        assert_eq!(response, BatchResponse::default());
    }
}

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, header::HeaderMap};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use ravenlayer_core::{
    connection::ConnectionInfo,
    document::Document,
    error::{ClientError, ClientResult},
    transport::{BatchResponse, Transport, TransportBuilder},
};

use crate::response::{classify, metadata_from_headers};

const USER_AGENT: &str = concat!("ravenlayer/", env!("CARGO_PKG_VERSION"));

/// Transport that talks to a database server over HTTP.
///
/// - `get` issues `GET /databases/{database}/docs/{id}`
/// - `post` issues `POST /databases/{database}/queries` with the identifiers as a JSON
///   array body and one `include` query parameter per include field
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Wraps an already configured client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    async fn read(response: Response) -> ClientResult<(StatusCode, HeaderMap, Vec<u8>)> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(format!("failed to read response body: {e}")))?;

        Ok((status, headers, body.to_vec()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, id: &str, connection: &ConnectionInfo) -> ClientResult<Option<Document>> {
        let url = format!("{}{}", connection.base_url(), connection.document_path(id));
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("request failed: {e}")))?;
        let (status, headers, body) = Self::read(response).await?;

        let body = classify(status, &body)
            .inspect_err(|e| warn!(%url, %status, error = %e, "load failed"))?;

        match body {
            None => Ok(None),
            Some(Value::Object(fields)) => Ok(Some(Document::new(
                metadata_from_headers(id, &headers),
                fields,
            ))),
            Some(_) => Err(ClientError::Parse(format!(
                "expected a JSON object for document {id}"
            ))),
        }
    }

    async fn post(
        &self,
        ids: &[String],
        includes: Option<&[String]>,
        connection: &ConnectionInfo,
    ) -> ClientResult<BatchResponse> {
        let url = format!("{}{}", connection.base_url(), connection.queries_path());
        debug!(%url, count = ids.len(), ?includes, "POST");

        let query = includes
            .unwrap_or_default()
            .iter()
            .map(|field| ("include", field.as_str()))
            .collect::<Vec<_>>();

        let response = self
            .client
            .post(&url)
            .query(&query)
            .json(ids)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("request failed: {e}")))?;
        let (status, _, body) = Self::read(response).await?;

        let body = classify(status, &body)
            .inspect_err(|e| warn!(%url, %status, error = %e, "batch load failed"))?;

        match body {
            None => Ok(BatchResponse::default()),
            Some(value) => Ok(serde_json::from_value(value)?),
        }
    }
}

/// Builder for [`HttpTransport`].
///
/// # Example
///
/// ```ignore
/// use ravenlayer::{http::HttpTransport, transport::TransportBuilder};
///
/// let transport = HttpTransport::builder()
///     .connect_timeout(Duration::from_secs(5))
///     .build()
///     .await?;
/// ```
#[derive(Debug, Default)]
pub struct HttpTransportBuilder {
    user_agent: Option<String>,
    connect_timeout: Option<Duration>,
}

impl HttpTransportBuilder {
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl TransportBuilder for HttpTransportBuilder {
    type Transport = HttpTransport;

    async fn build(self) -> ClientResult<Self::Transport> {
        let mut builder = Client::builder()
            .user_agent(self.user_agent.unwrap_or_else(|| USER_AGENT.to_string()));

        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ClientError::Initialization(e.to_string()))?;

        Ok(HttpTransport::new(client))
    }
}

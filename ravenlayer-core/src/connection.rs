//! Connection settings for a remote database.

use serde::{Deserialize, Serialize};

/// Where a database lives: `{ host, port, database }`.
///
/// Deserializable so it can be embedded in application configuration; missing keys take
/// the [`Default`] values (`localhost`, `8080`, `Default`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionInfo {
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl Default for ConnectionInfo {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            database: "Default".to_string(),
        }
    }
}

impl ConnectionInfo {
    pub fn new(host: impl Into<String>, port: u16, database: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            database: database.into(),
        }
    }

    /// `http://{host}:{port}`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// `/databases/{database}`
    pub fn database_path(&self) -> String {
        format!("/databases/{}", self.database)
    }

    /// `/databases/{database}/docs/{id}`. The identifier is used verbatim; a server
    /// rejects illegal characters with HTTP 400.
    pub fn document_path(&self, id: &str) -> String {
        format!("{}/docs/{}", self.database_path(), id)
    }

    /// `/databases/{database}/queries`. Include names travel as query parameters.
    pub fn queries_path(&self) -> String {
        format!("{}/queries", self.database_path())
    }
}

//! Error types and result types for session and transport operations.
//!
//! Every fallible operation in the workspace returns [`ClientResult<T>`]. Network-sourced
//! failures are handed to the caller unchanged; nothing is retried.

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// The default message used when a server reports an error without a readable reason.
pub const DEFAULT_SERVER_ERROR: &str = "An error occurred, no documents could be retrieved";

/// Represents all possible errors that can occur when loading or querying documents.
///
/// The type is `Clone` so that a single in-flight request can hand the same outcome
/// to every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The server answered with HTTP 400. The identifier most likely contains characters
    /// that are not legal in a request path.
    #[error("Load failed: the request url was badly formed. Ensure the id does not contain illegal characters")]
    MalformedRequest,
    /// The response body carried a structured `Error` field. The extracted message is kept verbatim.
    #[error("Server error: {0}")]
    Server(String),
    /// The response body could not be parsed as JSON, or did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),
    /// A `single` query matched more than one element.
    #[error("Sequence contains more than one element")]
    MultipleResults,
    /// A low-level connection failure reported by the HTTP client.
    #[error("Transport error: {0}")]
    Transport(String),
    /// The document violates the document model (missing metadata, reserved field write, ...).
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// Error during transport construction.
    #[error("Initialization error: {0}")]
    Initialization(String),
}

impl ClientError {
    /// Returns true for errors that originate from the network or the remote server.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ClientError::MalformedRequest
                | ClientError::Server(_)
                | ClientError::Parse(_)
                | ClientError::Transport(_)
        )
    }
}

/// A specialized `Result` type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

impl From<SerdeJsonError> for ClientError {
    fn from(err: SerdeJsonError) -> Self {
        ClientError::Parse(err.to_string())
    }
}

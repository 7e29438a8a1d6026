//! Classification of server responses.
//!
//! Responses are classified before they are decoded:
//!
//! | response                            | outcome                        |
//! |-------------------------------------|--------------------------------|
//! | status 400                          | `ClientError::MalformedRequest` |
//! | status 404                          | not found                      |
//! | body is not JSON                    | `ClientError::Parse`           |
//! | body carries a string `Error` field | `ClientError::Server`          |
//! | any other error status              | `ClientError::Server`          |
//! | anything else                       | the decoded body               |

use chrono::{DateTime, Utc};
use reqwest::{
    StatusCode,
    header::{ETAG, HeaderMap, LAST_MODIFIED},
};
use serde_json::Value;

use ravenlayer_core::{
    document::Metadata,
    error::{ClientError, ClientResult, DEFAULT_SERVER_ERROR},
};

pub const ENTITY_NAME_HEADER: &str = "Raven-Entity-Name";
pub const CLR_TYPE_HEADER: &str = "Raven-Clr-Type";

/// Returns the decoded body, or `None` if the server has no such resource.
pub(crate) fn classify(status: StatusCode, body: &[u8]) -> ClientResult<Option<Value>> {
    match status {
        StatusCode::BAD_REQUEST => return Err(ClientError::MalformedRequest),
        StatusCode::NOT_FOUND => return Ok(None),
        _ => {}
    }

    let value: Value = serde_json::from_slice(body)?;

    if let Some(Value::String(raw)) = value.get("Error") {
        return Err(ClientError::Server(server_message(raw)));
    }

    if !status.is_success() {
        return Err(ClientError::Server(DEFAULT_SERVER_ERROR.to_string()));
    }

    Ok(Some(value))
}

/// Server errors look like `System.SomeException: the message\r\n   at ...stack`.
/// The message is the text after the first `": "` up to the line break.
pub(crate) fn server_message(raw: &str) -> String {
    raw.split_once(": ")
        .and_then(|(_, rest)| rest.split_once("\r\n"))
        .map(|(message, _)| message)
        .filter(|message| !message.is_empty())
        .unwrap_or(DEFAULT_SERVER_ERROR)
        .to_string()
}

/// Builds the metadata of a singly fetched document from the response headers.
pub(crate) fn metadata_from_headers(id: &str, headers: &HeaderMap) -> Metadata {
    let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());

    let mut metadata = Metadata::new(id);
    if let Some(entity_name) = header(ENTITY_NAME_HEADER) {
        metadata = metadata.with_entity_name(entity_name);
    }
    if let Some(clr_type) = header(CLR_TYPE_HEADER) {
        metadata = metadata.with_clr_type(clr_type);
    }
    if let Some(last_modified) = headers
        .get(LAST_MODIFIED)
        .and_then(|value| value.to_str().ok())
        .and_then(http_date)
    {
        metadata = metadata.with_last_modified(last_modified);
    }
    if let Some(etag) = headers.get(ETAG).and_then(|value| value.to_str().ok()) {
        metadata = metadata.with_etag(etag);
    }

    metadata
}

/// `Tue, 15 Nov 1994 08:12:31 GMT`
fn http_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw)
        .map(|date| date.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    #[test]
    fn status_codes_win_over_bodies() {
        assert_eq!(
            classify(StatusCode::BAD_REQUEST, b"not json"),
            Err(ClientError::MalformedRequest)
        );
        assert_eq!(classify(StatusCode::NOT_FOUND, b""), Ok(None));
    }

    #[test]
    fn bodies_are_decoded() {
        assert_eq!(
            classify(StatusCode::OK, br#"{"Name":"Alfreds"}"#),
            Ok(Some(json!({ "Name": "Alfreds" })))
        );
        assert!(matches!(
            classify(StatusCode::OK, b"<html></html>"),
            Err(ClientError::Parse(_))
        ));
    }

    #[test]
    fn error_fields_become_server_errors() {
        let body = json!({
            "Error": "System.InvalidOperationException: Index is corrupted\r\n   at Raven.Database"
        })
        .to_string();

        assert_eq!(
            classify(StatusCode::INTERNAL_SERVER_ERROR, body.as_bytes()),
            Err(ClientError::Server("Index is corrupted".to_string()))
        );
        assert_eq!(
            classify(StatusCode::INTERNAL_SERVER_ERROR, b"{}"),
            Err(ClientError::Server(DEFAULT_SERVER_ERROR.to_string()))
        );
    }

    #[test]
    fn server_messages_fall_back_to_the_default() {
        assert_eq!(server_message("Boom: it broke\r\nstack"), "it broke");
        assert_eq!(server_message("Boom: a: b\r\n"), "a: b");
        assert_eq!(server_message("no separator"), DEFAULT_SERVER_ERROR);
        assert_eq!(server_message("Boom: no line break"), DEFAULT_SERVER_ERROR);
        assert_eq!(server_message("Boom: \r\n"), DEFAULT_SERVER_ERROR);
    }

    #[test]
    fn metadata_is_read_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(ENTITY_NAME_HEADER, HeaderValue::from_static("Orders"));
        headers.insert(CLR_TYPE_HEADER, HeaderValue::from_static("Northwind.Order, Northwind"));
        headers.insert(LAST_MODIFIED, HeaderValue::from_static("Tue, 15 Nov 1994 08:12:31 GMT"));
        headers.insert(ETAG, HeaderValue::from_static("\"01000000-0000-0001\""));

        let metadata = metadata_from_headers("orders/1", &headers);

        assert_eq!(metadata.id, "orders/1");
        assert_eq!(metadata.entity_name.as_deref(), Some("Orders"));
        assert_eq!(metadata.clr_type.as_deref(), Some("Northwind.Order, Northwind"));
        assert_eq!(
            metadata.last_modified,
            Some(Utc.with_ymd_and_hms(1994, 11, 15, 8, 12, 31).unwrap())
        );
        assert_eq!(metadata.etag.as_deref(), Some("\"01000000-0000-0001\""));
    }

    #[test]
    fn missing_headers_leave_metadata_empty() {
        let metadata = metadata_from_headers("orders/1", &HeaderMap::new());

        assert_eq!(metadata, Metadata::new("orders/1"));
    }
}

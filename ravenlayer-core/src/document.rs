//! Schema-less documents, their metadata, and fetch-time snapshots.
//!
//! A [`Document`] is a shared handle: cloning it yields another reference to the same live
//! document, which is how the session change set and the caller observe the same edits.
//! Use [`Document::deep_clone`] for an independent copy. Metadata is fixed at construction
//! and only ever exposed by shared reference.

use chrono::{DateTime, NaiveDateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::{fmt, sync::Arc};

use crate::error::{ClientError, ClientResult};

/// The reserved field under which metadata is serialized.
pub const METADATA_KEY: &str = "@metadata";

/// Version-tracking information attached to every fetched document.
///
/// Serialized with the server's wire names (`@id`, `Raven-Entity-Name`, `Raven-Clr-Type`,
/// `Last-Modified`, `@etag`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// The document identifier.
    #[serde(rename = "@id")]
    pub id: String,
    /// The entity (collection) name reported by the server.
    #[serde(
        rename = "Raven-Entity-Name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub entity_name: Option<String>,
    /// The .NET type name the document was stored from. Informational only.
    #[serde(
        rename = "Raven-Clr-Type",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub clr_type: Option<String>,
    /// When the server last modified the document.
    #[serde(
        rename = "Last-Modified",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    pub last_modified: Option<DateTime<Utc>>,
    /// Opaque version token.
    #[serde(
        rename = "@etag",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opaque_token"
    )]
    pub etag: Option<String>,
}

impl Metadata {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_name: None,
            clr_type: None,
            last_modified: None,
            etag: None,
        }
    }

    pub fn with_entity_name(mut self, entity_name: impl Into<String>) -> Self {
        self.entity_name = Some(entity_name.into());
        self
    }

    pub fn with_clr_type(mut self, clr_type: impl Into<String>) -> Self {
        self.clr_type = Some(clr_type.into());
        self
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }
}

/// Accepts RFC 3339, zone-less ISO-8601 (read as UTC) and RFC 2822 timestamps.
/// Anything else is dropped rather than failing the whole document.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;

    Ok(raw.as_deref().and_then(parse_timestamp))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.and_utc())
        })
        .or_else(|_| DateTime::parse_from_rfc2822(raw).map(|dt| dt.with_timezone(&Utc)))
        .ok()
}

fn opaque_token<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(token)) => Some(token),
        Some(other) => Some(other.to_string()),
    })
}

struct DocumentInner {
    metadata: Metadata,
    fields: RwLock<Map<String, Value>>,
}

/// A live, schema-less document.
#[derive(Clone)]
pub struct Document {
    inner: Arc<DocumentInner>,
}

impl Document {
    /// Creates a document from its metadata and fields. A `@metadata` entry in `fields`
    /// is discarded; the explicit metadata always wins.
    pub fn new(metadata: Metadata, mut fields: Map<String, Value>) -> Self {
        fields.remove(METADATA_KEY);

        Self {
            inner: Arc::new(DocumentInner {
                metadata,
                fields: RwLock::new(fields),
            }),
        }
    }

    /// Parses a JSON object carrying an embedded `@metadata` record.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidDocument`] if the value is not an object or its
    /// metadata is missing or malformed.
    pub fn from_json(value: Value) -> ClientResult<Self> {
        let Value::Object(mut fields) = value else {
            return Err(ClientError::InvalidDocument(
                "expected a JSON object".to_string(),
            ));
        };

        let metadata = fields.remove(METADATA_KEY).ok_or_else(|| {
            ClientError::InvalidDocument(format!("missing {METADATA_KEY} record"))
        })?;
        let metadata: Metadata = serde_json::from_value(metadata)
            .map_err(|e| ClientError::InvalidDocument(format!("malformed {METADATA_KEY}: {e}")))?;

        Ok(Self::new(metadata, fields))
    }

    /// Builds a document from any serializable entity that serializes to a JSON object.
    pub fn from_entity<T: Serialize>(metadata: Metadata, entity: &T) -> ClientResult<Self> {
        match serde_json::to_value(entity).map_err(|e| ClientError::InvalidDocument(e.to_string()))? {
            Value::Object(fields) => Ok(Self::new(metadata, fields)),
            _ => Err(ClientError::InvalidDocument(
                "entity must serialize to a JSON object".to_string(),
            )),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.metadata.id
    }

    pub fn metadata(&self) -> &Metadata {
        &self.inner.metadata
    }

    /// Returns a copy of the field's current value.
    pub fn get(&self, field: &str) -> Option<Value> {
        self.inner.fields.read().get(field).cloned()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.inner.fields.read().contains_key(field)
    }

    /// Sets a field, returning its previous value.
    ///
    /// # Errors
    ///
    /// The metadata record is read-only; writing `@metadata` returns
    /// [`ClientError::InvalidDocument`] and leaves the document untouched.
    pub fn set(&self, field: impl Into<String>, value: impl Into<Value>) -> ClientResult<Option<Value>> {
        let field = field.into();

        if field == METADATA_KEY {
            return Err(ClientError::InvalidDocument(format!(
                "{METADATA_KEY} is read-only"
            )));
        }

        Ok(self.inner.fields.write().insert(field, value.into()))
    }

    pub fn remove(&self, field: &str) -> Option<Value> {
        self.inner.fields.write().remove(field)
    }

    /// Returns a copy of all fields, without metadata.
    pub fn fields(&self) -> Map<String, Value> {
        self.inner.fields.read().clone()
    }

    /// Runs `f` against the current fields without copying them.
    pub fn with_fields<R>(&self, f: impl FnOnce(&Map<String, Value>) -> R) -> R {
        f(&self.inner.fields.read())
    }

    /// Serializes the document, metadata included, into a JSON object.
    pub fn to_json(&self) -> Value {
        let mut object = self.fields();
        object.insert(
            METADATA_KEY.to_string(),
            serde_json::to_value(&self.inner.metadata).unwrap_or(Value::Null),
        );

        Value::Object(object)
    }

    /// Deserializes the fields into a typed entity.
    pub fn to_entity<T: DeserializeOwned>(&self) -> ClientResult<T> {
        serde_json::from_value(Value::Object(self.fields()))
            .map_err(|e| ClientError::InvalidDocument(e.to_string()))
    }

    /// Captures the current state as an immutable snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            metadata: self.inner.metadata.clone(),
            fields: self.fields(),
        }
    }

    /// Produces a structurally equal document that shares nothing with this one.
    pub fn deep_clone(&self) -> Document {
        Document::new(self.inner.metadata.clone(), self.fields())
    }

    /// Returns true if both handles refer to the same live document.
    pub fn ptr_eq(this: &Document, other: &Document) -> bool {
        Arc::ptr_eq(&this.inner, &other.inner)
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        if Document::ptr_eq(self, other) {
            return true;
        }

        self.inner.metadata == other.inner.metadata
            && *self.inner.fields.read() == *other.inner.fields.read()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("metadata", &self.inner.metadata)
            .field("fields", &*self.inner.fields.read())
            .finish()
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Document::from_json(Value::deserialize(deserializer)?).map_err(serde::de::Error::custom)
    }
}

/// An immutable copy of a document as it was fetched.
///
/// Snapshots are what the session cache stores; they are never handed out for mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    metadata: Metadata,
    fields: Map<String, Value>,
}

impl Snapshot {
    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Reconstructs an independent document from this snapshot.
    pub fn to_document(&self) -> Document {
        Document::new(self.metadata.clone(), self.fields.clone())
    }

    /// Returns true if the live document still equals the fetched state.
    pub fn matches(&self, document: &Document) -> bool {
        self.metadata == *document.metadata() && document.with_fields(|fields| *fields == self.fields)
    }

    /// Lists every field whose value differs between the snapshot and `document`,
    /// ordered by field name.
    pub fn diff(&self, document: &Document) -> Vec<FieldChange> {
        document.with_fields(|current| {
            let mut changes = self
                .fields
                .iter()
                .filter(|(field, value)| current.get(field.as_str()) != Some(*value))
                .map(|(field, value)| FieldChange {
                    field: field.clone(),
                    original: Some(value.clone()),
                    current: current.get(field.as_str()).cloned(),
                })
                .chain(
                    current
                        .iter()
                        .filter(|(field, _)| !self.fields.contains_key(field.as_str()))
                        .map(|(field, value)| FieldChange {
                            field: field.clone(),
                            original: None,
                            current: Some(value.clone()),
                        }),
                )
                .collect::<Vec<_>>();

            changes.sort_by(|a, b| a.field.cmp(&b.field));
            changes
        })
    }
}

/// One field-level difference between a snapshot and its live document.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub field: String,
    /// `None` when the field was added after fetch.
    pub original: Option<Value>,
    /// `None` when the field was removed after fetch.
    pub current: Option<Value>,
}

//! Collaborator interfaces for schema and record persistence
//!
//! The mapping core never talks to a concrete backend. It receives these
//! traits by explicit injection, so the same mappers run against the
//! in-memory store in tests and the directory-backed store in the CLI
//! binaries. All operations are synchronous and run to completion; there
//! is no transaction spanning a batch, so a failure partway leaves prior
//! creations committed.

pub mod fs;
pub mod memory;

pub use fs::{DirFileLoader, FsStore};
pub use memory::MemoryStore;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::record::RecordInput;
use crate::schema::FieldType;

/// Errors surfaced by store implementations.
///
/// Opaque to the mapping core: mappers propagate these unretried.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// IO error (file system operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend-specific failure
    #[error("store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Unique identifier of a stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

/// A record as persisted by a [`RecordStore`].
///
/// Every field holds an *item list*: a sequence of value maps, one per
/// stored item. A single-valued string field looks like
/// `[{"value": "text"}]`; the export flattener relies on exactly that
/// shape to collapse single values back to bare scalars. Field order is
/// the record's native order and is preserved through export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    pub bundle: String,
    pub published: bool,
    pub fields: IndexMap<String, Vec<Value>>,
}

/// Filter applied by [`RecordStore::query`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordFilter {
    /// Only return records with `published == true`.
    pub published_only: bool,
}

impl RecordFilter {
    pub fn published() -> Self {
        RecordFilter { published_only: true }
    }
}

/// Normalize an applied field value into its stored item list.
///
/// Scalars become a one-item list wrapped in a `value` map, arrays become
/// one item per element (maps kept as given, scalars wrapped), and a bare
/// map becomes a one-item list of itself.
pub fn to_item_list(value: Value) -> Vec<Value> {
    fn wrap(value: Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(map),
            scalar => {
                let mut item = Map::new();
                item.insert("value".to_string(), scalar);
                Value::Object(item)
            }
        }
    }

    match value {
        Value::Array(items) => items.into_iter().map(wrap).collect(),
        other => vec![wrap(other)],
    }
}

/// Persistence of content types and their fields.
///
/// The storage/config split mirrors the hosting environment's field model:
/// *field storage* is the kind-wide definition of a field, *field config*
/// attaches that storage to one bundle with a label. Each is independently
/// idempotent; the mapper checks existence before each create.
pub trait SchemaStore {
    /// Whether a content type with this machine name exists.
    fn type_exists(&self, type_name: &str) -> Result<bool, StoreError>;

    /// Create a content type.
    fn create_type(
        &mut self,
        type_name: &str,
        display_name: &str,
        description: &str,
    ) -> Result<(), StoreError>;

    /// Whether the kind-wide storage for a field exists.
    fn field_storage_exists(&self, entity_kind: &str, field_name: &str)
        -> Result<bool, StoreError>;

    /// Create the kind-wide storage for a field.
    fn create_field_storage(
        &mut self,
        entity_kind: &str,
        field_name: &str,
        field_type: &FieldType,
        settings: &Map<String, Value>,
    ) -> Result<(), StoreError>;

    /// Whether a field is attached to a bundle.
    fn field_config_exists(
        &self,
        entity_kind: &str,
        bundle: &str,
        field_name: &str,
    ) -> Result<bool, StoreError>;

    /// Attach a field to a bundle.
    fn create_field_config(
        &mut self,
        entity_kind: &str,
        bundle: &str,
        field_name: &str,
        label: &str,
        settings: &Map<String, Value>,
    ) -> Result<(), StoreError>;
}

/// Persistence of records.
pub trait RecordStore {
    /// Persist one record and return its id.
    fn create(&mut self, bundle: &str, input: &RecordInput) -> Result<RecordId, StoreError>;

    /// Load records of a bundle, in insertion order.
    fn query(&self, bundle: &str, filter: RecordFilter) -> Result<Vec<StoredRecord>, StoreError>;
}

/// Source of raw JSON input by file id.
///
/// Callers prefer a loaded file over pasted text when both are present.
pub trait FileLoader {
    /// Load the raw bytes of a file, or `StoreError::NotFound`.
    fn load(&self, file_id: &str) -> Result<Vec<u8>, StoreError>;
}

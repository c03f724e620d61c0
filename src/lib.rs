//! # Kiln - JSON-driven content schema and record toolkit
//!
//! A unified library for turning JSON documents into content-type
//! schemas, bulk-creating typed records against those schemas, and
//! exporting stored records back out as flattened JSON.
//!
//! ## Modules
//!
//! - **decode**: Parse and structurally validate raw JSON input
//! - **sanitize**: Turn arbitrary field labels into machine names
//! - **schema**: Map a JSON object onto a content-type schema
//! - **record**: Map a JSON array onto typed records
//! - **export**: Flatten stored records into portable JSON
//! - **store**: Collaborator interfaces plus in-memory and on-disk stores
//! - **report**: User-facing outcome messaging
//!
//! ## Quick Start
//!
//! ### Building a content type
//!
//! ```rust
//! use kiln::report::BufferMessenger;
//! use kiln::store::MemoryStore;
//!
//! # fn main() -> Result<(), kiln::KilnError> {
//! let mut store = MemoryStore::new();
//! let messenger = BufferMessenger::new();
//!
//! let report = kiln::build_content_type(
//!     &mut store,
//!     &messenger,
//!     "article",
//!     "News articles",
//!     r#"{"title": "string", "body": "text"}"#,
//! )?;
//!
//! // fields field_title and field_body now exist on "article"
//! assert_eq!(report.schema.fields.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ### Creating and exporting records
//!
//! ```rust
//! use kiln::report::BufferMessenger;
//! use kiln::store::MemoryStore;
//!
//! # fn main() -> Result<(), kiln::KilnError> {
//! let mut store = MemoryStore::new();
//! let messenger = BufferMessenger::new();
//! let report = kiln::build_content_type(
//!     &mut store, &messenger, "article", "",
//!     r#"{"summary": "string"}"#,
//! )?;
//!
//! let created = kiln::create_content(
//!     &mut store,
//!     &messenger,
//!     &report.schema,
//!     r#"[{"title": "Hello", "field_summary": "First post"}]"#,
//! )?;
//! assert_eq!(created, 1);
//!
//! let export = kiln::export_content(&store, "article")?;
//! assert_eq!(export.body[0]["field_summary"], "First post");
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

pub mod decode;
pub mod export;
pub mod record;
pub mod report;
pub mod sanitize;
pub mod schema;
pub mod store;

// Re-export commonly used types for convenience
pub use decode::{decode_array, decode_object, DecodeError};
pub use export::{export_records, flatten_records, ExportDocument, EXPORT_MIME};
pub use record::{build_records, preview_records, RecordError, RecordInput, RecordLoader};
pub use report::{Level, Messenger};
pub use sanitize::{sanitize_field_name, FIELD_PREFIX};
pub use schema::{
    FieldOutcome, FieldSpec, FieldStatus, FieldType, SchemaBuildReport, SchemaDefinition,
    SchemaError, SchemaMapper, TITLE_FIELD,
};
pub use store::{
    FileLoader, FsStore, MemoryStore, RecordFilter, RecordId, RecordStore, SchemaStore,
    StoreError, StoredRecord,
};

/// Top-level error for the convenience entry points.
#[derive(Error, Debug)]
pub enum KilnError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Main entry point: build a content type and its fields from raw JSON.
pub fn build_content_type<S: SchemaStore, M: Messenger>(
    store: &mut S,
    messenger: &M,
    type_name: &str,
    description: &str,
    raw: &str,
) -> Result<SchemaBuildReport, KilnError> {
    let doc = decode_object(raw)?;
    let report = SchemaMapper::new(store, messenger).build_schema(type_name, description, &doc)?;
    Ok(report)
}

/// Main entry point: bulk-create records for a schema from raw JSON.
pub fn create_content<R: RecordStore, M: Messenger>(
    store: &mut R,
    messenger: &M,
    schema: &SchemaDefinition,
    raw: &str,
) -> Result<usize, KilnError> {
    let items = decode_array(raw)?;
    let records = build_records(schema, &items)?;
    let created =
        RecordLoader::new(store, messenger).create_records(&schema.type_name, &records)?;
    Ok(created)
}

/// Main entry point: export a content type's published records.
pub fn export_content<R: RecordStore>(
    store: &R,
    type_name: &str,
) -> Result<ExportDocument, StoreError> {
    export_records(store, type_name, chrono::Local::now())
}

//! Content-type schema mapping
//!
//! Turns a JSON object of field definitions into a content-type schema:
//! one type definition plus an ordered set of field definitions, then
//! applies that schema to a [`SchemaStore`](crate::store::SchemaStore)
//! with create-or-skip semantics and per-field outcome reporting.

pub mod mapper;
pub mod spec;

pub use mapper::{
    FieldOutcome, FieldStatus, SchemaBuildReport, SchemaMapper, DEFAULT_ENTITY_KIND,
};
pub use spec::{
    resolve_entries, FieldEntry, FieldSpec, FieldType, ResolvedEntry, SchemaDefinition,
    SchemaError, TITLE_FIELD,
};

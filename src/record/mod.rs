//! Record mapping - bulk creation of typed records from JSON arrays
//!
//! Validates a decoded JSON array up front, filters each element's keys
//! against a schema, and persists the survivors through a
//! [`RecordStore`](crate::store::RecordStore) best-effort.

pub mod mapper;

pub use mapper::{
    build_records, preview_records, RecordError, RecordInput, RecordLoader, RecordPreview,
};

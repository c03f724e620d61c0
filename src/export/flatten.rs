//! Flattening of stored records and export document assembly
//!
//! Flattening is a pure transform: a field holding exactly one item with
//! a `value` key collapses to that bare scalar, anything else keeps its
//! raw item list. Field order follows each record's native order, record
//! order follows the input sequence.

use chrono::{DateTime, Local};
use serde_json::{Map, Value};

use crate::sanitize::FIELD_PREFIX;
use crate::schema::TITLE_FIELD;
use crate::store::{RecordFilter, RecordStore, StoreError, StoredRecord};

/// MIME type of the produced export document.
pub const EXPORT_MIME: &str = "application/json";

/// Flatten one stored record into an export object.
///
/// Only fields in the `field_` namespace and the reserved title
/// attribute are exported; internal fields are skipped.
pub fn flatten_record(record: &StoredRecord) -> Map<String, Value> {
    let mut item = Map::new();

    for (field_name, items) in &record.fields {
        if !field_name.starts_with(FIELD_PREFIX) && field_name != TITLE_FIELD {
            continue;
        }

        let flattened = match items.as_slice() {
            [single] => match single.get("value") {
                Some(value) => value.clone(),
                None => Value::Array(items.clone()),
            },
            _ => Value::Array(items.clone()),
        };
        item.insert(field_name.clone(), flattened);
    }

    item
}

/// Flatten a sequence of stored records into a JSON array.
pub fn flatten_records(records: &[StoredRecord]) -> Value {
    Value::Array(
        records
            .iter()
            .map(|record| Value::Object(flatten_record(record)))
            .collect(),
    )
}

/// A finished export: filename contract plus the flattened document.
#[derive(Debug, Clone)]
pub struct ExportDocument {
    pub filename: String,
    pub body: Value,
}

impl ExportDocument {
    /// Assemble an export for a content type at a point in time.
    pub fn new(type_name: &str, records: &[StoredRecord], at: DateTime<Local>) -> Self {
        ExportDocument {
            filename: format!("{type_name}_export_{}.json", at.format("%Y%m%d_%H%M%S")),
            body: flatten_records(records),
        }
    }

    /// Pretty-printed UTF-8 JSON, the bit-exact downstream contract.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.body)
    }

    /// `Content-Disposition` header value for HTTP delivery.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// Query a bundle's published records and assemble their export.
pub fn export_records<R: RecordStore>(
    store: &R,
    type_name: &str,
    at: DateTime<Local>,
) -> Result<ExportDocument, StoreError> {
    let records = store.query(type_name, RecordFilter::published())?;
    Ok(ExportDocument::new(type_name, &records, at))
}

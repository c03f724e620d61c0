//! Record batch validation, mapping and creation
//!
//! Validation is all-or-nothing and happens before any record is
//! materialized; creation afterwards is best-effort per record. Keys
//! that the schema does not recognize are dropped silently, values pass
//! through unconverted.

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::report::{Level, Messenger};
use crate::schema::{SchemaDefinition, TITLE_FIELD};
use crate::store::{RecordStore, StoreError};

/// Errors produced by the up-front batch validation pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// An array element that is not a JSON object, or is an empty one.
    #[error("item {index} must be a non-empty JSON object")]
    NotAnObject { index: usize },
}

/// The applied fields of one record, in element key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordInput {
    pub fields: IndexMap<String, Value>,
}

impl RecordInput {
    /// Whether no key of the source element applied to the schema.
    ///
    /// Such a record is still created, just with no field values.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Map a decoded JSON array onto record inputs for a schema.
///
/// Every element must be a non-empty object; the first violation fails
/// the whole batch before anything is mapped. For valid elements, a key
/// is applied when it is the reserved title attribute or names a schema
/// field; all other keys are dropped without error.
pub fn build_records(
    schema: &SchemaDefinition,
    items: &[Value],
) -> Result<Vec<RecordInput>, RecordError> {
    for (index, item) in items.iter().enumerate() {
        match item {
            Value::Object(map) if !map.is_empty() => {}
            _ => return Err(RecordError::NotAnObject { index }),
        }
    }

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        // Shape checked by the validation pass above
        let Value::Object(map) = item else { continue };

        let mut input = RecordInput::default();
        for (key, value) in map {
            if schema.accepts_key(key) {
                input.fields.insert(key.clone(), value.clone());
            } else {
                debug!(%key, "dropping key not present on schema");
            }
        }
        records.push(input);
    }

    Ok(records)
}

/// One row of a creation preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPreview {
    /// 1-based position in the input array.
    pub position: usize,
    pub title: String,
    /// `key: value` summaries of the non-title fields.
    pub fields: String,
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Summarize what a batch would create, without touching any store.
pub fn preview_records(items: &[Value]) -> Vec<RecordPreview> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let map = item.as_object();
            let title = map
                .and_then(|m| m.get(TITLE_FIELD))
                .map(render_value)
                .unwrap_or_else(|| "[no title]".to_string());
            let fields = map
                .map(|m| {
                    m.iter()
                        .filter(|(k, _)| k.as_str() != TITLE_FIELD)
                        .map(|(k, v)| format!("{k}: {}", render_value(v)))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            RecordPreview {
                position: index + 1,
                title,
                fields,
            }
        })
        .collect()
}

/// Persists mapped records through a [`RecordStore`].
pub struct RecordLoader<'a, R, M> {
    store: &'a mut R,
    messenger: &'a M,
}

impl<'a, R: RecordStore, M: Messenger> RecordLoader<'a, R, M> {
    pub fn new(store: &'a mut R, messenger: &'a M) -> Self {
        RecordLoader { store, messenger }
    }

    /// Create one stored record per input and return the created count.
    ///
    /// No transaction wraps the batch: a store failure propagates as-is
    /// and leaves records created so far committed.
    pub fn create_records(
        &mut self,
        bundle: &str,
        records: &[RecordInput],
    ) -> Result<usize, StoreError> {
        let mut created = 0;
        for record in records {
            self.store.create(bundle, record)?;
            created += 1;
        }

        self.messenger
            .report(Level::Info, &format!("Created {created} records."));
        Ok(created)
    }
}

//! In-memory store
//!
//! Map-backed implementation of the collaborator traits. Used by tests
//! and doctests, and as the reference for what [`FsStore`](super::FsStore)
//! persists.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::record::RecordInput;
use crate::schema::{FieldSpec, FieldType, SchemaDefinition};
use crate::store::{
    to_item_list, RecordFilter, RecordId, RecordStore, SchemaStore, StoreError, StoredRecord,
};

#[derive(Debug, Clone)]
struct TypeEntry {
    display_name: String,
    description: String,
    // field_name -> (label, instance settings), in attachment order
    configs: IndexMap<String, (String, Map<String, Value>)>,
}

#[derive(Debug, Clone)]
struct StorageEntry {
    field_type: FieldType,
    settings: Map<String, Value>,
}

/// Map-backed schema and record store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    types: IndexMap<String, TypeEntry>,
    // (entity_kind, field_name) -> storage
    storages: IndexMap<(String, String), StorageEntry>,
    records: IndexMap<String, Vec<StoredRecord>>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage settings of a field, if its storage exists.
    pub fn storage_settings(
        &self,
        entity_kind: &str,
        field_name: &str,
    ) -> Option<&Map<String, Value>> {
        self.storages
            .get(&(entity_kind.to_string(), field_name.to_string()))
            .map(|s| &s.settings)
    }

    /// Reassemble the schema of a content type from its stored pieces.
    pub fn load_schema(
        &self,
        entity_kind: &str,
        type_name: &str,
    ) -> Result<SchemaDefinition, StoreError> {
        let entry = self
            .types
            .get(type_name)
            .ok_or_else(|| StoreError::not_found(format!("content type {type_name}")))?;

        let mut schema = SchemaDefinition::new(type_name, entry.description.clone());
        schema.display_name = entry.display_name.clone();

        for (field_name, (label, _)) in &entry.configs {
            let storage = self
                .storages
                .get(&(entity_kind.to_string(), field_name.clone()))
                .ok_or_else(|| {
                    StoreError::backend(format!("field {field_name} has config but no storage"))
                })?;
            schema.fields.push(FieldSpec {
                name: field_name.clone(),
                field_type: storage.field_type.clone(),
                label: label.clone(),
                target_type: storage
                    .settings
                    .get("target_type")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }

        Ok(schema)
    }

    /// Mark an existing record unpublished (test support for the
    /// published-only export filter).
    pub fn unpublish(&mut self, bundle: &str, id: RecordId) {
        if let Some(records) = self.records.get_mut(bundle) {
            for record in records.iter_mut().filter(|r| r.id == id) {
                record.published = false;
            }
        }
    }
}

impl SchemaStore for MemoryStore {
    fn type_exists(&self, type_name: &str) -> Result<bool, StoreError> {
        Ok(self.types.contains_key(type_name))
    }

    fn create_type(
        &mut self,
        type_name: &str,
        display_name: &str,
        description: &str,
    ) -> Result<(), StoreError> {
        self.types.insert(
            type_name.to_string(),
            TypeEntry {
                display_name: display_name.to_string(),
                description: description.to_string(),
                configs: IndexMap::new(),
            },
        );
        Ok(())
    }

    fn field_storage_exists(
        &self,
        entity_kind: &str,
        field_name: &str,
    ) -> Result<bool, StoreError> {
        Ok(self
            .storages
            .contains_key(&(entity_kind.to_string(), field_name.to_string())))
    }

    fn create_field_storage(
        &mut self,
        entity_kind: &str,
        field_name: &str,
        field_type: &FieldType,
        settings: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        self.storages.insert(
            (entity_kind.to_string(), field_name.to_string()),
            StorageEntry {
                field_type: field_type.clone(),
                settings: settings.clone(),
            },
        );
        Ok(())
    }

    fn field_config_exists(
        &self,
        _entity_kind: &str,
        bundle: &str,
        field_name: &str,
    ) -> Result<bool, StoreError> {
        Ok(self
            .types
            .get(bundle)
            .is_some_and(|t| t.configs.contains_key(field_name)))
    }

    fn create_field_config(
        &mut self,
        _entity_kind: &str,
        bundle: &str,
        field_name: &str,
        label: &str,
        settings: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        let entry = self
            .types
            .get_mut(bundle)
            .ok_or_else(|| StoreError::not_found(format!("content type {bundle}")))?;
        entry.configs.insert(
            field_name.to_string(),
            (label.to_string(), settings.clone()),
        );
        Ok(())
    }
}

impl RecordStore for MemoryStore {
    fn create(&mut self, bundle: &str, input: &RecordInput) -> Result<RecordId, StoreError> {
        if !self.types.contains_key(bundle) {
            return Err(StoreError::not_found(format!("content type {bundle}")));
        }

        self.next_id += 1;
        let id = RecordId(self.next_id);

        let mut fields = IndexMap::new();
        for (name, value) in &input.fields {
            fields.insert(name.clone(), to_item_list(value.clone()));
        }

        self.records
            .entry(bundle.to_string())
            .or_default()
            .push(StoredRecord {
                id,
                bundle: bundle.to_string(),
                published: true,
                fields,
            });

        Ok(id)
    }

    fn query(&self, bundle: &str, filter: RecordFilter) -> Result<Vec<StoredRecord>, StoreError> {
        Ok(self
            .records
            .get(bundle)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| !filter.published_only || r.published)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

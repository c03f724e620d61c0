//! Directory-backed store
//!
//! Persists schema pieces and records as plain files under one root:
//! `storage.json` holds the kind-wide field storages, `types/<name>.json`
//! one content type with its field attachments, `records/<name>.jsonl`
//! one record per line in creation order. The layout keeps the
//! storage/config split on disk so each piece stays independently
//! idempotent.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::record::RecordInput;
use crate::schema::{FieldSpec, FieldType, SchemaDefinition};
use crate::store::{
    to_item_list, FileLoader, RecordFilter, RecordId, RecordStore, SchemaStore, StoreError,
    StoredRecord,
};

#[derive(Debug, Serialize, Deserialize)]
struct TypeRecord {
    type_name: String,
    display_name: String,
    description: String,
    // field name -> attachment, in attachment order
    fields: IndexMap<String, FieldAttachment>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FieldAttachment {
    label: String,
    settings: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StorageRecord {
    #[serde(rename = "type")]
    field_type: FieldType,
    settings: Map<String, Value>,
}

// entity kind -> field name -> storage
type StorageFile = IndexMap<String, IndexMap<String, StorageRecord>>;

/// File-system store rooted at one directory.
#[derive(Debug)]
pub struct FsStore {
    root: PathBuf,
    next_ids: HashMap<String, u64>,
}

impl FsStore {
    /// Open a store root, creating the directory layout if needed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join("types"))?;
        std::fs::create_dir_all(root.join("records"))?;
        Ok(FsStore {
            root,
            next_ids: HashMap::new(),
        })
    }

    fn storage_path(&self) -> PathBuf {
        self.root.join("storage.json")
    }

    fn type_path(&self, type_name: &str) -> PathBuf {
        self.root.join("types").join(format!("{type_name}.json"))
    }

    fn records_path(&self, bundle: &str) -> PathBuf {
        self.root.join("records").join(format!("{bundle}.jsonl"))
    }

    fn read_storages(&self) -> Result<StorageFile, StoreError> {
        let path = self.storage_path();
        if !path.exists() {
            return Ok(StorageFile::new());
        }
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    fn write_storages(&self, storages: &StorageFile) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(storages)?;
        std::fs::write(self.storage_path(), json)?;
        Ok(())
    }

    fn read_type(&self, type_name: &str) -> Result<Option<TypeRecord>, StoreError> {
        let path = self.type_path(type_name);
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(path)?;
        Ok(Some(serde_json::from_reader(BufReader::new(file))?))
    }

    fn write_type(&self, record: &TypeRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(self.type_path(&record.type_name), json)?;
        Ok(())
    }

    fn read_records(&self, bundle: &str) -> Result<Vec<StoredRecord>, StoreError> {
        let path = self.records_path(bundle);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(path)?;
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }

    fn next_id(&mut self, bundle: &str) -> Result<u64, StoreError> {
        if let Some(id) = self.next_ids.get_mut(bundle) {
            *id += 1;
            return Ok(*id);
        }
        let id = self.read_records(bundle)?.len() as u64 + 1;
        self.next_ids.insert(bundle.to_string(), id);
        Ok(id)
    }

    /// Reassemble the schema of a content type from its stored pieces.
    pub fn load_schema(
        &self,
        entity_kind: &str,
        type_name: &str,
    ) -> Result<SchemaDefinition, StoreError> {
        let record = self
            .read_type(type_name)?
            .ok_or_else(|| StoreError::not_found(format!("content type {type_name}")))?;
        let storages = self.read_storages()?;
        let kind_storages = storages.get(entity_kind);

        let mut schema = SchemaDefinition::new(type_name, record.description);
        schema.display_name = record.display_name;

        for (field_name, attachment) in &record.fields {
            let storage = kind_storages
                .and_then(|s| s.get(field_name))
                .ok_or_else(|| {
                    StoreError::backend(format!("field {field_name} has config but no storage"))
                })?;
            schema.fields.push(FieldSpec {
                name: field_name.clone(),
                field_type: storage.field_type.clone(),
                label: attachment.label.clone(),
                target_type: storage
                    .settings
                    .get("target_type")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }

        Ok(schema)
    }
}

impl SchemaStore for FsStore {
    fn type_exists(&self, type_name: &str) -> Result<bool, StoreError> {
        Ok(self.type_path(type_name).exists())
    }

    fn create_type(
        &mut self,
        type_name: &str,
        display_name: &str,
        description: &str,
    ) -> Result<(), StoreError> {
        self.write_type(&TypeRecord {
            type_name: type_name.to_string(),
            display_name: display_name.to_string(),
            description: description.to_string(),
            fields: IndexMap::new(),
        })
    }

    fn field_storage_exists(
        &self,
        entity_kind: &str,
        field_name: &str,
    ) -> Result<bool, StoreError> {
        Ok(self
            .read_storages()?
            .get(entity_kind)
            .is_some_and(|s| s.contains_key(field_name)))
    }

    fn create_field_storage(
        &mut self,
        entity_kind: &str,
        field_name: &str,
        field_type: &FieldType,
        settings: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut storages = self.read_storages()?;
        storages.entry(entity_kind.to_string()).or_default().insert(
            field_name.to_string(),
            StorageRecord {
                field_type: field_type.clone(),
                settings: settings.clone(),
            },
        );
        self.write_storages(&storages)
    }

    fn field_config_exists(
        &self,
        _entity_kind: &str,
        bundle: &str,
        field_name: &str,
    ) -> Result<bool, StoreError> {
        Ok(self
            .read_type(bundle)?
            .is_some_and(|t| t.fields.contains_key(field_name)))
    }

    fn create_field_config(
        &mut self,
        _entity_kind: &str,
        bundle: &str,
        field_name: &str,
        label: &str,
        settings: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut record = self
            .read_type(bundle)?
            .ok_or_else(|| StoreError::not_found(format!("content type {bundle}")))?;
        record.fields.insert(
            field_name.to_string(),
            FieldAttachment {
                label: label.to_string(),
                settings: settings.clone(),
            },
        );
        self.write_type(&record)
    }
}

impl RecordStore for FsStore {
    fn create(&mut self, bundle: &str, input: &RecordInput) -> Result<RecordId, StoreError> {
        if !self.type_exists(bundle)? {
            return Err(StoreError::not_found(format!("content type {bundle}")));
        }

        let id = RecordId(self.next_id(bundle)?);
        let mut fields = IndexMap::new();
        for (name, value) in &input.fields {
            fields.insert(name.clone(), to_item_list(value.clone()));
        }
        let record = StoredRecord {
            id,
            bundle: bundle.to_string(),
            published: true,
            fields,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.records_path(bundle))?;
        writeln!(file, "{}", serde_json::to_string(&record)?)?;

        Ok(id)
    }

    fn query(&self, bundle: &str, filter: RecordFilter) -> Result<Vec<StoredRecord>, StoreError> {
        Ok(self
            .read_records(bundle)?
            .into_iter()
            .filter(|r| !filter.published_only || r.published)
            .collect())
    }
}

/// File loader resolving ids as paths under a base directory.
#[derive(Debug)]
pub struct DirFileLoader {
    base: PathBuf,
}

impl DirFileLoader {
    pub fn new(base: impl AsRef<Path>) -> Self {
        DirFileLoader {
            base: base.as_ref().to_path_buf(),
        }
    }
}

impl FileLoader for DirFileLoader {
    fn load(&self, file_id: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.base.join(file_id);
        if !path.exists() {
            return Err(StoreError::not_found(path.display().to_string()));
        }
        Ok(std::fs::read(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn input(pairs: &[(&str, Value)]) -> RecordInput {
        RecordInput {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn test_schema_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let mut store = FsStore::open(dir.path()).unwrap();

        store.create_type("article", "Article", "News").unwrap();
        store
            .create_field_storage(
                "record",
                "field_author",
                &FieldType::EntityReference,
                &json!({"target_type": "user"}).as_object().unwrap().clone(),
            )
            .unwrap();
        store
            .create_field_config(
                "record",
                "article",
                "field_author",
                "Author",
                &json!({"handler": "default"}).as_object().unwrap().clone(),
            )
            .unwrap();

        // Reopen from disk to prove persistence
        let store = FsStore::open(dir.path()).unwrap();
        assert!(store.type_exists("article").unwrap());
        assert!(store.field_storage_exists("record", "field_author").unwrap());

        let schema = store.load_schema("record", "article").unwrap();
        assert_eq!(schema.display_name, "Article");
        assert_eq!(schema.fields.len(), 1);
        assert_eq!(schema.fields[0].field_type, FieldType::EntityReference);
        assert_eq!(schema.fields[0].target_type.as_deref(), Some("user"));
    }

    #[test]
    fn test_records_append_and_query_in_order() {
        let dir = tempdir().unwrap();
        let mut store = FsStore::open(dir.path()).unwrap();
        store.create_type("article", "Article", "").unwrap();

        for title in ["A", "B", "C"] {
            store
                .create("article", &input(&[("title", json!(title))]))
                .unwrap();
        }

        let store = FsStore::open(dir.path()).unwrap();
        let records = store.query("article", RecordFilter::default()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, RecordId(1));
        assert_eq!(records[2].id, RecordId(3));
        assert_eq!(records[1].fields["title"], vec![json!({"value": "B"})]);
    }

    #[test]
    fn test_ids_continue_after_reopen() {
        let dir = tempdir().unwrap();
        let mut store = FsStore::open(dir.path()).unwrap();
        store.create_type("article", "Article", "").unwrap();
        store
            .create("article", &input(&[("title", json!("A"))]))
            .unwrap();

        let mut store = FsStore::open(dir.path()).unwrap();
        let id = store
            .create("article", &input(&[("title", json!("B"))]))
            .unwrap();
        assert_eq!(id, RecordId(2));
    }

    #[test]
    fn test_query_unknown_bundle_is_empty() {
        let dir = tempdir().unwrap();
        let store = FsStore::open(dir.path()).unwrap();
        assert!(store
            .query("missing", RecordFilter::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_file_loader() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("fields.json"), b"{\"a\": \"string\"}").unwrap();

        let loader = DirFileLoader::new(dir.path());
        let bytes = loader.load("fields.json").unwrap();
        assert_eq!(bytes, b"{\"a\": \"string\"}");

        let err = loader.load("missing.json").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}

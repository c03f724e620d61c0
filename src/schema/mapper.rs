//! Store-applying schema build
//!
//! Applies a schema document against a [`SchemaStore`] as a sequence of
//! independent create-or-skip operations. The type, each field storage
//! and each field config are checked for existence before creation, so
//! re-submitting the same document is a no-op rather than an error. One
//! bad field never aborts the rest; store failures propagate as-is and
//! leave prior creations committed.

use serde_json::{Map, Value};
use tracing::debug;

use crate::report::{Level, Messenger};
use crate::schema::spec::{resolve_entries, ResolvedEntry, SchemaDefinition};
use crate::store::{SchemaStore, StoreError};

/// Entity kind the shipped stores partition fields by.
pub const DEFAULT_ENTITY_KIND: &str = "record";

/// What happened to one document entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldStatus {
    /// At least one of {storage, config} was created.
    Created,
    /// Both pieces were already present.
    AlreadyExisted,
    /// The entry could not be resolved and was skipped.
    SkippedError,
}

/// Per-field outcome, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOutcome {
    /// The entry's key as written in the document.
    pub key: String,
    /// Sanitized machine name, where one could be derived.
    pub machine_name: Option<String>,
    pub status: FieldStatus,
}

/// Result of one schema build.
#[derive(Debug, Clone)]
pub struct SchemaBuildReport {
    /// The resolved schema, fields in document order, unique by name.
    pub schema: SchemaDefinition,
    /// Whether the content type itself was created by this run.
    pub type_created: bool,
    /// One outcome per non-duplicate document entry.
    pub outcomes: Vec<FieldOutcome>,
}

impl SchemaBuildReport {
    /// Count of outcomes with the given status.
    pub fn count(&self, status: FieldStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

/// Maps schema documents onto a [`SchemaStore`].
pub struct SchemaMapper<'a, S, M> {
    store: &'a mut S,
    messenger: &'a M,
    entity_kind: String,
}

impl<'a, S: SchemaStore, M: Messenger> SchemaMapper<'a, S, M> {
    pub fn new(store: &'a mut S, messenger: &'a M) -> Self {
        SchemaMapper {
            store,
            messenger,
            entity_kind: DEFAULT_ENTITY_KIND.to_string(),
        }
    }

    /// Override the entity kind fields are created under.
    pub fn with_entity_kind(mut self, entity_kind: impl Into<String>) -> Self {
        self.entity_kind = entity_kind.into();
        self
    }

    /// Build a content type and its fields from a decoded schema document.
    ///
    /// `doc` must be the non-empty object produced by
    /// [`decode_object`](crate::decode::decode_object). Returns the
    /// resolved schema plus per-field outcomes; every outcome is also
    /// reported through the messenger.
    pub fn build_schema(
        &mut self,
        type_name: &str,
        description: &str,
        doc: &Map<String, Value>,
    ) -> Result<SchemaBuildReport, StoreError> {
        let mut schema = SchemaDefinition::new(type_name, description);

        let type_created = if self.store.type_exists(type_name)? {
            debug!(type_name, "content type already exists");
            false
        } else {
            self.store
                .create_type(type_name, &schema.display_name, description)?;
            self.messenger.report(
                Level::Info,
                &format!("Content type {type_name} created."),
            );
            true
        };

        let mut outcomes = Vec::new();

        for entry in resolve_entries(doc) {
            match entry {
                ResolvedEntry::Field { key, spec } => {
                    let mut created_any = false;

                    if !self
                        .store
                        .field_storage_exists(&self.entity_kind, &spec.name)?
                    {
                        self.store.create_field_storage(
                            &self.entity_kind,
                            &spec.name,
                            &spec.field_type,
                            &spec.storage_settings(),
                        )?;
                        created_any = true;
                    }

                    if !self.store.field_config_exists(
                        &self.entity_kind,
                        type_name,
                        &spec.name,
                    )? {
                        self.store.create_field_config(
                            &self.entity_kind,
                            type_name,
                            &spec.name,
                            &spec.label,
                            &spec.instance_settings(),
                        )?;
                        created_any = true;
                    }

                    let status = if created_any {
                        self.messenger.report(
                            Level::Info,
                            &format!("Field {} ({}) added.", spec.label, spec.field_type),
                        );
                        FieldStatus::Created
                    } else {
                        self.messenger.report(
                            Level::Info,
                            &format!("Field {} already exists, skipped.", spec.label),
                        );
                        FieldStatus::AlreadyExisted
                    };

                    outcomes.push(FieldOutcome {
                        key,
                        machine_name: Some(spec.name.clone()),
                        status,
                    });
                    schema.fields.push(spec);
                }
                ResolvedEntry::Duplicate { key, machine_name } => {
                    // First occurrence won; the collapse is reported but
                    // produces no additional outcome.
                    self.messenger.report(
                        Level::Warning,
                        &format!(
                            "Field \"{key}\" collides with an earlier field ({machine_name}), ignored."
                        ),
                    );
                }
                ResolvedEntry::Invalid {
                    key,
                    machine_name,
                    error,
                } => {
                    self.messenger.report(Level::Warning, &error.to_string());
                    outcomes.push(FieldOutcome {
                        key,
                        machine_name,
                        status: FieldStatus::SkippedError,
                    });
                }
            }
        }

        Ok(SchemaBuildReport {
            schema,
            type_created,
            outcomes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::BufferMessenger;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_builds_type_and_fields() {
        let mut store = MemoryStore::new();
        let messenger = BufferMessenger::new();
        let doc = doc(json!({"title": "string", "body": "text"}));

        let report = SchemaMapper::new(&mut store, &messenger)
            .build_schema("article", "News articles", &doc)
            .unwrap();

        assert!(report.type_created);
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.count(FieldStatus::Created), 2);

        let names: Vec<_> = report.schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["field_title", "field_body"]);
        let types: Vec<_> = report
            .schema
            .fields
            .iter()
            .map(|f| f.field_type.as_str())
            .collect();
        assert_eq!(types, vec!["string", "text"]);

        assert!(store.type_exists("article").unwrap());
        assert!(store
            .field_storage_exists(DEFAULT_ENTITY_KIND, "field_title")
            .unwrap());
        assert!(store
            .field_config_exists(DEFAULT_ENTITY_KIND, "article", "field_body")
            .unwrap());
    }

    #[test]
    fn test_resubmission_is_idempotent() {
        let mut store = MemoryStore::new();
        let messenger = BufferMessenger::new();
        let doc = doc(json!({"title": "string"}));

        SchemaMapper::new(&mut store, &messenger)
            .build_schema("article", "", &doc)
            .unwrap();
        let second = SchemaMapper::new(&mut store, &messenger)
            .build_schema("article", "", &doc)
            .unwrap();

        assert!(!second.type_created);
        assert_eq!(second.count(FieldStatus::AlreadyExisted), 1);
        assert_eq!(second.count(FieldStatus::Created), 0);
    }

    #[test]
    fn test_existing_type_still_gains_new_fields() {
        let mut store = MemoryStore::new();
        let messenger = BufferMessenger::new();

        SchemaMapper::new(&mut store, &messenger)
            .build_schema("article", "", &doc(json!({"title": "string"})))
            .unwrap();

        let report = SchemaMapper::new(&mut store, &messenger)
            .build_schema(
                "article",
                "",
                &doc(json!({"title": "string", "summary": "text"})),
            )
            .unwrap();

        assert!(!report.type_created);
        assert_eq!(report.count(FieldStatus::AlreadyExisted), 1);
        assert_eq!(report.count(FieldStatus::Created), 1);
    }

    #[test]
    fn test_shared_storage_new_bundle_counts_as_created() {
        // Storage exists from another bundle; attaching the config to a
        // new bundle is still a material change.
        let mut store = MemoryStore::new();
        let messenger = BufferMessenger::new();
        let doc = doc(json!({"summary": "text"}));

        SchemaMapper::new(&mut store, &messenger)
            .build_schema("article", "", &doc)
            .unwrap();
        let report = SchemaMapper::new(&mut store, &messenger)
            .build_schema("page", "", &doc)
            .unwrap();

        assert_eq!(report.count(FieldStatus::Created), 1);
    }

    #[test]
    fn test_missing_target_type_skips_only_that_field() {
        let mut store = MemoryStore::new();
        let messenger = BufferMessenger::new();
        let doc = doc(json!({
            "title": "string",
            "author": {"type": "entity_reference"},
            "body": "text"
        }));

        let report = SchemaMapper::new(&mut store, &messenger)
            .build_schema("article", "", &doc)
            .unwrap();

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.count(FieldStatus::Created), 2);
        assert_eq!(report.count(FieldStatus::SkippedError), 1);
        assert_eq!(report.schema.fields.len(), 2);

        let skipped = report
            .outcomes
            .iter()
            .find(|o| o.status == FieldStatus::SkippedError)
            .unwrap();
        assert_eq!(skipped.key, "author");
        assert!(!messenger.at_level(Level::Warning).is_empty());
        assert!(!store
            .field_storage_exists(DEFAULT_ENTITY_KIND, "field_author")
            .unwrap());
    }

    #[test]
    fn test_duplicate_key_warns_without_outcome() {
        let mut store = MemoryStore::new();
        let messenger = BufferMessenger::new();
        let doc = doc(json!({
            "Release Date": "string",
            "release-date": "text"
        }));

        let report = SchemaMapper::new(&mut store, &messenger)
            .build_schema("article", "", &doc)
            .unwrap();

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.schema.fields.len(), 1);
        assert_eq!(report.schema.fields[0].field_type.as_str(), "string");
        assert_eq!(messenger.at_level(Level::Warning).len(), 1);
    }

    #[test]
    fn test_entity_reference_with_target_created() {
        let mut store = MemoryStore::new();
        let messenger = BufferMessenger::new();
        let doc = doc(json!({
            "author": {"type": "entity_reference", "target_type": "user"}
        }));

        let report = SchemaMapper::new(&mut store, &messenger)
            .build_schema("article", "", &doc)
            .unwrap();

        assert_eq!(report.count(FieldStatus::Created), 1);
        let storage = store
            .storage_settings(DEFAULT_ENTITY_KIND, "field_author")
            .unwrap();
        assert_eq!(storage.get("target_type"), Some(&json!("user")));
    }
}

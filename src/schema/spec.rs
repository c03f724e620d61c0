//! Schema definition types and pure entry resolution
//!
//! A schema document is a JSON object whose entries are either a bare
//! type string or a definition map. Resolution turns each entry into a
//! uniform [`FieldSpec`] exactly once, up front; everything downstream
//! works on the resolved form.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::sanitize::{capitalize, sanitize_field_name};

/// Reserved base attribute present on every record, outside the
/// `field_` namespace.
pub const TITLE_FIELD: &str = "title";

/// Per-field errors during entry resolution.
///
/// These never abort a schema build; the offending field is skipped and
/// the rest of the document is processed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// An entity reference field without a reference target.
    #[error("missing target_type for field \"{field}\"")]
    MissingTargetType { field: String },

    /// An entry that is neither a non-empty type string nor a map.
    #[error("field \"{field}\" must be a type name or a definition map")]
    InvalidEntry { field: String },
}

/// Field type identifier.
///
/// The known set covers what the shipped stores support directly; the
/// store ultimately decides what it accepts, so unknown type names pass
/// through as [`FieldType::Other`] rather than failing resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    Text,
    TextLong,
    Integer,
    Boolean,
    EntityReference,
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::TextLong => "text_long",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::EntityReference => "entity_reference",
            FieldType::Other(name) => name,
        }
    }

    pub fn is_entity_reference(&self) -> bool {
        matches!(self, FieldType::EntityReference)
    }
}

impl From<&str> for FieldType {
    fn from(name: &str) -> Self {
        match name {
            "string" => FieldType::String,
            "text" => FieldType::Text,
            "text_long" => FieldType::TextLong,
            "integer" => FieldType::Integer,
            "boolean" => FieldType::Boolean,
            "entity_reference" => FieldType::EntityReference,
            other => FieldType::Other(other.to_string()),
        }
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        FieldType::from(name.as_str())
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.as_str().to_string()
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for FieldType {
    fn default() -> Self {
        FieldType::String
    }
}

/// One entry of a schema document, as written.
///
/// Entries come in two shapes: a bare string naming the type, or a map
/// with optional `type`, `label` and `target_type` keys.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEntry {
    Bare(String),
    Detailed {
        field_type: Option<String>,
        label: Option<String>,
        target_type: Option<String>,
    },
}

impl FieldEntry {
    /// Parse an entry from its JSON value.
    ///
    /// Returns `None` for shapes that cannot be an entry: the empty
    /// string, or any value that is neither a string nor a map.
    pub fn from_value(value: &Value) -> Option<FieldEntry> {
        match value {
            Value::String(s) if !s.is_empty() => Some(FieldEntry::Bare(s.clone())),
            Value::Object(map) => Some(FieldEntry::Detailed {
                field_type: map.get("type").and_then(Value::as_str).map(str::to_string),
                label: map.get("label").and_then(Value::as_str).map(str::to_string),
                target_type: map
                    .get("target_type")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }),
            _ => None,
        }
    }
}

/// A fully resolved field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Sanitized machine name, `field_`-prefixed.
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Human-readable display label.
    pub label: String,
    /// Reference target, present iff `field_type` is an entity reference.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_type: Option<String>,
}

impl FieldSpec {
    /// Resolve a document entry into a field definition.
    pub fn resolve(key: &str, entry: FieldEntry) -> Result<FieldSpec, SchemaError> {
        let (field_type, label, target_type) = match entry {
            FieldEntry::Bare(type_name) => (FieldType::from(type_name), None, None),
            FieldEntry::Detailed {
                field_type,
                label,
                target_type,
            } => (
                field_type.map(FieldType::from).unwrap_or_default(),
                label,
                target_type,
            ),
        };

        // target_type travels only on entity references
        let target_type = if field_type.is_entity_reference() {
            match target_type {
                Some(target) => Some(target),
                None => {
                    return Err(SchemaError::MissingTargetType {
                        field: key.to_string(),
                    })
                }
            }
        } else {
            None
        };

        Ok(FieldSpec {
            name: sanitize_field_name(key),
            field_type,
            label: label.unwrap_or_else(|| capitalize(key)),
            target_type,
        })
    }

    /// Settings for the kind-wide field storage.
    pub fn storage_settings(&self) -> Map<String, Value> {
        let mut settings = Map::new();
        if let Some(target) = &self.target_type {
            settings.insert("target_type".to_string(), Value::String(target.clone()));
        }
        settings
    }

    /// Settings for the per-bundle field config.
    pub fn instance_settings(&self) -> Map<String, Value> {
        let mut settings = Map::new();
        if self.field_type.is_entity_reference() {
            settings.insert("handler".to_string(), Value::String("default".to_string()));
        }
        settings
    }
}

/// Outcome of resolving one document entry, in document order.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedEntry {
    /// First occurrence of a machine name: a usable field definition.
    Field { key: String, spec: FieldSpec },
    /// A later entry whose machine name collides with an earlier one.
    Duplicate { key: String, machine_name: String },
    /// An entry that could not be resolved; carries the sanitized name
    /// where one could still be derived.
    Invalid {
        key: String,
        machine_name: Option<String>,
        error: SchemaError,
    },
}

/// Resolve every entry of a schema document, preserving document order.
///
/// Duplicate machine names collapse first-wins; bad entries are marked
/// rather than aborting the document.
pub fn resolve_entries(doc: &Map<String, Value>) -> Vec<ResolvedEntry> {
    let mut seen = Vec::new();
    let mut resolved = Vec::with_capacity(doc.len());

    for (key, value) in doc {
        let entry = match FieldEntry::from_value(value) {
            Some(entry) => entry,
            None => {
                resolved.push(ResolvedEntry::Invalid {
                    key: key.clone(),
                    machine_name: None,
                    error: SchemaError::InvalidEntry { field: key.clone() },
                });
                continue;
            }
        };

        match FieldSpec::resolve(key, entry) {
            Ok(spec) => {
                if seen.contains(&spec.name) {
                    resolved.push(ResolvedEntry::Duplicate {
                        key: key.clone(),
                        machine_name: spec.name,
                    });
                } else {
                    seen.push(spec.name.clone());
                    resolved.push(ResolvedEntry::Field {
                        key: key.clone(),
                        spec,
                    });
                }
            }
            Err(error) => {
                resolved.push(ResolvedEntry::Invalid {
                    key: key.clone(),
                    machine_name: Some(sanitize_field_name(key)),
                    error,
                });
            }
        }
    }

    resolved
}

/// A content-type schema: one type definition plus its ordered fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub type_name: String,
    pub display_name: String,
    pub description: String,
    pub fields: Vec<FieldSpec>,
}

impl SchemaDefinition {
    /// An empty schema; display name defaults to the capitalized type name.
    pub fn new(type_name: impl Into<String>, description: impl Into<String>) -> Self {
        let type_name = type_name.into();
        let display_name = capitalize(&type_name);
        SchemaDefinition {
            type_name,
            display_name,
            description: description.into(),
            fields: Vec::new(),
        }
    }

    /// Pure schema construction from a decoded document.
    ///
    /// Returns the schema alongside the entries that did not become
    /// fields. The store-applying path lives in
    /// [`SchemaMapper`](crate::schema::SchemaMapper).
    pub fn from_entries(
        type_name: impl Into<String>,
        description: impl Into<String>,
        doc: &Map<String, Value>,
    ) -> (Self, Vec<ResolvedEntry>) {
        let mut schema = SchemaDefinition::new(type_name, description);
        let mut rejected = Vec::new();

        for entry in resolve_entries(doc) {
            match entry {
                ResolvedEntry::Field { spec, .. } => schema.fields.push(spec),
                other => rejected.push(other),
            }
        }

        (schema, rejected)
    }

    /// Look up a field by machine name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether a record key applies to this schema: the reserved title
    /// attribute or one of the defined fields.
    pub fn accepts_key(&self, key: &str) -> bool {
        key == TITLE_FIELD || self.field(key).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_bare_entry_resolution() {
        let spec = FieldSpec::resolve("title", FieldEntry::Bare("string".into())).unwrap();
        assert_eq!(spec.name, "field_title");
        assert_eq!(spec.field_type, FieldType::String);
        assert_eq!(spec.label, "Title");
        assert_eq!(spec.target_type, None);
    }

    #[test]
    fn test_detailed_entry_defaults() {
        let entry = FieldEntry::from_value(&json!({})).unwrap();
        let spec = FieldSpec::resolve("summary", entry).unwrap();
        assert_eq!(spec.field_type, FieldType::String);
        assert_eq!(spec.label, "Summary");
    }

    #[test]
    fn test_detailed_entry_explicit() {
        let entry =
            FieldEntry::from_value(&json!({"type": "text_long", "label": "Body text"})).unwrap();
        let spec = FieldSpec::resolve("body", entry).unwrap();
        assert_eq!(spec.name, "field_body");
        assert_eq!(spec.field_type, FieldType::TextLong);
        assert_eq!(spec.label, "Body text");
    }

    #[test]
    fn test_entity_reference_requires_target() {
        let entry = FieldEntry::from_value(&json!({"type": "entity_reference"})).unwrap();
        let err = FieldSpec::resolve("author", entry).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingTargetType {
                field: "author".to_string()
            }
        );

        // Bare form can never carry a target
        let err =
            FieldSpec::resolve("author", FieldEntry::Bare("entity_reference".into())).unwrap_err();
        assert!(matches!(err, SchemaError::MissingTargetType { .. }));
    }

    #[test]
    fn test_entity_reference_settings() {
        let entry = FieldEntry::from_value(
            &json!({"type": "entity_reference", "target_type": "user"}),
        )
        .unwrap();
        let spec = FieldSpec::resolve("author", entry).unwrap();
        assert_eq!(spec.target_type.as_deref(), Some("user"));
        assert_eq!(
            spec.storage_settings().get("target_type"),
            Some(&json!("user"))
        );
        assert_eq!(
            spec.instance_settings().get("handler"),
            Some(&json!("default"))
        );
    }

    #[test]
    fn test_target_type_dropped_for_plain_fields() {
        let entry =
            FieldEntry::from_value(&json!({"type": "string", "target_type": "user"})).unwrap();
        let spec = FieldSpec::resolve("name", entry).unwrap();
        assert_eq!(spec.target_type, None);
        assert!(spec.storage_settings().is_empty());
    }

    #[test]
    fn test_unknown_type_passes_through() {
        let spec = FieldSpec::resolve("when", FieldEntry::Bare("datetime".into())).unwrap();
        assert_eq!(spec.field_type, FieldType::Other("datetime".to_string()));
        assert_eq!(spec.field_type.as_str(), "datetime");
    }

    #[test]
    fn test_resolve_entries_preserves_order() {
        let doc = doc(json!({
            "title": "string",
            "body": "text",
            "summary": {"type": "text_long"}
        }));

        let resolved = resolve_entries(&doc);
        let names: Vec<_> = resolved
            .iter()
            .map(|e| match e {
                ResolvedEntry::Field { spec, .. } => spec.name.as_str(),
                _ => panic!("all entries should resolve"),
            })
            .collect();
        assert_eq!(names, vec!["field_title", "field_body", "field_summary"]);
    }

    #[test]
    fn test_duplicate_machine_names_collapse_first_wins() {
        // Both labels sanitize to field_release_date
        let doc = doc(json!({
            "Release Date": "string",
            "release-date": "text"
        }));

        let resolved = resolve_entries(&doc);
        assert!(matches!(
            &resolved[0],
            ResolvedEntry::Field { spec, .. } if spec.field_type == FieldType::String
        ));
        assert!(matches!(
            &resolved[1],
            ResolvedEntry::Duplicate { machine_name, .. }
                if machine_name == "field_release_date"
        ));
    }

    #[test]
    fn test_invalid_entries_marked_not_fatal() {
        let doc = doc(json!({
            "ok": "string",
            "bad_number": 5,
            "bad_empty": ""
        }));

        let (schema, rejected) = SchemaDefinition::from_entries("article", "", &doc);
        assert_eq!(schema.fields.len(), 1);
        assert_eq!(rejected.len(), 2);
        assert!(rejected.iter().all(|e| matches!(
            e,
            ResolvedEntry::Invalid {
                error: SchemaError::InvalidEntry { .. },
                ..
            }
        )));
    }

    #[test]
    fn test_schema_accepts_key() {
        let doc = doc(json!({"summary": "string"}));
        let (schema, _) = SchemaDefinition::from_entries("article", "", &doc);

        assert!(schema.accepts_key("title"));
        assert!(schema.accepts_key("field_summary"));
        assert!(!schema.accepts_key("summary"));
        assert!(!schema.accepts_key("unknown"));
    }

    #[test]
    fn test_display_name_defaults_to_capitalized_type() {
        let schema = SchemaDefinition::new("article", "News articles");
        assert_eq!(schema.display_name, "Article");
    }

    #[test]
    fn test_field_type_serde_round_trip() {
        let spec = FieldSpec {
            name: "field_author".into(),
            field_type: FieldType::EntityReference,
            label: "Author".into(),
            target_type: Some("user".into()),
        };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json.get("type"), Some(&json!("entity_reference")));
        let back: FieldSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, spec);
    }
}

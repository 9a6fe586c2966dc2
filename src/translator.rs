//! Schema translator - converts remote schema documents into registry entries.
//!
//! [`SchemaTranslator::translate`] walks every field of a schema document and maps its
//! type descriptor with [`SchemaTranslator::map_field_type`]. Descriptors naming another
//! type (nested objects, `array[X]`, `map[X]`) pull that type's schema from the
//! [`SchemaSource`] and translate it first, so that the registry ends up holding every
//! reachable type exactly once.

use crate::assembly::Descriptions;
use crate::client::{sibling_schema_location, SchemaSource};
use crate::document::Schema;
use crate::error::{Error, Result};
use crate::field_type::FieldType;
use crate::registry::SchemaRegistry;
use crate::remote::{Field, SchemaDocument};
use log::{debug, error};
use std::collections::BTreeMap;

/// Pattern every hostname-like field must match
pub const HOSTNAME_PATTERN: &str = r"^(\w|[A-Za-z0-9-\.]*\w)$";

/// Translates remote schema documents into the shared [`SchemaRegistry`]
pub struct SchemaTranslator<'a> {
    source: &'a dyn SchemaSource,
    descriptions: &'a Descriptions,
}

impl<'a> SchemaTranslator<'a> {
    pub fn new(source: &'a dyn SchemaSource, descriptions: &'a Descriptions) -> Self {
        Self {
            source,
            descriptions,
        }
    }

    /// Translates `document` (fetched from `location`) and registers it under its id.
    ///
    /// Does nothing if the registry already holds the id, finished or not.
    pub fn translate(&self, registry: &mut SchemaRegistry, document: &SchemaDocument, location: &str) {
        let name = document.id.as_str();
        if !registry.reserve(name) {
            return;
        }

        debug!("Translating schema {} from {}", name, location);

        let required: Vec<String> = document
            .fields()
            .filter(|(_, field)| field.required)
            .map(|(field_name, _)| field_name.clone())
            .collect();

        let mut properties = BTreeMap::new();
        for (field_name, field) in document.fields() {
            let property = self.map_field_type(registry, field, location);
            properties.insert(field_name.clone(), property);
        }

        let schema = Schema {
            schema_type: Some("object".to_string()),
            description: self.descriptions.get(name).cloned(),
            required: if required.is_empty() {
                None
            } else {
                Some(required)
            },
            properties: if properties.is_empty() {
                None
            } else {
                Some(properties)
            },
            ..Default::default()
        };

        registry.finish(name, schema);
    }

    /// Maps one field to its schema fragment.
    ///
    /// Types referenced by the field are resolved next to `enclosing_location` and
    /// translated into `registry` as a side effect. A nested object field becomes a
    /// pure reference and loses every other attribute.
    pub fn map_field_type(
        &self,
        registry: &mut SchemaRegistry,
        field: &Field,
        enclosing_location: &str,
    ) -> Schema {
        let mut schema = Schema {
            default: field.default.clone(),
            enum_values: field.options.clone(),
            minimum: field.min,
            maximum: field.max,
            min_length: field.min_length,
            max_length: field.max_length,
            pattern: field.valid_chars.clone().filter(|p| !p.is_empty()),
            nullable: field.nullable,
            read_only: !field.create && !field.update,
            ..Default::default()
        };

        let mut notes = Vec::new();
        if let Some(usage) = usage_note(field) {
            notes.push(usage);
        }
        if let Some(description) = field.description.as_ref().filter(|d| !d.is_empty()) {
            notes.push(description.clone());
        }

        if let Some(reference) =
            self.apply_type(registry, &mut schema, &mut notes, &field.field_type, enclosing_location)
        {
            return reference;
        }

        schema.description = join_notes(notes);
        schema
    }

    /// Schema for the element type of an `array[...]` or `map[...]` descriptor
    fn map_item_type(&self, registry: &mut SchemaRegistry, descriptor: &str, enclosing_location: &str) -> Schema {
        let mut schema = Schema::default();
        let mut notes = Vec::new();

        if let Some(reference) =
            self.apply_type(registry, &mut schema, &mut notes, descriptor, enclosing_location)
        {
            return reference;
        }

        schema.description = join_notes(notes);
        schema
    }

    /// Applies the type part of `descriptor` to `schema`.
    ///
    /// Returns a replacement reference when the descriptor names a nested object type
    /// that could be resolved.
    fn apply_type(
        &self,
        registry: &mut SchemaRegistry,
        schema: &mut Schema,
        notes: &mut Vec<String>,
        descriptor: &str,
        enclosing_location: &str,
    ) -> Option<Schema> {
        match FieldType::parse(descriptor) {
            FieldType::Literal(literal) => set_type(schema, literal),
            FieldType::Date => {
                set_type(schema, "string");
                schema.format = Some("date-time".to_string());
            }
            FieldType::Password => {
                set_type(schema, "string");
                schema.format = Some("password".to_string());
            }
            FieldType::Int => set_type(schema, "integer"),
            FieldType::IntOrString => {
                schema.one_of = Some(vec![Schema::of_type("string"), Schema::of_type("integer")]);
            }
            FieldType::Float => set_type(schema, "number"),
            FieldType::Base64 => {
                set_type(schema, "string");
                notes.push("Base64 encoded string".to_string());
            }
            FieldType::Multiline | FieldType::Enum => set_type(schema, "string"),
            FieldType::Json => set_type(schema, "object"),
            FieldType::Hostname => {
                set_type(schema, "string");
                schema.pattern = Some(HOSTNAME_PATTERN.to_string());
                notes.push("Must be valid Hostname".to_string());
            }
            FieldType::ArrayOfStrings => {
                set_type(schema, "array");
                schema.items = Some(Box::new(Schema::of_type("string")));
                notes.push("Array of Strings".to_string());
            }
            FieldType::ArrayOfInts => {
                set_type(schema, "array");
                schema.items = Some(Box::new(Schema::of_type("integer")));
                notes.push("Array of Integers".to_string());
            }
            FieldType::ArrayOfEnums => {
                // options describe the elements, not the array
                let items = Schema {
                    enum_values: schema.enum_values.take(),
                    ..Schema::of_type("string")
                };
                set_type(schema, "array");
                schema.items = Some(Box::new(items));
                notes.push("Array of Valid Options".to_string());
            }
            FieldType::ArrayOfReferences(target) => {
                set_type(schema, "array");
                schema.items = Some(Box::new(Schema::of_type("string")));
                notes.push(format!("Array of Ids of {}", target));
            }
            FieldType::Reference(target) => {
                set_type(schema, "string");
                notes.push(format!("Id of {}", target));
            }
            FieldType::ArrayOf(inner) => {
                set_type(schema, "array");
                let items = self.map_item_type(registry, inner, enclosing_location);
                schema.items = Some(Box::new(items));
            }
            FieldType::StringMap => {
                set_type(schema, "object");
                schema.example = Some(serde_json::json!({"key": "value"}));
            }
            FieldType::MapOf(inner) => {
                set_type(schema, "object");
                let values = self.map_item_type(registry, inner, enclosing_location);
                schema.additional_properties = Some(Box::new(values));
            }
            FieldType::Object(type_name) => {
                match self.resolve(registry, type_name, enclosing_location) {
                    Ok(reference) => return Some(reference),
                    Err(e) => {
                        error!("Keeping `{}` as a plain object: {}", descriptor, e);
                        set_type(schema, "object");
                    }
                }
            }
        }

        None
    }

    /// Makes sure `type_name` is in the registry and returns a reference to it.
    ///
    /// A type already present is not fetched again, whether it is named by its schema
    /// id or by a descriptor that resolved to that id before.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaResolution`] if the type's schema cannot be fetched.
    pub fn resolve(
        &self,
        registry: &mut SchemaRegistry,
        type_name: &str,
        enclosing_location: &str,
    ) -> Result<Schema> {
        if let Some(name) = registry.canonical(type_name) {
            return Ok(Schema::reference(name));
        }

        let location = sibling_schema_location(enclosing_location, type_name);
        let document = self
            .source
            .fetch_schema(&location)
            .map_err(|e| Error::resolution(type_name, e))?;

        registry.alias(type_name, &document.id);
        self.translate(registry, &document, &location);
        Ok(Schema::reference(&document.id))
    }
}

fn set_type(schema: &mut Schema, schema_type: &str) {
    schema.schema_type = Some(schema_type.to_string());
}

/// "Allowed in Methods: `POST` `PUT`" for fields accepted on create and update
fn usage_note(field: &Field) -> Option<String> {
    if !field.create && !field.update {
        return None;
    }
    let mut usage = "Allowed in Methods:".to_string();
    if field.create {
        usage.push_str(" `POST`");
    }
    if field.update {
        usage.push_str(" `PUT`");
    }
    Some(usage)
}

fn join_notes(notes: Vec<String>) -> Option<String> {
    if notes.is_empty() {
        None
    } else {
        Some(notes.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory::MemorySource;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const SCHEMAS: &str = "https://api.local/v3/schemas";

    fn location(name: &str) -> String {
        format!("{}/{}", SCHEMAS, name)
    }

    fn field(field_type: &str) -> Field {
        Field {
            field_type: field_type.to_string(),
            create: true,
            ..Default::default()
        }
    }

    fn schema_document(source: &MemorySource, name: &str) -> SchemaDocument {
        source.fetch_schema(&location(name)).unwrap()
    }

    fn widget_source() -> MemorySource {
        MemorySource::new().with(
            &location("widget"),
            json!({
                "id": "widget",
                "resourceFields": {
                    "name": {"type": "string", "required": true, "create": true},
                    "count": {"type": "int"}
                }
            }),
        )
    }

    #[test]
    fn test_translate_simple_schema() {
        let source = widget_source();
        let descriptions = Descriptions::new();
        let translator = SchemaTranslator::new(&source, &descriptions);
        let mut registry = SchemaRegistry::new();

        let document = schema_document(&source, "widget");
        translator.translate(&mut registry, &document, &location("widget"));

        let widget = registry.get("widget").unwrap();
        assert_eq!(widget.schema_type.as_deref(), Some("object"));
        assert_eq!(widget.required, Some(vec!["name".to_string()]));

        let properties = widget.properties.as_ref().unwrap();
        assert_eq!(properties["name"].schema_type.as_deref(), Some("string"));
        assert_eq!(
            properties["name"].description.as_deref(),
            Some("Allowed in Methods: `POST`")
        );
        assert_eq!(properties["count"].schema_type.as_deref(), Some("integer"));
        assert!(properties["count"].read_only);
    }

    #[test]
    fn test_translate_is_idempotent() {
        let source = widget_source();
        let descriptions = Descriptions::new();
        let translator = SchemaTranslator::new(&source, &descriptions);
        let mut registry = SchemaRegistry::new();
        let document = schema_document(&source, "widget");

        translator.translate(&mut registry, &document, &location("widget"));
        let first = registry.clone();
        translator.translate(&mut registry, &document, &location("widget"));

        assert_eq!(registry, first);
    }

    #[test]
    fn test_resolve_does_not_refetch_registered_types() {
        let source = MemorySource::new()
            .with(
                &location("cluster"),
                json!({"id": "cluster", "resourceFields": {
                    "spec": {"type": "clusterSpec"},
                    "status": {"type": "clusterSpec"}
                }}),
            )
            .with(&location("clusterSpec"), json!({"id": "clusterSpec"}));
        let descriptions = Descriptions::new();
        let translator = SchemaTranslator::new(&source, &descriptions);
        let mut registry = SchemaRegistry::new();

        let document = schema_document(&source, "cluster");
        translator.translate(&mut registry, &document, &location("cluster"));
        translator
            .resolve(&mut registry, "clusterSpec", &location("cluster"))
            .unwrap();

        assert_eq!(source.request_count(&location("clusterSpec")), 1);
        assert!(registry.get("clusterSpec").is_some());
    }

    #[test]
    fn test_mutual_references_terminate() {
        let source = MemorySource::new()
            .with(
                &location("a"),
                json!({"id": "a", "resourceFields": {"b": {"type": "b"}}}),
            )
            .with(
                &location("b"),
                json!({"id": "b", "resourceFields": {"a": {"type": "a"}, "all": {"type": "array[a]"}}}),
            );
        let descriptions = Descriptions::new();
        let translator = SchemaTranslator::new(&source, &descriptions);
        let mut registry = SchemaRegistry::new();

        let document = schema_document(&source, "a");
        translator.translate(&mut registry, &document, &location("a"));

        assert_eq!(registry.len(), 2);
        assert!(registry.pending().is_empty());

        let a = registry.get("a").unwrap().properties.as_ref().unwrap();
        assert_eq!(a["b"], Schema::reference("b"));

        let b = registry.get("b").unwrap().properties.as_ref().unwrap();
        assert_eq!(b["a"], Schema::reference("a"));
        assert_eq!(b["all"].items.as_deref(), Some(&Schema::reference("a")));

        // one fetch for `a` by the test, one for `b` by the translator
        assert_eq!(source.request_count(&location("a")), 1);
        assert_eq!(source.request_count(&location("b")), 1);
    }

    #[test]
    fn test_mutual_references_terminate_from_either_side() {
        let source = MemorySource::new()
            .with(
                &location("a"),
                json!({"id": "a", "resourceFields": {"b": {"type": "b"}}}),
            )
            .with(
                &location("b"),
                json!({"id": "b", "resourceFields": {"byName": {"type": "map[a]"}}}),
            );
        let descriptions = Descriptions::new();
        let translator = SchemaTranslator::new(&source, &descriptions);
        let mut registry = SchemaRegistry::new();

        let document = schema_document(&source, "b");
        translator.translate(&mut registry, &document, &location("b"));

        assert_eq!(registry.len(), 2);
        assert!(registry.pending().is_empty());

        let b = registry.get("b").unwrap().properties.as_ref().unwrap();
        assert_eq!(
            b["byName"].additional_properties.as_deref(),
            Some(&Schema::reference("a"))
        );
        let a = registry.get("a").unwrap().properties.as_ref().unwrap();
        assert_eq!(a["b"], Schema::reference("b"));
        assert_eq!(source.request_count(&location("a")), 1);
    }

    #[test]
    fn test_descriptor_differing_from_schema_id_is_fetched_once() {
        let source = MemorySource::new()
            .with(
                &location("cluster"),
                json!({"id": "cluster", "resourceFields": {
                    "spec": {"type": "spec"},
                    "desired": {"type": "spec"},
                    "history": {"type": "array[spec]"}
                }}),
            )
            .with(&location("spec"), json!({"id": "Spec"}));
        let descriptions = Descriptions::new();
        let translator = SchemaTranslator::new(&source, &descriptions);
        let mut registry = SchemaRegistry::new();

        let document = schema_document(&source, "cluster");
        translator.translate(&mut registry, &document, &location("cluster"));

        assert_eq!(source.request_count(&location("spec")), 1);
        let cluster = registry.get("cluster").unwrap().properties.as_ref().unwrap();
        assert_eq!(cluster["spec"], Schema::reference("Spec"));
        assert_eq!(cluster["desired"], Schema::reference("Spec"));
        assert_eq!(cluster["history"].items.as_deref(), Some(&Schema::reference("Spec")));
        assert!(registry.get("spec").is_none());
        assert!(registry.get("Spec").is_some());
    }

    #[test]
    fn test_self_reference_terminates() {
        let source = MemorySource::new().with(
            &location("tree"),
            json!({"id": "tree", "resourceFields": {"children": {"type": "array[tree]"}}}),
        );
        let descriptions = Descriptions::new();
        let translator = SchemaTranslator::new(&source, &descriptions);
        let mut registry = SchemaRegistry::new();

        let document = schema_document(&source, "tree");
        translator.translate(&mut registry, &document, &location("tree"));

        let tree = registry.get("tree").unwrap().properties.as_ref().unwrap();
        assert_eq!(tree["children"].items.as_deref(), Some(&Schema::reference("tree")));
        assert_eq!(source.requests().len(), 1);
    }

    #[test]
    fn test_array_of_references_is_not_resolved() {
        let source = MemorySource::new();
        let descriptions = Descriptions::new();
        let translator = SchemaTranslator::new(&source, &descriptions);
        let mut registry = SchemaRegistry::new();

        let schema = translator.map_field_type(
            &mut registry,
            &field("array[reference[foo]]"),
            &location("x"),
        );

        assert_eq!(schema.schema_type.as_deref(), Some("array"));
        assert_eq!(schema.items.as_deref(), Some(&Schema::of_type("string")));
        assert!(schema.description.unwrap().ends_with("Array of Ids of foo"));
        assert!(source.requests().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_generic_array_resolves_item_type() {
        let source = MemorySource::new().with(&location("bar"), json!({"id": "bar"}));
        let descriptions = Descriptions::new();
        let translator = SchemaTranslator::new(&source, &descriptions);
        let mut registry = SchemaRegistry::new();

        let schema = translator.map_field_type(&mut registry, &field("array[bar]"), &location("x"));

        assert_eq!(schema.schema_type.as_deref(), Some("array"));
        assert_eq!(schema.items.as_deref(), Some(&Schema::reference("bar")));
        assert!(registry.get("bar").is_some());
    }

    #[test]
    fn test_reference_is_an_id() {
        let source = MemorySource::new();
        let descriptions = Descriptions::new();
        let translator = SchemaTranslator::new(&source, &descriptions);
        let mut registry = SchemaRegistry::new();

        let mut f = field("reference[cluster]");
        f.description = Some("Owning cluster".to_string());
        let schema = translator.map_field_type(&mut registry, &f, &location("x"));

        assert_eq!(schema.schema_type.as_deref(), Some("string"));
        assert_eq!(
            schema.description.as_deref(),
            Some("Allowed in Methods: `POST`; Owning cluster; Id of cluster")
        );
    }

    #[test]
    fn test_nested_object_becomes_pure_reference() {
        let source = MemorySource::new().with(&location("spec"), json!({"id": "spec"}));
        let descriptions = Descriptions::new();
        let translator = SchemaTranslator::new(&source, &descriptions);
        let mut registry = SchemaRegistry::new();

        let f = Field {
            field_type: "spec".to_string(),
            default: Some(json!({"a": 1})),
            options: Some(vec!["x".to_string()]),
            min: Some(1),
            max: Some(2),
            min_length: Some(1),
            max_length: Some(9),
            valid_chars: Some("abc".to_string()),
            nullable: true,
            description: Some("Spec".to_string()),
            ..Default::default()
        };
        let schema = translator.map_field_type(&mut registry, &f, &location("x"));

        assert_eq!(schema, Schema::reference("spec"));
    }

    #[test]
    fn test_unresolvable_object_degrades() {
        let source = MemorySource::new();
        let descriptions = Descriptions::new();
        let translator = SchemaTranslator::new(&source, &descriptions);
        let mut registry = SchemaRegistry::new();

        let mut f = field("missingType");
        f.nullable = true;
        let schema = translator.map_field_type(&mut registry, &f, &location("x"));

        assert!(schema.reference.is_none());
        assert_eq!(schema.schema_type.as_deref(), Some("object"));
        assert!(schema.nullable);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unresolvable_map_value_degrades() {
        let source = MemorySource::new().with_raw(&location("broken"), "not json");
        let descriptions = Descriptions::new();
        let translator = SchemaTranslator::new(&source, &descriptions);
        let mut registry = SchemaRegistry::new();

        let schema = translator.map_field_type(&mut registry, &field("map[broken]"), &location("x"));

        assert_eq!(schema.schema_type.as_deref(), Some("object"));
        let values = schema.additional_properties.unwrap();
        assert!(values.reference.is_none());
        assert_eq!(values.schema_type.as_deref(), Some("object"));
    }

    #[test]
    fn test_map_of_type_references_values() {
        let source = MemorySource::new().with(&location("label"), json!({"id": "label"}));
        let descriptions = Descriptions::new();
        let translator = SchemaTranslator::new(&source, &descriptions);
        let mut registry = SchemaRegistry::new();

        let schema = translator.map_field_type(&mut registry, &field("map[label]"), &location("x"));

        assert_eq!(schema.schema_type.as_deref(), Some("object"));
        assert_eq!(schema.additional_properties.as_deref(), Some(&Schema::reference("label")));
    }

    #[test]
    fn test_scalar_mappings() {
        let source = MemorySource::new();
        let descriptions = Descriptions::new();
        let translator = SchemaTranslator::new(&source, &descriptions);
        let mut registry = SchemaRegistry::new();
        let mut map = |t: &str| translator.map_field_type(&mut registry, &field(t), &location("x"));

        let date = map("date");
        assert_eq!(date.schema_type.as_deref(), Some("string"));
        assert_eq!(date.format.as_deref(), Some("date-time"));

        let password = map("password");
        assert_eq!(password.format.as_deref(), Some("password"));

        let either = map("intOrString");
        assert!(either.schema_type.is_none());
        assert_eq!(
            either.one_of,
            Some(vec![Schema::of_type("string"), Schema::of_type("integer")])
        );

        let base64 = map("base64");
        assert!(base64.description.unwrap().contains("Base64 encoded string"));

        let host = map("dnsLabel");
        assert_eq!(host.pattern.as_deref(), Some(HOSTNAME_PATTERN));
        assert!(host.description.unwrap().contains("Must be valid Hostname"));

        let labels = map("map[string]");
        assert_eq!(labels.schema_type.as_deref(), Some("object"));
        assert_eq!(labels.example, Some(json!({"key": "value"})));

        let strings = map("array[string]");
        assert_eq!(strings.items.as_deref(), Some(&Schema::of_type("string")));
    }

    #[test]
    fn test_enum_options() {
        let source = MemorySource::new();
        let descriptions = Descriptions::new();
        let translator = SchemaTranslator::new(&source, &descriptions);
        let mut registry = SchemaRegistry::new();

        let mut f = field("enum");
        f.options = Some(vec!["active".to_string(), "inactive".to_string()]);
        let single = translator.map_field_type(&mut registry, &f, &location("x"));
        assert_eq!(single.schema_type.as_deref(), Some("string"));
        assert_eq!(single.enum_values.as_ref().unwrap().len(), 2);

        f.field_type = "array[enum]".to_string();
        let many = translator.map_field_type(&mut registry, &f, &location("x"));
        assert!(many.enum_values.is_none());
        assert_eq!(many.items.unwrap().enum_values.unwrap().len(), 2);
    }

    #[test]
    fn test_usage_note() {
        let mut f = field("string");
        f.update = true;
        assert_eq!(usage_note(&f).as_deref(), Some("Allowed in Methods: `POST` `PUT`"));

        f.create = false;
        assert_eq!(usage_note(&f).as_deref(), Some("Allowed in Methods: `PUT`"));

        f.update = false;
        assert_eq!(usage_note(&f), None);
    }

    #[test]
    fn test_description_overlay_applies_to_type() {
        let source = widget_source();
        let mut descriptions = Descriptions::new();
        descriptions.insert("widget".to_string(), "A small gadget".to_string());
        let translator = SchemaTranslator::new(&source, &descriptions);
        let mut registry = SchemaRegistry::new();

        let document = schema_document(&source, "widget");
        translator.translate(&mut registry, &document, &location("widget"));

        assert_eq!(
            registry.get("widget").unwrap().description.as_deref(),
            Some("A small gadget")
        );
    }
}

//! Path and operation construction for discovered collections.
//!
//! Every collection yields two paths: the collection itself (list/create) and one
//! of its items (get/update/delete). Which operations appear is decided by the
//! methods the remote schema advertises.

use crate::document::{
    MediaType, OpenApiDocument, Operation, PathItem, RefOr, RequestBody, Response, Schema,
};
use log::{debug, warn};
use std::collections::BTreeMap;

/// Everything needed to emit the paths of one discovered collection
#[derive(Debug, Clone)]
pub struct CollectionEntry<'a> {
    /// Collection name, also the registry key of its list schema
    pub name: &'a str,
    /// Registry key of the item schema
    pub resource_type: &'a str,
    /// `<prefix>/<name>`
    pub collection_path: String,
    /// `<prefix>/<name>/{<resourceType>Id}`
    pub item_path: String,
    /// Parameters of the enclosing path segments
    pub inherited_parameters: Vec<String>,
    /// Identifier parameter of this collection's items
    pub id_parameter: String,
    pub tag: String,
    pub collection_methods: &'a [String],
    pub resource_methods: &'a [String],
}

impl<'a> CollectionEntry<'a> {
    /// Builds the entry for collection `name` under `prefix`
    pub fn new(
        name: &'a str,
        resource_type: &'a str,
        prefix: &str,
        inherited_parameters: Vec<String>,
        tag: String,
        collection_methods: &'a [String],
        resource_methods: &'a [String],
    ) -> Self {
        let mut id_parameter = format!("{}Id", resource_type);
        if inherited_parameters.contains(&id_parameter) {
            // same type nested in itself: `/clusters/{clusterId}/children/{childrenClusterId}`
            id_parameter = format!("{}{}", name, capitalize(&id_parameter));
        }
        let collection_path = format!("{}/{}", prefix, name);
        let item_path = format!("{}/{{{}}}", collection_path, id_parameter);

        Self {
            name,
            resource_type,
            collection_path,
            item_path,
            inherited_parameters,
            id_parameter,
            tag,
            collection_methods,
            resource_methods,
        }
    }

    /// Path parameters of the item path: inherited ones plus this collection's id
    pub fn item_parameters(&self) -> Vec<String> {
        let mut parameters = self.inherited_parameters.clone();
        parameters.push(self.id_parameter.clone());
        parameters
    }
}

/// Adds the collection and item paths of `entry` to the document.
///
/// A path that already exists is left untouched, a path without operations is not added.
pub fn add_collection_paths(doc: &mut OpenApiDocument, entry: &CollectionEntry) {
    doc.ensure_path_parameter(&entry.id_parameter);

    for (path, item) in [
        (entry.collection_path.clone(), collection_path_item(entry)),
        (entry.item_path.clone(), resource_path_item(entry)),
    ] {
        if doc.paths.contains_key(&path) {
            warn!("Path {} already emitted, keeping the first", path);
            continue;
        }
        if !item.has_operations() {
            debug!("No operations advertised for {}, leaving it out", path);
            continue;
        }
        debug!("Adding path: {}", path);
        doc.paths.insert(path, item);
    }
}

/// `<prefix>/<name>`: list (GET) and create (POST)
pub fn collection_path_item(entry: &CollectionEntry) -> PathItem {
    let mut item = PathItem {
        parameters: parameter_refs(&entry.inherited_parameters),
        ..Default::default()
    };

    for method in entry.collection_methods {
        match method.as_str() {
            "GET" => item.get = Some(collection_get(entry)),
            "POST" => item.post = Some(collection_post(entry)),
            other => warn!("Unknown collection method {} on {}", other, entry.collection_path),
        }
    }

    item
}

/// `<prefix>/<name>/{id}`: get (GET), update (PUT) and delete (DELETE)
pub fn resource_path_item(entry: &CollectionEntry) -> PathItem {
    let mut item = PathItem {
        parameters: parameter_refs(&entry.item_parameters()),
        ..Default::default()
    };

    for method in entry.resource_methods {
        match method.as_str() {
            "GET" => item.get = Some(resource_get(entry)),
            "PUT" => item.put = Some(resource_put(entry)),
            "DELETE" => item.delete = Some(resource_delete(entry)),
            other => warn!("Unknown resource method {} on {}", other, entry.item_path),
        }
    }

    item
}

fn collection_get(entry: &CollectionEntry) -> Operation {
    Operation {
        tags: vec![entry.tag.clone()],
        summary: Some(format!("List `{}`", entry.name)),
        description: Some(format!("`{}` Collection", entry.name)),
        operation_id: Some(operation_id("list", &entry.collection_path)),
        request_body: None,
        responses: responses(
            "200",
            format!("Returns list of `{}`", entry.name),
            Some(Schema::reference(entry.name)),
        ),
    }
}

fn collection_post(entry: &CollectionEntry) -> Operation {
    Operation {
        tags: vec![entry.tag.clone()],
        summary: Some(format!("Create `{}`", entry.resource_type)),
        description: Some(format!("`{}` Collection", entry.name)),
        operation_id: Some(operation_id("create", &entry.collection_path)),
        request_body: Some(request_body(
            format!("Create a new `{}` object.", entry.resource_type),
            entry.resource_type,
        )),
        responses: responses(
            "201",
            format!("Returns new `{}` object.", entry.resource_type),
            Some(Schema::reference(entry.resource_type)),
        ),
    }
}

fn resource_get(entry: &CollectionEntry) -> Operation {
    Operation {
        tags: vec![entry.tag.clone()],
        summary: Some(format!("Get `{}`", entry.resource_type)),
        description: Some(format!("`{}` Resource", entry.resource_type)),
        operation_id: Some(operation_id("get", &entry.collection_path)),
        request_body: None,
        responses: responses(
            "200",
            format!("Returns `{}` object.", entry.resource_type),
            Some(Schema::reference(entry.resource_type)),
        ),
    }
}

fn resource_put(entry: &CollectionEntry) -> Operation {
    Operation {
        tags: vec![entry.tag.clone()],
        summary: Some(format!("Update `{}`", entry.resource_type)),
        description: Some(format!("`{}` Resource", entry.resource_type)),
        operation_id: Some(operation_id("update", &entry.collection_path)),
        request_body: Some(request_body(
            format!("Update `{}` object.", entry.resource_type),
            entry.resource_type,
        )),
        responses: responses(
            "200",
            format!("Returns `{}` object.", entry.resource_type),
            Some(Schema::reference(entry.resource_type)),
        ),
    }
}

fn resource_delete(entry: &CollectionEntry) -> Operation {
    Operation {
        tags: vec![entry.tag.clone()],
        summary: Some(format!("Delete `{}`", entry.resource_type)),
        description: Some(format!("Delete `{}` Resource", entry.resource_type)),
        operation_id: Some(operation_id("delete", &entry.collection_path)),
        request_body: None,
        responses: responses("204", "Delete Successful".to_string(), None),
    }
}

fn json_content(schema: Schema) -> BTreeMap<String, MediaType> {
    let mut content = BTreeMap::new();
    content.insert("application/json".to_string(), MediaType { schema });
    content
}

fn request_body(description: String, resource_type: &str) -> RequestBody {
    RequestBody {
        description: Some(description),
        required: true,
        content: json_content(Schema::reference(resource_type)),
    }
}

fn responses(status: &str, description: String, schema: Option<Schema>) -> BTreeMap<String, Response> {
    let mut responses = BTreeMap::new();
    responses.insert(
        status.to_string(),
        Response {
            description,
            content: schema.map(json_content),
        },
    );
    responses
}

fn parameter_refs<T>(names: &[String]) -> Vec<RefOr<T>> {
    names.iter().map(|name| RefOr::parameter(name)).collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `verb` followed by every literal path segment in PascalCase.
///
/// `("list", "/clusters/{clusterId}/nodes")` gives `listClustersNodes`.
fn operation_id(verb: &str, path: &str) -> String {
    let mut id = verb.to_string();
    for segment in path
        .split('/')
        .filter(|s| !s.is_empty() && !s.starts_with('{'))
    {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            id.extend(first.to_uppercase());
            id.extend(chars.filter(|c| c.is_ascii_alphanumeric()));
        }
    }
    id
}

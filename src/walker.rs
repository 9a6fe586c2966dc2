//! Collection walker - discovers collections by following hypermedia links.
//!
//! The API publishes no site map. Root collections come from the root document;
//! nested collections are found on the links of the first item a collection returns.
//! For every collection the walker translates the item schema, registers a list
//! schema, and emits the collection and item paths.

use crate::assembly::Descriptions;
use crate::client::{schema_location_for, SchemaSource};
use crate::document::{OpenApiDocument, Schema};
use crate::error::{Error, Result};
use crate::openapi_builder::{add_collection_paths, CollectionEntry};
use crate::remote::CollectionDocument;
use crate::translator::SchemaTranslator;
use log::{debug, error, info};
use std::collections::{BTreeMap, BTreeSet};

/// Registry key of the generic collection envelope every list schema extends
pub const COLLECTION_ENVELOPE: &str = "collection";

/// Links that never lead to a collection following the generic convention
pub const DEFAULT_SKIPS: &[&str] = &[
    "root",
    "self",
    "subscribe",
    // objects don't match the schema and are not under the collection
    "authConfigs",
    // a schema in itself
    "dynamicSchemas",
    // no schema for this collection
    "ldapConfigs",
    "schemas",
    // actions, not collections
    "remove",
    "update",
    "yaml",
];

/// Default limit on collection nesting
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Options steering the walk
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// API root the schema locations are derived from
    pub api_root: String,
    /// Collection names never visited, at any depth
    pub skips: BTreeSet<String>,
    /// Only this root collection is walked when set
    pub only: Option<String>,
    /// Maximum number of nested collection levels below a root collection
    pub max_depth: usize,
    /// Path segments opening a namespace with its own schemas (`project/<id>/...`)
    pub schema_namespaces: Vec<String>,
}

impl WalkOptions {
    pub fn new(api_root: &str) -> Self {
        Self {
            api_root: api_root.trim_end_matches('/').to_string(),
            skips: DEFAULT_SKIPS.iter().map(|s| s.to_string()).collect(),
            only: None,
            max_depth: DEFAULT_MAX_DEPTH,
            schema_namespaces: vec!["project".to_string(), "cluster".to_string()],
        }
    }

    pub fn is_skipped(&self, name: &str) -> bool {
        self.skips.contains(name)
    }
}

/// Position of a collection in the path hierarchy
#[derive(Debug, Clone, Default)]
pub struct PathScope {
    /// Item path of the enclosing collection, empty at the root
    pub prefix: String,
    /// Path parameters accumulated from enclosing levels
    pub parameters: Vec<String>,
    /// Names of the enclosing collections, outermost first
    pub ancestry: Vec<String>,
}

impl PathScope {
    pub fn root() -> Self {
        Self::default()
    }

    /// Number of enclosing collections
    pub fn depth(&self) -> usize {
        self.ancestry.len()
    }

    /// Scope for collections nested in the items of `entry`
    fn nested(&self, entry: &CollectionEntry) -> Self {
        let mut ancestry = self.ancestry.clone();
        ancestry.push(entry.name.to_string());
        Self {
            prefix: entry.item_path.clone(),
            parameters: entry.item_parameters(),
            ancestry,
        }
    }

    /// Tag for operations in this scope: the outermost collection name
    fn tag_for(&self, name: &str) -> String {
        self.ancestry.first().map(String::as_str).unwrap_or(name).to_string()
    }
}

/// Outcome of a walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Collection paths emitted
    pub collections: Vec<String>,
    /// Names skipped by the denylist, filter, loop or depth guards
    pub skipped: Vec<String>,
    /// `(name, error)` for every branch abandoned on error
    pub failed: Vec<(String, String)>,
}

/// Walks collections and fills the output document
pub struct CollectionWalker<'a> {
    source: &'a dyn SchemaSource,
    translator: SchemaTranslator<'a>,
    descriptions: &'a Descriptions,
    options: &'a WalkOptions,
    summary: WalkSummary,
}

impl<'a> CollectionWalker<'a> {
    pub fn new(source: &'a dyn SchemaSource, descriptions: &'a Descriptions, options: &'a WalkOptions) -> Self {
        Self {
            source,
            translator: SchemaTranslator::new(source, descriptions),
            descriptions,
            options,
            summary: WalkSummary::default(),
        }
    }

    /// Walks every root collection. A failing collection is logged and skipped.
    ///
    /// The summary covers this call only.
    pub fn walk_root(&mut self, doc: &mut OpenApiDocument, root_links: &BTreeMap<String, String>) -> WalkSummary {
        self.summary = WalkSummary::default();
        let options = self.options;

        for (name, link) in root_links {
            if let Some(only) = &options.only {
                if name != only {
                    continue;
                }
            }

            info!("{} -> {}", name, link);
            if let Err(e) = self.walk(doc, name, link, &PathScope::root()) {
                error!("Failed to walk collection {} ({}): {}", name, link, e);
                self.record_failure(name, &e);
            }
        }

        std::mem::take(&mut self.summary)
    }

    /// Walks the collection `name` at `location` and everything nested below it.
    ///
    /// Failures inside nested collections are logged and skipped; the returned error
    /// only concerns this collection itself.
    pub fn walk(&mut self, doc: &mut OpenApiDocument, name: &str, location: &str, scope: &PathScope) -> Result<()> {
        if self.options.is_skipped(name) {
            debug!("Skipped: {}", name);
            self.record_skip(name);
            return Ok(());
        }
        if scope.ancestry.iter().any(|ancestor| ancestor == name) {
            debug!("Skipped {} nested in itself under {}", name, scope.prefix);
            self.record_skip(name);
            return Ok(());
        }
        if scope.depth() > self.options.max_depth {
            debug!("Skipped {} below maximum depth at {}", name, scope.prefix);
            self.record_skip(name);
            return Ok(());
        }

        let collection = self.source.fetch_collection(location)?;
        if !collection.is_collection() {
            debug!("{} at {} is a {}, not a collection", name, location, collection.kind);
            return Ok(());
        }

        let (resource_type, create_location) = resource_type_of(name, &collection)?;
        debug!("resourceType for collection {}: {}", name, resource_type);

        let schema_location = schema_location_for(
            &self.options.api_root,
            create_location,
            resource_type,
            &self.options.schema_namespaces,
        );
        let schema = self
            .source
            .fetch_schema(&schema_location)
            .map_err(|e| Error::resolution(resource_type, e))?;

        self.translator
            .translate(&mut doc.components.schemas, &schema, &schema_location);
        self.register_collection_schema(doc, name, &schema.id);

        let entry = CollectionEntry::new(
            name,
            &schema.id,
            &scope.prefix,
            scope.parameters.clone(),
            scope.tag_for(name),
            schema.collection_methods(),
            schema.resource_methods(),
        );
        doc.ensure_tag(&entry.tag, self.descriptions.get(&entry.tag).cloned());
        add_collection_paths(doc, &entry);
        self.summary.collections.push(entry.collection_path.clone());

        if let Some(sample) = collection.sample() {
            debug!(
                "Following links of {} {} in {}",
                sample.kind.as_deref().unwrap_or(&schema.id),
                sample.id.as_deref().unwrap_or("<no id>"),
                name
            );
            let nested = scope.nested(&entry);
            for (link_name, link) in &sample.links {
                if link_name == "self" {
                    continue;
                }
                if let Err(e) = self.walk(doc, link_name, link, &nested) {
                    error!(
                        "Failed to walk nested collection {} ({}) under {}: {}",
                        link_name, link, nested.prefix, e
                    );
                    self.record_failure(link_name, &e);
                }
            }
        }

        Ok(())
    }

    /// Registers `name` as the generic envelope with `data` items of `resource_type`
    fn register_collection_schema(&self, doc: &mut OpenApiDocument, name: &str, resource_type: &str) {
        let mut properties = BTreeMap::new();
        properties.insert("data".to_string(), Schema::array_of(Schema::reference(resource_type)));

        let schema = Schema {
            schema_type: Some("object".to_string()),
            description: self.descriptions.get(name).cloned(),
            all_of: Some(vec![Schema::reference(COLLECTION_ENVELOPE)]),
            properties: Some(properties),
            ..Default::default()
        };

        if !doc.components.schemas.insert(name, schema) {
            debug!("Collection schema {} already registered", name);
        }
    }

    fn record_skip(&mut self, name: &str) {
        self.summary.skipped.push(name.to_string());
    }

    fn record_failure(&mut self, name: &str, error: &Error) {
        self.summary.failed.push((name.to_string(), error.to_string()));
    }
}

/// Resource type of a collection and the location its items are created at.
///
/// Taken from `createTypes`: the entry named after `resourceType`, or the only entry.
fn resource_type_of<'c>(name: &str, collection: &'c CollectionDocument) -> Result<(&'c str, &'c str)> {
    let create_types = collection
        .create_types
        .as_ref()
        .filter(|types| !types.is_empty())
        .ok_or_else(|| Error::convention(name, "no createTypes advertised"))?;

    if let Some(declared) = collection.resource_type.as_deref() {
        if let Some((resource_type, location)) = create_types.get_key_value(declared) {
            return Ok((resource_type.as_str(), location.as_str()));
        }
    }

    match create_types.iter().next() {
        Some((resource_type, location)) if create_types.len() == 1 => {
            Ok((resource_type.as_str(), location.as_str()))
        }
        _ => Err(Error::convention(
            name,
            format!(
                "cannot choose a resource type among {}",
                create_types.keys().cloned().collect::<Vec<_>>().join(", ")
            ),
        )),
    }
}

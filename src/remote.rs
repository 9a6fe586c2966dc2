//! Typed views of the documents served by the hypermedia API.
//!
//! The API describes itself with three kinds of documents: a root document listing
//! top-level collection links, collection documents, and schema documents describing
//! the fields of one resource type. Optional members are modelled as `Option` so that
//! a shape mismatch surfaces as a decode error instead of a silently defaulted value.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// The API root: a mapping from collection name to its location.
#[derive(Debug, Clone, Deserialize)]
pub struct RootDocument {
    pub links: BTreeMap<String, String>,
}

/// A collection listing as returned by `GET <collection>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDocument {
    /// Document kind, `"collection"` for real collections
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub resource_type: Option<String>,
    /// Types that may be created in this collection, mapped to their create location
    #[serde(default)]
    pub create_types: Option<BTreeMap<String, String>>,
    /// Items of the collection; the first one is used to discover nested collections
    #[serde(default)]
    pub data: Option<Vec<ResourceDocument>>,
}

impl CollectionDocument {
    /// Whether the document really describes a collection
    pub fn is_collection(&self) -> bool {
        self.kind == "collection"
    }

    /// First item of the collection, if any was returned
    pub fn sample(&self) -> Option<&ResourceDocument> {
        self.data.as_ref().and_then(|items| items.first())
    }
}

/// One item of a collection. Only its identity and links matter here.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub links: BTreeMap<String, String>,
}

/// A schema document as returned by `GET .../schemas/<type>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    /// Type name, also the registry key of the translated schema
    pub id: String,
    #[serde(default)]
    pub resource_fields: Option<BTreeMap<String, Field>>,
    #[serde(default)]
    pub collection_methods: Option<Vec<String>>,
    #[serde(default)]
    pub resource_methods: Option<Vec<String>>,
}

impl SchemaDocument {
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.resource_fields.iter().flat_map(|fields| fields.iter())
    }

    pub fn collection_methods(&self) -> &[String] {
        self.collection_methods.as_deref().unwrap_or(&[])
    }

    pub fn resource_methods(&self) -> &[String] {
        self.resource_methods.as_deref().unwrap_or(&[])
    }
}

/// Dynamic description of one field of a resource type.
///
/// Boolean flags are omitted by the server when false.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Raw type descriptor, e.g. `string`, `array[reference[node]]`, `map[label]`
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub update: bool,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
    #[serde(default)]
    pub min_length: Option<i64>,
    #[serde(default)]
    pub max_length: Option<i64>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub valid_chars: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

//! Schema registry - the flat, name-keyed store of every translated schema.
//!
//! A name is written at most once. Translation first *reserves* a name and only then
//! maps the type's fields; a reference that loops back to a reserved name sees it as
//! present and stops there. Entries are looked up by name when the document is
//! serialized, so a reference to a reserved-but-unfinished entry is still valid.

use crate::document::Schema;
use log::{debug, warn};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// State of one registry entry
#[derive(Debug, Clone, PartialEq)]
enum Entry {
    /// Name reserved, schema still being built
    Pending,
    Ready(Schema),
}

/// Mapping from type name to its finished schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRegistry {
    entries: BTreeMap<String, Entry>,
    /// Descriptor names that resolved to an entry registered under another name
    aliases: BTreeMap<String, String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` is registered or being translated
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Name `name` is registered under, following aliases
    pub fn canonical<'r>(&'r self, name: &'r str) -> Option<&'r str> {
        if self.entries.contains_key(name) {
            return Some(name);
        }
        self.aliases
            .get(name)
            .map(String::as_str)
            .filter(|target| self.entries.contains_key(*target))
    }

    /// Records that the descriptor `alias` names the entry `name`
    pub fn alias(&mut self, alias: &str, name: &str) {
        if alias != name {
            debug!("Schema {} is known as {}", name, alias);
            self.aliases.insert(alias.to_string(), name.to_string());
        }
    }

    /// Finished schema registered under `name`
    pub fn get(&self, name: &str) -> Option<&Schema> {
        match self.entries.get(name) {
            Some(Entry::Ready(schema)) => Some(schema),
            _ => None,
        }
    }

    /// Reserves `name`. Returns `false` if the name is already present in any state.
    pub fn reserve(&mut self, name: &str) -> bool {
        if self.entries.contains_key(name) {
            debug!("Schema {} already exists", name);
            return false;
        }
        self.entries.insert(name.to_string(), Entry::Pending);
        true
    }

    /// Completes a reservation made with [`reserve`](Self::reserve).
    ///
    /// A finished entry is never replaced; completing it again is ignored.
    pub fn finish(&mut self, name: &str, schema: Schema) {
        match self.entries.get(name) {
            Some(Entry::Ready(_)) => {
                warn!("Schema {} was already finished, keeping the first", name);
            }
            Some(Entry::Pending) => {
                self.entries.insert(name.to_string(), Entry::Ready(schema));
            }
            None => {
                warn!("Schema {} finished without reservation", name);
                self.entries.insert(name.to_string(), Entry::Ready(schema));
            }
        }
    }

    /// Registers a complete schema in one step. Returns `false` if `name` was taken.
    pub fn insert(&mut self, name: &str, schema: Schema) -> bool {
        if !self.reserve(name) {
            return false;
        }
        self.finish(name, schema);
        true
    }

    /// Names whose translation never finished
    pub fn pending(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, entry)| matches!(entry, Entry::Pending))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Finished schemas in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Schema)> {
        self.entries.iter().filter_map(|(name, entry)| match entry {
            Entry::Ready(schema) => Some((name, schema)),
            Entry::Pending => None,
        })
    }

    /// Number of finished schemas
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for SchemaRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, schema) in self.iter() {
            map.serialize_entry(name, schema)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SchemaRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let schemas = BTreeMap::<String, Schema>::deserialize(deserializer)?;
        Ok(Self {
            entries: schemas
                .into_iter()
                .map(|(name, schema)| (name, Entry::Ready(schema)))
                .collect(),
            aliases: BTreeMap::new(),
        })
    }
}

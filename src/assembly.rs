//! Document assembly - loads the static overlays and runs the crawl.

use crate::client::{Credentials, HttpSchemaClient, SchemaSource};
use crate::document::{OpenApiDocument, Schema};
use crate::walker::{CollectionWalker, WalkOptions, WalkSummary, COLLECTION_ENVELOPE};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Description overlay: schema, collection or tag name to description
pub type Descriptions = BTreeMap<String, String>;

/// Everything a generation run needs, independent of how it was configured
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub credentials: Credentials,
    pub timeout: Duration,
    pub descriptions_path: PathBuf,
    pub base_path: PathBuf,
    pub walk: WalkOptions,
}

/// Loads the description overlay. An empty file yields an empty overlay.
pub fn load_descriptions(path: &Path) -> Result<Descriptions> {
    debug!("Loading descriptions from {}", path.display());
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read descriptions file: {}", path.display()))?;

    if content.trim().is_empty() {
        return Ok(Descriptions::new());
    }

    let descriptions: Option<Descriptions> = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse descriptions file: {}", path.display()))?;
    Ok(descriptions.unwrap_or_default())
}

/// Loads the document skeleton every run starts from
pub fn load_base(path: &Path) -> Result<OpenApiDocument> {
    debug!("Loading base document from {}", path.display());
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read base document: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse base document: {}", path.display()))
}

/// Resets the generated parts of `doc` and makes sure the collection envelope exists
pub fn initialize(doc: &mut OpenApiDocument) {
    doc.paths.clear();
    doc.components.parameters.clear();

    if !doc.components.schemas.contains(COLLECTION_ENVELOPE) {
        debug!("Base document has no {} schema, adding default", COLLECTION_ENVELOPE);
        doc.components
            .schemas
            .insert(COLLECTION_ENVELOPE, collection_envelope());
    }
}

/// Generic list envelope shared by every collection schema
fn collection_envelope() -> Schema {
    let links = Schema {
        schema_type: Some("object".to_string()),
        additional_properties: Some(Box::new(Schema::of_type("string"))),
        ..Default::default()
    };

    let mut properties = BTreeMap::new();
    properties.insert("type".to_string(), Schema::of_type("string"));
    properties.insert("resourceType".to_string(), Schema::of_type("string"));
    properties.insert("links".to_string(), links.clone());
    properties.insert("actions".to_string(), links);
    properties.insert("pagination".to_string(), Schema::of_type("object"));
    properties.insert("sort".to_string(), Schema::of_type("object"));
    properties.insert("filters".to_string(), Schema::of_type("object"));

    Schema {
        schema_type: Some("object".to_string()),
        description: Some("Collection envelope".to_string()),
        properties: Some(properties),
        ..Default::default()
    }
}

/// Crawls the API behind `source` into a copy of `base`.
///
/// Failing to fetch the root document aborts the run; failures of individual
/// collections are recorded in the returned summary.
pub fn assemble(
    source: &dyn SchemaSource,
    base: OpenApiDocument,
    descriptions: &Descriptions,
    options: &WalkOptions,
) -> Result<(OpenApiDocument, WalkSummary)> {
    let mut doc = base;
    initialize(&mut doc);

    let root_links = source
        .fetch_root_links(&options.api_root)
        .with_context(|| format!("Failed to discover collections at {}", options.api_root))?;
    info!("Discovered {} root links", root_links.len());

    if let Some(only) = &options.only {
        if !root_links.contains_key(only) {
            warn!("Collection {} is not linked from the API root", only);
        }
    }

    let mut walker = CollectionWalker::new(source, descriptions, options);
    let summary = walker.walk_root(&mut doc, &root_links);

    let pending = doc.components.schemas.pending();
    if !pending.is_empty() {
        warn!("Schemas left unfinished and dropped: {}", pending.join(", "));
    }

    info!(
        "Walked {} collections ({} skipped, {} failed), {} schemas",
        summary.collections.len(),
        summary.skipped.len(),
        summary.failed.len(),
        doc.components.schemas.len()
    );

    Ok((doc, summary))
}

/// Loads the overlays named in `config` and crawls the API over HTTP
pub fn generate(config: &GeneratorConfig) -> Result<(OpenApiDocument, WalkSummary)> {
    let descriptions = load_descriptions(&config.descriptions_path)?;
    let base = load_base(&config.base_path)?;
    let client = HttpSchemaClient::new(config.credentials.clone(), config.timeout)
        .context("Failed to initialize HTTP client")?;

    assemble(&client, base, &descriptions, &config.walk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory::MemorySource;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_descriptions() {
        let file = temp_file("widget: A thing\nwidgets: All the things\n");
        let descriptions = load_descriptions(file.path()).unwrap();

        assert_eq!(descriptions.len(), 2);
        assert_eq!(descriptions["widget"], "A thing");
    }

    #[test]
    fn test_load_empty_descriptions() {
        let file = temp_file("");
        assert!(load_descriptions(file.path()).unwrap().is_empty());

        let file = temp_file("# nothing yet\n");
        assert!(load_descriptions(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_load_descriptions_missing_file() {
        let err = load_descriptions(Path::new("/nonexistent/descriptions.yml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read descriptions file"));
    }

    #[test]
    fn test_load_base_rejects_malformed() {
        let file = temp_file("openapi: [not, a, string\n");
        let err = load_base(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse base document"));
    }

    #[test]
    fn test_initialize_keeps_base_envelope() {
        let mut doc = OpenApiDocument::new();
        doc.components
            .schemas
            .insert(COLLECTION_ENVELOPE, Schema::of_type("object"));
        doc.paths.insert("/stale".to_string(), Default::default());
        doc.ensure_path_parameter("staleId");

        initialize(&mut doc);

        assert!(doc.paths.is_empty());
        assert!(doc.components.parameters.is_empty());
        assert_eq!(
            doc.components.schemas.get(COLLECTION_ENVELOPE),
            Some(&Schema::of_type("object"))
        );
    }

    #[test]
    fn test_initialize_adds_default_envelope() {
        let mut doc = OpenApiDocument::new();
        initialize(&mut doc);

        let envelope = doc.components.schemas.get(COLLECTION_ENVELOPE).unwrap();
        assert!(envelope.properties.as_ref().unwrap().contains_key("links"));
    }

    #[test]
    fn test_assemble_fails_without_root() {
        let source = MemorySource::new();
        let options = WalkOptions::new("https://api.local/v3");

        let err = assemble(&source, OpenApiDocument::new(), &Descriptions::new(), &options).unwrap_err();
        assert!(err.to_string().contains("Failed to discover collections"));
    }

    #[test]
    fn test_assemble_widgets() {
        let source = MemorySource::new()
            .with(
                "https://api.local/v3",
                json!({"links": {"self": "https://api.local/v3", "widgets": "https://api.local/v3/widgets"}}),
            )
            .with(
                "https://api.local/v3/widgets",
                json!({
                    "type": "collection",
                    "resourceType": "widget",
                    "createTypes": {"widget": "https://api.local/v3/widgets"},
                    "data": []
                }),
            )
            .with(
                "https://api.local/v3/schemas/widget",
                json!({
                    "id": "widget",
                    "resourceFields": {"name": {"type": "string", "required": true}},
                    "collectionMethods": ["GET"],
                    "resourceMethods": ["GET"]
                }),
            );
        let mut descriptions = Descriptions::new();
        descriptions.insert("widgets".to_string(), "Widget operations".to_string());
        let options = WalkOptions::new("https://api.local/v3");

        let (doc, summary) = assemble(&source, OpenApiDocument::new(), &descriptions, &options).unwrap();

        assert_eq!(summary.collections, vec!["/widgets"]);
        assert!(summary.skipped.contains(&"self".to_string()));
        assert!(doc.components.schemas.get("widget").is_some());
        assert_eq!(doc.tags[0].name, "widgets");
        assert_eq!(doc.tags[0].description.as_deref(), Some("Widget operations"));
    }
}

//! OpenAPI from Hypermedia - OpenAPI documentation for self-describing APIs.
//!
//! Some REST APIs publish no static API description but describe themselves at runtime:
//! the root document links to every collection, each collection names the type it
//! holds, and each type has a schema document listing its fields and allowed methods.
//! This library crawls such an API and writes the equivalent OpenAPI 3.0 document.
//!
//! # Architecture
//!
//! 1. [`client`] - Fetches root, collection and schema documents ([`remote`])
//! 2. [`field_type`] - Classifies the field type descriptors of schema documents
//! 3. [`translator`] - Converts schema documents into OpenAPI schemas kept in a [`registry`]
//! 4. [`walker`] - Follows collection links and emits paths via [`openapi_builder`]
//! 5. [`assembly`] - Loads the base skeleton and description overlay, runs the crawl
//! 6. [`serializer`] - Serializes the [`document`] to YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_from_hypermedia::{
//!     assembly::{assemble, load_base, load_descriptions},
//!     client::{Credentials, HttpSchemaClient, DEFAULT_TIMEOUT},
//!     serializer::serialize_yaml,
//!     walker::WalkOptions,
//! };
//! use std::path::Path;
//!
//! let client = HttpSchemaClient::new(Credentials::Bearer("token".into()), DEFAULT_TIMEOUT).unwrap();
//! let base = load_base(Path::new("data/base.yml")).unwrap();
//! let descriptions = load_descriptions(Path::new("data/descriptions.yml")).unwrap();
//! let options = WalkOptions::new("https://rancher.local/v3");
//!
//! let (document, summary) = assemble(&client, base, &descriptions, &options).unwrap();
//! println!("{} collections", summary.collections.len());
//! println!("{}", serialize_yaml(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete CLI application.

pub mod cli;
pub mod client;
pub mod remote;
pub mod field_type;
pub mod registry;
pub mod document;
pub mod translator;
pub mod walker;
pub mod openapi_builder;
pub mod assembly;
pub mod serializer;
pub mod error;

//! Remote schema client - authenticated retrieval of hypermedia API documents.
//!
//! All documents are fetched with a single GET and decoded into the typed views of the
//! [`remote`](crate::remote) module. Status codes are inspected explicitly; a response
//! that arrived but is not 2xx is reported as [`Error::Status`], never decoded.

use crate::error::{Error, Result};
use crate::remote::{CollectionDocument, RootDocument, SchemaDocument};
use log::{debug, trace};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Default timeout for HTTP requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of remote API documents.
///
/// The walker and translator only talk to the API through this trait, which keeps
/// them independent of the transport.
pub trait SchemaSource {
    /// Fetches the schema document at `location`.
    fn fetch_schema(&self, location: &str) -> Result<SchemaDocument>;

    /// Fetches the collection document at `location`.
    fn fetch_collection(&self, location: &str) -> Result<CollectionDocument>;

    /// Fetches the API root and returns its collection links by name.
    fn fetch_root_links(&self, base_url: &str) -> Result<BTreeMap<String, String>>;
}

/// Credentials sent with every request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// HTTP basic auth with an API key pair
    Basic {
        access_key: String,
        secret_key: String,
    },
    Anonymous,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Bearer(_) => write!(f, "Bearer(***)"),
            Credentials::Basic { access_key, .. } => {
                write!(f, "Basic {{ access_key: {:?}, secret_key: *** }}", access_key)
            }
            Credentials::Anonymous => write!(f, "Anonymous"),
        }
    }
}

/// [`SchemaSource`] backed by a blocking HTTP client.
///
/// Certificate verification is disabled: deployments commonly run behind
/// self-signed certificates.
pub struct HttpSchemaClient {
    client: reqwest::blocking::Client,
    credentials: Credentials,
}

impl HttpSchemaClient {
    /// Builds a client using the given credentials and request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the underlying TLS backend cannot be initialized.
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self> {
        debug!("Initializing HTTP schema client ({:?})", credentials);
        let client = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport {
                url: "<client>".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            credentials,
        })
    }

    /// Issues one authenticated GET and returns the raw body of a 2xx response.
    pub fn get(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {}", url);
        let request = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");

        let request = match &self.credentials {
            Credentials::Bearer(token) => request.bearer_auth(token),
            Credentials::Basic {
                access_key,
                secret_key,
            } => request.basic_auth(access_key, Some(secret_key)),
            Credentials::Anonymous => request,
        };

        let response = request.send().map_err(|e| Error::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(|e| Error::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        trace!("{} returned {} bytes", url, body.len());
        Ok(body.to_vec())
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.get(url)?;
        decode(url, &body)
    }
}

impl SchemaSource for HttpSchemaClient {
    fn fetch_schema(&self, location: &str) -> Result<SchemaDocument> {
        self.get_json(location)
    }

    fn fetch_collection(&self, location: &str) -> Result<CollectionDocument> {
        self.get_json(location)
    }

    fn fetch_root_links(&self, base_url: &str) -> Result<BTreeMap<String, String>> {
        let root: RootDocument = self.get_json(base_url)?;
        Ok(root.links)
    }
}

/// Decodes a JSON body into `T`, reporting shape mismatches as [`Error::Decode`].
pub fn decode<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| {
        debug!(
            "Undecodable body from {}: {}",
            url,
            String::from_utf8_lossy(&body[..body.len().min(512)])
        );
        Error::Decode {
            url: url.to_string(),
            message: e.to_string(),
        }
    })
}

/// Location of the schema for `type_name` living next to the schema at `enclosing`.
///
/// `https://host/v3/schemas/cluster` + `node` gives `https://host/v3/schemas/node`.
pub fn sibling_schema_location(enclosing: &str, type_name: &str) -> String {
    match enclosing.rsplit_once('/') {
        Some((base, _)) => format!("{}/{}", base, type_name),
        None => type_name.to_string(),
    }
}

/// Location of the schema for `type_name` given the location of a collection.
///
/// Schemas normally live at `<api_root>/schemas/<type>`. When the collection sits
/// under a scoped namespace (`<api_root>/<scope>/<id>/...` with `<scope>` one of
/// `namespaces`), the backing system publishes that scope's schemas at
/// `<api_root>/<scope>/<id>/schemas/<type>` instead.
pub fn schema_location_for(
    api_root: &str,
    collection_location: &str,
    type_name: &str,
    namespaces: &[String],
) -> String {
    let root = api_root.trim_end_matches('/');

    let scope = collection_location
        .strip_prefix(root)
        .and_then(|rest| {
            let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
            match segments.as_slice() {
                [scope, id, _, ..] if namespaces.iter().any(|n| n == scope) => {
                    Some(format!("/{}/{}", scope, id))
                }
                _ => None,
            }
        })
        .unwrap_or_default();

    format!("{}{}/schemas/{}", root, scope, type_name)
}


#[cfg(test)]
mod tests {
    use super::*;

    fn namespaces() -> Vec<String> {
        vec!["project".to_string(), "cluster".to_string()]
    }

    #[test]
    fn test_sibling_schema_location() {
        assert_eq!(
            sibling_schema_location("https://api.local/v3/schemas/cluster", "node"),
            "https://api.local/v3/schemas/node"
        );
        assert_eq!(
            sibling_schema_location("https://api.local/v3/project/c-1:p-2/schemas/workload", "container"),
            "https://api.local/v3/project/c-1:p-2/schemas/container"
        );
    }

    #[test]
    fn test_schema_location_for_root_collection() {
        let location = schema_location_for(
            "https://api.local/v3",
            "https://api.local/v3/widgets",
            "widget",
            &namespaces(),
        );
        assert_eq!(location, "https://api.local/v3/schemas/widget");
    }

    #[test]
    fn test_schema_location_for_nested_collection_outside_namespace() {
        let location = schema_location_for(
            "https://api.local/v3/",
            "https://api.local/v3/clusters/c-1/nodes",
            "node",
            &namespaces(),
        );
        assert_eq!(location, "https://api.local/v3/schemas/node");
    }

    #[test]
    fn test_schema_location_for_scoped_namespace() {
        let location = schema_location_for(
            "https://api.local/v3",
            "https://api.local/v3/project/c-1:p-2/workloads",
            "workload",
            &namespaces(),
        );
        assert_eq!(location, "https://api.local/v3/project/c-1:p-2/schemas/workload");
    }

    #[test]
    fn test_schema_location_for_scope_root_itself() {
        // `/v3/project/p-1` is the project resource, not something inside its namespace
        let location = schema_location_for(
            "https://api.local/v3",
            "https://api.local/v3/project/p-1",
            "project",
            &namespaces(),
        );
        assert_eq!(location, "https://api.local/v3/schemas/project");
    }

    #[test]
    fn test_schema_location_for_foreign_host() {
        let location = schema_location_for(
            "https://api.local/v3",
            "https://elsewhere/v1/project/p-1/things",
            "thing",
            &namespaces(),
        );
        assert_eq!(location, "https://api.local/v3/schemas/thing");
    }

    #[test]
    fn test_decode_reports_shape_errors() {
        let result: Result<SchemaDocument> = decode("https://api.local/x", br#"{"links": {}}"#);
        match result {
            Err(Error::Decode { url, .. }) => assert_eq!(url, "https://api.local/x"),
            other => panic!("expected decode error, got {:?}", other.map(|s| s.id)),
        }
    }

    #[test]
    fn test_decode_reports_invalid_json() {
        let result: Result<RootDocument> = decode("https://api.local/v3", b"<html>login</html>");
        assert!(matches!(result, Err(Error::Decode { .. })));
    }

    #[test]
    fn test_credentials_debug_hides_secrets() {
        let bearer = format!("{:?}", Credentials::Bearer("token-abc".to_string()));
        assert!(!bearer.contains("token-abc"));

        let basic = format!(
            "{:?}",
            Credentials::Basic {
                access_key: "key".to_string(),
                secret_key: "hunter2".to_string(),
            }
        );
        assert!(basic.contains("key"));
        assert!(!basic.contains("hunter2"));
    }
}

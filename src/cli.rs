use crate::assembly::{generate, GeneratorConfig};
use crate::client::Credentials;
use crate::error::Error;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use crate::walker::{WalkOptions, DEFAULT_MAX_DEPTH};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Duration;

/// OpenAPI from Hypermedia - Generate OpenAPI documentation by crawling a self-describing API
#[derive(Parser, Debug)]
#[command(name = "openapi-from-hypermedia")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// API root, e.g. https://rancher.local/v3
    #[arg(long = "api-url", env = "API_URL", value_name = "URL")]
    pub api_url: String,

    /// Bearer token (takes precedence over the key pair)
    #[arg(long = "token", env = "API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Access key for basic auth
    #[arg(long = "access-key", env = "API_ACCESS_KEY", hide_env_values = true)]
    pub access_key: Option<String>,

    /// Secret key for basic auth
    #[arg(long = "secret-key", env = "API_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Only walk this root collection
    #[arg(short = 'c', long = "collection", env = "COLLECTION")]
    pub collection: Option<String>,

    /// Additional collection names to skip (comma separated or repeated)
    #[arg(long = "skip", value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Maximum nesting depth of collections below a root collection
    #[arg(long = "max-depth", default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Description overlay
    #[arg(long = "descriptions", default_value = "data/descriptions.yml", value_name = "FILE")]
    pub descriptions: PathBuf,

    /// Document skeleton the output starts from
    #[arg(long = "base", default_value = "data/base.yml", value_name = "FILE")]
    pub base: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path, `-` for stdout (default: swagger/openapi.<format>)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long = "timeout", default_value_t = 30)]
    pub timeout: u64,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
        }
    }
}

impl CliArgs {
    /// Credentials to authenticate with; a token wins over a key pair
    pub fn credentials(&self) -> Credentials {
        match (&self.token, &self.access_key, &self.secret_key) {
            (Some(token), _, _) => Credentials::Bearer(token.clone()),
            (None, Some(access_key), Some(secret_key)) => Credentials::Basic {
                access_key: access_key.clone(),
                secret_key: secret_key.clone(),
            },
            _ => Credentials::Anonymous,
        }
    }

    /// Where the document is written, `None` for stdout
    pub fn output_destination(&self) -> Option<PathBuf> {
        match &self.output_path {
            Some(path) if path.as_os_str() == "-" => None,
            Some(path) => Some(path.clone()),
            None => Some(PathBuf::from(format!(
                "swagger/openapi.{}",
                self.output_format.extension()
            ))),
        }
    }

    pub fn to_config(&self) -> GeneratorConfig {
        let mut walk = WalkOptions::new(&self.api_url);
        walk.skips.extend(self.skip.iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()));
        walk.only = self.collection.clone();
        walk.max_depth = self.max_depth;

        GeneratorConfig {
            credentials: self.credentials(),
            timeout: Duration::from_secs(self.timeout),
            descriptions_path: self.descriptions.clone(),
            base_path: self.base.clone(),
            walk,
        }
    }
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!(
        "Parsed arguments: api_url={}, collection={:?}, skip={:?}, max_depth={}",
        args.api_url, args.collection, args.skip, args.max_depth
    );

    if !(args.api_url.starts_with("http://") || args.api_url.starts_with("https://")) {
        return Err(Error::InvalidArgument(format!(
            "API URL must start with http:// or https://: {}",
            args.api_url
        ))
        .into());
    }

    if args.token.is_none() && args.access_key.is_some() != args.secret_key.is_some() {
        return Err(Error::InvalidArgument(
            "access key and secret key must be given together".to_string(),
        )
        .into());
    }

    for path in [&args.descriptions, &args.base] {
        if !path.is_file() {
            anyhow::bail!("Data file does not exist: {}", path.display());
        }
    }

    if args.timeout == 0 {
        return Err(Error::InvalidArgument("timeout must be at least one second".to_string()).into());
    }

    match args.credentials() {
        Credentials::Bearer(_) => info!("Authentication: bearer token"),
        Credentials::Basic { ref access_key, .. } => info!("Authentication: key pair ({})", access_key),
        Credentials::Anonymous => warn!("No credentials given, requests are sent anonymously"),
    }
    if args.token.is_some() && args.access_key.is_some() {
        warn!("Both a token and a key pair were given, using the token");
    }

    info!("API URL: {}", args.api_url);
    info!("Output format: {:?}", args.output_format);
    match args.output_destination() {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }
    if let Some(ref collection) = args.collection {
        info!("Collection: {}", collection);
    }

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting OpenAPI document generation...");

    let config = args.to_config();
    let (document, summary) = generate(&config)?;

    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    match args.output_destination() {
        Some(output_path) => {
            info!("Writing output to: {}", output_path.display());
            write_to_file(&content, &output_path)?;
            info!("Successfully wrote OpenAPI document to {}", output_path.display());
        }
        None => println!("{}", content),
    }

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Collections: {}", summary.collections.len());
    info!("  - Schemas: {}", document.components.schemas.len());
    info!("  - Skipped: {}", summary.skipped.len());
    info!("  - Failed: {}", summary.failed.len());
    for (name, error) in &summary.failed {
        warn!("    {}: {}", name, error);
    }

    Ok(())
}

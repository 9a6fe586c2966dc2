//! OpenAPI from Hypermedia - Command-line tool for generating OpenAPI documentation.
//!
//! Crawls a self-describing hypermedia API starting at its root document, translates
//! every schema it can reach and writes a complete OpenAPI 3.0 document.
//!
//! # Usage
//!
//! ```bash
//! openapi-from-hypermedia --api-url <URL> [OPTIONS]
//! ```
//!
//! # Examples
//!
//! Generate YAML documentation into `swagger/openapi.yaml`:
//! ```bash
//! API_TOKEN=token-xxxxx openapi-from-hypermedia --api-url https://rancher.local/v3
//! ```
//!
//! Generate JSON documentation for a single collection:
//! ```bash
//! openapi-from-hypermedia --api-url https://rancher.local/v3 -c clusters -f json -o clusters.json
//! ```
//!
//! Enable verbose logging (otherwise `LOG_LEVEL` applies):
//! ```bash
//! openapi-from-hypermedia --api-url https://rancher.local/v3 -v
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use openapi_from_hypermedia::cli;

fn main() -> Result<()> {
    // Parse first so that --verbose can decide the log level
    let args = cli::CliArgs::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().filter_or("LOG_LEVEL", "info"));
    if args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    info!("OpenAPI from Hypermedia starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}

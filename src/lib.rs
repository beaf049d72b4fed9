//! OrcheSight MCP server
//!
//! Exposes OrcheSight investigation operations as Model Context Protocol
//! tools. Each tool call is relayed through the authenticated API gateway to
//! a backend service, and the JSON that comes back is rendered into short,
//! bounded text an agent can read.
//!
//! - [`client`]: authenticated gateway client and service routing
//! - [`normalize`]: response normalizers (search hits, aggregations, ML output)
//! - [`tools`]: tool catalog, argument validation and orchestration
//! - [`server`]: MCP streamable HTTP endpoint and health check

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod normalize;
pub mod protocol;
pub mod server;
pub mod tools;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// `RUST_LOG` wins over `level` when set. Logs go to stderr so the `call`
/// and `tools` subcommands keep stdout clean.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        _ => subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    }
    .map_err(|e| Error::Internal(format!("Failed to install tracing subscriber: {e}")))
}

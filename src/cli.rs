//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// OrcheSight MCP server - agent tools over the OrcheSight API gateway
#[derive(Parser, Debug)]
#[command(name = "orchesight-mcp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "ORCHESIGHT_MCP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "ORCHESIGHT_MCP_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, env = "ORCHESIGHT_MCP_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    /// Name understood by [`crate::setup_tracing`]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the MCP server (default)
    Serve,

    /// List the tool catalog
    Tools,

    /// Validate and invoke one tool against the configured gateway
    Call {
        /// Tool name
        #[arg(required = true)]
        tool: String,

        /// JSON arguments to pass to the tool
        #[arg(short, long, default_value = "{}")]
        args: String,
    },

    /// Probe the gateway and print the health document
    Health,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["orchesight-mcp", "--port", "4000"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.port, Some(4000));
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn call_takes_tool_and_args() {
        let cli = Cli::try_parse_from([
            "orchesight-mcp",
            "call",
            "get_pipeline_status",
            "--args",
            r#"{"pipelineId":"p-1"}"#,
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        match cli.command {
            Some(Command::Call { tool, args }) => {
                assert_eq!(tool, "get_pipeline_status");
                assert_eq!(args, r#"{"pipelineId":"p-1"}"#);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

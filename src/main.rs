//! OrcheSight MCP server binary

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use orchesight_mcp::{
    cli::{Cli, Command},
    client::{GatewayApi, GatewayClient},
    config::Config,
    server::{HealthReport, Server},
    setup_tracing,
    tools::{ToolCatalog, ToolContext},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, Some(cli.log_format.as_str())) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    match cli.command {
        Some(Command::Tools) => run_tools(),
        Some(Command::Call { ref tool, ref args }) => run_call(&cli, tool, args).await,
        Some(Command::Health) => run_health(&cli).await,
        Some(Command::Serve) | None => run_server(&cli).await,
    }
}

/// Load configuration and apply CLI overrides
fn load_config(cli: &Cli) -> Option<Config> {
    match Config::load(cli.config.as_deref()) {
        Ok(mut config) => {
            if let Some(port) = cli.port {
                config.server.port = port;
            }
            if let Some(ref host) = cli.host {
                config.server.host.clone_from(host);
            }
            Some(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {e}");
            None
        }
    }
}

fn gateway_client(config: &Config) -> Option<GatewayClient> {
    GatewayClient::new(&config.gateway)
        .inspect_err(|e| error!("Failed to create gateway client: {e}"))
        .ok()
}

/// Print the catalog
fn run_tools() -> ExitCode {
    let catalog = ToolCatalog::standard();
    println!("{} tools:\n", catalog.len());
    for tool in catalog.definitions() {
        let read_only = tool
            .annotations
            .as_ref()
            .is_some_and(|a| a.is_read_only());
        let marker = if read_only { " [read-only]" } else { "" };
        println!(
            "  {}{} - {}",
            tool.name,
            marker,
            tool.description.as_deref().unwrap_or_default()
        );
    }
    ExitCode::SUCCESS
}

/// Invoke one tool and print its text
async fn run_call(cli: &Cli, tool: &str, args: &str) -> ExitCode {
    let arguments: serde_json::Value = match serde_json::from_str(args) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Invalid JSON arguments: {e}");
            return ExitCode::FAILURE;
        }
    };

    let Some(config) = load_config(cli) else {
        return ExitCode::FAILURE;
    };
    let Some(client) = gateway_client(&config) else {
        return ExitCode::FAILURE;
    };

    let catalog = ToolCatalog::standard();
    let ctx = ToolContext {
        invocation_id: Some("cli".to_string()),
        session_id: None,
    };
    match catalog.invoke(&client, tool, arguments, &ctx).await {
        Ok(output) if output.is_error => {
            eprintln!("{}", output.text);
            ExitCode::FAILURE
        }
        Ok(output) => {
            println!("{}", output.text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Probe the gateway; exit code 1 when unreachable
async fn run_health(cli: &Cli) -> ExitCode {
    let Some(config) = load_config(cli) else {
        return ExitCode::FAILURE;
    };
    let Some(client) = gateway_client(&config) else {
        return ExitCode::FAILURE;
    };

    let report = HealthReport::probe(&client as &dyn GatewayApi).await;
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to serialize health report: {e}");
            return ExitCode::FAILURE;
        }
    }

    if report.is_reachable() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Run the MCP server
async fn run_server(cli: &Cli) -> ExitCode {
    let Some(config) = load_config(cli) else {
        return ExitCode::FAILURE;
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        gateway = %config.gateway.base_url,
        auth = ?config.gateway.auth.mode,
        "Starting OrcheSight MCP server"
    );

    let server = match Server::new(config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create server: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run().await {
        error!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Shutdown complete");
    ExitCode::SUCCESS
}

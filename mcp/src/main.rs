use clap::Parser;
use registeruz_mcp_runtime::config::{
    DEFAULT_BASE_URL, DEFAULT_FROM_DATE, DEFAULT_MAX_RECORDS, DEFAULT_SUGGESTION_URL,
    DEFAULT_TIMEOUT_SECS, RegisterUzConfig,
};
use registeruz_mcp_runtime::{McpCommands, run};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "registeruz-mcp",
    version,
    about = "MCP server for the Slovak RegisterUZ public business registry"
)]
struct Cli {
    /// Base URL of the RegisterUZ public API
    #[arg(long, env = "REGISTERUZ_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Full URL of the entity-name suggestion endpoint
    #[arg(long, env = "REGISTERUZ_SUGGESTION_URL", default_value = DEFAULT_SUGGESTION_URL)]
    suggestion_url: String,

    /// HTTP timeout in seconds (1-300)
    #[arg(long, env = "REGISTERUZ_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Page size for listing requests (1-10000)
    #[arg(long, env = "REGISTERUZ_MAX_RECORDS", default_value_t = DEFAULT_MAX_RECORDS)]
    max_records: u32,

    /// Change date used when a tool call omits changed_from (YYYY-MM-DD)
    #[arg(long, env = "REGISTERUZ_DEFAULT_FROM_DATE", default_value = DEFAULT_FROM_DATE)]
    default_from_date: String,

    #[command(subcommand)]
    command: McpCommands,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // stdout carries framed JSON-RPC, so all diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match RegisterUzConfig::new(
        &cli.base_url,
        &cli.suggestion_url,
        cli.timeout_secs,
        cli.max_records,
        &cli.default_from_date,
    ) {
        Ok(config) => config,
        Err(err) => {
            let payload = json!({
                "error": "invalid_configuration",
                "message": err.to_string(),
            });
            eprintln!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
            std::process::exit(1);
        }
    };

    std::process::exit(run(config, cli.command).await);
}

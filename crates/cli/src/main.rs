use clap::Parser;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use actrack_db::{ConfigLayer, Database, DbError, DbResult, NotionConfig, config_file_path};
use commands::Command;

/// Action tracker - Notion-backed parent/child action items
#[derive(Parser)]
#[command(name = "actrack")]
#[command(version = "0.1.0")]
#[command(about = "Track parent and child action items stored in Notion", long_about = None)]
struct Args {
    /// Notion integration token
    #[arg(long, global = true, env = "NOTION_API_KEY", hide_env_values = true)]
    token: Option<String>,

    /// Parent (1-depth) database id
    #[arg(long = "parent-db", global = true, env = "NOTION_DB_PARENT")]
    parent_db: Option<String>,

    /// Child (2-depth) database id
    #[arg(long = "child-db", global = true, env = "NOTION_DB_CHILD")]
    child_db: Option<String>,

    /// Notion API base URL
    #[arg(long = "api-url", global = true, env = "NOTION_API_URL")]
    api_url: Option<String>,

    /// Config file (defaults to <config dir>/actrack/config.json)
    #[arg(long, global = true, env = "ACTRACK_CONFIG")]
    config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Command>,
}

impl Args {
    /// Settings given as flags or environment variables.
    fn flag_layer(&self) -> ConfigLayer {
        ConfigLayer {
            api_url: self.api_url.clone(),
            token: self.token.clone(),
            parent_database_id: self.parent_db.clone(),
            child_database_id: self.child_db.clone(),
        }
    }
}

/// Resolve the Notion settings.
///
/// Priority:
/// 1. Command line flags
/// 2. Environment variables (read by clap)
/// 3. The config file: `--config`/`ACTRACK_CONFIG` if given (must exist),
///    otherwise the default location if present
fn resolve_config(args: &Args) -> DbResult<NotionConfig> {
    let file_layer = match &args.config {
        Some(path) => ConfigLayer::from_file(path)?,
        None => ConfigLayer::load_optional(config_file_path(None).as_deref())?,
    };
    args.flag_layer().or(file_layer).resolve()
}

/// Initialize logging from `RUST_LOG`
///
/// Examples:
/// - `RUST_LOG=debug` - show each upstream request
/// - `RUST_LOG=actrack_db=trace` - include payload sizes
/// - `RUST_LOG=warn` - the default
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run_app().await {
        eprintln!("error: {}", e.full_message());
        if e.is_retryable() {
            eprintln!("hint: the request can be retried");
        }
        process::exit(1);
    }
}

/// Main application logic - separated for testability
async fn run_app() -> Result<(), DbError> {
    let args = Args::parse();
    run_with_args(&args).await
}

/// Run the application with the given arguments
async fn run_with_args(args: &Args) -> Result<(), DbError> {
    let Some(cmd) = &args.command else {
        println!("Action tracker");
        println!("Use 'actrack --help' for usage information.");
        return Ok(());
    };

    let config = resolve_config(args)?;
    let db = Database::connect(&config)?;
    let result = cmd.execute(&db).await?;
    println!("{}", result);

    Ok(())
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hr_assist::{db, mcp, seed};

#[derive(Parser)]
#[command(name = "hr-assist")]
#[command(about = "HR domain engine (employees, leave, meetings, tickets) behind an MCP facade")]
struct Cli {
    /// Path to the SQLite database; defaults to the platform data directory
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server via stdio (the default)
    Mcp,
    /// Seed the store with demo data
    Seed,
}

/// Initialize tracing. MCP mode logs to stderr so stdout stays clean for
/// the protocol.
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "hr_assist=info".into()),
    );

    if use_stderr {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = !matches!(cli.command, Some(Commands::Seed));
    init_tracing(use_stderr);

    let db = match cli.db {
        Some(path) => db::Database::open(path)?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;

    match cli.command {
        Some(Commands::Seed) => seed::seed(&db)?,
        Some(Commands::Mcp) | None => mcp::run_stdio_server(db).await?,
    }

    Ok(())
}

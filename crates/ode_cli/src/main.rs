mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use miette::Result;
use ode_core::{
    config::{self, OdeConfig},
    db::{DatabaseConfig, client},
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "ode-cli")]
#[command(about = "Ode publishing backend management")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Database file path (overrides config)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Author management
    Author {
        #[command(subcommand)]
        cmd: AuthorCommands,
    },
    /// Print a table of stored rows, oldest first
    List {
        what: ListTarget,
        /// Show at most this many rows
        limit: Option<u32>,
    },
    /// Database inspection
    Db {
        #[command(subcommand)]
        cmd: DbCommands,
    },
}

#[derive(Subcommand)]
enum AuthorCommands {
    /// Register an author and print their token
    Create {
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        bio: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long, default_value = "")]
        email: String,
        /// Allow the author to list every account
        #[arg(long)]
        staff: bool,
    },
    /// Mark an author as authenticated
    Promote { username: String },
    /// Print an author's token
    Token { username: String },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ListTarget {
    Authors,
    Posts,
    Tutorials,
    Series,
}

#[derive(Subcommand)]
enum DbCommands {
    /// Show row counts per table
    Stats,
}

/// `RUST_LOG` when it parses, otherwise the `--debug` dependent default
fn log_filter(debug: bool, rust_log: Option<String>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| {
            if debug {
                EnvFilter::new("ode_core=debug,ode_cli=debug,ode_server=debug")
            } else {
                EnvFilter::new("ode_core=warn,ode_cli=info,warn")
            }
        })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(3)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let cli = Cli::parse();

    fmt()
        .with_env_filter(log_filter(
            cli.debug,
            std::env::var(EnvFilter::DEFAULT_ENV).ok(),
        ))
        .with_file(true)
        .with_line_number(true)
        .with_timer(tracing_subscriber::fmt::time::LocalTime::rfc_3339())
        .compact()
        .init();

    let mut config: OdeConfig = if let Some(config_path) = &cli.config {
        info!("Loading config from: {:?}", config_path);
        config::load_config(config_path).await?
    } else {
        config::load_config_from_standard_locations().await?
    };

    if let Some(db_path) = &cli.db_path {
        info!("Overriding database path with: {:?}", db_path);
        config.database = DatabaseConfig::Embedded {
            path: db_path.to_string_lossy().to_string(),
        };
    }

    tracing::debug!("Using database config: {:?}", config.database);
    let db = client::connect(&config.database).await?;

    match cli.command {
        Commands::Author { cmd } => match cmd {
            AuthorCommands::Create {
                username,
                password,
                bio,
                first_name,
                last_name,
                email,
                staff,
            } => {
                commands::author::create(
                    &db,
                    commands::author::CreateArgs {
                        username,
                        password,
                        bio,
                        first_name,
                        last_name,
                        email,
                        staff,
                    },
                )
                .await?
            }
            AuthorCommands::Promote { username } => {
                commands::author::promote(&db, &username).await?
            }
            AuthorCommands::Token { username } => commands::author::token(&db, &username).await?,
        },
        Commands::List { what, limit } => commands::list::run(&db, what, limit).await?,
        Commands::Db { cmd } => match cmd {
            DbCommands::Stats => commands::db::stats(&db, &config).await?,
        },
    }

    Ok(())
}

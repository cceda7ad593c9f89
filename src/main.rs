//! # Scout Desk CLI (`scout`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `scout init` | Create the SQLite database and run schema migrations |
//! | `scout serve` | Start the HTTP API |
//! | `scout import <file>` | Import a roster CSV without going through HTTP |
//! | `scout export --event <name> --date <date>` | Print an event's text export |
//! | `scout players` | List players, or search them with `--search` |
//!
//! ## Examples
//!
//! ```bash
//! scout --config ./config/scout.toml init
//! scout --config ./config/scout.toml import ./rosters/fall.csv
//! RUST_LOG=debug scout --config ./config/scout.toml serve
//! ```

use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use std::path::PathBuf;

use scout_desk::{config, db, export, migrate, players, roster, server};

/// Scout Desk: roster imports, scouting reports, and event exports over SQLite.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. Only `[db].path` is required.
#[derive(Parser)]
#[command(
    name = "scout",
    about = "Scout Desk: roster imports, scouting reports, and event exports",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/scout.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite file and the players, reports, and events tables,
    /// then adds any report columns missing from older databases. Safe to
    /// run repeatedly.
    Init,

    /// Start the HTTP API on `[server].bind`.
    Serve,

    /// Import a roster CSV file into the players table.
    ///
    /// Column headers are matched loosely (`First`, `First Name`, and
    /// `FirstName` all fill the first name). Rows that fail to insert are
    /// listed and skipped.
    Import {
        /// Path to the CSV file.
        path: PathBuf,

        /// Delete the file after importing.
        #[arg(long)]
        remove: bool,
    },

    /// Print the plain-text export for one event.
    Export {
        /// Event name, exactly as stored on the reports.
        #[arg(long)]
        event: String,

        /// Event date, exactly as stored on the reports.
        #[arg(long)]
        date: String,
    },

    /// List players, or search by first/last name.
    Players {
        /// Substring to search for (at least 2 characters; max 20 results).
        #[arg(long)]
        search: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::init(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Import { path, remove } => {
            let pool = open_store(&cfg).await?;
            let summary = roster::import_file(&pool, &path, remove).await?;
            pool.close().await;

            println!("import {}", path.display());
            println!("  rows read: {}", summary.rows_read);
            println!("  inserted: {}", summary.inserted);
            println!("  skipped blank: {}", summary.skipped);
            println!("  failed: {}", summary.failed.len());
            for failure in &summary.failed {
                println!("    row {}: {}", failure.row, failure.reason);
            }
            println!("{}", summary.message());
        }
        Commands::Export { event, date } => {
            let pool = open_store(&cfg).await?;
            let text = export::export_event_text(&pool, &event, &date).await?;
            pool.close().await;
            print!("{}", text);
        }
        Commands::Players { search } => {
            let pool = open_store(&cfg).await?;
            let rows: Vec<[String; 4]> = match search {
                Some(q) => players::search_players(&pool, &q)
                    .await?
                    .into_iter()
                    .map(|p| {
                        [p.last_name, p.first_name, p.school, p.position]
                            .map(Option::unwrap_or_default)
                    })
                    .collect(),
                None => players::list_players(&pool)
                    .await?
                    .into_iter()
                    .map(|p| {
                        [p.last_name, p.first_name, p.school, p.position]
                            .map(Option::unwrap_or_default)
                    })
                    .collect(),
            };
            pool.close().await;

            if rows.is_empty() {
                println!("No players.");
                return Ok(());
            }
            println!("{:<18} {:<14} {:<28} {}", "LAST", "FIRST", "SCHOOL", "POS");
            println!("{}", "-".repeat(68));
            for [last, first, school, pos] in &rows {
                println!("{:<18} {:<14} {:<28} {}", last, first, school, pos);
            }
        }
    }

    Ok(())
}

/// Connect and make sure the schema exists, so commands work on a fresh file.
async fn open_store(cfg: &config::Config) -> anyhow::Result<SqlitePool> {
    let pool = db::connect(cfg).await?;
    migrate::run_migrations(&pool).await?;
    Ok(pool)
}

//! Schema creation and additive column migrations.
//!
//! Everything here is idempotent: tables use `CREATE TABLE IF NOT EXISTS`,
//! and columns added after the first release are checked through
//! `PRAGMA table_info` before any `ALTER TABLE` is issued.

use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;

/// Report columns introduced after the original `reports` schema shipped.
const ADDITIVE_REPORT_COLUMNS: &[(&str, &str)] = &[
    ("reportType", "TEXT"),
    ("gameNotes", "TEXT"),
    ("formattedAtBats", "TEXT"),
    ("atBatsJson", "TEXT"),
];

/// Connect to the configured database, migrate it, and close the pool.
pub async fn init(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    run_migrations(&pool).await?;
    pool.close().await;
    Ok(())
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS players (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            firstName TEXT,
            lastName TEXT,
            school TEXT,
            gradYear TEXT,
            state TEXT,
            height TEXT,
            weight TEXT,
            commitment TEXT,
            batHand TEXT,
            throwHand TEXT,
            position TEXT,
            createdAt DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .context("creating players table")?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reports (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            playerName TEXT NOT NULL,
            playerSchool TEXT,
            eventDate TEXT,
            eventName TEXT,
            scoutName TEXT,
            overallGrade INTEGER,
            stance TEXT,
            load TEXT,
            swingPath TEXT,
            barrelFeel TEXT,
            batSpeed TEXT,
            avgEV TEXT,
            maxEV TEXT,
            maxDist TEXT,
            scoutNotes TEXT,
            reportType TEXT,
            gameNotes TEXT,
            formattedAtBats TEXT,
            atBatsJson TEXT,
            createdAt DATETIME DEFAULT CURRENT_TIMESTAMP,
            updatedAt DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .context("creating reports table")?;

    let mut added = 0;
    for (column, ty) in ADDITIVE_REPORT_COLUMNS {
        if ensure_column(pool, "reports", column, ty).await? {
            added += 1;
        }
    }

    // Reserved for linking events to external documents; nothing writes it yet.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            eventName TEXT,
            eventDate TEXT,
            googleDocId TEXT,
            createdAt DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await
    .context("creating events table")?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_players_name ON players(lastName, firstName)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_event ON reports(eventName)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_created_at ON reports(createdAt DESC)")
        .execute(pool)
        .await?;

    log::info!("database schema ready ({} column(s) added)", added);
    Ok(())
}

/// Add `column` to `table` unless it already exists.
///
/// Returns `true` when an `ALTER TABLE` was issued. Table and column names
/// are interpolated, so callers pass only compile-time identifiers.
pub async fn ensure_column(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    ty: &str,
) -> Result<bool> {
    let columns = sqlx::query(&format!("PRAGMA table_info({})", table))
        .fetch_all(pool)
        .await
        .with_context(|| format!("introspecting table {}", table))?;

    let exists = columns.iter().any(|row| {
        let name: String = row.get("name");
        name == column
    });
    if exists {
        return Ok(false);
    }

    sqlx::query(&format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, ty))
        .execute(pool)
        .await
        .with_context(|| format!("adding column {}.{}", table, column))?;
    log::info!("added column {}.{}", table, column);
    Ok(true)
}

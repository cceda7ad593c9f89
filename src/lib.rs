//! # Scout Desk
//!
//! A local-first record keeper for baseball scouting.
//!
//! Scout Desk ingests player rosters from spreadsheet CSV exports, stores
//! free-form scouting reports, and serves retrieval, search, and plain-text
//! export over a single SQLite file.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────┐
//! │  CSV upload │──▶│  Reconcile   │──▶│  SQLite  │
//! │  / import   │   │  per row     │   │ players  │
//! └─────────────┘   └──────────────┘   │ reports  │
//!                                      └────┬─────┘
//!                      ┌────────────────────┤
//!                      ▼                    ▼
//!                 ┌──────────┐        ┌──────────┐
//!                 │   CLI    │        │   HTTP   │
//!                 │ (scout)  │        │  (Axum)  │
//!                 └──────────┘        └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! scout init                               # create database
//! scout import roster.csv                  # load a roster export
//! scout serve                              # start HTTP API
//! scout export --event "Fall Classic" --date 2024-09-01
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Idempotent schema creation and additive column migrations |
//! | [`models`] | Player, report, and event record types |
//! | [`error`] | Request-path error type |
//! | [`reconcile`] | Spreadsheet header → player field matching |
//! | [`roster`] | CSV import pipeline with per-row failure isolation |
//! | [`players`] | Player storage, listing, and search |
//! | [`reports`] | Report storage and event queries |
//! | [`export`] | Plain-text event export |
//! | [`server`] | HTTP API (Axum) with CORS |

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod migrate;
pub mod models;
pub mod players;
pub mod reconcile;
pub mod reports;
pub mod roster;
pub mod server;

//! Repository layer for database operations.
//!
//! Methods are organized across submodules by record:
//! - `tables.rs` - billiard tables and their occupancy
//! - `sessions.rs` - table sessions and game state
//! - `sales.rs` - immutable sale records
//! - `members.rs` - member accounts and debt
//! - `shifts.rs` - cash-drawer shifts
//! - `staff.rs` - staff and permission overrides
//!
//! Methods taking `&self` run on the pool. Associated functions taking a
//! `&mut SqliteConnection` are steps meant to be composed inside a transaction
//! obtained from [`Repository::begin`].

mod members;
mod sales;
mod sessions;
mod shifts;
mod staff;
mod tables;

use crate::domain::Money;
use serde::Serialize;
use sqlx::sqlite::{Sqlite, SqlitePool, SqliteRow};
use sqlx::Transaction;
use tracing::warn;

/// Repository for database operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a transaction. Dropping it without `commit` rolls everything back.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
        self.pool.begin().await
    }
}

/// Parse a stored money column, logging and defaulting to zero on corrupt data.
pub(crate) fn parse_money(raw: &str, column: &'static str) -> Money {
    Money::parse(raw).unwrap_or_else(|e| {
        warn!(column, value = %raw, error = %e, "failed to parse stored amount, using 0");
        Money::ZERO
    })
}

pub(crate) fn parse_money_opt(raw: Option<String>, column: &'static str) -> Option<Money> {
    raw.map(|s| parse_money(&s, column))
}

/// Take the row of an `INSERT ... RETURNING` read with `fetch_all`.
///
/// The statement must be stepped to completion: stopping after the first row
/// leaves the write pending on the connection, invisible to other connections.
pub(crate) fn returned_row(rows: Vec<SqliteRow>) -> Result<SqliteRow, sqlx::Error> {
    rows.into_iter().next().ok_or(sqlx::Error::RowNotFound)
}

/// Encode a value for a JSON text column.
pub(crate) fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String, sqlx::Error> {
    serde_json::to_string(value)
        .map_err(|e| sqlx::Error::Protocol(format!("failed to encode json column: {}", e)))
}

/// Whether the error is a UNIQUE constraint violation (including partial unique indexes).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map_or(false, |db_err| db_err.is_unique_violation())
}

//! Warehouse loading: raw JSON payloads into append-only Postgres tables.
//!
//! Each endpoint lands in its own `raw_*` table with the payload stored
//! verbatim as JSONB. Tables are created on first load, rows are only ever
//! appended, and insertion order matches extraction order.

use std::sync::Arc;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while loading into the warehouse.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Database error during DDL, insert, or reporting queries.
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    /// Table name failed identifier validation.
    #[error("invalid table name {0:?}: lowercase letters, digits and underscores only, not starting with a digit")]
    InvalidTable(String),
}

/// Establish a connection to the warehouse database.
///
/// # Arguments
/// * `database_url` - Connection string (e.g., `postgres://localhost/warehouse`)
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Row count for one `raw_*` table, as reported by [`Warehouse::raw_table_report`].
#[derive(Debug, Clone, Serialize)]
pub struct RawTableStat {
    pub table: String,
    pub rows: i64,
}

/// Loader boundary over the warehouse connection.
#[derive(Clone)]
pub struct Warehouse {
    // Arc because sea-orm's `mock` feature (enabled by this crate's tests)
    // removes `Clone` from `DatabaseConnection`.
    db: Arc<DatabaseConnection>,
}

impl Warehouse {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db: Arc::new(db) }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Append `records` to `table`, creating the table if needed.
    ///
    /// Records are inserted one per row, in slice order, as JSONB. An empty
    /// slice is a no-op that returns 0 without touching the database, so a
    /// quiet endpoint never creates an empty table.
    pub async fn load_raw(&self, table: &str, records: &[Value]) -> Result<u64, LoadError> {
        if records.is_empty() {
            tracing::info!(table, "no records to load");
            return Ok(0);
        }
        validate_table_name(table)?;

        let backend = self.db.get_database_backend();
        self.db
            .execute(Statement::from_string(
                backend,
                format!(
                    "CREATE TABLE IF NOT EXISTS {table} (\
                     id SERIAL PRIMARY KEY, \
                     raw JSONB NOT NULL, \
                     loaded_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP)"
                ),
            ))
            .await?;

        let insert = format!("INSERT INTO {table} (raw) VALUES ($1)");
        let mut rows = 0u64;
        for record in records {
            let result = self
                .db
                .execute(Statement::from_sql_and_values(
                    backend,
                    &insert,
                    [record.clone().into()],
                ))
                .await?;
            rows += result.rows_affected();
        }

        tracing::info!(table, rows, "loaded records");
        Ok(rows)
    }

    /// Row counts for every `raw_*` table in the public schema.
    pub async fn raw_table_report(&self) -> Result<Vec<RawTableStat>, LoadError> {
        let backend = self.db.get_database_backend();
        let tables = self
            .db
            .query_all(Statement::from_string(
                backend,
                "SELECT table_name FROM information_schema.tables \
                 WHERE table_schema = 'public' AND table_name LIKE 'raw_%' \
                 ORDER BY table_name"
                    .to_string(),
            ))
            .await?;

        let mut report = Vec::with_capacity(tables.len());
        for row in tables {
            let table: String = row.try_get("", "table_name")?;
            // Names come from the catalog but still get interpolated below.
            validate_table_name(&table)?;
            let count_row = self
                .db
                .query_one(Statement::from_string(
                    backend,
                    format!("SELECT COUNT(*) AS row_count FROM {table}"),
                ))
                .await?;
            let rows = match count_row {
                Some(row) => row.try_get::<i64>("", "row_count")?,
                None => 0,
            };
            report.push(RawTableStat { table, rows });
        }

        Ok(report)
    }
}

/// Table names are interpolated into SQL, so only a strict identifier form
/// is accepted: lowercase ASCII letters, digits, and underscores, not
/// starting with a digit.
fn validate_table_name(table: &str) -> Result<(), LoadError> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_lowercase() || first == '_' => {
            chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(LoadError::InvalidTable(table.to_string()))
    }
}

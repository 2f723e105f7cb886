//! PostgreSQL implementation of the engine store traits.
//!
//! Multi-row writes run in one database transaction. Version-guarded writes
//! use `update_many`/`delete_many` filtered on the expected version and treat
//! zero affected rows as a stale read.

mod accounts;
mod convert;
mod invoices;
mod journal;

use sea_orm::{DatabaseConnection, DbErr, SqlErr};
use tally_engine::store::{StoreError, UQ_INVOICE_NUMBER, UQ_JOURNAL_NUMBER, UQ_REVERSED_FROM};

/// Constraint names the engine maps to domain conflicts.
const KNOWN_CONSTRAINTS: [&str; 3] = [UQ_REVERSED_FROM, UQ_JOURNAL_NUMBER, UQ_INVOICE_NUMBER];

/// Store backed by a `SeaORM` connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    db: DatabaseConnection,
}

impl PgStore {
    /// Wraps a connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Maps a database error, naming the violated constraint when it is one the
/// engine knows about.
pub(crate) fn db_err(err: DbErr) -> StoreError {
    if let Some(SqlErr::UniqueConstraintViolation(message)) = err.sql_err() {
        let constraint = KNOWN_CONSTRAINTS
            .into_iter()
            .find(|name| message.contains(name))
            .map_or(message, str::to_string);
        return StoreError::UniqueViolation(constraint);
    }
    tracing::error!(error = %err, "database error");
    StoreError::Backend(err.to_string())
}

/// Escapes `%`, `_` and `\` for an `ILIKE` pattern and wraps it in wildcards.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Trimmed, non-empty search text.
pub(crate) fn search_term(search: Option<&String>) -> Option<&str> {
    search.map(|s| s.trim()).filter(|s| !s.is_empty())
}

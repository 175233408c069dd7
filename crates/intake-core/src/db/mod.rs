//! Connection pool manager
//!
//! An explicitly constructed, explicitly lifetimed pool object that
//! connectors receive by injection. Every operation runs on a scoped lease:
//! one pooled connection, one implicit transaction, committed on clean exit
//! and rolled back on any failure. Release back to the pool happens on every
//! exit path because the lease is owned by the scope (RAII).
//!
//! The pool never swallows its own failures: exhaustion and closed-pool
//! conditions surface as [`DbError::Sqlx`] to whatever stage invoked it.

pub mod config;
pub mod value;

use sqlx::postgres::PgPool;
use sqlx::{Postgres, Transaction};
use thiserror::Error;
use tracing::{debug, info, warn};

use intake_common::ImportError;

use crate::record::Record;

pub use config::DatabaseConfig;
pub use value::SqlValue;

/// Database operation errors with contextual information
#[derive(Error, Debug)]
pub enum DbError {
    /// SQL query or connection error (includes pool exhaustion and
    /// closed-pool conditions)
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Database configuration is invalid or missing
    #[error("Database configuration error: {0}. Check DATABASE_URL and connection settings.")]
    Config(String),
}

impl DbError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

pub type DbResult<T> = Result<T, DbError>;

impl From<DbError> for ImportError {
    fn from(err: DbError) -> Self {
        ImportError::Database(err.to_string())
    }
}

/// Handle to the shared connection pool
///
/// Cheap to clone; all clones share the same underlying pool. The pool is
/// created once by the invocation wrapper and torn down explicitly with
/// [`close`](Database::close).
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create the pool and establish connections eagerly
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        config.validate()?;
        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await?;

        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Database connection pool created"
        );

        Ok(Self { pool })
    }

    /// Create the pool without connecting; connections are established on
    /// first use
    pub fn connect_lazy(config: &DatabaseConfig) -> DbResult<Self> {
        config.validate()?;
        let pool = config
            .pool_options()
            .connect_lazy_with(config.connect_options()?);

        debug!(
            max_connections = config.max_connections,
            "Database connection pool created (lazy)"
        );

        Ok(Self { pool })
    }

    /// Lease a connection with an implicit transaction
    ///
    /// Waits until a pooled connection frees up, bounded by the configured
    /// acquire timeout. The lease is released back to the pool when the
    /// returned guard is consumed or dropped.
    pub async fn scoped(&self) -> DbResult<ScopedConnection> {
        let tx = self.pool.begin().await?;
        Ok(ScopedConnection { tx })
    }

    /// Execute a read and map every row to a column-name-keyed [`Record`]
    pub async fn query(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Record>> {
        let mut conn = self.scoped().await?;
        let records = conn.query(sql, params).await?;
        conn.commit().await?;
        Ok(records)
    }

    /// Execute a write; returns the affected-row count
    pub async fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<u64> {
        let mut conn = self.scoped().await?;
        let affected = conn.execute(sql, params).await?;
        conn.commit().await?;
        Ok(affected)
    }

    /// Execute a statement once per parameter tuple inside one transaction
    ///
    /// All-or-nothing: any tuple failure rolls the whole batch back. Returns
    /// the total affected-row count.
    pub async fn batch_execute(&self, sql: &str, rows: &[Vec<SqlValue>]) -> DbResult<u64> {
        let mut conn = self.scoped().await?;
        let mut affected = 0u64;
        for params in rows {
            affected += conn.execute(sql, params).await?;
        }
        conn.commit().await?;

        debug!(statements = rows.len(), affected, "batch execute committed");
        Ok(affected)
    }

    /// Verify the database is reachable
    pub async fn health_check(&self) -> DbResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(DbError::from)
    }

    /// Release all pooled connections; subsequent operations fail with a
    /// closed-pool error
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connection pool closed");
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Current number of connections held by the pool
    pub fn size(&self) -> u32 {
        self.pool.size()
    }

    /// Connections currently idle in the pool (not leased)
    pub fn num_idle(&self) -> usize {
        self.pool.num_idle()
    }
}

/// A leased connection with an in-flight transaction
///
/// Commit is explicit; dropping the guard without committing rolls the
/// transaction back and returns the connection to the pool either way.
pub struct ScopedConnection {
    tx: Transaction<'static, Postgres>,
}

impl ScopedConnection {
    /// Run a read inside the scope's transaction
    pub async fn query(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Record>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = param.bind_to(query);
        }
        let rows = query.fetch_all(&mut *self.tx).await?;
        Ok(rows.iter().map(value::row_to_record).collect())
    }

    /// Run a write inside the scope's transaction
    pub async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> DbResult<u64> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = param.bind_to(query);
        }
        let result = query.execute(&mut *self.tx).await?;
        Ok(result.rows_affected())
    }

    /// Commit the transaction and release the connection
    pub async fn commit(self) -> DbResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    /// Roll back explicitly; dropping the guard has the same effect
    pub async fn rollback(self) -> DbResult<()> {
        warn!("scoped connection rolled back");
        self.tx.rollback().await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_display() {
        let err = DbError::config("DB_PORT is not a number");
        assert!(err.to_string().contains("DB_PORT is not a number"));
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_db_error_converts_to_import_error() {
        let err: ImportError = DbError::config("bad url").into();
        assert!(matches!(err, ImportError::Database(_)));
    }

    #[tokio::test]
    async fn test_lazy_pool_starts_empty() {
        let db = Database::connect_lazy(&DatabaseConfig::default()).unwrap();
        assert_eq!(db.size(), 0);
        assert!(!db.is_closed());
    }
}

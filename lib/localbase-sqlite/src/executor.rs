//! SQLite implementation of QueryExecutor.

const DEFAULT_MAX_CONNECTIONS: u32 = 4;
const MEMORY_URL: &str = "sqlite::memory:";

use std::ops::Deref;
use std::str::FromStr;

use async_trait::async_trait;
use localbase::{
    ConnectionConfig, DbError, Delete, Insert, Query, QueryExecutor, Row, StoreConnection, Update,
};
use sqlx::Row as _;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{debug, instrument};

use crate::bind::{bind_values, row_to_json, storage_error};
use crate::compile::{self, Statement};

/// Wrapper around sqlx::SqlitePool that implements QueryExecutor.
#[derive(Clone, Debug)]
pub struct SqlitePool(sqlx::SqlitePool);

impl SqlitePool {
    /// Create a new SqlitePool from an sqlx SqlitePool.
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self(pool)
    }

    /// Open (or create) a SQLite database, e.g. `sqlite://local.db`.
    ///
    /// Foreign keys are enforced. `sqlite::memory:` opens a private
    /// in-memory database held by a single, never-recycled connection.
    pub async fn open(url: &str) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(storage_error)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(DEFAULT_MAX_CONNECTIONS)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(storage_error)?;
        debug!(url = %url, in_memory, "opened sqlite store");
        Ok(Self(pool))
    }

    /// Open a fresh in-memory database.
    pub async fn in_memory() -> Result<Self, DbError> {
        Self::open(MEMORY_URL).await
    }

    /// Get the inner sqlx::SqlitePool.
    pub fn inner(&self) -> &sqlx::SqlitePool {
        &self.0
    }

    async fn execute(&self, table: &str, stmt: Statement) -> Result<u64, DbError> {
        debug!(table = %table, sql = %stmt.sql, "execute");
        let args = bind_values(&stmt.params)?;
        let result = sqlx::query_with(&stmt.sql, args)
            .execute(&self.0)
            .await
            .map_err(storage_error)?;

        Ok(result.rows_affected())
    }
}

impl Deref for SqlitePool {
    type Target = sqlx::SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl StoreConnection for SqlitePool {
    async fn connect(config: impl Into<ConnectionConfig> + Send) -> Result<Self, DbError> {
        let config = config.into();
        Self::open(config.url()).await
    }

    async fn apply_schema(&self, ddl: &str) -> Result<(), DbError> {
        sqlx::raw_sql(ddl)
            .execute(&self.0)
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}

#[async_trait]
impl QueryExecutor for SqlitePool {
    #[instrument(skip_all, fields(table = %query.table))]
    async fn fetch(&self, query: &Query) -> Result<Vec<Row>, DbError> {
        let stmt = compile::select_sql(query)?;
        debug!(sql = %stmt.sql, "select");

        let args = bind_values(&stmt.params)?;
        let rows = sqlx::query_with(&stmt.sql, args)
            .fetch_all(&self.0)
            .await
            .map_err(storage_error)?;

        rows.iter().map(row_to_json).collect()
    }

    #[instrument(skip_all, fields(table = %query.table))]
    async fn count(&self, query: &Query) -> Result<u64, DbError> {
        let stmt = compile::count_sql(query)?;
        debug!(sql = %stmt.sql, "count");

        let args = bind_values(&stmt.params)?;
        let row = sqlx::query_with(&stmt.sql, args)
            .fetch_one(&self.0)
            .await
            .map_err(storage_error)?;

        let count: i64 = row.try_get(0).map_err(storage_error)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    #[instrument(skip_all, fields(table = %insert.table, rows = insert.rows.len()))]
    async fn insert(&self, insert: &Insert) -> Result<u64, DbError> {
        let mut written = 0;
        for row in &insert.rows {
            let stmt = compile::insert_sql(&insert.table, row)?;
            written += self.execute(&insert.table, stmt).await?;
        }
        Ok(written)
    }

    #[instrument(skip_all, fields(table = %update.table))]
    async fn update(&self, update: &Update) -> Result<u64, DbError> {
        let stmt = compile::update_sql(&update.table, &update.values, &update.filters)?;
        self.execute(&update.table, stmt).await
    }

    #[instrument(skip_all, fields(table = %delete.table))]
    async fn delete(&self, delete: &Delete) -> Result<u64, DbError> {
        let stmt = compile::delete_sql(&delete.table, &delete.filters)?;
        self.execute(&delete.table, stmt).await
    }
}

//! SQLite implementation for localbase.
//!
//! This crate runs localbase query descriptions against a local SQLite file
//! through sqlx. It owns the dialect: filter compilation to parameterized
//! SQL, parameter binding, and reading rows back as JSON.
//!
//! # Usage
//!
//! The store handle is opened once and handed to the client:
//!
//! ```text
//! use localbase::{Client, Filterable, Session};
//! use localbase_sqlite::SqlitePool;
//!
//! let pool = SqlitePool::open("sqlite://local.db").await?;
//! let client = Client::new(pool);
//!
//! let project = client
//!     .from("projects")
//!     .select("*, user:users(*)")
//!     .eq("title", "demo")
//!     .single()
//!     .await;
//!
//! let user = client.auth().get_user(&Session::signed_in_as("u1")).await;
//! ```
//!
//! Schema setup is the caller's job; [`StoreConnection::apply_schema`] runs
//! DDL for local bootstrap and tests.

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod bind;
mod compile;
mod executor;

pub use bind::{bind_values, row_to_json, storage_error};
pub use compile::{
    Statement, WhereClause, compile_filters, count_sql, delete_sql, insert_sql, quote_ident,
    select_sql, update_sql,
};
pub use executor::SqlitePool;

// Re-export core types for convenience
pub use localbase::{
    Client, ConnectionConfig, DbError, Filter, Filterable, LocalConfig, Order, Query,
    QueryExecutor, Response, Row, RowCodec, Session, Shape, StoreConnection, Value,
};

/// Open the store named by `config` and wrap it in a client.
pub async fn connect(config: &LocalConfig) -> Result<Client<SqlitePool>, DbError> {
    let pool = SqlitePool::connect(config.connection()).await?;
    Ok(Client::new(pool))
}

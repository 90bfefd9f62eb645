//! Localbase - a local stand-in for a hosted backend's query client.
//!
//! This crate lets an application written against a hosted
//! backend-as-a-service client run against a local, single-file store. It
//! mirrors the hosted client's fluent API and translates each chain into a
//! backend-agnostic description that a [`QueryExecutor`] runs.
//!
//! # Core Concepts
//!
//! - **Builders**: [`SelectBuilder`], [`InsertBuilder`], [`UpdateBuilder`] and
//!   [`DeleteBuilder`] accumulate a description and run it once, either via
//!   `execute()` or by awaiting the builder directly.
//! - **Row codec**: [`RowCodec`] widens stored 0/1 integers and JSON text to
//!   booleans and arrays, and narrows them again on write.
//! - **Shapes**: [`Shape`] describes the columns to return and the related
//!   rows to attach (`"*, user:users(*)"`).
//! - **Envelope**: every terminal resolves to a [`Response`] carrying
//!   `data`, `error` and `count`; store failures land in `error`.
//!
//! # Example
//!
//! ```text
//! use localbase::{Client, Filterable, Order};
//!
//! let client = Client::new(pool);
//! let projects = client
//!     .from("projects")
//!     .select("*, user:users(*)")
//!     .contains("tags", ["ai"])
//!     .order("created_at", Order::Desc)
//!     .limit(10)
//!     .await;
//! ```

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::unwrap_in_result)
)]

mod auth;
mod client;
mod codec;
mod config;
mod delete;
mod error;
mod expand;
mod filter;
mod insert;
mod query;
mod response;
mod select;
mod shape;
mod time;
mod update;

pub use auth::{Auth, AuthChangeEvent, OAuthOptions, Session, Subscription, User};
pub use client::{Client, TableRef};
pub use codec::RowCodec;
pub use config::{
    BackendKind, ConnectionConfig, DATABASE_URL_VAR, DEFAULT_DATABASE_URL, HOSTED_URL_VAR,
    LocalConfig, StoreConnection, is_hosted_configured,
};
pub use delete::DeleteBuilder;
pub use error::DbError;
pub use expand::expand;
pub use filter::Filterable;
pub use insert::InsertBuilder;
pub use query::{Delete, Filter, Insert, Order, Query, QueryExecutor, Row, Update, Value};
pub use response::Response;
pub use select::{Count, SelectBuilder, SelectOptions};
pub use shape::{Column, Relation, Shape, validate_identifier};
pub use time::Timestamp;
pub use update::UpdateBuilder;

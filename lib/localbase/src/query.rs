//! Database-agnostic query descriptions.
//!
//! Builders accumulate one of these descriptions and hand it to a
//! [`QueryExecutor`], which translates it for a concrete store. The
//! descriptions carry storage-level values: rows here have already been
//! through [`RowCodec::encode`](crate::RowCodec::encode).

use crate::{DbError, Timestamp};
use async_trait::async_trait;

/// A row as moved between the store and callers.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// A value that can be bound to a query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Strings(Vec<String>),
    Datetime(Timestamp),
    Null,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::Strings(v)
    }
}

impl<'a> From<Vec<&'a str>> for Value {
    fn from(v: Vec<&'a str>) -> Self {
        Value::Strings(v.into_iter().map(|s| s.to_string()).collect())
    }
}

impl From<Timestamp> for Value {
    fn from(ts: Timestamp) -> Self {
        Value::Datetime(ts)
    }
}

impl From<&Timestamp> for Value {
    fn from(ts: &Timestamp) -> Self {
        Value::Datetime(ts.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match v {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            Json::String(s) => Value::String(s.clone()),
            Json::Array(items) if items.iter().all(|i| i.is_string()) => Value::Strings(
                items
                    .iter()
                    .filter_map(|i| i.as_str().map(str::to_string))
                    .collect(),
            ),
            // Anything else is compared against its stored JSON text
            other => Value::String(other.to_string()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::from(&v)
    }
}

/// Filter conditions for queries.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// field = value
    Eq(String, Value),
    /// field != value
    Ne(String, Value),
    /// field > value
    Gt(String, Value),
    /// field >= value
    Gte(String, Value),
    /// field < value
    Lt(String, Value),
    /// field <= value
    Lte(String, Value),
    /// field IN (values); an empty list matches nothing
    In(String, Vec<Value>),
    /// Array column holds any of the given elements
    Contains(String, Vec<String>),
    /// field IS NULL
    IsNull(String),
    /// field IS NOT NULL
    IsNotNull(String),
}

impl Filter {
    pub fn field(&self) -> &str {
        match self {
            Filter::Eq(f, _)
            | Filter::Ne(f, _)
            | Filter::Gt(f, _)
            | Filter::Gte(f, _)
            | Filter::Lt(f, _)
            | Filter::Lte(f, _)
            | Filter::In(f, _)
            | Filter::Contains(f, _)
            | Filter::IsNull(f)
            | Filter::IsNotNull(f) => f,
        }
    }
}

/// Sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending { Order::Asc } else { Order::Desc }
    }
}

/// A SELECT description.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// The table to query.
    pub table: String,
    /// Filter conditions, combined with AND.
    pub filters: Vec<Filter>,
    /// Single ordering column; ties keep storage order.
    pub order: Option<(String, Order)>,
    /// Maximum number of results.
    pub limit: Option<u64>,
}

impl Query {
    pub fn for_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::Eq(field.into(), value.into()))
    }

    pub fn order_by(mut self, field: impl Into<String>, order: Order) -> Self {
        self.order = Some((field.into(), order));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// An INSERT description; one statement per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub rows: Vec<Row>,
}

/// An UPDATE description.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: String,
    pub values: Row,
    pub filters: Vec<Filter>,
}

/// A DELETE description.
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: String,
    pub filters: Vec<Filter>,
}

/// Trait for executing query descriptions against a store.
///
/// Implemented by backend pool types (e.g. `localbase_sqlite::SqlitePool`).
/// Executors deal only in storage rows; coercion to logical rows happens in
/// the builders.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute a SELECT and return the raw stored rows.
    async fn fetch(&self, query: &Query) -> Result<Vec<Row>, DbError>;

    /// Execute a SELECT and return at most one row.
    async fn fetch_optional(&self, query: &Query) -> Result<Option<Row>, DbError> {
        let mut q = query.clone();
        q.limit = Some(1);

        let rows = self.fetch(&q).await?;
        Ok(rows.into_iter().next())
    }

    /// Count rows matching the query's filters, ignoring order and limit.
    async fn count(&self, query: &Query) -> Result<u64, DbError>;

    /// Insert rows and return the number of rows written.
    async fn insert(&self, insert: &Insert) -> Result<u64, DbError>;

    /// Update matching rows and return the number of rows affected.
    async fn update(&self, update: &Update) -> Result<u64, DbError>;

    /// Delete matching rows and return the number of rows affected.
    async fn delete(&self, delete: &Delete) -> Result<u64, DbError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_values_map_to_bindable_values() {
        assert_eq!(Value::from(json!(null)), Value::Null);
        assert_eq!(Value::from(json!(7)), Value::Int(7));
        assert_eq!(Value::from(json!(1.5)), Value::Float(1.5));
        assert_eq!(Value::from(json!("x")), Value::String("x".into()));
        assert_eq!(
            Value::from(json!(["a", "b"])),
            Value::Strings(vec!["a".into(), "b".into()])
        );
        assert_eq!(
            Value::from(json!({"k": 1})),
            Value::String("{\"k\":1}".into())
        );
    }

    #[test]
    fn later_order_replaces_earlier() {
        let q = Query::for_table("projects")
            .order_by("created_at", Order::Asc)
            .order_by("title", Order::from_ascending(false));
        assert_eq!(q.order, Some(("title".to_string(), Order::Desc)));
    }

    #[test]
    fn option_none_is_null() {
        let v: Value = None::<&str>.into();
        assert_eq!(v, Value::Null);
    }
}

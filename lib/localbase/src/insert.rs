use std::future::IntoFuture;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::expand::BoxFuture;
use crate::{Client, DbError, Insert, QueryExecutor, Response, Row, Timestamp};

/// Accumulates an insert of one or more rows.
///
/// Rows without an `id` get a generated UUID; rows without `created_at` or
/// `updated_at` get the current instant. The rows handed back are the
/// decoded form of exactly what was written.
pub struct InsertBuilder<'a, E> {
    client: &'a Client<E>,
    table: String,
    rows: Result<Vec<Row>, DbError>,
}

impl<'a, E: QueryExecutor> InsertBuilder<'a, E> {
    pub(crate) fn new(client: &'a Client<E>, table: String, values: impl Serialize) -> Self {
        Self {
            client,
            table,
            rows: to_rows(values),
        }
    }

    /// Return the inserted rows. The insert path already has them, so this
    /// only exists to mirror the hosted client's chain.
    pub fn select(self) -> Self {
        self
    }

    pub async fn execute(self) -> Response<Vec<Row>> {
        let table = self.table.clone();
        match self.run().await {
            Ok(rows) => Response::ok(rows),
            Err(e) => {
                warn!(table = %table, operation = "insert", error = %e, "insert failed");
                Response::failed(e)
            }
        }
    }

    /// Insert and return the first row.
    pub async fn single(self) -> Response<Row> {
        self.execute()
            .await
            .map(|rows| rows.into_iter().next())
            .flatten()
    }

    async fn run(self) -> Result<Vec<Row>, DbError> {
        let rows = self.rows?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let codec = self.client.codec();
        let now = Value::String(Timestamp::now().to_string());

        let rows: Vec<Row> = rows
            .into_iter()
            .map(|mut row| {
                fill_if_absent(&mut row, "id", || Value::String(Uuid::new_v4().to_string()));
                fill_if_absent(&mut row, "created_at", || now.clone());
                fill_if_absent(&mut row, "updated_at", || now.clone());
                codec.encode(row)
            })
            .collect();

        let insert = Insert {
            table: self.table,
            rows,
        };
        let written = self.client.executor().insert(&insert).await?;
        debug!(table = %insert.table, rows = written, "inserted rows");

        Ok(insert
            .rows
            .into_iter()
            .map(|row| codec.decode_row(row))
            .collect())
    }
}

impl<'a, E: QueryExecutor + 'a> IntoFuture for InsertBuilder<'a, E> {
    type Output = Response<Vec<Row>>;
    type IntoFuture = BoxFuture<'a, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.execute())
    }
}

fn fill_if_absent(row: &mut Row, key: &str, value: impl FnOnce() -> Value) {
    if row.get(key).is_none_or(Value::is_null) {
        row.insert(key.to_string(), value());
    }
}

/// Serialize insert/update values into rows: one object or an array of objects.
pub(crate) fn to_rows(values: impl Serialize) -> Result<Vec<Row>, DbError> {
    match serde_json::to_value(values)? {
        Value::Object(row) => Ok(vec![row]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                other => Err(DbError::InvalidRow(format!(
                    "expected an object, got {}",
                    other
                ))),
            })
            .collect(),
        other => Err(DbError::InvalidRow(format!(
            "expected an object or an array of objects, got {}",
            other
        ))),
    }
}

/// Serialize update values into a single row.
pub(crate) fn to_row(values: impl Serialize) -> Result<Row, DbError> {
    match serde_json::to_value(values)? {
        Value::Object(row) => Ok(row),
        other => Err(DbError::InvalidRow(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct NewProject<'a> {
        title: &'a str,
        tags: Vec<&'a str>,
    }

    #[test]
    fn struct_becomes_one_row() {
        let rows = to_rows(NewProject {
            title: "demo",
            tags: vec!["ai"],
        })
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], json!("demo"));
    }

    #[test]
    fn array_becomes_batch() {
        let rows = to_rows(json!([{"title": "a"}, {"title": "b"}])).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn scalars_are_rejected() {
        assert!(matches!(to_rows(json!(3)), Err(DbError::InvalidRow(_))));
        assert!(matches!(
            to_rows(json!([{"title": "a"}, "b"])),
            Err(DbError::InvalidRow(_))
        ));
        assert!(matches!(to_row(json!([])), Err(DbError::InvalidRow(_))));
    }

    #[test]
    fn fill_respects_present_values() {
        let mut row = Row::new();
        row.insert("id".into(), json!("given"));
        row.insert("created_at".into(), json!(null));

        fill_if_absent(&mut row, "id", || json!("generated"));
        fill_if_absent(&mut row, "created_at", || json!("now"));

        assert_eq!(row["id"], json!("given"));
        assert_eq!(row["created_at"], json!("now"));
    }
}

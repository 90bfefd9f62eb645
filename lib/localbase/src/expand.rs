//! Relationship expansion: attach related rows named in a select shape.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::{DbError, Query, QueryExecutor, Row, RowCodec, Shape};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Attach every relation in `shape` to a decoded row.
///
/// Each relation costs one point lookup (`related.id = row[foreign_key]`).
/// The related row is decoded, expanded with the relation's own shape, then
/// projected. A missing foreign key or related row attaches `null`.
pub fn expand<'a, E: QueryExecutor>(
    executor: &'a E,
    codec: &'a RowCodec,
    row: Row,
    shape: &'a Shape,
) -> BoxFuture<'a, Result<Row, DbError>> {
    Box::pin(async move {
        let mut row = row;

        for relation in &shape.relations {
            let fk = match row.get(&relation.foreign_key) {
                Some(fk) if !fk.is_null() => fk.clone(),
                _ => {
                    row.insert(relation.alias.clone(), Value::Null);
                    continue;
                }
            };

            let query = Query::for_table(&relation.table)
                .eq("id", &fk)
                .limit(1);
            let related = match codec.decode(executor.fetch_optional(&query).await?) {
                Some(found) => {
                    let expanded = expand(executor, codec, found, &relation.shape).await?;
                    Value::Object(relation.shape.project(expanded))
                }
                None => Value::Null,
            };

            row.insert(relation.alias.clone(), related);
        }

        Ok(row)
    })
}

/// Turn a stored row into its logical, expanded and projected form.
pub(crate) async fn materialize<E: QueryExecutor>(
    executor: &E,
    codec: &RowCodec,
    stored: Row,
    shape: &Shape,
) -> Result<Row, DbError> {
    let row = codec.decode_row(stored);
    let row = expand(executor, codec, row, shape).await?;
    Ok(shape.project(row))
}

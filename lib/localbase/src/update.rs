use std::future::IntoFuture;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::expand::BoxFuture;
use crate::insert::to_row;
use crate::{
    Client, DbError, Filter, Filterable, Query, QueryExecutor, Response, Row, Timestamp, Update,
};

/// Accumulates a partial update of the rows matching its filters.
///
/// `updated_at` is always re-stamped. With [`select`](Self::select) and at
/// least one `eq` filter, the matching rows are read back after the write;
/// otherwise the written values are echoed.
pub struct UpdateBuilder<'a, E> {
    client: &'a Client<E>,
    table: String,
    values: Result<Row, DbError>,
    filters: Vec<Filter>,
    returning: bool,
}

impl<'a, E: QueryExecutor> UpdateBuilder<'a, E> {
    pub(crate) fn new(client: &'a Client<E>, table: String, values: impl Serialize) -> Self {
        Self {
            client,
            table,
            values: to_row(values),
            filters: Vec::new(),
            returning: false,
        }
    }

    /// Read the updated rows back after the write.
    pub fn select(mut self) -> Self {
        self.returning = true;
        self
    }

    pub async fn execute(self) -> Response<Vec<Row>> {
        let table = self.table.clone();
        match self.run().await {
            Ok(rows) => Response::ok(rows),
            Err(e) => {
                warn!(table = %table, operation = "update", error = %e, "update failed");
                Response::failed(e)
            }
        }
    }

    /// Update and return the first resulting row.
    pub async fn single(mut self) -> Response<Row> {
        self.returning = true;
        self.execute()
            .await
            .map(|rows| rows.into_iter().next())
            .flatten()
    }

    async fn run(self) -> Result<Vec<Row>, DbError> {
        let mut values = self.values?;
        if self.filters.is_empty() {
            return Err(DbError::MissingFilters("update"));
        }

        values.insert(
            "updated_at".to_string(),
            Value::String(Timestamp::now().to_string()),
        );

        let codec = self.client.codec();
        let executor = self.client.executor();
        let update = Update {
            table: self.table,
            values: codec.encode(values),
            filters: self.filters,
        };
        let affected = executor.update(&update).await?;
        debug!(table = %update.table, rows = affected, "updated rows");

        let eq_filters: Vec<Filter> = update
            .filters
            .iter()
            .filter(|f| matches!(f, Filter::Eq(..)))
            .cloned()
            .collect();

        if self.returning && !eq_filters.is_empty() {
            let query = Query {
                table: update.table,
                filters: eq_filters,
                order: None,
                limit: None,
            };
            let rows = executor.fetch(&query).await?;
            return Ok(rows.into_iter().map(|row| codec.decode_row(row)).collect());
        }

        Ok(vec![codec.decode_row(update.values)])
    }
}

impl<E> Filterable for UpdateBuilder<'_, E> {
    fn push_filter(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    fn filters(&self) -> &[Filter] {
        &self.filters
    }
}

impl<'a, E: QueryExecutor + 'a> IntoFuture for UpdateBuilder<'a, E> {
    type Output = Response<Vec<Row>>;
    type IntoFuture = BoxFuture<'a, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.execute())
    }
}

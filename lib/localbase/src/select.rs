//! Read path: the fluent SELECT builder.

use std::future::IntoFuture;

use tracing::warn;

use crate::expand::{BoxFuture, materialize};
use crate::{
    Client, DbError, Filter, Filterable, Order, Query, QueryExecutor, Response, Row, Shape,
};

/// Row counting mode for a select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    /// `SELECT COUNT(*)` over the filtered rows.
    Exact,
}

/// Options accepted by [`TableRef::select_with`](crate::TableRef::select_with).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectOptions {
    pub count: Option<Count>,
    /// Return only the count, never rows.
    pub head: bool,
}

impl SelectOptions {
    /// Count-only query: `{ count: "exact", head: true }`.
    pub fn head_count() -> Self {
        Self {
            count: Some(Count::Exact),
            head: true,
        }
    }
}

/// Accumulates a read and runs it on [`execute`](Self::execute) or `.await`.
///
/// Nothing touches the store until then.
pub struct SelectBuilder<'a, E> {
    client: &'a Client<E>,
    query: Query,
    shape: Result<Shape, DbError>,
    options: SelectOptions,
}

impl<'a, E: QueryExecutor> SelectBuilder<'a, E> {
    pub(crate) fn new(
        client: &'a Client<E>,
        table: String,
        shape: Result<Shape, DbError>,
        options: SelectOptions,
    ) -> Self {
        Self {
            client,
            query: Query::for_table(table),
            shape,
            options,
        }
    }

    /// Order by a single column. A later call replaces an earlier one.
    pub fn order(mut self, column: impl Into<String>, order: Order) -> Self {
        self.query.order = Some((column.into(), order));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// The accumulated query description.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Run the query and return every matching row.
    ///
    /// Zero matches yield `Some(vec![])`. Head mode yields `data == None`
    /// with the count set.
    pub async fn execute(self) -> Response<Vec<Row>> {
        let table = self.query.table.clone();
        match self.run().await {
            Ok(response) => response,
            Err(e) => {
                warn!(table = %table, operation = "select", error = %e, "query failed");
                Response::failed(e)
            }
        }
    }

    /// Run the query for at most one row; no match yields `data == None`.
    pub async fn single(mut self) -> Response<Row> {
        self.query.limit = Some(1);
        self.options.head = false;

        self.execute()
            .await
            .map(|rows| rows.into_iter().next())
            .flatten()
    }

    async fn run(self) -> Result<Response<Vec<Row>>, DbError> {
        let shape = self.shape?;
        let executor = self.client.executor();
        let codec = self.client.codec();

        let count = if self.options.count.is_some() || self.options.head {
            Some(executor.count(&self.query).await?)
        } else {
            None
        };

        if self.options.head {
            return Ok(Response {
                data: None,
                error: None,
                count,
            });
        }

        let stored = executor.fetch(&self.query).await?;
        let mut rows = Vec::with_capacity(stored.len());
        for row in stored {
            rows.push(materialize(executor, codec, row, &shape).await?);
        }

        Ok(Response {
            data: Some(rows),
            error: None,
            count,
        })
    }
}

impl<E> Filterable for SelectBuilder<'_, E> {
    fn push_filter(&mut self, filter: Filter) {
        self.query.filters.push(filter);
    }

    fn filters(&self) -> &[Filter] {
        &self.query.filters
    }
}

impl<'a, E: QueryExecutor + 'a> IntoFuture for SelectBuilder<'a, E> {
    type Output = Response<Vec<Row>>;
    type IntoFuture = BoxFuture<'a, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.execute())
    }
}

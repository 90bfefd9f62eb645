use std::future::IntoFuture;

use tracing::{debug, warn};

use crate::expand::BoxFuture;
use crate::{Client, DbError, Delete, Filter, Filterable, QueryExecutor, Response};

/// Accumulates a delete of the rows matching its filters.
///
/// Resolves to `data == None, error == None` whether or not anything matched.
pub struct DeleteBuilder<'a, E> {
    client: &'a Client<E>,
    delete: Delete,
}

impl<'a, E: QueryExecutor> DeleteBuilder<'a, E> {
    pub(crate) fn new(client: &'a Client<E>, table: String) -> Self {
        Self {
            client,
            delete: Delete {
                table,
                filters: Vec::new(),
            },
        }
    }

    /// Accepted so hosted-client chains compile; a delete never returns rows.
    pub fn select(self) -> Self {
        self
    }

    /// Same as [`execute`](Self::execute): `data` stays `None`.
    pub async fn single(self) -> Response<()> {
        self.execute().await
    }

    pub async fn execute(self) -> Response<()> {
        match self.run().await {
            Ok(()) => Response::empty(),
            Err(e) => {
                warn!(table = %self.delete.table, operation = "delete", error = %e, "delete failed");
                Response::failed(e)
            }
        }
    }

    async fn run(&self) -> Result<(), DbError> {
        if self.delete.filters.is_empty() {
            return Err(DbError::MissingFilters("delete"));
        }

        let affected = self.client.executor().delete(&self.delete).await?;
        debug!(table = %self.delete.table, rows = affected, "deleted rows");
        Ok(())
    }
}

impl<E> Filterable for DeleteBuilder<'_, E> {
    fn push_filter(&mut self, filter: Filter) {
        self.delete.filters.push(filter);
    }

    fn filters(&self) -> &[Filter] {
        &self.delete.filters
    }
}

impl<'a, E: QueryExecutor + 'a> IntoFuture for DeleteBuilder<'a, E> {
    type Output = Response<()>;
    type IntoFuture = BoxFuture<'a, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.execute())
    }
}

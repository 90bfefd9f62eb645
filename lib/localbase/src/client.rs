use serde::Serialize;

use crate::{
    Auth, DeleteBuilder, InsertBuilder, QueryExecutor, RowCodec, SelectBuilder, SelectOptions,
    Shape, UpdateBuilder,
};

/// Entry point handing out builders per table.
///
/// The client owns the store handle and the row codec; builders borrow it
/// and hold no state of their own between executions.
#[derive(Debug, Clone)]
pub struct Client<E> {
    executor: E,
    codec: RowCodec,
}

impl<E: QueryExecutor> Client<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            codec: RowCodec::default(),
        }
    }

    pub fn with_codec(mut self, codec: RowCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn codec(&self) -> &RowCodec {
        &self.codec
    }

    /// Start a query on a table.
    pub fn from(&self, table: impl Into<String>) -> TableRef<'_, E> {
        TableRef {
            client: self,
            name: table.into(),
        }
    }

    /// Alias for [`from`](Self::from).
    pub fn table(&self, table: impl Into<String>) -> TableRef<'_, E> {
        self.from(table)
    }

    /// Local stand-in for the hosted auth API.
    pub fn auth(&self) -> Auth<'_, E> {
        Auth::new(self)
    }
}

/// A table bound to a client.
pub struct TableRef<'a, E> {
    client: &'a Client<E>,
    name: String,
}

impl<'a, E: QueryExecutor> TableRef<'a, E> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Select using the hosted-client shape syntax, e.g. `"*, user:users(*)"`.
    ///
    /// A malformed shape is reported when the builder executes.
    pub fn select(self, shape: &str) -> SelectBuilder<'a, E> {
        self.select_with(shape, SelectOptions::default())
    }

    pub fn select_with(self, shape: &str, options: SelectOptions) -> SelectBuilder<'a, E> {
        SelectBuilder::new(self.client, self.name, Shape::parse(shape), options)
    }

    /// Select with a prebuilt shape.
    pub fn select_shape(self, shape: Shape, options: SelectOptions) -> SelectBuilder<'a, E> {
        SelectBuilder::new(self.client, self.name, Ok(shape), options)
    }

    /// Insert one row (a serializable object) or many (an array of objects).
    pub fn insert(self, values: impl Serialize) -> InsertBuilder<'a, E> {
        InsertBuilder::new(self.client, self.name, values)
    }

    pub fn update(self, values: impl Serialize) -> UpdateBuilder<'a, E> {
        UpdateBuilder::new(self.client, self.name, values)
    }

    pub fn delete(self) -> DeleteBuilder<'a, E> {
        DeleteBuilder::new(self.client, self.name)
    }
}

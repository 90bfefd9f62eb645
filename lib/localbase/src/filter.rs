use crate::{Filter, Value};

/// Chainable predicate methods shared by the select, update and delete builders.
///
/// Every method consumes the builder and returns it with one more predicate;
/// predicates are combined with AND in the order they were added.
pub trait Filterable: Sized {
    /// Append a predicate to the accumulated list.
    fn push_filter(&mut self, filter: Filter);

    /// Predicates accumulated so far.
    fn filters(&self) -> &[Filter];

    fn filter(mut self, filter: Filter) -> Self {
        self.push_filter(filter);
        self
    }

    fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::Eq(field.into(), value.into()))
    }

    fn neq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::Ne(field.into(), value.into()))
    }

    fn gt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::Gt(field.into(), value.into()))
    }

    fn gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::Gte(field.into(), value.into()))
    }

    fn lt(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::Lt(field.into(), value.into()))
    }

    fn lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::Lte(field.into(), value.into()))
    }

    /// Membership test. An empty list matches no rows.
    fn r#in<I>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.filter(Filter::In(
            field.into(),
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// Array column holds any of `values`, compared as exact elements.
    fn contains<I>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.filter(Filter::Contains(
            field.into(),
            values.into_iter().map(Into::into).collect(),
        ))
    }

    fn is_null(self, field: impl Into<String>) -> Self {
        self.filter(Filter::IsNull(field.into()))
    }

    fn not_null(self, field: impl Into<String>) -> Self {
        self.filter(Filter::IsNotNull(field.into()))
    }
}

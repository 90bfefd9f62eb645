//! The `{data, error, count}` result envelope every terminal resolves to.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{DbError, Row};

/// Result envelope returned by every builder terminal.
///
/// Builders never panic or return `Err` for store failures; the failure is
/// placed in `error` with `data` left empty. `data == None` with
/// `error == None` means "nothing there", e.g. a `single()` with no match.
#[derive(Debug)]
pub struct Response<T> {
    pub data: Option<T>,
    pub error: Option<DbError>,
    pub count: Option<u64>,
}

impl<T> Response<T> {
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            count: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            data: None,
            error: None,
            count: None,
        }
    }

    pub fn failed(error: DbError) -> Self {
        Self {
            data: None,
            error: Some(error),
            count: None,
        }
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Convert to a `Result`, keeping "no data" as `Ok(None)`.
    pub fn into_result(self) -> Result<Option<T>, DbError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.data),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            data: self.data.map(f),
            error: self.error,
            count: self.count,
        }
    }
}

impl<T> Response<Option<T>> {
    pub fn flatten(self) -> Response<T> {
        Response {
            data: self.data.flatten(),
            error: self.error,
            count: self.count,
        }
    }
}

impl<T> From<Result<T, DbError>> for Response<T> {
    fn from(result: Result<T, DbError>) -> Self {
        match result {
            Ok(data) => Response::ok(data),
            Err(e) => Response::failed(e),
        }
    }
}

impl Response<Row> {
    /// Deserialize the row into a typed value.
    pub fn row_as<T: DeserializeOwned>(self) -> Result<Option<T>, DbError> {
        match self.into_result()? {
            Some(row) => Ok(Some(serde_json::from_value(Value::Object(row))?)),
            None => Ok(None),
        }
    }
}

impl Response<Vec<Row>> {
    /// Deserialize every row into a typed value. Missing data yields an empty list.
    pub fn rows_as<T: DeserializeOwned>(self) -> Result<Vec<T>, DbError> {
        self.into_result()?
            .unwrap_or_default()
            .into_iter()
            .map(|row| serde_json::from_value(Value::Object(row)).map_err(DbError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Project {
        title: String,
        tags: Vec<String>,
    }

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => Row::new(),
        }
    }

    #[test]
    fn failed_response_is_err() {
        let response: Response<Row> = Response::failed(DbError::storage("boom"));
        assert!(!response.is_ok());
        assert!(response.into_result().is_err());
    }

    #[test]
    fn empty_response_is_ok_none() {
        let response: Response<Row> = Response::empty();
        assert!(response.into_result().unwrap().is_none());
    }

    #[test]
    fn typed_rows() {
        let response = Response::ok(vec![row(json!({
            "id": "p1",
            "title": "demo",
            "tags": ["ai", "web"],
        }))])
        .with_count(1);
        assert_eq!(response.count, Some(1));

        let projects: Vec<Project> = response.rows_as().unwrap();
        assert_eq!(
            projects,
            vec![Project {
                title: "demo".into(),
                tags: vec!["ai".into(), "web".into()],
            }]
        );
    }

    #[test]
    fn typed_row_missing() {
        let project: Option<Project> = Response::<Row>::empty().row_as().unwrap();
        assert!(project.is_none());
    }
}

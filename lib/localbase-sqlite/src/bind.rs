//! Binding parameters to SQLite queries and reading rows back as JSON.

use localbase::{DbError, Row, Value};
use serde_json::Value as Json;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Arguments, Column, Row as _, TypeInfo, ValueRef};

/// Convert an sqlx error into a storage error, keeping the database code.
pub fn storage_error(e: sqlx::Error) -> DbError {
    let code = e
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned());

    DbError::Storage {
        code,
        message: e.to_string(),
    }
}

fn bind_error(e: sqlx::error::BoxDynError) -> DbError {
    DbError::storage(e.to_string())
}

/// Bind parameter values to SqliteArguments, in order.
pub fn bind_values<'q>(params: &[Value]) -> Result<SqliteArguments<'q>, DbError> {
    let mut args = SqliteArguments::default();
    for value in params {
        bind_value(&mut args, value)?;
    }
    Ok(args)
}

/// Bind a Value to SqliteArguments.
///
/// Booleans become 0/1 and string lists their JSON text, matching how rows
/// are stored.
fn bind_value(args: &mut SqliteArguments<'_>, value: &Value) -> Result<(), DbError> {
    match value {
        Value::String(s) => args.add(s.clone()).map_err(bind_error)?,
        Value::Int(n) => args.add(*n).map_err(bind_error)?,
        Value::Float(n) => args.add(*n).map_err(bind_error)?,
        Value::Bool(b) => args.add(i64::from(*b)).map_err(bind_error)?,
        Value::Strings(v) => {
            let text = serde_json::to_string(v)?;
            args.add(text).map_err(bind_error)?
        }
        Value::Datetime(ts) => args.add(ts.to_string()).map_err(bind_error)?,
        Value::Null => args.add(None::<String>).map_err(bind_error)?,
    }
    Ok(())
}

/// Deserialize a SQLite row into a JSON row, keeping column order.
pub fn row_to_json(row: &SqliteRow) -> Result<Row, DbError> {
    let mut obj = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        obj.insert(column.name().to_string(), extract_column_value(row, idx)?);
    }
    Ok(obj)
}

/// Extract a column value from a row as JSON, by its runtime storage class.
fn extract_column_value(row: &SqliteRow, idx: usize) -> Result<Json, DbError> {
    let raw = row.try_get_raw(idx).map_err(storage_error)?;
    if raw.is_null() {
        return Ok(Json::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "INTEGER" | "BOOLEAN" => {
            let v: i64 = row.try_get_unchecked(idx).map_err(storage_error)?;
            Json::from(v)
        }
        "REAL" => {
            let v: f64 = row.try_get_unchecked(idx).map_err(storage_error)?;
            serde_json::Number::from_f64(v)
                .map(Json::Number)
                .unwrap_or(Json::Null)
        }
        "BLOB" => {
            let v: Vec<u8> = row.try_get_unchecked(idx).map_err(storage_error)?;
            Json::from(v)
        }
        _ => {
            // Default: treat as text (TEXT, DATETIME, etc.)
            let v: String = row.try_get_unchecked(idx).map_err(storage_error)?;
            Json::String(v)
        }
    };

    Ok(value)
}

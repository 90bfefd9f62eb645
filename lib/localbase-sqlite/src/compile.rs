//! Compilation of query descriptions to parameterized SQLite SQL.
//!
//! Everything here is pure: the same description always yields the same SQL
//! text and parameter order. Parameters use anonymous `?` placeholders, so
//! `params` is bound in order.

use localbase::{DbError, Filter, Order, Query, Row, Value, validate_identifier};

/// A compiled WHERE clause and the parameters it binds, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    /// Empty, or `" WHERE ..."` with a leading space.
    pub sql: String,
    pub params: Vec<Value>,
}

/// A full statement ready for binding.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Double-quote a validated identifier.
pub fn quote_ident(name: &str) -> Result<String, DbError> {
    Ok(format!("\"{}\"", validate_identifier(name)?))
}

/// Build a WHERE clause from filters, AND-ing them in order.
pub fn compile_filters(filters: &[Filter]) -> Result<WhereClause, DbError> {
    if filters.is_empty() {
        return Ok(WhereClause::default());
    }

    let mut clauses = Vec::with_capacity(filters.len());
    let mut params = Vec::new();

    for filter in filters {
        let field = quote_ident(filter.field())?;
        let clause = match filter {
            Filter::Eq(_, value) => compare(&field, "=", value, &mut params),
            Filter::Ne(_, value) => compare(&field, "!=", value, &mut params),
            Filter::Gt(_, value) => compare(&field, ">", value, &mut params),
            Filter::Gte(_, value) => compare(&field, ">=", value, &mut params),
            Filter::Lt(_, value) => compare(&field, "<", value, &mut params),
            Filter::Lte(_, value) => compare(&field, "<=", value, &mut params),
            Filter::In(_, values) => {
                if values.is_empty() {
                    // Valid SQL that matches nothing
                    "0 = 1".to_string()
                } else {
                    params.extend(values.iter().cloned());
                    let placeholders = vec!["?"; values.len()].join(", ");
                    format!("{} IN ({})", field, placeholders)
                }
            }
            Filter::Contains(_, elements) => {
                if elements.is_empty() {
                    "0 = 1".to_string()
                } else {
                    let terms: Vec<String> = elements
                        .iter()
                        .map(|element| {
                            params.push(Value::String(element.clone()));
                            array_has_text(&field)
                        })
                        .collect();
                    format!("({})", terms.join(" OR "))
                }
            }
            Filter::IsNull(_) => format!("{} IS NULL", field),
            Filter::IsNotNull(_) => format!("{} IS NOT NULL", field),
        };
        clauses.push(clause);
    }

    Ok(WhereClause {
        sql: format!(" WHERE {}", clauses.join(" AND ")),
        params,
    })
}

fn compare(field: &str, op: &str, value: &Value, params: &mut Vec<Value>) -> String {
    params.push(value.clone());
    format!("{} {} ?", field, op)
}

/// Membership test of one bound string against a JSON-text array column.
///
/// Elements are compared whole, so `ai` never matches inside `aiops` or an
/// escaped element like `x","ai`. Malformed or NULL column text matches
/// nothing instead of raising a JSON error.
fn array_has_text(field: &str) -> String {
    format!(
        "CASE WHEN json_valid({f}) THEN EXISTS (SELECT 1 FROM json_each({f}) \
         WHERE json_each.type = 'text' AND json_each.value = ?) ELSE 0 END",
        f = field
    )
}

/// Build ORDER BY clause.
fn build_order_clause(order: &Option<(String, Order)>) -> Result<String, DbError> {
    let Some((field, order)) = order else {
        return Ok(String::new());
    };

    let dir = match order {
        Order::Asc => "ASC",
        Order::Desc => "DESC",
    };
    Ok(format!(" ORDER BY {} {}", quote_ident(field)?, dir))
}

pub fn select_sql(query: &Query) -> Result<Statement, DbError> {
    let table = quote_ident(&query.table)?;
    let clause = compile_filters(&query.filters)?;
    let order_clause = build_order_clause(&query.order)?;

    let mut sql = format!("SELECT * FROM {}{}{}", table, clause.sql, order_clause);
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT {}", limit));
    }

    Ok(Statement {
        sql,
        params: clause.params,
    })
}

pub fn count_sql(query: &Query) -> Result<Statement, DbError> {
    let table = quote_ident(&query.table)?;
    let clause = compile_filters(&query.filters)?;

    Ok(Statement {
        sql: format!("SELECT COUNT(*) FROM {}{}", table, clause.sql),
        params: clause.params,
    })
}

/// Build INSERT SQL for one row; columns follow the row's key order.
pub fn insert_sql(table: &str, row: &Row) -> Result<Statement, DbError> {
    let table = quote_ident(table)?;
    if row.is_empty() {
        return Ok(Statement {
            sql: format!("INSERT INTO {} DEFAULT VALUES", table),
            params: Vec::new(),
        });
    }

    let mut cols = Vec::with_capacity(row.len());
    let mut params = Vec::with_capacity(row.len());
    for (column, value) in row {
        cols.push(quote_ident(column)?);
        params.push(Value::from(value));
    }

    let placeholders = vec!["?"; cols.len()].join(", ");
    Ok(Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            cols.join(", "),
            placeholders
        ),
        params,
    })
}

pub fn update_sql(table: &str, values: &Row, filters: &[Filter]) -> Result<Statement, DbError> {
    let table = quote_ident(table)?;

    let mut assignments = Vec::with_capacity(values.len());
    let mut params = Vec::with_capacity(values.len());
    for (column, value) in values {
        assignments.push(format!("{} = ?", quote_ident(column)?));
        params.push(Value::from(value));
    }

    let clause = compile_filters(filters)?;
    params.extend(clause.params);

    Ok(Statement {
        sql: format!("UPDATE {} SET {}{}", table, assignments.join(", "), clause.sql),
        params,
    })
}

pub fn delete_sql(table: &str, filters: &[Filter]) -> Result<Statement, DbError> {
    let table = quote_ident(table)?;
    let clause = compile_filters(filters)?;

    Ok(Statement {
        sql: format!("DELETE FROM {}{}", table, clause.sql),
        params: clause.params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eq(field: &str, value: impl Into<Value>) -> Filter {
        Filter::Eq(field.to_string(), value.into())
    }

    #[test]
    fn no_filters_no_clause() {
        let clause = compile_filters(&[]).unwrap();
        assert_eq!(clause, WhereClause::default());
    }

    #[test]
    fn comparisons_are_anded_in_order() {
        let clause = compile_filters(&[
            eq("title", "demo"),
            Filter::Ne("status".into(), "draft".into()),
            Filter::Gte("votes".into(), 3i64.into()),
            Filter::Lt("created_at".into(), "2024-01-01".into()),
        ])
        .unwrap();

        assert_eq!(
            clause.sql,
            " WHERE \"title\" = ? AND \"status\" != ? AND \"votes\" >= ? AND \"created_at\" < ?"
        );
        assert_eq!(
            clause.params,
            vec![
                Value::String("demo".into()),
                Value::String("draft".into()),
                Value::Int(3),
                Value::String("2024-01-01".into()),
            ]
        );
    }

    #[test]
    fn in_expands_placeholders() {
        let clause = compile_filters(&[Filter::In(
            "id".into(),
            vec!["a".into(), "b".into(), "c".into()],
        )])
        .unwrap();
        assert_eq!(clause.sql, " WHERE \"id\" IN (?, ?, ?)");
        assert_eq!(clause.params.len(), 3);
    }

    #[test]
    fn empty_in_matches_nothing() {
        let clause = compile_filters(&[eq("a", 1i64), Filter::In("id".into(), vec![])]).unwrap();
        assert_eq!(clause.sql, " WHERE \"a\" = ? AND 0 = 1");
        assert_eq!(clause.params, vec![Value::Int(1)]);
    }

    #[test]
    fn contains_binds_raw_elements() {
        let clause = compile_filters(&[Filter::Contains(
            "tags".into(),
            vec!["ai".into(), "say \"hi\"".into()],
        )])
        .unwrap();

        let term = "CASE WHEN json_valid(\"tags\") THEN EXISTS (SELECT 1 FROM json_each(\"tags\") \
                    WHERE json_each.type = 'text' AND json_each.value = ?) ELSE 0 END";
        assert_eq!(clause.sql, format!(" WHERE ({term} OR {term})"));
        assert_eq!(
            clause.params,
            vec![
                Value::String("ai".into()),
                Value::String("say \"hi\"".into()),
            ]
        );
    }

    #[test]
    fn empty_contains_matches_nothing() {
        let clause = compile_filters(&[Filter::Contains("tags".into(), vec![])]).unwrap();
        assert_eq!(clause.sql, " WHERE 0 = 1");
        assert!(clause.params.is_empty());
    }

    #[test]
    fn null_checks_bind_nothing() {
        let clause = compile_filters(&[
            Filter::IsNull("deleted_at".into()),
            Filter::IsNotNull("user_id".into()),
        ])
        .unwrap();
        assert_eq!(
            clause.sql,
            " WHERE \"deleted_at\" IS NULL AND \"user_id\" IS NOT NULL"
        );
        assert!(clause.params.is_empty());
    }

    #[test]
    fn compilation_is_deterministic() {
        let filters = vec![
            eq("a", "x"),
            Filter::Contains("tags".into(), vec!["ai".into()]),
        ];
        assert_eq!(
            compile_filters(&filters).unwrap(),
            compile_filters(&filters).unwrap()
        );
    }

    #[test]
    fn rejects_bad_identifiers() {
        assert!(matches!(
            compile_filters(&[eq("title = '' OR 1=1 --", "x")]),
            Err(DbError::InvalidIdentifier(_))
        ));
        assert!(select_sql(&Query::for_table("users; drop table users")).is_err());
    }

    #[test]
    fn select_with_order_and_limit() {
        let query = Query::for_table("projects")
            .eq("user_id", "u1")
            .order_by("created_at", Order::Desc)
            .limit(5);
        let stmt = select_sql(&query).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM \"projects\" WHERE \"user_id\" = ? ORDER BY \"created_at\" DESC LIMIT 5"
        );
    }

    #[test]
    fn count_ignores_order_and_limit() {
        let query = Query::for_table("votes")
            .eq("project_id", "p1")
            .order_by("created_at", Order::Asc)
            .limit(1);
        let stmt = count_sql(&query).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT COUNT(*) FROM \"votes\" WHERE \"project_id\" = ?"
        );
    }

    #[test]
    fn insert_and_update_follow_key_order() {
        let row = match json!({"id": "p1", "title": "demo", "featured": 1}) {
            serde_json::Value::Object(map) => map,
            _ => Row::new(),
        };

        let insert = insert_sql("projects", &row).unwrap();
        assert_eq!(
            insert.sql,
            "INSERT INTO \"projects\" (\"id\", \"title\", \"featured\") VALUES (?, ?, ?)"
        );
        assert_eq!(insert.params[2], Value::Int(1));

        let update = update_sql("projects", &row, &[eq("id", "p1")]).unwrap();
        assert_eq!(
            update.sql,
            "UPDATE \"projects\" SET \"id\" = ?, \"title\" = ?, \"featured\" = ? WHERE \"id\" = ?"
        );
        assert_eq!(update.params.len(), 4);
    }

    #[test]
    fn delete_statement() {
        let stmt = delete_sql("comments", &[eq("id", "c1")]).unwrap();
        assert_eq!(stmt.sql, "DELETE FROM \"comments\" WHERE \"id\" = ?");
    }
}

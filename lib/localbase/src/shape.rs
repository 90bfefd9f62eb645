//! Select shapes: which columns to return and which relations to attach.
//!
//! A shape is parsed once from the hosted-client string syntax, e.g.
//! `"*, user:users(*)"` or `"id, title, project:projects(*, user:users(id, username))"`,
//! or built directly with [`Shape::all`] and [`Shape::with_relation`].
//!
//! Grammar, comma-separated at each nesting level:
//!
//! - `*` every stored column
//! - `column`
//! - `alias:column` the column renamed to `alias`
//! - `table(shape)` relation attached under `table`
//! - `alias:table(shape)` relation attached under `alias`
//! - `alias:table!fk_column(shape)` relation with an explicit foreign key
//!
//! Without an explicit foreign key a relation is looked up through
//! `<alias>_id`.

use serde_json::Value;

use crate::{DbError, Row};

/// A requested column, possibly renamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub alias: Option<String>,
}

impl Column {
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A single-hop relation to attach to each row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Key the related row is attached under.
    pub alias: String,
    /// Table holding the related row, looked up by its `id`.
    pub table: String,
    /// Column on the parent row holding the related row's id.
    pub foreign_key: String,
    /// Shape applied to the related row.
    pub shape: Shape,
}

impl Relation {
    /// Relation with the conventional `<alias>_id` foreign key and all columns.
    pub fn new(alias: impl Into<String>, table: impl Into<String>) -> Self {
        let alias = alias.into();
        Self {
            foreign_key: format!("{}_id", alias),
            alias,
            table: table.into(),
            shape: Shape::all(),
        }
    }

    pub fn foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_key = column.into();
        self
    }

    pub fn shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    /// `*` was requested.
    pub all_columns: bool,
    pub columns: Vec<Column>,
    pub relations: Vec<Relation>,
}

impl Default for Shape {
    fn default() -> Self {
        Self::all()
    }
}

impl Shape {
    pub fn all() -> Self {
        Self {
            all_columns: true,
            columns: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            all_columns: false,
            columns: columns
                .into_iter()
                .map(|c| Column {
                    name: c.into(),
                    alias: None,
                })
                .collect(),
            relations: Vec::new(),
        }
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    /// Parse the hosted-client select syntax. An empty string selects `*`.
    pub fn parse(input: &str) -> Result<Self, DbError> {
        if input.trim().is_empty() {
            return Ok(Self::all());
        }

        let mut shape = Shape {
            all_columns: false,
            columns: Vec::new(),
            relations: Vec::new(),
        };

        for token in split_top_level(input)? {
            let token = token.trim();
            if token.is_empty() {
                return Err(DbError::InvalidShape(format!("empty item in '{}'", input)));
            }

            if token == "*" {
                shape.all_columns = true;
            } else if let Some(open) = token.find('(') {
                shape.relations.push(parse_relation(token, open)?);
            } else {
                shape.columns.push(parse_column(token)?);
            }
        }

        Ok(shape)
    }

    /// Reduce a fully expanded row to the requested output.
    ///
    /// Relation aliases and their foreign-key columns are always kept.
    pub fn project(&self, mut row: Row) -> Row {
        if self.all_columns && self.columns.iter().all(|c| c.alias.is_none()) {
            return row;
        }

        let mut out = if self.all_columns {
            row.clone()
        } else {
            Row::new()
        };

        for column in &self.columns {
            let value = row.get(&column.name).cloned().unwrap_or(Value::Null);
            out.insert(column.output_name().to_string(), value);
        }

        for relation in &self.relations {
            if let Some(fk) = row.remove(&relation.foreign_key) {
                out.entry(relation.foreign_key.clone()).or_insert(fk);
            }
            let related = row.remove(&relation.alias).unwrap_or(Value::Null);
            out.insert(relation.alias.clone(), related);
        }

        out
    }
}

impl std::str::FromStr for Shape {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Shape::parse(s)
    }
}

/// Check a name is a plain SQL identifier.
pub fn validate_identifier(name: &str) -> Result<&str, DbError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(name)
    } else {
        Err(DbError::InvalidIdentifier(name.to_string()))
    }
}

fn split_top_level(input: &str) -> Result<Vec<&str>, DbError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (idx, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    DbError::InvalidShape(format!("unbalanced ')' in '{}'", input))
                })?;
            }
            ',' if depth == 0 => {
                parts.push(&input[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return Err(DbError::InvalidShape(format!("unclosed '(' in '{}'", input)));
    }
    parts.push(&input[start..]);
    Ok(parts)
}

fn parse_column(token: &str) -> Result<Column, DbError> {
    let (alias, name) = match token.split_once(':') {
        Some((alias, name)) => (Some(alias.trim()), name.trim()),
        None => (None, token),
    };

    validate_identifier(name).map_err(|_| invalid_item(token))?;
    if let Some(alias) = alias {
        validate_identifier(alias).map_err(|_| invalid_item(token))?;
    }

    Ok(Column {
        name: name.to_string(),
        alias: alias.map(str::to_string),
    })
}

fn parse_relation(token: &str, open: usize) -> Result<Relation, DbError> {
    if !token.ends_with(')') {
        return Err(invalid_item(token));
    }

    let head = token[..open].trim();
    let inner = &token[open + 1..token.len() - 1];

    let (alias, target) = match head.split_once(':') {
        Some((alias, target)) => (Some(alias.trim()), target.trim()),
        None => (None, head),
    };
    let (table, foreign_key) = match target.split_once('!') {
        Some((table, fk)) => (table.trim(), Some(fk.trim())),
        None => (target, None),
    };
    let alias = alias.unwrap_or(table);

    for name in [alias, table].into_iter().chain(foreign_key) {
        validate_identifier(name).map_err(|_| invalid_item(token))?;
    }

    let mut relation = Relation::new(alias, table).shape(Shape::parse(inner)?);
    if let Some(fk) = foreign_key {
        relation = relation.foreign_key(fk);
    }
    Ok(relation)
}

fn invalid_item(token: &str) -> DbError {
    DbError::InvalidShape(format!("cannot parse '{}'", token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => Row::new(),
        }
    }

    #[test]
    fn star_with_aliased_relation() {
        let shape = Shape::parse("*, user:users(*)").unwrap();
        assert!(shape.all_columns);
        assert!(shape.columns.is_empty());
        assert_eq!(shape.relations, vec![Relation::new("user", "users")]);
        assert_eq!(shape.relations[0].foreign_key, "user_id");
    }

    #[test]
    fn nested_relations() {
        let shape = Shape::parse("*, project:projects(*, user:users(id, username))").unwrap();
        let project = &shape.relations[0];
        assert_eq!(project.table, "projects");
        assert_eq!(project.foreign_key, "project_id");

        let user = &project.shape.relations[0];
        assert_eq!(user.alias, "user");
        assert!(!user.shape.all_columns);
        assert_eq!(
            user.shape.columns,
            vec![
                Column {
                    name: "id".into(),
                    alias: None
                },
                Column {
                    name: "username".into(),
                    alias: None
                },
            ]
        );
    }

    #[test]
    fn explicit_foreign_key_and_bare_table() {
        let shape = Shape::parse("id, owner:users!created_by(*), grants(*)").unwrap();
        assert_eq!(shape.relations[0].foreign_key, "created_by");
        assert_eq!(shape.relations[0].alias, "owner");
        assert_eq!(shape.relations[1].alias, "grants");
        assert_eq!(shape.relations[1].foreign_key, "grants_id");
    }

    #[test]
    fn empty_is_all() {
        assert_eq!(Shape::parse("  ").unwrap(), Shape::all());
    }

    #[test]
    fn rejects_malformed() {
        for bad in [
            "*, user:users(*",
            "*, user:users(*))",
            "id,,title",
            "id; drop table users",
            "user:users(*)x",
        ] {
            assert!(
                matches!(Shape::parse(bad), Err(DbError::InvalidShape(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn projection_keeps_requested_columns_and_relations() {
        let shape = Shape::parse("title, name:username, user:users(*)").unwrap();
        let projected = shape.project(row(json!({
            "id": "p1",
            "title": "demo",
            "username": "kevin",
            "user_id": "u1",
            "user": {"id": "u1"},
        })));

        assert_eq!(
            Value::Object(projected),
            json!({
                "title": "demo",
                "name": "kevin",
                "user_id": "u1",
                "user": {"id": "u1"},
            })
        );
    }

    #[test]
    fn star_projection_is_identity() {
        let original = row(json!({"id": "p1", "tags": ["ai"]}));
        assert_eq!(Shape::all().project(original.clone()), original);
    }

    #[test]
    fn identifiers() {
        assert!(validate_identifier("user_id").is_ok());
        assert!(validate_identifier("_x1").is_ok());
        assert!(validate_identifier("1x").is_err());
        assert!(validate_identifier("a b").is_err());
        assert!(validate_identifier("").is_err());
    }
}

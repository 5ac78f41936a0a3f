//! SQL query constants and builders
//!
//! Static statements for the community and membership relations, plus the
//! builders that assemble filtered selects and partial updates. Builders
//! collect `(column, placeholder, value)` triples in call order and render
//! the statement text and the positional arguments together.

use crate::error::{validation_error, AppError};
use postgres_types::ToSql;
use uuid::Uuid;

/// Marker every read, update and delete on a soft-deletable table carries
pub const ACTIVE_PREDICATE: &str = "deleted_at IS NULL";

/// Columns returned for a community row, in the order rows are decoded
pub const COMMUNITY_COLUMNS: &str = "id, name, description, location, created_at, updated_at";

pub const INSERT_COMMUNITY: &str = r#"
    INSERT INTO communities (name, description, location, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, name, description, location, created_at, updated_at
"#;

pub const GET_COMMUNITY: &str = r#"
    SELECT id, name, description, location, created_at, updated_at
    FROM communities
    WHERE deleted_at IS NULL AND id = $1
"#;

/// Does not check whether a row matched
pub const SOFT_DELETE_COMMUNITY: &str = r#"
    UPDATE communities
    SET deleted_at = NOW()
    WHERE id = $1 AND deleted_at IS NULL
"#;

pub const COMMUNITY_EXISTS: &str = r#"
    SELECT EXISTS(
        SELECT 1 FROM communities WHERE deleted_at IS NULL AND id = $1
    ) AS is_valid
"#;

pub const INSERT_MEMBERSHIP: &str = r#"
    INSERT INTO community_members (community_id, user_id, joined_at)
    VALUES ($1, $2, $3)
    RETURNING community_id, user_id, joined_at, created_at, updated_at
"#;

pub const SOFT_DELETE_MEMBERSHIP: &str = r#"
    UPDATE community_members
    SET deleted_at = NOW(), updated_at = NOW()
    WHERE community_id = $1 AND user_id = $2 AND deleted_at IS NULL
"#;

/// A positional statement argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlArg {
    Text(String),
    BigInt(i64),
    Uuid(Uuid),
}

impl SqlArg {
    /// Borrow the inner value as a driver parameter
    pub fn as_param(&self) -> &(dyn ToSql + Sync) {
        match self {
            SqlArg::Text(v) => v,
            SqlArg::BigInt(v) => v,
            SqlArg::Uuid(v) => v,
        }
    }
}

impl From<&str> for SqlArg {
    fn from(v: &str) -> Self {
        SqlArg::Text(v.to_string())
    }
}

impl From<String> for SqlArg {
    fn from(v: String) -> Self {
        SqlArg::Text(v)
    }
}

impl From<i64> for SqlArg {
    fn from(v: i64) -> Self {
        SqlArg::BigInt(v)
    }
}

impl From<Uuid> for SqlArg {
    fn from(v: Uuid) -> Self {
        SqlArg::Uuid(v)
    }
}

/// Rendered statement text with its positional arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<SqlArg>,
}

impl Statement {
    pub fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.args.iter().map(SqlArg::as_param).collect()
    }
}

/// Builder for filtered `SELECT` statements over a soft-deletable table
///
/// The active-row predicate is always the first predicate; equality
/// filters follow in the order they were added. `LIMIT` always renders
/// before `OFFSET`.
#[derive(Debug)]
pub struct SelectBuilder {
    columns: &'static str,
    table: &'static str,
    predicates: Vec<String>,
    args: Vec<SqlArg>,
    order_by: Option<&'static str>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl SelectBuilder {
    pub fn new(columns: &'static str, table: &'static str) -> Self {
        Self {
            columns,
            table,
            predicates: vec![ACTIVE_PREDICATE.to_string()],
            args: Vec::new(),
            order_by: None,
            limit: None,
            offset: None,
        }
    }

    fn next_placeholder(&self) -> usize {
        self.args.len() + 1
    }

    /// Append `column = $n` when a value is present
    pub fn filter_eq(mut self, column: &'static str, value: Option<impl Into<SqlArg>>) -> Self {
        if let Some(value) = value {
            let placeholder = self.next_placeholder();
            self.predicates.push(format!("{} = ${}", column, placeholder));
            self.args.push(value.into());
        }
        self
    }

    pub fn order_by(mut self, order: &'static str) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn limit(mut self, limit: Option<i64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: Option<i64>) -> Self {
        self.offset = offset;
        self
    }

    pub fn build(mut self) -> Statement {
        let mut sql = format!(
            "SELECT {} FROM {} WHERE {}",
            self.columns,
            self.table,
            self.predicates.join(" AND ")
        );

        if let Some(order) = self.order_by {
            sql.push_str(&format!(" ORDER BY {}", order));
        }

        if let Some(limit) = self.limit {
            let placeholder = self.next_placeholder();
            sql.push_str(&format!(" LIMIT ${}", placeholder));
            self.args.push(SqlArg::BigInt(limit));
        }

        if let Some(offset) = self.offset {
            let placeholder = self.next_placeholder();
            sql.push_str(&format!(" OFFSET ${}", placeholder));
            self.args.push(SqlArg::BigInt(offset));
        }

        Statement {
            sql,
            args: self.args,
        }
    }
}

/// Builder for partial `UPDATE` statements over a soft-deletable table
///
/// Only assignments that were set render; `updated_at = NOW()` is always
/// appended. Building with no assignments is a validation error.
#[derive(Debug)]
pub struct UpdateBuilder {
    table: &'static str,
    assignments: Vec<String>,
    args: Vec<SqlArg>,
}

impl UpdateBuilder {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            args: Vec::new(),
        }
    }

    /// Append `column = $n` when a value is present
    pub fn set(mut self, column: &'static str, value: Option<impl Into<SqlArg>>) -> Self {
        if let Some(value) = value {
            let placeholder = self.args.len() + 1;
            self.assignments.push(format!("{} = ${}", column, placeholder));
            self.args.push(value.into());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn build(
        mut self,
        key_column: &'static str,
        key: impl Into<SqlArg>,
        returning: &'static str,
    ) -> Result<Statement, AppError> {
        if self.is_empty() {
            return Err(validation_error("no parameters to update"));
        }

        let key_placeholder = self.args.len() + 1;
        self.args.push(key.into());

        let sql = format!(
            "UPDATE {} SET {}, updated_at = NOW() WHERE {} = ${} AND {} RETURNING {}",
            self.table,
            self.assignments.join(", "),
            key_column,
            key_placeholder,
            ACTIVE_PREDICATE,
            returning
        );

        Ok(Statement {
            sql,
            args: self.args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_select_without_filters_scans_active_rows() {
        let stmt = SelectBuilder::new(COMMUNITY_COLUMNS, "communities")
            .filter_eq("name", None::<String>)
            .filter_eq("location", None::<String>)
            .build();

        assert_eq!(
            stmt.sql,
            "SELECT id, name, description, location, created_at, updated_at \
             FROM communities WHERE deleted_at IS NULL"
        );
        assert!(stmt.args.is_empty());
    }

    #[test]
    fn test_select_filters_follow_declaration_order() {
        let stmt = SelectBuilder::new(COMMUNITY_COLUMNS, "communities")
            .filter_eq("name", Some("rustaceans"))
            .filter_eq("location", Some("Tashkent"))
            .build();

        assert_eq!(
            stmt.sql,
            "SELECT id, name, description, location, created_at, updated_at \
             FROM communities WHERE deleted_at IS NULL AND name = $1 AND location = $2"
        );
        assert_eq!(
            stmt.args,
            vec![SqlArg::Text("rustaceans".into()), SqlArg::Text("Tashkent".into())]
        );
    }

    #[test]
    fn test_select_limit_renders_before_offset() {
        let stmt = SelectBuilder::new(COMMUNITY_COLUMNS, "communities")
            .filter_eq("location", Some("Tashkent"))
            .order_by("created_at, id")
            .offset(Some(1))
            .limit(Some(2))
            .build();

        assert_eq!(
            stmt.sql,
            "SELECT id, name, description, location, created_at, updated_at \
             FROM communities WHERE deleted_at IS NULL AND location = $1 \
             ORDER BY created_at, id LIMIT $2 OFFSET $3"
        );
        assert_eq!(
            stmt.args,
            vec![SqlArg::Text("Tashkent".into()), SqlArg::BigInt(2), SqlArg::BigInt(1)]
        );
        assert_eq!(stmt.params().len(), 3);
    }

    #[test]
    fn test_select_offset_only() {
        let stmt = SelectBuilder::new(COMMUNITY_COLUMNS, "communities")
            .offset(Some(5))
            .build();

        assert!(stmt.sql.ends_with("WHERE deleted_at IS NULL OFFSET $1"));
        assert_eq!(stmt.args, vec![SqlArg::BigInt(5)]);
    }

    #[test]
    fn test_update_renders_present_fields_only() {
        let id = Uuid::new_v4();
        let stmt = UpdateBuilder::new("communities")
            .set("name", Some("new name"))
            .set("description", None::<String>)
            .set("location", Some("Samarkand"))
            .build("id", id, COMMUNITY_COLUMNS)
            .unwrap();

        assert_eq!(
            stmt.sql,
            "UPDATE communities SET name = $1, location = $2, updated_at = NOW() \
             WHERE id = $3 AND deleted_at IS NULL \
             RETURNING id, name, description, location, created_at, updated_at"
        );
        assert_eq!(
            stmt.args,
            vec![
                SqlArg::Text("new name".into()),
                SqlArg::Text("Samarkand".into()),
                SqlArg::Uuid(id),
            ]
        );
    }

    #[test]
    fn test_update_without_fields_is_rejected() {
        let result = UpdateBuilder::new("communities")
            .set("name", None::<String>)
            .build("id", Uuid::nil(), COMMUNITY_COLUMNS);

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}

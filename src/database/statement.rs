use serde_json::{Map, Value};

use crate::query_builder::conditions::{format_value, PredicateSet};
use crate::query_builder::joins::Join;

/// A fetched or written row: column name to dynamic value
pub type Row = Map<String, Value>;

/// Compiled SELECT, ready for an executor
#[derive(Debug, Clone)]
pub struct SelectStatement {
    pub table: String,
    pub columns: Vec<String>,
    pub joins: Vec<Join>,
    pub predicates: PredicateSet,
    pub order_by: Vec<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SelectStatement {
    pub fn to_sql(&self) -> String {
        let mut sql = format!("SELECT {} FROM {}", self.columns.join(", "), self.table);

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }

        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.predicates.to_sql());
        }

        if !self.order_by.is_empty() {
            sql.push_str(&format!(" ORDER BY {}", self.order_by.join(", ")));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        sql
    }

    /// The count variant of this statement: same joins and predicates,
    /// ordering and page bounds stripped
    pub fn to_count_sql(&self) -> String {
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.table);

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }

        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.predicates.to_sql());
        }

        sql
    }
}

/// Compiled INSERT; `returning` names the identity column to read back
#[derive(Debug, Clone)]
pub struct InsertStatement {
    pub table: String,
    pub values: Row,
    pub returning: Option<String>,
}

impl InsertStatement {
    pub fn to_sql(&self) -> String {
        let columns: Vec<&str> = self.values.keys().map(String::as_str).collect();
        let values: Vec<String> = self.values.values().map(format_value).collect();
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            values.join(", ")
        );
        if let Some(returning) = &self.returning {
            sql.push_str(&format!(" RETURNING {returning}"));
        }
        sql
    }
}

/// Compiled UPDATE over every row matching the predicates
#[derive(Debug, Clone)]
pub struct UpdateStatement {
    pub table: String,
    pub assignments: Row,
    pub predicates: PredicateSet,
}

impl UpdateStatement {
    pub fn to_sql(&self) -> String {
        let assignments: Vec<String> = self
            .assignments
            .iter()
            .map(|(column, value)| format!("{} = {}", column, format_value(value)))
            .collect();
        let mut sql = format!("UPDATE {} SET {}", self.table, assignments.join(", "));
        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.predicates.to_sql());
        }
        sql
    }
}

/// Compiled DELETE over every row matching the predicates
#[derive(Debug, Clone)]
pub struct DeleteStatement {
    pub table: String,
    pub predicates: PredicateSet,
}

impl DeleteStatement {
    pub fn to_sql(&self) -> String {
        let mut sql = format!("DELETE FROM {}", self.table);
        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.predicates.to_sql());
        }
        sql
    }
}

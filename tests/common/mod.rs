//! Shared test tooling: an in-memory [`QueryExecutor`] interpreting compiled
//! statements against plain row vectors, plus the fixture model registry the
//! suites share.

#![allow(dead_code)]

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use armature_core::database::{
    DeleteStatement, InsertStatement, QueryExecutor, Row, SelectStatement, UpdateStatement,
};
use armature_core::error::Result;
use armature_core::models::{ModelDef, ModelRegistry};
use armature_core::query_builder::{
    Join, LogicalOperator, Operator, Predicate, PredicateSet, TimestampFormat,
};

/// Executes compiled statements against in-memory tables
#[derive(Default)]
pub struct MemoryExecutor {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    next_ids: Mutex<HashMap<String, i64>>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut tables = self.tables.lock();
        let entry = tables.entry(table.to_string()).or_default();
        for row in rows {
            match row {
                Value::Object(map) => entry.push(map),
                other => panic!("seed rows must be objects, got {other}"),
            }
        }
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables.lock().get(table).cloned().unwrap_or_default()
    }

    pub fn row_by_id(&self, table: &str, id: i64) -> Option<Row> {
        self.rows(table)
            .into_iter()
            .find(|row| row.get("id") == Some(&json!(id)))
    }

    fn select_rows(&self, statement: &SelectStatement) -> Vec<Row> {
        let tables = self.tables.lock();
        let base = tables
            .get(&statement.table)
            .cloned()
            .unwrap_or_default();

        // expand joins into evaluation contexts carrying qualified keys for
        // both sides; the result row stays the base-table row
        let mut contexts: Vec<(Row, Row)> = base
            .into_iter()
            .map(|row| {
                let mut context = row.clone();
                for (key, value) in &row {
                    context.insert(format!("{}.{}", statement.table, key), value.clone());
                }
                (row, context)
            })
            .collect();

        for join in &statement.joins {
            contexts = apply_join(&tables, contexts, join);
        }

        let mut matched: Vec<Row> = contexts
            .into_iter()
            .filter(|(_, context)| predicates_match(&statement.predicates, context))
            .map(|(row, _)| row)
            .collect();

        for order in statement.order_by.iter().rev() {
            sort_rows(&mut matched, order);
        }

        matched
    }
}

fn apply_join(
    tables: &HashMap<String, Vec<Row>>,
    contexts: Vec<(Row, Row)>,
    join: &Join,
) -> Vec<(Row, Row)> {
    let join_rows = tables.get(&join.table).cloned().unwrap_or_default();
    let (left, right) = join
        .on_condition
        .split_once(" = ")
        .expect("join condition must be <a> = <b>");

    let mut expanded = Vec::new();
    for (row, context) in contexts {
        for join_row in &join_rows {
            let mut candidate = context.clone();
            for (key, value) in join_row {
                candidate.insert(format!("{}.{}", join.table, key), value.clone());
            }
            let lhs = lookup(&candidate, left);
            let rhs = lookup(&candidate, right);
            if lhs.is_some() && lhs == rhs {
                expanded.push((row.clone(), candidate));
            }
        }
    }
    expanded
}

fn lookup<'a>(row: &'a Row, column: &str) -> Option<&'a Value> {
    if let Some(value) = row.get(column) {
        return Some(value);
    }
    column
        .split_once('.')
        .and_then(|(_, bare)| row.get(bare))
}

fn predicates_match(predicates: &PredicateSet, row: &Row) -> bool {
    let mut result = true;
    for (index, predicate) in predicates.iter().enumerate() {
        let matched = predicate_matches(predicate, row);
        if index == 0 {
            result = matched;
        } else {
            match predicate.join {
                LogicalOperator::And => result = result && matched,
                LogicalOperator::Or => result = result || matched,
            }
        }
    }
    result
}

fn predicate_matches(predicate: &Predicate, row: &Row) -> bool {
    let actual = lookup(row, &predicate.column);
    match predicate.operator {
        Operator::Is => actual.is_none_or(Value::is_null),
        Operator::IsNot => actual.is_some_and(|v| !v.is_null()),
        Operator::In => match (&predicate.value, actual) {
            (Value::Array(values), Some(actual)) => values.contains(actual),
            _ => false,
        },
        Operator::Eq => match actual {
            Some(actual) if !actual.is_null() && !predicate.value.is_null() => {
                actual == &predicate.value
            }
            _ => false,
        },
        Operator::NotEq => match actual {
            Some(actual) if !actual.is_null() && !predicate.value.is_null() => {
                actual != &predicate.value
            }
            _ => false,
        },
        Operator::Like => match actual {
            Some(Value::String(actual)) => like_matches(actual, &predicate.value),
            Some(actual) if !actual.is_null() => {
                like_matches(&actual.to_string(), &predicate.value)
            }
            _ => false,
        },
        Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte => {
            let Some(ordering) = compare(actual, &predicate.value) else {
                return false;
            };
            match predicate.operator {
                Operator::Lt => ordering.is_lt(),
                Operator::Lte => ordering.is_le(),
                Operator::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }
        }
    }
}

fn like_matches(actual: &str, pattern: &Value) -> bool {
    let pattern = match pattern {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let leading = pattern.starts_with('%');
    let trailing = pattern.ends_with('%') && pattern.len() > 1;
    let needle = pattern.trim_matches('%');
    match (leading, trailing) {
        (true, true) => actual.contains(needle),
        (false, true) => actual.starts_with(needle),
        (true, false) => actual.ends_with(needle),
        (false, false) => actual == needle,
    }
}

fn compare(actual: Option<&Value>, expected: &Value) -> Option<std::cmp::Ordering> {
    let actual = actual?;
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn sort_rows(rows: &mut [Row], order: &str) {
    let (column, direction) = order
        .rsplit_once(' ')
        .unwrap_or((order, "ASC"));
    rows.sort_by(|a, b| {
        let other = lookup(b, column).cloned().unwrap_or(Value::Null);
        let ordering = compare(lookup(a, column), &other).unwrap_or(std::cmp::Ordering::Equal);
        if direction.eq_ignore_ascii_case("DESC") {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn fetch_all(&self, statement: &SelectStatement) -> Result<Vec<Row>> {
        let mut rows = self.select_rows(statement);
        let offset = statement.offset.unwrap_or(0) as usize;
        rows = rows.into_iter().skip(offset).collect();
        if let Some(limit) = statement.limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }

    async fn fetch_optional(&self, statement: &SelectStatement) -> Result<Option<Row>> {
        Ok(self.fetch_all(statement).await?.into_iter().next())
    }

    async fn count(&self, statement: &SelectStatement) -> Result<i64> {
        Ok(self.select_rows(statement).len() as i64)
    }

    async fn insert(&self, statement: &InsertStatement) -> Result<Value> {
        let mut row = statement.values.clone();
        let id = match statement.returning.as_deref() {
            Some(pk) => {
                if row.get(pk).is_none_or(Value::is_null) {
                    let mut next_ids = self.next_ids.lock();
                    let next = next_ids.entry(statement.table.clone()).or_insert(1000);
                    *next += 1;
                    let id = json!(*next);
                    row.insert(pk.to_string(), id.clone());
                    id
                } else {
                    row[pk].clone()
                }
            }
            None => Value::Null,
        };
        self.tables
            .lock()
            .entry(statement.table.clone())
            .or_default()
            .push(row);
        Ok(id)
    }

    async fn update(&self, statement: &UpdateStatement) -> Result<u64> {
        let mut tables = self.tables.lock();
        let rows = tables.entry(statement.table.clone()).or_default();
        let mut affected = 0;
        for row in rows.iter_mut() {
            let mut context = row.clone();
            for (key, value) in row.iter() {
                context.insert(format!("{}.{}", statement.table, key), value.clone());
            }
            if predicates_match(&statement.predicates, &context) {
                for (column, value) in &statement.assignments {
                    row.insert(column.clone(), value.clone());
                }
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn delete(&self, statement: &DeleteStatement) -> Result<u64> {
        let mut tables = self.tables.lock();
        let rows = tables.entry(statement.table.clone()).or_default();
        let before = rows.len();
        rows.retain(|row| {
            let mut context = row.clone();
            for (key, value) in row.iter() {
                context.insert(format!("{}.{}", statement.table, key), value.clone());
            }
            !predicates_match(&statement.predicates, &context)
        });
        Ok((before - rows.len()) as u64)
    }
}

/// The fixture model graph shared by the integration suites: authors with
/// counted articles, soft-deletable/publishable articles, counted comments,
/// tags through a join table, and polymorphic images.
pub fn registry() -> ModelRegistry {
    ModelRegistry::builder()
        .model(
            ModelDef::new("author", "authors").columns(["id", "name", "articles_count"]),
        )
        .model(
            ModelDef::new("article", "articles")
                .columns([
                    "id",
                    "author_id",
                    "title",
                    "status",
                    "city",
                    "deleted_at",
                    "published_at",
                    "comments_count",
                ])
                .soft_delete("deleted_at", TimestampFormat::Epoch)
                .publish_window("published_at", TimestampFormat::Epoch)
                .belongs_to("author", "author", "author_id")
                .has_many("comments", "comment", "article_id")
                .has_many_through("tags", "tag", "article_tags", "article_id", "tag_id")
                .polymorphic_has_many("images", "image", "imageable"),
        )
        .model(
            ModelDef::new("comment", "comments")
                .columns(["id", "article_id", "body", "deleted_at"])
                .soft_delete("deleted_at", TimestampFormat::Epoch)
                .belongs_to("article", "article", "article_id"),
        )
        .model(ModelDef::new("tag", "tags").columns(["id", "name"]))
        .model(
            ModelDef::new("image", "images")
                .columns(["id", "imageable_id", "imageable_type", "path"])
                .polymorphic_belongs_to("imageable"),
        )
        .build()
        .expect("fixture registry must build")
}

pub const PAST: i64 = 1_000_000_000;
pub const FUTURE: i64 = 4_102_444_800;

/// Seeded executor: two authors, four articles (one deleted, one future-
/// published, one unpublished), comments, tags, and images
pub fn seeded_executor() -> MemoryExecutor {
    let executor = MemoryExecutor::new();
    executor.seed(
        "authors",
        vec![
            json!({"id": 1, "name": "Alexei", "articles_count": 0}),
            json!({"id": 2, "name": "Marina", "articles_count": 0}),
        ],
    );
    executor.seed(
        "articles",
        vec![
            json!({"id": 1, "author_id": 1, "title": "Rust at the lake", "status": "active",
                   "city": "Irkutsk", "deleted_at": null, "published_at": PAST,
                   "comments_count": 0}),
            json!({"id": 2, "author_id": 1, "title": "Winter drafts", "status": "active",
                   "city": "Irkutsk", "deleted_at": null, "published_at": null,
                   "comments_count": 0}),
            json!({"id": 3, "author_id": 2, "title": "Scheduled story", "status": "active",
                   "city": "Omsk", "deleted_at": null, "published_at": FUTURE,
                   "comments_count": 0}),
            json!({"id": 4, "author_id": 2, "title": "Gone fishing", "status": "retired",
                   "city": "Omsk", "deleted_at": PAST, "published_at": PAST,
                   "comments_count": 0}),
        ],
    );
    executor.seed(
        "comments",
        vec![
            json!({"id": 1, "article_id": 1, "body": "first", "deleted_at": null}),
            json!({"id": 2, "article_id": 1, "body": "second", "deleted_at": null}),
            json!({"id": 3, "article_id": 1, "body": "spam", "deleted_at": PAST}),
        ],
    );
    executor.seed(
        "tags",
        vec![
            json!({"id": 1, "name": "rust"}),
            json!({"id": 2, "name": "travel"}),
            json!({"id": 3, "name": "cooking"}),
        ],
    );
    executor.seed(
        "article_tags",
        vec![
            json!({"id": 1, "article_id": 1, "tag_id": 1}),
            json!({"id": 2, "article_id": 1, "tag_id": 2}),
            json!({"id": 3, "article_id": 2, "tag_id": 3}),
        ],
    );
    executor.seed(
        "images",
        vec![
            json!({"id": 1, "imageable_id": 1, "imageable_type": "article", "path": "lake.jpg"}),
            json!({"id": 2, "imageable_id": 1, "imageable_type": "article", "path": "shore.jpg"}),
            json!({"id": 3, "imageable_id": 2, "imageable_type": "article", "path": "draft.jpg"}),
        ],
    );
    executor
}

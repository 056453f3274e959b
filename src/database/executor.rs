use async_trait::async_trait;
use serde_json::Value;

use super::statement::{DeleteStatement, InsertStatement, Row, SelectStatement, UpdateStatement};
use crate::error::Result;

/// The narrow interface to the query-execution service. The core compiles
/// statements; an executor runs them and hands back dynamic rows, affected
/// counts, or the inserted identity. Tests substitute an in-memory
/// implementation.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn fetch_all(&self, statement: &SelectStatement) -> Result<Vec<Row>>;

    async fn fetch_optional(&self, statement: &SelectStatement) -> Result<Option<Row>>;

    /// COUNT(*) over the statement's joins and predicates, ignoring its
    /// ordering and page bounds
    async fn count(&self, statement: &SelectStatement) -> Result<i64>;

    /// Returns the inserted identity when the statement asks for one,
    /// `Value::Null` otherwise
    async fn insert(&self, statement: &InsertStatement) -> Result<Value>;

    async fn update(&self, statement: &UpdateStatement) -> Result<u64>;

    async fn delete(&self, statement: &DeleteStatement) -> Result<u64>;
}

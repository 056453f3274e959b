use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row as SqlxRow};
use std::env;
use tokio::sync::Mutex;

use super::executor::QueryExecutor;
use super::statement::{DeleteStatement, InsertStatement, Row, SelectStatement, UpdateStatement};
use crate::error::{OrmError, Result};

/// PostgreSQL-backed executor over a sqlx pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect() -> Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/armature_development".to_string());
        Self::connect_with(&database_url).await
    }

    pub async fn connect_with(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        tracing::debug!(url = %database_url, "database pool established");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<bool> {
        let row = sqlx::query("SELECT 1 as health")
            .fetch_one(&self.pool)
            .await?;
        let health: i32 = row.get("health");
        Ok(health == 1)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Run a block of work inside a transaction. Commits on normal
    /// completion; rolls back and re-raises the original error on failure.
    /// The connection is released on every exit path.
    pub async fn transaction<T, F>(&self, work: F) -> Result<T>
    where
        F: for<'t> FnOnce(&'t TransactionExecutor) -> BoxFuture<'t, Result<T>>,
    {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN").execute(&mut *conn).await?;

        let tx = TransactionExecutor {
            conn: Mutex::new(conn),
        };

        match work(&tx).await {
            Ok(value) => {
                let mut conn = tx.conn.into_inner();
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                Ok(value)
            }
            Err(err) => {
                let mut conn = tx.conn.into_inner();
                if let Err(rollback_err) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

/// Executor bound to a single transaction connection. Handed to the closure
/// passed to [`Database::transaction`].
pub struct TransactionExecutor {
    conn: Mutex<PoolConnection<Postgres>>,
}

fn row_from_json(row: &PgRow) -> Result<Row> {
    let value: Value = row
        .try_get("row")
        .map_err(|err| OrmError::Database(err.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(OrmError::Database(format!(
            "expected a row object, got {other}"
        ))),
    }
}

/// Wrap a select so every column comes back as one json document, letting the
/// executor return dynamic rows without static row types.
fn json_select_sql(statement: &SelectStatement) -> String {
    format!(
        "SELECT row_to_json(sub.*) AS row FROM ({}) sub",
        statement.to_sql()
    )
}

fn json_insert_sql(statement: &InsertStatement) -> String {
    match &statement.returning {
        Some(returning) => format!(
            "WITH inserted AS ({}) SELECT to_jsonb(inserted.{returning}) AS id FROM inserted",
            statement.to_sql()
        ),
        None => statement.to_sql(),
    }
}

async fn fetch_rows<'e, E>(executor: E, statement: &SelectStatement) -> Result<Vec<Row>>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let rows = sqlx::query(&json_select_sql(statement))
        .fetch_all(executor)
        .await?;
    rows.iter().map(row_from_json).collect()
}

async fn fetch_row<'e, E>(executor: E, statement: &SelectStatement) -> Result<Option<Row>>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(&json_select_sql(statement))
        .fetch_optional(executor)
        .await?;
    row.as_ref().map(row_from_json).transpose()
}

async fn fetch_count<'e, E>(executor: E, statement: &SelectStatement) -> Result<i64>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(&statement.to_count_sql())
        .fetch_one(executor)
        .await?;
    Ok(row.get::<i64, _>(0))
}

async fn run_insert<'e, E>(executor: E, statement: &InsertStatement) -> Result<Value>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let sql = json_insert_sql(statement);
    if statement.returning.is_some() {
        let row = sqlx::query(&sql).fetch_one(executor).await?;
        let id: Value = row
            .try_get("id")
            .map_err(|err| OrmError::Database(err.to_string()))?;
        Ok(id)
    } else {
        sqlx::query(&sql).execute(executor).await?;
        Ok(Value::Null)
    }
}

async fn run_update<'e, E>(executor: E, statement: &UpdateStatement) -> Result<u64>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(&statement.to_sql()).execute(executor).await?;
    Ok(result.rows_affected())
}

async fn run_delete<'e, E>(executor: E, statement: &DeleteStatement) -> Result<u64>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(&statement.to_sql()).execute(executor).await?;
    Ok(result.rows_affected())
}

#[async_trait]
impl QueryExecutor for Database {
    async fn fetch_all(&self, statement: &SelectStatement) -> Result<Vec<Row>> {
        fetch_rows(&self.pool, statement).await
    }

    async fn fetch_optional(&self, statement: &SelectStatement) -> Result<Option<Row>> {
        fetch_row(&self.pool, statement).await
    }

    async fn count(&self, statement: &SelectStatement) -> Result<i64> {
        fetch_count(&self.pool, statement).await
    }

    async fn insert(&self, statement: &InsertStatement) -> Result<Value> {
        run_insert(&self.pool, statement).await
    }

    async fn update(&self, statement: &UpdateStatement) -> Result<u64> {
        run_update(&self.pool, statement).await
    }

    async fn delete(&self, statement: &DeleteStatement) -> Result<u64> {
        run_delete(&self.pool, statement).await
    }
}

#[async_trait]
impl QueryExecutor for TransactionExecutor {
    async fn fetch_all(&self, statement: &SelectStatement) -> Result<Vec<Row>> {
        let mut conn = self.conn.lock().await;
        fetch_rows(&mut **conn, statement).await
    }

    async fn fetch_optional(&self, statement: &SelectStatement) -> Result<Option<Row>> {
        let mut conn = self.conn.lock().await;
        fetch_row(&mut **conn, statement).await
    }

    async fn count(&self, statement: &SelectStatement) -> Result<i64> {
        let mut conn = self.conn.lock().await;
        fetch_count(&mut **conn, statement).await
    }

    async fn insert(&self, statement: &InsertStatement) -> Result<Value> {
        let mut conn = self.conn.lock().await;
        run_insert(&mut **conn, statement).await
    }

    async fn update(&self, statement: &UpdateStatement) -> Result<u64> {
        let mut conn = self.conn.lock().await;
        run_update(&mut **conn, statement).await
    }

    async fn delete(&self, statement: &DeleteStatement) -> Result<u64> {
        let mut conn = self.conn.lock().await;
        run_delete(&mut **conn, statement).await
    }
}

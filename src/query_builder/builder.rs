use std::sync::Arc;

use serde_json::Value;

use super::conditions::{Predicate, PredicateSet};
use super::joins::Join;
use super::pagination::Paginator;
use super::scopes::ScopeState;
use crate::config::ArmatureConfig;
use crate::database::{
    DeleteStatement, QueryExecutor, Row, SelectStatement, UpdateStatement,
};
use crate::error::Result;
use crate::models::record::Record;
use crate::models::registry::ModelDef;

/// Request-scoped query builder for one model. Visibility scoping is
/// injected at compile time on every read unless toggled off; pagination is
/// computed once and frozen for the builder's lifetime.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    model: Arc<ModelDef>,
    select: Vec<String>,
    joins: Vec<Join>,
    predicates: PredicateSet,
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    scope: ScopeState,
    count_per_page: u64,
    page_param: String,
    row_cap: u64,
    paginator: Option<Paginator>,
}

impl QueryBuilder {
    pub fn new(model: Arc<ModelDef>) -> Self {
        Self::with_defaults(model, &ArmatureConfig::default())
    }

    pub(crate) fn with_defaults(model: Arc<ModelDef>, config: &ArmatureConfig) -> Self {
        let select = vec![format!("{}.*", model.table)];
        Self {
            model,
            select,
            joins: Vec::new(),
            predicates: PredicateSet::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            scope: ScopeState::new(),
            count_per_page: config.default_per_page,
            page_param: config.page_param.clone(),
            row_cap: config.row_cap,
            paginator: None,
        }
    }

    pub fn model(&self) -> &Arc<ModelDef> {
        &self.model
    }

    /// Set specific fields to select
    pub fn select(mut self, fields: &[&str]) -> Self {
        self.select = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn inner_join(self, table: &str, on_condition: &str) -> Self {
        self.join(Join::inner(table, on_condition))
    }

    pub fn left_join(self, table: &str, on_condition: &str) -> Self {
        self.join(Join::left(table, on_condition))
    }

    pub fn where_clause(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Equality condition; an array value becomes IN
    pub fn where_eq(self, column: &str, value: Value) -> Self {
        self.where_clause(Predicate::eq(column, value))
    }

    pub fn where_in(self, column: &str, values: Vec<Value>) -> Self {
        self.where_clause(Predicate::in_list(column, values))
    }

    pub fn where_null(self, column: &str) -> Self {
        self.where_clause(Predicate::is_null(column))
    }

    pub fn where_not_null(self, column: &str) -> Self {
        self.where_clause(Predicate::is_not_null(column))
    }

    pub fn order_by(mut self, field: &str, direction: &str) -> Self {
        self.order_by.push(format!("{field} {direction}"));
        self
    }

    pub fn order_asc(self, field: &str) -> Self {
        self.order_by(field, "ASC")
    }

    pub fn order_desc(self, field: &str) -> Self {
        self.order_by(field, "DESC")
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Include soft-deleted rows in this builder's reads
    pub fn with_deleted(mut self) -> Self {
        self.scope.with_deleted();
        self
    }

    /// Only soft-deleted rows
    pub fn only_deleted(mut self) -> Self {
        self.scope.only_deleted();
        self
    }

    /// Include rows outside their publish window
    pub fn with_unpublished(mut self) -> Self {
        self.scope.with_unpublished();
        self
    }

    /// Only rows with no publish timestamp
    pub fn only_unpublished(mut self) -> Self {
        self.scope.only_unpublished();
        self
    }

    pub fn per_page(mut self, count_per_page: u64) -> Self {
        self.count_per_page = count_per_page.max(1);
        self
    }

    pub fn page_param(mut self, name: &str) -> Self {
        self.page_param = name.to_string();
        self
    }

    /// The frozen pagination state, present after the first `paginate` call
    pub fn paginator(&self) -> Option<&Paginator> {
        self.paginator.as_ref()
    }

    /// Scope predicates for this builder's state; always compiled ahead of
    /// user predicates
    fn scope_predicates(&self) -> PredicateSet {
        let mut predicates = PredicateSet::new();
        self.scope.apply(&self.model.scope, &mut predicates);
        predicates
    }

    fn compile_select(&self, limit: Option<u64>, offset: Option<u64>) -> SelectStatement {
        let mut predicates = self.scope_predicates();
        predicates.extend(self.predicates.clone());
        tracing::debug!(
            model = %self.model.name,
            predicates = predicates.len(),
            "compiled select"
        );
        SelectStatement {
            table: self.model.table.clone(),
            columns: self.select.clone(),
            joins: self.joins.clone(),
            predicates,
            order_by: self.order_by.clone(),
            limit,
            offset,
        }
    }

    /// Row bounds for find_all: pagination wins, then an explicit limit, then
    /// the default cap protecting unbounded scans
    fn page_bounds(&self) -> (Option<u64>, Option<u64>) {
        if let Some(paginator) = &self.paginator {
            (
                Some(paginator.count_per_page()),
                Some(paginator.current_offset()),
            )
        } else if self.limit.is_some() {
            (self.limit, self.offset)
        } else {
            (Some(self.row_cap), self.offset)
        }
    }

    /// Compiled SQL for the read this builder would perform
    pub fn build_sql(&self) -> String {
        let (limit, offset) = self.page_bounds();
        self.compile_select(limit, offset).to_sql()
    }

    /// Fetch the first matching record under the active visibility scopes
    pub async fn find(&self, executor: &dyn QueryExecutor) -> Result<Option<Record>> {
        let statement = self.compile_select(Some(1), self.offset);
        let row = executor.fetch_optional(&statement).await?;
        Ok(row.map(|row| Record::from_row(self.model.clone(), row)))
    }

    /// Fetch every matching record under the active visibility scopes
    pub async fn find_all(&self, executor: &dyn QueryExecutor) -> Result<Vec<Record>> {
        let (limit, offset) = self.page_bounds();
        let statement = self.compile_select(limit, offset);
        let rows = executor.fetch_all(&statement).await?;
        Ok(rows
            .into_iter()
            .map(|row| Record::from_row(self.model.clone(), row))
            .collect())
    }

    /// Count matching rows under the active visibility scopes
    pub async fn count_all(&self, executor: &dyn QueryExecutor) -> Result<i64> {
        let statement = self.compile_select(None, None);
        executor.count(&statement).await
    }

    pub async fn exists(&self, executor: &dyn QueryExecutor) -> Result<bool> {
        Ok(self.count_all(executor).await? > 0)
    }

    /// Count, compute page bounds for `requested_page`, and fetch that page.
    /// The count and page reads are two independent statements built from the
    /// same base predicates. The pagination state freezes on first call;
    /// repeated calls reuse it even if the underlying count has moved.
    pub async fn paginate(
        &mut self,
        requested_page: i64,
        executor: &dyn QueryExecutor,
    ) -> Result<Vec<Record>> {
        if self.paginator.is_none() {
            let total = self.count_all(executor).await?;
            let paginator = Paginator::paginate(
                total.max(0) as u64,
                self.count_per_page,
                requested_page,
            )
            .with_page_param(&self.page_param);
            tracing::debug!(
                model = %self.model.name,
                page = paginator.current_page(),
                pages = paginator.page_count(),
                "pagination computed"
            );
            self.paginator = Some(paginator);
        }
        self.find_all(executor).await
    }

    /// Apply `assignments` to every matching row. Visibility scopes do not
    /// constrain bulk writes; only explicit predicates do. Fills the model's
    /// updated-at column when one is configured.
    pub async fn update_all(
        &self,
        executor: &dyn QueryExecutor,
        mut assignments: Row,
    ) -> Result<u64> {
        if assignments.is_empty() {
            return Ok(0);
        }
        if let Some(updated) = &self.model.updated {
            assignments.insert(updated.column.clone(), updated.format.now_value());
        }
        let statement = UpdateStatement {
            table: self.model.table.clone(),
            assignments,
            predicates: self.predicates.clone(),
        };
        executor.update(&statement).await
    }

    /// Delete every matching row: a single soft-delete UPDATE when the model
    /// configures a deleted column, a physical DELETE otherwise
    pub async fn delete_all(&self, executor: &dyn QueryExecutor) -> Result<u64> {
        if let Some(deleted) = &self.model.scope.deleted {
            let mut assignments = Row::new();
            assignments.insert(deleted.column.clone(), deleted.format.now_value());
            return self.update_all(executor, assignments).await;
        }
        let statement = DeleteStatement {
            table: self.model.table.clone(),
            predicates: self.predicates.clone(),
        };
        executor.delete(&statement).await
    }
}

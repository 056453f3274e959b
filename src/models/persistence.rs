use serde_json::Value;

use super::counter_cache;
use super::record::Record;
use super::registry::ModelRegistry;
use crate::database::{DeleteStatement, InsertStatement, QueryExecutor, Row, UpdateStatement};
use crate::error::{OrmError, Result};
use crate::query_builder::conditions::{Predicate, PredicateSet};
use crate::validation::ValidationService;

impl Record {
    /// Insert this record's changed columns. On success the returned
    /// identity is assigned, the record becomes loaded, and dependent count
    /// caches are recomputed.
    pub async fn create(
        &mut self,
        registry: &ModelRegistry,
        executor: &dyn QueryExecutor,
        validation: Option<&dyn ValidationService>,
    ) -> Result<&mut Self> {
        if let Some(service) = validation {
            service
                .validate(self)
                .map_err(OrmError::ValidationFailed)?;
        }

        let statement = InsertStatement {
            table: self.model().table.clone(),
            values: self.changed_values(),
            returning: Some(self.model().primary_key.clone()),
        };
        let id = executor.insert(&statement).await?;
        if !id.is_null() {
            let pk = self.model().primary_key.clone();
            self.write_column(&pk, id);
        }
        self.mark_loaded();
        self.clear_changes();

        counter_cache::refresh(registry, executor, self).await?;
        Ok(self)
    }

    /// Persist changed columns to the existing row. Count caches are
    /// recomputed only when the deleted or published column changed, and
    /// exactly once even when both did.
    pub async fn update(
        &mut self,
        registry: &ModelRegistry,
        executor: &dyn QueryExecutor,
        validation: Option<&dyn ValidationService>,
    ) -> Result<&mut Self> {
        self.require_identity("update")?;
        if let Some(service) = validation {
            service
                .validate(self)
                .map_err(OrmError::ValidationFailed)?;
        }
        if !self.has_changes() {
            return Ok(self);
        }

        let scope = &self.model().scope;
        let need_count = scope
            .deleted
            .as_ref()
            .is_some_and(|c| self.is_changed(&c.column))
            || scope
                .published
                .as_ref()
                .is_some_and(|c| self.is_changed(&c.column));

        let statement = UpdateStatement {
            table: self.model().table.clone(),
            assignments: self.changed_values(),
            predicates: self.identity_predicates()?,
        };
        executor.update(&statement).await?;
        self.clear_changes();

        if need_count {
            counter_cache::refresh(registry, executor, self).await?;
        }
        Ok(self)
    }

    /// Create when new, update when loaded
    pub async fn save(
        &mut self,
        registry: &ModelRegistry,
        executor: &dyn QueryExecutor,
        validation: Option<&dyn ValidationService>,
    ) -> Result<&mut Self> {
        if self.is_new() {
            self.create(registry, executor, validation).await
        } else {
            self.update(registry, executor, validation).await
        }
    }

    /// Create, recovering a validation failure into `false` with the error
    /// map stored on the record. Database failures still propagate.
    pub async fn try_create(
        &mut self,
        registry: &ModelRegistry,
        executor: &dyn QueryExecutor,
        validation: Option<&dyn ValidationService>,
    ) -> Result<bool> {
        match self.create(registry, executor, validation).await {
            Ok(_) => Ok(true),
            Err(OrmError::ValidationFailed(errors)) => {
                self.set_errors(errors);
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Update, recovering a validation failure into `false`; see
    /// [`Record::try_create`]
    pub async fn try_update(
        &mut self,
        registry: &ModelRegistry,
        executor: &dyn QueryExecutor,
        validation: Option<&dyn ValidationService>,
    ) -> Result<bool> {
        match self.update(registry, executor, validation).await {
            Ok(_) => Ok(true),
            Err(OrmError::ValidationFailed(errors)) => {
                self.set_errors(errors);
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Delete this record. With a configured deleted column this is a direct
    /// update stamping the column — validation is bypassed entirely — and
    /// the row stays in place, hidden from default reads. Without one the
    /// row is physically removed.
    pub async fn delete(
        &mut self,
        registry: &ModelRegistry,
        executor: &dyn QueryExecutor,
    ) -> Result<&mut Self> {
        if let Some(deleted) = self.model().scope.deleted.clone() {
            self.require_identity("delete")?;
            self.stamp_column(executor, &deleted.column, deleted.format.now_value())
                .await?;
            counter_cache::refresh(registry, executor, self).await?;
            return Ok(self);
        }
        self.delete_physical(registry, executor).await
    }

    /// Physically delete the row, bypassing soft-delete configuration
    pub async fn force_delete(
        &mut self,
        registry: &ModelRegistry,
        executor: &dyn QueryExecutor,
    ) -> Result<&mut Self> {
        self.delete_physical(registry, executor).await
    }

    async fn delete_physical(
        &mut self,
        registry: &ModelRegistry,
        executor: &dyn QueryExecutor,
    ) -> Result<&mut Self> {
        self.require_identity("delete")?;
        let statement = DeleteStatement {
            table: self.model().table.clone(),
            predicates: self.identity_predicates()?,
        };
        executor.delete(&statement).await?;
        counter_cache::refresh(registry, executor, self).await?;
        self.unload();
        Ok(self)
    }

    /// Clear the deleted column so the record reappears in default reads.
    /// No-op when soft delete is not configured.
    pub async fn restore(
        &mut self,
        registry: &ModelRegistry,
        executor: &dyn QueryExecutor,
    ) -> Result<&mut Self> {
        let Some(deleted) = self.model().scope.deleted.clone() else {
            return Ok(self);
        };
        self.require_identity("restore")?;
        self.stamp_column(executor, &deleted.column, Value::Null)
            .await?;
        counter_cache::refresh(registry, executor, self).await?;
        Ok(self)
    }

    /// Stamp the published column with the current time. Direct column
    /// update; validation is bypassed. No-op when no publish window is
    /// configured.
    pub async fn publish(
        &mut self,
        registry: &ModelRegistry,
        executor: &dyn QueryExecutor,
    ) -> Result<&mut Self> {
        let Some(published) = self.model().scope.published.clone() else {
            return Ok(self);
        };
        self.require_identity("publish")?;
        self.stamp_column(executor, &published.column, published.format.now_value())
            .await?;
        counter_cache::refresh(registry, executor, self).await?;
        Ok(self)
    }

    /// Clear the published column; the symmetric inverse of
    /// [`Record::publish`]
    pub async fn unpublish(
        &mut self,
        registry: &ModelRegistry,
        executor: &dyn QueryExecutor,
    ) -> Result<&mut Self> {
        let Some(published) = self.model().scope.published.clone() else {
            return Ok(self);
        };
        self.require_identity("unpublish")?;
        self.stamp_column(executor, &published.column, Value::Null)
            .await?;
        counter_cache::refresh(registry, executor, self).await?;
        Ok(self)
    }

    /// Add `amount` to a numeric column and persist the change
    pub async fn increment(
        &mut self,
        registry: &ModelRegistry,
        executor: &dyn QueryExecutor,
        column: &str,
        amount: i64,
    ) -> Result<&mut Self> {
        let current = self.get(column).and_then(Value::as_i64).unwrap_or(0);
        self.set(column, Value::from(current + amount))?;
        self.update(registry, executor, None).await
    }

    pub async fn decrement(
        &mut self,
        registry: &ModelRegistry,
        executor: &dyn QueryExecutor,
        column: &str,
        amount: i64,
    ) -> Result<&mut Self> {
        self.increment(registry, executor, column, -amount).await
    }

    /// Direct single-column update keyed on the record's identity, mirrored
    /// into the in-memory columns without touching the changed set
    async fn stamp_column(
        &mut self,
        executor: &dyn QueryExecutor,
        column: &str,
        value: Value,
    ) -> Result<()> {
        let mut assignments = Row::new();
        assignments.insert(column.to_string(), value.clone());
        let statement = UpdateStatement {
            table: self.model().table.clone(),
            assignments,
            predicates: self.identity_predicates()?,
        };
        executor.update(&statement).await?;
        self.write_column(column, value);
        Ok(())
    }

    fn require_identity(&self, action: &'static str) -> Result<()> {
        if self.is_loaded() && self.pk().is_some() {
            Ok(())
        } else {
            Err(OrmError::NotLoaded {
                model: self.model().name.clone(),
                action,
            })
        }
    }

    fn identity_predicates(&self) -> Result<PredicateSet> {
        let pk = self.pk().cloned().ok_or_else(|| OrmError::NotLoaded {
            model: self.model().name.clone(),
            action: "address",
        })?;
        let mut predicates = PredicateSet::new();
        predicates.push(Predicate::eq(&self.model().primary_key, pk));
        Ok(predicates)
    }
}

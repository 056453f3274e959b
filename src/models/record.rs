use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::registry::{ModelDef, ModelRegistry};
use super::resolver::{resolve, Resolution};
use crate::database::{QueryExecutor, Row};
use crate::error::{FieldErrors, OrmError, Result};
use crate::query_builder::builder::QueryBuilder;

/// A single row of a model: column values, change tracking, and identity.
/// A Record is either new (no identity, not loaded) or loaded (identity
/// assigned, columns mirror the persisted row until mutated). Owned by one
/// request; never shared.
#[derive(Debug, Clone)]
pub struct Record {
    model: Arc<ModelDef>,
    columns: Map<String, Value>,
    changed: HashSet<String>,
    loaded: bool,
    /// Memoized to-one resolutions, dropped when an owning key column is
    /// reassigned
    related: HashMap<String, Option<Record>>,
    errors: FieldErrors,
}

impl Record {
    /// A new, unsaved record with every declared column set to NULL
    pub fn new(model: Arc<ModelDef>) -> Self {
        let mut columns = Map::new();
        for column in &model.columns {
            columns.insert(column.clone(), Value::Null);
        }
        Self {
            model,
            columns,
            changed: HashSet::new(),
            loaded: false,
            related: HashMap::new(),
            errors: FieldErrors::new(),
        }
    }

    /// A record materialized from a fetched row
    pub fn from_row(model: Arc<ModelDef>, row: Row) -> Self {
        Self {
            model,
            columns: row,
            changed: HashSet::new(),
            loaded: true,
            related: HashMap::new(),
            errors: FieldErrors::new(),
        }
    }

    pub fn model(&self) -> &Arc<ModelDef> {
        &self.model
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// Assign a column value, tracking the change and invalidating any
    /// memoized relation that reads its keys from this column
    pub fn set(&mut self, column: &str, value: Value) -> Result<&mut Self> {
        if !self.model.has_column(column) {
            return Err(OrmError::UnknownColumn {
                model: self.model.name.clone(),
                column: column.to_string(),
            });
        }
        if self.columns.get(column) != Some(&value) {
            self.columns.insert(column.to_string(), value);
            self.changed.insert(column.to_string());
            self.invalidate_related(column);
        }
        Ok(self)
    }

    pub fn set_values(&mut self, values: Map<String, Value>) -> Result<&mut Self> {
        for (column, value) in values {
            self.set(&column, value)?;
        }
        Ok(self)
    }

    fn invalidate_related(&mut self, column: &str) {
        let stale: Vec<String> = self
            .model
            .relations
            .iter()
            .filter(|relation| relation.owner_key_columns().contains(&column))
            .map(|relation| relation.name().to_string())
            .collect();
        for name in stale {
            self.related.remove(&name);
        }
    }

    /// Primary-key value, None while unassigned
    pub fn pk(&self) -> Option<&Value> {
        self.columns
            .get(&self.model.primary_key)
            .filter(|value| !value.is_null())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_new(&self) -> bool {
        !self.loaded
    }

    pub fn is_changed(&self, column: &str) -> bool {
        self.changed.contains(column)
    }

    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Changed columns and their current values, for insert/update statements
    pub(crate) fn changed_values(&self) -> Row {
        let mut values = Row::new();
        for column in &self.changed {
            if let Some(value) = self.columns.get(column) {
                values.insert(column.clone(), value.clone());
            }
        }
        values
    }

    pub(crate) fn clear_changes(&mut self) {
        self.changed.clear();
    }

    pub(crate) fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    pub(crate) fn unload(&mut self) {
        self.loaded = false;
    }

    pub(crate) fn write_column(&mut self, column: &str, value: Value) {
        self.columns.insert(column.to_string(), value);
        self.invalidate_related(column);
    }

    /// Export the column mapping as a JSON document. Nothing is filtered
    /// here; hiding internal columns is the serializing collaborator's call.
    pub fn as_json(&self) -> Value {
        Value::Object(self.columns.clone())
    }

    /// Validation errors stored by the last `try_create`/`try_update`
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub(crate) fn set_errors(&mut self, errors: FieldErrors) {
        self.errors = errors;
    }

    /// Whether the soft-delete column is set; None when not configured
    pub fn is_deleted(&self) -> Option<bool> {
        let column = &self.model.scope.deleted.as_ref()?.column;
        Some(self.columns.get(column).is_some_and(|v| !v.is_null()))
    }

    /// Whether the published column is set; None when not configured
    pub fn is_published(&self) -> Option<bool> {
        let column = &self.model.scope.published.as_ref()?.column;
        Some(self.columns.get(column).is_some_and(|v| !v.is_null()))
    }

    /// Fetch a to-one relation, memoizing the result until the owning key
    /// column is reassigned
    pub async fn related_one(
        &mut self,
        registry: &ModelRegistry,
        executor: &dyn QueryExecutor,
        name: &str,
    ) -> Result<Option<Record>> {
        if let Some(cached) = self.related.get(name) {
            return Ok(cached.clone());
        }

        let resolution = resolve(registry, self, name)?;
        let fetched = match resolution {
            Resolution::Empty { .. } => None,
            Resolution::Query {
                target,
                predicates,
                join,
            } => {
                let mut query = registry.query_model(&target);
                if let Some(join) = join {
                    query = query.join(join);
                }
                for predicate in predicates.iter() {
                    query = query.where_clause(predicate.clone());
                }
                query.find(executor).await?
            }
        };

        self.related.insert(name.to_string(), fetched.clone());
        Ok(fetched)
    }

    /// A builder over any relation's target, filtered to this record. For
    /// to-many relations this is the lazy access path; the caller chains and
    /// executes it.
    pub fn related_query<'a>(&'a self, registry: &'a ModelRegistry) -> RelatedQuery<'a> {
        RelatedQuery {
            record: self,
            registry,
        }
    }

    /// Build a child record for a has-many relation with its foreign key
    /// (and type column, for polymorphic targets) pre-assigned from this one
    pub fn build_related(
        &self,
        registry: &ModelRegistry,
        name: &str,
        values: Map<String, Value>,
    ) -> Result<Record> {
        use super::relations::RelationDescriptor;

        let relation =
            self.model
                .relations
                .get(name)
                .ok_or_else(|| OrmError::UnknownRelation {
                    model: self.model.name.clone(),
                    relation: name.to_string(),
                })?;

        let owner_pk = self.pk().cloned().unwrap_or(Value::Null);
        match relation {
            RelationDescriptor::HasMany {
                target,
                foreign_key,
                ..
            }
            | RelationDescriptor::HasOne {
                target,
                foreign_key,
                ..
            } => {
                let mut child = Record::new(registry.get(target)?);
                child.set_values(values)?;
                child.set(foreign_key, owner_pk)?;
                Ok(child)
            }
            RelationDescriptor::PolymorphicHasMany {
                target,
                id_column,
                type_column,
                ..
            } => {
                let mut child = Record::new(registry.get(target)?);
                child.set_values(values)?;
                child.set(id_column, owner_pk)?;
                child.set(type_column, Value::from(self.model.name.clone()))?;
                Ok(child)
            }
            _ => Err(OrmError::UnknownRelation {
                model: self.model.name.clone(),
                relation: name.to_string(),
            }),
        }
    }
}

/// Borrowing helper so relation queries read naturally:
/// `record.related_query(&registry).named("comments")?`
pub struct RelatedQuery<'a> {
    record: &'a Record,
    registry: &'a ModelRegistry,
}

impl RelatedQuery<'_> {
    pub fn named(&self, name: &str) -> Result<QueryBuilder> {
        let resolution = resolve(self.registry, self.record, name)?;
        match resolution {
            Resolution::Empty {
                target: Some(target),
            } => {
                // zero-result guard: never compile an `= NULL` key predicate
                Ok(self
                    .registry
                    .query_model(&target)
                    .where_in(&target.qualified(&target.primary_key), vec![]))
            }
            Resolution::Empty { target: None } => Err(OrmError::UnknownRelation {
                model: self.record.model.name.clone(),
                relation: name.to_string(),
            }),
            Resolution::Query {
                target,
                predicates,
                join,
            } => {
                let mut query = self.registry.query_model(&target);
                if let Some(join) = join {
                    query = query.join(join);
                }
                for predicate in predicates.iter() {
                    query = query.where_clause(predicate.clone());
                }
                Ok(query)
            }
        }
    }
}

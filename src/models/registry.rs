use std::collections::HashMap;
use std::sync::Arc;

use super::relations::{RelationDescriptor, RelationGraph};
use crate::config::ArmatureConfig;
use crate::error::{OrmError, Result};
use crate::query_builder::builder::QueryBuilder;
use crate::query_builder::scopes::{ScopeConfig, TimestampColumn, TimestampFormat};

/// Static, per-model declarations: table, identity, columns, visibility
/// configuration, and the relation graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDef {
    pub name: String,
    pub table: String,
    /// Plural form used for polymorphic naming and the `<plural>_count`
    /// cache column on parents
    pub plural: String,
    pub primary_key: String,
    pub columns: Vec<String>,
    pub scope: ScopeConfig,
    /// Filled automatically on bulk updates when configured
    pub updated: Option<TimestampColumn>,
    pub relations: RelationGraph,
    /// Duplicate declarations held back for the registry build error
    duplicate_relations: Vec<String>,
}

impl ModelDef {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        let table = table.into();
        Self {
            name: name.into(),
            plural: table.clone(),
            table,
            primary_key: "id".to_string(),
            columns: Vec::new(),
            scope: ScopeConfig::default(),
            updated: None,
            relations: RelationGraph::default(),
            duplicate_relations: Vec::new(),
        }
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    pub fn plural(mut self, plural: impl Into<String>) -> Self {
        self.plural = plural.into();
        self
    }

    pub fn soft_delete(mut self, column: impl Into<String>, format: TimestampFormat) -> Self {
        self.scope.deleted = Some(TimestampColumn::new(column, format));
        self
    }

    pub fn publish_window(mut self, column: impl Into<String>, format: TimestampFormat) -> Self {
        self.scope.published = Some(TimestampColumn::new(column, format));
        self
    }

    pub fn updated_at(mut self, column: impl Into<String>, format: TimestampFormat) -> Self {
        self.updated = Some(TimestampColumn::new(column, format));
        self
    }

    pub fn belongs_to(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.push_relation(RelationDescriptor::BelongsTo {
            name: name.into(),
            target: target.into(),
            foreign_key: foreign_key.into(),
        });
        self
    }

    pub fn has_one(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.push_relation(RelationDescriptor::HasOne {
            name: name.into(),
            target: target.into(),
            foreign_key: foreign_key.into(),
        });
        self
    }

    pub fn has_many(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.push_relation(RelationDescriptor::HasMany {
            name: name.into(),
            target: target.into(),
            foreign_key: foreign_key.into(),
        });
        self
    }

    pub fn has_many_through(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        through: impl Into<String>,
        foreign_key: impl Into<String>,
        far_key: impl Into<String>,
    ) -> Self {
        self.push_relation(RelationDescriptor::HasManyThrough {
            name: name.into(),
            target: target.into(),
            through: through.into(),
            foreign_key: foreign_key.into(),
            far_key: far_key.into(),
        });
        self
    }

    /// Declares `<name>_id` / `<name>_type` key columns by convention
    pub fn polymorphic_belongs_to(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.push_relation(RelationDescriptor::PolymorphicBelongsTo {
            id_column: format!("{name}_id"),
            type_column: format!("{name}_type"),
            name,
        });
        self
    }

    /// The target stores this model under `<role>_id` / `<role>_type`
    pub fn polymorphic_has_many(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        let role = role.into();
        self.push_relation(RelationDescriptor::PolymorphicHasMany {
            name: name.into(),
            target: target.into(),
            id_column: format!("{role}_id"),
            type_column: format!("{role}_type"),
        });
        self
    }

    // Declaration chains stay infallible; duplicates surface as an error
    // from ModelRegistryBuilder::build.
    fn push_relation(&mut self, relation: RelationDescriptor) {
        let model = self.name.clone();
        if self.relations.insert(&model, relation.clone()).is_err() {
            self.duplicate_relations.push(relation.name().to_string());
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Table-qualified column reference
    pub fn qualified(&self, column: &str) -> String {
        format!("{}.{}", self.table, column)
    }
}

/// Immutable model catalog. Built once at startup; polymorphic targets
/// resolve through it by identifier lookup.
#[derive(Debug)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<ModelDef>>,
    config: ArmatureConfig,
}

impl ModelRegistry {
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder {
            models: Vec::new(),
            config: ArmatureConfig::default(),
        }
    }

    pub fn get(&self, name: &str) -> Result<Arc<ModelDef>> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| OrmError::UnknownModel(name.to_string()))
    }

    pub fn config(&self) -> &ArmatureConfig {
        &self.config
    }

    /// Start a scoped query for the named model
    pub fn query(&self, name: &str) -> Result<QueryBuilder> {
        Ok(QueryBuilder::with_defaults(self.get(name)?, &self.config))
    }

    pub fn query_model(&self, model: &Arc<ModelDef>) -> QueryBuilder {
        QueryBuilder::with_defaults(model.clone(), &self.config)
    }
}

pub struct ModelRegistryBuilder {
    models: Vec<ModelDef>,
    config: ArmatureConfig,
}

impl ModelRegistryBuilder {
    pub fn model(mut self, model: ModelDef) -> Self {
        self.models.push(model);
        self
    }

    pub fn config(mut self, config: ArmatureConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates the whole graph: unique model names, unique relation names,
    /// and statically-declared relation targets that actually exist
    pub fn build(self) -> Result<ModelRegistry> {
        let mut models: HashMap<String, Arc<ModelDef>> = HashMap::new();
        for model in &self.models {
            if models
                .insert(model.name.clone(), Arc::new(model.clone()))
                .is_some()
            {
                return Err(OrmError::Configuration(format!(
                    "model {} registered twice",
                    model.name
                )));
            }
        }

        for model in &self.models {
            if !model.duplicate_relations.is_empty() {
                return Err(OrmError::Configuration(format!(
                    "relation {} declared twice on model {}",
                    model.duplicate_relations[0], model.name
                )));
            }
            for relation in model.relations.iter() {
                if let Some(target) = relation.target() {
                    if !models.contains_key(target) {
                        return Err(OrmError::Configuration(format!(
                            "relation {} on model {} targets unregistered model {target}",
                            relation.name(),
                            model.name
                        )));
                    }
                }
            }
        }

        Ok(ModelRegistry {
            models,
            config: self.config,
        })
    }
}

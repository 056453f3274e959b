use crate::error::{OrmError, Result};

/// A declared relation between two models. Exactly one variant exists per
/// relation name on a model; the graph is immutable once the registry is
/// built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationDescriptor {
    /// This model holds the foreign key pointing at the target
    BelongsTo {
        name: String,
        target: String,
        foreign_key: String,
    },
    /// The target holds the foreign key pointing back at this model
    HasOne {
        name: String,
        target: String,
        foreign_key: String,
    },
    HasMany {
        name: String,
        target: String,
        foreign_key: String,
    },
    /// Many-to-many mediated by a join table: `foreign_key` points at this
    /// model, `far_key` at the target
    HasManyThrough {
        name: String,
        target: String,
        through: String,
        foreign_key: String,
        far_key: String,
    },
    /// The target model is read from `type_column` at resolution time
    PolymorphicBelongsTo {
        name: String,
        id_column: String,
        type_column: String,
    },
    PolymorphicHasMany {
        name: String,
        target: String,
        id_column: String,
        type_column: String,
    },
}

impl RelationDescriptor {
    pub fn name(&self) -> &str {
        match self {
            RelationDescriptor::BelongsTo { name, .. }
            | RelationDescriptor::HasOne { name, .. }
            | RelationDescriptor::HasMany { name, .. }
            | RelationDescriptor::HasManyThrough { name, .. }
            | RelationDescriptor::PolymorphicBelongsTo { name, .. }
            | RelationDescriptor::PolymorphicHasMany { name, .. } => name,
        }
    }

    /// Statically-declared target model, absent for polymorphic belongs-to
    pub fn target(&self) -> Option<&str> {
        match self {
            RelationDescriptor::BelongsTo { target, .. }
            | RelationDescriptor::HasOne { target, .. }
            | RelationDescriptor::HasMany { target, .. }
            | RelationDescriptor::HasManyThrough { target, .. }
            | RelationDescriptor::PolymorphicHasMany { target, .. } => Some(target),
            RelationDescriptor::PolymorphicBelongsTo { .. } => None,
        }
    }

    pub fn is_to_one(&self) -> bool {
        matches!(
            self,
            RelationDescriptor::BelongsTo { .. }
                | RelationDescriptor::HasOne { .. }
                | RelationDescriptor::PolymorphicBelongsTo { .. }
        )
    }

    /// Columns on the owning record that this relation reads its keys from.
    /// Reassigning one of them invalidates a memoized resolution.
    pub fn owner_key_columns(&self) -> Vec<&str> {
        match self {
            RelationDescriptor::BelongsTo { foreign_key, .. } => vec![foreign_key],
            RelationDescriptor::PolymorphicBelongsTo {
                id_column,
                type_column,
                ..
            } => vec![id_column, type_column],
            _ => vec![],
        }
    }
}

/// Per-model relation declarations, keyed by relation name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationGraph {
    relations: Vec<RelationDescriptor>,
}

impl RelationGraph {
    pub fn get(&self, name: &str) -> Option<&RelationDescriptor> {
        self.relations.iter().find(|r| r.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RelationDescriptor> {
        self.relations.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub(crate) fn insert(&mut self, model: &str, relation: RelationDescriptor) -> Result<()> {
        if self.get(relation.name()).is_some() {
            return Err(OrmError::Configuration(format!(
                "relation {} declared twice on model {model}",
                relation.name()
            )));
        }
        self.relations.push(relation);
        Ok(())
    }
}

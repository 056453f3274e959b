use std::sync::Arc;

use serde_json::Value;

use super::record::Record;
use super::registry::{ModelDef, ModelRegistry};
use super::relations::RelationDescriptor;
use crate::error::{OrmError, Result};
use crate::query_builder::conditions::{Predicate, PredicateSet};
use crate::query_builder::joins::Join;

/// Outcome of resolving a relation for one owning record
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Predicates (and an optional join) that fetch the related record set
    Query {
        target: Arc<ModelDef>,
        predicates: PredicateSet,
        join: Option<Join>,
    },
    /// The owning key is unset: there is no related record, and no query
    /// should run. The target is absent when a polymorphic type column is
    /// NULL and no model can be named.
    Empty { target: Option<Arc<ModelDef>> },
}

impl Resolution {
    pub fn target(&self) -> Option<&Arc<ModelDef>> {
        match self {
            Resolution::Query { target, .. } => Some(target),
            Resolution::Empty { target } => target.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Resolution::Empty { .. })
    }
}

fn key_value(record: &Record, column: &str) -> Option<Value> {
    record.get(column).filter(|v| !v.is_null()).cloned()
}

/// Resolve a declared relation against an owning record.
///
/// When the owner-side key is NULL the resolver short-circuits to
/// [`Resolution::Empty`] instead of emitting an `= NULL` predicate — under
/// MySQL's `sql_auto_is_null` session semantics such a query would match the
/// last inserted row rather than nothing.
pub fn resolve(registry: &ModelRegistry, owner: &Record, relation_name: &str) -> Result<Resolution> {
    let owner_model = owner.model();
    let relation =
        owner_model
            .relations
            .get(relation_name)
            .ok_or_else(|| OrmError::UnknownRelation {
                model: owner_model.name.clone(),
                relation: relation_name.to_string(),
            })?;

    match relation {
        RelationDescriptor::BelongsTo {
            target,
            foreign_key,
            ..
        } => {
            let target = registry.get(target)?;
            let Some(key) = key_value(owner, foreign_key) else {
                return Ok(Resolution::Empty {
                    target: Some(target),
                });
            };
            let mut predicates = PredicateSet::new();
            predicates.push(Predicate::eq(target.qualified(&target.primary_key), key));
            Ok(Resolution::Query {
                target,
                predicates,
                join: None,
            })
        }

        RelationDescriptor::HasOne {
            target,
            foreign_key,
            ..
        }
        | RelationDescriptor::HasMany {
            target,
            foreign_key,
            ..
        } => {
            let target = registry.get(target)?;
            let Some(owner_pk) = owner.pk().cloned() else {
                return Ok(Resolution::Empty {
                    target: Some(target),
                });
            };
            let mut predicates = PredicateSet::new();
            predicates.push(Predicate::eq(target.qualified(foreign_key), owner_pk));
            Ok(Resolution::Query {
                target,
                predicates,
                join: None,
            })
        }

        RelationDescriptor::HasManyThrough {
            target,
            through,
            foreign_key,
            far_key,
            ..
        } => {
            let target = registry.get(target)?;
            let Some(owner_pk) = owner.pk().cloned() else {
                return Ok(Resolution::Empty {
                    target: Some(target),
                });
            };
            let join = Join::inner(
                through,
                &format!(
                    "{through}.{far_key} = {}",
                    target.qualified(&target.primary_key)
                ),
            );
            let mut predicates = PredicateSet::new();
            predicates.push(Predicate::eq(format!("{through}.{foreign_key}"), owner_pk));
            Ok(Resolution::Query {
                target,
                predicates,
                join: Some(join),
            })
        }

        RelationDescriptor::PolymorphicBelongsTo {
            id_column,
            type_column,
            ..
        } => {
            // target model is a registry lookup on the stored type identifier
            let Some(type_value) = key_value(owner, type_column) else {
                return Ok(Resolution::Empty { target: None });
            };
            let type_name = type_value.as_str().ok_or_else(|| {
                OrmError::Configuration(format!(
                    "type column {type_column} on model {} is not a string",
                    owner_model.name
                ))
            })?;
            let target = registry.get(type_name)?;
            let Some(key) = key_value(owner, id_column) else {
                return Ok(Resolution::Empty {
                    target: Some(target),
                });
            };
            let mut predicates = PredicateSet::new();
            predicates.push(Predicate::eq(target.qualified(&target.primary_key), key));
            Ok(Resolution::Query {
                target,
                predicates,
                join: None,
            })
        }

        RelationDescriptor::PolymorphicHasMany {
            target,
            id_column,
            type_column,
            ..
        } => {
            let target = registry.get(target)?;
            let Some(owner_pk) = owner.pk().cloned() else {
                return Ok(Resolution::Empty {
                    target: Some(target),
                });
            };
            let mut predicates = PredicateSet::new();
            predicates.push(Predicate::eq(target.qualified(id_column), owner_pk));
            predicates.push(Predicate::eq(
                target.qualified(type_column),
                Value::from(owner_model.name.clone()),
            ));
            Ok(Resolution::Query {
                target,
                predicates,
                join: None,
            })
        }
    }
}

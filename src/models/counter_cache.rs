//! Denormalized child-count maintenance.
//!
//! After a create, a delete, or an update that changed a visibility column,
//! every belongs-to parent exposing a `<child_plural>_count` column gets
//! that column recomputed from a scoped `count_all` and written back with a
//! direct update. The recount runs outside any transaction shared with the
//! triggering write, so the cached value is eventually recomputed rather
//! than atomically consistent with it.

use serde_json::Value;

use super::record::Record;
use super::registry::ModelRegistry;
use super::relations::RelationDescriptor;
use crate::database::{QueryExecutor, Row, UpdateStatement};
use crate::error::Result;
use crate::query_builder::conditions::{Predicate, PredicateSet};

/// Recompute cached child counts for every belongs-to parent of `child`.
/// Runs exactly once per qualifying write; callers own that discipline.
pub(crate) async fn refresh(
    registry: &ModelRegistry,
    executor: &dyn QueryExecutor,
    child: &Record,
) -> Result<()> {
    let child_model = child.model().clone();
    let count_column = format!("{}_count", child_model.plural);

    for relation in child_model.relations.iter() {
        let (parent, parent_key, child_predicates) = match relation {
            RelationDescriptor::BelongsTo {
                target,
                foreign_key,
                ..
            } => {
                let Some(key) = non_null(child.get(foreign_key)) else {
                    continue;
                };
                let mut predicates = PredicateSet::new();
                predicates.push(Predicate::eq(
                    child_model.qualified(foreign_key),
                    key.clone(),
                ));
                (registry.get(target)?, key, predicates)
            }
            RelationDescriptor::PolymorphicBelongsTo {
                id_column,
                type_column,
                ..
            } => {
                let Some(type_value) = non_null(child.get(type_column)) else {
                    continue;
                };
                let Some(type_name) = type_value.as_str() else {
                    continue;
                };
                let Some(key) = non_null(child.get(id_column)) else {
                    continue;
                };
                let mut predicates = PredicateSet::new();
                predicates.push(Predicate::eq(
                    child_model.qualified(id_column),
                    key.clone(),
                ));
                predicates.push(Predicate::eq(
                    child_model.qualified(type_column),
                    type_value.clone(),
                ));
                (registry.get(type_name)?, key, predicates)
            }
            _ => continue,
        };

        if !parent.has_column(&count_column) {
            continue;
        }

        // count under default visibility: deleted and unpublished children
        // do not contribute
        let mut query = registry.query_model(&child_model);
        for predicate in child_predicates.iter() {
            query = query.where_clause(predicate.clone());
        }
        let count = query.count_all(executor).await?;

        let mut assignments = Row::new();
        assignments.insert(count_column.clone(), Value::from(count));
        let mut predicates = PredicateSet::new();
        predicates.push(Predicate::eq(&parent.primary_key, parent_key));
        executor
            .update(&UpdateStatement {
                table: parent.table.clone(),
                assignments,
                predicates,
            })
            .await?;

        tracing::debug!(
            parent = %parent.name,
            column = %count_column,
            count,
            "count cache refreshed"
        );
    }

    Ok(())
}

fn non_null(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}

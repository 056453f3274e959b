use serde_json::Value;

use super::builder::QueryBuilder;
use super::conditions::{LogicalOperator, Operator, Predicate};
use crate::database::QueryExecutor;
use crate::error::{OrmError, Result};
use crate::models::record::Record;
use crate::models::registry::ModelRegistry;

/// Terminal action named by a finder-style method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinderAction {
    Find,
    FindAll,
    CountAll,
    FindOrInitialize,
    FindOrCreate,
}

/// Condition suffix of a `where_*` method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionToken {
    Contains,
    StartsWith,
    EndsWith,
    Is,
    Like,
    Equal,
    Equals,
    Before,
    After,
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Not,
    In,
}

impl ConditionToken {
    /// Map the token to an operator and transform the value: wildcard
    /// wrapping for the string matches, array coercion for `in`. Tokens with
    /// no mapping compile to LIKE with the untouched value.
    fn apply(self, value: Value) -> (Operator, Value) {
        match self {
            ConditionToken::Contains => (Operator::Like, wrap_like(value, true, true)),
            ConditionToken::StartsWith => (Operator::Like, wrap_like(value, false, true)),
            ConditionToken::EndsWith => (Operator::Like, wrap_like(value, true, false)),
            ConditionToken::Before | ConditionToken::Lt => (Operator::Lt, value),
            ConditionToken::Lte => (Operator::Lte, value),
            ConditionToken::After | ConditionToken::Gt => (Operator::Gt, value),
            ConditionToken::Gte => (Operator::Gte, value),
            ConditionToken::Not => (Operator::NotEq, value),
            ConditionToken::In => {
                let values = match value {
                    Value::Array(values) => values,
                    scalar => vec![scalar],
                };
                (Operator::In, Value::Array(values))
            }
            ConditionToken::Is
            | ConditionToken::Like
            | ConditionToken::Equal
            | ConditionToken::Equals
            | ConditionToken::Eq => (Operator::Like, value),
        }
    }
}

fn wrap_like(value: Value, leading: bool, trailing: bool) -> Value {
    let text = match value {
        Value::String(s) => s,
        other => other.to_string(),
    };
    let mut pattern = String::new();
    if leading {
        pattern.push('%');
    }
    pattern.push_str(&text);
    if trailing {
        pattern.push('%');
    }
    Value::String(pattern)
}

/// AND/OR verb prefix of a `where_*` method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhereVerb {
    Where,
    AndWhere,
    OrWhere,
}

/// A method name parsed against the grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DynamicCall {
    Finder {
        action: FinderAction,
        fields: Vec<String>,
    },
    Where {
        verb: WhereVerb,
        field: String,
        condition: ConditionToken,
    },
    With {
        field: String,
    },
}

// Grammar tables, evaluated in declaration order. Longer finder prefixes
// come first so `find_by_` never shadows `find_all_by_` or `find_or_*`.
const FINDER_PREFIXES: &[(&str, FinderAction)] = &[
    ("find_or_initialize_by_", FinderAction::FindOrInitialize),
    ("find_or_create_by_", FinderAction::FindOrCreate),
    ("find_all_by_", FinderAction::FindAll),
    ("count_all_by_", FinderAction::CountAll),
    ("find_by_", FinderAction::Find),
];

const WHERE_PREFIXES: &[(&str, WhereVerb)] = &[
    ("or_where_", WhereVerb::OrWhere),
    ("and_where_", WhereVerb::AndWhere),
    ("where_", WhereVerb::Where),
];

// Longest tokens first so `_starts_with` is never mis-read as `_with` and
// `_equals` beats `_equal`.
const CONDITION_TOKENS: &[(&str, ConditionToken)] = &[
    ("starts_with", ConditionToken::StartsWith),
    ("ends_with", ConditionToken::EndsWith),
    ("contains", ConditionToken::Contains),
    ("equals", ConditionToken::Equals),
    ("before", ConditionToken::Before),
    ("equal", ConditionToken::Equal),
    ("after", ConditionToken::After),
    ("like", ConditionToken::Like),
    ("gte", ConditionToken::Gte),
    ("lte", ConditionToken::Lte),
    ("not", ConditionToken::Not),
    ("eq", ConditionToken::Eq),
    ("gt", ConditionToken::Gt),
    ("lt", ConditionToken::Lt),
    ("in", ConditionToken::In),
    ("is", ConditionToken::Is),
];

fn is_word(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse a method name against the grammar. Returns None for names matching
/// no pattern; the dispatcher turns that into an explicit error.
pub fn parse(method_name: &str) -> Option<DynamicCall> {
    for (prefix, action) in FINDER_PREFIXES {
        if let Some(rest) = method_name.strip_prefix(prefix) {
            // a two-field name splits at the last `_and_`
            let fields = match rest.rfind("_and_") {
                Some(at) => vec![rest[..at].to_string(), rest[at + 5..].to_string()],
                None => vec![rest.to_string()],
            };
            if fields.iter().all(|f| is_word(f)) {
                return Some(DynamicCall::Finder {
                    action: *action,
                    fields,
                });
            }
            return None;
        }
    }

    for (prefix, verb) in WHERE_PREFIXES {
        if let Some(rest) = method_name.strip_prefix(prefix) {
            for (token, condition) in CONDITION_TOKENS {
                if let Some(field) = rest
                    .strip_suffix(token)
                    .and_then(|f| f.strip_suffix('_'))
                {
                    if is_word(field) {
                        return Some(DynamicCall::Where {
                            verb: *verb,
                            field: field.to_string(),
                            condition: *condition,
                        });
                    }
                }
            }
            return None;
        }
    }

    if let Some(field) = method_name.strip_prefix("with_") {
        if is_word(field) {
            return Some(DynamicCall::With {
                field: field.to_string(),
            });
        }
    }

    None
}

/// True for the argument shapes that short-circuit a `where_*`/`with_*`
/// call: absent, null, empty string, empty array
fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(values)) => values.is_empty(),
        _ => false,
    }
}

/// Result of dispatching a dynamic method
#[derive(Debug)]
pub enum Dispatched {
    One(Option<Record>),
    Many(Vec<Record>),
    Count(i64),
    /// Condition-only patterns hand the builder back for further chaining
    Chained(QueryBuilder),
}

impl QueryBuilder {
    /// Parse `method_name` against the dynamic grammar and perform it.
    /// Unrecognized names surface as [`OrmError::UnrecognizedMethod`] so the
    /// caller can propagate a missing-method condition.
    pub async fn dispatch(
        mut self,
        registry: &ModelRegistry,
        executor: &dyn QueryExecutor,
        method_name: &str,
        args: &[Value],
    ) -> Result<Dispatched> {
        let call = parse(method_name)
            .ok_or_else(|| OrmError::UnrecognizedMethod(method_name.to_string()))?;
        tracing::debug!(method = method_name, ?call, "dynamic dispatch");

        match call {
            DynamicCall::Finder { action, fields } => {
                for (index, field) in fields.iter().enumerate() {
                    let value = args.get(index).cloned().unwrap_or(Value::Null);
                    let column = self.model().qualified(field);
                    self = self.where_eq(&column, value);
                }
                match action {
                    FinderAction::Find => Ok(Dispatched::One(self.find(executor).await?)),
                    FinderAction::FindAll => Ok(Dispatched::Many(self.find_all(executor).await?)),
                    FinderAction::CountAll => {
                        Ok(Dispatched::Count(self.count_all(executor).await?))
                    }
                    FinderAction::FindOrInitialize | FinderAction::FindOrCreate => {
                        if let Some(existing) = self.find(executor).await? {
                            return Ok(Dispatched::One(Some(existing)));
                        }
                        let mut record = Record::new(self.model().clone());
                        for (index, field) in fields.iter().enumerate() {
                            let value = args.get(index).cloned().unwrap_or(Value::Null);
                            record.set(field, value)?;
                        }
                        if action == FinderAction::FindOrCreate {
                            record.create(registry, executor, None).await?;
                        }
                        Ok(Dispatched::One(Some(record)))
                    }
                }
            }

            DynamicCall::Where {
                verb,
                field,
                condition,
            } => {
                let value = args.first();
                if is_empty_value(value) {
                    return Ok(Dispatched::Chained(self));
                }
                let (operator, value) = condition.apply(value.cloned().unwrap_or(Value::Null));
                let join = match verb {
                    WhereVerb::OrWhere => LogicalOperator::Or,
                    WhereVerb::Where | WhereVerb::AndWhere => LogicalOperator::And,
                };
                let predicate = Predicate::cmp(field, operator, value, join)?;
                Ok(Dispatched::Chained(self.where_clause(predicate)))
            }

            DynamicCall::With { field } => {
                let value = args.first();
                if is_empty_value(value) {
                    return Ok(Dispatched::Chained(self));
                }
                let value = value.cloned().unwrap_or(Value::Null);
                Ok(Dispatched::Chained(self.where_eq(&field, value)))
            }
        }
    }
}

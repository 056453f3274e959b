use crate::error::{OrmError, Result};
use serde_json::Value;

/// SQL comparison operators supported by predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    In,
    Is,
    IsNot,
}

impl Operator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Like => "LIKE",
            Operator::In => "IN",
            Operator::Is => "IS",
            Operator::IsNot => "IS NOT",
        }
    }

    /// Structural compatibility between operator and value shape.
    /// IN takes an array, IS/IS NOT take null, everything else takes a scalar.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Operator::In => value.is_array(),
            Operator::Is | Operator::IsNot => value.is_null(),
            _ => !value.is_array(),
        }
    }
}

/// How a predicate joins onto the ones before it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn as_sql(self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

/// A single WHERE predicate: column, operator, value, and the boolean join
/// connecting it to the preceding predicate
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
    pub join: LogicalOperator,
}

impl Predicate {
    /// General constructor, validating operator/value-shape compatibility
    pub fn cmp(
        column: impl Into<String>,
        operator: Operator,
        value: Value,
        join: LogicalOperator,
    ) -> Result<Self> {
        if !operator.accepts(&value) {
            return Err(OrmError::IncompatibleOperand {
                operator: operator.as_sql(),
            });
        }
        Ok(Self {
            column: column.into(),
            operator,
            value,
            join,
        })
    }

    /// Equality predicate; an array value is coerced to IN
    pub fn eq(column: impl Into<String>, value: Value) -> Self {
        let operator = if value.is_array() {
            Operator::In
        } else {
            Operator::Eq
        };
        Self {
            column: column.into(),
            operator,
            value,
            join: LogicalOperator::And,
        }
    }

    pub fn in_list(column: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            column: column.into(),
            operator: Operator::In,
            value: Value::Array(values),
            join: LogicalOperator::And,
        }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            operator: Operator::Is,
            value: Value::Null,
            join: LogicalOperator::And,
        }
    }

    pub fn is_not_null(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            operator: Operator::IsNot,
            value: Value::Null,
            join: LogicalOperator::And,
        }
    }

    /// Flip the boolean join to OR
    pub fn or(mut self) -> Self {
        self.join = LogicalOperator::Or;
        self
    }

    /// Convert predicate to SQL string
    pub fn to_sql(&self) -> String {
        match self.operator {
            Operator::In => {
                let list = match &self.value {
                    Value::Array(values) if !values.is_empty() => values
                        .iter()
                        .map(format_value)
                        .collect::<Vec<_>>()
                        .join(", "),
                    // empty IN list can never match
                    _ => "NULL".to_string(),
                };
                format!("{} IN ({})", self.column, list)
            }
            _ => format!(
                "{} {} {}",
                self.column,
                self.operator.as_sql(),
                format_value(&self.value)
            ),
        }
    }
}

/// Ordered, appendable predicate list. Insertion order is preserved all the
/// way into the compiled statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateSet {
    predicates: Vec<Predicate>,
}

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn and_where(&mut self, column: &str, operator: Operator, value: Value) -> Result<()> {
        self.push(Predicate::cmp(column, operator, value, LogicalOperator::And)?);
        Ok(())
    }

    pub fn or_where(&mut self, column: &str, operator: Operator, value: Value) -> Result<()> {
        self.push(Predicate::cmp(column, operator, value, LogicalOperator::Or)?);
        Ok(())
    }

    pub fn extend(&mut self, other: PredicateSet) {
        self.predicates.extend(other.predicates);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates.iter()
    }

    /// Convert to SQL string; the first predicate's join is omitted
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();
        for (index, predicate) in self.predicates.iter().enumerate() {
            if index > 0 {
                sql.push(' ');
                sql.push_str(predicate.join.as_sql());
                sql.push(' ');
            }
            sql.push_str(&predicate.to_sql());
        }
        sql
    }
}

/// Format a JSON value for SQL
pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        _ => format!("'{}'", value.to_string().replace('\'', "''")),
    }
}

use chrono::Utc;
use serde_json::Value;

use super::conditions::{LogicalOperator, Operator, Predicate, PredicateSet};

/// How timestamp columns are written: epoch seconds or a chrono format string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampFormat {
    Epoch,
    Formatted(String),
}

impl TimestampFormat {
    /// The current time rendered in this format, as a column value
    pub fn now_value(&self) -> Value {
        match self {
            TimestampFormat::Epoch => Value::from(Utc::now().timestamp()),
            TimestampFormat::Formatted(format) => {
                Value::from(Utc::now().format(format).to_string())
            }
        }
    }
}

/// A timestamp column plus its write format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampColumn {
    pub column: String,
    pub format: TimestampFormat,
}

impl TimestampColumn {
    pub fn new(column: impl Into<String>, format: TimestampFormat) -> Self {
        Self {
            column: column.into(),
            format,
        }
    }
}

/// Per-model visibility column configuration. Either concern may be disabled
/// by leaving its column unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeConfig {
    pub deleted: Option<TimestampColumn>,
    pub published: Option<TimestampColumn>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletedVisibility {
    #[default]
    Default,
    WithDeleted,
    OnlyDeleted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PublishedVisibility {
    #[default]
    Default,
    WithUnpublished,
    OnlyUnpublished,
}

/// Per-builder visibility state. Tagged state rather than accumulated
/// predicates, so repeated toggle calls stay idempotent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeState {
    pub deleted: DeletedVisibility,
    pub published: PublishedVisibility,
}

impl ScopeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deleted(&mut self) {
        self.deleted = DeletedVisibility::WithDeleted;
    }

    pub fn only_deleted(&mut self) {
        self.deleted = DeletedVisibility::OnlyDeleted;
    }

    pub fn with_unpublished(&mut self) {
        self.published = PublishedVisibility::WithUnpublished;
    }

    pub fn only_unpublished(&mut self) {
        self.published = PublishedVisibility::OnlyUnpublished;
    }

    /// Inject visibility predicates for the configured columns. Called once
    /// at compile time, before any user predicates.
    pub fn apply(&self, config: &ScopeConfig, out: &mut PredicateSet) {
        if let Some(deleted) = &config.deleted {
            match self.deleted {
                DeletedVisibility::Default => {
                    out.push(Predicate::is_null(&deleted.column));
                }
                DeletedVisibility::WithDeleted => {}
                DeletedVisibility::OnlyDeleted => {
                    out.push(Predicate::is_not_null(&deleted.column));
                }
            }
        }

        if let Some(published) = &config.published {
            match self.published {
                PublishedVisibility::Default => {
                    out.push(Predicate::is_not_null(&published.column));
                    out.push(Predicate {
                        column: published.column.clone(),
                        operator: Operator::Lte,
                        value: published.format.now_value(),
                        join: LogicalOperator::And,
                    });
                }
                PublishedVisibility::WithUnpublished => {}
                PublishedVisibility::OnlyUnpublished => {
                    out.push(Predicate::is_null(&published.column));
                }
            }
        }
    }
}

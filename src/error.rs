use std::collections::HashMap;

/// Field name to human-readable message, as produced by a validation service.
pub type FieldErrors = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrmError {
    #[error("validation failed on {} field(s)", .0.len())]
    ValidationFailed(FieldErrors),

    #[error("cannot {action} {model} record because it is not loaded")]
    NotLoaded { model: String, action: &'static str },

    #[error("unknown relation {relation} on model {model}")]
    UnknownRelation { model: String, relation: String },

    #[error("unrecognized dynamic method {0}")]
    UnrecognizedMethod(String),

    #[error("unknown model {0}")]
    UnknownModel(String),

    #[error("unknown column {column} on model {model}")]
    UnknownColumn { model: String, column: String },

    #[error("operator {operator} is not compatible with the value shape")]
    IncompatibleOperand { operator: &'static str },

    #[error("database error: {0}")]
    Database(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<sqlx::Error> for OrmError {
    fn from(err: sqlx::Error) -> Self {
        OrmError::Database(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OrmError>;

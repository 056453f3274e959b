//! The seam to the validation-rule engine.
//!
//! Rule definitions and evaluation live outside this crate; the core only
//! carries a candidate record to a [`ValidationService`] and surfaces the
//! field→message map unchanged. Soft-delete, restore, publish, and unpublish
//! never pass through validation — they are direct column updates.

use crate::models::record::Record;

pub use crate::error::FieldErrors;

/// Validates a candidate record before create/update. Implementations
/// return the full field→message map on failure; the core stores it on the
/// record for `try_*` recovery or raises it as a validation error.
pub trait ValidationService: Send + Sync {
    fn validate(&self, record: &Record) -> Result<(), FieldErrors>;
}

impl<F> ValidationService for F
where
    F: Fn(&Record) -> Result<(), FieldErrors> + Send + Sync,
{
    fn validate(&self, record: &Record) -> Result<(), FieldErrors> {
        self(record)
    }
}

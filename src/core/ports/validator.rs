//! Constraint validator port
//!
//! The matcher delegates the evaluation of a rule's constraint to a
//! validator. A validator reports rule failures as error messages; an `Err`
//! means it could not evaluate the constraint at all.

use serde_json::Value;

use crate::core::error::ValidationError;
use crate::core::models::Constraint;

/// Evaluates constraints against attribute values
pub trait ConstraintValidator: Send + Sync {
    /// Validate `value` (the resolved value of `attribute`) against `constraint`
    ///
    /// Returns the failure messages; an empty list means the value passes.
    fn validate(
        &self,
        attribute: &str,
        value: Option<&Value>,
        constraint: &Constraint,
    ) -> Result<Vec<String>, ValidationError>;
}

//! Domain error model.

use serde::Serialize;
use thiserror::Error;

/// A single field-level contract violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    pub fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// Validation failure carrying every violated field contract.
///
/// Validation is all-or-nothing: rules collect every violation before any
/// store mutation happens, so one response can enumerate all of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed on {} field(s)", .0.len())]
pub struct ValidationError(pub Vec<FieldError>);

impl ValidationError {
    /// Return `Ok(())` when no violations were collected.
    pub fn check(fields: Vec<FieldError>) -> Result<(), ValidationError> {
        if fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError(fields))
        }
    }

    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_passes_with_no_violations() {
        assert!(ValidationError::check(Vec::new()).is_ok());
    }

    #[test]
    fn check_keeps_every_violation() {
        let err = ValidationError::check(vec![
            FieldError::new("name", "must be uppercase"),
            FieldError::new("purchasePrice", "must be greater than zero"),
        ])
        .unwrap_err();
        assert_eq!(err.fields().len(), 2);
        assert_eq!(err.fields()[0].field, "name");
    }
}

//! Test validators: fixed-outcome `Validator` implementations for tests.

use strata_core::error::DomainError;
use strata_core::validation::{ValidationResult, Validator};

/// Accepts every model.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysValid;

impl<M> Validator<M> for AlwaysValid {
    fn validate(&self, _model: &M) -> Result<ValidationResult, DomainError> {
        Ok(ValidationResult::valid())
    }
}

/// Rejects every model with a single error message.
#[derive(Debug, Clone, Copy)]
pub struct AlwaysInvalid(pub &'static str);

impl<M> Validator<M> for AlwaysInvalid {
    fn validate(&self, _model: &M) -> Result<ValidationResult, DomainError> {
        Ok(ValidationResult::invalid(None, self.0))
    }
}

/// Raises a validation error instead of producing a result.
#[derive(Debug, Clone, Copy)]
pub struct FailingValidator;

impl<M> Validator<M> for FailingValidator {
    fn validate(&self, _model: &M) -> Result<ValidationResult, DomainError> {
        Err(DomainError::Validation("validator unavailable".into()))
    }
}

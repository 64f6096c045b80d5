//! Validation boundary consumed by the change tracker.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// How serious a validation message is. Only `Error` makes a result invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Informational note.
    Info,
    /// Suspicious but acceptable.
    Warning,
    /// Rule violation.
    Error,
}

/// A single finding produced by a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMessage {
    /// The property the finding refers to, if any.
    pub property: Option<String>,
    /// Human-readable description.
    pub message: String,
    /// Severity of the finding.
    pub severity: Severity,
}

impl fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.property {
            Some(property) => write!(f, "{property}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Outcome of validating a model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    messages: Vec<ValidationMessage>,
}

impl ValidationResult {
    /// A result with no messages.
    #[must_use]
    pub fn valid() -> Self {
        Self::default()
    }

    /// A result carrying a single error.
    #[must_use]
    pub fn invalid(property: Option<&str>, message: impl Into<String>) -> Self {
        let mut result = Self::default();
        result.push(property, message, Severity::Error);
        result
    }

    /// Appends a message.
    pub fn push(&mut self, property: Option<&str>, message: impl Into<String>, severity: Severity) {
        self.messages.push(ValidationMessage {
            property: property.map(str::to_owned),
            message: message.into(),
            severity,
        });
    }

    /// Appends every message of `other`.
    pub fn merge(&mut self, other: ValidationResult) {
        self.messages.extend(other.messages);
    }

    /// True when no message has `Severity::Error`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.messages.iter().any(|m| m.severity == Severity::Error)
    }

    /// All messages, in the order they were produced.
    #[must_use]
    pub fn messages(&self) -> &[ValidationMessage] {
        &self.messages
    }

    /// Messages with `Severity::Error`.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationMessage> {
        self.messages.iter().filter(|m| m.severity == Severity::Error)
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.messages.is_empty() {
            return f.write_str("valid");
        }
        for (i, message) in self.messages.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{message}")?;
        }
        Ok(())
    }
}

/// Validates a model as a whole.
///
/// Returning `Ok` with an invalid result is the expected failure path.
/// Returning `Err` means validation itself could not complete.
pub trait Validator<M>: Send + Sync {
    /// Validates `model`.
    ///
    /// # Errors
    ///
    /// Returns a `DomainError` when validation cannot be carried out.
    fn validate(&self, model: &M) -> Result<ValidationResult, DomainError>;
}

impl<M, F> Validator<M> for F
where
    F: Fn(&M) -> Result<ValidationResult, DomainError> + Send + Sync,
{
    fn validate(&self, model: &M) -> Result<ValidationResult, DomainError> {
        self(model)
    }
}

type Predicate<M> = Box<dyn Fn(&M) -> bool + Send + Sync>;

struct Rule<M> {
    property: &'static str,
    message: &'static str,
    severity: Severity,
    holds: Predicate<M>,
}

/// An ordered list of property rules, each a predicate that must hold.
pub struct RuleSet<M> {
    rules: Vec<Rule<M>>,
}

impl<M> RuleSet<M> {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Adds an error rule: `holds` must return true for the model to be valid.
    #[must_use]
    pub fn rule(
        self,
        property: &'static str,
        message: &'static str,
        holds: impl Fn(&M) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.with_severity(property, message, Severity::Error, holds)
    }

    /// Adds a warning rule that reports without invalidating the model.
    #[must_use]
    pub fn warn(
        self,
        property: &'static str,
        message: &'static str,
        holds: impl Fn(&M) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.with_severity(property, message, Severity::Warning, holds)
    }

    fn with_severity(
        mut self,
        property: &'static str,
        message: &'static str,
        severity: Severity,
        holds: impl Fn(&M) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.rules.push(Rule {
            property,
            message,
            severity,
            holds: Box::new(holds),
        });
        self
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when the set has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<M> Default for RuleSet<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for RuleSet<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| (r.property, r.message)))
            .finish()
    }
}

impl<M> Validator<M> for RuleSet<M> {
    fn validate(&self, model: &M) -> Result<ValidationResult, DomainError> {
        let mut result = ValidationResult::valid();
        for rule in self.rules.iter().filter(|rule| !(rule.holds)(model)) {
            result.push(Some(rule.property), rule.message, rule.severity);
        }
        Ok(result)
    }
}

//! Event repository abstraction.
//!
//! The engine keeps its log in memory only. A repository is the persistence
//! collaborator that durably writes what a stream has not yet committed and
//! hands persisted history back for replay.

use uuid::Uuid;

use crate::error::DomainError;
use crate::event::EventMessage;

/// Repository trait for loading and appending domain events.
pub trait EventRepository: Send + Sync {
    /// Load all events for a given aggregate, ordered by version.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the backing store fails.
    fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventMessage>, DomainError>;

    /// Append new events to an aggregate stream with optimistic concurrency.
    /// `expected_version` is the last version the caller knows to be stored.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` if the stored version differs
    /// from `expected_version`, or `DomainError::Infrastructure` if the backing
    /// store fails.
    fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: u64,
        events: &[EventMessage],
    ) -> Result<(), DomainError>;
}

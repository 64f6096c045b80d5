//! Test repositories: `EventRepository` implementations for tests.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use strata_core::error::DomainError;
use strata_core::event::EventMessage;
use strata_core::repository::EventRepository;
use uuid::Uuid;

/// An in-memory event store with optimistic concurrency.
///
/// `append_events` succeeds only when `expected_version` equals the number of
/// events already stored for the aggregate.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    streams: Mutex<HashMap<Uuid, Vec<EventMessage>>>,
}

impl InMemoryEventRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events stored for `aggregate_id`.
    #[must_use]
    pub fn stored_version(&self, aggregate_id: Uuid) -> u64 {
        self.streams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&aggregate_id)
            .map_or(0, |events| u64::try_from(events.len()).unwrap_or(u64::MAX))
    }
}

impl EventRepository for InMemoryEventRepository {
    fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventMessage>, DomainError> {
        Ok(self
            .streams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&aggregate_id)
            .cloned()
            .unwrap_or_default())
    }

    fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: u64,
        events: &[EventMessage],
    ) -> Result<(), DomainError> {
        let mut streams = self.streams.lock().unwrap_or_else(PoisonError::into_inner);
        let stored = streams.entry(aggregate_id).or_default();
        let actual = u64::try_from(stored.len()).unwrap_or(u64::MAX);
        if actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }
        stored.extend_from_slice(events);
        Ok(())
    }
}

/// An event repository that records all `append_events` calls. Returns the
/// configured events from every `load_events` call and always succeeds on
/// `append_events`.
#[derive(Debug)]
pub struct RecordingEventRepository {
    load_result: Vec<EventMessage>,
    appended: Mutex<Vec<(Uuid, u64, Vec<EventMessage>)>>,
}

impl RecordingEventRepository {
    /// Create a new recording repository that will return `load_result` from
    /// every `load_events` call.
    #[must_use]
    pub fn new(load_result: Vec<EventMessage>) -> Self {
        Self {
            load_result,
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all appends as `(aggregate_id, expected_version,
    /// events)`.
    #[must_use]
    pub fn appended_events(&self) -> Vec<(Uuid, u64, Vec<EventMessage>)> {
        self.appended
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventRepository for RecordingEventRepository {
    fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<EventMessage>, DomainError> {
        Ok(self.load_result.clone())
    }

    fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: u64,
        events: &[EventMessage],
    ) -> Result<(), DomainError> {
        self.appended
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((aggregate_id, expected_version, events.to_vec()));
        Ok(())
    }
}

/// An event repository that always returns an empty event list and silently
/// accepts appends. Useful for testing "aggregate not found" scenarios.
#[derive(Debug)]
pub struct EmptyEventRepository;

impl EventRepository for EmptyEventRepository {
    fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<EventMessage>, DomainError> {
        Ok(vec![])
    }

    fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: u64,
        _events: &[EventMessage],
    ) -> Result<(), DomainError> {
        Ok(())
    }
}

/// An event repository that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventRepository;

impl EventRepository for FailingEventRepository {
    fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<EventMessage>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: u64,
        _events: &[EventMessage],
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An aggregate identity was the nil UUID.
    #[error("aggregate id must not be empty")]
    EmptyAggregateId,

    /// An event timestamp was the default (epoch) value.
    #[error("event timestamp must not be the default value")]
    DefaultTimestamp,

    /// An event version was not a positive integer.
    #[error("event version must be positive, got {0}")]
    InvalidVersion(u64),

    /// An index-based change referenced a position outside the collection.
    #[error("index {index} is out of range for a collection of length {len}")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The length of the collection at construction time.
        len: usize,
    },

    /// `init` was called on a tracker that is already bound to a model.
    #[error("change tracker is already bound to a model")]
    TrackerAlreadyInitialized,

    /// The tracker was used before a model was bound.
    #[error("change tracker has not been bound to a model")]
    TrackerNotInitialized,

    /// A stream was rebuilt from an empty batch of messages.
    #[error("cannot build an event stream from an empty batch")]
    EmptyEventBatch,

    /// A batch of messages referenced more than one aggregate.
    #[error("event batch mixes aggregates: expected {expected}, found {found}")]
    MixedAggregates {
        /// The aggregate of the first message in the batch.
        expected: Uuid,
        /// The first differing aggregate encountered.
        found: Uuid,
    },

    /// A batch of messages had a gap or was out of order.
    #[error("event batch is out of order: expected version {expected}, found {found}")]
    OutOfOrderVersion {
        /// The version the next message should have carried.
        expected: u64,
        /// The version it actually carried.
        found: u64,
    },

    /// No handler is registered for the event's runtime type.
    #[error("aggregate {aggregate} has no handler for event {event_type}")]
    UnsupportedEvent {
        /// The aggregate kind that rejected the event.
        aggregate: &'static str,
        /// The event type name.
        event_type: &'static str,
    },

    /// Replaying history produced a model that fails validation.
    #[error("replayed history is invalid: {0}")]
    InvalidHistory(String),

    /// An aggregate was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: u64,
        /// The actual version found.
        actual: u64,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

//! Domain event abstractions.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Access to the concrete type behind a trait object.
///
/// Implemented for every `'static` type; dispatch tables use it to route an
/// event to the handler registered for its runtime type.
pub trait AsAny: Any {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Trait that all domain events implement.
pub trait DomainEvent: AsAny + Send + Sync + fmt::Debug {
    /// Returns the event type name (used for logging and persistence routing).
    fn event_type(&self) -> &'static str;

    /// Serializes the event payload to JSON.
    fn to_payload(&self) -> serde_json::Value;
}

impl dyn DomainEvent + '_ {
    /// Returns the runtime type of the event behind the trait object.
    #[must_use]
    pub fn runtime_type(&self) -> TypeId {
        self.as_any().type_id()
    }

    /// Downcasts the event to a concrete type.
    #[must_use]
    pub fn downcast_ref<E: DomainEvent>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }
}

/// Positional metadata assigned to an event when it joins a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EventInfo {
    version: u64,
    aggregate_id: Uuid,
    created_at: DateTime<Utc>,
}

impl EventInfo {
    /// Creates event metadata.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidVersion` if `version` is zero,
    /// `DomainError::EmptyAggregateId` if `aggregate_id` is nil, and
    /// `DomainError::DefaultTimestamp` if `created_at` is the default value.
    pub fn new(
        version: u64,
        aggregate_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if version == 0 {
            return Err(DomainError::InvalidVersion(version));
        }
        if aggregate_id.is_nil() {
            return Err(DomainError::EmptyAggregateId);
        }
        if created_at == DateTime::<Utc>::default() {
            return Err(DomainError::DefaultTimestamp);
        }
        Ok(Self {
            version,
            aggregate_id,
            created_at,
        })
    }

    /// Position of the event within its aggregate stream, starting at 1.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The aggregate this event belongs to.
    #[must_use]
    pub fn aggregate_id(&self) -> Uuid {
        self.aggregate_id
    }

    /// When the event was appended.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// An event payload paired with its stream metadata.
#[derive(Debug, Clone)]
pub struct EventMessage {
    info: EventInfo,
    event: Arc<dyn DomainEvent>,
}

impl EventMessage {
    /// Pairs `event` with `info`.
    #[must_use]
    pub fn new(info: EventInfo, event: Arc<dyn DomainEvent>) -> Self {
        Self { info, event }
    }

    /// The message metadata.
    #[must_use]
    pub fn info(&self) -> &EventInfo {
        &self.info
    }

    /// The opaque event payload.
    #[must_use]
    pub fn event(&self) -> &dyn DomainEvent {
        self.event.as_ref()
    }

    /// Shared handle to the event payload.
    #[must_use]
    pub fn event_arc(&self) -> Arc<dyn DomainEvent> {
        Arc::clone(&self.event)
    }

    /// Shorthand for `info().version()`.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.info.version
    }

    /// Shorthand for `info().aggregate_id()`.
    #[must_use]
    pub fn aggregate_id(&self) -> Uuid {
        self.info.aggregate_id
    }

    /// Builds the serializable record a persistence collaborator writes.
    #[must_use]
    pub fn to_record(&self) -> EventRecord {
        EventRecord {
            version: self.info.version,
            aggregate_id: self.info.aggregate_id,
            created_at: self.info.created_at,
            event_type: self.event.event_type().to_owned(),
            payload: self.event.to_payload(),
        }
    }
}

/// Flat, serializable form of an [`EventMessage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position within the aggregate stream.
    pub version: u64,
    /// Aggregate this event belongs to.
    pub aggregate_id: Uuid,
    /// Timestamp of event creation.
    pub created_at: DateTime<Utc>,
    /// Type name for deserialization routing.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Debug, Serialize)]
    struct Renamed {
        name: String,
    }

    impl DomainEvent for Renamed {
        fn event_type(&self) -> &'static str {
            "test.renamed"
        }

        fn to_payload(&self) -> serde_json::Value {
            serde_json::to_value(self).unwrap_or_default()
        }
    }

    #[derive(Debug, Serialize)]
    struct Deleted;

    impl DomainEvent for Deleted {
        fn event_type(&self) -> &'static str {
            "test.deleted"
        }

        fn to_payload(&self) -> serde_json::Value {
            serde_json::Value::Null
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_event_info_rejects_zero_version() {
        // Act
        let result = EventInfo::new(0, Uuid::new_v4(), fixed_now());

        // Assert
        assert!(matches!(result, Err(DomainError::InvalidVersion(0))));
    }

    #[test]
    fn test_event_info_rejects_nil_aggregate_id() {
        // Act
        let result = EventInfo::new(1, Uuid::nil(), fixed_now());

        // Assert
        assert!(matches!(result, Err(DomainError::EmptyAggregateId)));
    }

    #[test]
    fn test_event_info_rejects_default_timestamp() {
        // Act
        let result = EventInfo::new(1, Uuid::new_v4(), DateTime::<Utc>::default());

        // Assert
        assert!(matches!(result, Err(DomainError::DefaultTimestamp)));
    }

    #[test]
    fn test_event_info_equality_is_structural() {
        // Arrange
        let aggregate_id = Uuid::new_v4();

        // Act
        let a = EventInfo::new(3, aggregate_id, fixed_now()).unwrap();
        let b = EventInfo::new(3, aggregate_id, fixed_now()).unwrap();
        let c = EventInfo::new(4, aggregate_id, fixed_now()).unwrap();

        // Assert
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_downcast_recovers_concrete_event() {
        // Arrange
        let event: Arc<dyn DomainEvent> = Arc::new(Renamed {
            name: "ledger".to_owned(),
        });

        // Act
        let renamed = event.downcast_ref::<Renamed>();
        let deleted = event.downcast_ref::<Deleted>();

        // Assert
        assert_eq!(renamed.map(|e| e.name.as_str()), Some("ledger"));
        assert!(deleted.is_none());
        assert_eq!(event.runtime_type(), TypeId::of::<Renamed>());
    }

    #[test]
    fn test_to_record_carries_type_and_payload() {
        // Arrange
        let aggregate_id = Uuid::new_v4();
        let info = EventInfo::new(1, aggregate_id, fixed_now()).unwrap();
        let message = EventMessage::new(
            info,
            Arc::new(Renamed {
                name: "ledger".to_owned(),
            }),
        );

        // Act
        let record = message.to_record();

        // Assert
        assert_eq!(record.version, 1);
        assert_eq!(record.aggregate_id, aggregate_id);
        assert_eq!(record.created_at, fixed_now());
        assert_eq!(record.event_type, "test.renamed");
        assert_eq!(record.payload, serde_json::json!({ "name": "ledger" }));
    }
}

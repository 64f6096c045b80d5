//! Versioned, append-only event log for a single aggregate.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::DomainError;
use crate::event::{DomainEvent, EventInfo, EventMessage};

/// Ordered history of events for one aggregate identity.
///
/// Insertion order is version order. Committed messages may be dropped from
/// memory by [`EventStream::clear_committed`]; the number dropped is kept in
/// `version_offset` so `version()` and the versions already handed out never
/// change.
///
/// The stream itself is mutated through `&mut self`. Owners that share a
/// stream between threads wrap it in a `Mutex` and hold that guard for the
/// whole of any dispatch-then-append sequence.
#[derive(Debug, Clone)]
pub struct EventStream {
    aggregate_id: Uuid,
    messages: Vec<EventMessage>,
    version_offset: u64,
    committed_version: u64,
}

impl EventStream {
    /// Creates an empty stream for `aggregate_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyAggregateId` if `aggregate_id` is nil.
    pub fn new(aggregate_id: Uuid) -> Result<Self, DomainError> {
        if aggregate_id.is_nil() {
            return Err(DomainError::EmptyAggregateId);
        }
        Ok(Self {
            aggregate_id,
            messages: Vec::new(),
            version_offset: 0,
            committed_version: 0,
        })
    }

    /// Creates an empty stream with a freshly generated identity.
    #[must_use]
    pub fn with_new_id() -> Self {
        Self {
            aggregate_id: Uuid::now_v7(),
            messages: Vec::new(),
            version_offset: 0,
            committed_version: 0,
        }
    }

    /// Rebuilds a stream from a persisted batch.
    ///
    /// The batch must be non-empty, belong to a single aggregate, and carry
    /// versions `1..=n` in order. The resulting stream is fully committed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyEventBatch` for an empty batch,
    /// `DomainError::MixedAggregates` if aggregate ids differ, and
    /// `DomainError::OutOfOrderVersion` on a gap or reordering.
    pub fn from_messages(messages: Vec<EventMessage>) -> Result<Self, DomainError> {
        let Some(first) = messages.first() else {
            return Err(DomainError::EmptyEventBatch);
        };
        let aggregate_id = first.aggregate_id();

        for (expected, message) in (1_u64..).zip(&messages) {
            if message.aggregate_id() != aggregate_id {
                return Err(DomainError::MixedAggregates {
                    expected: aggregate_id,
                    found: message.aggregate_id(),
                });
            }
            if message.version() != expected {
                return Err(DomainError::OutOfOrderVersion {
                    expected,
                    found: message.version(),
                });
            }
        }

        let version = len_as_version(messages.len());
        Ok(Self {
            aggregate_id,
            messages,
            version_offset: 0,
            committed_version: version,
        })
    }

    /// The aggregate this stream belongs to.
    #[must_use]
    pub fn aggregate_id(&self) -> Uuid {
        self.aggregate_id
    }

    /// Version of the most recent event, counting compacted ones.
    #[must_use]
    pub fn version(&self) -> u64 {
        len_as_version(self.messages.len()) + self.version_offset
    }

    /// High-water mark of durably persisted events.
    #[must_use]
    pub fn committed_version(&self) -> u64 {
        self.committed_version
    }

    /// Number of events dropped from memory by compaction.
    #[must_use]
    pub fn version_offset(&self) -> u64 {
        self.version_offset
    }

    /// True when the stream was never compacted, has nothing pending and
    /// holds at least one event.
    #[must_use]
    pub fn contains_full_history(&self) -> bool {
        self.version_offset == 0 && self.committed_version == self.version() && self.version() > 0
    }

    /// Number of messages held in memory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when no messages are held in memory.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages held in memory, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[EventMessage] {
        &self.messages
    }

    /// Iterates the messages held in memory, oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, EventMessage> {
        self.messages.iter()
    }

    /// Builds the metadata for the next event without appending it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DefaultTimestamp` if `clock` yields the default
    /// timestamp.
    pub fn next_event_info(&self, clock: &dyn Clock) -> Result<EventInfo, DomainError> {
        EventInfo::new(self.version() + 1, self.aggregate_id, clock.now())
    }

    /// Appends `event` as the next version and returns its message.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DefaultTimestamp` if `clock` yields the default
    /// timestamp.
    pub fn add(
        &mut self,
        event: Arc<dyn DomainEvent>,
        clock: &dyn Clock,
    ) -> Result<&EventMessage, DomainError> {
        let info = self.next_event_info(clock)?;
        Ok(self.push(EventMessage::new(info, event)))
    }

    /// Appends a message whose metadata came from [`Self::next_event_info`].
    pub(crate) fn push(&mut self, message: EventMessage) -> &EventMessage {
        debug_assert_eq!(message.version(), self.version() + 1);
        debug!(
            aggregate_id = %self.aggregate_id,
            version = message.version(),
            event_type = message.event().event_type(),
            "event appended"
        );
        let index = self.messages.len();
        self.messages.push(message);
        &self.messages[index]
    }

    /// Messages appended since the last commit, oldest first.
    #[must_use]
    pub fn uncommitted(&self) -> &[EventMessage] {
        &self.messages[self.committed_len()..]
    }

    /// Marks every appended message as durably persisted.
    pub fn mark_all_as_committed(&mut self) {
        self.committed_version = self.version();
        debug!(
            aggregate_id = %self.aggregate_id,
            committed_version = self.committed_version,
            "stream committed"
        );
    }

    /// Drops the committed prefix from memory and returns how many messages
    /// were removed. `version()` is unchanged.
    pub fn clear_committed(&mut self) -> usize {
        let removed = self.committed_len();
        self.messages.drain(..removed);
        self.version_offset += len_as_version(removed);
        debug!(
            aggregate_id = %self.aggregate_id,
            removed,
            version_offset = self.version_offset,
            "committed events cleared"
        );
        removed
    }

    /// Number of in-memory messages at or below `committed_version`.
    fn committed_len(&self) -> usize {
        usize::try_from(self.committed_version - self.version_offset).unwrap_or(usize::MAX)
    }
}

impl<'a> IntoIterator for &'a EventStream {
    type Item = &'a EventMessage;
    type IntoIter = std::slice::Iter<'a, EventMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

fn len_as_version(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

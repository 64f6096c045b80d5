//! Event-sourced aggregate root abstraction.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::dispatch::HandlerTable;
use crate::error::DomainError;
use crate::event::{DomainEvent, EventMessage};
use crate::repository::EventRepository;
use crate::stream::EventStream;
use crate::tracker::{ModelChangeTracker, TrackerState};
use crate::validation::{ValidationResult, Validator};

/// State of an event-sourced aggregate.
///
/// The implementing type is the model the change tracker mutates; its
/// handler table says how each event type changes it.
pub trait Aggregate: Sized + Send + 'static {
    /// Aggregate kind, used in errors and logs.
    const KIND: &'static str;

    /// The dispatch table for this aggregate type.
    fn handlers() -> &'static HandlerTable<Self>;
}

/// Owns an aggregate's state and its event stream, and turns each event into
/// a validated, reversible state transition.
///
/// Both the stream and the tracker are guarded by mutexes. `apply_change`
/// holds the stream guard from dispatch through append, so two threads
/// sharing a root can never hand out the same version twice.
pub struct EventSourcedAggregateRoot<A: Aggregate> {
    stream: Mutex<EventStream>,
    tracker: ModelChangeTracker<A>,
    clock: Arc<dyn Clock>,
}

impl<A: Aggregate> EventSourcedAggregateRoot<A> {
    /// Creates a root with an empty stream for `aggregate_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyAggregateId` if `aggregate_id` is nil.
    pub fn new(
        aggregate_id: Uuid,
        state: A,
        validator: impl Validator<A> + 'static,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DomainError> {
        let tracker = ModelChangeTracker::new();
        tracker.init(state, validator)?;
        Ok(Self {
            stream: Mutex::new(EventStream::new(aggregate_id)?),
            tracker,
            clock,
        })
    }

    /// Creates a root and replays `history` into `state`.
    ///
    /// # Errors
    ///
    /// See [`Self::load_events`].
    pub fn from_history(
        state: A,
        validator: impl Validator<A> + 'static,
        history: EventStream,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DomainError> {
        let root = Self::new(history.aggregate_id(), state, validator, clock)?;
        root.load_events(history)?;
        Ok(root)
    }

    /// Rebuilds a root from the events `repo` holds for `aggregate_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if nothing is stored, the
    /// integrity errors of [`EventStream::from_messages`], or any replay
    /// error from [`Self::load_events`].
    pub fn load(
        repo: &dyn EventRepository,
        aggregate_id: Uuid,
        state: A,
        validator: impl Validator<A> + 'static,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DomainError> {
        let messages = repo.load_events(aggregate_id)?;
        if messages.is_empty() {
            return Err(DomainError::AggregateNotFound(aggregate_id));
        }
        Self::from_history(state, validator, EventStream::from_messages(messages)?, clock)
    }

    /// Returns the aggregate identifier.
    #[must_use]
    pub fn aggregate_id(&self) -> Uuid {
        self.stream().aggregate_id()
    }

    /// Returns the current stream version.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.stream().version()
    }

    /// Takes the stream's exclusivity guard.
    ///
    /// Commit bookkeeping (`mark_all_as_committed`, `clear_committed`) goes
    /// through this guard so it cannot interleave with `apply_change`.
    pub fn stream(&self) -> MutexGuard<'_, EventStream> {
        self.stream.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads the aggregate state.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::TrackerNotInitialized` if the tracker lost its
    /// model, which a constructed root never does.
    pub fn state<R>(&self, f: impl FnOnce(&A) -> R) -> Result<R, DomainError> {
        self.tracker.read(f)
    }

    /// Dispatches `event` to its handler, validates the result, and appends
    /// the event to the stream if valid. An invalid result is returned after
    /// every mutation the handler made has been undone.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnsupportedEvent` if no handler is registered,
    /// any error raised by the handler or validator (after rolling back), or
    /// `DomainError::DefaultTimestamp` if the clock is unset.
    #[instrument(
        skip(self, event),
        fields(aggregate = A::KIND, aggregate_id = %self.aggregate_id(), event_type = event.event_type())
    )]
    pub fn apply_change<E: DomainEvent>(&self, event: E) -> Result<ValidationResult, DomainError> {
        let event: Arc<dyn DomainEvent> = Arc::new(event);
        let mut stream = self.stream();
        let info = stream.next_event_info(self.clock.as_ref())?;

        let mut tracker = self.tracker.lock();
        tracker.changes().buffer_changes();
        let dispatched = tracker
            .scope()
            .and_then(|mut scope| A::handlers().dispatch(&mut scope, &*event));
        if let Err(error) = dispatched {
            warn!(%error, "event handler failed, rolling back");
            tracker.abandon();
            return Err(error);
        }

        let result = tracker.process()?;
        if result.is_valid() {
            stream.push(EventMessage::new(info, event));
        }
        Ok(result)
    }

    /// Replays `history` into the state without tracking, then adopts it as
    /// this root's stream.
    ///
    /// Replay mutations are not buffered and cannot be undone: if this
    /// returns an error the state is unusable and the root should be
    /// discarded. The current stream is only replaced on success.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnsupportedEvent` for an event with no handler,
    /// any handler error, or `DomainError::InvalidHistory` if the replayed
    /// state fails validation.
    #[instrument(
        skip(self, history),
        fields(aggregate = A::KIND, aggregate_id = %history.aggregate_id(), events = history.len())
    )]
    pub fn load_events(&self, history: EventStream) -> Result<(), DomainError> {
        let mut stream = self.stream();
        let mut tracker = self.tracker.lock();

        tracker.changes().initialize();
        let replayed = replay(&mut tracker, &history);
        tracker.changes().immediate();
        replayed?;

        let result = tracker.validate()?;
        if !result.is_valid() {
            return Err(DomainError::InvalidHistory(result.to_string()));
        }

        debug!(version = history.version(), "history loaded");
        *stream = history;
        Ok(())
    }

    /// Writes uncommitted events to `repo` and marks them committed.
    /// Returns how many events were written.
    ///
    /// # Errors
    ///
    /// Returns whatever `repo` reports; the stream is left uncommitted.
    #[instrument(skip(self, repo), fields(aggregate = A::KIND, aggregate_id = %self.aggregate_id()))]
    pub fn commit(&self, repo: &dyn EventRepository) -> Result<usize, DomainError> {
        let mut stream = self.stream();
        let pending = stream.uncommitted();
        if pending.is_empty() {
            return Ok(0);
        }
        let written = pending.len();
        repo.append_events(stream.aggregate_id(), stream.committed_version(), pending)?;
        stream.mark_all_as_committed();
        Ok(written)
    }
}

fn replay<A: Aggregate>(
    tracker: &mut TrackerState<A>,
    history: &EventStream,
) -> Result<(), DomainError> {
    for message in history {
        let mut scope = tracker.scope()?;
        A::handlers().dispatch(&mut scope, message.event())?;
    }
    Ok(())
}

impl<A: Aggregate + fmt::Debug> fmt::Debug for EventSourcedAggregateRoot<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSourcedAggregateRoot")
            .field("kind", &A::KIND)
            .field("stream", &*self.stream())
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

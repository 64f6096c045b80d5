//! Read-side projections.
//!
//! A projection folds events into a query model without tracking or
//! validation. Projections are allowed to be partial: an event whose type has
//! no registered handler is skipped, never rejected.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use crate::event::DomainEvent;
use crate::stream::EventStream;

type ProjectionHandler<P> = Box<dyn Fn(&mut P, &dyn DomainEvent) + Send + Sync>;

/// Maps event types to the functions that fold them into a projection.
pub struct ProjectionHandlers<P> {
    handlers: HashMap<TypeId, ProjectionHandler<P>>,
}

impl<P: 'static> ProjectionHandlers<P> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers `handler` for events of type `E`.
    #[must_use]
    pub fn on<E, F>(mut self, handler: F) -> Self
    where
        E: DomainEvent,
        F: Fn(&mut P, &E) + Send + Sync + 'static,
    {
        let erased: ProjectionHandler<P> = Box::new(move |state: &mut P, event: &dyn DomainEvent| {
            if let Some(event) = event.downcast_ref::<E>() {
                handler(state, event);
            }
        });
        self.handlers.insert(TypeId::of::<E>(), erased);
        self
    }

    /// True when a handler exists for the runtime type of `event`.
    #[must_use]
    pub fn handles(&self, event: &dyn DomainEvent) -> bool {
        self.handlers.contains_key(&event.runtime_type())
    }
}

impl<P: 'static> Default for ProjectionHandlers<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for ProjectionHandlers<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectionHandlers")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// A query model built by folding events.
pub trait Projection: Default + Send + 'static {
    /// Stable name for this projection, used in logs.
    const NAME: &'static str;

    /// The handler table for this projection type.
    fn handlers() -> &'static ProjectionHandlers<Self>;
}

/// Applies events to a projection, ignoring the ones it does not handle.
#[derive(Debug, Default)]
pub struct Projector<P: Projection> {
    state: P,
    applied: u64,
    ignored: u64,
}

impl<P: Projection> Projector<P> {
    /// Creates a projector over the default projection state.
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(P::default())
    }

    /// Creates a projector over `state`.
    #[must_use]
    pub fn with_state(state: P) -> Self {
        Self {
            state,
            applied: 0,
            ignored: 0,
        }
    }

    /// Folds `event` into the projection. Returns false, leaving the state
    /// untouched, when the projection has no handler for the event's type.
    pub fn apply_projection(&mut self, event: &dyn DomainEvent) -> bool {
        let Some(handler) = P::handlers().handlers.get(&event.runtime_type()) else {
            trace!(
                projection = P::NAME,
                event_type = event.event_type(),
                "event ignored by projection"
            );
            self.ignored += 1;
            return false;
        };
        handler(&mut self.state, event);
        self.applied += 1;
        true
    }

    /// Folds every message held by `stream`, oldest first. Returns how many
    /// events were handled.
    pub fn project_stream(&mut self, stream: &EventStream) -> usize {
        stream
            .iter()
            .filter(|message| self.apply_projection(message.event()))
            .count()
    }

    /// The projection state.
    #[must_use]
    pub fn state(&self) -> &P {
        &self.state
    }

    /// Consumes the projector, returning the state.
    #[must_use]
    pub fn into_state(self) -> P {
        self.state
    }

    /// Number of events folded in.
    #[must_use]
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// Number of events skipped for lack of a handler.
    #[must_use]
    pub fn ignored(&self) -> u64 {
        self.ignored
    }
}

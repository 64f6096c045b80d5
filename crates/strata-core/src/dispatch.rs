//! Typed event dispatch tables.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::tracker::ChangeScope;

type Handler<A> =
    Box<dyn Fn(&mut ChangeScope<'_, A>, &dyn DomainEvent) -> Result<(), DomainError> + Send + Sync>;

/// Maps event types to the handlers that mutate an aggregate.
///
/// Built once per aggregate type (typically inside a `OnceLock`) and shared by
/// every instance. Dispatching an event type with no registered handler is an
/// error.
pub struct HandlerTable<A> {
    aggregate: &'static str,
    handlers: HashMap<TypeId, Handler<A>>,
    event_types: Vec<&'static str>,
}

impl<A: 'static> HandlerTable<A> {
    /// Creates an empty table for the aggregate kind `aggregate`.
    #[must_use]
    pub fn new(aggregate: &'static str) -> Self {
        Self {
            aggregate,
            handlers: HashMap::new(),
            event_types: Vec::new(),
        }
    }

    /// Registers `handler` for events of type `E`, replacing any previous
    /// handler for that type.
    #[must_use]
    pub fn on<E, F>(mut self, handler: F) -> Self
    where
        E: DomainEvent,
        F: Fn(&mut ChangeScope<'_, A>, &E) -> Result<(), DomainError> + Send + Sync + 'static,
    {
        let aggregate = self.aggregate;
        let erased: Handler<A> = Box::new(
            move |scope: &mut ChangeScope<'_, A>, event: &dyn DomainEvent| {
                let Some(event) = event.downcast_ref::<E>() else {
                    return Err(DomainError::UnsupportedEvent {
                        aggregate,
                        event_type: event.event_type(),
                    });
                };
                handler(scope, event)
            },
        );
        self.handlers.insert(TypeId::of::<E>(), erased);
        self.event_types.push(std::any::type_name::<E>());
        self
    }

    /// The aggregate kind this table belongs to.
    #[must_use]
    pub fn aggregate(&self) -> &'static str {
        self.aggregate
    }

    /// True when a handler exists for the runtime type of `event`.
    #[must_use]
    pub fn handles(&self, event: &dyn DomainEvent) -> bool {
        self.handlers.contains_key(&event.runtime_type())
    }

    /// Number of registered event types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True when no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Routes `event` to its handler.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnsupportedEvent` when no handler is registered
    /// for the event's runtime type, or whatever the handler returns.
    pub fn dispatch(
        &self,
        scope: &mut ChangeScope<'_, A>,
        event: &dyn DomainEvent,
    ) -> Result<(), DomainError> {
        let Some(handler) = self.handlers.get(&event.runtime_type()) else {
            return Err(DomainError::UnsupportedEvent {
                aggregate: self.aggregate,
                event_type: event.event_type(),
            });
        };
        handler(scope, event)
    }
}

impl<A> fmt::Debug for HandlerTable<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable")
            .field("aggregate", &self.aggregate)
            .field("event_types", &self.event_types)
            .finish()
    }
}

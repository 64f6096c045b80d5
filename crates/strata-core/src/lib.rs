//! Strata Core: event-sourced aggregate engine.
//!
//! Aggregates own a versioned, in-memory [`stream::EventStream`] and a
//! [`tracker::ModelChangeTracker`] over their state. Applying an event
//! dispatches it to a typed handler, records every mutation as a reversible
//! [`change::TrackableChange`], validates the result, and either appends the
//! event or rolls the state back. [`projector::Projector`] folds the same
//! events into read models. The crate contains no infrastructure code;
//! persistence sits behind [`repository::EventRepository`].

pub mod aggregate;
pub mod change;
pub mod clock;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod projector;
pub mod repository;
pub mod stream;
pub mod tracker;
pub mod validation;

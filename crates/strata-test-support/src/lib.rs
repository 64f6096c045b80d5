//! Shared test doubles and utilities for the strata event-sourcing engine.

mod clock;
mod logging;
mod repository;
mod validator;

pub use clock::FixedClock;
pub use logging::init_tracing;
pub use repository::{
    EmptyEventRepository, FailingEventRepository, InMemoryEventRepository,
    RecordingEventRepository,
};
pub use validator::{AlwaysInvalid, AlwaysValid, FailingValidator};

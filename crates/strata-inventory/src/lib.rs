//! Strata Inventory: sample bounded context on the strata engine.
//!
//! Responsible for an owner's gold, carried items and ordered equipment
//! slots, with a summary read model projected from the same events.

pub mod application;
pub mod domain;

//! Shared fixtures for the core integration tests: a small `Tally`
//! aggregate whose total must never go negative.
#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use strata_core::aggregate::{Aggregate, EventSourcedAggregateRoot};
use strata_core::dispatch::HandlerTable;
use strata_core::event::DomainEvent;
use strata_core::validation::{RuleSet, Validator};
use strata_test_support::FixedClock;
use uuid::Uuid;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tally {
    pub total: i64,
    pub entries: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Added(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subtracted(pub i64);

/// Has no handler on `Tally`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Noted;

impl DomainEvent for Added {
    fn event_type(&self) -> &'static str {
        "tally.added"
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({ "amount": self.0 })
    }
}

impl DomainEvent for Subtracted {
    fn event_type(&self) -> &'static str {
        "tally.subtracted"
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({ "amount": self.0 })
    }
}

impl DomainEvent for Noted {
    fn event_type(&self) -> &'static str {
        "tally.noted"
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

fn total(tally: &mut Tally) -> &mut i64 {
    &mut tally.total
}

fn entries(tally: &mut Tally) -> &mut Vec<i64> {
    &mut tally.entries
}

impl Aggregate for Tally {
    const KIND: &'static str = "tally";

    fn handlers() -> &'static HandlerTable<Self> {
        static HANDLERS: OnceLock<HandlerTable<Tally>> = OnceLock::new();
        HANDLERS.get_or_init(|| {
            HandlerTable::<Tally>::new(Self::KIND)
                .on(|scope, event: &Added| {
                    let next = scope.model().total + event.0;
                    scope.set(total, next);
                    scope.add_item(entries, event.0);
                    Ok(())
                })
                .on(|scope, event: &Subtracted| {
                    let next = scope.model().total - event.0;
                    scope.set(total, next);
                    scope.add_item(entries, -event.0);
                    Ok(())
                })
        })
    }
}

pub fn rules() -> RuleSet<Tally> {
    RuleSet::new().rule("total", "total must not be negative", |t: &Tally| t.total >= 0)
}

pub fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::default())
}

pub fn root_with(validator: impl Validator<Tally> + 'static) -> EventSourcedAggregateRoot<Tally> {
    EventSourcedAggregateRoot::new(Uuid::new_v4(), Tally::default(), validator, clock()).unwrap()
}

pub fn root() -> EventSourcedAggregateRoot<Tally> {
    root_with(rules())
}

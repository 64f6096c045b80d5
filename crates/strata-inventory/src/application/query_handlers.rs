//! Query handlers for the Inventory context.
//!
//! This module contains query handlers that rebuild state from stored events
//! and return read-only view DTOs.

use std::sync::Arc;

use serde::Serialize;
use strata_core::clock::Clock;
use strata_core::error::DomainError;
use strata_core::projector::Projector;
use strata_core::repository::EventRepository;
use strata_core::stream::EventStream;
use uuid::Uuid;

use crate::domain::aggregates::InventoryAggregate;
use crate::domain::projections::InventorySummary;

/// Read-only view of an inventory aggregate.
#[derive(Debug, Serialize)]
pub struct InventoryView {
    /// The inventory identifier.
    pub inventory_id: Uuid,
    /// The owner's name.
    pub owner: String,
    /// Gold balance.
    pub gold: i64,
    /// Items currently carried (sorted for determinism).
    pub items: Vec<Uuid>,
    /// Equipped items in slot order.
    pub slots: Vec<Uuid>,
    /// Number of equipment slots.
    pub capacity: usize,
    /// Current version (event count).
    pub version: u64,
}

/// Retrieves an inventory by its aggregate ID.
///
/// Loads all stored events for the aggregate, replays them through the
/// aggregate root, and returns a serializable view.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID,
/// or any replay error.
pub fn get_inventory_by_id(
    inventory_id: Uuid,
    clock: &Arc<dyn Clock>,
    repo: &dyn EventRepository,
) -> Result<InventoryView, DomainError> {
    let inventory = InventoryAggregate::load(repo, inventory_id, Arc::clone(clock))?;
    let state = inventory.snapshot()?;
    let mut items: Vec<Uuid> = state.items().iter().copied().collect();
    items.sort();
    Ok(InventoryView {
        inventory_id,
        owner: state.owner().to_owned(),
        gold: state.gold(),
        items,
        slots: state.slots().to_vec(),
        capacity: state.capacity(),
        version: inventory.root().version(),
    })
}

/// Projects the stored events of an inventory into an [`InventorySummary`].
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no events exist for the ID, or
/// the integrity errors of [`EventStream::from_messages`].
pub fn get_inventory_summary(
    inventory_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<InventorySummary, DomainError> {
    let messages = repo.load_events(inventory_id)?;
    if messages.is_empty() {
        return Err(DomainError::AggregateNotFound(inventory_id));
    }
    let stream = EventStream::from_messages(messages)?;
    let mut projector = Projector::<InventorySummary>::new();
    projector.project_stream(&stream);
    Ok(projector.into_state())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use strata_core::event::{EventInfo, EventMessage};
    use strata_test_support::{
        EmptyEventRepository, FailingEventRepository, FixedClock, RecordingEventRepository,
    };

    use crate::domain::events::{GoldCredited, InventoryOpened, ItemAdded, ItemEquipped};

    fn history(inventory_id: Uuid, item_id: Uuid) -> Vec<EventMessage> {
        let fixed_now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let info = |version| EventInfo::new(version, inventory_id, fixed_now).unwrap();
        vec![
            EventMessage::new(
                info(1),
                Arc::new(InventoryOpened {
                    owner: "Mira".to_owned(),
                    capacity: 2,
                }),
            ),
            EventMessage::new(info(2), Arc::new(GoldCredited { amount: 12 })),
            EventMessage::new(info(3), Arc::new(ItemAdded { item_id })),
            EventMessage::new(
                info(4),
                Arc::new(ItemEquipped {
                    item_id,
                    slot: None,
                }),
            ),
        ]
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::default())
    }

    #[test]
    fn test_get_inventory_by_id_replays_history() {
        // Arrange
        let inventory_id = Uuid::new_v4();
        let item_id = Uuid::new_v4();
        let repo = RecordingEventRepository::new(history(inventory_id, item_id));

        // Act
        let view = get_inventory_by_id(inventory_id, &clock(), &repo).unwrap();

        // Assert
        assert_eq!(view.owner, "Mira");
        assert_eq!(view.gold, 12);
        assert_eq!(view.items, vec![item_id]);
        assert_eq!(view.slots, vec![item_id]);
        assert_eq!(view.version, 4);
    }

    #[test]
    fn test_get_inventory_summary_skips_slot_events() {
        // Arrange
        let inventory_id = Uuid::new_v4();
        let repo = RecordingEventRepository::new(history(inventory_id, Uuid::new_v4()));

        // Act
        let summary = get_inventory_summary(inventory_id, &repo).unwrap();

        // Assert
        assert_eq!(summary.owner, "Mira");
        assert_eq!(summary.gold, 12);
        assert_eq!(summary.item_count, 1);
    }

    #[test]
    fn test_get_inventory_by_id_returns_not_found_for_empty_stream() {
        // Arrange
        let inventory_id = Uuid::new_v4();

        // Act
        let result = get_inventory_by_id(inventory_id, &clock(), &EmptyEventRepository);

        // Assert
        match result {
            Err(DomainError::AggregateNotFound(id)) => assert_eq!(id, inventory_id),
            other => panic!("expected AggregateNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_get_inventory_summary_propagates_repository_error() {
        // Act
        let result = get_inventory_summary(Uuid::new_v4(), &FailingEventRepository);

        // Assert
        assert!(matches!(result, Err(DomainError::Infrastructure(_))));
    }
}

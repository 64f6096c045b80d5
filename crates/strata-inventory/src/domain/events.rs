//! Domain events for the Inventory context.

use serde::{Deserialize, Serialize};
use strata_core::event::DomainEvent;
use uuid::Uuid;

/// Event type for `InventoryOpened`.
pub const INVENTORY_OPENED_EVENT_TYPE: &str = "inventory.opened";
/// Event type for `OwnerRenamed`.
pub const OWNER_RENAMED_EVENT_TYPE: &str = "inventory.owner_renamed";
/// Event type for `GoldCredited`.
pub const GOLD_CREDITED_EVENT_TYPE: &str = "inventory.gold_credited";
/// Event type for `GoldDebited`.
pub const GOLD_DEBITED_EVENT_TYPE: &str = "inventory.gold_debited";
/// Event type for `ItemAdded`.
pub const ITEM_ADDED_EVENT_TYPE: &str = "inventory.item_added";
/// Event type for `ItemRemoved`.
pub const ITEM_REMOVED_EVENT_TYPE: &str = "inventory.item_removed";
/// Event type for `ItemEquipped`.
pub const ITEM_EQUIPPED_EVENT_TYPE: &str = "inventory.item_equipped";
/// Event type for `ItemUnequipped`.
pub const ITEM_UNEQUIPPED_EVENT_TYPE: &str = "inventory.item_unequipped";
/// Event type for `SlotReassigned`.
pub const SLOT_REASSIGNED_EVENT_TYPE: &str = "inventory.slot_reassigned";
/// Event type for `SlotsSorted`.
pub const SLOTS_SORTED_EVENT_TYPE: &str = "inventory.slots_sorted";
/// Event type for `SlotsCleared`.
pub const SLOTS_CLEARED_EVENT_TYPE: &str = "inventory.slots_cleared";

/// Emitted when an inventory is opened for an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryOpened {
    /// The owner's display name.
    pub owner: String,
    /// Number of equipment slots.
    pub capacity: usize,
}

/// Emitted when the inventory changes hands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRenamed {
    /// The new owner name.
    pub owner: String,
}

/// Emitted when gold is paid into the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldCredited {
    /// Amount credited.
    pub amount: i64,
}

/// Emitted when gold is spent from the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldDebited {
    /// Amount debited.
    pub amount: i64,
}

/// Emitted when an item is added to the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAdded {
    /// The item identifier.
    pub item_id: Uuid,
}

/// Emitted when an item is removed from the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRemoved {
    /// The item identifier.
    pub item_id: Uuid,
}

/// Emitted when a carried item is placed in an equipment slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemEquipped {
    /// The item identifier.
    pub item_id: Uuid,
    /// Slot position; `None` appends after the last occupied slot.
    pub slot: Option<usize>,
}

/// Emitted when an equipment slot is emptied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUnequipped {
    /// Slot position.
    pub slot: usize,
}

/// Emitted when an occupied slot receives a different item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotReassigned {
    /// Slot position.
    pub slot: usize,
    /// The item now in the slot.
    pub item_id: Uuid,
}

/// Emitted when equipment slots are put in item order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotsSorted;

/// Emitted when every equipment slot is emptied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotsCleared;

macro_rules! domain_event {
    ($event:ty, $event_type:expr) => {
        impl DomainEvent for $event {
            fn event_type(&self) -> &'static str {
                $event_type
            }

            fn to_payload(&self) -> serde_json::Value {
                serde_json::to_value(self).unwrap_or_default()
            }
        }
    };
}

domain_event!(InventoryOpened, INVENTORY_OPENED_EVENT_TYPE);
domain_event!(OwnerRenamed, OWNER_RENAMED_EVENT_TYPE);
domain_event!(GoldCredited, GOLD_CREDITED_EVENT_TYPE);
domain_event!(GoldDebited, GOLD_DEBITED_EVENT_TYPE);
domain_event!(ItemAdded, ITEM_ADDED_EVENT_TYPE);
domain_event!(ItemRemoved, ITEM_REMOVED_EVENT_TYPE);
domain_event!(ItemEquipped, ITEM_EQUIPPED_EVENT_TYPE);
domain_event!(ItemUnequipped, ITEM_UNEQUIPPED_EVENT_TYPE);
domain_event!(SlotReassigned, SLOT_REASSIGNED_EVENT_TYPE);
domain_event!(SlotsSorted, SLOTS_SORTED_EVENT_TYPE);
domain_event!(SlotsCleared, SLOTS_CLEARED_EVENT_TYPE);

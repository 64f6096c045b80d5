//! Commands for the Inventory context.

use uuid::Uuid;

/// Command to open a new inventory.
#[derive(Debug, Clone)]
pub struct OpenInventory {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The inventory identifier.
    pub inventory_id: Uuid,
    /// The owner's name.
    pub owner: String,
    /// Number of equipment slots.
    pub capacity: usize,
}

/// Command to credit gold to an inventory.
#[derive(Debug, Clone)]
pub struct CreditGold {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The inventory identifier.
    pub inventory_id: Uuid,
    /// Amount to credit.
    pub amount: i64,
}

/// Command to debit gold from an inventory.
#[derive(Debug, Clone)]
pub struct DebitGold {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The inventory identifier.
    pub inventory_id: Uuid,
    /// Amount to debit.
    pub amount: i64,
}

/// Command to add an item to an inventory.
#[derive(Debug, Clone)]
pub struct AddItem {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The inventory identifier.
    pub inventory_id: Uuid,
    /// The item identifier.
    pub item_id: Uuid,
}

/// Command to remove an item from an inventory.
#[derive(Debug, Clone)]
pub struct RemoveItem {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The inventory identifier.
    pub inventory_id: Uuid,
    /// The item identifier.
    pub item_id: Uuid,
}

/// Command to equip a carried item.
#[derive(Debug, Clone)]
pub struct EquipItem {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The inventory identifier.
    pub inventory_id: Uuid,
    /// The item identifier.
    pub item_id: Uuid,
    /// Target slot; `None` appends.
    pub slot: Option<usize>,
}

/// Command to empty an equipment slot.
#[derive(Debug, Clone)]
pub struct UnequipItem {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The inventory identifier.
    pub inventory_id: Uuid,
    /// The slot to empty.
    pub slot: usize,
}

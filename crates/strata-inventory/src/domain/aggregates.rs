//! Aggregate roots for the Inventory context.

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use strata_core::aggregate::{Aggregate, EventSourcedAggregateRoot};
use strata_core::clock::Clock;
use strata_core::dispatch::HandlerTable;
use strata_core::error::DomainError;
use strata_core::event::DomainEvent;
use strata_core::repository::EventRepository;
use strata_core::validation::{RuleSet, ValidationResult};
use tracing::debug;
use uuid::Uuid;

use super::events::{
    GoldCredited, GoldDebited, InventoryOpened, ItemAdded, ItemEquipped, ItemRemoved,
    ItemUnequipped, OwnerRenamed, SlotReassigned, SlotsCleared, SlotsSorted,
};

/// State of an inventory: who owns it, their gold, the items they carry and
/// the items placed in ordered equipment slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    owner: String,
    gold: i64,
    items: HashSet<Uuid>,
    slots: Vec<Uuid>,
    capacity: usize,
}

impl Inventory {
    /// The owner's name; empty until the inventory is opened.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Gold balance.
    #[must_use]
    pub fn gold(&self) -> i64 {
        self.gold
    }

    /// Items currently carried.
    #[must_use]
    pub fn items(&self) -> &HashSet<Uuid> {
        &self.items
    }

    /// Equipped items in slot order.
    #[must_use]
    pub fn slots(&self) -> &[Uuid] {
        &self.slots
    }

    /// Number of equipment slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn owner(inventory: &mut Inventory) -> &mut String {
    &mut inventory.owner
}

fn gold(inventory: &mut Inventory) -> &mut i64 {
    &mut inventory.gold
}

fn items(inventory: &mut Inventory) -> &mut HashSet<Uuid> {
    &mut inventory.items
}

fn slots(inventory: &mut Inventory) -> &mut Vec<Uuid> {
    &mut inventory.slots
}

fn capacity(inventory: &mut Inventory) -> &mut usize {
    &mut inventory.capacity
}

impl Aggregate for Inventory {
    const KIND: &'static str = "inventory";

    fn handlers() -> &'static HandlerTable<Self> {
        static HANDLERS: OnceLock<HandlerTable<Inventory>> = OnceLock::new();
        HANDLERS.get_or_init(|| {
            HandlerTable::<Inventory>::new(Self::KIND)
                .on(|scope, event: &InventoryOpened| {
                    scope.set(owner, event.owner.clone());
                    scope.set(capacity, event.capacity);
                    Ok(())
                })
                .on(|scope, event: &OwnerRenamed| {
                    scope.set(owner, event.owner.clone());
                    Ok(())
                })
                .on(|scope, event: &GoldCredited| {
                    let balance = scope.model().gold.saturating_add(event.amount);
                    scope.set(gold, balance);
                    Ok(())
                })
                .on(|scope, event: &GoldDebited| {
                    let balance = scope.model().gold.saturating_sub(event.amount);
                    scope.set(gold, balance);
                    Ok(())
                })
                .on(|scope, event: &ItemAdded| {
                    scope.add_item(items, event.item_id);
                    Ok(())
                })
                .on(|scope, event: &ItemRemoved| {
                    scope.remove_item(items, event.item_id);
                    Ok(())
                })
                .on(|scope, event: &ItemEquipped| match event.slot {
                    Some(slot) => scope.insert_at(slots, slot, event.item_id),
                    None => {
                        scope.add_item(slots, event.item_id);
                        Ok(())
                    }
                })
                .on(|scope, event: &ItemUnequipped| scope.remove_at(slots, event.slot))
                .on(|scope, event: &SlotReassigned| {
                    scope.update_at(slots, event.slot, event.item_id)
                })
                .on(|scope, _: &SlotsSorted| {
                    scope.sort(slots);
                    Ok(())
                })
                .on(|scope, _: &SlotsCleared| {
                    scope.clear(slots);
                    Ok(())
                })
        })
    }
}

/// The invariants every inventory state must satisfy.
#[must_use]
pub fn inventory_rules() -> RuleSet<Inventory> {
    RuleSet::new()
        .rule("owner", "owner must not be empty", |i: &Inventory| {
            !i.owner.trim().is_empty()
        })
        .rule("gold", "gold must not be negative", |i: &Inventory| i.gold >= 0)
        .rule("slots", "equipped items exceed slot capacity", |i: &Inventory| {
            i.slots.len() <= i.capacity
        })
        .rule("slots", "equipped items must be carried", |i: &Inventory| {
            i.slots.iter().all(|item| i.items.contains(item))
        })
        .warn("slots", "every equipment slot is in use", |i: &Inventory| {
            i.capacity == 0 || i.slots.len() < i.capacity
        })
}

/// The aggregate root for an inventory.
#[derive(Debug)]
pub struct InventoryAggregate {
    root: EventSourcedAggregateRoot<Inventory>,
}

impl InventoryAggregate {
    /// Creates an unopened inventory with no history.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyAggregateId` if `id` is nil.
    pub fn new(id: Uuid, clock: Arc<dyn Clock>) -> Result<Self, DomainError> {
        let root = EventSourcedAggregateRoot::new(id, Inventory::default(), inventory_rules(), clock)?;
        Ok(Self { root })
    }

    /// Rebuilds an inventory from the events stored in `repo`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if nothing is stored for `id`,
    /// or any load or replay error.
    pub fn load(
        repo: &dyn EventRepository,
        id: Uuid,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DomainError> {
        let root = EventSourcedAggregateRoot::load(repo, id, Inventory::default(), inventory_rules(), clock)?;
        Ok(Self { root })
    }

    /// The aggregate identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.root.aggregate_id()
    }

    /// The underlying event-sourced root.
    #[must_use]
    pub fn root(&self) -> &EventSourcedAggregateRoot<Inventory> {
        &self.root
    }

    /// Returns a copy of the current state.
    ///
    /// # Errors
    ///
    /// Propagates tracker errors; a constructed aggregate never has none.
    pub fn snapshot(&self) -> Result<Inventory, DomainError> {
        self.root.state(Clone::clone)
    }

    /// Opens the inventory for `owner` with `capacity` equipment slots.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the inventory is already open.
    pub fn open(
        &self,
        owner_name: impl Into<String>,
        slot_capacity: usize,
    ) -> Result<ValidationResult, DomainError> {
        if self.root.version() > 0 {
            return Err(DomainError::Validation(format!(
                "inventory {} is already open",
                self.id()
            )));
        }
        self.apply(InventoryOpened {
            owner: owner_name.into(),
            capacity: slot_capacity,
        })
    }

    /// Transfers the inventory to a new owner.
    ///
    /// # Errors
    ///
    /// Propagates dispatch and validator errors.
    pub fn rename_owner(&self, owner_name: impl Into<String>) -> Result<ValidationResult, DomainError> {
        self.apply(OwnerRenamed {
            owner: owner_name.into(),
        })
    }

    /// Adds `amount` gold.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `amount` is not positive.
    pub fn credit_gold(&self, amount: i64) -> Result<ValidationResult, DomainError> {
        ensure_positive(amount)?;
        self.apply(GoldCredited { amount })
    }

    /// Spends `amount` gold. Overspending yields an invalid result and leaves
    /// the balance unchanged.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `amount` is not positive.
    pub fn debit_gold(&self, amount: i64) -> Result<ValidationResult, DomainError> {
        ensure_positive(amount)?;
        self.apply(GoldDebited { amount })
    }

    /// Adds an item to the inventory.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the item is already carried, and
    /// propagates dispatch and validator errors.
    pub fn add_item(&self, item_id: Uuid) -> Result<ValidationResult, DomainError> {
        if self.root.state(|i| i.items.contains(&item_id))? {
            return Err(DomainError::Validation(format!(
                "item {item_id} is already in inventory {}",
                self.id()
            )));
        }
        self.apply(ItemAdded { item_id })
    }

    /// Removes an item from the inventory. Removing an equipped item yields
    /// an invalid result.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the item is not in the inventory.
    pub fn remove_item(&self, item_id: Uuid) -> Result<ValidationResult, DomainError> {
        if !self.root.state(|i| i.items.contains(&item_id))? {
            return Err(DomainError::Validation(format!(
                "item {item_id} not found in inventory {}",
                self.id()
            )));
        }
        self.apply(ItemRemoved { item_id })
    }

    /// Equips a carried item at `slot`, or after the last occupied slot.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::IndexOutOfRange` if `slot` is past the occupied
    /// slots.
    pub fn equip_item(
        &self,
        item_id: Uuid,
        slot: Option<usize>,
    ) -> Result<ValidationResult, DomainError> {
        self.apply(ItemEquipped { item_id, slot })
    }

    /// Empties `slot`, shifting later slots down.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::IndexOutOfRange` if `slot` is not occupied.
    pub fn unequip_item(&self, slot: usize) -> Result<ValidationResult, DomainError> {
        self.apply(ItemUnequipped { slot })
    }

    /// Puts a different carried item into an occupied slot.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::IndexOutOfRange` if `slot` is not occupied.
    pub fn reassign_slot(&self, slot: usize, item_id: Uuid) -> Result<ValidationResult, DomainError> {
        self.apply(SlotReassigned { slot, item_id })
    }

    /// Orders equipped items by identifier.
    ///
    /// # Errors
    ///
    /// Propagates dispatch and validator errors.
    pub fn sort_slots(&self) -> Result<ValidationResult, DomainError> {
        self.apply(SlotsSorted)
    }

    /// Unequips everything.
    ///
    /// # Errors
    ///
    /// Propagates dispatch and validator errors.
    pub fn clear_slots(&self) -> Result<ValidationResult, DomainError> {
        self.apply(SlotsCleared)
    }

    /// Persists uncommitted events. Returns how many were written.
    ///
    /// # Errors
    ///
    /// Returns the repository's error; events stay uncommitted.
    pub fn commit(&self, repo: &dyn EventRepository) -> Result<usize, DomainError> {
        self.root.commit(repo)
    }

    fn apply<E: DomainEvent>(&self, event: E) -> Result<ValidationResult, DomainError> {
        let event_type = event.event_type();
        let result = self.root.apply_change(event)?;
        debug!(
            inventory_id = %self.id(),
            event_type,
            valid = result.is_valid(),
            "inventory event applied"
        );
        Ok(result)
    }
}

fn ensure_positive(amount: i64) -> Result<(), DomainError> {
    if amount <= 0 {
        return Err(DomainError::Validation(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

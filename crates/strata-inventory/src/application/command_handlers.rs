//! Command handlers for the Inventory context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: load aggregate, execute command, persist events.

use std::sync::Arc;

use strata_core::clock::Clock;
use strata_core::error::DomainError;
use strata_core::event::{EventMessage, EventRecord};
use strata_core::repository::EventRepository;
use strata_core::validation::ValidationResult;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::aggregates::InventoryAggregate;
use crate::domain::commands::{
    AddItem, CreditGold, DebitGold, EquipItem, OpenInventory, RemoveItem, UnequipItem,
};

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct InventoryCommandResult {
    /// The aggregate ID affected by the command.
    pub aggregate_id: Uuid,
    /// The records of the events produced and persisted.
    pub records: Vec<EventRecord>,
    /// The validation outcome, carrying any warnings.
    pub validation: ValidationResult,
}

/// Runs `operation`, rejects an invalid outcome, then persists the events it
/// produced.
fn execute(
    inventory: &InventoryAggregate,
    repo: &dyn EventRepository,
    operation: impl FnOnce(&InventoryAggregate) -> Result<ValidationResult, DomainError>,
) -> Result<InventoryCommandResult, DomainError> {
    let validation = operation(inventory)?;
    if !validation.is_valid() {
        return Err(DomainError::Validation(validation.to_string()));
    }
    let records = inventory
        .root()
        .stream()
        .uncommitted()
        .iter()
        .map(EventMessage::to_record)
        .collect();
    inventory.commit(repo)?;
    Ok(InventoryCommandResult {
        aggregate_id: inventory.id(),
        records,
        validation,
    })
}

/// Handles the `OpenInventory` command: creates the aggregate, opens it, and
/// persists the resulting event.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the owner is empty, or
/// `DomainError::ConcurrencyConflict` if the inventory already exists.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, inventory_id = %command.inventory_id))]
pub fn handle_open_inventory(
    command: &OpenInventory,
    clock: &Arc<dyn Clock>,
    repo: &dyn EventRepository,
) -> Result<InventoryCommandResult, DomainError> {
    let inventory = InventoryAggregate::new(command.inventory_id, Arc::clone(clock))?;
    execute(&inventory, repo, |inventory| {
        inventory.open(command.owner.as_str(), command.capacity)
    })
}

/// Handles the `CreditGold` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown inventory, or
/// `DomainError::Validation` for a non-positive amount.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, inventory_id = %command.inventory_id))]
pub fn handle_credit_gold(
    command: &CreditGold,
    clock: &Arc<dyn Clock>,
    repo: &dyn EventRepository,
) -> Result<InventoryCommandResult, DomainError> {
    let inventory = InventoryAggregate::load(repo, command.inventory_id, Arc::clone(clock))?;
    execute(&inventory, repo, |inventory| inventory.credit_gold(command.amount))
}

/// Handles the `DebitGold` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown inventory, or
/// `DomainError::Validation` if the balance would go negative.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, inventory_id = %command.inventory_id))]
pub fn handle_debit_gold(
    command: &DebitGold,
    clock: &Arc<dyn Clock>,
    repo: &dyn EventRepository,
) -> Result<InventoryCommandResult, DomainError> {
    let inventory = InventoryAggregate::load(repo, command.inventory_id, Arc::clone(clock))?;
    execute(&inventory, repo, |inventory| inventory.debit_gold(command.amount))
}

/// Handles the `AddItem` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown inventory, or
/// `DomainError` if event loading or appending fails.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, inventory_id = %command.inventory_id))]
pub fn handle_add_item(
    command: &AddItem,
    clock: &Arc<dyn Clock>,
    repo: &dyn EventRepository,
) -> Result<InventoryCommandResult, DomainError> {
    let inventory = InventoryAggregate::load(repo, command.inventory_id, Arc::clone(clock))?;
    execute(&inventory, repo, |inventory| inventory.add_item(command.item_id))
}

/// Handles the `RemoveItem` command.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the item is missing or equipped.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, inventory_id = %command.inventory_id))]
pub fn handle_remove_item(
    command: &RemoveItem,
    clock: &Arc<dyn Clock>,
    repo: &dyn EventRepository,
) -> Result<InventoryCommandResult, DomainError> {
    let inventory = InventoryAggregate::load(repo, command.inventory_id, Arc::clone(clock))?;
    execute(&inventory, repo, |inventory| inventory.remove_item(command.item_id))
}

/// Handles the `EquipItem` command.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the item is not carried or the slots
/// are full, or `DomainError::IndexOutOfRange` for a slot past the end.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, inventory_id = %command.inventory_id))]
pub fn handle_equip_item(
    command: &EquipItem,
    clock: &Arc<dyn Clock>,
    repo: &dyn EventRepository,
) -> Result<InventoryCommandResult, DomainError> {
    let inventory = InventoryAggregate::load(repo, command.inventory_id, Arc::clone(clock))?;
    execute(&inventory, repo, |inventory| {
        inventory.equip_item(command.item_id, command.slot)
    })
}

/// Handles the `UnequipItem` command.
///
/// # Errors
///
/// Returns `DomainError::IndexOutOfRange` if the slot is empty.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, inventory_id = %command.inventory_id))]
pub fn handle_unequip_item(
    command: &UnequipItem,
    clock: &Arc<dyn Clock>,
    repo: &dyn EventRepository,
) -> Result<InventoryCommandResult, DomainError> {
    let inventory = InventoryAggregate::load(repo, command.inventory_id, Arc::clone(clock))?;
    execute(&inventory, repo, |inventory| inventory.unequip_item(command.slot))
}

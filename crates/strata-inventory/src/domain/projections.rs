//! Read models for the Inventory context.

use std::sync::OnceLock;

use serde::Serialize;
use strata_core::projector::{Projection, ProjectionHandlers};

use super::events::{GoldCredited, GoldDebited, InventoryOpened, ItemAdded, ItemRemoved, OwnerRenamed};

/// Owner, balance and item count of an inventory. Equipment slot events are
/// not part of the summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InventorySummary {
    /// The owner's name.
    pub owner: String,
    /// Gold balance.
    pub gold: i64,
    /// Number of items carried.
    pub item_count: usize,
    /// Total gold ever credited.
    pub lifetime_income: i64,
}

impl Projection for InventorySummary {
    const NAME: &'static str = "inventory_summary";

    fn handlers() -> &'static ProjectionHandlers<Self> {
        static HANDLERS: OnceLock<ProjectionHandlers<InventorySummary>> = OnceLock::new();
        HANDLERS.get_or_init(|| {
            ProjectionHandlers::new()
                .on(|summary: &mut InventorySummary, event: &InventoryOpened| {
                    summary.owner.clone_from(&event.owner);
                })
                .on(|summary: &mut InventorySummary, event: &OwnerRenamed| {
                    summary.owner.clone_from(&event.owner);
                })
                .on(|summary: &mut InventorySummary, event: &GoldCredited| {
                    summary.gold += event.amount;
                    summary.lifetime_income += event.amount;
                })
                .on(|summary: &mut InventorySummary, event: &GoldDebited| {
                    summary.gold -= event.amount;
                })
                .on(|summary: &mut InventorySummary, _: &ItemAdded| {
                    summary.item_count += 1;
                })
                .on(|summary: &mut InventorySummary, _: &ItemRemoved| {
                    summary.item_count = summary.item_count.saturating_sub(1);
                })
        })
    }
}

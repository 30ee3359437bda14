//! Stock-level snapshot rows.

use serde::{Deserialize, Serialize};

use stocktally_core::{BinId, ItemId, WarehouseId};

/// Materialized running total for one (warehouse, bin, item) triple.
///
/// Maintained by the surrounding product, not derived here. The engine
/// treats it as ground truth for "current" views and cross-checks it
/// against the replayed ledger to surface drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    pub warehouse_id: WarehouseId,
    pub bin_id: Option<BinId>,
    pub item_id: ItemId,
    pub on_hand_qty: f64,
    pub allocated_qty: f64,
    /// Weighted average cost per base unit as maintained upstream.
    pub avg_cost: f64,
}

impl StockLevel {
    pub fn new(
        warehouse_id: WarehouseId,
        item_id: ItemId,
        on_hand_qty: f64,
        avg_cost: f64,
    ) -> Self {
        Self {
            warehouse_id,
            bin_id: None,
            item_id,
            on_hand_qty,
            allocated_qty: 0.0,
            avg_cost,
        }
    }

    pub fn with_bin(mut self, bin_id: BinId) -> Self {
        self.bin_id = Some(bin_id);
        self
    }

    pub fn with_allocated(mut self, allocated_qty: f64) -> Self {
        self.allocated_qty = allocated_qty;
        self
    }

    /// Value of the row at its upstream average cost.
    pub fn value(&self) -> f64 {
        self.on_hand_qty * self.avg_cost
    }

    /// On hand minus allocated.
    pub fn available_qty(&self) -> f64 {
        self.on_hand_qty - self.allocated_qty
    }
}

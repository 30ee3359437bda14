//! Snapshot valuation: pure aggregation over stock-level rows.
//!
//! Deliberately independent of the movement replay so "current snapshot"
//! and "as-of-window-end via replay" can sit side by side; a gap between
//! the two is a data-integrity signal, not an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use stocktally_core::{BinId, ItemId, WarehouseId};

use crate::level::StockLevel;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WarehouseValuationRow {
    pub warehouse_id: WarehouseId,
    pub qty: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinValuationRow {
    pub warehouse_id: WarehouseId,
    /// `None` groups the warehouse's bin-less stock.
    pub bin_id: Option<BinId>,
    pub qty: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemValuationRow {
    pub item_id: ItemId,
    pub qty: f64,
    pub value: f64,
}

/// Current inventory value grouped three ways, plus the grand total.
///
/// Zero-value rows are excluded from every grouping so empty bins do not
/// pollute the breakdowns; they contribute nothing to the totals either
/// way. Rows come out sorted by their ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotValuation {
    pub total_qty: f64,
    pub total_value: f64,
    pub by_warehouse: Vec<WarehouseValuationRow>,
    pub by_bin: Vec<BinValuationRow>,
    pub by_item: Vec<ItemValuationRow>,
}

impl SnapshotValuation {
    pub fn from_levels(levels: &[StockLevel]) -> Self {
        let mut total_qty = 0.0;
        let mut total_value = 0.0;
        let mut warehouses: BTreeMap<WarehouseId, (f64, f64)> = BTreeMap::new();
        let mut bins: BTreeMap<(WarehouseId, Option<BinId>), (f64, f64)> = BTreeMap::new();
        let mut items: BTreeMap<ItemId, (f64, f64)> = BTreeMap::new();

        for level in levels {
            let value = level.value();
            if value == 0.0 {
                continue;
            }
            total_qty += level.on_hand_qty;
            total_value += value;

            let wh = warehouses.entry(level.warehouse_id).or_insert((0.0, 0.0));
            wh.0 += level.on_hand_qty;
            wh.1 += value;

            let bin = bins
                .entry((level.warehouse_id, level.bin_id))
                .or_insert((0.0, 0.0));
            bin.0 += level.on_hand_qty;
            bin.1 += value;

            let item = items.entry(level.item_id).or_insert((0.0, 0.0));
            item.0 += level.on_hand_qty;
            item.1 += value;
        }

        Self {
            total_qty,
            total_value,
            by_warehouse: warehouses
                .into_iter()
                .map(|(warehouse_id, (qty, value))| WarehouseValuationRow {
                    warehouse_id,
                    qty,
                    value,
                })
                .collect(),
            by_bin: bins
                .into_iter()
                .map(|((warehouse_id, bin_id), (qty, value))| BinValuationRow {
                    warehouse_id,
                    bin_id,
                    qty,
                    value,
                })
                .collect(),
            by_item: items
                .into_iter()
                .map(|(item_id, (qty, value))| ItemValuationRow {
                    item_id,
                    qty,
                    value,
                })
                .collect(),
        }
    }

    /// Snapshot value held in one warehouse (0 when none recorded).
    pub fn warehouse_value(&self, warehouse_id: WarehouseId) -> f64 {
        self.by_warehouse
            .iter()
            .find(|row| row.warehouse_id == warehouse_id)
            .map(|row| row.value)
            .unwrap_or(0.0)
    }

    /// Snapshot quantity held of one item (0 when none recorded).
    pub fn item_qty(&self, item_id: ItemId) -> f64 {
        self.by_item
            .iter()
            .find(|row| row.item_id == item_id)
            .map(|row| row.qty)
            .unwrap_or(0.0)
    }
}

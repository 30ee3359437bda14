//! Stock movements: the chronological ledger input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocktally_core::{BinId, ItemId, MovementId, WarehouseId};
use stocktally_uom::UnitOfMeasure;

/// Kind of stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Receive,
    Issue,
    Transfer,
    Adjust,
}

/// One stock-movement row as fetched from the surrounding product.
///
/// `qty_base` is the invariant the whole ledger rests on: it is always
/// expressed in the item's declared base unit, signed only for adjustments.
/// `qty`/`unit` record what the user actually entered and exist for audit
/// and for late normalization when `qty_base` was never materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub kind: MovementKind,
    pub item_id: ItemId,
    /// Warehouse touched by receive/issue/adjust; source side of a transfer.
    pub warehouse_id: Option<WarehouseId>,
    /// Destination side of a transfer.
    pub to_warehouse_id: Option<WarehouseId>,
    pub bin_id: Option<BinId>,
    pub to_bin_id: Option<BinId>,
    /// Quantity exactly as entered, in `unit`.
    pub qty: f64,
    /// Unit the quantity was entered in.
    pub unit: Option<UnitOfMeasure>,
    /// Quantity in the item's base unit. Signed for adjustments.
    pub qty_base: f64,
    /// Cost per base unit; meaningful for receives and positive adjustments.
    pub unit_cost: Option<f64>,
    pub total_value: Option<f64>,
    /// Audit linkage to the originating document.
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl StockMovement {
    fn base(
        id: MovementId,
        kind: MovementKind,
        item_id: ItemId,
        qty_base: f64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            item_id,
            warehouse_id: None,
            to_warehouse_id: None,
            bin_id: None,
            to_bin_id: None,
            qty: qty_base,
            unit: None,
            qty_base,
            unit_cost: None,
            total_value: None,
            reference_type: None,
            reference_id: None,
            occurred_at,
        }
    }

    /// Goods received into a warehouse at a unit cost.
    pub fn receive(
        id: MovementId,
        item_id: ItemId,
        warehouse_id: WarehouseId,
        qty_base: f64,
        unit_cost: f64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        let mut m = Self::base(id, MovementKind::Receive, item_id, qty_base, occurred_at);
        m.warehouse_id = Some(warehouse_id);
        m.unit_cost = Some(unit_cost);
        m.total_value = Some(qty_base * unit_cost);
        m
    }

    /// Goods issued out of a warehouse (sale, consumption).
    pub fn issue(
        id: MovementId,
        item_id: ItemId,
        warehouse_id: WarehouseId,
        qty_base: f64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        let mut m = Self::base(id, MovementKind::Issue, item_id, qty_base, occurred_at);
        m.warehouse_id = Some(warehouse_id);
        m
    }

    /// Cost-basis move between two warehouses; never recognizes COGS.
    pub fn transfer(
        id: MovementId,
        item_id: ItemId,
        from_warehouse_id: WarehouseId,
        to_warehouse_id: WarehouseId,
        qty_base: f64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        let mut m = Self::base(id, MovementKind::Transfer, item_id, qty_base, occurred_at);
        m.warehouse_id = Some(from_warehouse_id);
        m.to_warehouse_id = Some(to_warehouse_id);
        m
    }

    /// Signed correction: positive counts as inbound, negative as outbound.
    pub fn adjust(
        id: MovementId,
        item_id: ItemId,
        warehouse_id: WarehouseId,
        qty_base: f64,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        let mut m = Self::base(id, MovementKind::Adjust, item_id, qty_base, occurred_at);
        m.warehouse_id = Some(warehouse_id);
        m
    }

    pub fn with_bin(mut self, bin_id: BinId) -> Self {
        self.bin_id = Some(bin_id);
        self
    }

    pub fn with_to_bin(mut self, bin_id: BinId) -> Self {
        self.to_bin_id = Some(bin_id);
        self
    }

    /// Record what the user entered before normalization.
    pub fn with_entered(mut self, qty: f64, unit: UnitOfMeasure) -> Self {
        self.qty = qty;
        self.unit = Some(unit);
        self
    }

    pub fn with_unit_cost(mut self, unit_cost: f64) -> Self {
        self.unit_cost = Some(unit_cost);
        self
    }

    pub fn with_total_value(mut self, total_value: f64) -> Self {
        self.total_value = Some(total_value);
        self
    }

    pub fn with_reference(
        mut self,
        reference_type: impl Into<String>,
        reference_id: impl Into<String>,
    ) -> Self {
        self.reference_type = Some(reference_type.into());
        self.reference_id = Some(reference_id.into());
        self
    }

    /// Inbound cost per base unit: the supplied unit cost, else the total
    /// value spread over the effective quantity.
    pub fn cost_hint(&self, effective_qty: f64) -> Option<f64> {
        self.unit_cost.or_else(|| {
            self.total_value
                .and_then(|v| (effective_qty > 0.0).then(|| v / effective_qty))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receive_materializes_total_value() {
        let m = StockMovement::receive(
            MovementId::new(),
            ItemId::new(),
            WarehouseId::new(),
            100.0,
            10.0,
            Utc::now(),
        )
        .with_reference("purchase_order", "PO-1001");
        assert_eq!(m.kind, MovementKind::Receive);
        assert_eq!(m.total_value, Some(1000.0));
        assert_eq!(m.cost_hint(100.0), Some(10.0));
        assert_eq!(m.reference_type.as_deref(), Some("purchase_order"));
        assert_eq!(m.reference_id.as_deref(), Some("PO-1001"));
    }

    #[test]
    fn cost_hint_falls_back_to_total_value() {
        let m = StockMovement::adjust(
            MovementId::new(),
            ItemId::new(),
            WarehouseId::new(),
            50.0,
            Utc::now(),
        )
        .with_total_value(600.0);
        assert_eq!(m.cost_hint(50.0), Some(12.0));
        assert_eq!(m.cost_hint(0.0), None);
    }

    #[test]
    fn transfer_carries_both_warehouses() {
        let from = WarehouseId::new();
        let to = WarehouseId::new();
        let from_bin = BinId::new();
        let to_bin = BinId::new();
        let m = StockMovement::transfer(
            MovementId::new(),
            ItemId::new(),
            from,
            to,
            20.0,
            Utc::now(),
        )
        .with_bin(from_bin)
        .with_to_bin(to_bin);
        assert_eq!(m.warehouse_id, Some(from));
        assert_eq!(m.to_warehouse_id, Some(to));
        assert_eq!(m.bin_id, Some(from_bin));
        assert_eq!(m.to_bin_id, Some(to_bin));
        assert_eq!(m.unit_cost, None);
    }
}

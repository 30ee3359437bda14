//! Assembles the full cost report out of the component outputs.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use stocktally_core::{DomainError, ItemId, ReportWindow, TenantId, WarehouseId};
use stocktally_costing::{
    replay_movements, CostingMethod, EndingPosition, LedgerReplay, MovementOutcome,
    QuantityNormalizer, ReplayAudit, StockMovement,
};
use stocktally_uom::{ConversionEdge, ConversionError, UnitConversionGraph, UnitOfMeasure};
use stocktally_valuation::{SnapshotValuation, StockLevel};

use crate::aging::StockAging;
use crate::sellers::{seller_digest, SellerDigest};
use crate::turnover::{item_turnover, turnover_summary, ItemTurnoverRow, TurnoverSummary};

#[derive(Debug, Error)]
pub enum ReportError {
    /// The requested date range does not form a window.
    #[error("invalid reporting window: {0}")]
    Window(#[from] DomainError),
    /// Strict conversion handling met an unconvertible quantity.
    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),
}

/// Everything one report run consumes, fetched upstream in one pass.
///
/// The engine never talks to storage itself; records arrive already
/// authorized and already scoped to `tenant_id`.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub tenant_id: TenantId,
    pub method: CostingMethod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub movements: Vec<StockMovement>,
    pub stock_levels: Vec<StockLevel>,
    pub conversion_edges: Vec<ConversionEdge>,
    /// Declared base unit per item, for normalizing entered quantities.
    pub base_units: BTreeMap<ItemId, UnitOfMeasure>,
    /// Abort on unconvertible entered quantities instead of skipping.
    pub strict_conversion: bool,
}

impl ReportRequest {
    pub fn new(
        tenant_id: TenantId,
        method: CostingMethod,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            tenant_id,
            method,
            start_date,
            end_date,
            movements: Vec::new(),
            stock_levels: Vec::new(),
            conversion_edges: Vec::new(),
            base_units: BTreeMap::new(),
            strict_conversion: false,
        }
    }

    pub fn with_movements(mut self, movements: Vec<StockMovement>) -> Self {
        self.movements = movements;
        self
    }

    pub fn with_stock_levels(mut self, stock_levels: Vec<StockLevel>) -> Self {
        self.stock_levels = stock_levels;
        self
    }

    pub fn with_conversion_edges(mut self, edges: Vec<ConversionEdge>) -> Self {
        self.conversion_edges = edges;
        self
    }

    pub fn with_base_unit(mut self, item_id: ItemId, unit: UnitOfMeasure) -> Self {
        self.base_units.insert(item_id, unit);
        self
    }

    pub fn with_strict_conversion(mut self) -> Self {
        self.strict_conversion = true;
        self
    }
}

/// Snapshot value vs replayed value for one warehouse. A nonzero delta
/// means upstream snapshot maintenance drifted from the movement log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReconciliationRow {
    pub warehouse_id: WarehouseId,
    pub snapshot_value: f64,
    pub replayed_value: f64,
}

impl ReconciliationRow {
    pub fn delta(&self) -> f64 {
        self.snapshot_value - self.replayed_value
    }
}

/// The finished report model handed to presentation code. Every grouping
/// is keyed by stable ids so callers can join back to their master data.
#[derive(Debug, Clone, Serialize)]
pub struct CostReport {
    pub tenant_id: TenantId,
    pub method: CostingMethod,
    pub window: ReportWindow,
    /// Ending (warehouse, item) positions from the replay.
    pub positions: Vec<EndingPosition>,
    /// Replayed ending value per warehouse.
    pub valuation_by_warehouse: BTreeMap<WarehouseId, f64>,
    /// Current valuation from the snapshot rows.
    pub snapshot: SnapshotValuation,
    pub turnover: Vec<ItemTurnoverRow>,
    pub summary: TurnoverSummary,
    pub sellers: SellerDigest,
    pub aging: StockAging,
    pub reconciliation: Vec<ReconciliationRow>,
    pub outcomes: Vec<MovementOutcome>,
    pub audit: ReplayAudit,
}

/// Warehouses from either side, sorted; missing sides read as 0.
pub fn reconcile_warehouses(
    snapshot: &SnapshotValuation,
    replay: &LedgerReplay,
) -> Vec<ReconciliationRow> {
    let replayed = replay.valuation_by_warehouse();
    let mut ids: BTreeSet<WarehouseId> = replayed.keys().copied().collect();
    ids.extend(snapshot.by_warehouse.iter().map(|row| row.warehouse_id));

    ids.into_iter()
        .map(|warehouse_id| ReconciliationRow {
            warehouse_id,
            snapshot_value: snapshot.warehouse_value(warehouse_id),
            replayed_value: replayed.get(&warehouse_id).copied().unwrap_or(0.0),
        })
        .collect()
}

/// Run the whole engine once: build the conversion graph, replay the
/// movements, value the snapshot, and derive the analytics.
///
/// One malformed movement never blanks the report; it surfaces in
/// `outcomes` and `audit` instead. The only failures are an invalid
/// window and, under strict conversion, an unconvertible quantity.
pub fn compute_report(request: &ReportRequest) -> Result<CostReport, ReportError> {
    let window = ReportWindow::new(request.start_date, request.end_date)?;
    let graph = UnitConversionGraph::build(&request.conversion_edges);
    let mut normalizer = QuantityNormalizer::new(&graph, &request.base_units);
    if request.strict_conversion {
        normalizer = normalizer.strict();
    }

    let replay = replay_movements(&request.movements, request.method, window, &normalizer)?;
    let snapshot = SnapshotValuation::from_levels(&request.stock_levels);
    let turnover = item_turnover(&replay, &request.stock_levels);
    let summary = turnover_summary(&turnover, window, snapshot.total_value);
    let sellers = seller_digest(&turnover);
    let aging = StockAging::compute(&request.stock_levels, &replay.last_replenishment, window);
    let reconciliation = reconcile_warehouses(&snapshot, &replay);

    info!(
        tenant = %request.tenant_id,
        movements = request.movements.len(),
        applied = replay.audit.applied,
        skipped = replay.audit.skipped_total(),
        "cost report computed"
    );

    Ok(CostReport {
        tenant_id: request.tenant_id,
        method: replay.method(),
        window,
        positions: replay.positions(),
        valuation_by_warehouse: replay.valuation_by_warehouse(),
        snapshot,
        turnover,
        summary,
        sellers,
        aging,
        reconciliation,
        outcomes: replay.outcomes,
        audit: replay.audit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use stocktally_core::MovementId;
    use stocktally_uom::UnitId;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn inverted_window_is_a_report_error() {
        let request = ReportRequest::new(
            TenantId::new(),
            CostingMethod::Fifo,
            date(2025, 2, 1),
            date(2025, 1, 1),
        );
        let err = compute_report(&request).unwrap_err();
        assert!(matches!(err, ReportError::Window(_)));
    }

    #[test]
    fn reconciliation_unions_both_sides() {
        let item = ItemId::new();
        let replay_only = WarehouseId::new();
        let snapshot_only = WarehouseId::new();
        let ts = Utc.with_ymd_and_hms(2025, 1, 5, 8, 0, 0).unwrap();

        let request = ReportRequest::new(
            TenantId::new(),
            CostingMethod::Fifo,
            date(2025, 1, 1),
            date(2025, 1, 31),
        )
        .with_movements(vec![StockMovement::receive(
            MovementId::new(),
            item,
            replay_only,
            10.0,
            4.0,
            ts,
        )])
        .with_stock_levels(vec![StockLevel::new(snapshot_only, item, 5.0, 4.0)]);

        let report = compute_report(&request).unwrap();
        assert_eq!(report.reconciliation.len(), 2);

        let by_id = |id: WarehouseId| {
            report
                .reconciliation
                .iter()
                .find(|row| row.warehouse_id == id)
                .copied()
                .unwrap()
        };
        let replayed = by_id(replay_only);
        assert_eq!(replayed.replayed_value, 40.0);
        assert_eq!(replayed.snapshot_value, 0.0);
        assert_eq!(replayed.delta(), -40.0);

        let snapshotted = by_id(snapshot_only);
        assert_eq!(snapshotted.snapshot_value, 20.0);
        assert_eq!(snapshotted.replayed_value, 0.0);
        assert_eq!(snapshotted.delta(), 20.0);
    }

    #[test]
    fn strict_conversion_aborts_the_report() {
        let item = ItemId::new();
        let wh = WarehouseId::new();
        let each = UnitOfMeasure::new(UnitId::new(), "EACH");
        let liter = UnitOfMeasure::new(UnitId::new(), "LITER");
        let ts = Utc.with_ymd_and_hms(2025, 1, 5, 8, 0, 0).unwrap();

        let mut movement = StockMovement::receive(MovementId::new(), item, wh, 0.0, 1.0, ts);
        movement = movement.with_entered(3.0, each);

        let request = ReportRequest::new(
            TenantId::new(),
            CostingMethod::Fifo,
            date(2025, 1, 1),
            date(2025, 1, 31),
        )
        .with_movements(vec![movement])
        .with_base_unit(item, liter)
        .with_strict_conversion();

        let err = compute_report(&request).unwrap_err();
        assert!(matches!(err, ReportError::Conversion(_)));
    }
}

//! Chronological replay of stock movements into a cost ledger.
//!
//! Every report rebuilds the ledger from scratch: movements are sorted by
//! timestamp, applied one by one, and the pass returns ending positions,
//! window-scoped aggregates, and a per-movement outcome tag. Bad rows are
//! skipped and counted, never silently dropped and never fatal (unless the
//! caller asked for strict conversion handling).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use stocktally_core::{ItemId, MovementId, ReportWindow, WarehouseId};
use stocktally_uom::{ConversionError, UnitConversionGraph, UnitOfMeasure};

use crate::ledger::{CostLedger, CostingMethod, EndingPosition, StockKey};
use crate::movement::{MovementKind, StockMovement};

/// Why a movement contributed nothing to the replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Effective base quantity was zero, or negative where a positive one
    /// is required.
    NonPositiveQuantity,
    /// The movement lacks the warehouse (or, for transfers, one of the two
    /// warehouses) its kind requires.
    UnresolvedWarehouse,
    /// The entered quantity could not be normalized to the item's base unit.
    NoConversionPath,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NonPositiveQuantity => "non-positive quantity",
            Self::UnresolvedWarehouse => "unresolved warehouse",
            Self::NoConversionPath => "no conversion path",
        };
        f.write_str(s)
    }
}

/// What the replay did with one movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementStatus {
    Applied,
    Skipped(SkipReason),
}

/// Per-movement tag, in replay (chronological) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementOutcome {
    pub movement_id: MovementId,
    pub status: MovementStatus,
}

/// Counters describing how a replay pass went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayAudit {
    pub applied: usize,
    pub skipped_non_positive: usize,
    pub skipped_unresolved_warehouse: usize,
    pub skipped_no_conversion: usize,
    /// Outbound consumptions that ran past the quantity actually held.
    pub layer_shortfalls: usize,
}

impl ReplayAudit {
    fn record(&mut self, status: MovementStatus) {
        match status {
            MovementStatus::Applied => self.applied += 1,
            MovementStatus::Skipped(SkipReason::NonPositiveQuantity) => {
                self.skipped_non_positive += 1;
            }
            MovementStatus::Skipped(SkipReason::UnresolvedWarehouse) => {
                self.skipped_unresolved_warehouse += 1;
            }
            MovementStatus::Skipped(SkipReason::NoConversionPath) => {
                self.skipped_no_conversion += 1;
            }
        }
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped_non_positive + self.skipped_unresolved_warehouse + self.skipped_no_conversion
    }
}

/// Resolves the effective base quantity of a movement.
///
/// `qty_base` wins when it is non-zero. When it never got materialized
/// upstream, the entered quantity is pushed through the conversion graph
/// toward the item's declared base unit. By default an unconvertible entry
/// is reported as unresolvable and the movement gets skipped; `strict()`
/// turns that into a hard error that aborts the whole replay.
pub struct QuantityNormalizer<'a> {
    graph: &'a UnitConversionGraph,
    base_units: &'a BTreeMap<ItemId, UnitOfMeasure>,
    strict: bool,
}

impl<'a> QuantityNormalizer<'a> {
    pub fn new(
        graph: &'a UnitConversionGraph,
        base_units: &'a BTreeMap<ItemId, UnitOfMeasure>,
    ) -> Self {
        Self {
            graph,
            base_units,
            strict: false,
        }
    }

    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// `Ok(None)` means the quantity exists but cannot be normalized.
    fn base_qty(&self, movement: &StockMovement) -> Result<Option<f64>, ConversionError> {
        if movement.qty_base != 0.0 {
            return Ok(Some(movement.qty_base));
        }
        let (Some(unit), Some(base)) = (
            movement.unit.as_ref(),
            self.base_units.get(&movement.item_id),
        ) else {
            return Ok(Some(0.0));
        };
        if movement.qty == 0.0 {
            return Ok(Some(0.0));
        }
        match self.graph.convert(movement.qty, unit, base) {
            Ok(qty) => Ok(Some(qty)),
            Err(err) if self.strict => Err(err),
            Err(_) => Ok(None),
        }
    }
}

/// Everything one replay pass produces.
#[derive(Debug, Clone)]
pub struct LedgerReplay {
    window: ReportWindow,
    ledger: CostLedger,
    /// COGS recognized inside the window, per item.
    pub cogs_by_item: BTreeMap<ItemId, f64>,
    /// Outbound base units inside the window, per item. Transfers excluded.
    pub units_sold_by_item: BTreeMap<ItemId, f64>,
    /// Inbound base units inside the window, per item. Transfers excluded.
    pub units_received_by_item: BTreeMap<ItemId, f64>,
    /// Most recent replenishment on or before the window end, per item.
    pub last_replenishment: BTreeMap<ItemId, DateTime<Utc>>,
    /// Every item id the movement list mentioned, applied or skipped,
    /// inside the window or not. Analytics size their item universe by it.
    pub items_seen: BTreeSet<ItemId>,
    pub outcomes: Vec<MovementOutcome>,
    pub audit: ReplayAudit,
}

impl LedgerReplay {
    pub fn method(&self) -> CostingMethod {
        self.ledger.method()
    }

    pub fn window(&self) -> ReportWindow {
        self.window
    }

    pub fn ledger(&self) -> &CostLedger {
        &self.ledger
    }

    /// Ending position per (warehouse, item) key, sorted.
    pub fn positions(&self) -> Vec<EndingPosition> {
        self.ledger.positions()
    }

    /// Ending inventory value per warehouse.
    pub fn valuation_by_warehouse(&self) -> BTreeMap<WarehouseId, f64> {
        self.ledger.valuation_by_warehouse()
    }

    pub fn total_cogs(&self) -> f64 {
        self.cogs_by_item.values().sum()
    }
}

struct ReplayState {
    ledger: CostLedger,
    window: ReportWindow,
    cogs_by_item: BTreeMap<ItemId, f64>,
    units_sold_by_item: BTreeMap<ItemId, f64>,
    units_received_by_item: BTreeMap<ItemId, f64>,
    last_replenishment: BTreeMap<ItemId, DateTime<Utc>>,
    items_seen: BTreeSet<ItemId>,
    audit: ReplayAudit,
}

fn skipped(movement: &StockMovement, reason: SkipReason) -> MovementStatus {
    debug!(movement = %movement.id, %reason, "movement skipped");
    MovementStatus::Skipped(reason)
}

impl ReplayState {
    fn new(method: CostingMethod, window: ReportWindow) -> Self {
        Self {
            ledger: CostLedger::new(method),
            window,
            cogs_by_item: BTreeMap::new(),
            units_sold_by_item: BTreeMap::new(),
            units_received_by_item: BTreeMap::new(),
            last_replenishment: BTreeMap::new(),
            items_seen: BTreeSet::new(),
            audit: ReplayAudit::default(),
        }
    }

    fn apply(
        &mut self,
        movement: &StockMovement,
        normalizer: &QuantityNormalizer<'_>,
    ) -> Result<MovementStatus, ConversionError> {
        // Even skipped or out-of-window movements pin their item into the
        // report's item universe.
        self.items_seen.insert(movement.item_id);

        let Some(base_qty) = normalizer.base_qty(movement)? else {
            return Ok(skipped(movement, SkipReason::NoConversionPath));
        };

        if movement.kind == MovementKind::Transfer {
            return Ok(self.apply_transfer(movement, base_qty));
        }

        // Adjustments carry direction in their sign; receives and issues
        // must be positive outright.
        let (inbound, qty) = match movement.kind {
            MovementKind::Receive => (true, base_qty),
            MovementKind::Issue => (false, base_qty),
            MovementKind::Adjust => (base_qty > 0.0, base_qty.abs()),
            MovementKind::Transfer => unreachable!("handled above"),
        };
        if qty <= 0.0 {
            return Ok(skipped(movement, SkipReason::NonPositiveQuantity));
        }
        let Some(warehouse_id) = movement.warehouse_id else {
            return Ok(skipped(movement, SkipReason::UnresolvedWarehouse));
        };

        let key = StockKey::new(warehouse_id, movement.item_id);
        if inbound {
            self.record_inbound(movement, key, qty);
        } else {
            self.record_outbound(movement, key, qty);
        }
        Ok(MovementStatus::Applied)
    }

    fn apply_transfer(&mut self, movement: &StockMovement, base_qty: f64) -> MovementStatus {
        if base_qty <= 0.0 {
            return skipped(movement, SkipReason::NonPositiveQuantity);
        }
        let (Some(src), Some(dst)) = (movement.warehouse_id, movement.to_warehouse_id) else {
            return skipped(movement, SkipReason::UnresolvedWarehouse);
        };

        let from = StockKey::new(src, movement.item_id);
        let to = StockKey::new(dst, movement.item_id);
        let moved = self.ledger.transfer(from, to, base_qty);
        if moved.shortfall > 0.0 {
            self.audit.layer_shortfalls += 1;
            warn!(
                movement = %movement.id,
                shortfall = moved.shortfall,
                "transfer consumed more than the source held"
            );
        }
        MovementStatus::Applied
    }

    fn record_inbound(&mut self, movement: &StockMovement, key: StockKey, qty: f64) {
        let cost = movement
            .cost_hint(qty)
            .or_else(|| self.ledger.current_average(&key))
            .unwrap_or(0.0);
        self.ledger.receive(key, qty, cost);

        if self.window.contains(movement.occurred_at) {
            *self
                .units_received_by_item
                .entry(movement.item_id)
                .or_insert(0.0) += qty;
        }
        if self.window.on_or_before_end(movement.occurred_at) {
            self.last_replenishment
                .entry(movement.item_id)
                .and_modify(|at| {
                    if movement.occurred_at > *at {
                        *at = movement.occurred_at;
                    }
                })
                .or_insert(movement.occurred_at);
        }
    }

    fn record_outbound(&mut self, movement: &StockMovement, key: StockKey, qty: f64) {
        let consumed = self.ledger.consume(key, qty);
        if consumed.shortfall > 0.0 {
            self.audit.layer_shortfalls += 1;
            warn!(
                movement = %movement.id,
                shortfall = consumed.shortfall,
                "consumption ran past the available cost layers"
            );
        }
        if self.window.contains(movement.occurred_at) {
            *self.cogs_by_item.entry(movement.item_id).or_insert(0.0) += consumed.cost();
            *self
                .units_sold_by_item
                .entry(movement.item_id)
                .or_insert(0.0) += qty;
        }
    }

    fn finish(self, outcomes: Vec<MovementOutcome>) -> LedgerReplay {
        LedgerReplay {
            window: self.window,
            ledger: self.ledger,
            cogs_by_item: self.cogs_by_item,
            units_sold_by_item: self.units_sold_by_item,
            units_received_by_item: self.units_received_by_item,
            last_replenishment: self.last_replenishment,
            items_seen: self.items_seen,
            outcomes,
            audit: self.audit,
        }
    }
}

/// Replay the full movement history under one costing method.
///
/// Positions come out of the entire history; COGS and unit counters only
/// accumulate for movements whose timestamp falls inside `window`. The
/// sort is stable, so movements sharing a timestamp keep their input
/// order.
pub fn replay_movements(
    movements: &[StockMovement],
    method: CostingMethod,
    window: ReportWindow,
    normalizer: &QuantityNormalizer<'_>,
) -> Result<LedgerReplay, ConversionError> {
    let mut ordered: Vec<&StockMovement> = movements.iter().collect();
    ordered.sort_by_key(|m| m.occurred_at);

    let mut state = ReplayState::new(method, window);
    let mut outcomes = Vec::with_capacity(ordered.len());
    for movement in ordered {
        let status = state.apply(movement, normalizer)?;
        state.audit.record(status);
        outcomes.push(MovementOutcome {
            movement_id: movement.id,
            status,
        });
    }

    debug!(
        applied = state.audit.applied,
        skipped = state.audit.skipped_total(),
        shortfalls = state.audit.layer_shortfalls,
        "replay finished"
    );
    Ok(state.finish(outcomes))
}

//! Per-key costing state: FIFO cost layers and weighted-average blending.

use std::collections::{BTreeMap, HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use stocktally_core::{ItemId, WarehouseId};

/// Costing mode for a replay pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostingMethod {
    Fifo,
    WeightedAverage,
}

/// Ledger key: one item in one warehouse. Keys never share state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub warehouse_id: WarehouseId,
    pub item_id: ItemId,
}

impl StockKey {
    pub fn new(warehouse_id: WarehouseId, item_id: ItemId) -> Self {
        Self {
            warehouse_id,
            item_id,
        }
    }
}

/// One FIFO tranche: quantity remaining at its original unit cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostLayer {
    pub qty: f64,
    pub unit_cost: f64,
}

impl CostLayer {
    pub fn new(qty: f64, unit_cost: f64) -> Self {
        Self { qty, unit_cost }
    }

    pub fn value(&self) -> f64 {
        self.qty * self.unit_cost
    }
}

/// Running weighted-average state for one key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightedAverageState {
    pub qty: f64,
    pub avg_cost: f64,
}

impl WeightedAverageState {
    pub fn value(&self) -> f64 {
        self.qty * self.avg_cost
    }
}

/// Tranches removed by one outbound consumption, oldest first, plus the
/// quantity (if any) charged beyond what the key actually held.
#[derive(Debug, Clone, PartialEq)]
pub struct Consumption {
    pub tranches: Vec<CostLayer>,
    pub shortfall: f64,
}

impl Consumption {
    /// Total cost of goods charged by this consumption.
    pub fn cost(&self) -> f64 {
        self.tranches.iter().map(CostLayer::value).sum()
    }

    pub fn qty(&self) -> f64 {
        self.tranches.iter().map(|t| t.qty).sum()
    }
}

#[derive(Debug, Clone)]
enum KeyLedger {
    Fifo {
        layers: VecDeque<CostLayer>,
        /// Cost of the most recent layer seen; used to price consumption
        /// past the end of the queue.
        last_cost: f64,
    },
    Average(WeightedAverageState),
}

/// Ending quantity, display cost, and value for one key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EndingPosition {
    pub warehouse_id: WarehouseId,
    pub item_id: ItemId,
    pub qty: f64,
    /// Value-weighted average under FIFO; the running average otherwise.
    pub avg_cost: f64,
    pub value: f64,
}

/// In-memory ledger rebuilt from scratch on every replay: per-key FIFO
/// layer queues or weighted-average states, nothing persisted.
#[derive(Debug, Clone)]
pub struct CostLedger {
    method: CostingMethod,
    entries: HashMap<StockKey, KeyLedger>,
}

impl CostLedger {
    pub fn new(method: CostingMethod) -> Self {
        Self {
            method,
            entries: HashMap::new(),
        }
    }

    pub fn method(&self) -> CostingMethod {
        self.method
    }

    fn entry(&mut self, key: StockKey) -> &mut KeyLedger {
        let method = self.method;
        self.entries.entry(key).or_insert_with(|| match method {
            CostingMethod::Fifo => KeyLedger::Fifo {
                layers: VecDeque::new(),
                last_cost: 0.0,
            },
            CostingMethod::WeightedAverage => {
                KeyLedger::Average(WeightedAverageState::default())
            }
        })
    }

    /// Record an inbound quantity at a cost. Zero and negative quantities
    /// are ignored; callers skip them before reaching the ledger.
    pub fn receive(&mut self, key: StockKey, qty: f64, unit_cost: f64) {
        if qty <= 0.0 {
            return;
        }
        self.deposit(key, CostLayer::new(qty, unit_cost));
    }

    fn deposit(&mut self, key: StockKey, tranche: CostLayer) {
        match self.entry(key) {
            KeyLedger::Fifo { layers, last_cost } => {
                *last_cost = tranche.unit_cost;
                layers.push_back(tranche);
            }
            KeyLedger::Average(state) => {
                let total = state.value() + tranche.value();
                state.qty += tranche.qty;
                if state.qty > 0.0 {
                    state.avg_cost = total / state.qty;
                }
            }
        }
    }

    /// Take `qty` out of a key and return what it cost.
    ///
    /// FIFO pops oldest layers first; weighted average charges the running
    /// average and leaves it unchanged. Consuming past what the key holds
    /// extends at the last known cost instead of failing, and the overrun
    /// is reported as `shortfall` so the caller can count it.
    pub fn consume(&mut self, key: StockKey, qty: f64) -> Consumption {
        if qty <= 0.0 {
            return Consumption {
                tranches: Vec::new(),
                shortfall: 0.0,
            };
        }
        match self.entry(key) {
            KeyLedger::Fifo { layers, last_cost } => {
                let mut remaining = qty;
                let mut tranches = Vec::new();
                while remaining > 0.0 {
                    match layers.front_mut() {
                        None => break,
                        Some(front) if front.qty > remaining => {
                            front.qty -= remaining;
                            *last_cost = front.unit_cost;
                            tranches.push(CostLayer::new(remaining, front.unit_cost));
                            remaining = 0.0;
                        }
                        Some(_) => {
                            if let Some(layer) = layers.pop_front() {
                                remaining -= layer.qty;
                                *last_cost = layer.unit_cost;
                                tranches.push(layer);
                            }
                        }
                    }
                }
                if remaining > 0.0 {
                    tranches.push(CostLayer::new(remaining, *last_cost));
                }
                Consumption {
                    tranches,
                    shortfall: remaining,
                }
            }
            KeyLedger::Average(state) => {
                let shortfall = (qty - state.qty).max(0.0);
                let tranche = CostLayer::new(qty, state.avg_cost);
                state.qty = (state.qty - qty).max(0.0);
                Consumption {
                    tranches: vec![tranche],
                    shortfall,
                }
            }
        }
    }

    /// Move cost basis from one key to another without recognizing COGS:
    /// the exact tranches consumed at the source are deposited, costs
    /// unchanged, at the destination.
    pub fn transfer(&mut self, from: StockKey, to: StockKey, qty: f64) -> Consumption {
        let consumption = self.consume(from, qty);
        for tranche in &consumption.tranches {
            self.deposit(to, *tranche);
        }
        consumption
    }

    /// Current running average for a key, if it is tracked as one.
    pub fn current_average(&self, key: &StockKey) -> Option<f64> {
        match self.entries.get(key) {
            Some(KeyLedger::Average(state)) => Some(state.avg_cost),
            _ => None,
        }
    }

    /// Remaining FIFO layers for a key, oldest first.
    pub fn layers(&self, key: &StockKey) -> Option<Vec<CostLayer>> {
        match self.entries.get(key) {
            Some(KeyLedger::Fifo { layers, .. }) => Some(layers.iter().copied().collect()),
            _ => None,
        }
    }

    /// Ending position of every key touched so far, sorted by key so the
    /// output is identical across runs.
    pub fn positions(&self) -> Vec<EndingPosition> {
        let mut rows: Vec<EndingPosition> = self
            .entries
            .iter()
            .map(|(key, entry)| {
                let (qty, avg_cost, value) = match entry {
                    KeyLedger::Fifo { layers, .. } => {
                        let qty: f64 = layers.iter().map(|l| l.qty).sum();
                        let value: f64 = layers.iter().map(CostLayer::value).sum();
                        let avg = if qty > 0.0 { value / qty } else { 0.0 };
                        (qty, avg, value)
                    }
                    KeyLedger::Average(state) => (state.qty, state.avg_cost, state.value()),
                };
                EndingPosition {
                    warehouse_id: key.warehouse_id,
                    item_id: key.item_id,
                    qty,
                    avg_cost,
                    value,
                }
            })
            .collect();
        rows.sort_by_key(|row| (row.warehouse_id, row.item_id));
        rows
    }

    /// Ending inventory value summed per warehouse. Zeroed keys stay in
    /// the map so fully consumed warehouses still reconcile.
    pub fn valuation_by_warehouse(&self) -> BTreeMap<WarehouseId, f64> {
        let mut totals = BTreeMap::new();
        for row in self.positions() {
            *totals.entry(row.warehouse_id).or_insert(0.0) += row.value;
        }
        totals
    }

    /// Total ending value across every key.
    pub fn total_value(&self) -> f64 {
        self.positions().iter().map(|row| row.value).sum()
    }
}

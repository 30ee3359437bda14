//! `stocktally-costing` — stock movements, cost ledgers, and replay.
//!
//! The crate rebuilds costing state from a movement history instead of
//! trusting stored running totals: FIFO layer queues or weighted-average
//! states per (warehouse, item) key, window-scoped COGS and unit counters,
//! and a per-movement audit trail of what was applied or skipped.

pub mod ledger;
pub mod movement;
pub mod replay;

pub use ledger::{
    Consumption, CostLayer, CostLedger, CostingMethod, EndingPosition, StockKey,
    WeightedAverageState,
};
pub use movement::{MovementKind, StockMovement};
pub use replay::{
    replay_movements, LedgerReplay, MovementOutcome, MovementStatus, QuantityNormalizer,
    ReplayAudit, SkipReason,
};

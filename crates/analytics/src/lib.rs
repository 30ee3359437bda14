//! `stocktally-analytics` — turnover, sellers, aging, and report assembly.
//!
//! Combines the replayed ledger with the snapshot valuation into the
//! report model presentation code consumes. Pure over its inputs: same
//! movements, levels, and edges in, same report out.

pub mod aging;
pub mod report;
pub mod sellers;
pub mod turnover;

pub use aging::{
    AgeBucket, AgingBreakdown, BinAgingRow, BucketTotals, StockAging, WarehouseAgingRow,
};
pub use report::{
    compute_report, reconcile_warehouses, CostReport, ReconciliationRow, ReportError,
    ReportRequest,
};
pub use sellers::{seller_digest, SellerDigest, SellerRow};
pub use turnover::{
    avg_days_to_sell, begin_units, item_turnover, turnover_summary, turns, ItemTurnoverRow,
    TurnoverSummary,
};

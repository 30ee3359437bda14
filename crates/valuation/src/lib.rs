//! `stocktally-valuation` — current inventory value from snapshot rows.

pub mod level;
pub mod snapshot;

pub use level::StockLevel;
pub use snapshot::{BinValuationRow, ItemValuationRow, SnapshotValuation, WarehouseValuationRow};

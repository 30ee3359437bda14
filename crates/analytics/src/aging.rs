//! Stock aging: bucket on-hand stock by days since last replenishment.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocktally_core::{BinId, ItemId, ReportWindow, WarehouseId};
use stocktally_valuation::StockLevel;

/// Fixed day-range buckets. Ordering follows age, youngest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeBucket {
    #[serde(rename = "0-30")]
    D0To30,
    #[serde(rename = "31-60")]
    D31To60,
    #[serde(rename = "61-90")]
    D61To90,
    #[serde(rename = "91-180")]
    D91To180,
    #[serde(rename = "181+")]
    D181Plus,
}

impl AgeBucket {
    pub const ALL: [AgeBucket; 5] = [
        AgeBucket::D0To30,
        AgeBucket::D31To60,
        AgeBucket::D61To90,
        AgeBucket::D91To180,
        AgeBucket::D181Plus,
    ];

    /// Bucket for an age in days (ages are floored at 0 upstream).
    pub fn for_age(days: i64) -> Self {
        match days {
            ..=30 => Self::D0To30,
            31..=60 => Self::D31To60,
            61..=90 => Self::D61To90,
            91..=180 => Self::D91To180,
            _ => Self::D181Plus,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::D0To30 => "0-30",
            Self::D31To60 => "31-60",
            Self::D61To90 => "61-90",
            Self::D91To180 => "91-180",
            Self::D181Plus => "181+",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::D0To30 => 0,
            Self::D31To60 => 1,
            Self::D61To90 => 2,
            Self::D91To180 => 3,
            Self::D181Plus => 4,
        }
    }
}

impl fmt::Display for AgeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Quantity and value landing in one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketTotals {
    pub qty: f64,
    pub value: f64,
}

/// All five buckets for one grouping key; empty buckets stay present so
/// report columns line up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgingBreakdown {
    buckets: [BucketTotals; 5],
}

impl AgingBreakdown {
    fn add(&mut self, bucket: AgeBucket, qty: f64, value: f64) {
        let slot = &mut self.buckets[bucket.index()];
        slot.qty += qty;
        slot.value += value;
    }

    pub fn bucket(&self, bucket: AgeBucket) -> BucketTotals {
        self.buckets[bucket.index()]
    }

    pub fn total_qty(&self) -> f64 {
        self.buckets.iter().map(|b| b.qty).sum()
    }

    pub fn total_value(&self) -> f64 {
        self.buckets.iter().map(|b| b.value).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehouseAgingRow {
    pub warehouse_id: WarehouseId,
    pub breakdown: AgingBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinAgingRow {
    pub warehouse_id: WarehouseId,
    pub bin_id: Option<BinId>,
    pub breakdown: AgingBreakdown,
}

/// Aging tables by warehouse and by (warehouse, bin), rows sorted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockAging {
    pub by_warehouse: Vec<WarehouseAgingRow>,
    pub by_bin: Vec<BinAgingRow>,
}

impl StockAging {
    /// Age every on-hand snapshot row by its item's last replenishment.
    ///
    /// The replenishment timestamp is per item globally, not scoped to the
    /// row's warehouse: receiving into WH1 refreshes the age of the same
    /// item sitting in WH2. An item never replenished lands in the oldest
    /// bucket. Rows with nothing on hand are left out.
    pub fn compute(
        levels: &[StockLevel],
        last_replenishment: &BTreeMap<ItemId, DateTime<Utc>>,
        window: ReportWindow,
    ) -> Self {
        let mut warehouses: BTreeMap<WarehouseId, AgingBreakdown> = BTreeMap::new();
        let mut bins: BTreeMap<(WarehouseId, Option<BinId>), AgingBreakdown> = BTreeMap::new();

        for level in levels {
            if level.on_hand_qty <= 0.0 {
                continue;
            }
            let bucket = match last_replenishment.get(&level.item_id) {
                Some(at) => AgeBucket::for_age(window.age_in_days(*at)),
                None => AgeBucket::D181Plus,
            };
            warehouses
                .entry(level.warehouse_id)
                .or_default()
                .add(bucket, level.on_hand_qty, level.value());
            bins.entry((level.warehouse_id, level.bin_id))
                .or_default()
                .add(bucket, level.on_hand_qty, level.value());
        }

        Self {
            by_warehouse: warehouses
                .into_iter()
                .map(|(warehouse_id, breakdown)| WarehouseAgingRow {
                    warehouse_id,
                    breakdown,
                })
                .collect(),
            by_bin: bins
                .into_iter()
                .map(|((warehouse_id, bin_id), breakdown)| BinAgingRow {
                    warehouse_id,
                    bin_id,
                    breakdown,
                })
                .collect(),
        }
    }

    pub fn warehouse_breakdown(&self, warehouse_id: WarehouseId) -> Option<&AgingBreakdown> {
        self.by_warehouse
            .iter()
            .find(|row| row.warehouse_id == warehouse_id)
            .map(|row| &row.breakdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn window_ending(y: i32, m: u32, d: u32) -> ReportWindow {
        let end = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        ReportWindow::new(end - chrono::Duration::days(30), end).unwrap()
    }

    #[test]
    fn bucket_labels_line_up_with_their_order() {
        let labels: Vec<&str> = AgeBucket::ALL.iter().map(AgeBucket::label).collect();
        assert_eq!(labels, ["0-30", "31-60", "61-90", "91-180", "181+"]);
        assert_eq!(AgeBucket::D181Plus.to_string(), "181+");
    }

    #[test]
    fn bucket_edges() {
        assert_eq!(AgeBucket::for_age(0), AgeBucket::D0To30);
        assert_eq!(AgeBucket::for_age(30), AgeBucket::D0To30);
        assert_eq!(AgeBucket::for_age(31), AgeBucket::D31To60);
        assert_eq!(AgeBucket::for_age(60), AgeBucket::D31To60);
        assert_eq!(AgeBucket::for_age(61), AgeBucket::D61To90);
        assert_eq!(AgeBucket::for_age(90), AgeBucket::D61To90);
        assert_eq!(AgeBucket::for_age(91), AgeBucket::D91To180);
        assert_eq!(AgeBucket::for_age(180), AgeBucket::D91To180);
        assert_eq!(AgeBucket::for_age(181), AgeBucket::D181Plus);
        assert_eq!(AgeBucket::for_age(4000), AgeBucket::D181Plus);
    }

    #[test]
    fn old_replenishment_lands_fully_in_the_oldest_bucket() {
        let item = ItemId::new();
        let wh = WarehouseId::new();
        let bin = BinId::new();
        let window = window_ending(2025, 7, 20);
        // Received 200 days before the window end, still fully on hand.
        let received_at = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        let mut last = BTreeMap::new();
        last.insert(item, received_at);

        let levels = vec![StockLevel::new(wh, item, 100.0, 10.0).with_bin(bin)];
        let aging = StockAging::compute(&levels, &last, window);

        let wh_row = aging.warehouse_breakdown(wh).unwrap();
        assert_eq!(wh_row.bucket(AgeBucket::D181Plus).qty, 100.0);
        assert_eq!(wh_row.bucket(AgeBucket::D181Plus).value, 1000.0);
        assert_eq!(wh_row.bucket(AgeBucket::D0To30).qty, 0.0);

        let bin_row = &aging.by_bin[0];
        assert_eq!(bin_row.bin_id, Some(bin));
        assert_eq!(bin_row.breakdown.bucket(AgeBucket::D181Plus).qty, 100.0);
    }

    #[test]
    fn never_replenished_item_is_oldest() {
        let wh = WarehouseId::new();
        let levels = vec![StockLevel::new(wh, ItemId::new(), 5.0, 2.0)];
        let aging = StockAging::compute(&levels, &BTreeMap::new(), window_ending(2025, 7, 20));
        let row = aging.warehouse_breakdown(wh).unwrap();
        assert_eq!(row.bucket(AgeBucket::D181Plus).qty, 5.0);
    }

    #[test]
    fn replenishment_is_global_across_warehouses() {
        let item = ItemId::new();
        let stocked_wh = WarehouseId::new();
        let receiving_wh = WarehouseId::new();
        let window = window_ending(2025, 7, 20);
        // The item was last received into a different warehouse 45 days
        // before the window end; the stocked warehouse ages by that.
        let mut last = BTreeMap::new();
        last.insert(item, Utc.with_ymd_and_hms(2025, 6, 5, 9, 0, 0).unwrap());

        let levels = vec![StockLevel::new(stocked_wh, item, 10.0, 1.0)];
        let aging = StockAging::compute(&levels, &last, window);

        assert!(aging.warehouse_breakdown(receiving_wh).is_none());
        let row = aging.warehouse_breakdown(stocked_wh).unwrap();
        assert_eq!(row.bucket(AgeBucket::D31To60).qty, 10.0);
    }

    #[test]
    fn rows_without_stock_are_left_out() {
        let wh = WarehouseId::new();
        let levels = vec![
            StockLevel::new(wh, ItemId::new(), 0.0, 10.0),
            StockLevel::new(wh, ItemId::new(), -3.0, 10.0),
        ];
        let aging = StockAging::compute(&levels, &BTreeMap::new(), window_ending(2025, 7, 20));
        assert!(aging.by_warehouse.is_empty());
        assert!(aging.by_bin.is_empty());
    }

    #[test]
    fn breakdown_totals_cover_every_bucket() {
        let item_young = ItemId::new();
        let item_old = ItemId::new();
        let wh = WarehouseId::new();
        let window = window_ending(2025, 7, 20);
        let mut last = BTreeMap::new();
        last.insert(item_young, Utc.with_ymd_and_hms(2025, 7, 15, 0, 0, 0).unwrap());
        last.insert(item_old, Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap());

        let levels = vec![
            StockLevel::new(wh, item_young, 4.0, 5.0),
            StockLevel::new(wh, item_old, 6.0, 5.0),
        ];
        let aging = StockAging::compute(&levels, &last, window);
        let row = aging.warehouse_breakdown(wh).unwrap();
        assert_eq!(row.total_qty(), 10.0);
        assert_eq!(row.total_value(), 50.0);
        assert_eq!(row.bucket(AgeBucket::D0To30).qty, 4.0);
        // Apr 1 → Jul 20 is 110 days.
        assert_eq!(row.bucket(AgeBucket::D91To180).qty, 6.0);
    }
}

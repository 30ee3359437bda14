//! Best/worst sellers over the reporting window.

use serde::Serialize;

use stocktally_core::ItemId;

use crate::turnover::ItemTurnoverRow;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SellerRow {
    pub item_id: ItemId,
    pub units_sold: f64,
    pub cogs: f64,
}

/// Highest and lowest sellers by units sold, considering only items with
/// at least one recorded sale. Ties resolve to the lower item id because
/// the input rows arrive sorted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SellerDigest {
    pub best: Option<SellerRow>,
    pub worst: Option<SellerRow>,
    /// Items in the report universe with no sale in the window.
    pub zero_sale_items: usize,
}

pub fn seller_digest(rows: &[ItemTurnoverRow]) -> SellerDigest {
    let mut best: Option<&ItemTurnoverRow> = None;
    let mut worst: Option<&ItemTurnoverRow> = None;
    let mut sellers = 0usize;

    for row in rows {
        if row.units_sold <= 0.0 {
            continue;
        }
        sellers += 1;
        match best {
            Some(b) if row.units_sold <= b.units_sold => {}
            _ => best = Some(row),
        }
        match worst {
            Some(w) if row.units_sold >= w.units_sold => {}
            _ => worst = Some(row),
        }
    }

    let as_seller = |row: &ItemTurnoverRow| SellerRow {
        item_id: row.item_id,
        units_sold: row.units_sold,
        cogs: row.cogs,
    };
    SellerDigest {
        best: best.map(as_seller),
        worst: worst.map(as_seller),
        zero_sale_items: rows.len() - sellers,
    }
}

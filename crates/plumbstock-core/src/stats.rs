//! Headline figures for a set of stock lines.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::item::InventoryItem;

/// Anything with a stock level, a unit price, and a type to group by.
pub trait StockLine {
    fn stock_level(&self) -> i64;
    fn price(&self) -> f64;
    /// Grouping key counted by [`CategoryStats::distinct_types`].
    fn kind(&self) -> &str;

    fn value(&self) -> f64 {
        self.price() * self.stock_level() as f64
    }
}

impl StockLine for InventoryItem {
    fn stock_level(&self) -> i64 {
        self.stock_level
    }

    fn price(&self) -> f64 {
        self.price
    }

    fn kind(&self) -> &str {
        self.category.as_str()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub total: usize,
    /// Lines with `stock_level < reorder_level`.
    pub low_stock: usize,
    /// Sum of `price * stock_level`.
    pub total_value: f64,
    pub distinct_types: usize,
}

pub fn aggregate<L: StockLine>(lines: &[L], reorder_level: i64) -> CategoryStats {
    let kinds: HashSet<&str> = lines.iter().map(|line| line.kind()).collect();
    CategoryStats {
        total: lines.len(),
        low_stock: lines
            .iter()
            .filter(|line| line.stock_level() < reorder_level)
            .count(),
        total_value: lines.iter().map(|line| line.value()).sum(),
        distinct_types: kinds.len(),
    }
}

/// Lines below `reorder_level`, lowest stock first.
pub fn low_stock<L: StockLine>(lines: &[L], reorder_level: i64) -> Vec<&L> {
    let mut low: Vec<&L> = lines
        .iter()
        .filter(|line| line.stock_level() < reorder_level)
        .collect();
    low.sort_by_key(|line| line.stock_level());
    low
}

//! Category views over the stored items.
//!
//! A category page shows the user's items filed under (or named like) the
//! category, followed by fallback samples, projected into display rows.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::item::{Category, InventoryItem, ItemId};
use crate::stats::{aggregate, CategoryStats, StockLine};

pub const DEFAULT_LOCATION: &str = "Storage";
pub const NO_DESCRIPTION: &str = "No description available";

/// Whether `item` is shown on `category`'s page.
pub fn belongs_to(item: &InventoryItem, category: Category) -> bool {
    if item.category == category {
        return true;
    }
    let name = item.name.to_lowercase();
    category
        .name_keywords()
        .iter()
        .any(|keyword| name.contains(keyword))
}

/// Stored items shown under `category`, then every fallback item whose id
/// is not already taken by a stored one. Stored order is kept.
pub fn filter_by_category(
    stored: &[InventoryItem],
    category: Category,
    fallback: &[InventoryItem],
) -> Vec<InventoryItem> {
    let mut seen: HashSet<ItemId> = HashSet::new();
    stored
        .iter()
        .filter(|item| belongs_to(item, category))
        .chain(fallback.iter())
        .filter(|item| seen.insert(item.id))
        .cloned()
        .collect()
}

/// One line of a category table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRow {
    pub id: ItemId,
    pub item_code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub material: String,
    pub size: String,
    pub stock_level: i64,
    pub reorder_level: i64,
    pub price: f64,
    pub value: f64,
    pub location: String,
    pub image: Option<String>,
    pub last_restocked: NaiveDate,
    pub description: String,
}

impl CategoryRow {
    /// Row for `item` on `category`'s page. The type is the item's own, or
    /// the page's label when it has none, so keyword matches filed elsewhere
    /// read as the page's type.
    pub fn from_item(item: &InventoryItem, category: Category, reorder_level: i64) -> Self {
        let description = if item.description.trim().is_empty() {
            NO_DESCRIPTION.to_string()
        } else {
            item.description.clone()
        };
        Self {
            id: item.id,
            item_code: item.item_code.clone(),
            name: item.name.clone(),
            item_type: item
                .item_type
                .clone()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| category.type_label().to_string()),
            material: item.material.clone(),
            size: item.size.clone(),
            stock_level: item.stock_level,
            reorder_level,
            price: item.price,
            value: item.value(),
            location: DEFAULT_LOCATION.to_string(),
            image: item.image.clone(),
            last_restocked: item.date_modified.date_naive(),
            description,
        }
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock_level < self.reorder_level
    }
}

impl StockLine for CategoryRow {
    fn stock_level(&self) -> i64 {
        self.stock_level
    }

    fn price(&self) -> f64 {
        self.price
    }

    fn kind(&self) -> &str {
        &self.item_type
    }
}

/// Rows and headline figures for one category page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryView {
    pub category: Category,
    pub rows: Vec<CategoryRow>,
    pub stats: CategoryStats,
}

impl CategoryView {
    pub fn build(
        stored: &[InventoryItem],
        category: Category,
        fallback: &[InventoryItem],
        reorder_level: i64,
    ) -> Self {
        let rows: Vec<CategoryRow> = filter_by_category(stored, category, fallback)
            .iter()
            .map(|item| CategoryRow::from_item(item, category, reorder_level))
            .collect();
        let stats = aggregate(&rows, reorder_level);
        Self {
            category,
            rows,
            stats,
        }
    }
}

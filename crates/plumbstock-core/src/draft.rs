//! Normalization of loosely-typed item input.
//!
//! Form submissions and legacy records carry numbers as strings, blank
//! fields, and both `name` and `itemName`. An [`ItemDraft`] holds that input
//! as-is; [`ItemDraft::into_item`] and [`ItemDraft::merge_into`] are the only
//! paths from a draft to a stored [`InventoryItem`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::item::{Category, InventoryItem, ItemId, DEFAULT_MATERIAL, DEFAULT_NAME, DEFAULT_SIZE};

/// A scalar as it arrives from a form or an old record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Loose {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Loose {
    /// Numeric reading of the value. Blank or non-numeric text, booleans and
    /// non-finite floats have none.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Loose::Int(i) => Some(*i as f64),
            Loose::Float(f) if f.is_finite() => Some(*f),
            Loose::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    /// Text reading of the value. Empty strings count as absent.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Loose::Text(s) if !s.is_empty() => Some(s.clone()),
            Loose::Int(i) => Some(i.to_string()),
            Loose::Float(f) if f.is_finite() => Some(f.to_string()),
            _ => None,
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, Loose::Null)
    }
}

impl From<&str> for Loose {
    fn from(s: &str) -> Self {
        Loose::Text(s.to_string())
    }
}

impl From<String> for Loose {
    fn from(s: String) -> Self {
        Loose::Text(s)
    }
}

impl From<i64> for Loose {
    fn from(i: i64) -> Self {
        Loose::Int(i)
    }
}

impl From<i32> for Loose {
    fn from(i: i32) -> Self {
        Loose::Int(i64::from(i))
    }
}

impl From<f64> for Loose {
    fn from(f: f64) -> Self {
        Loose::Float(f)
    }
}

/// Partial, untyped item input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemDraft {
    pub id: Option<Loose>,
    pub item_code: Option<Loose>,
    /// Code the record had when it was staged for editing; preferred over
    /// `item_code` when an update falls back to code lookup.
    pub original_item_code: Option<String>,
    pub name: Option<Loose>,
    pub item_name: Option<Loose>,
    pub price: Option<Loose>,
    pub size: Option<Loose>,
    pub category: Option<Loose>,
    pub stock_level: Option<Loose>,
    pub material: Option<Loose>,
    /// Display type shown in category rows in place of the category label.
    #[serde(rename = "type")]
    pub item_type: Option<Loose>,
    pub description: Option<Loose>,
    pub image: Option<String>,
    pub date_added: Option<DateTime<Utc>>,
    pub date_modified: Option<DateTime<Utc>>,
}

impl ItemDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(Loose::Text(name.into())),
            ..Default::default()
        }
    }

    /// Draft addressing an existing record, carrying no field changes.
    pub fn for_id(id: ItemId) -> Self {
        Self {
            id: Some(Loose::Int(id)),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: ItemId) -> Self {
        self.id = Some(Loose::Int(id));
        self
    }

    pub fn with_item_code(mut self, code: impl Into<String>) -> Self {
        self.item_code = Some(Loose::Text(code.into()));
        self
    }

    pub fn with_original_item_code(mut self, code: impl Into<String>) -> Self {
        self.original_item_code = Some(code.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(Loose::Text(name.into()));
        self
    }

    pub fn with_price(mut self, price: impl Into<Loose>) -> Self {
        self.price = Some(price.into());
        self
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(Loose::Text(size.into()));
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(Loose::Text(category.as_str().to_string()));
        self
    }

    pub fn with_stock_level(mut self, stock: impl Into<Loose>) -> Self {
        self.stock_level = Some(stock.into());
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(Loose::Text(material.into()));
        self
    }

    pub fn with_item_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(Loose::Text(item_type.into()));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(Loose::Text(description.into()));
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Draft carrying every field of an existing record, as an edit form
    /// would be pre-filled.
    pub fn from_item(item: &InventoryItem) -> Self {
        Self {
            id: Some(Loose::Int(item.id)),
            item_code: Some(Loose::Text(item.item_code.clone())),
            original_item_code: Some(item.item_code.clone()),
            name: Some(Loose::Text(item.name.clone())),
            item_name: None,
            price: Some(Loose::Float(item.price)),
            size: Some(Loose::Text(item.size.clone())),
            category: Some(Loose::Text(item.category.as_str().to_string())),
            stock_level: Some(Loose::Int(item.stock_level)),
            material: Some(Loose::Text(item.material.clone())),
            item_type: item.item_type.clone().map(Loose::Text),
            description: Some(Loose::Text(item.description.clone())),
            image: item.image.clone(),
            date_added: Some(item.date_added),
            date_modified: Some(item.date_modified),
        }
    }

    /// Id carried by the draft, if it reads as a non-zero integer that fits
    /// an [`ItemId`]. Out-of-range numbers such as `"1e30"` carry no id.
    pub fn id(&self) -> Option<ItemId> {
        let id = match self.id.as_ref()? {
            Loose::Int(i) => *i,
            other => {
                let f = other.as_number()?.trunc();
                if f.abs() >= ItemId::MAX as f64 {
                    return None;
                }
                f as ItemId
            }
        };
        Some(id).filter(|id| *id != 0)
    }

    /// Code to match on when the id lookup misses.
    pub fn lookup_code(&self) -> Option<String> {
        self.original_item_code
            .clone()
            .filter(|c| !c.is_empty())
            .or_else(|| self.item_code.as_ref().and_then(Loose::as_text))
    }

    fn display_name(&self) -> Option<String> {
        self.name
            .as_ref()
            .and_then(Loose::as_text)
            .or_else(|| self.item_name.as_ref().and_then(Loose::as_text))
    }

    /// Build a complete item, filling every absent field with its default.
    pub fn into_item(
        self,
        id: ItemId,
        date_added: DateTime<Utc>,
        date_modified: DateTime<Utc>,
    ) -> InventoryItem {
        let name = self.display_name().unwrap_or_else(|| DEFAULT_NAME.to_string());
        InventoryItem {
            id,
            item_code: text_or(&self.item_code, ""),
            name,
            price: number_or_zero(&self.price),
            size: text_or(&self.size, DEFAULT_SIZE),
            category: category_of(&self.category),
            stock_level: number_or_zero(&self.stock_level).trunc() as i64,
            material: text_or(&self.material, DEFAULT_MATERIAL),
            item_type: self.item_type.as_ref().and_then(Loose::as_text),
            description: text_or(&self.description, ""),
            image: self.image.filter(|s| !s.is_empty()),
            date_added,
            date_modified,
        }
    }

    /// Apply the fields this draft carries on top of `existing`.
    ///
    /// Absent or null fields keep the existing value. Present numeric fields
    /// that do not read as numbers become 0. Id and `dateAdded` are never
    /// taken from the draft.
    pub fn merge_into(self, existing: &InventoryItem, date_modified: DateTime<Utc>) -> InventoryItem {
        let mut item = existing.clone();
        if let Some(name) = self.display_name() {
            item.name = name;
        }
        if let Some(code) = self.item_code.as_ref().and_then(Loose::as_text) {
            item.item_code = code;
        }
        if let Some(price) = present(&self.price) {
            item.price = price.as_number().unwrap_or(0.0);
        }
        if let Some(stock) = present(&self.stock_level) {
            item.stock_level = stock.as_number().unwrap_or(0.0).trunc() as i64;
        }
        if let Some(size) = self.size.as_ref().and_then(Loose::as_text) {
            item.size = size;
        }
        if let Some(material) = self.material.as_ref().and_then(Loose::as_text) {
            item.material = material;
        }
        if let Some(item_type) = present(&self.item_type) {
            item.item_type = item_type.as_text();
        }
        if let Some(category) = present(&self.category) {
            item.category = category
                .as_text()
                .map(|c| Category::parse_lenient(&c))
                .unwrap_or_default();
        }
        if let Some(description) = present(&self.description) {
            item.description = description.as_text().unwrap_or_default();
        }
        if let Some(image) = self.image {
            item.image = Some(image).filter(|s| !s.is_empty());
        }
        item.date_modified = date_modified;
        item
    }

    /// Recover a record from a legacy or partial persisted entry. Entries
    /// without an id cannot be addressed and are not recovered.
    pub fn into_legacy_item(self, now: DateTime<Utc>) -> Option<InventoryItem> {
        let id = self.id()?;
        let date_added = self.date_added.unwrap_or(now);
        let date_modified = self.date_modified.unwrap_or(date_added);
        Some(self.into_item(id, date_added, date_modified))
    }
}

fn present(v: &Option<Loose>) -> Option<&Loose> {
    v.as_ref().filter(|l| !l.is_null())
}

fn text_or(v: &Option<Loose>, default: &str) -> String {
    v.as_ref()
        .and_then(Loose::as_text)
        .unwrap_or_else(|| default.to_string())
}

fn number_or_zero(v: &Option<Loose>) -> f64 {
    v.as_ref().and_then(Loose::as_number).unwrap_or(0.0)
}

fn category_of(v: &Option<Loose>) -> Category {
    v.as_ref()
        .and_then(Loose::as_text)
        .map(|c| Category::parse_lenient(&c))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Loose::Int(12), Some(12.0))]
    #[case(Loose::Float(2.5), Some(2.5))]
    #[case(Loose::Text(" 7.25 ".into()), Some(7.25))]
    #[case(Loose::Text("".into()), None)]
    #[case(Loose::Text("ten".into()), None)]
    #[case(Loose::Float(f64::NAN), None)]
    #[case(Loose::Bool(true), None)]
    #[case(Loose::Null, None)]
    fn loose_numbers(#[case] input: Loose, #[case] expected: Option<f64>) {
        assert_eq!(input.as_number(), expected);
    }

    #[test]
    fn form_json_with_string_numbers() {
        let json = r#"{
            "itemCode": "PVC-001",
            "itemName": "Elbow",
            "price": "49.50",
            "size": "",
            "category": "Fittings",
            "stockLevel": "10",
            "material": "PVC",
            "description": ""
        }"#;
        let draft: ItemDraft = serde_json::from_str(json).unwrap();
        let now = Utc::now();
        let item = draft.into_item(1, now, now);
        assert_eq!(item.name, "Elbow");
        assert_eq!(item.price, 49.5);
        assert_eq!(item.stock_level, 10);
        assert_eq!(item.size, DEFAULT_SIZE);
        assert_eq!(item.category, Category::Fittings);
    }

    #[test]
    fn empty_draft_gets_every_default() {
        let now = Utc::now();
        let item = ItemDraft::default().into_item(5, now, now);
        assert_eq!(item.name, DEFAULT_NAME);
        assert_eq!(item.material, DEFAULT_MATERIAL);
        assert_eq!(item.size, DEFAULT_SIZE);
        assert_eq!(item.price, 0.0);
        assert_eq!(item.stock_level, 0);
        assert_eq!(item.category, Category::Others);
        assert!(item.image.is_none());
    }

    #[test]
    fn name_wins_over_item_name() {
        let draft = ItemDraft {
            name: Some("Tee".into()),
            item_name: Some("Old Tee".into()),
            ..Default::default()
        };
        let now = Utc::now();
        assert_eq!(draft.into_item(1, now, now).name, "Tee");
    }

    #[test]
    fn merge_keeps_absent_fields() {
        let now = Utc::now();
        let existing = ItemDraft::new("Elbow")
            .with_item_code("PVC-001")
            .with_price(50.0)
            .with_stock_level(10)
            .with_material("PVC")
            .with_category(Category::Fittings)
            .into_item(42, now, now);

        let later = now + chrono::Duration::seconds(5);
        let merged = ItemDraft::for_id(42)
            .with_stock_level(5)
            .merge_into(&existing, later);

        assert_eq!(merged.id, 42);
        assert_eq!(merged.stock_level, 5);
        assert_eq!(merged.name, "Elbow");
        assert_eq!(merged.price, 50.0);
        assert_eq!(merged.material, "PVC");
        assert_eq!(merged.date_added, now);
        assert_eq!(merged.date_modified, later);
    }

    #[test]
    fn merge_coerces_bad_numbers_to_zero() {
        let now = Utc::now();
        let existing = ItemDraft::new("Valve").with_price(12.0).into_item(1, now, now);
        let merged = ItemDraft::for_id(1).with_price("n/a").merge_into(&existing, now);
        assert_eq!(merged.price, 0.0);
    }

    #[test]
    fn id_reads_numeric_text() {
        let draft = ItemDraft {
            id: Some("1700000000000".into()),
            ..Default::default()
        };
        assert_eq!(draft.id(), Some(1_700_000_000_000));
        assert_eq!(ItemDraft::default().id(), None);
        assert_eq!(ItemDraft::default().with_id(0).id(), None);
    }

    #[rstest]
    #[case(Loose::Text("1e30".into()))]
    #[case(Loose::Float(-1e19))]
    #[case(Loose::Float(9.3e18))]
    fn out_of_range_ids_are_ignored(#[case] id: Loose) {
        let draft = ItemDraft {
            id: Some(id),
            ..Default::default()
        };
        assert_eq!(draft.id(), None);
    }

    #[test]
    fn integer_ids_are_kept_exactly() {
        assert_eq!(ItemDraft::default().with_id(i64::MAX).id(), Some(i64::MAX));
        assert_eq!(
            ItemDraft::default().with_id(9_007_199_254_740_993).id(),
            Some(9_007_199_254_740_993)
        );
    }

    #[test]
    fn given_type_is_carried_and_merged() {
        let draft: ItemDraft =
            serde_json::from_str(r#"{"id": 7, "name": "Union", "type": "Coupling"}"#).unwrap();
        let now = Utc::now();
        let item = draft.into_item(7, now, now);
        assert_eq!(item.item_type.as_deref(), Some("Coupling"));

        let kept = ItemDraft::for_id(7).with_stock_level(2).merge_into(&item, now);
        assert_eq!(kept.item_type.as_deref(), Some("Coupling"));
        let changed = ItemDraft::for_id(7).with_item_type("Union").merge_into(&item, now);
        assert_eq!(changed.item_type.as_deref(), Some("Union"));
    }

    #[test]
    fn lookup_code_prefers_original() {
        let draft = ItemDraft::default()
            .with_item_code("NEW-1")
            .with_original_item_code("OLD-1");
        assert_eq!(draft.lookup_code().as_deref(), Some("OLD-1"));
        let draft = ItemDraft::default().with_item_code("NEW-1");
        assert_eq!(draft.lookup_code().as_deref(), Some("NEW-1"));
    }

    #[test]
    fn legacy_entry_without_id_is_dropped() {
        let draft: ItemDraft = serde_json::from_str(r#"{"name":"Orphan"}"#).unwrap();
        assert!(draft.into_legacy_item(Utc::now()).is_none());
    }
}

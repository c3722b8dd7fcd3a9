use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::category::CategoryRow;

/// Material filter value that disables material filtering.
pub const ALL_MATERIALS: &str = "all";

/// Filter and ordering applied to a category table.
///
/// - `material`: exact, case-insensitive match; `None` or `"all"` keeps every row
/// - `search`: case-insensitive substring of name, type, or size
/// - `sort`: field and direction; ties keep their incoming order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowQuery {
    pub material: Option<String>,
    pub search: Option<String>,
    pub sort: Option<SortDescriptor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    Type,
    Material,
    Size,
    StockLevel,
    Price,
    Value,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(SortField::Name),
            "type" => Ok(SortField::Type),
            "material" => Ok(SortField::Material),
            "size" => Ok(SortField::Size),
            "stock" | "stocklevel" | "stock_level" => Ok(SortField::StockLevel),
            "price" => Ok(SortField::Price),
            "value" => Ok(SortField::Value),
            other => Err(format!("unknown sort field: {}", other)),
        }
    }
}

/// Sort descriptor for table rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDescriptor {
    pub field: SortField,
    pub ascending: bool,
}

impl SortDescriptor {
    pub fn ascending(field: SortField) -> Self {
        Self {
            field,
            ascending: true,
        }
    }

    pub fn descending(field: SortField) -> Self {
        Self {
            field,
            ascending: false,
        }
    }

    /// Same field flips direction; a new field starts ascending.
    pub fn toggled(self, field: SortField) -> Self {
        if self.field == field {
            Self {
                field,
                ascending: !self.ascending,
            }
        } else {
            Self::ascending(field)
        }
    }

    fn compare(&self, a: &CategoryRow, b: &CategoryRow) -> Ordering {
        let ord = match self.field {
            SortField::Name => cmp_text(&a.name, &b.name),
            SortField::Type => cmp_text(&a.item_type, &b.item_type),
            SortField::Material => cmp_text(&a.material, &b.material),
            SortField::Size => cmp_text(&a.size, &b.size),
            SortField::StockLevel => a.stock_level.cmp(&b.stock_level),
            SortField::Price => a.price.total_cmp(&b.price),
            SortField::Value => a.value.total_cmp(&b.value),
        };
        if self.ascending {
            ord
        } else {
            ord.reverse()
        }
    }
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

impl RowQuery {
    pub fn matches(&self, row: &CategoryRow) -> bool {
        if let Some(material) = self.material.as_deref() {
            if !material.eq_ignore_ascii_case(ALL_MATERIALS)
                && row.material.to_lowercase() != material.to_lowercase()
            {
                return false;
            }
        }

        if let Some(term) = self.search.as_deref().filter(|t| !t.is_empty()) {
            let term = term.to_lowercase();
            let hit = [&row.name, &row.item_type, &row.size]
                .iter()
                .any(|field| field.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }

        true
    }

    pub fn apply(&self, rows: &[CategoryRow]) -> Vec<CategoryRow> {
        let mut out: Vec<CategoryRow> = rows.iter().filter(|r| self.matches(r)).cloned().collect();
        if let Some(sort) = &self.sort {
            out.sort_by(|a, b| sort.compare(a, b));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::ItemDraft;
    use crate::item::Category;
    use chrono::Utc;

    fn rows() -> Vec<CategoryRow> {
        let now = Utc::now();
        [
            ("Elbow 90", "PVC", "1/2 inch", 10, 2.5),
            ("brass tee", "Brass", "3/4 inch", 4, 7.0),
            ("Coupling", "pvc", "1 inch", 25, 1.0),
        ]
        .iter()
        .enumerate()
        .map(|(i, (name, material, size, stock, price))| {
            let item = ItemDraft::new(*name)
                .with_material(*material)
                .with_size(*size)
                .with_stock_level(*stock)
                .with_price(*price)
                .with_category(Category::Fittings)
                .into_item(i as i64 + 1, now, now);
            CategoryRow::from_item(&item, Category::Fittings, 15)
        })
        .collect()
    }

    #[test]
    fn default_query_keeps_everything_in_order() {
        let out = RowQuery::default().apply(&rows());
        assert_eq!(out, rows());
    }

    #[test]
    fn material_filter_ignores_case() {
        let q = RowQuery {
            material: Some("PVC".into()),
            ..Default::default()
        };
        assert_eq!(q.apply(&rows()).len(), 2);

        let q = RowQuery {
            material: Some("All".into()),
            ..Default::default()
        };
        assert_eq!(q.apply(&rows()).len(), 3);
    }

    #[test]
    fn search_covers_name_type_and_size() {
        let search = |term: &str| RowQuery {
            search: Some(term.into()),
            ..Default::default()
        };
        assert_eq!(search("TEE").apply(&rows()).len(), 1);
        assert_eq!(search("3/4").apply(&rows()).len(), 1);
        assert_eq!(search("fitting").apply(&rows()).len(), 3);
        assert!(search("valve").apply(&rows()).is_empty());
    }

    #[test]
    fn sort_by_name_is_case_insensitive() {
        let q = RowQuery {
            sort: Some(SortDescriptor::ascending(SortField::Name)),
            ..Default::default()
        };
        let names: Vec<String> = q.apply(&rows()).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["brass tee", "Coupling", "Elbow 90"]);
    }

    #[test]
    fn sort_by_value_descending() {
        let q = RowQuery {
            sort: Some(SortDescriptor::descending(SortField::Value)),
            ..Default::default()
        };
        let values: Vec<f64> = q.apply(&rows()).into_iter().map(|r| r.value).collect();
        assert_eq!(values, vec![28.0, 25.0, 25.0]);
    }

    #[test]
    fn toggling_sort() {
        let s = SortDescriptor::ascending(SortField::Name);
        assert!(!s.toggled(SortField::Name).ascending);
        assert_eq!(
            s.toggled(SortField::Price),
            SortDescriptor::ascending(SortField::Price)
        );
    }

    #[test]
    fn parse_sort_field() {
        assert_eq!("stockLevel".parse::<SortField>().unwrap(), SortField::StockLevel);
        assert!("colour".parse::<SortField>().is_err());
    }
}

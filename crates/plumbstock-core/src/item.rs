use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Item identifier, derived from the creation timestamp in epoch milliseconds.
pub type ItemId = i64;

pub const DEFAULT_NAME: &str = "Unnamed Item";
pub const DEFAULT_SIZE: &str = "Standard";
pub const DEFAULT_MATERIAL: &str = "Unknown";

/// Fixed set of catalog sections an item is filed under.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Pipes,
    Fittings,
    Valves,
    Tools,
    Fixtures,
    Sealants,
    Safety,
    #[default]
    Others,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Pipes,
        Category::Fittings,
        Category::Valves,
        Category::Tools,
        Category::Fixtures,
        Category::Sealants,
        Category::Safety,
        Category::Others,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Pipes => "pipes",
            Category::Fittings => "fittings",
            Category::Valves => "valves",
            Category::Tools => "tools",
            Category::Fixtures => "fixtures",
            Category::Sealants => "sealants",
            Category::Safety => "safety",
            Category::Others => "others",
        }
    }

    /// Singular label used as the row type in category views.
    pub fn type_label(&self) -> &'static str {
        match self {
            Category::Pipes => "Pipe",
            Category::Fittings => "Fitting",
            Category::Valves => "Valve",
            Category::Tools => "Tool",
            Category::Fixtures => "Fixture",
            Category::Sealants => "Sealant",
            Category::Safety => "Safety Gear",
            Category::Others => "Other",
        }
    }

    /// Name fragments that place an item in this category's view regardless
    /// of where it was filed.
    pub fn name_keywords(&self) -> &'static [&'static str] {
        match self {
            Category::Fittings => &["elbow", "tee", "coupling"],
            _ => &[],
        }
    }

    /// Lenient parse: case-insensitive, unknown or blank input lands in `Others`.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or(Category::Others)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

/// A fully normalized inventory record as persisted in the store.
///
/// Field names serialize in camelCase so the persisted array keeps the
/// layout written by the original web frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: ItemId,
    #[serde(default)]
    pub item_code: String,
    pub name: String,
    pub price: f64,
    pub size: String,
    #[serde(default, deserialize_with = "deserialize_category")]
    pub category: Category,
    pub stock_level: i64,
    pub material: String,
    /// Display type overriding the category label in category rows.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub date_added: DateTime<Utc>,
    pub date_modified: DateTime<Utc>,
}

impl InventoryItem {
    pub fn has_image(&self) -> bool {
        self.image.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Stock value at the recorded price.
    pub fn value(&self) -> f64 {
        self.price * self.stock_level as f64
    }
}

fn deserialize_category<'de, D>(deserializer: D) -> Result<Category, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(|s| Category::parse_lenient(&s)).unwrap_or_default())
}
